use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, RwLock,
};

use crate::{CalibrationResult, HomographyError, ProjectiveMapper};

/// Errors returned by a calibration session.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Another calibration of this session has not completed yet.
    #[error("A calibration is already in progress for this session")]
    CalibrationPending,
}

/// The calibration currently in force: the estimator output and a ready mapper.
#[derive(Clone, Debug)]
pub struct ActiveCalibration {
    /// The estimator output.
    pub result: CalibrationResult,
    /// Mapper built from `result.homography`.
    pub mapper: ProjectiveMapper,
}

impl ActiveCalibration {
    /// Build the mapper for a calibration result.
    ///
    /// # Errors
    ///
    /// Returns [`HomographyError::Singular`] if the homography cannot be inverted.
    pub fn new(result: CalibrationResult) -> Result<Self, HomographyError> {
        let mapper = ProjectiveMapper::new(result.homography)?;
        Ok(Self { result, mapper })
    }
}

/// Owns the current calibration of one video.
///
/// At most one calibration may be pending at a time. A finished calibration
/// replaces the previous one wholesale; readers get an [`Arc`] snapshot and
/// never observe a partially updated value.
#[derive(Debug, Default)]
pub struct CalibrationSession {
    current: RwLock<Option<Arc<ActiveCalibration>>>,
    pending: AtomicBool,
}

impl CalibrationSession {
    /// Create an uncalibrated session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current calibration, if any.
    pub fn current(&self) -> Option<Arc<ActiveCalibration>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether a calibration is in progress.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Reserve the session for a new calibration.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::CalibrationPending`] if a calibration is already in progress.
    pub fn begin_calibration(&self) -> Result<PendingCalibration<'_>, SessionError> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::CalibrationPending)?;
        Ok(PendingCalibration { session: self })
    }

    /// Drop the current calibration.
    pub fn clear(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    fn replace(&self, calibration: ActiveCalibration) -> Arc<ActiveCalibration> {
        let calibration = Arc::new(calibration);
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(calibration.clone());
        calibration
    }
}

/// Exclusive reservation of a session for one calibration.
///
/// Dropping the guard without calling [`PendingCalibration::complete`] releases
/// the session and keeps the previous calibration.
#[derive(Debug)]
pub struct PendingCalibration<'a> {
    session: &'a CalibrationSession,
}

impl PendingCalibration<'_> {
    /// Install the new calibration and release the session.
    pub fn complete(self, calibration: ActiveCalibration) -> Arc<ActiveCalibration> {
        self.session.replace(calibration)
    }
}

impl Drop for PendingCalibration<'_> {
    fn drop(&mut self) {
        self.session.pending.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{estimate_homography, Homography, Point2};

    fn calibration(scale: f64) -> Result<ActiveCalibration, HomographyError> {
        let video = [[0.0, 0.0], [800.0, 0.0], [800.0, 600.0], [0.0, 600.0]].map(Point2::from);
        let field = video.map(|p| p * scale);
        ActiveCalibration::new(estimate_homography(&video, &field)?)
    }

    #[test]
    fn test_session_replace() -> Result<(), Box<dyn std::error::Error>> {
        let session = CalibrationSession::new();
        assert!(session.current().is_none());

        session.begin_calibration()?.complete(calibration(0.1)?);
        let first = session.current().ok_or("missing calibration")?;

        session.begin_calibration()?.complete(calibration(0.2)?);
        let second = session.current().ok_or("missing calibration")?;

        // the earlier snapshot is untouched by the replacement
        assert_eq!(first.mapper.forward(Point2::new(100.0, 0.0))?.x.round(), 10.0);
        assert_eq!(second.mapper.forward(Point2::new(100.0, 0.0))?.x.round(), 20.0);
        Ok(())
    }

    #[test]
    fn test_session_single_pending() -> Result<(), Box<dyn std::error::Error>> {
        let session = CalibrationSession::new();
        let pending = session.begin_calibration()?;
        assert!(session.is_pending());
        assert_eq!(
            session.begin_calibration().err(),
            Some(SessionError::CalibrationPending)
        );

        // abandoning the calibration keeps the session usable
        drop(pending);
        assert!(!session.is_pending());
        assert!(session.current().is_none());
        session.begin_calibration()?.complete(calibration(0.1)?);
        assert!(session.current().is_some());

        session.clear();
        assert!(session.current().is_none());
        Ok(())
    }

    #[test]
    fn test_active_calibration_rejects_singular() {
        let result = CalibrationResult {
            homography: Homography::new([[0.0; 3]; 3]),
            reprojection_error: 0.0,
        };
        assert!(ActiveCalibration::new(result).is_err());
    }

    #[test]
    fn test_session_concurrent_readers() -> Result<(), Box<dyn std::error::Error>> {
        let session = Arc::new(CalibrationSession::new());
        session.begin_calibration()?.complete(calibration(0.1)?);

        let handles = (0..4)
            .map(|_| {
                let session = session.clone();
                std::thread::spawn(move || {
                    (0..100).all(|_| {
                        session.current().is_some_and(|c| {
                            let x = c.mapper.forward(Point2::new(100.0, 0.0)).map(|p| p.x);
                            matches!(x, Ok(x) if (x - 10.0).abs() < 1e-6 || (x - 20.0).abs() < 1e-6)
                        })
                    })
                })
            })
            .collect::<Vec<_>>();

        session.begin_calibration()?.complete(calibration(0.2)?);

        for handle in handles {
            assert!(handle.join().map_err(|_| "reader panicked")?);
        }
        Ok(())
    }
}
