use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use pitchmap::geometry::{
    estimate_homography,
    heuristic::HeuristicParams,
    mapping,
    ransac::{ransac_homography, RansacParams},
    session::ActiveCalibration,
    shapes::{annotate, Projection, Shape, ShapeSampling},
    Homography, HomographyError, Point2, ProjectiveMapper,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    state::{AppState, DEFAULT_SESSION},
};

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/calibrate", post(calibrate))
        .route("/transform", post(transform))
        .route("/inverse-transform", post(inverse_transform))
        .route("/distance", post(distance))
        .route("/batch-transform", post(batch_transform))
        .route("/project-shape", post(project_shape))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CalibrationRequest {
    pub video_points: Vec<Vec<f64>>,
    pub pitch_points: Vec<Vec<f64>>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub robust: bool,
}

#[derive(Debug, Serialize)]
pub struct CalibrationResponse {
    pub success: bool,
    pub matrix: [[f64; 3]; 3],
    pub reprojection_error: f64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inlier_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TransformRequest {
    pub video_point: Vec<f64>,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransformResponse {
    pub pitch_point: Point2,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct InverseTransformRequest {
    /// Field point to map back into the image; `video_point` is accepted for older clients.
    #[serde(alias = "video_point")]
    pub pitch_point: Vec<f64>,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InverseTransformResponse {
    pub video_point: Point2,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct DistanceRequest {
    pub point1: Vec<f64>,
    pub point2: Vec<f64>,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DistanceResponse {
    pub distance: f64,
    pub pitch_point1: Point2,
    pub pitch_point2: Point2,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchTransformRequest {
    pub video_points: Vec<Vec<f64>>,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchTransformResponse {
    /// `null` entries could not be mapped.
    pub pitch_points: Vec<Option<Point2>>,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProjectShapeRequest {
    /// Shape anchored in camera pixels.
    pub shape: Shape,
    pub matrix: Option<Vec<Vec<f64>>>,
    pub session_id: Option<String>,
    pub samples: Option<usize>,
    #[serde(default)]
    pub heuristic: HeuristicParams,
}

#[derive(Debug, Serialize)]
pub struct ProjectShapeResponse {
    #[serde(flatten)]
    pub projection: Projection,
    pub success: bool,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pitchmap",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn calibrate(
    State(state): State<AppState>,
    payload: Result<Json<CalibrationRequest>, JsonRejection>,
) -> Result<Json<CalibrationResponse>, ApiError> {
    let Json(req) = payload?;
    let session_id = req.session_id.as_deref().unwrap_or(DEFAULT_SESSION);

    let video = parse_points(&req.video_points)?;
    let field = parse_points(&req.pitch_points)?;

    // an existing session is reserved for the whole estimation; a new one is
    // only created once the estimation succeeded
    let existing = state.sessions.get(session_id);
    let pending = existing
        .as_ref()
        .map(|session| session.begin_calibration())
        .transpose()?;

    let (result, inlier_count) = if req.robust {
        let res = ransac_homography(&video, &field, &RansacParams::default())?;
        (res.calibration, Some(res.inlier_count))
    } else {
        (estimate_homography(&video, &field)?, None)
    };
    let calibration = ActiveCalibration::new(result)?;

    let active = match pending {
        Some(pending) => pending.complete(calibration),
        None => {
            let session = state.sessions.get_or_create(session_id)?;
            let pending = session.begin_calibration()?;
            pending.complete(calibration)
        }
    };
    let error = active.result.reprojection_error;

    log::info!(
        "session '{session_id}' calibrated with {} points, reprojection error {error:.4}",
        video.len()
    );

    Ok(Json(CalibrationResponse {
        success: true,
        matrix: *active.result.homography.matrix(),
        reprojection_error: round_to(error, 2),
        message: format!(
            "Calibration successful with {} points. Reprojection error: {error:.2}m",
            video.len()
        ),
        inlier_count,
    }))
}

async fn transform(
    State(state): State<AppState>,
    payload: Result<Json<TransformRequest>, JsonRejection>,
) -> Result<Json<TransformResponse>, ApiError> {
    let Json(req) = payload?;
    let source = resolve(&state, req.matrix.as_deref(), req.session_id.as_deref())?;
    let pitch_point = source.forward(parse_point(&req.video_point)?)?;
    Ok(Json(TransformResponse {
        pitch_point,
        success: true,
    }))
}

async fn inverse_transform(
    State(state): State<AppState>,
    payload: Result<Json<InverseTransformRequest>, JsonRejection>,
) -> Result<Json<InverseTransformResponse>, ApiError> {
    let Json(req) = payload?;
    let source = resolve(&state, req.matrix.as_deref(), req.session_id.as_deref())?;
    let video_point = source.backward(parse_point(&req.pitch_point)?)?;
    Ok(Json(InverseTransformResponse {
        video_point,
        success: true,
    }))
}

async fn distance(
    State(state): State<AppState>,
    payload: Result<Json<DistanceRequest>, JsonRejection>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let Json(req) = payload?;
    let source = resolve(&state, req.matrix.as_deref(), req.session_id.as_deref())?;
    let pitch_point1 = source.forward(parse_point(&req.point1)?)?;
    let pitch_point2 = source.forward(parse_point(&req.point2)?)?;
    Ok(Json(DistanceResponse {
        distance: round_to(pitch_point1.distance(&pitch_point2), 1),
        pitch_point1,
        pitch_point2,
        success: true,
    }))
}

async fn batch_transform(
    State(state): State<AppState>,
    payload: Result<Json<BatchTransformRequest>, JsonRejection>,
) -> Result<Json<BatchTransformResponse>, ApiError> {
    let Json(req) = payload?;
    let source = resolve(&state, req.matrix.as_deref(), req.session_id.as_deref())?;
    let pitch_points = req
        .video_points
        .iter()
        .map(|raw| {
            parse_point(raw)
                .ok()
                .and_then(|p| source.forward(p).ok())
        })
        .collect();
    Ok(Json(BatchTransformResponse {
        pitch_points,
        success: true,
    }))
}

async fn project_shape(
    State(state): State<AppState>,
    payload: Result<Json<ProjectShapeRequest>, JsonRejection>,
) -> Result<Json<ProjectShapeResponse>, ApiError> {
    let Json(req) = payload?;

    // a missing homography is not an error here: the heuristic takes over
    let mapper = match resolve(&state, req.matrix.as_deref(), req.session_id.as_deref()) {
        Ok(MatrixSource::Session(active)) => Some(active.mapper.clone()),
        Ok(MatrixSource::Explicit(h)) => pitch_mapper(h),
        Err(_) => None,
    };

    let sampling = req
        .samples
        .map(|samples| ShapeSampling { samples })
        .unwrap_or_default();
    let projection = annotate(mapper.as_ref(), &req.shape, sampling, &req.heuristic);

    Ok(Json(ProjectShapeResponse {
        projection,
        success: true,
    }))
}

fn pitch_mapper(h: Homography) -> Option<ProjectiveMapper> {
    ProjectiveMapper::new(h)
        .map_err(|err| log::warn!("explicit matrix is not invertible: {err}"))
        .ok()
}

/// Where the homography of a mapping request comes from.
enum MatrixSource {
    Explicit(Homography),
    Session(Arc<ActiveCalibration>),
}

impl MatrixSource {
    fn forward(&self, p: Point2) -> Result<Point2, HomographyError> {
        match self {
            MatrixSource::Explicit(h) => mapping::forward(h, p),
            MatrixSource::Session(active) => active.mapper.forward(p),
        }
    }

    fn backward(&self, p: Point2) -> Result<Point2, HomographyError> {
        match self {
            MatrixSource::Explicit(h) => mapping::backward(h, p),
            MatrixSource::Session(active) => active.mapper.backward(p),
        }
    }
}

/// An explicit matrix wins over the session's current calibration.
fn resolve(
    state: &AppState,
    matrix: Option<&[Vec<f64>]>,
    session_id: Option<&str>,
) -> Result<MatrixSource, ApiError> {
    if let Some(matrix) = matrix {
        return parse_matrix(matrix).map(MatrixSource::Explicit);
    }

    state
        .sessions
        .get(session_id.unwrap_or(DEFAULT_SESSION))
        .and_then(|session| session.current())
        .map(MatrixSource::Session)
        .ok_or_else(|| {
            ApiError::BadRequest(
                "No homography matrix available. Calibrate first or provide matrix.".to_string(),
            )
        })
}

fn parse_point(raw: &[f64]) -> Result<Point2, ApiError> {
    match raw {
        [x, y] if x.is_finite() && y.is_finite() => Ok(Point2::new(*x, *y)),
        _ => Err(ApiError::BadRequest(format!(
            "Expected a point [x, y] of finite numbers, got {raw:?}"
        ))),
    }
}

fn parse_points(raw: &[Vec<f64>]) -> Result<Vec<Point2>, ApiError> {
    raw.iter().map(|p| parse_point(p)).collect()
}

fn parse_matrix(raw: &[Vec<f64>]) -> Result<Homography, ApiError> {
    let invalid = || ApiError::BadRequest("Matrix must be 3x3 with finite entries".to_string());
    if raw.len() != 3 {
        return Err(invalid());
    }
    let mut m = [[0.0; 3]; 3];
    for (dst, src) in m.iter_mut().zip(raw) {
        if src.len() != 3 || src.iter().any(|v| !v.is_finite()) {
            return Err(invalid());
        }
        dst.copy_from_slice(src);
    }
    Ok(Homography::new(m))
}

/// Round for presentation; the engine itself keeps full precision.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
