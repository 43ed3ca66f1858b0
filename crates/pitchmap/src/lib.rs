#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use pitchmap_linalg as linalg;

#[doc(inline)]
pub use pitchmap_geometry as geometry;
