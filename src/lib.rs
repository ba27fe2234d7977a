//! mlswarp - Point based image deformation using moving least squares
//!
//! Control points are placed on an image and then dragged to new locations.
//! The deformation is solved on a coarse grid and cached in two stages so that
//! moving control points is cheap and evaluating a pixel is a bilinear lookup.

pub mod affine;
pub mod config;
pub mod control;
pub mod deform;
pub mod error;
pub mod grid;
pub mod transform;
pub mod weights;

pub use affine::{AffineCache, NodeModel};
pub use control::ControlPoint;
pub use deform::{DeformedGrid, MlsDeformer, Stage};
pub use error::DeformError;
pub use grid::GridLayout;
pub use transform::{warp_image, PointTransform};
