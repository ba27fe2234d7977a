//! Error type for the deformation model

use thiserror::Error;

/// Errors reported by [`crate::MlsDeformer`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeformError {
    #[error("invalid configuration: image {width}x{height}, grid {rows}x{cols}")]
    InvalidConfiguration {
        width: u32,
        height: u32,
        rows: usize,
        cols: usize,
    },

    #[error("alpha must be positive and finite, got {0}")]
    InvalidAlpha(f64),

    #[error("deformer has not been configured")]
    NotConfigured,

    #[error("control point {index} out of range ({count} control points)")]
    ControlIndexOutOfRange { index: usize, count: usize },

    #[error("grid node ({row}, {col}) out of range for a {rows}x{cols} grid")]
    GridIndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("no control points have been added")]
    NoControlPoints,

    /// The distorted pass needs node caches built for the current point set
    #[error("undistorted pass has not been run for the current control points")]
    UndistortedNotFixated,
}

pub type Result<T> = std::result::Result<T, DeformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DeformError::ControlIndexOutOfRange { index: 3, count: 2 };
        assert_eq!(err.to_string(), "control point 3 out of range (2 control points)");

        let err = DeformError::GridIndexOutOfRange { row: 8, col: 0, rows: 8, cols: 4 };
        assert!(err.to_string().contains("8x4"));
    }
}
