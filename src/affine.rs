//! Per-node caches for the affine moving least squares deformation
//!
//! The undistorted pass depends only on control point origins and the node's
//! grid coordinate, so it is done once per point layout. The distorted pass
//! only blends the cached coefficients with the current targets.

use nalgebra::{Point2, Vector2};

use crate::control::ControlPoint;
use crate::weights::compute_weights;

/// A grid node that can produce a deformed position from control points.
///
/// Implementations cache whatever depends only on the undistorted layout in
/// [`NodeModel::fixate_undistorted`] so that [`NodeModel::fixate_distorted`]
/// stays cheap.
pub trait NodeModel: Default + Send + Sync {
    /// Precompute everything that depends on control point origins
    fn fixate_undistorted(&mut self, controls: &[ControlPoint], v: Point2<f64>, alpha: f64);

    /// Recompute the deformed position from the current targets
    fn fixate_distorted(&mut self, controls: &[ControlPoint]);

    /// Deformed location of this node in image pixels
    fn deformed(&self) -> Point2<f64>;
}

/// Cached state of one grid node for the affine deformation
#[derive(Debug, Clone, PartialEq)]
pub struct AffineCache {
    /// Normalized weight of each control point
    pub weights: Vec<f64>,
    /// Affine coefficient of each control point
    pub coefficients: Vec<f64>,
    /// Weighted centroid of the control point origins (grid coordinates)
    pub average_origin: Point2<f64>,
    /// Weighted centroid of the control point targets (pixels)
    pub average_target: Point2<f64>,
    pub deformed: Point2<f64>,
}

impl Default for AffineCache {
    fn default() -> Self {
        Self {
            weights: Vec::new(),
            coefficients: Vec::new(),
            average_origin: Point2::origin(),
            average_target: Point2::origin(),
            deformed: Point2::origin(),
        }
    }
}

impl AffineCache {
    fn compute_average_origin(&mut self, controls: &[ControlPoint]) {
        let sum = controls
            .iter()
            .zip(&self.weights)
            .fold(Vector2::zeros(), |acc, (c, w)| acc + c.origin().coords * *w);
        self.average_origin = Point2::from(sum);
    }

    fn compute_average_target(&mut self, controls: &[ControlPoint]) {
        let sum = controls
            .iter()
            .zip(&self.weights)
            .fold(Vector2::zeros(), |acc, (c, w)| acc + c.target.coords * *w);
        self.average_target = Point2::from(sum);
    }

    /// Coefficient `A[i] = (v - p*) M^-1 p[i]` for every control point.
    ///
    /// `M` accumulates `w p p'` without centering and is inverted through its
    /// minors with determinant `m00^2 - m01^2`. A zero determinant leaves every
    /// coefficient at zero so the node follows the weighted average target.
    fn compute_coefficients(&mut self, controls: &[ControlPoint], v: Point2<f64>) {
        let (mut inner00, mut inner01, mut inner11) = (0.0_f64, 0.0_f64, 0.0_f64);
        for (c, w) in controls.iter().zip(&self.weights) {
            let p = c.origin();
            inner00 += p.x * p.x * w;
            inner01 += p.y * p.x * w;
            inner11 += p.y * p.y * w;
        }

        self.coefficients.clear();
        self.coefficients.resize(controls.len(), 0.0);

        let det = inner00 * inner00 - inner01 * inner01;
        if det == 0.0 {
            return;
        }

        let inv00 = inner00 / det;
        let inv01 = -inner01 / det;
        let inv11 = inner11 / det;

        let d = v - self.average_origin;
        let tmp0 = d.x * inv00 + d.y * inv01;
        let tmp1 = d.x * inv01 + d.y * inv11;

        for (a, c) in self.coefficients.iter_mut().zip(controls) {
            let p = c.origin();
            *a = tmp0 * p.x + tmp1 * p.y;
        }
    }
}

impl NodeModel for AffineCache {
    fn fixate_undistorted(&mut self, controls: &[ControlPoint], v: Point2<f64>, alpha: f64) {
        compute_weights(&mut self.weights, controls, v, alpha);
        self.compute_average_origin(controls);
        self.compute_coefficients(controls, v);
    }

    fn fixate_distorted(&mut self, controls: &[ControlPoint]) {
        self.compute_average_target(controls);

        let correction = controls
            .iter()
            .zip(&self.coefficients)
            .fold(Vector2::zeros(), |acc, (c, a)| acc + c.target.coords * *a);
        self.deformed = self.average_target + correction;
    }

    #[inline]
    fn deformed(&self) -> Point2<f64> {
        self.deformed
    }
}
