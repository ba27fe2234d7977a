//! Grid-cached moving least squares deformation
//!
//! Usage:
//! 1. [`MlsDeformer::configure`] with the image and grid size
//! 2. [`MlsDeformer::add_control`] for each control point
//! 3. [`MlsDeformer::fixate_undistorted`] once all points are added
//! 4. [`MlsDeformer::set_distorted`] to move control points
//! 5. [`MlsDeformer::fixate_distorted`] after moving them
//! 6. [`MlsDeformer::compute`] for any pixel
//!
//! Instead of solving the deformation at every pixel, it is solved at the
//! nodes of a coarse grid and pixels are bilinearly interpolated between the
//! four surrounding nodes. Moving targets only reruns the cheap distorted pass.
//!
//! Reference: Schaefer, McPhail and Warren, "Image deformation using moving
//! least squares", ACM TOG 25(3), 2006.

use std::time::Instant;

use nalgebra::{Point2, Vector2};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::affine::{AffineCache, NodeModel};
use crate::control::{ControlPoint, ControlPoints};
use crate::error::{DeformError, Result};
use crate::grid::GridLayout;
use crate::transform::PointTransform;
use crate::weights::DEFAULT_ALPHA;

/// How far the deformer has progressed through its setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unconfigured,
    /// Grid allocated, control points may be added
    Configured,
    /// Weights and coefficients cached for the current control points
    UndistortedReady,
    /// Deformed grid computed, `compute` may be used
    DistortedReady,
}

/// Deformed node positions, row-major
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeformedGrid {
    pub rows: usize,
    pub cols: usize,
    pub nodes: Vec<[f64; 2]>,
}

/// Point based image deformation using moving least squares
#[derive(Debug, Clone)]
pub struct MlsDeformer<C = AffineCache> {
    layout: Option<GridLayout>,
    controls: ControlPoints,
    grid: Vec<C>,
    alpha: f64,
    stage: Stage,
}

impl<C: NodeModel> Default for MlsDeformer<C> {
    fn default() -> Self {
        Self {
            layout: None,
            controls: ControlPoints::new(),
            grid: Vec::new(),
            alpha: DEFAULT_ALPHA,
            stage: Stage::Unconfigured,
        }
    }
}

impl MlsDeformer<AffineCache> {
    /// Create an affine deformer
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: NodeModel> MlsDeformer<C> {
    /// Specify the image size and the grid used to approximate the deformation.
    ///
    /// Discards any existing control points and node caches.
    pub fn configure(&mut self, width: u32, height: u32, rows: usize, cols: usize) -> Result<()> {
        let layout = GridLayout::new(width, height, rows, cols)?;

        self.controls.clear();
        self.grid.clear();
        self.grid.resize_with(layout.node_count(), C::default);
        self.layout = Some(layout);
        self.stage = Stage::Configured;

        debug!(
            "Configured {}x{} image with {}x{} grid (scale {:?})",
            width,
            height,
            rows,
            cols,
            layout.scale()
        );
        Ok(())
    }

    /// Add a control point at pixel `(x, y)`.
    ///
    /// The distorted location starts at the same pixel. Returns the index of
    /// the new point.
    pub fn add_control(&mut self, x: f64, y: f64) -> Result<usize> {
        let layout = self.layout.ok_or(DeformError::NotConfigured)?;
        if !layout.contains(x, y) {
            warn!("Control point ({}, {}) lies outside the image", x, y);
        }

        let index = self.controls.push(ControlPoint::new(layout.to_grid(x, y), Point2::new(x, y)));
        // Node caches no longer cover every point
        self.stage = Stage::Configured;
        Ok(index)
    }

    /// Set the distorted location of control point `index` in pixels.
    ///
    /// Takes effect after the next [`MlsDeformer::fixate_distorted`].
    pub fn set_distorted(&mut self, index: usize, x: f64, y: f64) -> Result<()> {
        self.controls.set_target(index, Point2::new(x, y))
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Change the distance weighting exponent. Requires a new undistorted pass.
    pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
        if !(alpha > 0.0 && alpha.is_finite()) {
            return Err(DeformError::InvalidAlpha(alpha));
        }
        self.alpha = alpha;
        self.stage = self.stage.min(Stage::Configured);
        Ok(())
    }

    /// Precompute weights and affine coefficients at every grid node.
    ///
    /// Must be rerun whenever control points are added.
    pub fn fixate_undistorted(&mut self) -> Result<()> {
        let layout = self.layout.ok_or(DeformError::NotConfigured)?;
        if self.controls.is_empty() {
            return Err(DeformError::NoControlPoints);
        }

        let start = Instant::now();
        let controls = self.controls.as_slice();
        let alpha = self.alpha;

        self.grid.par_iter_mut().enumerate().for_each(|(index, node)| {
            node.fixate_undistorted(controls, layout.node_coordinate(index), alpha);
        });

        self.stage = Stage::UndistortedReady;
        debug!(
            "Undistorted pass: {} nodes, {} control points in {:?}",
            self.grid.len(),
            controls.len(),
            start.elapsed()
        );
        Ok(())
    }

    /// Recompute the deformed position of every grid node from the current
    /// control point targets.
    pub fn fixate_distorted(&mut self) -> Result<()> {
        match self.stage {
            Stage::Unconfigured => return Err(DeformError::NotConfigured),
            Stage::Configured => return Err(DeformError::UndistortedNotFixated),
            Stage::UndistortedReady | Stage::DistortedReady => {}
        }

        let start = Instant::now();
        let controls = self.controls.as_slice();

        self.grid
            .par_iter_mut()
            .for_each(|node| node.fixate_distorted(controls));

        self.stage = Stage::DistortedReady;
        debug!(
            "Distorted pass: {} nodes, {} control points in {:?}",
            self.grid.len(),
            controls.len(),
            start.elapsed()
        );
        Ok(())
    }

    /// Deformed location of pixel `(x, y)`, interpolated from the four
    /// surrounding grid nodes.
    ///
    /// Results reflect the state at the last [`MlsDeformer::fixate_distorted`];
    /// targets moved since then are not seen. Calling this before
    /// `fixate_distorted` is a usage error, asserted in debug builds; release
    /// builds return stale values, or NaN when never configured.
    #[inline]
    pub fn compute(&self, x: f64, y: f64) -> Point2<f64> {
        debug_assert!(
            self.stage == Stage::DistortedReady,
            "compute called before fixate_distorted"
        );
        let Some(layout) = self.layout.as_ref() else {
            return Point2::new(f64::NAN, f64::NAN);
        };

        let cell = layout.cell(layout.to_grid(x, y));
        let sum = cell
            .nodes
            .iter()
            .zip(cell.weights)
            .fold(Vector2::zeros(), |acc, (&node, w)| {
                acc + self.grid[node].deformed().coords * w
            });
        Point2::from(sum)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn layout(&self) -> Option<&GridLayout> {
        self.layout.as_ref()
    }

    /// Pixels per grid unit along x and y
    pub fn scale(&self) -> Option<(f64, f64)> {
        self.layout.map(|l| l.scale())
    }

    pub fn grid_rows(&self) -> usize {
        self.layout.map_or(0, |l| l.rows())
    }

    pub fn grid_cols(&self) -> usize {
        self.layout.map_or(0, |l| l.cols())
    }

    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub fn control(&self, index: usize) -> Result<&ControlPoint> {
        self.controls.get(index)
    }

    pub fn controls(&self) -> &[ControlPoint] {
        self.controls.as_slice()
    }

    /// Cached state of grid node `(row, col)`
    pub fn node(&self, row: usize, col: usize) -> Result<&C> {
        let layout = self.layout.ok_or(DeformError::NotConfigured)?;
        let index = layout.node_index(row, col)?;
        Ok(&self.grid[index])
    }

    /// Snapshot of every node's deformed position
    pub fn deformed_grid(&self) -> Result<DeformedGrid> {
        let layout = self.layout.ok_or(DeformError::NotConfigured)?;
        Ok(DeformedGrid {
            rows: layout.rows(),
            cols: layout.cols(),
            nodes: self
                .grid
                .iter()
                .map(|node| {
                    let p = node.deformed();
                    [p.x, p.y]
                })
                .collect(),
        })
    }
}

impl<C: NodeModel> PointTransform for MlsDeformer<C> {
    #[inline]
    fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.compute(x, y);
        (p.x, p.y)
    }
}
