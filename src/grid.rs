//! Interpolation grid geometry
//!
//! The grid is a `rows x cols` lattice covering grid coordinates
//! `[0, cols) x [0, rows)`. Node `(row, col)` sits at grid coordinate
//! `(col, row)`, and image pixels map to grid coordinates by dividing by the
//! per-axis scale.

use nalgebra::Point2;

use crate::error::{DeformError, Result};

/// Dimensions of the image and the grid approximating its deformation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    width: u32,
    height: u32,
    rows: usize,
    cols: usize,
    scale_x: f64,
    scale_y: f64,
}

impl GridLayout {
    pub fn new(width: u32, height: u32, rows: usize, cols: usize) -> Result<Self> {
        if width == 0 || height == 0 || rows == 0 || cols == 0 {
            return Err(DeformError::InvalidConfiguration {
                width,
                height,
                rows,
                cols,
            });
        }

        Ok(Self {
            width,
            height,
            rows,
            cols,
            scale_x: width as f64 / cols as f64,
            scale_y: height as f64 / rows as f64,
        })
    }

    /// Image size in pixels
    pub fn image_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether a pixel coordinate lies inside the image
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Pixels per grid unit along x and y
    #[inline]
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Convert an image pixel coordinate to grid coordinates
    #[inline]
    pub fn to_grid(&self, x: f64, y: f64) -> Point2<f64> {
        Point2::new(x / self.scale_x, y / self.scale_y)
    }

    /// Flat index of node `(row, col)`
    pub fn node_index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(DeformError::GridIndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    /// Grid coordinate of the node stored at flat `index`
    #[inline]
    pub fn node_coordinate(&self, index: usize) -> Point2<f64> {
        let row = index / self.cols;
        let col = index % self.cols;
        Point2::new(col as f64, row as f64)
    }

    /// Locate the four nodes around grid coordinate `v` and their bilinear weights.
    ///
    /// Rows and columns are clamped against their own dimension, so coordinates
    /// on or past the last row/column fall back to the nearest edge nodes.
    pub fn cell(&self, v: Point2<f64>) -> Cell {
        let (x0, x1, ax) = axis_span(v.x, self.cols);
        let (y0, y1, ay) = axis_span(v.y, self.rows);

        Cell {
            nodes: [
                y0 * self.cols + x0,
                y0 * self.cols + x1,
                y1 * self.cols + x0,
                y1 * self.cols + x1,
            ],
            weights: [
                (1.0 - ax) * (1.0 - ay),
                ax * (1.0 - ay),
                (1.0 - ax) * ay,
                ax * ay,
            ],
        }
    }
}

/// Four enclosing nodes in the order `00, 01, 10, 11` (row, col) with their weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub nodes: [usize; 4],
    pub weights: [f64; 4],
}

/// Lower and upper sample index along one axis plus the fractional offset
#[inline]
fn axis_span(v: f64, len: usize) -> (usize, usize, f64) {
    let last = (len - 1) as f64;
    let lo = v.floor().clamp(0.0, last);
    let hi = (lo + 1.0).min(last);
    (lo as usize, hi as usize, (v - lo).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale() {
        let layout = GridLayout::new(640, 480, 12, 16).unwrap();
        assert_eq!(layout.scale(), (40.0, 40.0));
        assert_eq!(layout.to_grid(80.0, 120.0), Point2::new(2.0, 3.0));
        assert!(layout.contains(639.5, 0.0));
        assert!(!layout.contains(640.0, 10.0));
        assert!(!layout.contains(10.0, -0.5));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(GridLayout::new(0, 100, 8, 8).is_err());
        assert!(GridLayout::new(100, 100, 0, 8).is_err());
        assert!(GridLayout::new(100, 100, 8, 0).is_err());
    }

    #[test]
    fn test_node_index_round_trip() {
        let layout = GridLayout::new(100, 50, 4, 8).unwrap();
        let idx = layout.node_index(3, 5).unwrap();
        assert_eq!(idx, 29);
        assert_eq!(layout.node_coordinate(idx), Point2::new(5.0, 3.0));
        assert!(layout.node_index(4, 0).is_err());
        assert!(layout.node_index(0, 8).is_err());
    }

    #[test]
    fn test_cell_interior() {
        let layout = GridLayout::new(100, 100, 8, 8).unwrap();
        let cell = layout.cell(Point2::new(2.25, 3.5));

        assert_eq!(cell.nodes, [26, 27, 34, 35]);
        let expected = [0.75 * 0.5, 0.25 * 0.5, 0.75 * 0.5, 0.25 * 0.5];
        for (w, e) in cell.weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-12);
        }
        assert!((cell.weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cell_clamps_rows_and_cols_independently() {
        // Non-square grid: the row bound must come from rows, not cols
        let layout = GridLayout::new(160, 40, 2, 8).unwrap();

        let cell = layout.cell(Point2::new(3.5, 1.5));
        for node in cell.nodes {
            assert!(node < layout.node_count());
        }
        // Bottom row only
        assert_eq!(cell.nodes, [11, 12, 11, 12]);

        // Past the right edge and above the top: all weight on node (0, 7)
        let cell = layout.cell(Point2::new(20.0, -3.0));
        assert_eq!(cell.nodes, [7, 7, 15, 15]);
        assert_eq!(cell.weights, [0.0, 1.0, 0.0, 0.0]);
    }
}
