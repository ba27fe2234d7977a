//! Control point storage
//!
//! Each control point has a fixed origin in grid coordinates and a movable
//! target in image pixels. Points are identified by their insertion index.

use nalgebra::Point2;

use crate::error::{DeformError, Result};

/// A single control point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    /// Undistorted location in grid coordinates
    origin: Point2<f64>,
    /// Distorted location in image pixels
    pub target: Point2<f64>,
}

impl ControlPoint {
    pub fn new(origin: Point2<f64>, target: Point2<f64>) -> Self {
        Self { origin, target }
    }

    /// Undistorted location in grid coordinates. Fixed for the point's lifetime.
    #[inline]
    pub fn origin(&self) -> Point2<f64> {
        self.origin
    }
}

/// Ordered collection of control points
#[derive(Debug, Clone, Default)]
pub struct ControlPoints {
    points: Vec<ControlPoint>,
}

impl ControlPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point and return its index
    pub fn push(&mut self, point: ControlPoint) -> usize {
        self.points.push(point);
        self.points.len() - 1
    }

    pub fn get(&self, index: usize) -> Result<&ControlPoint> {
        self.points.get(index).ok_or(DeformError::ControlIndexOutOfRange {
            index,
            count: self.points.len(),
        })
    }

    /// Overwrite the target of an existing point
    pub fn set_target(&mut self, index: usize, target: Point2<f64>) -> Result<()> {
        let count = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(DeformError::ControlIndexOutOfRange { index, count })?;
        point.target = target;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_slice(&self) -> &[ControlPoint] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_sequential() {
        let mut store = ControlPoints::new();
        let a = store.push(ControlPoint::new(Point2::new(1.0, 1.0), Point2::new(10.0, 10.0)));
        let b = store.push(ControlPoint::new(Point2::new(2.0, 1.0), Point2::new(20.0, 10.0)));
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_set_target_keeps_origin() {
        let mut store = ControlPoints::new();
        let idx = store.push(ControlPoint::new(Point2::new(3.0, 4.0), Point2::new(30.0, 40.0)));
        store.set_target(idx, Point2::new(35.0, 41.0)).unwrap();

        let point = store.get(idx).unwrap();
        assert_eq!(point.origin(), Point2::new(3.0, 4.0));
        assert_eq!(point.target, Point2::new(35.0, 41.0));
    }

    #[test]
    fn test_out_of_range() {
        let mut store = ControlPoints::new();
        store.push(ControlPoint::new(Point2::origin(), Point2::origin()));

        assert_eq!(
            store.set_target(1, Point2::origin()),
            Err(DeformError::ControlIndexOutOfRange { index: 1, count: 1 })
        );
        assert!(store.get(5).is_err());
    }
}
