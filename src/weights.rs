//! Inverse distance weighting of control points

use nalgebra::{distance_squared, Point2};

use crate::control::ControlPoint;

/// Default exponent applied to squared distances
pub const DEFAULT_ALPHA: f64 = 1.5;

/// Compute the normalized influence of each control point on grid coordinate `v`.
///
/// Weights are `1 / d2^alpha`, normalized to sum to one. When `v` lies exactly
/// on a control point's origin that point receives weight 1 and every other
/// point 0.
pub fn compute_weights(weights: &mut Vec<f64>, controls: &[ControlPoint], v: Point2<f64>, alpha: f64) {
    weights.clear();
    weights.resize(controls.len(), 0.0);

    let mut total = 0.0_f64;
    for (i, control) in controls.iter().enumerate() {
        let d2 = distance_squared(&control.origin(), &v);
        if d2 == 0.0 {
            weights.fill(0.0);
            weights[i] = 1.0;
            return;
        }
        let w = 1.0 / d2.powf(alpha);
        weights[i] = w;
        total += w;
    }

    for w in weights.iter_mut() {
        *w /= total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(x: f64, y: f64) -> ControlPoint {
        ControlPoint::new(Point2::new(x, y), Point2::new(x, y))
    }

    #[test]
    fn test_weights_sum_to_one() {
        let controls = [control(0.0, 0.0), control(5.0, 1.0), control(2.0, 7.0)];
        let mut weights = Vec::new();
        compute_weights(&mut weights, &controls, Point2::new(3.3, 2.1), DEFAULT_ALPHA);

        assert_eq!(weights.len(), 3);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(weights.iter().all(|w| *w > 0.0));
    }

    #[test]
    fn test_exact_match_selects_coincident_point() {
        // The coincident point is not the first one, so the tie-break must use
        // its own index
        let controls = [control(0.0, 0.0), control(4.0, 4.0), control(7.0, 1.0)];
        let mut weights = vec![0.3; 3];
        compute_weights(&mut weights, &controls, Point2::new(4.0, 4.0), DEFAULT_ALPHA);

        assert_eq!(weights, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_exact_match_after_earlier_points() {
        let controls = [control(1.0, 1.0), control(2.0, 2.0), control(3.0, 3.0)];
        let mut weights = Vec::new();
        compute_weights(&mut weights, &controls, Point2::new(3.0, 3.0), DEFAULT_ALPHA);

        assert_eq!(weights, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_nearer_point_dominates() {
        let controls = [control(1.0, 1.0), control(6.0, 6.0)];
        let mut weights = Vec::new();

        compute_weights(&mut weights, &controls, Point2::new(2.0, 1.0), DEFAULT_ALPHA);
        assert!(weights[0] > weights[1]);

        compute_weights(&mut weights, &controls, Point2::new(5.0, 7.0), DEFAULT_ALPHA);
        assert!(weights[1] > weights[0]);
    }

    #[test]
    fn test_alpha_controls_locality() {
        let controls = [control(0.0, 0.0), control(4.0, 0.0)];
        let v = Point2::new(1.0, 0.0);
        let mut soft = Vec::new();
        let mut sharp = Vec::new();

        compute_weights(&mut soft, &controls, v, 0.5);
        compute_weights(&mut sharp, &controls, v, 3.0);

        assert!(sharp[0] > soft[0]);
    }
}
