/// Finite-difference gradient with unit spacing.
///
/// Central differences in the interior, one-sided differences at both ends.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut out = vec![0.0; n];
    out[0] = values[1] - values[0];
    out[n - 1] = values[n - 1] - values[n - 2];
    for i in 1..n - 1 {
        out[i] = (values[i + 1] - values[i - 1]) / 2.0;
    }
    out
}

/// Signed curvature of a parametric plane curve from its derivatives.
///
/// Positive where the curve turns counter-clockwise. Points whose speed term
/// `(x'² + y'²)^1.5` falls below `epsilon` get zero curvature.
pub fn signed_curvature(
    dx: &[f64],
    dy: &[f64],
    d2x: &[f64],
    d2y: &[f64],
    epsilon: f64,
) -> Vec<f64> {
    dx.iter()
        .zip(dy)
        .zip(d2x.iter().zip(d2y))
        .map(|((&xp, &yp), (&xpp, &ypp))| {
            let denominator = (xp * xp + yp * yp).powf(1.5);
            if denominator < epsilon {
                0.0
            } else {
                (xp * ypp - yp * xpp) / denominator
            }
        })
        .collect()
}

/// Unsigned curvature, the magnitude of [`signed_curvature`].
pub fn curvature(dx: &[f64], dy: &[f64], d2x: &[f64], d2y: &[f64], epsilon: f64) -> Vec<f64> {
    signed_curvature(dx, dy, d2x, d2y, epsilon)
        .into_iter()
        .map(f64::abs)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gradient_of_quadratic_is_exact_in_the_interior() {
        let v: Vec<f64> = (0..6).map(|i| (i * i) as f64).collect();
        let g = gradient(&v);
        assert_eq!(g, vec![1.0, 2.0, 4.0, 6.0, 8.0, 9.0]);
    }

    #[test]
    fn gradient_of_short_input_is_zero() {
        assert_eq!(gradient(&[3.0]), vec![0.0]);
        assert!(gradient(&[]).is_empty());
    }

    #[test]
    fn circle_has_inverse_radius_curvature() {
        let radius = 2.5;
        let steps = 400;
        let theta: Vec<f64> = (0..steps)
            .map(|i| i as f64 * std::f64::consts::TAU / steps as f64)
            .collect();
        let x: Vec<f64> = theta.iter().map(|t| radius * t.cos()).collect();
        let y: Vec<f64> = theta.iter().map(|t| radius * t.sin()).collect();
        let (dx, dy) = (gradient(&x), gradient(&y));
        let (d2x, d2y) = (gradient(&dx), gradient(&dy));
        let k = curvature(&dx, &dy, &d2x, &d2y, 1e-10);
        for value in &k[5..steps - 5] {
            assert_relative_eq!(*value, 1.0 / radius, max_relative = 1e-3);
        }
    }

    #[test]
    fn stationary_points_have_zero_curvature() {
        let k = curvature(&[0.0], &[0.0], &[1.0], &[1.0], 1e-10);
        assert_eq!(k, vec![0.0]);
    }

    #[test]
    fn convex_and_concave_bends_have_opposite_signs() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let up: Vec<f64> = x.iter().map(|t| t * t).collect();
        let down: Vec<f64> = x.iter().map(|t| -t * t).collect();
        let dx = gradient(&x);
        let d2x = gradient(&dx);
        let (du, dd) = (gradient(&up), gradient(&down));
        let convex = signed_curvature(&dx, &du, &d2x, &gradient(&du), 1e-10);
        let concave = signed_curvature(&dx, &dd, &d2x, &gradient(&dd), 1e-10);
        assert!(convex[10..40].iter().all(|k| *k > 0.0));
        assert!(concave[10..40].iter().all(|k| *k < 0.0));
    }
}
