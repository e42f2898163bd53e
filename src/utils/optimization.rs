//! Derivative-free minimization via the Nelder-Mead simplex method.
//!
//! The seasonal ARIMA estimator minimizes a conditional sum of squares that
//! has no closed-form gradient, so parameter search runs on this simplex
//! implementation. Coefficient bounds are handled by clamping every candidate
//! vertex back into the feasible box.

use std::cmp::Ordering;

/// Tuning parameters for [`nelder_mead`].
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of simplex iterations.
    pub max_iter: usize,
    /// Convergence tolerance on both value spread and simplex size.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrink coefficient.
    pub sigma: f64,
    /// Relative step used to build the initial simplex.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Outcome of a [`nelder_mead`] run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found.
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point.
    pub optimal_value: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the simplex collapsed below the tolerance.
    pub converged: bool,
}

/// Minimize `objective` starting from `initial`.
///
/// `bounds` optionally clamps each coordinate to a closed interval; pass
/// `None` for an unconstrained search.
///
/// # Example
///
/// ```
/// use raincast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 3.0).powi(2) + (x[1] + 2.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 3.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] + 2.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: Vec::new(),
            optimal_value: objective(&[]),
            iterations: 0,
            converged: true,
        };
    }

    // Initial simplex: the start point plus one perturbed vertex per axis.
    let mut points: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    points.push(apply_bounds(initial.to_vec(), bounds));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if vertex[i].abs() > 1e-10 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        points.push(apply_bounds(vertex, bounds));
    }

    let mut simplex: Vec<(Vec<f64>, f64)> = points
        .into_iter()
        .map(|p| {
            let value = objective(&p);
            (p, value)
        })
        .collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        let spread = (simplex[n].1 - simplex[0].1).abs();
        let size = simplex
            .iter()
            .skip(1)
            .map(|(p, _)| euclidean_distance(p, &simplex[0].0))
            .fold(0.0, f64::max);
        if spread < config.tolerance || size < config.tolerance {
            converged = true;
            break;
        }

        iterations += 1;

        // Centroid of every vertex except the worst.
        let centroid = centroid_of(&simplex[..n]);
        let worst = simplex[n].0.clone();
        let worst_value = simplex[n].1;

        let reflected = apply_bounds(move_toward(&centroid, &worst, -config.alpha), bounds);
        let reflected_value = objective(&reflected);

        if reflected_value < simplex[0].1 {
            // Reflection found a new best; try pushing further out.
            let expanded = apply_bounds(move_toward(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = objective(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
        } else if reflected_value < simplex[n - 1].1 {
            simplex[n] = (reflected, reflected_value);
        } else {
            // Contract, outside or inside depending on the reflection.
            let (contracted, contracted_value) = if reflected_value < worst_value {
                let point = apply_bounds(move_toward(&centroid, &reflected, config.rho), bounds);
                let value = objective(&point);
                (point, value)
            } else {
                let point = apply_bounds(move_toward(&centroid, &worst, config.rho), bounds);
                let value = objective(&point);
                (point, value)
            };

            if contracted_value < worst_value.min(reflected_value) {
                simplex[n] = (contracted, contracted_value);
            } else {
                // Shrink everything toward the best vertex.
                let best = simplex[0].0.clone();
                for entry in simplex.iter_mut().skip(1) {
                    let point = apply_bounds(move_toward(&best, &entry.0, config.sigma), bounds);
                    let value = objective(&point);
                    *entry = (point, value);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let (optimal_point, optimal_value) = simplex.swap_remove(0);

    NelderMeadResult {
        optimal_point,
        optimal_value,
        iterations,
        converged,
    }
}

/// `from + factor * (to - from)`; negative factors step away from `to`.
fn move_toward(from: &[f64], to: &[f64], factor: f64) -> Vec<f64> {
    from.iter()
        .zip(to.iter())
        .map(|(f, t)| f + factor * (t - f))
        .collect()
}

fn centroid_of(vertices: &[(Vec<f64>, f64)]) -> Vec<f64> {
    let n = vertices[0].0.len();
    let mut centroid = vec![0.0; n];
    for (point, _) in vertices {
        for (c, p) in centroid.iter_mut().zip(point.iter()) {
            *c += p;
        }
    }
    for c in centroid.iter_mut() {
        *c /= vertices.len() as f64;
    }
    centroid
}

fn apply_bounds(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, (lo, hi)) in point.iter_mut().zip(bounds.iter()) {
            *x = x.clamp(*lo, *hi);
        }
    }
    point
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
