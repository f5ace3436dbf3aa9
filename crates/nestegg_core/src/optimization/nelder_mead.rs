//! Nelder-Mead simplex minimization
//!
//! Derivative-free search that keeps a simplex of N+1 points in N-dimensional
//! space and reflects, expands, contracts or shrinks it toward lower objective
//! values. The search is unconstrained; callers map points into their feasible
//! region inside the objective.

/// Standard Nelder-Mead coefficients
const REFLECTION_COEF: f64 = 1.0;
const EXPANSION_COEF: f64 = 2.0;
const CONTRACTION_COEF: f64 = 0.5;
const SHRINK_COEF: f64 = 0.5;

/// Search limits for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexSettings {
    /// Offset applied to each coordinate to build the initial simplex
    pub initial_step: f64,
    pub max_iterations: usize,
    /// Stop once `f(worst) - f(best)` drops below this
    pub tolerance: f64,
}

/// Best point of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct SimplexOutcome {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// A point in parameter space with its evaluation
#[derive(Debug, Clone)]
struct SimplexVertex {
    values: Vec<f64>,
    objective: f64,
}

impl SimplexVertex {
    fn evaluate(values: Vec<f64>, f: &mut impl FnMut(&[f64]) -> f64) -> Self {
        let objective = f(&values);
        // NaN sorts after every finite value so it is always the worst vertex
        let objective = if objective.is_nan() {
            f64::INFINITY
        } else {
            objective
        };
        Self { values, objective }
    }
}

/// Start point plus one point offset along each axis
fn initialize_simplex(
    start: &[f64],
    step: f64,
    f: &mut impl FnMut(&[f64]) -> f64,
) -> Vec<SimplexVertex> {
    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(SimplexVertex::evaluate(start.to_vec(), f));
    for i in 0..start.len() {
        let mut point = start.to_vec();
        point[i] += step;
        simplex.push(SimplexVertex::evaluate(point, f));
    }
    simplex
}

/// Calculate the centroid of all points except the worst
fn centroid(simplex: &[SimplexVertex]) -> Vec<f64> {
    let n = simplex[0].values.len();
    let mut center = vec![0.0; n];

    for vertex in simplex.iter().take(simplex.len() - 1) {
        for (i, val) in vertex.values.iter().enumerate() {
            center[i] += val;
        }
    }

    let count = (simplex.len() - 1) as f64;
    for val in &mut center {
        *val /= count;
    }

    center
}

/// Move `point` through `centroid` by `coef` (1 reflects, 2 expands)
fn reflect(point: &[f64], centroid: &[f64], coef: f64) -> Vec<f64> {
    point
        .iter()
        .zip(centroid.iter())
        .map(|(p, c)| c + coef * (c - p))
        .collect()
}

fn sort_simplex(simplex: &mut [SimplexVertex]) {
    simplex.sort_by(|a, b| a.objective.total_cmp(&b.objective));
}

fn spread(simplex: &[SimplexVertex]) -> f64 {
    simplex[simplex.len() - 1].objective - simplex[0].objective
}

/// Minimize `f` starting from `start`
///
/// Returns the lowest vertex of the final simplex. `converged` is false when
/// the iteration limit was hit first.
pub fn minimize(
    mut f: impl FnMut(&[f64]) -> f64,
    start: &[f64],
    settings: &SimplexSettings,
) -> SimplexOutcome {
    let mut simplex = initialize_simplex(start, settings.initial_step, &mut f);
    let worst_idx = simplex.len() - 1;
    let mut iteration = 0;
    let mut converged = false;

    while iteration < settings.max_iterations {
        sort_simplex(&mut simplex);
        if spread(&simplex) < settings.tolerance {
            converged = true;
            break;
        }
        iteration += 1;

        let cent = centroid(&simplex);
        let best_objective = simplex[0].objective;
        let second_worst_objective = simplex[worst_idx - 1].objective;
        let worst_objective = simplex[worst_idx].objective;
        let worst_values = simplex[worst_idx].values.clone();

        let reflected =
            SimplexVertex::evaluate(reflect(&worst_values, &cent, REFLECTION_COEF), &mut f);

        if reflected.objective < best_objective {
            let expanded =
                SimplexVertex::evaluate(reflect(&worst_values, &cent, EXPANSION_COEF), &mut f);
            simplex[worst_idx] = if expanded.objective < reflected.objective {
                expanded
            } else {
                reflected
            };
        } else if reflected.objective < second_worst_objective {
            simplex[worst_idx] = reflected;
        } else {
            let contract_point = if reflected.objective < worst_objective {
                &reflected.values
            } else {
                &worst_values
            };
            let contracted: Vec<f64> = cent
                .iter()
                .zip(contract_point.iter())
                .map(|(c, p)| c + CONTRACTION_COEF * (p - c))
                .collect();
            let contracted = SimplexVertex::evaluate(contracted, &mut f);

            if contracted.objective < worst_objective.min(reflected.objective) {
                simplex[worst_idx] = contracted;
            } else {
                // Shrink the simplex toward the best point
                let best_values = simplex[0].values.clone();
                for vertex in simplex.iter_mut().skip(1) {
                    let shrunk: Vec<f64> = best_values
                        .iter()
                        .zip(vertex.values.iter())
                        .map(|(b, v)| b + SHRINK_COEF * (v - b))
                        .collect();
                    *vertex = SimplexVertex::evaluate(shrunk, &mut f);
                }
            }
        }
    }

    sort_simplex(&mut simplex);
    if !converged {
        converged = spread(&simplex) < settings.tolerance;
    }
    let best = simplex.swap_remove(0);

    SimplexOutcome {
        point: best.values,
        value: best.objective,
        iterations: iteration,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SimplexSettings {
        SimplexSettings {
            initial_step: 0.5,
            max_iterations: 5000,
            tolerance: 1e-14,
        }
    }

    #[test]
    fn test_reflect() {
        let point = vec![0.0, 0.0];
        let centroid = vec![1.0, 1.0];

        let reflected = reflect(&point, &centroid, 1.0);
        assert!((reflected[0] - 2.0).abs() < 0.001);
        assert!((reflected[1] - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_centroid_excludes_worst() {
        let simplex = vec![
            SimplexVertex {
                values: vec![0.0, 0.0],
                objective: 0.0,
            },
            SimplexVertex {
                values: vec![2.0, 0.0],
                objective: 0.0,
            },
            SimplexVertex {
                values: vec![1.0, 2.0],
                objective: 1.0,
            },
        ];

        let cent = centroid(&simplex);
        assert!((cent[0] - 1.0).abs() < 0.001);
        assert!((cent[1] - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let outcome = minimize(
            |x| (x[0] - 1.0).powi(2) + 2.0 * (x[1] + 0.5).powi(2),
            &[0.0, 0.0],
            &settings(),
        );
        assert!(outcome.converged);
        assert!((outcome.point[0] - 1.0).abs() < 1e-4);
        assert!((outcome.point[1] + 0.5).abs() < 1e-4);
        assert!(outcome.value < 1e-8);
    }

    #[test]
    fn test_iteration_limit_reports_not_converged() {
        let outcome = minimize(
            |x| (x[0] - 3.0).powi(2),
            &[0.0],
            &SimplexSettings {
                max_iterations: 1,
                ..settings()
            },
        );
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 1);
    }
}
