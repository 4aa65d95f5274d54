//! Nelder-Mead simplex minimisation
//!
//! Used to fit smoothing weights and ARMA coefficients by minimising a
//! sum of squared one-step errors. Bounds are enforced by clamping every
//! trial point into its box.

/// Outcome of a minimisation run
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the simplex met the tolerance before `max_iter`
    pub converged: bool,
}

/// Tuning knobs for the simplex search
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    pub tolerance: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
    /// Initial simplex step, relative to the starting coordinate when it is non-zero
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

fn clamp_point(point: &mut [f64], bounds: Option<&[(f64, f64)]>) {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
}

/// Point on the line through `from` and `to`: `from + coef * (to - from)`
fn along(from: &[f64], to: &[f64], coef: f64, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    let mut point: Vec<f64> = from
        .iter()
        .zip(to)
        .map(|(f, t)| f + coef * (t - f))
        .collect();
    clamp_point(&mut point, bounds);
    point
}

/// Minimise `objective` starting from `initial`
///
/// Non-finite objective values are treated as `f64::MAX` so a diverging
/// candidate is simply rejected.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::MAX
        }
    };

    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            point: Vec::new(),
            value: eval(&[]),
            iterations: 0,
            converged: true,
        };
    }

    let mut start = initial.to_vec();
    clamp_point(&mut start, bounds);

    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        let step = if start[i].abs() > 1e-10 {
            config.initial_step * start[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        clamp_point(&mut vertex, bounds);
        // A vertex clamped back onto the start would collapse the simplex
        if vertex[i] == start[i] {
            vertex[i] -= step;
            clamp_point(&mut vertex, bounds);
        }
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        if (values[n] - values[0]).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();

        let spread = simplex
            .iter()
            .map(|v| {
                v.iter()
                    .zip(&centroid)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .fold(0.0, f64::max);
        if spread < config.tolerance {
            converged = true;
            break;
        }

        let reflected = along(&centroid, &simplex[n], -config.alpha, bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[0] {
            let expanded = along(&centroid, &reflected, config.gamma, bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[n] = expanded;
                values[n] = expanded_value;
            } else {
                simplex[n] = reflected;
                values[n] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[n - 1] {
            simplex[n] = reflected;
            values[n] = reflected_value;
            continue;
        }

        let (contracted, limit) = if reflected_value < values[n] {
            (along(&centroid, &reflected, config.rho, bounds), reflected_value)
        } else {
            (along(&centroid, &simplex[n], config.rho, bounds), values[n])
        };
        let contracted_value = eval(&contracted);
        if contracted_value < limit {
            simplex[n] = contracted;
            values[n] = contracted_value;
            continue;
        }

        let best = simplex[0].clone();
        for i in 1..=n {
            simplex[i] = along(&best, &simplex[i], config.sigma, bounds);
            values[i] = eval(&simplex[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    NelderMeadResult {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}
