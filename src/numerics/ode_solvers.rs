//! Explicit integrators for the slow first-order states (component temperatures, wear)

/// Advances `dx/dt = f(x)` over a single step using the explicit Euler method.
///
/// # Examples
///
/// ```
/// use engine_cycle_simulator::ode_solvers::euler_step;
/// let x = euler_step(|x| -2.0 * x, 1.0, 0.1);
/// assert!((x - 0.8).abs() < 1e-12);
/// ```
pub fn euler_step<F>(f: F, x: f64, step: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    x + step * f(x)
}

/// Moves `value` toward `target` following `dx/dt = rate*(target - x)`.
///
/// The Euler factor `rate*dt` is capped at one, so a large step lands on the
/// target instead of overshooting it.
pub fn relax(value: f64, target: f64, rate: f64, dt: f64) -> f64 {
    let factor = (rate * dt).clamp(0.0, 1.0);
    euler_step(|x| target - x, value, factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_matches_hand_computation() {
        let x = euler_step(|x| 3.0 - x, 1.0, 0.5);
        assert!((x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn relax_moves_toward_target() {
        let t = relax(300.0, 450.0, 0.1, 1.0);
        assert!((t - 315.0).abs() < 1e-9);
        let t = relax(500.0, 450.0, 0.1, 1.0);
        assert!((t - 495.0).abs() < 1e-9);
    }

    #[test]
    fn relax_never_overshoots() {
        assert_eq!(relax(300.0, 1000.0, 50.0, 10.0), 1000.0);
        assert_eq!(relax(300.0, 1000.0, 0.0, 10.0), 300.0);
    }
}
