//! Crank-angle arithmetic over the 720° four-stroke cycle. All angles in CA degrees.

/// Length of a four-stroke cycle [CA deg]
pub const CYCLE: f64 = 720.0;

/// Wraps `angle` into `[0, 720)`.
pub fn wrap_cycle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(CYCLE);
    // rem_euclid can round up to exactly CYCLE for tiny negative inputs
    if wrapped >= CYCLE {
        0.0
    } else {
        wrapped
    }
}

/// Forward distance from `from` to `to` along the cycle, in `[0, 720)`.
pub fn forward_distance(from: f64, to: f64) -> f64 {
    wrap_cycle(to - from)
}

/// Returns `true` if a crank sweep of `sweep` degrees starting at `prev` passes `mark`.
/// The start point itself is excluded and the end point included, so consecutive ticks
/// never report the same crossing twice.
pub fn crossed(prev: f64, sweep: f64, mark: f64) -> bool {
    if sweep <= 0.0 {
        return false;
    }
    if sweep >= CYCLE {
        return true;
    }
    let distance = forward_distance(prev, mark);
    distance > 0.0 && distance <= sweep
}
