//! Stateless easing curves used by the animator.

/// Default point of the bounce envelope where the attack turns into release.
pub const BOUNCE_INFLECTION: f64 = 0.25;

/// Steepness of the logistic remap applied to linear ramps.
pub const SIGMOID_STEEPNESS: f64 = 12.0;

/// Logistic curve `1 / (1 + e^(-k (x - mid)))`.
pub fn sigmoid(x: f64, k: f64, mid: f64) -> f64 {
    1.0 / (1.0 + (-k * (x - mid)).exp())
}

/// S-curve on `[0, 1]`: the logistic curve (k=12, mid=0.5) rescaled so that
/// `smooth(0) == 0` and `smooth(1) == 1` exactly.
pub fn ease_smooth(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    let lo = sigmoid(0.0, SIGMOID_STEEPNESS, 0.5);
    let hi = sigmoid(1.0, SIGMOID_STEEPNESS, 0.5);
    ((sigmoid(x, SIGMOID_STEEPNESS, 0.5) - lo) / (hi - lo)).clamp(0.0, 1.0)
}

/// Asymmetric bounce envelope over normalized progress.
///
/// Rises from 0 to 1 at `inflection`, then falls back to 0 at `progress == 1`. Both ramps
/// go through [`ease_smooth`]. Outside `[0, 1]` the envelope is 0.
pub fn ease_bounce(progress: f64, inflection: f64) -> f64 {
    if !(0.0..=1.0).contains(&progress) {
        return 0.0;
    }
    let inflection = inflection.clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    let ramp = if progress < inflection {
        progress / inflection
    } else {
        (1.0 - progress) / (1.0 - inflection)
    };
    ease_smooth(ramp)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
