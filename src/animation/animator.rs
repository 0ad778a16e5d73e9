use crate::animation::ease::{BOUNCE_INFLECTION, ease_bounce};
use crate::animation::path::ControlPath;
use crate::foundation::core::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Per-field animation settings, edited externally and read-only to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SliderField {
    /// `0` disables lag; values toward `1` lag more.
    pub smoothing: f64,
    /// Peak value added by a bounce accent.
    pub bounce_amount: f64,
    /// Bounce envelope length in milliseconds.
    pub bounce_duration: u64,
}

impl SliderField {
    /// Default smoothing applied to fields without explicit config.
    pub const DEFAULT_SMOOTHING: f64 = 0.5;
    /// Default bounce peak.
    pub const DEFAULT_BOUNCE_AMOUNT: f64 = 0.2;
    /// Default bounce length (ms).
    pub const DEFAULT_BOUNCE_DURATION: u64 = 500;

    /// Lag coefficient `alpha` of the exponential filter.
    pub fn alpha(&self) -> f64 {
        let s = if self.smoothing.is_finite() {
            self.smoothing.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if s == 0.0 {
            1.0
        } else {
            (1.0 - s) / 5.0 + 0.02
        }
    }
}

impl Default for SliderField {
    fn default() -> Self {
        Self {
            smoothing: Self::DEFAULT_SMOOTHING,
            bounce_amount: Self::DEFAULT_BOUNCE_AMOUNT,
            bounce_duration: Self::DEFAULT_BOUNCE_DURATION,
        }
    }
}

/// Slider configs keyed by the display form of a [`ControlPath`].
pub type SliderFields = BTreeMap<String, SliderField>;

#[derive(Debug, Clone, Copy, Default)]
struct FieldState {
    recent: Option<f64>,
    bounce_start: Option<Timestamp>,
}

/// Smoothing + bounce state for every animated field, keyed by control path.
///
/// Entries are never removed; fields that disappear from the scene tree simply stop being
/// read.
#[derive(Debug, Default)]
pub struct Animator {
    fields: HashMap<ControlPath, FieldState>,
}

impl Animator {
    /// Empty animator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn a destination value into this tick's rendered value.
    ///
    /// Applies the exponential lag, stores the lagged value, then adds any active bounce
    /// accent on top. The accent is never written back into the lag state.
    pub fn animate(
        &mut self,
        path: &ControlPath,
        dest: f64,
        field: &SliderField,
        now: Timestamp,
    ) -> f64 {
        let state = self.fields.entry(path.clone()).or_default();
        let dest = if dest.is_finite() {
            dest
        } else {
            state.recent.unwrap_or(0.0)
        };

        let smoothed = match state.recent {
            None => dest,
            Some(prev) => {
                let alpha = field.alpha();
                dest * alpha + prev * (1.0 - alpha)
            }
        };
        state.recent = Some(smoothed);

        smoothed + bounce_accent(state.bounce_start, field, now)
    }

    /// Start (or restart) the bounce envelope for `path` at `now`.
    pub fn bounce(&mut self, path: ControlPath, now: Timestamp) {
        self.fields.entry(path).or_default().bounce_start = Some(now);
    }

    /// Exchange the state of two scene roots, so fields keep their smoothed values when
    /// their scene moves from one side to the other.
    pub fn swap_roots(&mut self, a: &str, b: &str) {
        self.fields = std::mem::take(&mut self.fields)
            .into_iter()
            .map(|(path, state)| {
                let target = match path.first() {
                    Some(r) if r == a => Some(b),
                    Some(r) if r == b => Some(a),
                    _ => None,
                };
                let path = match target {
                    Some(root) => path.with_root(root),
                    None => path,
                };
                (path, state)
            })
            .collect();
    }

    /// Last stored smoothed value (pre-bounce).
    pub fn recent_value(&self, path: &ControlPath) -> Option<f64> {
        self.fields.get(path).and_then(|s| s.recent)
    }

    /// Time of the last bounce trigger.
    pub fn bounce_start(&self, path: &ControlPath) -> Option<Timestamp> {
        self.fields.get(path).and_then(|s| s.bounce_start)
    }

    /// Number of tracked fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when no field has been animated or bounced yet.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn bounce_accent(start: Option<Timestamp>, field: &SliderField, now: Timestamp) -> f64 {
    let Some(start) = start else {
        return 0.0;
    };
    if field.bounce_duration == 0 || !field.bounce_amount.is_finite() {
        return 0.0;
    }
    let progress = now.millis_since(start) / field.bounce_duration as f64;
    if progress <= 0.0 || progress >= 1.0 {
        return 0.0;
    }
    field.bounce_amount * ease_bounce(progress, BOUNCE_INFLECTION)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/animator.rs"]
mod tests;
