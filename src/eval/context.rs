use crate::animation::animator::SliderField;
use crate::animation::path::ControlPath;
use crate::foundation::core::Timestamp;
use crate::scene::state::MainState;
use crate::stage::frame::Frame;
use crate::stage::layout::StageLayout;

/// Read-only inputs shared by every node evaluated during one tick.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Tick time; every animated field and transition in this pass sees the same value.
    pub now: Timestamp,
    /// Geometry every frame is sized for.
    pub layout: &'a StageLayout,
    /// Snapshot taken at the start of the tick.
    pub state: &'a MainState,
    /// Shared black frame, handed out for `off` and for every fallback.
    pub black: &'a Frame,
}

impl<'a> EvalContext<'a> {
    /// Bundle the per-tick inputs.
    pub fn new(
        now: Timestamp,
        layout: &'a StageLayout,
        state: &'a MainState,
        black: &'a Frame,
    ) -> Self {
        Self {
            now,
            layout,
            state,
            black,
        }
    }

    pub(crate) fn slider_field(&self, path: &ControlPath) -> SliderField {
        self.state.slider_field(path)
    }

    /// Progress of a window that opened at `start` and lasts `duration_ms`.
    ///
    /// Unclamped above 1; a zero duration is complete immediately.
    pub(crate) fn progress_since(&self, start: Timestamp, duration_ms: u64) -> f64 {
        if duration_ms == 0 {
            return 1.0;
        }
        (self.now.millis_since(start) / duration_ms as f64).max(0.0)
    }
}
