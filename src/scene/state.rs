use crate::animation::animator::{SliderField, SliderFields};
use crate::animation::path::ControlPath;
use crate::foundation::core::Timestamp;
use crate::foundation::error::{HaloError, HaloResult};
use crate::scene::model::{Scene, SequenceScene, Transition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Which output stream a scene tree feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Broadcast to the hardware.
    Live,
    /// Staged for the next crossfade.
    Ready,
}

impl Side {
    /// Root segment of control paths on this side.
    pub fn root(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Ready => "ready",
        }
    }

    /// Root control path of this side's scene tree.
    pub fn path(self) -> ControlPath {
        ControlPath::root(self.root())
    }

    /// Side named by the first segment of `path`.
    pub fn of(path: &ControlPath) -> Option<Side> {
        match path.first()? {
            "live" => Some(Self::Live),
            "ready" => Some(Self::Ready),
            _ => None,
        }
    }
}

/// Raw live/ready crossfade controls as persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionState {
    /// Manual scrub position in `[0, 1]`.
    pub manual: Option<f64>,
    /// Start of an automatic crossfade.
    pub auto_start_time: Option<Timestamp>,
}

/// Interpreted crossfade state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionPhase {
    /// No crossfade; live is shown as is.
    Idle,
    /// Operator-held position in `[0, 1]`.
    ManualScrub(f64),
    /// Timed crossfade started at the given time.
    AutoRunning(Timestamp),
}

impl TransitionState {
    /// Interpret the raw fields. An auto run takes precedence over a stale scrub value.
    pub fn phase(&self) -> TransitionPhase {
        if let Some(start) = self.auto_start_time {
            return TransitionPhase::AutoRunning(start);
        }
        match self.manual {
            Some(v) if v.is_finite() => TransitionPhase::ManualScrub(v.clamp(0.0, 1.0)),
            _ => TransitionPhase::Idle,
        }
    }
}

/// Top-level engine state.
///
/// Treated as an immutable snapshot: updates build a new value and replace the old one
/// wholesale between ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MainState {
    /// Scene tree on the hardware.
    pub live_scene: Scene,
    /// Scene tree staged for the next cut.
    pub ready_scene: Scene,
    /// Live/ready crossfade settings.
    pub transition: Transition,
    /// Live/ready crossfade progress.
    pub transition_state: TransitionState,
    /// Slider configs for `live:` paths.
    pub live_slider_fields: SliderFields,
    /// Slider configs for `ready:` paths.
    pub ready_slider_fields: SliderFields,
    /// Control-surface layout for the live side; opaque to the engine.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub live_dashboard: serde_json::Value,
    /// Control-surface layout for the ready side; opaque to the engine.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub ready_dashboard: serde_json::Value,
}

impl MainState {
    /// Parse a state snapshot from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> HaloResult<Self> {
        serde_json::from_reader(r).map_err(|e| HaloError::serde(format!("parse state JSON: {e}")))
    }

    /// Parse a state snapshot from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> HaloResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| HaloError::io(format!("open state JSON '{}': {e}", path.display())))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Serialize as pretty JSON.
    pub fn to_writer<W: std::io::Write>(&self, w: W) -> HaloResult<()> {
        serde_json::to_writer_pretty(w, self)
            .map_err(|e| HaloError::serde(format!("write state JSON: {e}")))
    }

    /// Check structural invariants of both scene trees.
    pub fn validate(&self) -> HaloResult<()> {
        validate_scene(&self.live_scene, &Side::Live.path())?;
        validate_scene(&self.ready_scene, &Side::Ready.path())?;
        if let Some(v) = self.transition_state.manual
            && !v.is_finite()
        {
            return Err(HaloError::validation("transitionState.manual must be finite"));
        }
        Ok(())
    }

    /// Scene tree of one side.
    pub fn scene(&self, side: Side) -> &Scene {
        match side {
            Side::Live => &self.live_scene,
            Side::Ready => &self.ready_scene,
        }
    }

    /// Mutable scene tree of one side.
    pub fn scene_mut(&mut self, side: Side) -> &mut Scene {
        match side {
            Side::Live => &mut self.live_scene,
            Side::Ready => &mut self.ready_scene,
        }
    }

    /// Slider configs of one side.
    pub fn slider_fields(&self, side: Side) -> &SliderFields {
        match side {
            Side::Live => &self.live_slider_fields,
            Side::Ready => &self.ready_slider_fields,
        }
    }

    /// Slider config for `path`, defaulted when absent.
    pub fn slider_field(&self, path: &ControlPath) -> SliderField {
        let side = Side::of(path).unwrap_or(Side::Live);
        self.slider_fields(side)
            .get(&path.to_string())
            .copied()
            .unwrap_or_default()
    }

    /// Live -> ready crossfade progress at `now`, in `[0, 1]`.
    pub fn transition_progress(&self, now: Timestamp) -> f64 {
        match self.transition_state.phase() {
            TransitionPhase::Idle => 0.0,
            TransitionPhase::ManualScrub(v) => v,
            TransitionPhase::AutoRunning(start) => {
                if self.transition.duration == 0 {
                    return 1.0;
                }
                let p = now.millis_since(start) / self.transition.duration as f64;
                p.clamp(0.0, 1.0)
            }
        }
    }

    /// `true` once the crossfade has fully reached the ready side.
    pub fn transition_complete(&self, now: Timestamp) -> bool {
        match self.transition_state.phase() {
            TransitionPhase::Idle => false,
            TransitionPhase::ManualScrub(v) => v >= 1.0,
            TransitionPhase::AutoRunning(_) => self.transition_progress(now) >= 1.0,
        }
    }

    /// Swap live and ready (scenes, slider configs and dashboards) and go idle.
    pub fn swapped(&self) -> MainState {
        MainState {
            live_scene: self.ready_scene.clone(),
            ready_scene: self.live_scene.clone(),
            transition: self.transition,
            transition_state: TransitionState::default(),
            live_slider_fields: rebase_fields(&self.ready_slider_fields, Side::Live),
            ready_slider_fields: rebase_fields(&self.live_slider_fields, Side::Ready),
            live_dashboard: self.ready_dashboard.clone(),
            ready_dashboard: self.live_dashboard.clone(),
        }
    }

    /// Start an automatic crossfade at `now`.
    pub fn with_auto_transition(&self, now: Timestamp) -> MainState {
        let mut next = self.clone();
        next.transition_state = TransitionState {
            manual: None,
            auto_start_time: Some(now),
        };
        next
    }

    /// Set the manual scrub position (cancels any auto run).
    pub fn with_manual(&self, value: f64) -> MainState {
        let mut next = self.clone();
        next.transition_state = TransitionState {
            manual: Some(if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                0.0
            }),
            auto_start_time: None,
        };
        next
    }

    /// Start a transition to the next item of the sequence at `path`.
    ///
    /// Returns `None` when the path does not address a sequence or advancing is a no-op.
    pub fn with_sequence_advanced(&self, path: &ControlPath, now: Timestamp) -> Option<MainState> {
        let side = Side::of(path)?;
        let mut next = self.clone();
        let node = next.scene_mut(side).node_at_mut(&path.segments()[1..])?;
        let Scene::Sequence(seq) = node else {
            return None;
        };
        if !seq.advance(now) {
            return None;
        }
        Some(next)
    }

    /// Commit every finished sequence transition on both sides.
    pub fn with_sequences_settled(&self, now: Timestamp) -> Option<MainState> {
        let mut next = self.clone();
        let mut changed = false;
        for side in [Side::Live, Side::Ready] {
            next.scene_mut(side).visit_sequences_mut(
                &side.path(),
                &mut |_: &ControlPath, seq: &mut SequenceScene| changed |= seq.settle(now),
            );
        }
        changed.then_some(next)
    }
}

/// Slider configs are keyed by full path string; re-root them onto the other side.
fn rebase_fields(fields: &SliderFields, side: Side) -> SliderFields {
    fields
        .iter()
        .map(|(k, v)| {
            let path = ControlPath::parse(k);
            let key = if Side::of(&path).is_some() {
                path.with_root(side.root()).to_string()
            } else {
                k.clone()
            };
            (key, *v)
        })
        .collect()
}

fn validate_scene(scene: &Scene, path: &ControlPath) -> HaloResult<()> {
    match scene {
        Scene::Color(c) => {
            if !(c.h.is_finite() && c.s.is_finite() && c.l.is_finite()) {
                return Err(HaloError::validation(format!(
                    "{path}: color h/s/l must be finite"
                )));
            }
        }
        Scene::Layers(s) => {
            let mut seen = HashSet::new();
            for layer in &s.layers {
                if !seen.insert(layer.key.as_str()) {
                    return Err(HaloError::validation(format!(
                        "{path}: duplicate layer key '{}'",
                        layer.key
                    )));
                }
                if !layer.blend_amount.is_finite() {
                    return Err(HaloError::validation(format!(
                        "{path}: layer '{}' blendAmount must be finite",
                        layer.key
                    )));
                }
                validate_scene(&layer.scene, &path.layer(&layer.key))?;
            }
        }
        Scene::Sequence(s) => {
            let mut seen = HashSet::new();
            for item in &s.sequence {
                if !seen.insert(item.key.as_str()) {
                    return Err(HaloError::validation(format!(
                        "{path}: duplicate sequence key '{}'",
                        item.key
                    )));
                }
                if let Some(d) = item.max_duration
                    && !(d.is_finite() && d >= 0.0)
                {
                    return Err(HaloError::validation(format!(
                        "{path}: item '{}' maxDuration must be a non-negative number",
                        item.key
                    )));
                }
                validate_scene(&item.scene, &path.item(&item.key))?;
            }
            let present = [
                s.next_active_key.is_some(),
                s.transition_start_time.is_some(),
                s.transition_end_time.is_some(),
            ];
            if present.iter().any(|&p| p) && !present.iter().all(|&p| p) {
                return Err(HaloError::validation(format!(
                    "{path}: nextActiveKey/transitionStartTime/transitionEndTime must be set together"
                )));
            }
        }
        Scene::Off(_) | Scene::Video(_) | Scene::Unknown => {}
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/state.rs"]
mod tests;
