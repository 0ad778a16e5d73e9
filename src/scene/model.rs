use crate::animation::path::ControlPath;
use crate::effects::fx::EffectDef;
use crate::foundation::core::Timestamp;
use serde::{Deserialize, Serialize};

/// One node of the recursive composition tree.
///
/// Children are owned directly by their `Layers`/`Sequence` parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Scene {
    /// Solid black.
    Off(OffScene),
    /// Solid animated HSL color.
    Color(ColorScene),
    /// Frames pulled from an external video player.
    Video(VideoScene),
    /// Blended stack of child scenes.
    Layers(LayersScene),
    /// Timed list of child scenes with transitions between them.
    Sequence(SequenceScene),
    /// Any scene type this build does not know; renders black.
    #[serde(other)]
    Unknown,
}

impl Default for Scene {
    fn default() -> Self {
        Self::Off(OffScene::default())
    }
}

/// Renders black; only carries a label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OffScene {
    /// Operator-facing name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// `h` in degrees, `s` and `l` in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorScene {
    /// Operator-facing name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Hue.
    pub h: f64,
    /// Saturation.
    pub s: f64,
    /// Lightness.
    pub l: f64,
    /// Applied in order to the solid frame.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectDef>,
}

impl Default for ColorScene {
    fn default() -> Self {
        Self {
            label: None,
            h: 0.0,
            s: 1.0,
            l: 0.5,
            effects: Vec::new(),
        }
    }
}

/// Frames pulled from the player registered under `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoScene {
    /// Operator-facing name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Stable id of the player instance driving this node.
    pub id: String,
    /// Source media selected on the player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    /// Freeze playback on this frame index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_on_frame: Option<u64>,
    /// Opaque playback parameters forwarded to the player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Applied in order after the frame is pulled.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectDef>,
}

/// Stack of child scenes blended bottom-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayersScene {
    /// Operator-facing name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The last element is the base layer; earlier elements stack on top of it.
    pub layers: Vec<Layer>,
    /// Applied to the composited stack.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectDef>,
}

/// One entry of a [`LayersScene`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Unique within the stack; becomes the `layer_<key>` path segment.
    pub key: String,
    /// Layer content.
    pub scene: Scene,
    /// Ignored on the base layer.
    #[serde(default)]
    pub blend_mode: LayerBlendMode,
    /// Animated; `0` hides the layer. Ignored on the base layer.
    #[serde(default = "one")]
    pub blend_amount: f64,
}

/// How a layer is composited onto the layers below it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerBlendMode {
    /// Linear crossfade toward the layer.
    #[default]
    Mix,
    /// Saturating add of the scaled layer.
    Add,
    /// Use the layer as a luminance mask over the layers below.
    Mask,
    /// Unrecognized mode; the layer is skipped.
    #[serde(other)]
    Unknown,
}

/// How two scenes are crossfaded (sequence items, live/ready).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionMode {
    /// Linear crossfade.
    #[default]
    Mix,
    /// Dim the outgoing frame while adding the incoming one.
    Add,
}

/// Crossfade settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transition {
    /// Blend algorithm.
    pub mode: TransitionMode,
    /// Milliseconds.
    pub duration: u64,
}

impl Transition {
    /// Duration used when none is configured.
    pub const DEFAULT_DURATION_MS: u64 = 1_000;
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            mode: TransitionMode::Mix,
            duration: Self::DEFAULT_DURATION_MS,
        }
    }
}

/// Ordered playlist of child scenes.
///
/// The three transition fields are either all set (a transition toward
/// `next_active_key` is in flight) or all absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SequenceScene {
    /// Operator-facing name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Items in play order.
    pub sequence: Vec<SequenceItem>,
    /// Defaults to the first item's key when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_key: Option<String>,
    /// Item being transitioned into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_active_key: Option<String>,
    /// Start of the in-flight transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_start_time: Option<Timestamp>,
    /// End of the in-flight transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_end_time: Option<Timestamp>,
    /// Item-to-item crossfade; [`Transition::default`] when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    /// Applied to whatever the sequence renders.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectDef>,
}

/// One entry of a [`SequenceScene`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceItem {
    /// Unique within the sequence; becomes the `item_<key>` path segment.
    pub key: String,
    /// Item content.
    pub scene: Scene,
    /// Seconds after the item becomes active before the sequence auto-advances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
    /// Advance when this item's video reaches its last frame.
    #[serde(default)]
    pub go_next_on_end: bool,
}

/// An in-flight sequence transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTransition<'a> {
    /// Incoming item.
    pub next_key: &'a str,
    /// Transition start.
    pub start: Timestamp,
    /// Transition end.
    pub end: Timestamp,
}

fn one() -> f64 {
    1.0
}

impl SequenceScene {
    /// Transition used between items.
    pub fn effective_transition(&self) -> Transition {
        self.transition.unwrap_or_default()
    }

    /// Key of the active item (explicit, or the first item's key).
    pub fn active_key(&self) -> Option<&str> {
        match &self.active_key {
            Some(k) => Some(k.as_str()),
            None => self.sequence.first().map(|i| i.key.as_str()),
        }
    }

    /// Active item, if its key resolves.
    pub fn active_item(&self) -> Option<&SequenceItem> {
        let key = self.active_key()?;
        self.item(key)
    }

    /// Item by key.
    pub fn item(&self, key: &str) -> Option<&SequenceItem> {
        self.sequence.iter().find(|i| i.key == key)
    }

    /// The in-flight transition, when all three transition fields are present.
    pub fn pending(&self) -> Option<PendingTransition<'_>> {
        match (
            &self.next_active_key,
            self.transition_start_time,
            self.transition_end_time,
        ) {
            (Some(next_key), Some(start), Some(end)) => Some(PendingTransition {
                next_key,
                start,
                end,
            }),
            _ => None,
        }
    }

    /// Key of the item following the active one, cycling by array order.
    pub fn next_key(&self) -> Option<&str> {
        let current = self.active_key()?;
        let idx = self.sequence.iter().position(|i| i.key == current)?;
        let next = (idx + 1) % self.sequence.len();
        Some(self.sequence[next].key.as_str())
    }

    /// Commit an in-flight transition: the target becomes active and the transition
    /// fields are cleared. Returns `true` if anything changed.
    pub fn commit_pending(&mut self) -> bool {
        let had_fields = self.next_active_key.is_some()
            || self.transition_start_time.is_some()
            || self.transition_end_time.is_some();
        if let Some(next) = self.next_active_key.take() {
            self.active_key = Some(next);
        }
        self.transition_start_time = None;
        self.transition_end_time = None;
        had_fields
    }

    /// Commit the in-flight transition once its window has elapsed.
    pub fn settle(&mut self, now: Timestamp) -> bool {
        match self.pending() {
            Some(p) if now >= p.end => self.commit_pending(),
            _ => false,
        }
    }

    /// Start a transition to the next item. No-op (returns `false`) when the sequence is
    /// empty or the active key does not resolve.
    pub fn advance(&mut self, now: Timestamp) -> bool {
        if self.pending().is_some() {
            self.commit_pending();
        }
        let Some(next) = self.next_key().map(str::to_owned) else {
            return false;
        };
        let duration = self.effective_transition().duration;
        self.next_active_key = Some(next);
        self.transition_start_time = Some(now);
        self.transition_end_time = Some(now.add_millis(duration));
        true
    }
}

impl Scene {
    /// Display label, when set.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Off(s) => s.label.as_deref(),
            Self::Color(s) => s.label.as_deref(),
            Self::Video(s) => s.label.as_deref(),
            Self::Layers(s) => s.label.as_deref(),
            Self::Sequence(s) => s.label.as_deref(),
            Self::Unknown => None,
        }
    }

    /// Child scene addressed by one structural segment (`layer_<key>` / `item_<key>`).
    pub fn child(&self, segment: &str) -> Option<&Scene> {
        match self {
            Self::Layers(s) => {
                let key = segment.strip_prefix("layer_")?;
                s.layers.iter().find(|l| l.key == key).map(|l| &l.scene)
            }
            Self::Sequence(s) => {
                let key = segment.strip_prefix("item_")?;
                s.item(key).map(|i| &i.scene)
            }
            _ => None,
        }
    }

    /// Mutable variant of [`Scene::child`].
    pub fn child_mut(&mut self, segment: &str) -> Option<&mut Scene> {
        match self {
            Self::Layers(s) => {
                let key = segment.strip_prefix("layer_")?;
                s.layers
                    .iter_mut()
                    .find(|l| l.key == key)
                    .map(|l| &mut l.scene)
            }
            Self::Sequence(s) => {
                let key = segment.strip_prefix("item_")?;
                s.sequence
                    .iter_mut()
                    .find(|i| i.key == key)
                    .map(|i| &mut i.scene)
            }
            _ => None,
        }
    }

    /// Resolve a descendant by structural segments relative to this node.
    pub fn node_at(&self, segments: &[String]) -> Option<&Scene> {
        segments
            .iter()
            .try_fold(self, |node, seg| node.child(seg))
    }

    /// Mutable variant of [`Scene::node_at`].
    pub fn node_at_mut(&mut self, segments: &[String]) -> Option<&mut Scene> {
        let mut node = self;
        for seg in segments {
            node = node.child_mut(seg)?;
        }
        Some(node)
    }

    /// Visit every sequence node reachable from this one, with its control path.
    ///
    /// Only the *rendered* branches of a sequence are walked: the active item and, while a
    /// transition is in flight, the incoming item.
    pub fn visit_sequences<'a>(
        &'a self,
        path: &ControlPath,
        f: &mut dyn FnMut(&ControlPath, &'a SequenceScene),
    ) {
        match self {
            Self::Layers(s) => {
                for layer in &s.layers {
                    layer.scene.visit_sequences(&path.layer(&layer.key), f);
                }
            }
            Self::Sequence(s) => {
                f(path, s);
                let mut keys: Vec<&str> = s.active_key().into_iter().collect();
                if let Some(p) = s.pending()
                    && !keys.contains(&p.next_key)
                {
                    keys.push(p.next_key);
                }
                for key in keys {
                    if let Some(item) = s.item(key) {
                        item.scene.visit_sequences(&path.item(key), f);
                    }
                }
            }
            _ => {}
        }
    }

    /// Visit every sequence node (all branches) mutably, with its control path.
    pub fn visit_sequences_mut(
        &mut self,
        path: &ControlPath,
        f: &mut dyn FnMut(&ControlPath, &mut SequenceScene),
    ) {
        match self {
            Self::Layers(s) => {
                for layer in &mut s.layers {
                    let child = path.layer(&layer.key);
                    layer.scene.visit_sequences_mut(&child, f);
                }
            }
            Self::Sequence(s) => {
                f(path, s);
                for item in &mut s.sequence {
                    let child = path.item(&item.key);
                    item.scene.visit_sequences_mut(&child, f);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
