use crate::animation::path::ControlPath;
use crate::foundation::core::Timestamp;
use crate::media::video::VideoLibrary;
use crate::scene::model::{Scene, SequenceScene};
use crate::scene::state::{MainState, Side};
use std::collections::HashMap;

/// One armed max-duration timer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Deadline {
    /// Item the timer was armed for.
    item: String,
    at: Timestamp,
}

/// Drives "go next" on live sequences.
///
/// Holds at most one timer per sequence node. Timers are recomputed after every state
/// mutation and fired from the tick loop, so nothing runs outside the scheduler thread.
#[derive(Debug, Default)]
pub struct AutoAdvance {
    deadlines: HashMap<ControlPath, Deadline>,
    /// Item each live sequence is showing or transitioning into, as of the last
    /// [`AutoAdvance::restart_activated`].
    current: HashMap<ControlPath, String>,
    /// Sequences whose current video item already triggered `goNextOnEnd`.
    ended: HashMap<ControlPath, String>,
}

/// The item a sequence is showing, or transitioning into.
fn current_item(seq: &SequenceScene) -> Option<&str> {
    match seq.pending() {
        Some(p) => Some(p.next_key),
        None => seq.active_key(),
    }
}

impl AutoAdvance {
    /// No timers armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute timers for every rendered live sequence.
    ///
    /// No timer runs while a sequence transition is in flight. Once an item has settled
    /// as active its timer is armed from `now` and kept across unrelated mutations until
    /// a different item takes over.
    pub fn reschedule(&mut self, state: &MainState, now: Timestamp) {
        let mut next = HashMap::new();
        state.live_scene.visit_sequences(
            &Side::Live.path(),
            &mut |path: &ControlPath, seq: &SequenceScene| {
                if seq.pending().is_some() {
                    return;
                }
                let Some(item) = seq.active_item() else {
                    return;
                };
                let Some(secs) = item.max_duration.filter(|d| d.is_finite() && *d >= 0.0)
                else {
                    return;
                };
                let deadline = match self.deadlines.get(path) {
                    Some(d) if d.item == item.key => d.clone(),
                    _ => Deadline {
                        item: item.key.clone(),
                        at: now.add_millis((secs * 1000.0).round() as u64),
                    },
                };
                next.insert(path.clone(), deadline);
            },
        );

        for (path, d) in &next {
            if self.deadlines.get(path) != Some(d) {
                tracing::debug!(%path, item = %d.item, at = d.at.as_millis(), "auto-advance armed");
            }
        }
        self.deadlines = next;
    }

    /// Rewind the player of every live video item that just became current, and re-arm
    /// its end trigger.
    ///
    /// A sequence seen for the first time is only recorded; its player keeps its position.
    pub fn restart_activated(&mut self, state: &MainState, videos: &mut dyn VideoLibrary) {
        let mut seen = HashMap::new();
        let mut activated = Vec::new();
        state.live_scene.visit_sequences(
            &Side::Live.path(),
            &mut |path: &ControlPath, seq: &SequenceScene| {
                let Some(key) = current_item(seq) else {
                    return;
                };
                if self.current.get(path).is_some_and(|prev| prev != key) {
                    let video = seq.item(key).and_then(|item| match &item.scene {
                        Scene::Video(v) => Some(v.id.clone()),
                        _ => None,
                    });
                    activated.push((path.clone(), key.to_owned(), video));
                }
                seen.insert(path.clone(), key.to_owned());
            },
        );

        for (path, key, video) in activated {
            if let Some(id) = video
                && let Some(player) = videos.player(&id)
            {
                player.restart();
                tracing::debug!(%path, item = %key, player = %id, "video item restarted");
            }
            self.ended.remove(&path);
        }
        self.ended.retain(|path, _| seen.contains_key(path));
        self.current = seen;
    }

    /// Drop timers and per-item tracking, e.g. before the live tree is replaced by a swap.
    pub fn forget_items(&mut self) {
        self.deadlines.clear();
        self.current.clear();
        self.ended.clear();
    }

    /// Remove and return every timer due at `now`.
    pub fn take_due(&mut self, now: Timestamp) -> Vec<ControlPath> {
        let mut due: Vec<ControlPath> = self
            .deadlines
            .iter()
            .filter(|(_, d)| d.at <= now)
            .map(|(p, _)| p.clone())
            .collect();
        due.sort();
        for path in &due {
            self.deadlines.remove(path);
        }
        due
    }

    /// Live sequences whose active video item has reached its last frame and asked to
    /// advance on end. Each item triggers at most once per activation.
    pub fn take_ended(
        &mut self,
        state: &MainState,
        videos: &mut dyn VideoLibrary,
    ) -> Vec<ControlPath> {
        let mut candidates = Vec::new();
        state.live_scene.visit_sequences(
            &Side::Live.path(),
            &mut |path: &ControlPath, seq: &SequenceScene| {
                if seq.pending().is_some() {
                    return;
                }
                let Some(item) = seq.active_item() else {
                    return;
                };
                if let Scene::Video(v) = &item.scene
                    && item.go_next_on_end
                {
                    candidates.push((path.clone(), item.key.clone(), v.id.clone()));
                }
            },
        );

        let mut fired = Vec::new();
        for (path, key, id) in candidates {
            if self.ended.get(&path) == Some(&key) {
                continue;
            }
            let Some(player) = videos.player(&id) else {
                continue;
            };
            let at_end = match (player.playing_frame(), player.frame_count()) {
                (Some(pos), Some(count)) if count > 0 => pos >= count - 1,
                _ => false,
            };
            if at_end {
                tracing::debug!(%path, item = %key, "video item ended");
                self.ended.insert(path.clone(), key);
                fired.push(path);
            }
        }
        fired
    }

    /// Armed deadline for the sequence at `path`.
    pub fn deadline(&self, path: &ControlPath) -> Option<Timestamp> {
        self.deadlines.get(path).map(|d| d.at)
    }

    /// Number of armed timers.
    pub fn armed(&self) -> usize {
        self.deadlines.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/sequencer.rs"]
mod tests;
