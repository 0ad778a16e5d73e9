use crate::foundation::error::{HaloError, HaloResult};
use crate::stage::frame::Frame;
use crate::stage::layout::StageLayout;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// One logical video player, addressed by a stable id.
///
/// Every call must return immediately with whatever is already decoded; `None` means
/// "nothing available" and the caller substitutes black.
pub trait VideoPlayer: Send {
    /// Forward opaque playback parameters.
    fn set_params(&mut self, params: &serde_json::Value);
    /// Select the source track. Selecting the current track again is a no-op.
    fn select_video(&mut self, track: &str);
    /// Next frame of the selected track; advances playback.
    fn consume_frame(&mut self) -> Option<Frame>;
    /// Random access to one frame of the selected track, without side effects.
    fn read_frame(&self, index: u64) -> Option<Frame>;
    /// Rewind playback to the first frame.
    fn restart(&mut self);
    /// Index of the frame most recently handed out by `consume_frame`.
    fn playing_frame(&self) -> Option<u64>;
    /// Number of frames in the selected track.
    fn frame_count(&self) -> Option<u64>;
}

/// Lookup of players by id.
pub trait VideoLibrary: Send {
    /// Player registered under `id`, if any.
    fn player(&mut self, id: &str) -> Option<&mut dyn VideoPlayer>;
}

/// A library with no players; every video node renders black.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVideo;

impl VideoLibrary for NoVideo {
    fn player(&mut self, _id: &str) -> Option<&mut dyn VideoPlayer> {
        None
    }
}

type TrackTable = Arc<HashMap<String, Arc<[Frame]>>>;

/// Looping player over pre-decoded frames.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVideoPlayer {
    tracks: TrackTable,
    selected: Option<String>,
    cursor: u64,
    playing: Option<u64>,
    params: Option<serde_json::Value>,
}

impl InMemoryVideoPlayer {
    fn selected_frames(&self) -> Option<&[Frame]> {
        let key = self.selected.as_ref()?;
        self.tracks.get(key).map(|f| &f[..])
    }

    /// Track currently selected.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Last parameters received through `set_params`.
    pub fn params(&self) -> Option<&serde_json::Value> {
        self.params.as_ref()
    }
}

impl VideoPlayer for InMemoryVideoPlayer {
    fn set_params(&mut self, params: &serde_json::Value) {
        if self.params.as_ref() != Some(params) {
            self.params = Some(params.clone());
        }
    }

    fn select_video(&mut self, track: &str) {
        if self.selected.as_deref() == Some(track) {
            return;
        }
        self.selected = Some(track.to_owned());
        self.restart();
    }

    fn consume_frame(&mut self) -> Option<Frame> {
        let frames = self.selected_frames()?;
        if frames.is_empty() {
            return None;
        }
        let idx = self.cursor % frames.len() as u64;
        let frame = frames[idx as usize].clone();
        self.cursor = idx + 1;
        self.playing = Some(idx);
        Some(frame)
    }

    fn read_frame(&self, index: u64) -> Option<Frame> {
        let frames = self.selected_frames()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| frames.get(i))
            .cloned()
    }

    fn restart(&mut self) {
        self.cursor = 0;
        self.playing = None;
    }

    fn playing_frame(&self) -> Option<u64> {
        self.playing
    }

    fn frame_count(&self) -> Option<u64> {
        self.selected_frames().map(|f| f.len() as u64)
    }
}

/// Shared track table plus one lazily created player per id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVideoLibrary {
    tracks: TrackTable,
    players: HashMap<String, InMemoryVideoPlayer>,
}

impl InMemoryVideoLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a track. Existing players see the new table.
    pub fn insert_track(&mut self, name: impl Into<String>, frames: Vec<Frame>) {
        Arc::make_mut(&mut self.tracks).insert(name.into(), frames.into());
        for player in self.players.values_mut() {
            player.tracks = Arc::clone(&self.tracks);
        }
    }

    /// Names of all registered tracks.
    pub fn track_names(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    /// Load every `<track>.raw` cache in `dir`.
    ///
    /// A cache is the concatenation of whole stage frames. A trailing partial frame is
    /// dropped with a warning.
    pub fn load_dir(dir: impl AsRef<Path>, layout: &StageLayout) -> HaloResult<Self> {
        let dir = dir.as_ref();
        let mut lib = Self::new();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| HaloError::io(format!("read video dir '{}': {e}", dir.display())))?;
        for entry in entries {
            let path = entry
                .map_err(|e| HaloError::io(format!("read video dir '{}': {e}", dir.display())))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("raw") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = std::fs::read(&path)
                .map_err(|e| HaloError::io(format!("read '{}': {e}", path.display())))?;
            let frames = frames_from_raw(&bytes, layout);
            tracing::debug!(track = name, frames = frames.len(), "loaded video cache");
            lib.insert_track(name, frames);
        }
        Ok(lib)
    }
}

impl VideoLibrary for InMemoryVideoLibrary {
    fn player(&mut self, id: &str) -> Option<&mut dyn VideoPlayer> {
        let tracks = &self.tracks;
        let player = self
            .players
            .entry(id.to_owned())
            .or_insert_with(|| InMemoryVideoPlayer {
                tracks: Arc::clone(tracks),
                ..InMemoryVideoPlayer::default()
            });
        Some(player as &mut dyn VideoPlayer)
    }
}

/// Split a raw frame cache into stage frames.
pub fn frames_from_raw(bytes: &[u8], layout: &StageLayout) -> Vec<Frame> {
    let len = layout.frame_len();
    if len == 0 {
        return Vec::new();
    }
    let rem = bytes.len() % len;
    if rem != 0 {
        tracing::warn!(
            trailing = rem,
            frame_len = len,
            "raw video cache ends with a partial frame"
        );
    }
    bytes
        .chunks_exact(len)
        .map(|c| Frame::from_vec(c.to_vec()))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/media/video.rs"]
mod tests;
