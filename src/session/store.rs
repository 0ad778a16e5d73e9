use crate::foundation::core::Timestamp;
use crate::foundation::error::{HaloError, HaloResult};
use crate::scene::state::MainState;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// JSON file holding the persisted [`MainState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the saved state. `Ok(None)` when no file exists yet.
    pub fn load(&self) -> HaloResult<Option<MainState>> {
        let f = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(HaloError::io(format!(
                    "open state '{}': {e}",
                    self.path.display()
                )));
            }
        };
        let state = MainState::from_reader(BufReader::new(f))?;
        state.validate()?;
        Ok(Some(state))
    }

    /// Load the saved state, substituting the default state on absence or corruption.
    pub fn load_or_default(&self) -> MainState {
        match self.load() {
            Ok(Some(state)) => {
                tracing::info!(path = %self.path.display(), "loaded saved state");
                state
            }
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no saved state; starting from defaults");
                MainState::default()
            }
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "saved state unusable; starting from defaults"
                );
                MainState::default()
            }
        }
    }

    /// Write `state` atomically: a sibling temp file is written, then renamed over the
    /// target.
    pub fn save(&self, state: &MainState) -> HaloResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                HaloError::io(format!("create state dir '{}': {e}", parent.display()))
            })?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let f = File::create(&tmp)
            .map_err(|e| HaloError::io(format!("create '{}': {e}", tmp.display())))?;
        let mut w = BufWriter::new(f);
        state.to_writer(&mut w)?;
        w.flush()
            .map_err(|e| HaloError::io(format!("flush '{}': {e}", tmp.display())))?;
        drop(w);

        std::fs::rename(&tmp, &self.path).map_err(|e| {
            HaloError::io(format!(
                "rename '{}' -> '{}': {e}",
                tmp.display(),
                self.path.display()
            ))
        })
    }
}

/// Trailing-edge debounce for state saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveDebounce {
    delay_ms: u64,
    last_change: Option<Timestamp>,
}

impl SaveDebounce {
    /// Debounce with a quiet period of `delay_ms`.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            last_change: None,
        }
    }

    /// Record a mutation at `now`; restarts the quiet period.
    pub fn mark(&mut self, now: Timestamp) {
        self.last_change = Some(now);
    }

    /// A mutation has not been saved yet.
    pub fn is_dirty(&self) -> bool {
        self.last_change.is_some()
    }

    /// `true` once the quiet period since the last mutation has elapsed.
    pub fn due(&self, now: Timestamp) -> bool {
        self.last_change
            .is_some_and(|t| now.millis_since(t) >= self.delay_ms as f64)
    }

    /// Mark everything saved.
    pub fn clear(&mut self) {
        self.last_change = None;
    }
}

enum WriteRequest {
    Save(Arc<MainState>),
    Sync(Sender<Option<String>>),
}

/// Saves [`MainState`] snapshots on a background thread so the tick loop never blocks on
/// disk IO.
///
/// Snapshots queued while a write is in progress collapse into the newest one. A failed
/// write is retried every [`StateWriter::RETRY_AFTER`] until it succeeds or a newer
/// snapshot replaces it. Dropping the writer lets it finish the queue, then joins it.
pub struct StateWriter {
    path: PathBuf,
    tx: Option<Sender<WriteRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl StateWriter {
    /// Delay between attempts to save a snapshot that failed to write.
    pub const RETRY_AFTER: Duration = Duration::from_secs(1);

    /// Start the writer thread for `store`.
    pub fn spawn(store: StateStore) -> HaloResult<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let path = store.path.clone();
        let worker = thread::Builder::new()
            .name("halo-state-writer".to_owned())
            .spawn(move || write_loop(&store, &rx))
            .map_err(|e| HaloError::io(format!("spawn state writer: {e}")))?;
        tracing::debug!(path = %path.display(), "state writer started");
        Ok(Self {
            path,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue `state` for writing and return immediately.
    pub fn submit(&self, state: Arc<MainState>) -> HaloResult<()> {
        self.send(WriteRequest::Save(state))
    }

    /// Block until every snapshot queued so far has been written.
    ///
    /// Returns the error of the last attempt when the newest snapshot could not be saved.
    pub fn sync(&self) -> HaloResult<()> {
        let (ack, done) = crossbeam_channel::bounded(1);
        self.send(WriteRequest::Sync(ack))?;
        match done.recv() {
            Ok(None) => Ok(()),
            Ok(Some(msg)) => Err(HaloError::io(msg)),
            Err(_) => Err(HaloError::io("state writer stopped")),
        }
    }

    fn send(&self, req: WriteRequest) -> HaloResult<()> {
        self.tx
            .as_ref()
            .and_then(|tx| tx.send(req).ok())
            .ok_or_else(|| HaloError::io("state writer stopped"))
    }
}

impl Drop for StateWriter {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!(path = %self.path.display(), "state writer panicked");
        }
    }
}

impl std::fmt::Debug for StateWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateWriter")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn write_loop(store: &StateStore, rx: &Receiver<WriteRequest>) {
    let mut pending: Option<Arc<MainState>> = None;
    let mut last_error: Option<String> = None;
    loop {
        let first = if pending.is_some() {
            match rx.recv_timeout(StateWriter::RETRY_AFTER) {
                Ok(req) => Some(req),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        } else {
            match rx.recv() {
                Ok(req) => Some(req),
                Err(_) => break,
            }
        };

        let mut acks = Vec::new();
        for req in first.into_iter().chain(rx.try_iter()) {
            match req {
                WriteRequest::Save(state) => pending = Some(state),
                WriteRequest::Sync(ack) => acks.push(ack),
            }
        }

        if let Some(state) = pending.take() {
            match store.save(&state) {
                Ok(()) => {
                    tracing::debug!(path = %store.path.display(), "state saved");
                    last_error = None;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "state save failed; will retry");
                    last_error = Some(err.to_string());
                    pending = Some(state);
                }
            }
        }
        for ack in acks {
            let _ = ack.send(last_error.clone());
        }
    }

    if let Some(state) = pending
        && let Err(err) = store.save(&state)
    {
        tracing::error!(error = %err, "state lost on shutdown");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/store.rs"]
mod tests;
