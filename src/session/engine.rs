use crate::animation::animator::Animator;
use crate::animation::path::ControlPath;
use crate::eval::context::EvalContext;
use crate::eval::evaluator::SceneEvaluator;
use crate::foundation::clock::Clock;
use crate::foundation::core::{Fps, Timestamp};
use crate::foundation::error::HaloResult;
use crate::media::video::{NoVideo, VideoLibrary};
use crate::output::sink::Outputs;
use crate::scene::state::{MainState, Side};
use crate::session::commands::{Command, EngineHandle, command_channel};
use crate::session::config::EngineConfig;
use crate::session::sequencer::AutoAdvance;
use crate::session::store::{SaveDebounce, StateStore, StateWriter};
use crate::stage::frame::Frame;
use crate::stage::layout::StageLayout;
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// Options controlling an [`Engine`].
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOpts {
    /// Stage geometry; every frame has its byte length.
    pub layout: StageLayout,
    /// Nominal tick rate.
    pub fps: Fps,
    /// Quiet period before a dirty state is persisted.
    pub save_debounce_ms: u64,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            layout: StageLayout::default(),
            fps: Fps::STAGE,
            save_debounce_ms: 1_000,
        }
    }
}

impl From<&EngineConfig> for EngineOpts {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            layout: cfg.stage,
            fps: cfg.fps,
            save_debounce_ms: cfg.save_debounce_ms,
        }
    }
}

/// What one tick produced.
#[derive(Clone, Debug)]
pub struct TickReport {
    /// Clock reading the tick ran at.
    pub now: Timestamp,
    /// Frame sent to the hardware and live preview.
    pub live: Frame,
    /// Frame sent to the ready preview.
    pub ready: Frame,
    /// Live -> ready progress blended into `live`.
    pub progress: f64,
    /// `true` when this tick completed the crossfade and swapped sides.
    pub swapped: bool,
}

/// Owns the state snapshot, animator and collaborators; advanced one tick at a time.
///
/// All mutation happens inside [`Engine::tick`] (or the direct `apply`/`bounce` calls on
/// the owning thread). Other threads talk to it through an [`EngineHandle`].
pub struct Engine {
    opts: EngineOpts,
    state: Arc<MainState>,
    animator: Animator,
    black: Frame,
    clock: Arc<dyn Clock>,
    videos: Box<dyn VideoLibrary>,
    outputs: Outputs,
    auto: AutoAdvance,
    writer: Option<StateWriter>,
    save: SaveDebounce,
    handle: EngineHandle,
    commands: Receiver<Command>,
    shutdown: bool,
    ticks: u64,
}

impl Engine {
    /// Construct an engine around an initial state.
    pub fn new(opts: EngineOpts, state: MainState, clock: Arc<dyn Clock>) -> HaloResult<Self> {
        opts.layout.validate()?;
        Fps::new(opts.fps.num, opts.fps.den)?;
        state.validate()?;

        let (handle, commands) = command_channel();
        let now = clock.now();
        let mut auto = AutoAdvance::new();
        auto.reschedule(&state, now);
        tracing::debug!(
            strips = opts.layout.strips,
            pixels_per_strip = opts.layout.pixels_per_strip,
            fps = opts.fps.as_f64(),
            "engine created"
        );

        Ok(Self {
            black: Frame::black(&opts.layout),
            save: SaveDebounce::new(opts.save_debounce_ms),
            opts,
            state: Arc::new(state),
            animator: Animator::new(),
            clock,
            videos: Box::new(NoVideo),
            outputs: Outputs::default(),
            auto,
            writer: None,
            handle,
            commands,
            shutdown: false,
            ticks: 0,
        })
    }

    /// Build from a config: the initial state comes from `config.state_path` when set.
    pub fn from_config(config: &EngineConfig, clock: Arc<dyn Clock>) -> HaloResult<Self> {
        config.validate()?;
        let store = config.state_path.as_ref().map(StateStore::new);
        let state = store
            .as_ref()
            .map(StateStore::load_or_default)
            .unwrap_or_default();
        let engine = Self::new(EngineOpts::from(config), state, clock)?;
        match store {
            Some(store) => engine.with_store(store),
            None => Ok(engine),
        }
    }

    /// Use `videos` for video nodes instead of rendering them black.
    pub fn with_videos(mut self, videos: Box<dyn VideoLibrary>) -> Self {
        self.videos = videos;
        self
    }

    /// Publish frames to `outputs`.
    pub fn with_outputs(mut self, outputs: Outputs) -> Self {
        self.outputs = outputs;
        self
    }

    /// Persist state changes through `store`, debounced. Writes run on a background
    /// [`StateWriter`] thread.
    pub fn with_store(mut self, store: StateStore) -> HaloResult<Self> {
        self.writer = Some(StateWriter::spawn(store)?);
        Ok(self)
    }

    /// Options the engine was built with.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    /// Sender for control-plane commands.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<MainState> {
        Arc::clone(&self.state)
    }

    /// Smoothing and bounce state.
    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Armed sequence timers.
    pub fn auto_advance(&self) -> &AutoAdvance {
        &self.auto
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// `true` once a `Shutdown` command was processed.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Replace the state with `update(current)`.
    pub fn apply(&mut self, update: impl FnOnce(&MainState) -> MainState) {
        let now = self.clock.now();
        let next = update(self.state.as_ref());
        self.replace_state(next, now);
    }

    /// Restart the bounce envelope of one animated field.
    pub fn bounce(&mut self, path: ControlPath) {
        let now = self.clock.now();
        self.animator.bounce(path, now);
    }

    /// Start a transition to the next item of the sequence at `path`.
    ///
    /// Returns `false` when `path` is not a sequence or advancing is a no-op.
    pub fn advance_sequence(&mut self, path: &ControlPath) -> bool {
        let now = self.clock.now();
        self.advance_at(path, now)
    }

    fn advance_at(&mut self, path: &ControlPath, now: Timestamp) -> bool {
        match self.state.with_sequence_advanced(path, now) {
            Some(next) => {
                tracing::debug!(%path, "sequence advanced");
                self.replace_state(next, now);
                true
            }
            None => {
                tracing::debug!(%path, "advance ignored; no sequence to advance");
                false
            }
        }
    }

    fn replace_state(&mut self, next: MainState, now: Timestamp) {
        if let Err(err) = next.validate() {
            tracing::warn!(error = %err, "rejected state update");
            return;
        }
        self.state = Arc::new(next);
        self.save.mark(now);
        self.auto.reschedule(&self.state, now);
    }

    fn drain_commands(&mut self, now: Timestamp) {
        while let Ok(cmd) = self.commands.try_recv() {
            tracing::trace!(?cmd, "command");
            match cmd {
                Command::Update(update) => {
                    let next = update(self.state.as_ref());
                    self.replace_state(next, now);
                }
                Command::Bounce(path) => self.animator.bounce(path, now),
                Command::AdvanceSequence(path) => {
                    self.advance_at(&path, now);
                }
                Command::StartAutoTransition => {
                    let next = self.state.with_auto_transition(now);
                    self.replace_state(next, now);
                }
                Command::ManualScrub(value) => {
                    let next = self.state.with_manual(value);
                    self.replace_state(next, now);
                }
                Command::Shutdown => {
                    tracing::info!("shutdown requested");
                    self.shutdown = true;
                }
            }
        }
    }

    /// Run one tick: apply queued commands, fire timers, complete transitions, render
    /// both sides and publish the frames.
    ///
    /// Video items that become current are rewound before anything reads their player.
    #[tracing::instrument(level = "trace", skip(self), fields(tick = self.ticks))]
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        self.drain_commands(now);

        if let Some(next) = self.state.with_sequences_settled(now) {
            self.replace_state(next, now);
        }
        for path in self.auto.take_due(now) {
            self.advance_at(&path, now);
        }
        self.auto.restart_activated(&self.state, self.videos.as_mut());
        for path in self.auto.take_ended(&self.state, self.videos.as_mut()) {
            self.advance_at(&path, now);
        }

        let swapped = self.state.transition_complete(now);
        if swapped {
            tracing::info!("transition complete; swapping live and ready");
            let next = self.state.swapped();
            self.auto.forget_items();
            self.replace_state(next, now);
            self.animator
                .swap_roots(Side::Live.root(), Side::Ready.root());
        }
        self.auto.restart_activated(&self.state, self.videos.as_mut());

        let rendered = {
            let ctx = EvalContext::new(now, &self.opts.layout, &self.state, &self.black);
            SceneEvaluator::new(ctx, &mut self.animator, self.videos.as_mut()).render_outputs()
        };
        self.outputs.publish(&rendered.live, &rendered.ready);

        self.persist_if_due(now);
        self.ticks += 1;

        TickReport {
            now,
            live: rendered.live,
            ready: rendered.ready,
            progress: rendered.progress,
            swapped,
        }
    }

    fn persist_if_due(&mut self, now: Timestamp) {
        let Some(writer) = &self.writer else {
            return;
        };
        if !self.save.due(now) {
            return;
        }
        match writer.submit(Arc::clone(&self.state)) {
            Ok(()) => self.save.clear(),
            Err(err) => {
                tracing::warn!(error = %err, "state save not queued; will retry");
                self.save.mark(now);
            }
        }
    }

    /// Queue a pending state change immediately and wait until the writer has saved it.
    pub fn flush(&mut self) -> HaloResult<()> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };
        if self.save.is_dirty() {
            writer.submit(Arc::clone(&self.state))?;
            self.save.clear();
        }
        writer.sync()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("opts", &self.opts)
            .field("ticks", &self.ticks)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/engine.rs"]
mod tests;
