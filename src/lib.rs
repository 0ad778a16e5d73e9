//! Halo is the real-time scene compositing engine behind a radial LED stage.
//!
//! A recursive [`Scene`] tree (solid colors, video, layered blends, timed sequences) is
//! rendered into a linear RGB [`Frame`] every tick. Two trees are kept side by side: the
//! *live* scene shown on the hardware and the *ready* scene staged for the next cut, with
//! a crossfade between them.
//!
//! The public API is engine-oriented:
//!
//! - Load a [`MainState`] (JSON) and an [`EngineConfig`]
//! - Create an [`Engine`] with a [`Clock`], a [`VideoLibrary`] and [`Outputs`]
//! - Drive it with [`run`] at a fixed cadence, or call [`Engine::tick`] directly
//! - Mutate it from other threads through an [`EngineHandle`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod effects;
pub(crate) mod eval;
pub(crate) mod media;
pub(crate) mod output;
pub(crate) mod scene;
pub(crate) mod session;
pub(crate) mod stage;

pub use crate::foundation::clock::{Clock, ManualClock, SystemClock};
pub use crate::foundation::core::{Fps, Timestamp};
pub use crate::foundation::error::{HaloError, HaloResult};

pub use crate::animation::animator::{Animator, SliderField, SliderFields};
pub use crate::animation::ease::{BOUNCE_INFLECTION, ease_bounce, ease_smooth};
pub use crate::animation::path::ControlPath;
pub use crate::effects::composite::{blend_layer, blend_transition};
pub use crate::effects::fx::{EffectDef, EffectKind, ResolvedEffect, apply_effect, apply_effects};
pub use crate::eval::context::EvalContext;
pub use crate::eval::evaluator::{RenderedOutputs, SceneEvaluator};
pub use crate::media::video::{
    InMemoryVideoLibrary, InMemoryVideoPlayer, NoVideo, VideoLibrary, VideoPlayer,
    frames_from_raw,
};
pub use crate::output::sink::{FrameSink, InMemorySink, NullSink, Outputs, RawFileSink};
pub use crate::scene::model::{
    ColorScene, Layer, LayerBlendMode, LayersScene, OffScene, PendingTransition, Scene,
    SequenceItem, SequenceScene, Transition, TransitionMode, VideoScene,
};
pub use crate::scene::state::{MainState, Side, TransitionPhase, TransitionState};
pub use crate::session::commands::{Command, EngineHandle, StateUpdate, command_channel};
pub use crate::session::config::EngineConfig;
pub use crate::session::engine::{Engine, EngineOpts, TickReport};
pub use crate::session::scheduler::{Pacer, RunStats, SchedulerOpts, run};
pub use crate::session::sequencer::AutoAdvance;
pub use crate::session::store::{SaveDebounce, StateStore, StateWriter};
pub use crate::stage::frame::Frame;
pub use crate::stage::layout::StageLayout;
pub use crate::stage::map::{StageMap, StagePoint};
