use super::*;
use crate::foundation::clock::ManualClock;
use crate::foundation::error::HaloError;
use crate::output::sink::InMemorySink;
use crate::media::video::VideoPlayer;
use crate::scene::model::{
    ColorScene, Scene, SequenceItem, SequenceScene, Transition, TransitionMode, VideoScene,
};
use std::sync::atomic::{AtomicUsize, Ordering};

fn opts() -> EngineOpts {
    EngineOpts {
        layout: StageLayout {
            strips: 4,
            pixels_per_strip: 3,
            inner_radius_ratio: 0.25,
        },
        fps: Fps::STAGE,
        save_debounce_ms: 100,
    }
}

fn color(h: f64) -> Scene {
    Scene::Color(ColorScene {
        h,
        ..ColorScene::default()
    })
}

fn engine(state: MainState) -> (Engine, ManualClock) {
    let clock = ManualClock::new(Timestamp(0));
    let engine = Engine::new(opts(), state, Arc::new(clock.clone())).unwrap();
    (engine, clock)
}

fn red_blue() -> MainState {
    MainState {
        live_scene: color(0.0),
        ready_scene: color(240.0),
        ..MainState::default()
    }
}

#[test]
fn rejects_invalid_initial_state() {
    let mut state = MainState::default();
    state.transition_state.manual = Some(f64::NAN);
    let clock = ManualClock::new(Timestamp(0));
    assert!(Engine::new(opts(), state, Arc::new(clock)).is_err());
}

#[test]
fn manual_one_swaps_on_next_tick() {
    let (mut engine, _clock) = engine(red_blue().with_manual(1.0));
    let report = engine.tick();
    assert!(report.swapped);
    assert_eq!(report.progress, 0.0);

    let state = engine.state();
    assert_eq!(state.live_scene, color(240.0));
    assert_eq!(state.ready_scene, color(0.0));
    assert_eq!(state.transition_state.manual, None);
    assert_eq!(state.transition_state.auto_start_time, None);

    let layout = opts().layout;
    assert_eq!(report.live, Frame::solid_hsl(&layout, 240.0, 1.0, 0.5));
    assert_eq!(report.ready, Frame::solid_hsl(&layout, 0.0, 1.0, 0.5));
}

#[test]
fn auto_transition_runs_then_swaps() {
    let (mut engine, clock) = engine(red_blue());
    engine.handle().start_auto_transition().unwrap();

    assert_eq!(engine.tick().progress, 0.0);
    clock.set(Timestamp(500));
    let mid = engine.tick();
    assert_eq!(mid.progress, 0.5);
    assert!(!mid.swapped);

    clock.set(Timestamp(1_000));
    let done = engine.tick();
    assert!(done.swapped);
    assert_eq!(engine.state().live_scene, color(240.0));
}

#[test]
fn smoothed_fields_follow_their_scene_across_a_swap() {
    let (mut engine, _clock) = engine(red_blue());
    engine.tick();
    engine.handle().manual_scrub(1.0).unwrap();
    let report = engine.tick();
    assert!(report.swapped);
    // Blue moved to live without easing in from red.
    let h = engine
        .animator()
        .recent_value(&ControlPath::parse("live:h"))
        .unwrap();
    assert!((h - 240.0).abs() < 1e-9);
    assert_eq!(report.live, Frame::solid_hsl(&opts().layout, 240.0, 1.0, 0.5));
}

#[test]
fn bounce_command_is_applied_at_tick_time() {
    let (mut engine, clock) = engine(red_blue());
    clock.set(Timestamp(40));
    engine.handle().bounce(ControlPath::parse("live:l")).unwrap();
    engine.tick();
    assert_eq!(
        engine.animator().bounce_start(&ControlPath::parse("live:l")),
        Some(Timestamp(40))
    );
}

#[test]
fn invalid_updates_are_rejected() {
    let (mut engine, _clock) = engine(red_blue());
    engine
        .handle()
        .update(|s| {
            let mut next = s.clone();
            next.live_scene = Scene::Sequence(SequenceScene {
                next_active_key: Some("x".to_owned()),
                ..SequenceScene::default()
            });
            next
        })
        .unwrap();
    engine.tick();
    assert_eq!(engine.state().live_scene, color(0.0));
}

#[test]
fn max_duration_counts_from_when_the_item_settles() {
    let item = |key: &str, h: f64| SequenceItem {
        key: key.to_owned(),
        scene: color(h),
        max_duration: Some(1.0),
        go_next_on_end: false,
    };
    let state = MainState {
        live_scene: Scene::Sequence(SequenceScene {
            sequence: vec![item("a", 0.0), item("b", 120.0)],
            ..SequenceScene::default()
        }),
        ..MainState::default()
    };
    let (mut engine, clock) = engine(state);
    let root = ControlPath::root("live");
    assert_eq!(engine.auto_advance().deadline(&root), Some(Timestamp(1_000)));

    engine.tick();
    clock.set(Timestamp(1_000));
    engine.tick();
    let state = engine.state();
    let Scene::Sequence(seq) = &state.live_scene else {
        panic!("expected sequence");
    };
    assert_eq!(seq.next_active_key.as_deref(), Some("b"));
    assert_eq!(seq.transition_start_time, Some(Timestamp(1_000)));
    assert_eq!(engine.auto_advance().deadline(&root), None);

    clock.set(Timestamp(2_000));
    engine.tick();
    let state = engine.state();
    let Scene::Sequence(seq) = &state.live_scene else {
        panic!("expected sequence");
    };
    // b is shown on its own for its full max duration.
    assert_eq!(seq.active_key.as_deref(), Some("b"));
    assert_eq!(seq.next_active_key, None);
    assert_eq!(engine.auto_advance().deadline(&root), Some(Timestamp(3_000)));

    clock.set(Timestamp(2_999));
    engine.tick();
    assert_eq!(engine.state().live_scene.clone(), state.live_scene);

    clock.set(Timestamp(3_000));
    engine.tick();
    let state = engine.state();
    let Scene::Sequence(seq) = &state.live_scene else {
        panic!("expected sequence");
    };
    assert_eq!(seq.next_active_key.as_deref(), Some("a"));
}

/// Non-looping deck that holds on its last frame.
#[derive(Debug)]
struct OneShotDeck {
    len: u64,
    cursor: u64,
    playing: Option<u64>,
    restarts: Arc<AtomicUsize>,
}

impl VideoPlayer for OneShotDeck {
    fn set_params(&mut self, _params: &serde_json::Value) {}

    fn select_video(&mut self, _track: &str) {}

    fn consume_frame(&mut self) -> Option<Frame> {
        self.playing = Some(self.cursor.min(self.len - 1));
        self.cursor += 1;
        Some(Frame::black(&opts().layout))
    }

    fn read_frame(&self, _index: u64) -> Option<Frame> {
        None
    }

    fn restart(&mut self) {
        self.cursor = 0;
        self.playing = None;
        self.restarts.fetch_add(1, Ordering::SeqCst);
    }

    fn playing_frame(&self) -> Option<u64> {
        self.playing
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.len)
    }
}

#[derive(Debug)]
struct OneDeckLibrary(OneShotDeck);

impl VideoLibrary for OneDeckLibrary {
    fn player(&mut self, id: &str) -> Option<&mut dyn VideoPlayer> {
        (id == "deck").then_some(&mut self.0 as &mut dyn VideoPlayer)
    }
}

#[test]
fn returning_video_item_plays_from_its_first_frame() {
    let restarts = Arc::new(AtomicUsize::new(0));
    let deck = OneShotDeck {
        len: 3,
        cursor: 0,
        playing: None,
        restarts: Arc::clone(&restarts),
    };
    let clip = SequenceItem {
        key: "vid".to_owned(),
        scene: Scene::Video(VideoScene {
            id: "deck".to_owned(),
            track: Some("loop".to_owned()),
            ..VideoScene::default()
        }),
        max_duration: None,
        go_next_on_end: true,
    };
    let hold = SequenceItem {
        key: "col".to_owned(),
        scene: color(60.0),
        max_duration: Some(0.5),
        go_next_on_end: false,
    };
    let state = MainState {
        live_scene: Scene::Sequence(SequenceScene {
            sequence: vec![clip, hold],
            transition: Some(Transition {
                mode: TransitionMode::Mix,
                duration: 0,
            }),
            ..SequenceScene::default()
        }),
        ..MainState::default()
    };
    let (engine, clock) = engine(state);
    let mut engine = engine.with_videos(Box::new(OneDeckLibrary(deck)));

    let mut runs: Vec<u32> = Vec::new();
    let mut on_clip = false;
    for i in 0..61 {
        clock.set(Timestamp(i * 33));
        engine.tick();
        let state = engine.state();
        let Scene::Sequence(seq) = &state.live_scene else {
            panic!("expected sequence");
        };
        let showing = seq.active_key() == Some("vid");
        match (showing, on_clip) {
            (true, true) => *runs.last_mut().unwrap() += 1,
            (true, false) => runs.push(1),
            _ => {}
        }
        on_clip = showing;
    }

    assert!(runs.len() >= 2, "clip never came back: {runs:?}");
    assert!(runs.iter().all(|&n| n >= 3), "clip cut short: {runs:?}");
    assert!(restarts.load(Ordering::SeqCst) >= 2);
}

#[test]
fn outputs_receive_every_tick() {
    let hardware = InMemorySink::new();
    let ready = InMemorySink::new();
    let (engine, _clock) = engine(red_blue());
    let mut engine = engine.with_outputs(Outputs {
        hardware: Box::new(hardware.clone()),
        live_preview: Box::new(crate::output::sink::NullSink),
        ready_preview: Box::new(ready.clone()),
    });
    for _ in 0..3 {
        engine.tick();
    }
    assert_eq!(hardware.len(), 3);
    assert_eq!(ready.len(), 3);
    assert_eq!(
        ready.last(),
        Some(Frame::solid_hsl(&opts().layout, 240.0, 1.0, 0.5))
    );
    assert_eq!(engine.ticks(), 3);
}

#[test]
fn state_changes_are_saved_after_debounce() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let (engine, clock) = engine(red_blue());
    let mut engine = engine.with_store(StateStore::new(&path)).unwrap();

    engine.tick();
    engine.flush().unwrap();
    assert!(!path.exists());

    engine.apply(|s| s.with_manual(0.3));
    clock.set(Timestamp(50));
    engine.tick();
    assert!(engine.save.is_dirty());

    clock.set(Timestamp(100));
    engine.tick();
    assert!(!engine.save.is_dirty());

    engine.flush().unwrap();
    let saved = StateStore::new(&path).load().unwrap().unwrap();
    assert_eq!(saved.transition_state.manual, Some(0.3));
}

#[test]
fn flush_writes_pending_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let (engine, _clock) = engine(red_blue());
    let mut engine = engine.with_store(StateStore::new(&path)).unwrap();
    engine.flush().unwrap();
    assert!(!path.exists());

    engine.apply(|s| s.with_auto_transition(Timestamp(7)));
    engine.flush().unwrap();
    let saved = StateStore::new(&path).load().unwrap().unwrap();
    assert_eq!(saved.transition_state.auto_start_time, Some(Timestamp(7)));
}

#[test]
fn failed_save_surfaces_on_flush_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let path = blocker.join("state.json");
    let (engine, clock) = engine(red_blue());
    let mut engine = engine.with_store(StateStore::new(&path)).unwrap();

    engine.apply(|s| s.with_manual(0.6));
    clock.set(Timestamp(100));
    engine.tick();
    assert!(matches!(engine.flush(), Err(HaloError::Io(_))));

    std::fs::remove_file(&blocker).unwrap();
    engine.flush().unwrap();
    let saved = StateStore::new(&path).load().unwrap().unwrap();
    assert_eq!(saved.transition_state.manual, Some(0.6));
}

#[test]
fn shutdown_command_sets_flag() {
    let (mut engine, _clock) = engine(red_blue());
    engine.handle().shutdown().unwrap();
    assert!(!engine.is_shutdown());
    engine.tick();
    assert!(engine.is_shutdown());
}

#[test]
fn from_config_loads_saved_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    StateStore::new(&path).save(&red_blue()).unwrap();

    let cfg = EngineConfig {
        stage: opts().layout,
        state_path: Some(path),
        ..EngineConfig::default()
    };
    let engine = Engine::from_config(&cfg, Arc::new(ManualClock::default())).unwrap();
    assert_eq!(*engine.state(), red_blue());
    assert_eq!(engine.opts().layout, opts().layout);
}
