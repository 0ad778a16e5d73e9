use crate::animation::animator::Animator;
use crate::animation::path::ControlPath;
use crate::effects::composite::{blend_layer, blend_transition};
use crate::effects::fx::{EffectDef, apply_effects};
use crate::eval::context::EvalContext;
use crate::media::video::VideoLibrary;
use crate::scene::model::{ColorScene, LayersScene, Scene, SequenceScene, VideoScene};
use crate::scene::state::Side;
use crate::stage::frame::Frame;

/// Frames produced by one full evaluation pass.
#[derive(Debug, Clone)]
pub struct RenderedOutputs {
    /// Live scene crossfaded toward ready by the current transition progress.
    pub live: Frame,
    /// Ready scene, unblended.
    pub ready: Frame,
    /// Live -> ready progress used for `live`.
    pub progress: f64,
}

/// Recursive scene renderer.
///
/// Total: every node yields a frame of the stage length. Missing data (unknown scene
/// type, dangling keys, absent video frames) falls back to black.
pub struct SceneEvaluator<'a> {
    ctx: EvalContext<'a>,
    animator: &'a mut Animator,
    videos: &'a mut dyn VideoLibrary,
}

impl<'a> SceneEvaluator<'a> {
    /// Renderer for one tick; `animator` and `videos` are advanced as nodes are read.
    pub fn new(
        ctx: EvalContext<'a>,
        animator: &'a mut Animator,
        videos: &'a mut dyn VideoLibrary,
    ) -> Self {
        Self {
            ctx,
            animator,
            videos,
        }
    }

    /// Evaluate ready, then live, then blend live toward ready.
    pub fn render_outputs(&mut self) -> RenderedOutputs {
        let state = self.ctx.state;
        let ready = self.evaluate(&state.ready_scene, &Side::Ready.path());
        let live = self.evaluate(&state.live_scene, &Side::Live.path());
        let progress = state.transition_progress(self.ctx.now);
        let live = blend_transition(&live, &ready, state.transition.mode, progress);
        RenderedOutputs {
            live,
            ready,
            progress,
        }
    }

    /// Render `scene`, whose animated fields live under `path`.
    pub fn evaluate(&mut self, scene: &Scene, path: &ControlPath) -> Frame {
        match scene {
            Scene::Off(_) | Scene::Unknown => self.black(),
            Scene::Color(c) => self.eval_color(c, path),
            Scene::Video(v) => self.eval_video(v, path),
            Scene::Layers(l) => self.eval_layers(l, path),
            Scene::Sequence(s) => self.eval_sequence(s, path),
        }
    }

    fn black(&self) -> Frame {
        self.ctx.black.clone()
    }

    fn animate(&mut self, path: &ControlPath, dest: f64) -> f64 {
        let field = self.ctx.slider_field(path);
        self.animator.animate(path, dest, &field, self.ctx.now)
    }

    fn with_effects(&mut self, frame: Frame, effects: &[EffectDef], path: &ControlPath) -> Frame {
        if effects.is_empty() {
            return frame;
        }
        let layout = self.ctx.layout;
        apply_effects(frame, effects, layout, |key, param, dest| {
            self.animate(&path.effect_param(key, param), dest)
        })
    }

    fn eval_color(&mut self, c: &ColorScene, path: &ControlPath) -> Frame {
        let h = self.animate(&path.child("h"), c.h);
        let s = self.animate(&path.child("s"), c.s);
        let l = self.animate(&path.child("l"), c.l);
        let frame = Frame::solid_hsl(self.ctx.layout, h, s, l);
        self.with_effects(frame, &c.effects, path)
    }

    fn eval_video(&mut self, v: &VideoScene, path: &ControlPath) -> Frame {
        let expected = self.ctx.layout.frame_len();
        let frame = match self.pull_video(v) {
            Some(f) if f.len() == expected => f,
            Some(f) => {
                tracing::warn!(id = %v.id, got = f.len(), expected, "video frame has wrong length");
                self.black()
            }
            None => self.black(),
        };
        self.with_effects(frame, &v.effects, path)
    }

    fn pull_video(&mut self, v: &VideoScene) -> Option<Frame> {
        let player = self.videos.player(&v.id)?;
        if let Some(params) = &v.params {
            player.set_params(params);
        }
        if let Some(track) = &v.track {
            player.select_video(track);
        }
        match (v.pause_on_frame, &v.track) {
            (Some(index), _) => player.read_frame(index),
            (None, Some(_)) => player.consume_frame(),
            (None, None) => None,
        }
    }

    fn eval_layers(&mut self, s: &LayersScene, path: &ControlPath) -> Frame {
        let frame = match s.layers.split_last() {
            None => self.black(),
            Some((base, above)) => {
                let mut acc = self.evaluate(&base.scene, &path.layer(&base.key));
                for layer in above.iter().rev() {
                    let layer_path = path.layer(&layer.key);
                    let amount = self.animate(&layer_path.child("blendAmount"), layer.blend_amount);
                    let overlay = self.evaluate(&layer.scene, &layer_path);
                    acc = blend_layer(&acc, &overlay, layer.blend_mode, amount);
                }
                acc
            }
        };
        self.with_effects(frame, &s.effects, path)
    }

    fn eval_sequence(&mut self, s: &SequenceScene, path: &ControlPath) -> Frame {
        let Some(active) = s.active_item() else {
            let black = self.black();
            return self.with_effects(black, &s.effects, path);
        };
        let active_path = path.item(&active.key);

        let incoming = s
            .pending()
            .filter(|p| self.ctx.now >= p.start && p.next_key != active.key)
            .and_then(|p| Some((p.start, s.item(p.next_key)?)));

        let frame = match incoming {
            None => self.evaluate(&active.scene, &active_path),
            Some((start, next)) => {
                let transition = s.effective_transition();
                let progress = self.ctx.progress_since(start, transition.duration);
                let next_path = path.item(&next.key);
                if progress >= 1.0 {
                    self.evaluate(&next.scene, &next_path)
                } else {
                    let from = self.evaluate(&active.scene, &active_path);
                    let to = self.evaluate(&next.scene, &next_path);
                    blend_transition(&from, &to, transition.mode, progress)
                }
            }
        };
        self.with_effects(frame, &s.effects, path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/evaluator.rs"]
mod tests;
