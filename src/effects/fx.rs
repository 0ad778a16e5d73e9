use crate::foundation::color::{Hsl, hsl_to_rgb, hue_deg_to_turn, lightness_u8, rgb_to_hsl};
use crate::foundation::math::{clamp_byte, clamp_unit, lerp};
use crate::stage::frame::Frame;
use crate::stage::layout::StageLayout;
use serde::{Deserialize, Serialize};

/// One entry of a scene's effect list.
///
/// `key` is stable across edits and becomes part of each parameter's control path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDef {
    /// Unique within the owning scene's effect list.
    pub key: String,
    /// Effect type and destination parameters, flattened next to `key` in JSON.
    #[serde(flatten)]
    pub kind: EffectKind,
}

/// Effect type plus its destination (pre-animation) parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EffectKind {
    /// Pull every pixel toward its luminance gray.
    Desaturate {
        /// `0` keeps color, `1` is fully gray.
        value: f64,
    },
    /// Tint toward a fixed hue.
    Colorize {
        /// Mix between the source and the tinted frame.
        amount: f64,
        /// Target hue in degrees.
        hue: f64,
        /// Saturation of the tint.
        #[serde(default = "one")]
        saturation: f64,
    },
    /// Rotate every pixel's hue.
    HueShift {
        /// Degrees.
        value: f64,
    },
    /// `255 - c` on every channel.
    Invert,
    /// Scale channels up.
    Brighten {
        /// Channels are multiplied by `1 + value`.
        value: f64,
    },
    /// Scale channels down.
    Darken {
        /// `0` keeps the frame, `1` is black.
        value: f64,
    },
    /// Shift the image around the stage by whole strips.
    Rotate {
        /// Fraction of a full turn.
        value: f64,
    },
    /// Stretch or flatten channels around mid gray.
    Contrast {
        /// `0.5` is neutral.
        value: f64,
    },
    /// Kaleidoscope: repeat the first group of strips around the stage.
    Prism {
        /// Number of repeated slices.
        slices: f64,
        /// Turn offset of the sampled strips.
        #[serde(default)]
        offset: f64,
        /// Mirror every other slice.
        #[serde(default)]
        mirror: bool,
    },
    /// Per-channel gain.
    ColorChannel {
        /// Red gain.
        #[serde(default = "one")]
        red: f64,
        /// Green gain.
        #[serde(default = "one")]
        green: f64,
        /// Blue gain.
        #[serde(default = "one")]
        blue: f64,
    },
    /// Effect type this build does not know; passes frames through.
    #[serde(other)]
    Unknown,
}

fn one() -> f64 {
    1.0
}

/// An effect with every numeric parameter resolved for the current tick.
///
/// Variants mirror [`EffectKind`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedEffect {
    /// Amount toward gray.
    Desaturate(f64),
    /// Tint toward `hue` degrees.
    Colorize {
        /// Mix with the source.
        amount: f64,
        /// Degrees.
        hue: f64,
        /// Tint saturation.
        saturation: f64,
    },
    /// Hue rotation in degrees.
    HueShift(f64),
    /// Channel inversion.
    Invert,
    /// Gain above 1.
    Brighten(f64),
    /// Fraction removed from every channel.
    Darken(f64),
    /// Fraction of a full turn.
    Rotate(f64),
    /// `0.5` is neutral.
    Contrast(f64),
    /// Kaleidoscope remap.
    Prism {
        /// Slice count, rounded.
        slices: f64,
        /// Turn offset.
        offset: f64,
        /// Mirror every other slice.
        mirror: bool,
    },
    /// Per-channel gain.
    ColorChannel {
        /// Red gain.
        red: f64,
        /// Green gain.
        green: f64,
        /// Blue gain.
        blue: f64,
    },
    /// Unknown effect; leaves the frame untouched.
    Passthrough,
}

impl EffectKind {
    /// Resolve numeric parameters through `animate(param_name, destination)`.
    pub fn resolve(&self, mut animate: impl FnMut(&str, f64) -> f64) -> ResolvedEffect {
        match *self {
            Self::Desaturate { value } => ResolvedEffect::Desaturate(animate("value", value)),
            Self::Colorize {
                amount,
                hue,
                saturation,
            } => ResolvedEffect::Colorize {
                amount: animate("amount", amount),
                hue: animate("hue", hue),
                saturation: animate("saturation", saturation),
            },
            Self::HueShift { value } => ResolvedEffect::HueShift(animate("value", value)),
            Self::Invert => ResolvedEffect::Invert,
            Self::Brighten { value } => ResolvedEffect::Brighten(animate("value", value)),
            Self::Darken { value } => ResolvedEffect::Darken(animate("value", value)),
            Self::Rotate { value } => ResolvedEffect::Rotate(animate("value", value)),
            Self::Contrast { value } => ResolvedEffect::Contrast(animate("value", value)),
            Self::Prism {
                slices,
                offset,
                mirror,
            } => ResolvedEffect::Prism {
                slices: animate("slices", slices),
                offset: animate("offset", offset),
                mirror,
            },
            Self::ColorChannel { red, green, blue } => ResolvedEffect::ColorChannel {
                red: animate("red", red),
                green: animate("green", green),
                blue: animate("blue", blue),
            },
            Self::Unknown => ResolvedEffect::Passthrough,
        }
    }
}

/// Apply one resolved effect. `Passthrough` returns the input frame unchanged (shared).
pub fn apply_effect(frame: &Frame, effect: ResolvedEffect, layout: &StageLayout) -> Frame {
    match effect {
        ResolvedEffect::Desaturate(amount) => desaturate(frame, amount),
        ResolvedEffect::Colorize {
            amount,
            hue,
            saturation,
        } => colorize(frame, amount, hue, saturation),
        ResolvedEffect::HueShift(deg) => hue_shift(frame, deg),
        ResolvedEffect::Invert => invert(frame),
        ResolvedEffect::Brighten(amount) => brighten(frame, amount),
        ResolvedEffect::Darken(amount) => darken(frame, amount),
        ResolvedEffect::Rotate(amount) => rotate(frame, amount, layout),
        ResolvedEffect::Contrast(amount) => contrast(frame, amount),
        ResolvedEffect::Prism {
            slices,
            offset,
            mirror,
        } => prism(frame, slices, offset, mirror, layout),
        ResolvedEffect::ColorChannel { red, green, blue } => {
            color_channel(frame, red, green, blue)
        }
        ResolvedEffect::Passthrough => frame.clone(),
    }
}

/// Fold an effect list over `frame` in list order.
///
/// `animate(effect_key, param_name, destination)` resolves each numeric parameter. An
/// empty list returns the input frame unchanged (shared).
pub fn apply_effects(
    frame: Frame,
    effects: &[EffectDef],
    layout: &StageLayout,
    mut animate: impl FnMut(&str, &str, f64) -> f64,
) -> Frame {
    effects.iter().fold(frame, |acc, fx| {
        let resolved = fx.kind.resolve(|param, dest| animate(&fx.key, param, dest));
        apply_effect(&acc, resolved, layout)
    })
}

/// Blend each channel toward the pixel's grey average by `amount`.
///
/// Negative amounts push channels away from grey (more saturation).
pub fn desaturate(frame: &Frame, amount: f64) -> Frame {
    frame.map_pixels(|[r, g, b]| {
        let grey = (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0;
        let px = |c: u8| clamp_byte(lerp(f64::from(c), grey, amount));
        [px(r), px(g), px(b)]
    })
}

/// Re-tint every pixel with `hue_deg`/`saturation` while keeping its lightness, then mix
/// with the original by `amount`.
pub fn colorize(frame: &Frame, amount: f64, hue_deg: f64, saturation: f64) -> Frame {
    let amount = clamp_unit(amount);
    let h = hue_deg_to_turn(hue_deg);
    frame.map_pixels(|px| {
        let l = lightness_u8(px);
        let tinted = hsl_to_rgb(Hsl {
            h,
            s: saturation,
            l,
        });
        let mut out = [0u8; 3];
        for i in 0..3 {
            out[i] = clamp_byte(lerp(f64::from(px[i]), tinted[i] * 255.0, amount));
        }
        out
    })
}

/// Rotate each pixel's hue by `deg` degrees.
pub fn hue_shift(frame: &Frame, deg: f64) -> Frame {
    let shift = if deg.is_finite() { deg / 360.0 } else { 0.0 };
    frame.map_pixels(|[r, g, b]| {
        let mut hsl = rgb_to_hsl([
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        ]);
        hsl.h = (hsl.h + shift).rem_euclid(1.0);
        let rgb = hsl_to_rgb(hsl);
        [
            clamp_byte(rgb[0] * 255.0),
            clamp_byte(rgb[1] * 255.0),
            clamp_byte(rgb[2] * 255.0),
        ]
    })
}

/// Invert every channel.
pub fn invert(frame: &Frame) -> Frame {
    frame.map_bytes(|c| 255 - c)
}

/// Scale every byte up by `1 + amount`.
pub fn brighten(frame: &Frame, amount: f64) -> Frame {
    let k = 1.0 + amount;
    frame.map_bytes(|c| clamp_byte(f64::from(c) * k))
}

/// Scale every byte down by `amount` of itself.
pub fn darken(frame: &Frame, amount: f64) -> Frame {
    frame.map_bytes(|c| {
        let c = f64::from(c);
        clamp_byte(c - c * amount)
    })
}

/// Rotate the stage by whole strips: `round(amount * strips) mod strips`.
///
/// A zero rotation returns the input frame unchanged (shared).
pub fn rotate(frame: &Frame, amount: f64, layout: &StageLayout) -> Frame {
    let strips = i64::from(layout.strips);
    if strips == 0 || !amount.is_finite() || frame.len() != layout.frame_len() {
        return frame.clone();
    }
    let count = ((amount * strips as f64).round() as i64).rem_euclid(strips) as usize;
    if count == 0 {
        return frame.clone();
    }
    let split = (strips as usize - count) * layout.strip_len();
    let bytes = frame.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    out.extend_from_slice(&bytes[split..]);
    out.extend_from_slice(&bytes[..split]);
    Frame::from_vec(out)
}

/// Contrast around mid-grey; `amount == 0.5` is neutral.
pub fn contrast(frame: &Frame, amount: f64) -> Frame {
    let c = (clamp_unit(amount) - 0.5) * 2.0 * 255.0;
    let factor = 259.0 * (c + 255.0) / (255.0 * (259.0 - c));
    frame.map_bytes(|v| clamp_byte(factor * (f64::from(v) - 128.0) + 128.0))
}

/// Kaleidoscope remap: the stage is split into `slices` groups of strips and every group
/// repeats the strips at the start of the (offset) stage, optionally mirroring every other
/// group.
pub fn prism(frame: &Frame, slices: f64, offset: f64, mirror: bool, layout: &StageLayout) -> Frame {
    let strips = layout.strips as usize;
    if strips == 0 || frame.len() != layout.frame_len() {
        return frame.clone();
    }
    let slices = if slices.is_finite() {
        (slices.round() as i64).clamp(1, strips as i64) as usize
    } else {
        1
    };
    let width = (strips / slices).max(1);
    let offset_strips = if offset.is_finite() {
        (offset * strips as f64).round() as i64
    } else {
        0
    };

    let strip_len = layout.strip_len();
    let bytes = frame.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    for dest in 0..strips {
        let group = dest / width;
        let mut local = dest % width;
        if mirror && group % 2 == 1 {
            local = width - 1 - local;
        }
        let src = (local as i64 + offset_strips).rem_euclid(strips as i64) as usize;
        out.extend_from_slice(&bytes[src * strip_len..(src + 1) * strip_len]);
    }
    Frame::from_vec(out)
}

/// Independent gain per channel.
pub fn color_channel(frame: &Frame, red: f64, green: f64, blue: f64) -> Frame {
    frame.map_pixels(|[r, g, b]| {
        [
            clamp_byte(f64::from(r) * red),
            clamp_byte(f64::from(g) * green),
            clamp_byte(f64::from(b) * blue),
        ]
    })
}

#[cfg(test)]
#[path = "../../tests/unit/effects/fx.rs"]
mod tests;
