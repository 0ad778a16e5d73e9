use crate::foundation::math::{clamp_unit, mul_div255_u8};
use crate::scene::model::{LayerBlendMode, TransitionMode};
use crate::stage::frame::Frame;

/// Byte crossfade `a -> b` at `t` in `[0, 1]`, 8-bit weight resolution.
pub fn crossfade(a: u8, b: u8, t: f64) -> u8 {
    let tt = unit_to_u8(t);
    let it = 255u16 - tt;
    mul_div255_u8(u16::from(a), it).saturating_add(mul_div255_u8(u16::from(b), tt))
}

fn unit_to_u8(t: f64) -> u16 {
    ((clamp_unit(t) * 255.0).round() as i32).clamp(0, 255) as u16
}

fn same_len(a: &Frame, b: &Frame) -> bool {
    a.len() == b.len()
}

/// Composite `overlay` onto `base`.
///
/// - `Mix`: crossfade by `amount`.
/// - `Add`: saturating `base + overlay * amount`.
/// - `Mask`: `overlay` acts as a luminance mask over `base`, mixed in by `amount`.
///
/// A zero amount, an unknown mode or mismatched frame lengths return `base` unchanged
/// (shared).
pub fn blend_layer(base: &Frame, overlay: &Frame, mode: LayerBlendMode, amount: f64) -> Frame {
    let amount = clamp_unit(amount);
    if amount == 0.0 || !same_len(base, overlay) {
        return base.clone();
    }
    match mode {
        LayerBlendMode::Mix => base.zip_bytes(overlay, |b, o| crossfade(b, o, amount)),
        LayerBlendMode::Add => {
            let k = unit_to_u8(amount);
            base.zip_bytes(overlay, |b, o| {
                b.saturating_add(mul_div255_u8(u16::from(o), k))
            })
        }
        LayerBlendMode::Mask => base.zip_bytes(overlay, |b, o| {
            let masked = mul_div255_u8(u16::from(o), u16::from(b));
            crossfade(b, masked, amount)
        }),
        LayerBlendMode::Unknown => base.clone(),
    }
}

/// Crossfade between two independently rendered scenes at `progress` in `[0, 1]`.
///
/// - `Mix`: plain crossfade.
/// - `Add`: the outgoing frame is dimmed by `1 - progress` while the incoming frame is
///   added at `min(1, 2 * progress)`, so the midpoint is brighter than either side.
///
/// `progress == 0` returns `from` unchanged (shared); mismatched lengths return `from`.
pub fn blend_transition(from: &Frame, to: &Frame, mode: TransitionMode, progress: f64) -> Frame {
    let p = clamp_unit(progress);
    if p == 0.0 || !same_len(from, to) {
        return from.clone();
    }
    match mode {
        TransitionMode::Mix => from.zip_bytes(to, |a, b| crossfade(a, b, p)),
        TransitionMode::Add => {
            let keep = unit_to_u8(1.0 - p);
            let gain = unit_to_u8((2.0 * p).min(1.0));
            from.zip_bytes(to, |a, b| {
                mul_div255_u8(u16::from(a), keep).saturating_add(mul_div255_u8(u16::from(b), gain))
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
