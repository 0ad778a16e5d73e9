//! HSL <-> RGB conversion on normalized `0..1` channels.

/// Hue/saturation/lightness triple. `h` is a turn fraction in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Hsl {
    pub(crate) h: f64,
    pub(crate) s: f64,
    pub(crate) l: f64,
}

/// Wrap hue degrees into a turn fraction in `[0, 1)`.
pub(crate) fn hue_deg_to_turn(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    deg.rem_euclid(360.0) / 360.0
}

/// Standard HSL -> RGB conversion (sRGB space, normalized inputs and outputs).
pub(crate) fn hsl_to_rgb(hsl: Hsl) -> [f64; 3] {
    let h = if hsl.h.is_finite() {
        hsl.h.rem_euclid(1.0)
    } else {
        0.0
    };
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l];
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

/// RGB -> HSL on normalized channels.
pub(crate) fn rgb_to_hsl(rgb: [f64; 3]) -> Hsl {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    Hsl { h: h / 6.0, s, l }
}

/// Lightness of a byte-valued pixel, normalized.
pub(crate) fn lightness_u8(px: [u8; 3]) -> f64 {
    let max = px[0].max(px[1]).max(px[2]);
    let min = px[0].min(px[1]).min(px[2]);
    (f64::from(max) + f64::from(min)) / (2.0 * 255.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
