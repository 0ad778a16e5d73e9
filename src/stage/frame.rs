use crate::foundation::color::{Hsl, hsl_to_rgb, hue_deg_to_turn};
use crate::foundation::math::clamp_byte;
use crate::stage::layout::StageLayout;
use std::fmt;
use std::sync::Arc;

/// Immutable RGB byte buffer covering every LED of the stage.
///
/// Cloning is cheap (shared storage). Transforms never mutate their input; they build a
/// fresh buffer and wrap it in a new `Frame`.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    data: Arc<[u8]>,
}

impl Frame {
    /// Wrap an owned byte buffer.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }

    /// Solid black frame for `layout`.
    pub fn black(layout: &StageLayout) -> Self {
        Self::from_vec(vec![0u8; layout.frame_len()])
    }

    /// Solid RGB frame.
    pub fn solid(layout: &StageLayout, r: u8, g: u8, b: u8) -> Self {
        let mut data = Vec::with_capacity(layout.frame_len());
        for _ in 0..layout.pixel_count() {
            data.extend_from_slice(&[r, g, b]);
        }
        Self::from_vec(data)
    }

    /// Solid frame from HSL, `h` in degrees, `s`/`l` in `[0, 1]`.
    pub fn solid_hsl(layout: &StageLayout, h: f64, s: f64, l: f64) -> Self {
        let [r, g, b] = hsl_to_rgb(Hsl {
            h: hue_deg_to_turn(h),
            s,
            l,
        });
        Self::solid(
            layout,
            clamp_byte(r * 255.0),
            clamp_byte(g * 255.0),
            clamp_byte(b * 255.0),
        )
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return `true` for a zero-length buffer.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over `[r, g, b]` pixels.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }

    /// `true` when both frames share the same storage.
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Build a new frame by mapping every byte.
    pub(crate) fn map_bytes(&self, f: impl Fn(u8) -> u8) -> Frame {
        Frame::from_vec(self.data.iter().map(|&b| f(b)).collect())
    }

    /// Build a new frame by mapping every pixel.
    pub(crate) fn map_pixels(&self, mut f: impl FnMut([u8; 3]) -> [u8; 3]) -> Frame {
        let mut out = Vec::with_capacity(self.data.len());
        for px in self.pixels() {
            out.extend_from_slice(&f(px));
        }
        Frame::from_vec(out)
    }

    /// Build a new frame combining two equal-length frames byte by byte.
    pub(crate) fn zip_bytes(&self, other: &Frame, f: impl Fn(u8, u8) -> u8) -> Frame {
        Frame::from_vec(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        )
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame").field("len", &self.data.len()).finish()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
