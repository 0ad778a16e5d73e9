use crate::foundation::error::{HaloError, HaloResult};
use serde::{Deserialize, Serialize};

/// Installation constants of the radial LED stage.
///
/// Strips radiate out from the centre; pixel 0 of each strip sits on the inner radius.
/// Linear buffer order is strip-major: `(strip * pixels_per_strip + pixel) * 3`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageLayout {
    /// Number of radial strips.
    pub strips: u32,
    /// LEDs per strip.
    pub pixels_per_strip: u32,
    /// Inner radius as a fraction of the outer radius, in `[0, 1)`.
    pub inner_radius_ratio: f64,
}

impl Default for StageLayout {
    fn default() -> Self {
        Self {
            strips: 64,
            pixels_per_strip: 72,
            inner_radius_ratio: 0.18,
        }
    }
}

impl StageLayout {
    /// Validate geometry constants.
    pub fn validate(&self) -> HaloResult<()> {
        if self.strips == 0 {
            return Err(HaloError::validation("stage strips must be > 0"));
        }
        if self.pixels_per_strip == 0 {
            return Err(HaloError::validation("stage pixelsPerStrip must be > 0"));
        }
        if !(0.0..1.0).contains(&self.inner_radius_ratio) {
            return Err(HaloError::validation(
                "stage innerRadiusRatio must be in [0, 1)",
            ));
        }
        Ok(())
    }

    /// Total addressable LEDs.
    pub fn pixel_count(&self) -> usize {
        self.strips as usize * self.pixels_per_strip as usize
    }

    /// Byte length of one [`crate::Frame`] for this stage.
    pub fn frame_len(&self) -> usize {
        self.pixel_count() * 3
    }

    /// Byte length of one strip.
    pub fn strip_len(&self) -> usize {
        self.pixels_per_strip as usize * 3
    }
}
