use crate::foundation::core::Fps;
use crate::foundation::error::{HaloError, HaloResult};
use crate::stage::layout::StageLayout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Installation-level settings, loaded from a JSON file.
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Stage geometry.
    pub stage: StageLayout,
    /// Tick rate.
    pub fps: Fps,
    /// Quiet period after the last state mutation before the state is written.
    pub save_debounce_ms: u64,
    /// Where engine state is persisted. `None` disables persistence.
    pub state_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stage: StageLayout::default(),
            fps: Fps::STAGE,
            save_debounce_ms: 1_000,
            state_path: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> HaloResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| HaloError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a config file.
    pub fn from_path(path: impl AsRef<Path>) -> HaloResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .map_err(|e| HaloError::io(format!("open config '{}': {e}", path.display())))?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check the stage geometry and tick rate.
    pub fn validate(&self) -> HaloResult<()> {
        self.stage.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
