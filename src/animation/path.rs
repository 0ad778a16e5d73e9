use smallvec::SmallVec;
use std::fmt;

/// Structural key identifying an animatable field (or a scene node) in the scene tree.
///
/// Equality and hashing are over the ordered segment list, so keys that contain the
/// display separator (`:`) can never collide with a differently shaped path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlPath {
    segments: SmallVec<[String; 6]>,
}

impl ControlPath {
    /// Single-segment path (usually `live` or `ready`).
    pub fn root(segment: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(segment.into());
        Self { segments }
    }

    /// Build a path from segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the `:`-joined display form. Used for paths arriving from outside the engine.
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return Self::default();
        }
        Self::from_segments(s.split(':'))
    }

    /// A new path with one more segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Path of a layer child node.
    pub fn layer(&self, key: &str) -> Self {
        self.child(format!("layer_{key}"))
    }

    /// Path of a sequence item child node.
    pub fn item(&self, key: &str) -> Self {
        self.child(format!("item_{key}"))
    }

    /// Path of an effect parameter: `<self>:effects:<effect_key>:<param>`.
    pub fn effect_param(&self, effect_key: &str, param: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push("effects".to_owned());
        segments.push(effect_key.to_owned());
        segments.push(param.to_owned());
        Self { segments }
    }

    /// Ordered segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, if any.
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// `true` when `prefix` is a leading sub-path of `self`.
    pub fn starts_with(&self, prefix: &ControlPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Replace the first segment, keeping the rest.
    pub fn with_root(&self, root: &str) -> Self {
        let mut segments = self.segments.clone();
        match segments.first_mut() {
            Some(first) => *first = root.to_owned(),
            None => segments.push(root.to_owned()),
        }
        Self { segments }
    }

    /// Segment count.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// `true` for the empty path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ControlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            f.write_str(s)?;
        }
        Ok(())
    }
}

impl serde::Serialize for ControlPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ControlPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Joined(String),
            Segments(Vec<String>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Joined(s) => Ok(Self::parse(&s)),
            Repr::Segments(v) => Ok(Self::from_segments(v)),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/path.rs"]
mod tests;
