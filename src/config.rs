//! Parser configuration: recognized tags, recovery policy, unknown-tag mode.

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

/// Policy for materializing a span when a recognized open tag lacks an
/// explicit matching close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecoveryStrategy {
    /// Only reachable via an explicit matching `CloseTag`; otherwise dropped.
    ClosedSpan,
    /// Attaches backward from the tag's open position to the start of the line.
    RetroLine,
    /// Covers only the next whitespace-delimited token after the tag.
    ForwardNextToken,
    /// Extends forward until the next tag (open, close, or self-close) or EOF.
    ForwardUntilTag,
    /// Discards the pending open; no span emitted.
    Drop,
}

impl RecoveryStrategy {
    const fn as_str(self) -> &'static str {
        match self {
            RecoveryStrategy::ClosedSpan => "closed_span",
            RecoveryStrategy::RetroLine => "retro_line",
            RecoveryStrategy::ForwardNextToken => "forward_next_token",
            RecoveryStrategy::ForwardUntilTag => "forward_until_tag",
            RecoveryStrategy::Drop => "drop",
        }
    }
}

impl TryFrom<&str> for RecoveryStrategy {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "closed_span" => Ok(RecoveryStrategy::ClosedSpan),
            "retro_line" => Ok(RecoveryStrategy::RetroLine),
            "forward_next_token" => Ok(RecoveryStrategy::ForwardNextToken),
            "forward_until_tag" => Ok(RecoveryStrategy::ForwardUntilTag),
            "drop" => Ok(RecoveryStrategy::Drop),
            other => Err(ConfigError::InvalidStrategy(other.to_string())),
        }
    }
}

impl std::fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How tags outside `recognized_tags` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnknownMode {
    /// Drop unknown tags entirely.
    Strip,
    /// Emit the tag's literal angle-bracketed form into the output text.
    Passthrough,
}

impl UnknownMode {
    const fn as_str(self) -> &'static str {
        match self {
            UnknownMode::Strip => "strip",
            UnknownMode::Passthrough => "passthrough",
        }
    }
}

impl TryFrom<&str> for UnknownMode {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "strip" => Ok(UnknownMode::Strip),
            "passthrough" => Ok(UnknownMode::Passthrough),
            other => Err(ConfigError::InvalidUnknownMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string identifier passed to a `ParserConfig` setter doesn't
/// name a known recovery strategy or unknown-tag mode. This is the only
/// error surface the crate exposes — parsing itself never fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid recovery strategy identifier: {0:?}")]
    InvalidStrategy(String),
    #[error("invalid unknown-tag mode identifier: {0:?}")]
    InvalidUnknownMode(String),
}

/// Recognized tag set, recovery policy, and unknown-tag handling for [`crate::parse`].
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub(crate) recognized_tags: IndexSet<String>,
    pub(crate) default_recovery: RecoveryStrategy,
    pub(crate) per_tag_recovery: IndexMap<String, RecoveryStrategy>,
    pub(crate) unknown_mode: UnknownMode,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserConfig {
    /// An empty baseline config: no recognized tags, `drop` as the default
    /// recovery strategy, and `strip` for unknown tags.
    pub fn new() -> Self {
        Self {
            recognized_tags: IndexSet::new(),
            default_recovery: RecoveryStrategy::Drop,
            per_tag_recovery: IndexMap::new(),
            unknown_mode: UnknownMode::Strip,
        }
    }

    /// The preset used by documentation/chat annotation callers: recognizes
    /// `cite`, `note`, `risk`, `todo`; defaults unmatched tags to
    /// `forward_until_tag`; `cite` recovers via `retro_line`; unknown tags
    /// are stripped.
    pub fn default_cite_config() -> Self {
        let mut cfg = Self::new();
        cfg.set_recognized_tags(["cite", "note", "risk", "todo"]);
        cfg.default_recovery = RecoveryStrategy::ForwardUntilTag;
        cfg.per_tag_recovery
            .insert("cite".to_string(), RecoveryStrategy::RetroLine);
        cfg.unknown_mode = UnknownMode::Strip;
        cfg
    }

    /// Replaces the recognized tag set. Chainable builder form.
    pub fn with_recognized_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_recognized_tags(tags);
        self
    }

    /// Replaces the recognized tag set in place.
    pub fn set_recognized_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recognized_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets a per-tag recovery override with an already-typed strategy.
    /// Chainable builder form.
    pub fn with_recovery_strategy(mut self, tag: impl Into<String>, strategy: RecoveryStrategy) -> Self {
        self.per_tag_recovery.insert(tag.into(), strategy);
        self
    }

    /// Sets a per-tag recovery override by string identifier
    /// (`"closed_span"`, `"retro_line"`, `"forward_next_token"`,
    /// `"forward_until_tag"`, `"drop"`). Fails if `strategy` doesn't name a
    /// known strategy.
    pub fn set_recovery_strategy(
        &mut self,
        tag: impl Into<String>,
        strategy: &str,
    ) -> Result<&mut Self, ConfigError> {
        let strategy = RecoveryStrategy::try_from(strategy)?;
        self.per_tag_recovery.insert(tag.into(), strategy);
        Ok(self)
    }

    /// Sets the default recovery strategy by string identifier. Fails if
    /// `strategy` doesn't name a known strategy.
    pub fn set_default_recovery(&mut self, strategy: &str) -> Result<&mut Self, ConfigError> {
        self.default_recovery = RecoveryStrategy::try_from(strategy)?;
        Ok(self)
    }

    /// Sets the unknown-tag mode by string identifier (`"strip"` or
    /// `"passthrough"`). Fails if `mode` doesn't name a known mode.
    pub fn set_unknown_mode(&mut self, mode: &str) -> Result<&mut Self, ConfigError> {
        self.unknown_mode = UnknownMode::try_from(mode)?;
        Ok(self)
    }

    pub(crate) fn is_recognized(&self, name: &str) -> bool {
        self.recognized_tags.contains(name)
    }

    pub(crate) fn recovery_for(&self, name: &str) -> RecoveryStrategy {
        self.per_tag_recovery
            .get(name)
            .copied()
            .unwrap_or(self.default_recovery)
    }

    pub(crate) fn unknown_mode(&self) -> UnknownMode {
        self.unknown_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cite_config_matches_preset() {
        let cfg = ParserConfig::default_cite_config();
        assert!(cfg.is_recognized("cite"));
        assert!(cfg.is_recognized("todo"));
        assert!(!cfg.is_recognized("unknown"));
        assert_eq!(cfg.recovery_for("cite"), RecoveryStrategy::RetroLine);
        assert_eq!(cfg.recovery_for("note"), RecoveryStrategy::ForwardUntilTag);
        assert_eq!(cfg.unknown_mode(), UnknownMode::Strip);
    }

    #[test]
    fn set_recovery_strategy_rejects_unknown_identifier() {
        let mut cfg = ParserConfig::new();
        let err = cfg.set_recovery_strategy("cite", "bogus").unwrap_err();
        assert_eq!(err, ConfigError::InvalidStrategy("bogus".to_string()));
    }

    #[test]
    fn set_unknown_mode_rejects_unknown_identifier() {
        let mut cfg = ParserConfig::new();
        let err = cfg.set_unknown_mode("bogus").unwrap_err();
        assert_eq!(err, ConfigError::InvalidUnknownMode("bogus".to_string()));
    }

    #[test]
    fn with_recovery_strategy_is_chainable() {
        let cfg = ParserConfig::new()
            .with_recognized_tags(["mytag", "risk"])
            .with_recovery_strategy("mytag", RecoveryStrategy::RetroLine)
            .with_recovery_strategy("risk", RecoveryStrategy::ForwardNextToken);
        assert_eq!(cfg.recovery_for("mytag"), RecoveryStrategy::RetroLine);
        assert_eq!(cfg.recovery_for("risk"), RecoveryStrategy::ForwardNextToken);
    }
}
