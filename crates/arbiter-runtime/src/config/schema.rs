//! Configuration schema definitions.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "pretty"
//!
//! [logging.filters]
//! arbiter_framework = "trace"
//!
//! [pipeline]
//! line_width = 390
//! dedup_window_secs = 30
//! exempt_phrases = ["not found", "no results"]
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use arbiter_framework::{
    DEFAULT_CONTINUATION, DEFAULT_DEDUP_WINDOW, DEFAULT_EXEMPT_PHRASES, DEFAULT_LINE_WIDTH,
    DEFAULT_LITERAL_KEYWORD, DEFAULT_MAX_CANDIDATE_LEN, DEFAULT_PREVIEW_LEN, PipelineSettings,
};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ArbiterConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Message pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// File rotation policy for [`LogOutput::File`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level. `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub span_events: SpanEventConfig,
    /// Include thread ids.
    pub thread_ids: bool,
    /// Include source file and line.
    pub file_location: bool,
    /// Log file, required when `output = "file"`.
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Per-target level overrides, e.g. `arbiter_framework = "trace"`.
    pub filters: BTreeMap<String, LogLevel>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Message pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Maximum physical line width in characters.
    #[serde(default = "default_line_width")]
    pub line_width: usize,

    /// Marker appended to wrapped lines.
    #[serde(default = "default_continuation")]
    pub continuation: String,

    /// Maximum candidate length in characters.
    #[serde(default = "default_max_candidate_len")]
    pub max_candidate_len: usize,

    /// Keyword forcing a literal lookup. Empty disables it.
    #[serde(default = "default_literal_keyword")]
    pub literal_keyword: String,

    /// Duplicate suppression window in seconds.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// Length of the preview in duplicate notices.
    #[serde(default = "default_preview_len")]
    pub preview_len: usize,

    /// Replies containing any of these phrases are never suppressed.
    #[serde(default = "default_exempt_phrases")]
    pub exempt_phrases: Vec<String>,

    /// Prefix channel replies with the sender's name.
    #[serde(default = "default_address_replies")]
    pub address_replies: bool,

    /// Reply sent when a resolver fails. Empty keeps failures silent.
    #[serde(default)]
    pub failure_reply: String,

    /// Interval between sweeps of expired dedup entries, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            line_width: default_line_width(),
            continuation: default_continuation(),
            max_candidate_len: default_max_candidate_len(),
            literal_keyword: default_literal_keyword(),
            dedup_window_secs: default_dedup_window_secs(),
            preview_len: default_preview_len(),
            exempt_phrases: default_exempt_phrases(),
            address_replies: default_address_replies(),
            failure_reply: String::new(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl PipelineConfig {
    /// Returns the dedup window.
    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }

    /// Returns the sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Converts to framework pipeline settings.
    pub fn to_settings(&self) -> PipelineSettings {
        PipelineSettings {
            line_width: self.line_width,
            continuation: self.continuation.clone(),
            max_candidate_len: self.max_candidate_len,
            literal_keyword: non_empty(&self.literal_keyword),
            dedup_window: self.dedup_window(),
            preview_len: self.preview_len,
            exempt_phrases: self.exempt_phrases.clone(),
            address_replies: self.address_replies,
            failure_reply: non_empty(&self.failure_reply),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn default_line_width() -> usize {
    DEFAULT_LINE_WIDTH
}

fn default_continuation() -> String {
    DEFAULT_CONTINUATION.to_string()
}

fn default_max_candidate_len() -> usize {
    DEFAULT_MAX_CANDIDATE_LEN
}

fn default_literal_keyword() -> String {
    DEFAULT_LITERAL_KEYWORD.to_string()
}

fn default_dedup_window_secs() -> u64 {
    DEFAULT_DEDUP_WINDOW.as_secs()
}

fn default_preview_len() -> usize {
    DEFAULT_PREVIEW_LEN
}

fn default_exempt_phrases() -> Vec<String> {
    DEFAULT_EXEMPT_PHRASES.iter().map(|p| p.to_string()).collect()
}

fn default_address_replies() -> bool {
    true
}

fn default_sweep_interval_secs() -> u64 {
    60
}
