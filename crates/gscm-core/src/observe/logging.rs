//! # Structured Logging
//!
//! Installs the `tracing` subscriber for link generation. Events are
//! emitted at fixed levels:
//!
//! | level   | events                                                |
//! |---------|-------------------------------------------------------|
//! | `debug` | correlated field builds, channel realization and reuse |
//! | `trace` | cached-channel hits, per-cluster detail               |
//! | `warn`  | out-of-range model inputs, empty scenarios            |
//!
//! A base level applies everywhere; `targets` raises or lowers it per
//! module, e.g. to follow reciprocity decisions in `gscm_sim::registry`
//! without tracing the field builder.
//!
//! ```rust,ignore
//! use gscm_core::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::link_trace());
//! tracing::info!(links = 42, "scenario attached");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
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
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output layout of each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One object per event, for post-processing simulation runs
    Json,
    #[default]
    Pretty,
    Compact,
}

/// `logging:` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base level for every module
    pub level: LogLevel,
    pub format: LogFormat,
    /// Per-module levels, e.g. `gscm_sim::registry: trace`
    pub targets: BTreeMap<String, LogLevel>,
    /// Include file:line of each event
    pub source_location: bool,
    /// Include span enter/exit events
    pub span_events: bool,
    /// Raw `EnvFilter` directives, overriding `level` and `targets`
    pub filter: Option<String>,
}

impl LogConfig {
    /// Debug output with source locations.
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            source_location: true,
            span_events: true,
            ..Default::default()
        }
    }

    /// Warnings only, one line each. Suited to long batch runs.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Compact,
            ..Default::default()
        }
    }

    /// Every reuse and realization decision of the registry, the rest at `info`.
    pub fn link_trace() -> Self {
        Self {
            format: LogFormat::Compact,
            ..Default::default()
        }
        .with_target("gscm_sim::registry", LogLevel::Trace)
    }

    pub fn with_target(mut self, target: impl Into<String>, level: LogLevel) -> Self {
        self.targets.insert(target.into(), level);
        self
    }

    /// `EnvFilter` directives this configuration resolves to.
    pub fn directives(&self) -> String {
        if let Some(custom) = &self.filter {
            return custom.clone();
        }
        std::iter::once(self.level.to_string())
            .chain(self.targets.iter().map(|(target, level)| format!("{target}={level}")))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether `RUST_LOG` may take over from this configuration
    fn defers_to_env(&self) -> bool {
        self.filter.is_none() && self.targets.is_empty()
    }
}

/// Install the global subscriber.
///
/// With neither `filter` nor `targets` set, `RUST_LOG` wins over `level`.
/// Later calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let fallback = || EnvFilter::new(config.level.as_str());
    let filter = if config.defers_to_env() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        EnvFilter::try_new(config.directives()).unwrap_or_else(|_| fallback())
    };

    let span_events = if config.span_events {
        fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
    } else {
        fmt::format::FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_span_events(span_events);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = match config.format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
    };
}
