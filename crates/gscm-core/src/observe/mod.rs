//! # Observability
//!
//! Structured logging via `tracing`. The library only emits events; binaries
//! and tests install a subscriber with [`init_logging`].
//!
//! ```text
//! gscm-core / gscm-sim
//!   debug!(field builds), trace!(link reuse), warn!(diagnostics)
//!            │
//!            ▼
//!   EnvFilter ──► fmt layer (JSON | Pretty | Compact) ──► stdout
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
