//! Core components of the DMA engine.
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`engine`] - The engine that owns and ticks everything below
//! - [`channel`] - Per-channel state machine
//! - [`arbiter`] - Round-robin bus arbiter
//! - [`burst`] - Burst transfer unit
//! - [`reporter`] - Completion queue and interrupt status
//! - [`interrupt`] - Interrupt status bitmasks
//!
//! # Example
//!
//! ```ignore
//! use sg_dma_engine::driver::{ArbitrationMode, DmaConfig};
//!
//! let config = DmaConfig::new()
//!     .with_max_burst_len(64)
//!     .with_arbitration(ArbitrationMode::WeightedRoundRobin);
//! ```

// Submodules
pub mod arbiter;
pub mod burst;
pub mod channel;
pub mod config;
pub mod engine;
pub mod error;
pub mod interrupt;
pub mod reporter;

// Re-exports for convenience
pub use arbiter::{ArbiterStats, BusArbiter};
pub use burst::{BurstStats, BurstUnit, BusDirection, BusTransaction};
pub use channel::{ActiveDescriptor, Channel, ChannelState};
pub use config::{ArbitrationMode, DmaConfig};
pub use engine::{DmaEngine, EngineStats, TickOutcome};
pub use error::{
    ConfigError, ConfigResult, ControlError, ControlResult, DmaResult, Error, Fault, Result,
};
pub use interrupt::{ChannelInterrupt, InterruptStatus};
pub use reporter::{CompletionEvent, CompletionReporter};
