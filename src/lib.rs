//! Scatter-Gather DMA Engine
//!
//! A `no_std`, `no_alloc` model of a multi-channel scatter-gather DMA
//! controller: descriptor chains are walked per channel, channels share one
//! bus through a round-robin arbiter, and data moves in bounded, aligned
//! bursts.
//!
//! # Architecture
//!
//! The engine is organized into three layers:
//!
//! 1. **Descriptor Layer** ([`descriptor`]): Descriptor layout and the
//!    [`DescriptorStore`] chains are fetched from
//! 2. **Engine Layer** ([`driver`]): Channel state machines, bus arbiter,
//!    burst transfer unit and completion reporter, owned by [`DmaEngine`]
//! 3. **HAL Layer** ([`hal`]): The [`BusMemory`] backend bursts are issued
//!    against
//!
//! ## Tick Model
//!
//! Nothing moves until [`DmaEngine::tick`] is called. Each tick every
//! channel does its bookkeeping in id order, the arbiter grants the bus to
//! at most one requester, and that channel moves one burst. A burst never
//! exceeds the configured maximum length and never crosses the alignment
//! boundary of an incrementing address.
//!
//! ## Bus Responses
//!
//! Backends answer AXI-style: a decode error faults the chain with
//! [`Fault::InvalidAddress`], a slave error with [`Fault::BusError`]. Timeouts
//! (reported, or slower than the cycle budget) are retried inside the burst
//! and escalate to [`Fault::BusError`] once the retries run out.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types
//! - `log`: Enable `log` diagnostics for submissions, faults and retries
//! - `critical-section`: Enable the ISR-safe [`SharedEngine`] wrapper
//! - `async`: Enable async completion waiting with wakers
//!
//! # Example
//!
//! ```ignore
//! use sg_dma_engine::{Descriptor, DescriptorTable, DmaConfig, DmaEngine, MemoryArray};
//!
//! let mut table: DescriptorTable<16> = DescriptorTable::new(0x8000);
//! let head = table.link_chain(0, &[
//!     Descriptor::new(0x1000, 0x2000, 16),
//!     Descriptor::new(0x1010, 0x2010, 16),
//! ])?;
//!
//! let memory: MemoryArray<0x2000> = MemoryArray::new(0x1000);
//! let config = DmaConfig::new().with_max_burst_len(8);
//! let mut engine: DmaEngine<_, _> = DmaEngine::new(config, table, memory)?;
//!
//! engine.submit(0, head, 0)?;
//! while !engine.is_idle() {
//!     engine.tick();
//! }
//!
//! // Four 8-byte bursts, one completion event
//! assert_eq!(
//!     engine.poll_completion(),
//!     Some(CompletionEvent::Completed { channel_id: 0, total_bytes: 32 })
//! );
//! ```
//!
//! # Memory Requirements
//!
//! Each engine carries a burst staging buffer of
//! [`MAX_BURST_CAPACITY`](constants::MAX_BURST_CAPACITY) bytes plus its
//! channel, arbiter and queue state. Place it in a `static` (for example
//! through [`SharedEngine`]) rather than on a small stack.

#![no_std]
#![deny(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// =============================================================================
// Modules
// =============================================================================

pub mod descriptor;
pub mod driver;
pub mod hal;

// Internal implementation details (pub(crate) only)
mod internal;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use descriptor::{AddressMode, Descriptor, DescriptorStore, DescriptorTable, TransferDirection};
pub use driver::channel::{Channel, ChannelState};
pub use driver::config::{ArbitrationMode, DmaConfig};
pub use driver::engine::{DmaEngine, EngineStats, TickOutcome};
pub use driver::error::{
    ConfigError, ConfigResult, ControlError, ControlResult, DmaResult, Error, Fault, Result,
};
pub use driver::interrupt::{ChannelInterrupt, InterruptStatus};
pub use driver::reporter::CompletionEvent;
pub use hal::memory::{BusFault, BusMemory, BusResult, MemoryArray};

// Re-export sync types when critical-section is enabled
#[cfg(feature = "critical-section")]
pub use sync::SharedEngine;

/// Shared engine constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on engine types.
pub mod constants {
    pub use crate::internal::constants::{
        // Defaults
        DEFAULT_ALIGNMENT_BOUNDARY,
        DEFAULT_BUS_TIMEOUT_CYCLES,
        DEFAULT_CHANNELS,
        DEFAULT_EVENT_CAPACITY,
        DEFAULT_MAX_BURST_LEN,
        DEFAULT_MAX_CHAIN_DEPTH,
        DEFAULT_MAX_RETRIES,
        DEFAULT_MAX_WEIGHT,
        // Descriptor layout
        DESCRIPTOR_SIZE,
        // Limits
        MAX_BURST_CAPACITY,
        MAX_CHANNELS,
        NULL_SENTINEL,
    };
}
