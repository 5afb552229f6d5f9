//! Centralized Constants
//!
//! This module provides a single source of truth for all magic numbers and
//! configuration defaults used throughout the DMA engine.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Descriptor layout**: null sentinel, slot stride
//! - **Burst limits**: maximum burst size, alignment boundary
//! - **Chain walking**: maximum chain depth
//! - **Bus timing**: retry count, response budget
//! - **Default capacities**: channel count, completion queue depth
//!
//! # Note
//!
//! Descriptor control bit definitions live in `descriptor_bits` as they are
//! specific to the descriptor word layout.

// =============================================================================
// Descriptor Layout
// =============================================================================

/// Link value that terminates a descriptor chain
pub const NULL_SENTINEL: u32 = 0;

/// Stride between descriptor slots in bytes (eight 32-bit words)
pub const DESCRIPTOR_SIZE: u32 = 32;

// =============================================================================
// Burst Limits
// =============================================================================

/// Size of the burst staging buffer; no configuration may exceed it
pub const MAX_BURST_CAPACITY: usize = 4096;

/// Default maximum burst length in bytes
pub const DEFAULT_MAX_BURST_LEN: u32 = 256;

/// Default address alignment boundary a burst may not cross (AXI4 4 KB rule)
pub const DEFAULT_ALIGNMENT_BOUNDARY: u32 = 4096;

// =============================================================================
// Chain Walking
// =============================================================================

/// Default maximum number of descriptors walked per chain
pub const DEFAULT_MAX_CHAIN_DEPTH: u32 = 4096;

// =============================================================================
// Bus Timing
// =============================================================================

/// Default number of retries after a bus timeout
pub const DEFAULT_MAX_RETRIES: u8 = 3;

/// Default bus response budget in cycles; slower responses count as timeouts
pub const DEFAULT_BUS_TIMEOUT_CYCLES: u32 = 64;

// =============================================================================
// Arbitration
// =============================================================================

/// Default cap on channel priority when weighted arbitration is enabled
pub const DEFAULT_MAX_WEIGHT: u8 = 7;

/// Maximum supported channel count (width of the interrupt bitmasks)
pub const MAX_CHANNELS: usize = 32;

// =============================================================================
// Default Capacities
// =============================================================================

/// Default number of channels
pub const DEFAULT_CHANNELS: usize = 4;

/// Default depth of the completion event queue
pub const DEFAULT_EVENT_CAPACITY: usize = 16;
