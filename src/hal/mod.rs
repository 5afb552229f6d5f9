//! Hardware Abstraction Layer
//!
//! This module holds the boundary between the engine and the memory system
//! it moves data through.
//!
//! # Modules
//!
//! - [`memory`]: Bus backend trait, AXI-style responses and a memory array
//!
//! # Delay Integration
//!
//! Polling helpers that wait between ticks use `embedded_hal::delay::DelayNs`
//! directly. Pass any delay implementation from your HAL.

pub mod memory;

// Re-export commonly used types
pub use memory::{BusFault, BusMemory, BusResult, MemoryArray};
