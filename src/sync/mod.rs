//! Synchronization and Concurrency Support
//!
//! This module provides synchronization primitives and an ISR-safe wrapper
//! for the DMA engine. It includes:
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - `AtomicWaker` - Async waker storage (with `async`)
//!
//! - **Shared Wrapper** (`shared`): [`SharedEngine`], a critical-section
//!   protected engine slot with an async `completion()` future
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables this module
//! - `async`: Enables `AtomicWaker` and `SharedEngine::completion`
//!
//! # Example
//!
//! ```ignore
//! use sg_dma_engine::sync::SharedEngine;
//!
//! static DMA: SharedEngine<DescriptorTable<32>, Bridge> = SharedEngine::new();
//!
//! fn main() {
//!     DMA.install(DmaEngine::new(DmaConfig::new(), table, bridge).unwrap());
//!     DMA.submit(0, head, 0).unwrap();
//! }
//!
//! #[interrupt]
//! fn TIMER() {
//!     DMA.tick().ok();
//! }
//! ```

mod primitives;

#[cfg(feature = "async")]
pub use primitives::AtomicWaker;
pub use primitives::CriticalSectionCell;

mod shared;

pub use shared::SharedEngine;
