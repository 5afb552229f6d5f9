//! Descriptor control word bit field constants.
//!
//! The control word is the fourth word of a descriptor slot. Bits 0..=2
//! configure the transfer; bit 31 is the status bit written back by the
//! engine once the descriptor's data has been moved.

/// Control word bit field constants
pub mod control {
    /// Source address is fixed (peripheral FIFO) instead of incrementing
    pub const SRC_FIXED: u32 = 1 << 0;
    /// Destination address is fixed (peripheral FIFO) instead of incrementing
    pub const DST_FIXED: u32 = 1 << 1;
    /// Raise the descriptor-complete interrupt when this descriptor finishes
    pub const INTERRUPT_ON_COMPLETE: u32 = 1 << 2;
    /// Completed - written back by the engine after the last burst
    pub const COMPLETED: u32 = 1 << 31;

    /// Bits a caller may set when building a descriptor
    pub const CONFIG_MASK: u32 = SRC_FIXED | DST_FIXED | INTERRUPT_ON_COMPLETE;
    /// Bits owned by the engine
    pub const STATUS_MASK: u32 = COMPLETED;
}
