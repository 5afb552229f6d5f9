//! Interrupt status for the DMA engine.
//!
//! This module provides the [`InterruptStatus`] structure, one bitmask per
//! event kind with bit `n` belonging to channel `n`, and the per-channel
//! [`ChannelInterrupt`] view packed like a channel status register.

// =============================================================================
// Per-Channel Flags
// =============================================================================

/// Interrupt flags of a single channel.
///
/// # Example
///
/// ```ignore
/// let flags = engine.interrupt_status().channel(0);
/// if flags.chain_complete {
///     // Drain the completion queue
/// }
/// if flags.has_error() {
///     // Inspect the Faulted event
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelInterrupt {
    /// Chain completed - terminal descriptor finished
    pub chain_complete: bool,
    /// Chain faulted - chain aborted
    pub chain_fault: bool,
    /// Descriptor complete - a descriptor flagged for interrupt finished
    pub descriptor_complete: bool,
}

impl ChannelInterrupt {
    /// Chain-complete bit of the packed representation
    pub const CHAIN_COMPLETE: u32 = 1 << 0;
    /// Chain-fault bit of the packed representation
    pub const CHAIN_FAULT: u32 = 1 << 1;
    /// Descriptor-complete bit of the packed representation
    pub const DESCRIPTOR_COMPLETE: u32 = 1 << 2;

    /// Create from a packed status value
    #[inline]
    pub fn from_raw(status: u32) -> Self {
        Self {
            chain_complete: (status & Self::CHAIN_COMPLETE) != 0,
            chain_fault: (status & Self::CHAIN_FAULT) != 0,
            descriptor_complete: (status & Self::DESCRIPTOR_COMPLETE) != 0,
        }
    }

    /// Convert to a packed value
    #[inline]
    pub fn to_raw(&self) -> u32 {
        let mut val = 0u32;
        if self.chain_complete {
            val |= Self::CHAIN_COMPLETE;
        }
        if self.chain_fault {
            val |= Self::CHAIN_FAULT;
        }
        if self.descriptor_complete {
            val |= Self::DESCRIPTOR_COMPLETE;
        }
        val
    }

    /// Check if any interrupt occurred
    #[inline]
    pub fn any(&self) -> bool {
        self.chain_complete || self.chain_fault || self.descriptor_complete
    }

    /// Check if the chain faulted
    #[inline]
    pub fn has_error(&self) -> bool {
        self.chain_fault
    }
}

// =============================================================================
// Interrupt Status
// =============================================================================

/// Interrupt status of every channel.
///
/// Bits are set by the engine and cleared by the caller through
/// [`DmaEngine::clear_interrupts`](crate::DmaEngine::clear_interrupts),
/// which is write-1-to-clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// Channels whose chain completed
    pub chain_complete: u32,
    /// Channels whose chain faulted
    pub chain_fault: u32,
    /// Channels that finished a descriptor flagged `INTERRUPT_ON_COMPLETE`
    pub descriptor_complete: u32,
}

impl InterruptStatus {
    /// Status with only the bits of `channel` set as in `flags`
    #[inline]
    pub fn for_channel(channel: usize, flags: ChannelInterrupt) -> Self {
        let bit = channel_bit(channel);
        Self {
            chain_complete: if flags.chain_complete { bit } else { 0 },
            chain_fault: if flags.chain_fault { bit } else { 0 },
            descriptor_complete: if flags.descriptor_complete { bit } else { 0 },
        }
    }

    /// Flags of a single channel
    #[inline]
    pub fn channel(&self, channel: usize) -> ChannelInterrupt {
        let bit = channel_bit(channel);
        ChannelInterrupt {
            chain_complete: (self.chain_complete & bit) != 0,
            chain_fault: (self.chain_fault & bit) != 0,
            descriptor_complete: (self.descriptor_complete & bit) != 0,
        }
    }

    /// Check if any interrupt occurred on any channel
    #[inline]
    pub fn any(&self) -> bool {
        (self.chain_complete | self.chain_fault | self.descriptor_complete) != 0
    }

    /// Check if any channel faulted
    #[inline]
    pub fn has_error(&self) -> bool {
        self.chain_fault != 0
    }

    /// Clear every bit set in `mask` (write-1-to-clear)
    #[inline]
    pub fn clear(&mut self, mask: InterruptStatus) {
        self.chain_complete &= !mask.chain_complete;
        self.chain_fault &= !mask.chain_fault;
        self.descriptor_complete &= !mask.descriptor_complete;
    }

    pub(crate) fn raise_chain_complete(&mut self, channel: usize) {
        self.chain_complete |= channel_bit(channel);
    }

    pub(crate) fn raise_chain_fault(&mut self, channel: usize) {
        self.chain_fault |= channel_bit(channel);
    }

    pub(crate) fn raise_descriptor_complete(&mut self, channel: usize) {
        self.descriptor_complete |= channel_bit(channel);
    }
}

/// Bit of `channel` in a status mask; zero for channels past the mask width
#[inline(always)]
fn channel_bit(channel: usize) -> u32 {
    1u32.checked_shl(channel as u32).unwrap_or(0)
}

// =============================================================================
// Unit Tests
// =============================================================================
