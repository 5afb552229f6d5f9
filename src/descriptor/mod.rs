//! Scatter-gather descriptors.
//!
//! A [`Descriptor`] describes one contiguous transfer and links to the next
//! descriptor of its chain. Descriptors are fetched by value; the only field
//! the engine ever writes back is the `COMPLETED` status bit, through
//! [`DescriptorStore::mark_complete`].

mod store;

pub use store::{DescriptorStore, DescriptorTable};

/// Control word bits
pub use crate::internal::descriptor_bits::control;

use crate::internal::constants::NULL_SENTINEL;

// =============================================================================
// Address Mode / Direction
// =============================================================================

/// How an address moves as a burst proceeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    /// Memory: address advances by the bytes moved
    #[default]
    Incrementing,
    /// Peripheral FIFO: every byte goes through the same address
    Fixed,
}

impl AddressMode {
    /// Address after moving `bytes` bytes
    #[inline(always)]
    #[must_use]
    pub const fn advance(self, address: u32, bytes: u32) -> u32 {
        match self {
            AddressMode::Incrementing => address.wrapping_add(bytes),
            AddressMode::Fixed => address,
        }
    }
}

/// Transfer direction
///
/// The four directions differ only in which side streams through a fixed
/// peripheral address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    /// Memory to memory
    #[default]
    MemToMem,
    /// Memory to peripheral
    MemToPeripheral,
    /// Peripheral to memory
    PeripheralToMem,
    /// Peripheral to peripheral
    PeripheralToPeripheral,
}

impl TransferDirection {
    /// Control bits encoding this direction
    #[must_use]
    pub const fn control_bits(self) -> u32 {
        match self {
            TransferDirection::MemToMem => 0,
            TransferDirection::MemToPeripheral => control::DST_FIXED,
            TransferDirection::PeripheralToMem => control::SRC_FIXED,
            TransferDirection::PeripheralToPeripheral => control::SRC_FIXED | control::DST_FIXED,
        }
    }

    /// Decode from a control word
    #[must_use]
    pub const fn from_control(control_word: u32) -> Self {
        let src_fixed = (control_word & control::SRC_FIXED) != 0;
        let dst_fixed = (control_word & control::DST_FIXED) != 0;
        match (src_fixed, dst_fixed) {
            (false, false) => TransferDirection::MemToMem,
            (false, true) => TransferDirection::MemToPeripheral,
            (true, false) => TransferDirection::PeripheralToMem,
            (true, true) => TransferDirection::PeripheralToPeripheral,
        }
    }

    /// Address mode of the source side
    #[must_use]
    pub const fn source_mode(self) -> AddressMode {
        match self {
            TransferDirection::MemToMem | TransferDirection::MemToPeripheral => {
                AddressMode::Incrementing
            }
            TransferDirection::PeripheralToMem | TransferDirection::PeripheralToPeripheral => {
                AddressMode::Fixed
            }
        }
    }

    /// Address mode of the destination side
    #[must_use]
    pub const fn destination_mode(self) -> AddressMode {
        match self {
            TransferDirection::MemToMem | TransferDirection::PeripheralToMem => {
                AddressMode::Incrementing
            }
            TransferDirection::MemToPeripheral | TransferDirection::PeripheralToPeripheral => {
                AddressMode::Fixed
            }
        }
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Scatter-gather descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Descriptor {
    /// Source bus address
    pub source_address: u32,
    /// Destination bus address
    pub destination_address: u32,
    /// Bytes to move; must be non-zero
    pub length_bytes: u32,
    /// Control and status word (see `descriptor_bits::control`)
    pub control: u32,
    /// Address of the next descriptor, or the null sentinel
    pub next_descriptor_address: u32,
}

impl Descriptor {
    /// Create a terminal memory-to-memory descriptor.
    #[must_use]
    pub const fn new(source_address: u32, destination_address: u32, length_bytes: u32) -> Self {
        Self {
            source_address,
            destination_address,
            length_bytes,
            control: 0,
            next_descriptor_address: NULL_SENTINEL,
        }
    }

    /// Link to the next descriptor
    #[must_use]
    pub const fn with_next(mut self, next: u32) -> Self {
        self.next_descriptor_address = next;
        self
    }

    /// Set the transfer direction
    #[must_use]
    pub const fn with_direction(mut self, direction: TransferDirection) -> Self {
        self.control =
            (self.control & !(control::SRC_FIXED | control::DST_FIXED)) | direction.control_bits();
        self
    }

    /// Replace the configuration bits of the control word.
    ///
    /// Bits outside `control::CONFIG_MASK` are ignored; status is owned by
    /// the engine.
    #[must_use]
    pub const fn with_control(mut self, control_word: u32) -> Self {
        self.control = (self.control & control::STATUS_MASK) | (control_word & control::CONFIG_MASK);
        self
    }

    /// Request a descriptor-complete interrupt
    #[must_use]
    pub const fn with_interrupt_on_complete(mut self, enabled: bool) -> Self {
        if enabled {
            self.control |= control::INTERRUPT_ON_COMPLETE;
        } else {
            self.control &= !control::INTERRUPT_ON_COMPLETE;
        }
        self
    }

    /// Transfer direction encoded in the control word
    #[inline(always)]
    #[must_use]
    pub const fn direction(&self) -> TransferDirection {
        TransferDirection::from_control(self.control)
    }

    /// Whether this descriptor terminates its chain
    #[inline(always)]
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next_descriptor_address == NULL_SENTINEL
    }

    /// Whether the engine has written back the completed status
    #[inline(always)]
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        (self.control & control::COMPLETED) != 0
    }

    /// Whether finishing this descriptor raises an interrupt
    #[inline(always)]
    #[must_use]
    pub const fn interrupt_on_complete(&self) -> bool {
        (self.control & control::INTERRUPT_ON_COMPLETE) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_descriptor_is_terminal_mem_to_mem() {
        let desc = Descriptor::new(0x1000, 0x2000, 16);
        assert!(desc.is_last());
        assert!(!desc.is_completed());
        assert!(!desc.interrupt_on_complete());
        assert_eq!(desc.direction(), TransferDirection::MemToMem);
    }

    #[test]
    fn with_next_links() {
        let desc = Descriptor::new(0x1000, 0x2000, 16).with_next(0x8020);
        assert!(!desc.is_last());
        assert_eq!(desc.next_descriptor_address, 0x8020);
    }

    #[test]
    fn direction_round_trips_through_control_bits() {
        for dir in [
            TransferDirection::MemToMem,
            TransferDirection::MemToPeripheral,
            TransferDirection::PeripheralToMem,
            TransferDirection::PeripheralToPeripheral,
        ] {
            let desc = Descriptor::new(0, 0, 1).with_direction(dir);
            assert_eq!(desc.direction(), dir);
        }
    }

    #[test]
    fn with_direction_replaces_previous_direction() {
        let desc = Descriptor::new(0, 0, 1)
            .with_direction(TransferDirection::PeripheralToPeripheral)
            .with_direction(TransferDirection::MemToPeripheral);
        assert_eq!(desc.direction(), TransferDirection::MemToPeripheral);
    }

    #[test]
    fn direction_address_modes() {
        assert_eq!(TransferDirection::MemToPeripheral.source_mode(), AddressMode::Incrementing);
        assert_eq!(TransferDirection::MemToPeripheral.destination_mode(), AddressMode::Fixed);
        assert_eq!(TransferDirection::PeripheralToMem.source_mode(), AddressMode::Fixed);
        assert_eq!(TransferDirection::PeripheralToMem.destination_mode(), AddressMode::Incrementing);
    }

    #[test]
    fn address_mode_advance() {
        assert_eq!(AddressMode::Incrementing.advance(0x1000, 8), 0x1008);
        assert_eq!(AddressMode::Fixed.advance(0x4000_0000, 8), 0x4000_0000);
    }

    #[test]
    fn with_control_keeps_only_config_bits() {
        let desc = Descriptor::new(0, 0, 1)
            .with_control(control::DST_FIXED | control::INTERRUPT_ON_COMPLETE | control::COMPLETED);
        assert_eq!(desc.direction(), TransferDirection::MemToPeripheral);
        assert!(desc.interrupt_on_complete());
        assert!(!desc.is_completed());
    }

    #[test]
    fn interrupt_flag_toggles() {
        let desc = Descriptor::new(0, 0, 1).with_interrupt_on_complete(true);
        assert!(desc.interrupt_on_complete());
        let desc = desc.with_interrupt_on_complete(false);
        assert!(!desc.interrupt_on_complete());
    }
}
