//! Descriptor storage and status write-back.

use super::Descriptor;
use crate::driver::error::{DmaResult, Fault};
use crate::internal::constants::{DESCRIPTOR_SIZE, NULL_SENTINEL};
use crate::internal::descriptor_bits::control;

/// Backing storage the channels fetch descriptors from.
///
/// Implementations decide which addresses are valid. The engine only reads
/// descriptors and sets their completed status; it never rewrites links.
pub trait DescriptorStore {
    /// Fetch the descriptor at `address`.
    fn fetch(&self, address: u32) -> DmaResult<Descriptor>;

    /// Write back the completed status of the descriptor at `address`.
    fn mark_complete(&mut self, address: u32) -> DmaResult<()>;

    /// Check if `address` names a fetchable descriptor.
    fn contains(&self, address: u32) -> bool {
        self.fetch(address).is_ok()
    }
}

/// Fixed table of descriptor slots.
///
/// Slot `i` lives at `base + i * 32`. A slot is fetchable once it has been
/// written.
///
/// # Type Parameters
/// * `N` - Number of descriptor slots
pub struct DescriptorTable<const N: usize> {
    /// Bus address of slot 0
    base: u32,
    /// Slot storage, `None` until written
    slots: [Option<Descriptor>; N],
}

impl<const N: usize> DescriptorTable<N> {
    /// Create an empty table at `base`. Const-compatible.
    #[must_use]
    pub const fn new(base: u32) -> Self {
        Self {
            base,
            slots: [const { None }; N],
        }
    }

    /// Bus address of slot 0
    #[inline(always)]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Number of slots
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bus address of slot `index`
    #[inline(always)]
    pub const fn address_of(&self, index: usize) -> u32 {
        self.base.wrapping_add((index as u32).wrapping_mul(DESCRIPTOR_SIZE))
    }

    /// Slot index for `address`.
    pub fn index_of(&self, address: u32) -> DmaResult<usize> {
        if address == NULL_SENTINEL {
            return Err(Fault::InvalidAddress);
        }
        let offset = address.checked_sub(self.base).ok_or(Fault::InvalidAddress)?;
        if offset % DESCRIPTOR_SIZE != 0 {
            return Err(Fault::InvalidAddress);
        }
        let index = (offset / DESCRIPTOR_SIZE) as usize;
        if index >= N {
            return Err(Fault::InvalidAddress);
        }
        Ok(index)
    }

    /// Write a descriptor into the slot at `address`.
    ///
    /// Status bits in the control word are cleared; only the engine sets them.
    pub fn write(&mut self, address: u32, descriptor: Descriptor) -> DmaResult<()> {
        let index = self.index_of(address)?;
        let mut descriptor = descriptor;
        descriptor.control &= control::CONFIG_MASK;
        self.slots[index] = Some(descriptor);
        Ok(())
    }

    /// Invalidate the slot at `address`.
    pub fn clear(&mut self, address: u32) -> DmaResult<()> {
        let index = self.index_of(address)?;
        self.slots[index] = None;
        Ok(())
    }

    /// Write `descriptors` into consecutive slots starting at `first_index`,
    /// linking each to the next and terminating the last. Returns the chain
    /// head address.
    pub fn link_chain(&mut self, first_index: usize, descriptors: &[Descriptor]) -> DmaResult<u32> {
        if descriptors.is_empty() || first_index + descriptors.len() > N {
            return Err(Fault::InvalidAddress);
        }
        let count = descriptors.len();
        for (i, desc) in descriptors.iter().enumerate() {
            let next = if i + 1 == count {
                NULL_SENTINEL
            } else {
                self.address_of(first_index + i + 1)
            };
            self.write(self.address_of(first_index + i), desc.with_next(next))?;
        }
        Ok(self.address_of(first_index))
    }
}

impl<const N: usize> DescriptorStore for DescriptorTable<N> {
    fn fetch(&self, address: u32) -> DmaResult<Descriptor> {
        let index = self.index_of(address)?;
        self.slots[index].ok_or(Fault::InvalidAddress)
    }

    fn mark_complete(&mut self, address: u32) -> DmaResult<()> {
        let index = self.index_of(address)?;
        let slot = self.slots[index].as_mut().ok_or(Fault::InvalidAddress)?;
        slot.control |= control::COMPLETED;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
