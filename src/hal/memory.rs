//! Memory/bus backend abstraction
//!
//! The burst unit never touches memory directly. It drives a [`BusMemory`]
//! implementation, which may be a plain memory array, a mock with scripted
//! faults, or a bridge to real hardware.

// =============================================================================
// Bus Responses
// =============================================================================

/// Bus access failure, modeled on AXI response codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusFault {
    /// No slave decodes the address (AXI DECERR)
    DecodeError,
    /// Slave rejected the access (AXI SLVERR)
    SlaveError,
    /// Slave never responded
    Timeout,
}

/// Result of a bus access: worst response latency in cycles, or a fault
pub type BusResult = core::result::Result<u32, BusFault>;

// =============================================================================
// Bus Memory Trait
// =============================================================================

/// Trait for memory/bus backends
///
/// This trait can be implemented by different backends, allowing the engine
/// to run against host memory, a simulation model, or hardware.
pub trait BusMemory {
    /// Read `buf.len()` bytes starting at `address`
    fn read(&mut self, address: u32, buf: &mut [u8]) -> BusResult;

    /// Write `data` starting at `address`
    fn write(&mut self, address: u32, data: &[u8]) -> BusResult;

    /// Read `buf.len()` bytes, each from the same `address` (peripheral FIFO)
    fn read_fixed(&mut self, address: u32, buf: &mut [u8]) -> BusResult {
        let mut cycles = 0u32;
        for byte in buf.iter_mut() {
            cycles = cycles.max(self.read(address, core::slice::from_mut(byte))?);
        }
        Ok(cycles)
    }

    /// Write every byte of `data` to the same `address` (peripheral FIFO)
    fn write_fixed(&mut self, address: u32, data: &[u8]) -> BusResult {
        let mut cycles = 0u32;
        for byte in data {
            cycles = cycles.max(self.write(address, core::slice::from_ref(byte))?);
        }
        Ok(cycles)
    }
}

impl<T: BusMemory + ?Sized> BusMemory for &mut T {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> BusResult {
        (**self).read(address, buf)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> BusResult {
        (**self).write(address, data)
    }

    fn read_fixed(&mut self, address: u32, buf: &mut [u8]) -> BusResult {
        (**self).read_fixed(address, buf)
    }

    fn write_fixed(&mut self, address: u32, data: &[u8]) -> BusResult {
        (**self).write_fixed(address, data)
    }
}

// =============================================================================
// Memory Array
// =============================================================================

/// Flat memory region backed by a byte array.
///
/// Accesses that fall (even partly) outside `base..base + SIZE` answer with
/// [`BusFault::DecodeError`].
///
/// # Type Parameters
/// * `SIZE` - Region size in bytes
pub struct MemoryArray<const SIZE: usize> {
    /// Bus address of byte 0
    base: u32,
    /// Backing storage
    data: [u8; SIZE],
    /// Latency reported for every access
    latency: u32,
}

impl<const SIZE: usize> MemoryArray<SIZE> {
    /// Create a zeroed region at `base`. Const-compatible.
    #[must_use]
    pub const fn new(base: u32) -> Self {
        Self {
            base,
            data: [0u8; SIZE],
            latency: 1,
        }
    }

    /// Set the latency reported for each access
    #[must_use]
    pub const fn with_latency(mut self, cycles: u32) -> Self {
        self.latency = cycles;
        self
    }

    /// Bus address of byte 0
    #[inline(always)]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// Region size in bytes
    #[inline(always)]
    pub const fn size(&self) -> usize {
        SIZE
    }

    /// Byte offset of `address..address + len`, if the range is inside the region
    pub fn offset_of(&self, address: u32, len: usize) -> Option<usize> {
        let offset = address.checked_sub(self.base)? as usize;
        let end = offset.checked_add(len)?;
        (end <= SIZE).then_some(offset)
    }

    /// Borrow `len` bytes at `address`
    pub fn slice(&self, address: u32, len: usize) -> Option<&[u8]> {
        let offset = self.offset_of(address, len)?;
        Some(&self.data[offset..offset + len])
    }

    /// Copy `bytes` into the region at `address`, bypassing the bus
    pub fn load(&mut self, address: u32, bytes: &[u8]) -> Result<(), BusFault> {
        let offset = self
            .offset_of(address, bytes.len())
            .ok_or(BusFault::DecodeError)?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Whole region as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl<const SIZE: usize> BusMemory for MemoryArray<SIZE> {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> BusResult {
        let offset = self
            .offset_of(address, buf.len())
            .ok_or(BusFault::DecodeError)?;
        buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
        Ok(self.latency)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> BusResult {
        let offset = self
            .offset_of(address, data.len())
            .ok_or(BusFault::DecodeError)?;
        self.data[offset..offset + data.len()].copy_from_slice(data);
        Ok(self.latency)
    }
}

// =============================================================================
// Tests
// =============================================================================
