//! Burst transfer unit.
//!
//! The one shared data-path resource of the engine. Each tick at most one
//! channel holds it, for exactly one burst: a read of the source followed by
//! a write of the destination, both the same legal length.
//!
//! A legal burst is `min(requested, max_burst_len, bytes to the next
//! alignment boundary)`. The boundary limit only applies to incrementing
//! addresses; a fixed peripheral address never advances across one.

use super::config::DmaConfig;
use super::error::{ConfigResult, DmaResult, Fault};
use crate::descriptor::AddressMode;
use crate::hal::memory::{BusFault, BusMemory, BusResult};
use crate::internal::constants::MAX_BURST_CAPACITY;

#[cfg(feature = "log")]
use log::{trace, warn};

/// Direction of a single bus transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusDirection {
    /// Bus read
    Read,
    /// Bus write
    Write,
}

/// One bus transaction, consumed by [`BurstUnit::transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusTransaction {
    /// Start address
    pub address: u32,
    /// Bytes requested
    pub length: u32,
    /// Read or write
    pub direction: BusDirection,
    /// Bytes moved by this burst, at most `length`
    pub burst_len: u32,
    /// Incrementing or fixed address
    pub mode: AddressMode,
}

impl BusTransaction {
    /// Read transaction covering the whole `length`
    #[must_use]
    pub const fn read(address: u32, length: u32, mode: AddressMode) -> Self {
        Self {
            address,
            length,
            direction: BusDirection::Read,
            burst_len: length,
            mode,
        }
    }

    /// Write transaction covering the whole `length`
    #[must_use]
    pub const fn write(address: u32, length: u32, mode: AddressMode) -> Self {
        Self {
            address,
            length,
            direction: BusDirection::Write,
            burst_len: length,
            mode,
        }
    }

    /// Same transaction, cut down to a burst of `burst_len` bytes
    #[must_use]
    pub const fn with_burst_len(self, burst_len: u32) -> Self {
        let burst_len = if burst_len < self.length { burst_len } else { self.length };
        Self { burst_len, ..self }
    }
}

/// Burst unit counters. All counters wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BurstStats {
    /// Completed copy bursts
    pub bursts: u32,
    /// Completed bus transactions (reads and writes)
    pub transactions: u32,
    /// Bytes copied by completed bursts
    pub bytes: u64,
    /// Timeout retries issued
    pub retries: u32,
    /// Timeouts that exhausted their retries
    pub escalations: u32,
}

/// Limits copied out of the configuration at construction
#[derive(Debug, Clone, Copy)]
struct BurstLimits {
    max_burst_len: u32,
    alignment_boundary: u32,
    max_retries: u8,
    bus_timeout_cycles: u32,
}

/// Shared burst transfer unit with its staging buffer.
pub struct BurstUnit {
    limits: BurstLimits,
    stats: BurstStats,
    staging: [u8; MAX_BURST_CAPACITY],
}

impl BurstUnit {
    /// Create a burst unit. The configuration is validated here.
    pub fn new(config: &DmaConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            limits: BurstLimits {
                max_burst_len: config.max_burst_len,
                alignment_boundary: config.alignment_boundary,
                max_retries: config.max_retries,
                bus_timeout_cycles: config.bus_timeout_cycles,
            },
            stats: BurstStats {
                bursts: 0,
                transactions: 0,
                bytes: 0,
                retries: 0,
                escalations: 0,
            },
            staging: [0u8; MAX_BURST_CAPACITY],
        })
    }

    /// Counters since construction
    #[inline(always)]
    pub fn stats(&self) -> BurstStats {
        self.stats
    }

    /// Longest burst starting at `address` that obeys the length and
    /// alignment limits.
    pub fn legal_len(&self, address: u32, length: u32, mode: AddressMode) -> u32 {
        self.limits.legal_len(address, length, mode)
    }

    /// Perform one transaction. Returns the bytes actually moved, which may
    /// be fewer than requested; callers loop until their length is exhausted.
    ///
    /// `buf` supplies write data or receives read data and bounds the burst.
    pub fn transfer<M: BusMemory>(
        &mut self,
        memory: &mut M,
        transaction: BusTransaction,
        buf: &mut [u8],
    ) -> DmaResult<u32> {
        let len = self
            .limits
            .legal_len(transaction.address, transaction.length, transaction.mode)
            .min(buf.len() as u32);
        issue(
            &self.limits,
            &mut self.stats,
            memory,
            transaction.with_burst_len(len),
            buf,
        )?;
        Ok(len)
    }

    /// Copy one legal burst from `src` to `dst`. Returns the bytes copied.
    ///
    /// The length is chosen so neither side crosses an alignment boundary.
    pub fn copy<M: BusMemory>(
        &mut self,
        memory: &mut M,
        src: u32,
        src_mode: AddressMode,
        dst: u32,
        dst_mode: AddressMode,
        length: u32,
    ) -> DmaResult<u32> {
        let len = self
            .limits
            .legal_len(src, length, src_mode)
            .min(self.limits.legal_len(dst, length, dst_mode));
        if len == 0 {
            return Ok(0);
        }
        issue(
            &self.limits,
            &mut self.stats,
            memory,
            BusTransaction::read(src, length, src_mode).with_burst_len(len),
            &mut self.staging,
        )?;
        issue(
            &self.limits,
            &mut self.stats,
            memory,
            BusTransaction::write(dst, length, dst_mode).with_burst_len(len),
            &mut self.staging,
        )?;

        self.stats.bursts = self.stats.bursts.wrapping_add(1);
        self.stats.bytes = self.stats.bytes.wrapping_add(len as u64);
        #[cfg(feature = "log")]
        trace!("burst 0x{src:08x} -> 0x{dst:08x} len {len}");
        Ok(len)
    }
}

impl BurstLimits {
    fn legal_len(&self, address: u32, length: u32, mode: AddressMode) -> u32 {
        let len = length.min(self.max_burst_len);
        match mode {
            AddressMode::Incrementing => {
                let to_boundary =
                    self.alignment_boundary - (address & (self.alignment_boundary - 1));
                len.min(to_boundary)
            }
            AddressMode::Fixed => len,
        }
    }

    /// Map a raw bus response onto the fault taxonomy.
    fn classify(&self, response: BusResult) -> DmaResult<()> {
        match response {
            Ok(cycles) if cycles > self.bus_timeout_cycles => Err(Fault::Timeout),
            Ok(_) => Ok(()),
            Err(BusFault::DecodeError) => Err(Fault::InvalidAddress),
            Err(BusFault::SlaveError) => Err(Fault::BusError),
            Err(BusFault::Timeout) => Err(Fault::Timeout),
        }
    }
}

/// Drive one burst against the bus, retrying timeouts.
///
/// Moves the first `transaction.burst_len` bytes of `buf`.
fn issue<M: BusMemory>(
    limits: &BurstLimits,
    stats: &mut BurstStats,
    memory: &mut M,
    transaction: BusTransaction,
    buf: &mut [u8],
) -> DmaResult<()> {
    let data = &mut buf[..transaction.burst_len as usize];
    let mut retries = 0u8;
    loop {
        let response = match (transaction.direction, transaction.mode) {
            (BusDirection::Read, AddressMode::Incrementing) => memory.read(transaction.address, data),
            (BusDirection::Read, AddressMode::Fixed) => memory.read_fixed(transaction.address, data),
            (BusDirection::Write, AddressMode::Incrementing) => {
                memory.write(transaction.address, data)
            }
            (BusDirection::Write, AddressMode::Fixed) => {
                memory.write_fixed(transaction.address, data)
            }
        };

        match limits.classify(response) {
            Ok(()) => {
                stats.transactions = stats.transactions.wrapping_add(1);
                return Ok(());
            }
            Err(fault) if fault.is_retryable() && retries < limits.max_retries => {
                retries += 1;
                stats.retries = stats.retries.wrapping_add(1);
                #[cfg(feature = "log")]
                warn!(
                    "bus timeout at 0x{:08x}, retry {}/{}",
                    transaction.address, retries, limits.max_retries
                );
            }
            Err(fault) if fault.is_retryable() => {
                stats.escalations = stats.escalations.wrapping_add(1);
                #[cfg(feature = "log")]
                warn!(
                    "bus timeout at 0x{:08x} after {} retries, escalating",
                    transaction.address, retries
                );
                return Err(Fault::BusError);
            }
            Err(fault) => return Err(fault),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
