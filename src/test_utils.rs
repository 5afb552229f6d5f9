//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the DMA engine
//! on the host with scripted bus behavior.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::VecDeque;
use std::vec::Vec;

use crate::driver::burst::BusDirection;
use crate::hal::memory::{BusFault, BusMemory, BusResult, MemoryArray};

/// Size of the region backing a [`MockMemory`]
pub const MOCK_MEMORY_SIZE: usize = 0x2000;

// =============================================================================
// Mock Memory
// =============================================================================

/// Scripted answer for the next bus access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedResponse {
    /// Fail the access without touching memory
    Fault(BusFault),
    /// Perform the access and report this latency
    Latency(u32),
}

/// One access seen by a [`MockMemory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub direction: BusDirection,
    pub address: u32,
    pub len: usize,
    pub fixed: bool,
    pub response: BusResult,
}

/// Mock bus backend for testing the burst unit and engine
///
/// Each access consumes one scripted response if any is queued; otherwise it
/// succeeds with a latency of one cycle. Every access is logged.
///
/// # Example
///
/// ```ignore
/// let mut mem = MockMemory::new(0x1000);
/// mem.script(ScriptedResponse::Fault(BusFault::Timeout));
///
/// // First access times out, the retry succeeds
/// let moved = unit.copy(&mut mem, 0x1000, Incrementing, 0x1100, Incrementing, 8)?;
/// assert_eq!(mem.accesses().len(), 3);
/// ```
pub struct MockMemory {
    inner: MemoryArray<MOCK_MEMORY_SIZE>,
    script: VecDeque<ScriptedResponse>,
    /// Scripted responses applied only to accesses at one address
    address_script: Vec<(u32, ScriptedResponse)>,
    log: Vec<Access>,
}

impl MockMemory {
    /// Create a zeroed mock region at `base`
    pub fn new(base: u32) -> Self {
        Self {
            inner: MemoryArray::new(base),
            script: VecDeque::new(),
            address_script: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Queue a response for the next unscripted access
    pub fn script(&mut self, response: ScriptedResponse) {
        self.script.push_back(response);
    }

    /// Queue a response for the next access that starts at `address`
    pub fn script_at(&mut self, address: u32, response: ScriptedResponse) {
        self.address_script.push((address, response));
    }

    /// Responses still queued
    pub fn scripted_remaining(&self) -> usize {
        self.script.len() + self.address_script.len()
    }

    /// Preload bytes, bypassing the bus
    pub fn load(&mut self, address: u32, bytes: &[u8]) {
        self.inner
            .load(address, bytes)
            .expect("mock memory load out of range");
    }

    /// Borrow bytes, bypassing the bus
    pub fn slice(&self, address: u32, len: usize) -> &[u8] {
        self.inner
            .slice(address, len)
            .expect("mock memory slice out of range")
    }

    /// All accesses so far, oldest first
    pub fn accesses(&self) -> &[Access] {
        &self.log
    }

    /// Accesses in one direction
    pub fn count(&self, direction: BusDirection) -> usize {
        self.log.iter().filter(|a| a.direction == direction).count()
    }

    /// Clear the access log
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn next_response(&mut self, address: u32) -> Option<ScriptedResponse> {
        if let Some(pos) = self.address_script.iter().position(|(a, _)| *a == address) {
            return Some(self.address_script.remove(pos).1);
        }
        self.script.pop_front()
    }

    fn access(
        &mut self,
        direction: BusDirection,
        address: u32,
        len: usize,
        fixed: bool,
        perform: impl FnOnce(&mut MemoryArray<MOCK_MEMORY_SIZE>) -> BusResult,
    ) -> BusResult {
        let response = match self.next_response(address) {
            Some(ScriptedResponse::Fault(fault)) => Err(fault),
            Some(ScriptedResponse::Latency(cycles)) => perform(&mut self.inner).map(|_| cycles),
            None => perform(&mut self.inner),
        };
        self.log.push(Access {
            direction,
            address,
            len,
            fixed,
            response,
        });
        response
    }
}

impl BusMemory for MockMemory {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> BusResult {
        let len = buf.len();
        self.access(BusDirection::Read, address, len, false, |mem| mem.read(address, buf))
    }

    fn write(&mut self, address: u32, data: &[u8]) -> BusResult {
        self.access(BusDirection::Write, address, data.len(), false, |mem| {
            mem.write(address, data)
        })
    }

    fn read_fixed(&mut self, address: u32, buf: &mut [u8]) -> BusResult {
        let len = buf.len();
        self.access(BusDirection::Read, address, len, true, |mem| {
            mem.read_fixed(address, buf)
        })
    }

    fn write_fixed(&mut self, address: u32, data: &[u8]) -> BusResult {
        self.access(BusDirection::Write, address, data.len(), true, |mem| {
            mem.write_fixed(address, data)
        })
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing polling loops
///
/// Records total delay time without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
    /// Number of delay calls
    calls: RefCell<u32>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get the number of delay calls
    pub fn calls(&self) -> u32 {
        *self.calls.borrow()
    }

    /// Reset the counters
    pub fn reset(&self) {
        *self.total_ns.borrow_mut() = 0;
        *self.calls.borrow_mut() = 0;
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += ns as u64;
        *self.calls.borrow_mut() += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;

    #[test]
    fn unscripted_access_succeeds_and_is_logged() {
        let mut mem = MockMemory::new(0x1000);
        assert_eq!(mem.write(0x1000, &[1, 2]), Ok(1));

        let mut buf = [0u8; 2];
        assert_eq!(mem.read(0x1000, &mut buf), Ok(1));
        assert_eq!(buf, [1, 2]);
        assert_eq!(mem.accesses().len(), 2);
        assert_eq!(mem.count(BusDirection::Write), 1);
    }

    #[test]
    fn scripted_fault_skips_access() {
        let mut mem = MockMemory::new(0x1000);
        mem.script(ScriptedResponse::Fault(BusFault::SlaveError));

        assert_eq!(mem.write(0x1000, &[9]), Err(BusFault::SlaveError));
        assert_eq!(mem.slice(0x1000, 1), &[0]);
        assert_eq!(mem.scripted_remaining(), 0);
    }

    #[test]
    fn scripted_latency_is_reported() {
        let mut mem = MockMemory::new(0);
        mem.script(ScriptedResponse::Latency(40));
        assert_eq!(mem.write(0, &[1]), Ok(40));
        assert_eq!(mem.write(0, &[1]), Ok(1));
    }

    #[test]
    fn address_script_only_hits_matching_address() {
        let mut mem = MockMemory::new(0);
        mem.script_at(0x40, ScriptedResponse::Fault(BusFault::Timeout));

        assert_eq!(mem.write(0x20, &[1]), Ok(1));
        assert_eq!(mem.write(0x40, &[1]), Err(BusFault::Timeout));
        assert_eq!(mem.write(0x40, &[1]), Ok(1));
    }

    #[test]
    fn fixed_access_counts_once() {
        let mut mem = MockMemory::new(0);
        let mut buf = [0u8; 8];
        mem.read_fixed(0x10, &mut buf).unwrap();
        assert_eq!(mem.accesses().len(), 1);
        assert!(mem.accesses()[0].fixed);
    }

    #[test]
    fn mock_delay_accumulates() {
        let mut delay = MockDelay::new();
        delay.delay_ns(500);
        delay.delay_us(1);
        assert_eq!(delay.total_ns(), 1_500);
        assert!(delay.calls() >= 2);

        delay.reset();
        assert_eq!(delay.total_ns(), 0);
    }
}
