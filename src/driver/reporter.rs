//! Completion and status reporter.
//!
//! Every chain produces exactly one [`CompletionEvent`]. Events queue in a
//! fixed ring; when it is full the reporter refuses the event and the
//! channel keeps it until a later tick, so nothing is ever dropped.

use super::error::Fault;
use super::interrupt::InterruptStatus;
use crate::internal::ring::Ring;

/// Terminal outcome of one submitted chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompletionEvent {
    /// Terminal descriptor finished
    Completed {
        /// Channel that ran the chain
        channel_id: usize,
        /// Bytes moved by the whole chain
        total_bytes: u64,
    },
    /// Chain aborted
    Faulted {
        /// Channel that ran the chain
        channel_id: usize,
        /// Why the chain stopped
        fault: Fault,
        /// Bytes moved before the fault; they are not rolled back
        bytes_transferred: u64,
    },
}

impl CompletionEvent {
    /// Channel the event belongs to
    #[must_use]
    pub const fn channel_id(&self) -> usize {
        match self {
            CompletionEvent::Completed { channel_id, .. }
            | CompletionEvent::Faulted { channel_id, .. } => *channel_id,
        }
    }

    /// Bytes moved by the chain
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        match self {
            CompletionEvent::Completed { total_bytes, .. } => *total_bytes,
            CompletionEvent::Faulted {
                bytes_transferred, ..
            } => *bytes_transferred,
        }
    }

    /// Fault, if the chain did not complete
    #[must_use]
    pub const fn fault(&self) -> Option<Fault> {
        match self {
            CompletionEvent::Completed { .. } => None,
            CompletionEvent::Faulted { fault, .. } => Some(*fault),
        }
    }
}

/// Completion queue plus interrupt status.
pub struct CompletionReporter<const EVENTS: usize> {
    events: Ring<CompletionEvent, EVENTS>,
    status: InterruptStatus,
    emitted: u32,
}

impl<const EVENTS: usize> CompletionReporter<EVENTS> {
    /// Create an empty reporter
    pub const fn new() -> Self {
        Self {
            events: Ring::new(),
            status: InterruptStatus {
                chain_complete: 0,
                chain_fault: 0,
                descriptor_complete: 0,
            },
            emitted: 0,
        }
    }

    /// Queue `event` and raise its interrupt bit.
    ///
    /// Hands the event back if the queue is full.
    pub fn emit(&mut self, event: CompletionEvent) -> Result<(), CompletionEvent> {
        self.events.push(event)?;
        match event {
            CompletionEvent::Completed { channel_id, .. } => {
                self.status.raise_chain_complete(channel_id);
            }
            CompletionEvent::Faulted { channel_id, .. } => {
                self.status.raise_chain_fault(channel_id);
            }
        }
        self.emitted = self.emitted.wrapping_add(1);
        Ok(())
    }

    /// Raise the descriptor-complete bit of `channel`
    pub fn descriptor_complete(&mut self, channel: usize) {
        self.status.raise_descriptor_complete(channel);
    }

    /// Oldest queued event
    pub fn poll(&mut self) -> Option<CompletionEvent> {
        self.events.pop()
    }

    /// Current interrupt status
    pub fn status(&self) -> InterruptStatus {
        self.status
    }

    /// Clear status bits (write-1-to-clear)
    pub fn clear(&mut self, mask: InterruptStatus) {
        self.status.clear(mask);
    }

    /// Events waiting to be polled
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    /// Queue capacity
    pub const fn capacity(&self) -> usize {
        self.events.capacity()
    }

    /// Whether another event would be refused
    pub fn is_full(&self) -> bool {
        self.events.is_full()
    }

    /// Events accepted since construction
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl<const EVENTS: usize> Default for CompletionReporter<EVENTS> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
