//! Channel state machine.
//!
//! A channel owns at most one chain. Each tick the engine calls
//! [`Channel::step`] for bookkeeping and, if the arbiter picked it,
//! [`Channel::burst`] for data movement:
//!
//! ```text
//! Idle -> FetchingDescriptor -> Transferring -> Completing -> Idle
//!                 |                   |  ^
//!                 |                   v  |
//!                 |            FetchingDescriptor (next link)
//!                 v                   v
//!              Faulted ------------> Idle
//! ```
//!
//! Only [`ChannelState::Transferring`] carries a transfer cursor, so a
//! channel that is not transferring has nothing a burst could act on.

use super::burst::BurstUnit;
use super::error::{ControlError, ControlResult, DmaResult, Fault};
use super::reporter::CompletionEvent;
use crate::descriptor::{Descriptor, DescriptorStore};
use crate::hal::memory::BusMemory;

#[cfg(feature = "log")]
use log::{debug, warn};

// =============================================================================
// State
// =============================================================================

/// Cursor over the descriptor being transferred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActiveDescriptor {
    /// Store address of the descriptor
    pub address: u32,
    /// Descriptor as fetched
    pub descriptor: Descriptor,
    /// Next source address
    pub src: u32,
    /// Next destination address
    pub dst: u32,
    /// Bytes left in this descriptor
    pub remaining: u32,
}

impl ActiveDescriptor {
    fn new(address: u32, descriptor: Descriptor) -> Self {
        Self {
            address,
            descriptor,
            src: descriptor.source_address,
            dst: descriptor.destination_address,
            remaining: descriptor.length_bytes,
        }
    }
}

/// Channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// No chain; accepts a submission
    #[default]
    Idle,
    /// Descriptor at `address` is fetched on the next step
    FetchingDescriptor {
        /// Store address to fetch
        address: u32,
    },
    /// Moving data for one descriptor
    Transferring(ActiveDescriptor),
    /// Chain finished; completion event not yet queued
    Completing,
    /// Chain aborted; fault event not yet queued
    Faulted(Fault),
}

impl ChannelState {
    /// Whether the channel owns a chain
    #[inline(always)]
    pub const fn is_active(&self) -> bool {
        !matches!(self, ChannelState::Idle)
    }
}

/// What the engine should do for a channel after its step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepAction {
    /// Nothing this tick
    None,
    /// Ask the arbiter for the bus at this priority
    RequestBus(u8),
    /// Queue this event, then [`Channel::release`] the channel
    Report(CompletionEvent),
}

/// Result of one granted burst
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BurstOutcome {
    /// Bytes moved; the descriptor has more left
    Progress(u32),
    /// Bytes moved and the descriptor finished
    DescriptorDone {
        /// Bytes moved by the final burst
        bytes: u32,
        /// Descriptor asked for a completion interrupt
        interrupt: bool,
    },
    /// Burst failed; the channel is now faulted
    Fault(Fault),
    /// Channel had nothing to transfer
    Skipped,
}

// =============================================================================
// Channel
// =============================================================================

/// One DMA channel.
#[derive(Debug, Clone)]
pub struct Channel {
    id: usize,
    priority: u8,
    state: ChannelState,
    /// Head of the current (or last) chain
    chain_head: u32,
    bytes_transferred: u64,
    descriptors_walked: u32,
    cancel_requested: bool,
    /// Fault of the last chain, cleared on the next submission
    error_flag: Option<Fault>,
}

impl Channel {
    /// Create an idle channel
    pub const fn new(id: usize) -> Self {
        Self {
            id,
            priority: 0,
            state: ChannelState::Idle,
            chain_head: 0,
            bytes_transferred: 0,
            descriptors_walked: 0,
            cancel_requested: false,
            error_flag: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Channel id
    #[inline(always)]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Priority of the current chain
    #[inline(always)]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Current state
    #[inline(always)]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Whether the channel can accept a chain
    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        !self.state.is_active()
    }

    /// Head address of the current or most recent chain
    pub fn chain_head(&self) -> u32 {
        self.chain_head
    }

    /// Address of the descriptor being fetched or transferred
    pub fn current_descriptor(&self) -> Option<u32> {
        match self.state {
            ChannelState::FetchingDescriptor { address } => Some(address),
            ChannelState::Transferring(active) => Some(active.address),
            _ => None,
        }
    }

    /// Bytes left in the current descriptor
    pub fn bytes_remaining(&self) -> u32 {
        match self.state {
            ChannelState::Transferring(active) => active.remaining,
            _ => 0,
        }
    }

    /// Next source address
    pub fn current_src(&self) -> Option<u32> {
        match self.state {
            ChannelState::Transferring(active) => Some(active.src),
            _ => None,
        }
    }

    /// Next destination address
    pub fn current_dst(&self) -> Option<u32> {
        match self.state {
            ChannelState::Transferring(active) => Some(active.dst),
            _ => None,
        }
    }

    /// Bytes moved by the current or most recent chain
    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Descriptors fetched for the current or most recent chain
    pub fn descriptors_walked(&self) -> u32 {
        self.descriptors_walked
    }

    /// Whether a cancellation is waiting for the next step
    pub fn is_cancel_pending(&self) -> bool {
        self.cancel_requested
    }

    /// Fault of the most recent chain
    pub fn error_flag(&self) -> Option<Fault> {
        self.error_flag
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Take ownership of the chain at `head`.
    ///
    /// The head address is validated by the caller against the store.
    pub fn start(&mut self, head: u32, priority: u8) -> DmaResult<()> {
        if !self.is_idle() {
            return Err(Fault::ChannelBusy);
        }
        self.state = ChannelState::FetchingDescriptor { address: head };
        self.priority = priority;
        self.chain_head = head;
        self.bytes_transferred = 0;
        self.descriptors_walked = 0;
        self.cancel_requested = false;
        self.error_flag = None;
        Ok(())
    }

    /// Record a cancellation; honored on the next step.
    pub fn cancel(&mut self) -> ControlResult<()> {
        if self.is_idle() {
            return Err(ControlError::NotActive);
        }
        self.cancel_requested = true;
        Ok(())
    }

    /// Bookkeeping step: cancellation, then descriptor fetch, then the bus
    /// request or the terminal event.
    pub fn step<S: DescriptorStore>(&mut self, store: &S, max_chain_depth: u32) -> StepAction {
        if self.cancel_requested {
            self.cancel_requested = false;
            if matches!(
                self.state,
                ChannelState::FetchingDescriptor { .. } | ChannelState::Transferring(_)
            ) {
                #[cfg(feature = "log")]
                debug!("channel {} cancelled", self.id);
                self.fault(Fault::Cancelled);
            }
        }

        if let ChannelState::FetchingDescriptor { address } = self.state {
            self.fetch(store, address, max_chain_depth);
        }

        match self.state {
            ChannelState::Idle | ChannelState::FetchingDescriptor { .. } => StepAction::None,
            ChannelState::Transferring(_) => StepAction::RequestBus(self.priority),
            ChannelState::Completing => StepAction::Report(CompletionEvent::Completed {
                channel_id: self.id,
                total_bytes: self.bytes_transferred,
            }),
            ChannelState::Faulted(fault) => StepAction::Report(CompletionEvent::Faulted {
                channel_id: self.id,
                fault,
                bytes_transferred: self.bytes_transferred,
            }),
        }
    }

    fn fetch<S: DescriptorStore>(&mut self, store: &S, address: u32, max_chain_depth: u32) {
        if self.descriptors_walked >= max_chain_depth {
            self.fault(Fault::ChainTooLong);
            return;
        }
        match store.fetch(address) {
            Ok(descriptor) if descriptor.length_bytes == 0 => {
                self.fault(Fault::ZeroLengthDescriptor);
            }
            Ok(descriptor) => {
                self.descriptors_walked += 1;
                self.state = ChannelState::Transferring(ActiveDescriptor::new(address, descriptor));
            }
            Err(fault) => self.fault(fault),
        }
    }

    /// Move one legal burst of the current descriptor.
    pub fn burst<S: DescriptorStore, M: BusMemory>(
        &mut self,
        unit: &mut BurstUnit,
        store: &mut S,
        memory: &mut M,
    ) -> BurstOutcome {
        let ChannelState::Transferring(mut active) = self.state else {
            return BurstOutcome::Skipped;
        };
        let direction = active.descriptor.direction();
        let src_mode = direction.source_mode();
        let dst_mode = direction.destination_mode();

        let bytes = match unit.copy(memory, active.src, src_mode, active.dst, dst_mode, active.remaining) {
            Ok(bytes) => bytes,
            Err(fault) => {
                self.fault(fault);
                return BurstOutcome::Fault(fault);
            }
        };

        self.bytes_transferred = self.bytes_transferred.saturating_add(bytes as u64);
        active.remaining -= bytes;
        active.src = src_mode.advance(active.src, bytes);
        active.dst = dst_mode.advance(active.dst, bytes);

        if active.remaining > 0 {
            self.state = ChannelState::Transferring(active);
            return BurstOutcome::Progress(bytes);
        }

        if let Err(fault) = store.mark_complete(active.address) {
            self.fault(fault);
            return BurstOutcome::Fault(fault);
        }

        let descriptor = active.descriptor;
        self.state = if descriptor.is_last() {
            ChannelState::Completing
        } else {
            ChannelState::FetchingDescriptor {
                address: descriptor.next_descriptor_address,
            }
        };
        BurstOutcome::DescriptorDone {
            bytes,
            interrupt: descriptor.interrupt_on_complete(),
        }
    }

    /// Return to idle once the terminal event has been queued.
    pub fn release(&mut self) {
        self.state = ChannelState::Idle;
    }

    fn fault(&mut self, fault: Fault) {
        #[cfg(feature = "log")]
        if fault != Fault::Cancelled {
            warn!(
                "channel {} faulted: {} after {} bytes",
                self.id,
                fault.as_str(),
                self.bytes_transferred
            );
        }
        self.error_flag = Some(fault);
        self.state = ChannelState::Faulted(fault);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DescriptorTable, TransferDirection};
    use crate::driver::config::DmaConfig;
    use crate::hal::memory::MemoryArray;

    const TABLE: u32 = 0x8000;

    fn setup(descs: &[Descriptor]) -> (DescriptorTable<8>, u32) {
        let mut table = DescriptorTable::new(TABLE);
        let head = table.link_chain(0, descs).unwrap();
        (table, head)
    }

    #[test]
    fn new_channel_is_idle() {
        let channel = Channel::new(3);
        assert_eq!(channel.id(), 3);
        assert!(channel.is_idle());
        assert_eq!(channel.current_descriptor(), None);
        assert_eq!(channel.bytes_remaining(), 0);
    }

    #[test]
    fn start_busy_channel_fails() {
        let mut channel = Channel::new(0);
        channel.start(TABLE, 0).unwrap();
        assert_eq!(channel.start(TABLE, 0), Err(Fault::ChannelBusy));
        assert_eq!(channel.current_descriptor(), Some(TABLE));
    }

    #[test]
    fn cancel_idle_is_not_active() {
        let mut channel = Channel::new(0);
        assert_eq!(channel.cancel(), Err(ControlError::NotActive));
    }

    #[test]
    fn step_fetches_then_requests_bus() {
        let (table, head) = setup(&[Descriptor::new(0x1000, 0x2000, 16)]);
        let mut channel = Channel::new(0);
        channel.start(head, 4).unwrap();

        assert_eq!(channel.step(&table, 16), StepAction::RequestBus(4));
        assert_eq!(channel.bytes_remaining(), 16);
        assert_eq!(channel.current_src(), Some(0x1000));
        assert_eq!(channel.current_dst(), Some(0x2000));
        assert_eq!(channel.descriptors_walked(), 1);
    }

    #[test]
    fn zero_length_descriptor_faults() {
        let (table, head) = setup(&[Descriptor::new(0x1000, 0x2000, 0)]);
        let mut channel = Channel::new(1);
        channel.start(head, 0).unwrap();

        assert_eq!(
            channel.step(&table, 16),
            StepAction::Report(CompletionEvent::Faulted {
                channel_id: 1,
                fault: Fault::ZeroLengthDescriptor,
                bytes_transferred: 0,
            })
        );
        assert_eq!(channel.error_flag(), Some(Fault::ZeroLengthDescriptor));
    }

    #[test]
    fn unwritten_link_faults_invalid_address() {
        let mut table: DescriptorTable<4> = DescriptorTable::new(TABLE);
        let mut channel = Channel::new(0);
        channel.start(TABLE + 64, 0).unwrap();

        table.write(TABLE, Descriptor::new(1, 2, 3)).unwrap();
        assert!(matches!(
            channel.step(&table, 16),
            StepAction::Report(CompletionEvent::Faulted {
                fault: Fault::InvalidAddress,
                ..
            })
        ));
    }

    #[test]
    fn bursts_walk_descriptor_and_mark_complete() {
        let (mut table, head) = setup(&[
            Descriptor::new(0x1000, 0x1100, 8).with_interrupt_on_complete(true),
            Descriptor::new(0x1008, 0x1108, 4),
        ]);
        let mut mem: MemoryArray<0x200> = MemoryArray::new(0x1000);
        mem.load(0x1000, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]).unwrap();
        let mut unit = BurstUnit::new(&DmaConfig::new().with_max_burst_len(4)).unwrap();

        let mut channel = Channel::new(0);
        channel.start(head, 0).unwrap();

        assert_eq!(channel.step(&table, 16), StepAction::RequestBus(0));
        assert_eq!(channel.burst(&mut unit, &mut table, &mut mem), BurstOutcome::Progress(4));
        assert_eq!(channel.current_src(), Some(0x1004));
        assert_eq!(
            channel.burst(&mut unit, &mut table, &mut mem),
            BurstOutcome::DescriptorDone {
                bytes: 4,
                interrupt: true
            }
        );
        assert!(table.fetch(head).unwrap().is_completed());
        assert_eq!(channel.current_descriptor(), Some(TABLE + 32));

        assert_eq!(channel.step(&table, 16), StepAction::RequestBus(0));
        assert_eq!(
            channel.burst(&mut unit, &mut table, &mut mem),
            BurstOutcome::DescriptorDone {
                bytes: 4,
                interrupt: false
            }
        );
        assert_eq!(channel.state(), ChannelState::Completing);

        assert_eq!(
            channel.step(&table, 16),
            StepAction::Report(CompletionEvent::Completed {
                channel_id: 0,
                total_bytes: 12
            })
        );
        channel.release();
        assert!(channel.is_idle());
        assert_eq!(mem.slice(0x1100, 12), mem.slice(0x1000, 12));
    }

    #[test]
    fn fixed_destination_does_not_advance() {
        let (mut table, head) = setup(&[
            Descriptor::new(0x1000, 0x1100, 8).with_direction(TransferDirection::MemToPeripheral)
        ]);
        let mut mem: MemoryArray<0x200> = MemoryArray::new(0x1000);
        let mut unit = BurstUnit::new(&DmaConfig::new().with_max_burst_len(4)).unwrap();

        let mut channel = Channel::new(0);
        channel.start(head, 0).unwrap();
        channel.step(&table, 16);
        channel.burst(&mut unit, &mut table, &mut mem);

        assert_eq!(channel.current_src(), Some(0x1004));
        assert_eq!(channel.current_dst(), Some(0x1100));
    }

    #[test]
    fn burst_fault_keeps_bytes_so_far() {
        let (mut table, head) = setup(&[Descriptor::new(0x1000, 0x1100, 8)]);
        // Destination ends halfway through the descriptor
        let mut mem: MemoryArray<0x104> = MemoryArray::new(0x1000);
        let mut unit = BurstUnit::new(&DmaConfig::new().with_max_burst_len(4)).unwrap();

        let mut channel = Channel::new(2);
        channel.start(head, 0).unwrap();
        channel.step(&table, 16);
        assert_eq!(channel.burst(&mut unit, &mut table, &mut mem), BurstOutcome::Progress(4));
        assert_eq!(
            channel.burst(&mut unit, &mut table, &mut mem),
            BurstOutcome::Fault(Fault::InvalidAddress)
        );
        assert_eq!(
            channel.step(&table, 16),
            StepAction::Report(CompletionEvent::Faulted {
                channel_id: 2,
                fault: Fault::InvalidAddress,
                bytes_transferred: 4,
            })
        );
    }

    #[test]
    fn burst_on_idle_channel_is_skipped() {
        let mut table: DescriptorTable<1> = DescriptorTable::new(TABLE);
        let mut mem: MemoryArray<4> = MemoryArray::new(0);
        let mut unit = BurstUnit::new(&DmaConfig::new()).unwrap();
        let mut channel = Channel::new(0);
        assert_eq!(channel.burst(&mut unit, &mut table, &mut mem), BurstOutcome::Skipped);
    }

    #[test]
    fn cancel_honored_on_next_step() {
        let (table, head) = setup(&[Descriptor::new(0x1000, 0x2000, 16)]);
        let mut channel = Channel::new(0);
        channel.start(head, 0).unwrap();
        channel.step(&table, 16);

        channel.cancel().unwrap();
        assert!(channel.is_cancel_pending());
        assert!(matches!(channel.state(), ChannelState::Transferring(_)));

        assert_eq!(
            channel.step(&table, 16),
            StepAction::Report(CompletionEvent::Faulted {
                channel_id: 0,
                fault: Fault::Cancelled,
                bytes_transferred: 0,
            })
        );
        assert!(!channel.is_cancel_pending());
    }

    #[test]
    fn cancel_after_completion_keeps_completed() {
        let (mut table, head) = setup(&[Descriptor::new(0x1000, 0x1100, 4)]);
        let mut mem: MemoryArray<0x200> = MemoryArray::new(0x1000);
        let mut unit = BurstUnit::new(&DmaConfig::new()).unwrap();
        let mut channel = Channel::new(0);
        channel.start(head, 0).unwrap();
        channel.step(&table, 16);
        channel.burst(&mut unit, &mut table, &mut mem);

        channel.cancel().unwrap();
        assert!(matches!(
            channel.step(&table, 16),
            StepAction::Report(CompletionEvent::Completed { .. })
        ));
    }

    #[test]
    fn chain_depth_limit() {
        let mut table: DescriptorTable<4> = DescriptorTable::new(TABLE);
        // Two-descriptor cycle
        table.write(TABLE, Descriptor::new(0x1000, 0x1100, 4).with_next(TABLE + 32)).unwrap();
        table.write(TABLE + 32, Descriptor::new(0x1004, 0x1104, 4).with_next(TABLE)).unwrap();
        let mut mem: MemoryArray<0x200> = MemoryArray::new(0x1000);
        let mut unit = BurstUnit::new(&DmaConfig::new()).unwrap();

        let mut channel = Channel::new(0);
        channel.start(TABLE, 0).unwrap();
        let mut steps = 0;
        loop {
            steps += 1;
            match channel.step(&table, 3) {
                StepAction::RequestBus(_) => {
                    channel.burst(&mut unit, &mut table, &mut mem);
                }
                StepAction::Report(event) => {
                    assert_eq!(event.fault(), Some(Fault::ChainTooLong));
                    break;
                }
                StepAction::None => {}
            }
            assert!(steps < 10);
        }
        assert_eq!(channel.descriptors_walked(), 3);
        assert_eq!(channel.bytes_transferred(), 12);
    }
}
