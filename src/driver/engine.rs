//! DMA engine.
//!
//! Owns the descriptor store, the bus backend, every channel, the arbiter,
//! the burst unit and the completion reporter. The engine is cooperative:
//! nothing moves until [`DmaEngine::tick`] is called, and one tick runs
//! three phases:
//!
//! 1. Each channel, in id order, does its bookkeeping: cancellation,
//!    descriptor fetch, terminal event, bus request.
//! 2. The arbiter grants the bus to at most one requesting channel.
//! 3. The granted channel moves exactly one burst.

use embedded_hal::delay::DelayNs;

use super::arbiter::BusArbiter;
use super::burst::BurstUnit;
use super::channel::{BurstOutcome, Channel, StepAction};
use super::config::DmaConfig;
use super::error::{ConfigError, ConfigResult, ControlError, DmaResult, Fault, Result};
use super::interrupt::InterruptStatus;
use super::reporter::{CompletionEvent, CompletionReporter};
use crate::descriptor::DescriptorStore;
use crate::hal::memory::BusMemory;
use crate::internal::constants::{DEFAULT_CHANNELS, DEFAULT_EVENT_CAPACITY, MAX_CHANNELS};

#[cfg(feature = "log")]
use log::debug;

// =============================================================================
// Statistics
// =============================================================================

/// Engine counters since construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineStats<const CHANNELS: usize> {
    /// Ticks run
    pub ticks: u64,
    /// Bursts completed
    pub bursts: u32,
    /// Bytes moved by completed bursts
    pub bytes: u64,
    /// Bus timeout retries
    pub retries: u32,
    /// Timeouts escalated to bus errors
    pub escalations: u32,
    /// Bus grants per channel
    pub grants: [u32; CHANNELS],
    /// Ticks where more than one channel wanted the bus
    pub contended_rounds: u32,
    /// Completion events queued
    pub events: u32,
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutcome {
    /// Channel that held the bus
    pub granted: Option<usize>,
    /// Bytes moved by the burst
    pub bytes: u32,
    /// Completion events queued
    pub events: u32,
}

// =============================================================================
// Engine
// =============================================================================

/// Scatter-gather DMA engine.
///
/// # Type Parameters
/// * `S` - Descriptor store
/// * `M` - Bus backend
/// * `CHANNELS` - Number of channels (1 to 32)
/// * `EVENTS` - Completion queue capacity
///
/// # Example
///
/// ```ignore
/// let mut table: DescriptorTable<8> = DescriptorTable::new(0x8000);
/// let head = table.link_chain(0, &[
///     Descriptor::new(0x1000, 0x2000, 16),
///     Descriptor::new(0x1010, 0x2010, 16),
/// ])?;
///
/// let mut engine: DmaEngine<_, _> = DmaEngine::new(DmaConfig::new(), table, memory)?;
/// engine.submit(0, head, 0)?;
/// engine.run_until_idle(&mut delay, 1_000, 100)?;
///
/// assert_eq!(
///     engine.poll_completion(),
///     Some(CompletionEvent::Completed { channel_id: 0, total_bytes: 32 })
/// );
/// ```
pub struct DmaEngine<
    S,
    M,
    const CHANNELS: usize = DEFAULT_CHANNELS,
    const EVENTS: usize = DEFAULT_EVENT_CAPACITY,
> {
    config: DmaConfig,
    store: S,
    memory: M,
    channels: [Channel; CHANNELS],
    arbiter: BusArbiter<CHANNELS>,
    burst: BurstUnit,
    reporter: CompletionReporter<EVENTS>,
    ticks: u64,
}

impl<S, M, const CHANNELS: usize, const EVENTS: usize> DmaEngine<S, M, CHANNELS, EVENTS>
where
    S: DescriptorStore,
    M: BusMemory,
{
    /// Build an engine. The configuration is validated here and fixed for
    /// the engine's lifetime.
    pub fn new(config: DmaConfig, store: S, memory: M) -> ConfigResult<Self> {
        config.validate()?;
        if CHANNELS == 0 || CHANNELS > MAX_CHANNELS {
            return Err(ConfigError::InvalidChannelCount);
        }
        if EVENTS == 0 {
            return Err(ConfigError::InvalidEventCapacity);
        }

        Ok(Self {
            config,
            store,
            memory,
            channels: core::array::from_fn(Channel::new),
            arbiter: BusArbiter::new(&config)?,
            burst: BurstUnit::new(&config)?,
            reporter: CompletionReporter::new(),
            ticks: 0,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Active configuration
    #[inline(always)]
    pub fn config(&self) -> &DmaConfig {
        &self.config
    }

    /// Descriptor store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Descriptor store, mutable. Descriptors already fetched by a channel
    /// are not affected by later writes.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Bus backend
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Bus backend, mutable
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Channel `id`, if it exists
    pub fn channel(&self, id: usize) -> Option<&Channel> {
        self.channels.get(id)
    }

    /// Number of channels
    #[inline(always)]
    pub const fn channel_count(&self) -> usize {
        CHANNELS
    }

    /// Whether every channel is idle
    pub fn is_idle(&self) -> bool {
        self.channels.iter().all(Channel::is_idle)
    }

    /// Counters since construction
    pub fn stats(&self) -> EngineStats<CHANNELS> {
        let burst = self.burst.stats();
        let arbiter = self.arbiter.stats();
        EngineStats {
            ticks: self.ticks,
            bursts: burst.bursts,
            bytes: burst.bytes,
            retries: burst.retries,
            escalations: burst.escalations,
            grants: arbiter.grants,
            contended_rounds: arbiter.contended_rounds,
            events: self.reporter.emitted(),
        }
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Hand the chain starting at `head` to `channel`.
    ///
    /// The head must be fetchable from the store. Further links are only
    /// checked as the chain is walked.
    pub fn submit(&mut self, channel: usize, head: u32, priority: u8) -> DmaResult<()> {
        let slot = self.channels.get_mut(channel).ok_or(Fault::InvalidChannel)?;
        if !slot.is_idle() {
            return Err(Fault::ChannelBusy);
        }
        if !self.store.contains(head) {
            return Err(Fault::InvalidAddress);
        }
        slot.start(head, priority)?;

        #[cfg(feature = "log")]
        debug!("channel {channel}: chain 0x{head:08x} submitted, priority {priority}");
        Ok(())
    }

    /// Cancel the chain on `channel` at its next step.
    ///
    /// Bytes already moved stay moved; the chain ends with a
    /// [`Fault::Cancelled`] event.
    pub fn cancel(&mut self, channel: usize) -> Result<()> {
        let slot = self.channels.get_mut(channel).ok_or(Fault::InvalidChannel)?;
        slot.cancel()?;
        Ok(())
    }

    /// Advance every channel by one step and move at most one burst.
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks = self.ticks.wrapping_add(1);
        let mut outcome = TickOutcome::default();

        for channel in &mut self.channels {
            match channel.step(&self.store, self.config.max_chain_depth) {
                StepAction::None => {}
                StepAction::RequestBus(priority) => self.arbiter.request(channel.id(), priority),
                StepAction::Report(event) => {
                    // A full queue leaves the channel holding its event
                    if self.reporter.emit(event).is_ok() {
                        channel.release();
                        outcome.events += 1;
                        #[cfg(feature = "log")]
                        log_event(&event);
                    }
                }
            }
        }

        let Some(id) = self.arbiter.grant() else {
            return outcome;
        };
        outcome.granted = Some(id);

        match self.channels[id].burst(&mut self.burst, &mut self.store, &mut self.memory) {
            BurstOutcome::Progress(bytes) => outcome.bytes = bytes,
            BurstOutcome::DescriptorDone { bytes, interrupt } => {
                outcome.bytes = bytes;
                if interrupt {
                    self.reporter.descriptor_complete(id);
                }
            }
            BurstOutcome::Fault(_) | BurstOutcome::Skipped => {}
        }
        outcome
    }

    /// Next completion event, oldest first
    pub fn poll_completion(&mut self) -> Option<CompletionEvent> {
        self.reporter.poll()
    }

    /// Events waiting in the completion queue
    pub fn pending_completions(&self) -> usize {
        self.reporter.pending()
    }

    /// Current interrupt status
    pub fn interrupt_status(&self) -> InterruptStatus {
        self.reporter.status()
    }

    /// Clear interrupt bits (write-1-to-clear)
    pub fn clear_interrupts(&mut self, mask: InterruptStatus) {
        self.reporter.clear(mask);
    }

    /// Tick until every channel is idle, pausing `tick_interval_ns` between
    /// ticks. Returns the number of ticks run.
    ///
    /// Events are not drained; a chain that finds the completion queue full
    /// keeps its channel busy, so callers with more chains in flight than
    /// queue slots must poll between calls.
    ///
    /// # Errors
    ///
    /// [`ControlError::Timeout`] if the engine is still busy after
    /// `max_ticks` ticks.
    pub fn run_until_idle<D: DelayNs>(
        &mut self,
        delay: &mut D,
        tick_interval_ns: u32,
        max_ticks: u32,
    ) -> Result<u32> {
        let mut ticks = 0u32;
        while !self.is_idle() {
            if ticks >= max_ticks {
                return Err(ControlError::Timeout.into());
            }
            self.tick();
            ticks += 1;
            if !self.is_idle() {
                delay.delay_ns(tick_interval_ns);
            }
        }
        Ok(ticks)
    }
}

#[cfg(feature = "log")]
fn log_event(event: &CompletionEvent) {
    match event {
        CompletionEvent::Completed {
            channel_id,
            total_bytes,
        } => debug!("channel {channel_id}: chain complete, {total_bytes} bytes"),
        CompletionEvent::Faulted {
            channel_id,
            fault,
            bytes_transferred,
        } => debug!(
            "channel {channel_id}: chain faulted ({}), {bytes_transferred} bytes",
            fault.as_str()
        ),
    }
}

// =============================================================================
// Tests
// =============================================================================
