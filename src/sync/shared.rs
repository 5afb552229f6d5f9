//! ISR-safe engine wrapper using critical sections.
//!
//! Provides [`SharedEngine`], a `static`-friendly slot holding a
//! [`DmaEngine`]. All access goes through `critical_section::with()`.

use super::primitives::CriticalSectionCell;
#[cfg(feature = "async")]
use super::primitives::AtomicWaker;
use crate::descriptor::DescriptorStore;
use crate::driver::engine::{DmaEngine, TickOutcome};
use crate::driver::error::{ControlError, Result};
use crate::driver::reporter::CompletionEvent;
use crate::hal::memory::BusMemory;
use crate::internal::constants::{DEFAULT_CHANNELS, DEFAULT_EVENT_CAPACITY};

/// ISR-safe DMA engine wrapper.
///
/// Starts empty so it can live in a `static`; the engine is built at run
/// time and moved in with [`install`](Self::install). A typical split is a
/// timer interrupt calling [`tick`](Self::tick) and thread code submitting
/// chains and draining completions.
///
/// # Example
///
/// ```ignore
/// static DMA: SharedEngine<DescriptorTable<32>, Bridge> = SharedEngine::new();
///
/// DMA.install(DmaEngine::new(DmaConfig::new(), table, bridge)?);
/// DMA.submit(0, head, 0)?;
///
/// #[interrupt]
/// fn TIMER() {
///     DMA.tick().ok();
/// }
/// ```
pub struct SharedEngine<
    S,
    M,
    const CHANNELS: usize = DEFAULT_CHANNELS,
    const EVENTS: usize = DEFAULT_EVENT_CAPACITY,
> {
    inner: CriticalSectionCell<Option<DmaEngine<S, M, CHANNELS, EVENTS>>>,
    #[cfg(feature = "async")]
    completion_waker: AtomicWaker,
}

impl<S, M, const CHANNELS: usize, const EVENTS: usize> SharedEngine<S, M, CHANNELS, EVENTS> {
    /// Create an empty wrapper (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(None),
            #[cfg(feature = "async")]
            completion_waker: AtomicWaker::new(),
        }
    }

    /// Create a wrapper around an existing engine.
    pub const fn from_engine(engine: DmaEngine<S, M, CHANNELS, EVENTS>) -> Self {
        Self {
            inner: CriticalSectionCell::new(Some(engine)),
            #[cfg(feature = "async")]
            completion_waker: AtomicWaker::new(),
        }
    }

    /// Move `engine` in, returning the previous one.
    pub fn install(
        &self,
        engine: DmaEngine<S, M, CHANNELS, EVENTS>,
    ) -> Option<DmaEngine<S, M, CHANNELS, EVENTS>> {
        self.inner.with(|slot| slot.replace(engine))
    }

    /// Move the engine out, leaving the wrapper empty.
    pub fn take(&self) -> Option<DmaEngine<S, M, CHANNELS, EVENTS>> {
        self.inner.with(Option::take)
    }

    /// Whether an engine is installed
    pub fn is_installed(&self) -> bool {
        self.inner.with(|slot| slot.is_some())
    }

    /// Execute a closure with exclusive access to the engine.
    ///
    /// Interrupts are disabled for the duration of the closure. Returns
    /// `None` if no engine is installed.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut DmaEngine<S, M, CHANNELS, EVENTS>) -> R,
    {
        self.inner.with(|slot| slot.as_mut().map(f))
    }

    /// Try to execute a closure, returning `None` if already borrowed or
    /// empty.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut DmaEngine<S, M, CHANNELS, EVENTS>) -> R,
    {
        self.inner.try_with(|slot| slot.as_mut().map(f)).flatten()
    }
}

impl<S, M, const CHANNELS: usize, const EVENTS: usize> SharedEngine<S, M, CHANNELS, EVENTS>
where
    S: DescriptorStore,
    M: BusMemory,
{
    fn engine<R>(&self, f: impl FnOnce(&mut DmaEngine<S, M, CHANNELS, EVENTS>) -> R) -> Result<R> {
        self.with(f).ok_or_else(|| ControlError::NotInstalled.into())
    }

    /// Submit a chain; see [`DmaEngine::submit`].
    pub fn submit(&self, channel: usize, head: u32, priority: u8) -> Result<()> {
        self.engine(|engine| engine.submit(channel, head, priority))?
            .map_err(Into::into)
    }

    /// Cancel a chain; see [`DmaEngine::cancel`].
    pub fn cancel(&self, channel: usize) -> Result<()> {
        self.engine(|engine| engine.cancel(channel))?
    }

    /// Run one engine tick; see [`DmaEngine::tick`].
    ///
    /// With the `async` feature, a tick that queues a completion event wakes
    /// the task awaiting [`completion`](Self::completion).
    pub fn tick(&self) -> Result<TickOutcome> {
        let outcome = self.engine(DmaEngine::tick)?;
        #[cfg(feature = "async")]
        if outcome.events > 0 {
            self.completion_waker.wake();
        }
        Ok(outcome)
    }

    /// Next completion event, if any.
    pub fn poll_completion(&self) -> Option<CompletionEvent> {
        self.with(DmaEngine::poll_completion).flatten()
    }

    /// Whether every channel is idle (an empty wrapper counts as idle).
    pub fn is_idle(&self) -> bool {
        self.with(|engine| engine.is_idle()).unwrap_or(true)
    }

    /// Wait for the next completion event.
    #[cfg(feature = "async")]
    pub async fn completion(&self) -> CompletionEvent {
        use core::future::poll_fn;
        use core::task::Poll;

        poll_fn(|cx| {
            if let Some(event) = self.poll_completion() {
                return Poll::Ready(event);
            }
            self.completion_waker.register(cx.waker());
            // An event may have landed between the check and the register
            match self.poll_completion() {
                Some(event) => Poll::Ready(event),
                None => Poll::Pending,
            }
        })
        .await
    }
}

impl<S, M, const CHANNELS: usize, const EVENTS: usize> Default
    for SharedEngine<S, M, CHANNELS, EVENTS>
{
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
