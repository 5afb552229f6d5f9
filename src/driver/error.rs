//! Error types for the DMA engine
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Engine construction and configuration failures
//! - [`Fault`]: Per-channel transfer faults, reported on submission or
//!   through the completion queue
//! - [`ControlError`]: Misuse of engine control operations
//!
//! The unified [`Error`] enum wraps all domain errors.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// Returned once, when an engine is built from a [`DmaConfig`](crate::DmaConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Maximum burst length is zero or exceeds the staging buffer
    InvalidBurstLength,
    /// Alignment boundary is zero or not a power of two
    InvalidAlignment,
    /// Maximum chain depth is zero
    InvalidChainDepth,
    /// Bus timeout budget is zero
    InvalidTimeout,
    /// Channel count is zero or exceeds the interrupt bitmask width
    InvalidChannelCount,
    /// Completion queue has no room for a single event
    InvalidEventCapacity,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidBurstLength => "invalid maximum burst length",
            ConfigError::InvalidAlignment => "alignment boundary must be a power of two",
            ConfigError::InvalidChainDepth => "maximum chain depth must be non-zero",
            ConfigError::InvalidTimeout => "bus timeout budget must be non-zero",
            ConfigError::InvalidChannelCount => "invalid channel count",
            ConfigError::InvalidEventCapacity => "completion queue capacity must be non-zero",
        }
    }
}

// =============================================================================
// Channel Faults
// =============================================================================

/// Channel fault kinds
///
/// A fault is local to the channel that raised it. It terminates the active
/// chain and is surfaced exactly once, either as the error of
/// [`submit`](crate::DmaEngine::submit) or as a
/// [`CompletionEvent::Faulted`](crate::CompletionEvent::Faulted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Channel already owns an active chain
    ChannelBusy,
    /// Channel id outside the configured channel count
    InvalidChannel,
    /// Descriptor or bus address outside the configured range
    InvalidAddress,
    /// Chain exceeded the maximum depth (likely cyclic or corrupted)
    ChainTooLong,
    /// Descriptor with a length of zero
    ZeroLengthDescriptor,
    /// Non-retryable bus error
    BusError,
    /// Bus did not respond within the cycle budget
    Timeout,
    /// Caller cancelled the channel
    Cancelled,
}

impl core::fmt::Display for Fault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Fault {
    /// Returns a human-readable description of the fault
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Fault::ChannelBusy => "channel busy",
            Fault::InvalidChannel => "invalid channel",
            Fault::InvalidAddress => "invalid address",
            Fault::ChainTooLong => "descriptor chain too long",
            Fault::ZeroLengthDescriptor => "zero-length descriptor",
            Fault::BusError => "bus error",
            Fault::Timeout => "bus timeout",
            Fault::Cancelled => "cancelled",
        }
    }

    /// Whether the burst that raised this fault may be retried
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Fault::Timeout)
    }
}

// =============================================================================
// Control Errors
// =============================================================================

/// Engine control errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Operation needs an active channel but the channel is idle
    NotActive,
    /// Engine did not go idle within the tick budget
    Timeout,
    /// Shared wrapper holds no engine
    NotInstalled,
}

impl core::fmt::Display for ControlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ControlError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ControlError::NotActive => "channel not active",
            ControlError::Timeout => "engine did not go idle in time",
            ControlError::NotInstalled => "no engine installed",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Fault(Fault::ChannelBusy)) => { /* ... */ }
///     Err(Error::Control(ControlError::NotActive)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Channel fault
    Fault(Fault),
    /// Control error
    Control(ControlError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Fault(e) => write!(f, "fault: {}", e.as_str()),
            Error::Control(e) => write!(f, "control: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<Fault> for Error {
    fn from(e: Fault) -> Self {
        Error::Fault(e)
    }
}

impl From<ControlError> for Error {
    fn from(e: ControlError) -> Self {
        Error::Control(e)
    }
}

/// Result type alias for engine operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for transfer operations
pub type DmaResult<T> = core::result::Result<T, Fault>;

/// Result type alias for control operations
pub type ControlResult<T> = core::result::Result<T, ControlError>;

// =============================================================================
// Unit Tests
// =============================================================================
