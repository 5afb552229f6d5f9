//! Configuration types for the DMA engine

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_ALIGNMENT_BOUNDARY, DEFAULT_BUS_TIMEOUT_CYCLES, DEFAULT_MAX_BURST_LEN,
    DEFAULT_MAX_CHAIN_DEPTH, DEFAULT_MAX_RETRIES, DEFAULT_MAX_WEIGHT, MAX_BURST_CAPACITY,
};

/// Bus arbitration policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArbitrationMode {
    /// Plain round robin; submission priority is ignored
    #[default]
    RoundRobin,
    /// Weighted round robin; a channel with priority `k` holds the bus for
    /// up to `k + 1` consecutive grants before the scan moves on
    WeightedRoundRobin,
}

/// Complete engine configuration
///
/// Load-time configuration: it is validated when the engine is built and
/// cannot be changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaConfig {
    /// Maximum bytes moved by one burst
    pub max_burst_len: u32,
    /// Address boundary a burst may not cross (power of two)
    pub alignment_boundary: u32,
    /// Maximum descriptors walked per chain
    pub max_chain_depth: u32,
    /// Retries after a bus timeout before escalating to a bus error
    pub max_retries: u8,
    /// Bus response budget in cycles
    pub bus_timeout_cycles: u32,
    /// Arbitration policy
    pub arbitration: ArbitrationMode,
    /// Cap applied to submission priority in weighted mode
    pub max_weight: u8,
}

impl Default for DmaConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DmaConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_burst_len: DEFAULT_MAX_BURST_LEN,
            alignment_boundary: DEFAULT_ALIGNMENT_BOUNDARY,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            max_retries: DEFAULT_MAX_RETRIES,
            bus_timeout_cycles: DEFAULT_BUS_TIMEOUT_CYCLES,
            arbitration: ArbitrationMode::RoundRobin,
            max_weight: DEFAULT_MAX_WEIGHT,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the maximum burst length in bytes
    #[must_use]
    pub const fn with_max_burst_len(mut self, len: u32) -> Self {
        self.max_burst_len = len;
        self
    }

    /// Set the alignment boundary in bytes
    #[must_use]
    pub const fn with_alignment_boundary(mut self, boundary: u32) -> Self {
        self.alignment_boundary = boundary;
        self
    }

    /// Set the maximum chain depth
    #[must_use]
    pub const fn with_max_chain_depth(mut self, depth: u32) -> Self {
        self.max_chain_depth = depth;
        self
    }

    /// Set the number of timeout retries
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the bus response budget in cycles
    #[must_use]
    pub const fn with_bus_timeout_cycles(mut self, cycles: u32) -> Self {
        self.bus_timeout_cycles = cycles;
        self
    }

    /// Set the arbitration policy
    #[must_use]
    pub const fn with_arbitration(mut self, mode: ArbitrationMode) -> Self {
        self.arbitration = mode;
        self
    }

    /// Set the priority cap for weighted arbitration
    #[must_use]
    pub const fn with_max_weight(mut self, weight: u8) -> Self {
        self.max_weight = weight;
        self
    }

    /// Check every field against the engine's limits
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.max_burst_len == 0 || self.max_burst_len as usize > MAX_BURST_CAPACITY {
            return Err(ConfigError::InvalidBurstLength);
        }
        if !self.alignment_boundary.is_power_of_two() {
            return Err(ConfigError::InvalidAlignment);
        }
        if self.max_chain_depth == 0 {
            return Err(ConfigError::InvalidChainDepth);
        }
        if self.bus_timeout_cycles == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Arbitration weight for a submission priority
    #[inline]
    #[must_use]
    pub const fn weight_for(&self, priority: u8) -> u8 {
        match self.arbitration {
            ArbitrationMode::RoundRobin => 0,
            ArbitrationMode::WeightedRoundRobin => {
                if priority > self.max_weight {
                    self.max_weight
                } else {
                    priority
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
