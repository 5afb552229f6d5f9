//! Bus arbiter.
//!
//! Channels assert a request every tick they want the burst unit; the
//! arbiter picks at most one of them. Requests are not sticky: a grant
//! consumes the winner's request, and every other request is cleared at
//! the end of the tick by [`BusArbiter::grant`].
//!
//! Round robin scans from just after the last granted channel, so with `N`
//! channels requesting continuously each one is granted at least once in
//! any `N` consecutive grants. In weighted mode a channel of weight `k`
//! keeps the bus for up to `k + 1` consecutive grants before the scan moves
//! on, which bounds the wait of any requester by the sum of `k_i + 1`.

use super::config::DmaConfig;
use super::error::ConfigResult;

/// Arbitration counters. All counters wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArbiterStats<const CHANNELS: usize> {
    /// Grants issued per channel
    pub grants: [u32; CHANNELS],
    /// Arbitration rounds with more than one requester
    pub contended_rounds: u32,
}

impl<const CHANNELS: usize> Default for ArbiterStats<CHANNELS> {
    fn default() -> Self {
        Self {
            grants: [0; CHANNELS],
            contended_rounds: 0,
        }
    }
}

impl<const CHANNELS: usize> ArbiterStats<CHANNELS> {
    /// Total grants across all channels (wrapping)
    pub fn total_grants(&self) -> u32 {
        self.grants.iter().fold(0, |total, &n| total.wrapping_add(n))
    }
}

/// Round-robin bus arbiter over `CHANNELS` requesters.
#[derive(Debug)]
pub struct BusArbiter<const CHANNELS: usize> {
    config: DmaConfig,
    /// Requests asserted this round
    pending: [bool; CHANNELS],
    /// Weight of each pending request
    weights: [u8; CHANNELS],
    /// Arbitration cursor
    last_granted: Option<usize>,
    /// Consecutive extra grants given to `last_granted`
    repeats: u8,
    stats: ArbiterStats<CHANNELS>,
}

impl<const CHANNELS: usize> BusArbiter<CHANNELS> {
    /// Create an arbiter with no grant history.
    pub fn new(config: &DmaConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            config: *config,
            pending: [false; CHANNELS],
            weights: [0; CHANNELS],
            last_granted: None,
            repeats: 0,
            stats: ArbiterStats::default(),
        })
    }

    /// Assert a bus request for `channel` at submission `priority`.
    ///
    /// Out-of-range channels are ignored.
    pub fn request(&mut self, channel: usize, priority: u8) {
        if channel >= CHANNELS {
            return;
        }
        self.pending[channel] = true;
        self.weights[channel] = self.config.weight_for(priority);
    }

    /// Whether `channel` currently has a request asserted
    pub fn is_pending(&self, channel: usize) -> bool {
        channel < CHANNELS && self.pending[channel]
    }

    /// Channel granted most recently
    pub fn last_granted(&self) -> Option<usize> {
        self.last_granted
    }

    /// Counters since construction
    pub fn stats(&self) -> &ArbiterStats<CHANNELS> {
        &self.stats
    }

    /// Pick the channel that gets the bus this round and clear all requests.
    pub fn grant(&mut self) -> Option<usize> {
        let requesters = self.pending.iter().filter(|&&p| p).count();
        if requesters == 0 {
            return None;
        }
        if requesters > 1 {
            self.stats.contended_rounds = self.stats.contended_rounds.wrapping_add(1);
        }

        let winner = self.pick();
        self.pending = [false; CHANNELS];

        if let Some(channel) = winner {
            self.stats.grants[channel] = self.stats.grants[channel].wrapping_add(1);
        }
        winner
    }

    fn pick(&mut self) -> Option<usize> {
        // Weighted hold: the previous winner keeps the bus while it has
        // repeats left and is still asking for it.
        if let Some(last) = self.last_granted
            && self.pending[last]
            && self.repeats < self.weights[last]
        {
            self.repeats += 1;
            return Some(last);
        }

        let start = self.last_granted.map_or(0, |last| last + 1);
        let winner = (0..CHANNELS)
            .map(|offset| (start + offset) % CHANNELS)
            .find(|&channel| self.pending[channel])?;

        self.last_granted = Some(winner);
        self.repeats = 0;
        Some(winner)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::config::ArbitrationMode;
    use crate::driver::error::ConfigError;

    fn round_robin<const N: usize>() -> BusArbiter<N> {
        BusArbiter::new(&DmaConfig::new()).unwrap()
    }

    fn weighted<const N: usize>(max_weight: u8) -> BusArbiter<N> {
        BusArbiter::new(
            &DmaConfig::new()
                .with_arbitration(ArbitrationMode::WeightedRoundRobin)
                .with_max_weight(max_weight),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_configuration() {
        let err = BusArbiter::<2>::new(&DmaConfig::new().with_alignment_boundary(0)).err();
        assert_eq!(err, Some(ConfigError::InvalidAlignment));
    }

    #[test]
    fn counters_wrap_at_u32_max() {
        let mut arbiter = round_robin::<2>();
        arbiter.stats.grants = [u32::MAX, u32::MAX];
        arbiter.stats.contended_rounds = u32::MAX;

        arbiter.request(0, 0);
        arbiter.request(1, 0);
        assert_eq!(arbiter.grant(), Some(0));

        assert_eq!(arbiter.stats().grants, [0, u32::MAX]);
        assert_eq!(arbiter.stats().contended_rounds, 0);
        assert_eq!(arbiter.stats().total_grants(), u32::MAX);
    }

    #[test]
    fn no_requests_no_grant() {
        let mut arbiter = round_robin::<4>();
        assert_eq!(arbiter.grant(), None);
        assert_eq!(arbiter.last_granted(), None);
    }

    #[test]
    fn first_scan_starts_at_channel_zero() {
        let mut arbiter = round_robin::<4>();
        arbiter.request(2, 0);
        arbiter.request(1, 0);
        assert_eq!(arbiter.grant(), Some(1));
    }

    #[test]
    fn scan_starts_after_last_granted() {
        let mut arbiter = round_robin::<4>();
        arbiter.request(1, 0);
        assert_eq!(arbiter.grant(), Some(1));

        arbiter.request(0, 0);
        arbiter.request(1, 0);
        arbiter.request(3, 0);
        assert_eq!(arbiter.grant(), Some(3));

        // Wraps around
        arbiter.request(0, 0);
        arbiter.request(1, 0);
        assert_eq!(arbiter.grant(), Some(0));
    }

    #[test]
    fn every_channel_granted_in_n_consecutive_grants() {
        const N: usize = 5;
        let mut arbiter = round_robin::<N>();

        let mut order = [0usize; 3 * N];
        for slot in &mut order {
            for channel in 0..N {
                arbiter.request(channel, 0);
            }
            *slot = arbiter.grant().unwrap();
        }

        for window in order.windows(N) {
            for channel in 0..N {
                assert!(window.contains(&channel), "channel {channel} starved in {window:?}");
            }
        }
        assert_eq!(arbiter.stats().grants, [3; N]);
        assert_eq!(arbiter.stats().contended_rounds, 3 * N as u32);
    }

    #[test]
    fn grant_clears_all_requests() {
        let mut arbiter = round_robin::<3>();
        arbiter.request(0, 0);
        arbiter.request(2, 0);
        assert_eq!(arbiter.grant(), Some(0));
        assert!(!arbiter.is_pending(2));
        assert_eq!(arbiter.grant(), None);
    }

    #[test]
    fn out_of_range_request_ignored() {
        let mut arbiter = round_robin::<2>();
        arbiter.request(7, 0);
        assert!(!arbiter.is_pending(7));
        assert_eq!(arbiter.grant(), None);
    }

    #[test]
    fn round_robin_ignores_priority() {
        let mut arbiter = round_robin::<2>();
        let mut grants = [0usize; 4];
        for slot in &mut grants {
            arbiter.request(0, 7);
            arbiter.request(1, 0);
            *slot = arbiter.grant().unwrap();
        }
        assert_eq!(grants, [0, 1, 0, 1]);
    }

    #[test]
    fn weighted_channel_holds_bus_for_weight_plus_one() {
        let mut arbiter = weighted::<2>(7);
        let mut grants = [0usize; 8];
        for slot in &mut grants {
            arbiter.request(0, 2);
            arbiter.request(1, 0);
            *slot = arbiter.grant().unwrap();
        }
        assert_eq!(grants, [0, 0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn weighted_priority_capped_by_max_weight() {
        let mut arbiter = weighted::<2>(1);
        let mut grants = [0usize; 6];
        for slot in &mut grants {
            arbiter.request(0, 200);
            arbiter.request(1, 0);
            *slot = arbiter.grant().unwrap();
        }
        assert_eq!(grants, [0, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn weighted_hold_ends_when_request_drops() {
        let mut arbiter = weighted::<2>(7);
        arbiter.request(0, 5);
        arbiter.request(1, 0);
        assert_eq!(arbiter.grant(), Some(0));

        arbiter.request(1, 0);
        assert_eq!(arbiter.grant(), Some(1));
    }

    #[test]
    fn weighted_starvation_bound() {
        const N: usize = 3;
        let weights = [2u8, 0, 1];
        let bound: usize = weights.iter().map(|&k| k as usize + 1).sum();

        let mut arbiter = weighted::<N>(7);
        let mut order = [0usize; 24];
        for slot in &mut order {
            for (channel, &weight) in weights.iter().enumerate() {
                arbiter.request(channel, weight);
            }
            *slot = arbiter.grant().unwrap();
        }

        for window in order.windows(bound) {
            for channel in 0..N {
                assert!(window.contains(&channel));
            }
        }
    }
}
