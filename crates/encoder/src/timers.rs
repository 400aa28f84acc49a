//! Respawn timer reconstruction.
//!
//! Snapshots only expose "is demoed" and "pad is active" flags. The
//! countdowns fed to the model are rebuilt here by edge detection on those
//! flags across consecutive rows.
//!
//! Each tracker has a pure transition (`advance`) taking the previous flag,
//! the current flag, the current countdown and the elapsed seconds, plus a
//! stateful wrapper (`update`) used by the sequence encoder.

use pearl_state::{BOOST_PAD_COUNT, TICK_RATE_HZ};
use tracing::trace;

// ============================================================================
// Constants
// ============================================================================

/// Seconds a demolished car waits before respawning.
pub const DEMO_RESPAWN_TIME: f32 = 3.0;

/// Seconds a small boost pad stays inactive after pickup.
pub const SMALL_BOOST_RESPAWN_TIME: f32 = 4.0;

/// Seconds a big boost pad stays inactive after pickup.
pub const BIG_BOOST_RESPAWN_TIME: f32 = 10.0;

/// Pad slots holding big (100 boost) pads. Every other slot is small.
pub const BIG_BOOST_INDEX: [usize; 6] = [3, 4, 15, 18, 29, 30];

/// Seconds covered by one simulation tick.
pub const SECONDS_PER_TICK: f32 = 1.0 / TICK_RATE_HZ as f32;

/// Seconds covered by one encoded row of `tick_skip` simulation ticks.
pub fn seconds_per_row(tick_skip: u32) -> f32 {
    tick_skip as f32 / TICK_RATE_HZ as f32
}

// ============================================================================
// Demolition Timer
// ============================================================================

/// Lifecycle phase of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoPhase {
    Alive,
    Respawning,
}

/// Respawn countdown for one roster slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoTimer {
    demoed: bool,
    remaining: f32,
}

impl DemoTimer {
    /// Tracker seeded from the first observed row.
    ///
    /// A car already demoed at the first row starts the full countdown.
    pub fn start(is_demoed: bool) -> Self {
        Self {
            demoed: is_demoed,
            remaining: if is_demoed { DEMO_RESPAWN_TIME } else { 0.0 },
        }
    }

    /// Countdown after one row, given the previous and current demo flags.
    pub fn advance(previous: bool, current: bool, remaining: f32, elapsed: f32) -> f32 {
        match (previous, current) {
            (false, true) => DEMO_RESPAWN_TIME,
            (true, true) if remaining > 0.0 => (remaining - elapsed).max(0.0),
            (true, true) => remaining,
            (_, false) => 0.0,
        }
    }

    /// Feed the next row's flag and return the new countdown.
    pub fn update(&mut self, is_demoed: bool, elapsed: f32) -> f32 {
        if !self.demoed && is_demoed {
            trace!("car demolished, respawn countdown started");
        }
        self.remaining = Self::advance(self.demoed, is_demoed, self.remaining, elapsed);
        self.demoed = is_demoed;
        self.remaining
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn phase(&self) -> DemoPhase {
        if self.remaining > 0.0 {
            DemoPhase::Respawning
        } else {
            DemoPhase::Alive
        }
    }
}

// ============================================================================
// Boost Pad Timers
// ============================================================================

/// Duration class of a pad slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadSize {
    Small,
    Big,
}

impl PadSize {
    pub fn of_slot(slot: usize) -> Self {
        if BIG_BOOST_INDEX.contains(&slot) {
            Self::Big
        } else {
            Self::Small
        }
    }

    pub fn respawn_time(self) -> f32 {
        match self {
            Self::Small => SMALL_BOOST_RESPAWN_TIME,
            Self::Big => BIG_BOOST_RESPAWN_TIME,
        }
    }
}

/// Respawn countdown for one pad slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadTimer {
    size: PadSize,
    active: bool,
    remaining: f32,
}

impl PadTimer {
    /// Tracker seeded from the first observed row.
    ///
    /// A pad already inactive at the first row is treated as just picked up:
    /// its true remaining time is unknown, so the full duration is assumed.
    /// This over-estimates the countdown for pads consumed before the
    /// sequence began.
    pub fn start(size: PadSize, is_active: bool) -> Self {
        Self {
            size,
            active: is_active,
            remaining: if is_active { 0.0 } else { size.respawn_time() },
        }
    }

    /// Countdown after one row, given the previous and current activity.
    pub fn advance(
        size: PadSize,
        previous_active: bool,
        current_active: bool,
        remaining: f32,
        elapsed: f32,
    ) -> f32 {
        match (previous_active, current_active) {
            (_, true) => 0.0,
            (true, false) => size.respawn_time(),
            (false, false) => (remaining - elapsed).max(0.0),
        }
    }

    pub fn update(&mut self, is_active: bool, elapsed: f32) -> f32 {
        self.remaining = Self::advance(self.size, self.active, is_active, self.remaining, elapsed);
        self.active = is_active;
        self.remaining
    }

    pub fn size(&self) -> PadSize {
        self.size
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// Timers for every pad slot on the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct PadTimers {
    pads: [PadTimer; BOOST_PAD_COUNT],
}

impl PadTimers {
    pub fn start(boost_pads: &[bool; BOOST_PAD_COUNT]) -> Self {
        Self {
            pads: std::array::from_fn(|slot| {
                PadTimer::start(PadSize::of_slot(slot), boost_pads[slot])
            }),
        }
    }

    pub fn update(&mut self, boost_pads: &[bool; BOOST_PAD_COUNT], elapsed: f32) {
        for (slot, (timer, &active)) in self.pads.iter_mut().zip(boost_pads).enumerate() {
            if timer.active && !active {
                trace!(slot, "boost pad picked up");
            }
            timer.update(active, elapsed);
        }
    }

    pub fn remaining(&self) -> [f32; BOOST_PAD_COUNT] {
        std::array::from_fn(|slot| self.pads[slot].remaining)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    // ========================================================================
    // Demolition transitions
    // ========================================================================

    #[test]
    fn test_demo_rising_edge_resets_to_full() {
        assert_eq!(DemoTimer::advance(false, true, 0.0, 0.1), DEMO_RESPAWN_TIME);
        assert_eq!(DemoTimer::advance(false, true, 1.2, 0.1), DEMO_RESPAWN_TIME);
    }

    #[test]
    fn test_demo_held_decays_and_clamps() {
        let next = DemoTimer::advance(true, true, 3.0, 0.5);
        assert!((next - 2.5).abs() < EPS);
        assert_eq!(DemoTimer::advance(true, true, 0.2, 0.5), 0.0);
        assert_eq!(DemoTimer::advance(true, true, 0.0, 0.5), 0.0);
    }

    #[test]
    fn test_demo_not_demoed_forces_zero() {
        assert_eq!(DemoTimer::advance(true, false, 2.0, 0.1), 0.0);
        assert_eq!(DemoTimer::advance(false, false, 0.0, 0.1), 0.0);
    }

    #[test]
    fn test_demo_start_from_first_row() {
        assert_eq!(DemoTimer::start(true).remaining(), DEMO_RESPAWN_TIME);
        assert_eq!(DemoTimer::start(true).phase(), DemoPhase::Respawning);
        assert_eq!(DemoTimer::start(false).remaining(), 0.0);
        assert_eq!(DemoTimer::start(false).phase(), DemoPhase::Alive);
    }

    #[test]
    fn test_demo_update_sequence() {
        let dt = seconds_per_row(8);
        let mut timer = DemoTimer::start(false);
        assert_eq!(timer.update(true, dt), DEMO_RESPAWN_TIME);
        let after_one = timer.update(true, dt);
        assert!((after_one - (DEMO_RESPAWN_TIME - dt)).abs() < EPS);
        assert_eq!(timer.update(false, dt), 0.0);
        assert_eq!(timer.phase(), DemoPhase::Alive);
    }

    #[test]
    fn test_demo_countdown_reaches_zero_then_holds() {
        let mut timer = DemoTimer::start(true);
        for _ in 0..10 {
            timer.update(true, 1.0);
        }
        assert_eq!(timer.remaining(), 0.0);
        assert_eq!(timer.phase(), DemoPhase::Alive);
    }

    // ========================================================================
    // Pad transitions
    // ========================================================================

    #[test]
    fn test_pad_size_classification() {
        assert_eq!(PadSize::of_slot(0), PadSize::Small);
        assert_eq!(PadSize::of_slot(3), PadSize::Big);
        let big = (0..BOOST_PAD_COUNT)
            .filter(|&slot| PadSize::of_slot(slot) == PadSize::Big)
            .count();
        assert_eq!(big, 6);
    }

    #[test]
    fn test_pad_pickup_resets_by_size() {
        assert_eq!(
            PadTimer::advance(PadSize::Big, true, false, 0.0, SECONDS_PER_TICK),
            BIG_BOOST_RESPAWN_TIME
        );
        assert_eq!(
            PadTimer::advance(PadSize::Small, true, false, 0.0, SECONDS_PER_TICK),
            SMALL_BOOST_RESPAWN_TIME
        );
    }

    #[test]
    fn test_pad_inactive_decays() {
        let next = PadTimer::advance(PadSize::Small, false, false, 4.0, SECONDS_PER_TICK);
        assert!((next - (4.0 - 1.0 / 120.0)).abs() < EPS);
        assert_eq!(
            PadTimer::advance(PadSize::Small, false, false, 0.001, SECONDS_PER_TICK),
            0.0
        );
    }

    #[test]
    fn test_pad_active_forces_zero() {
        assert_eq!(PadTimer::advance(PadSize::Big, false, true, 7.5, SECONDS_PER_TICK), 0.0);
        assert_eq!(PadTimer::advance(PadSize::Big, true, true, 0.0, SECONDS_PER_TICK), 0.0);
    }

    #[test]
    fn test_pad_start_inactive_assumes_just_picked_up() {
        assert_eq!(PadTimer::start(PadSize::Big, false).remaining(), BIG_BOOST_RESPAWN_TIME);
        assert_eq!(PadTimer::start(PadSize::Small, false).remaining(), SMALL_BOOST_RESPAWN_TIME);
        assert_eq!(PadTimer::start(PadSize::Big, true).remaining(), 0.0);
    }

    #[test]
    fn test_pad_timers_track_all_slots() {
        let mut pads = [true; BOOST_PAD_COUNT];
        let mut timers = PadTimers::start(&pads);
        assert!(timers.remaining().iter().all(|&t| t == 0.0));

        pads[0] = false;
        pads[3] = false;
        timers.update(&pads, SECONDS_PER_TICK);
        let remaining = timers.remaining();
        assert_eq!(remaining[0], SMALL_BOOST_RESPAWN_TIME);
        assert_eq!(remaining[3], BIG_BOOST_RESPAWN_TIME);
        assert_eq!(remaining[1], 0.0);

        timers.update(&pads, SECONDS_PER_TICK);
        let remaining = timers.remaining();
        assert!((remaining[0] - (SMALL_BOOST_RESPAWN_TIME - SECONDS_PER_TICK)).abs() < EPS);
        assert!((remaining[3] - (BIG_BOOST_RESPAWN_TIME - SECONDS_PER_TICK)).abs() < EPS);

        pads[3] = true;
        timers.update(&pads, SECONDS_PER_TICK);
        assert_eq!(timers.remaining()[3], 0.0);
    }

    #[test]
    fn test_seconds_per_row() {
        assert_eq!(seconds_per_row(120), 1.0);
        assert!((seconds_per_row(8) - 8.0 / 120.0).abs() < EPS);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: demo countdown stays within [0, DEMO_RESPAWN_TIME].
            #[test]
            fn prop_demo_timer_bounded(
                flags in prop::collection::vec(any::<bool>(), 1..64),
                tick_skip in 1u32..32
            ) {
                let dt = seconds_per_row(tick_skip);
                let mut timer = DemoTimer::start(flags[0]);
                for &flag in &flags[1..] {
                    let t = timer.update(flag, dt);
                    prop_assert!((0.0..=DEMO_RESPAWN_TIME).contains(&t));
                    if !flag {
                        prop_assert_eq!(t, 0.0);
                    }
                }
            }

            /// Property: pad countdown stays within [0, size duration].
            #[test]
            fn prop_pad_timer_bounded(
                flags in prop::collection::vec(any::<bool>(), 1..64),
                slot in 0usize..BOOST_PAD_COUNT
            ) {
                let size = PadSize::of_slot(slot);
                let mut timer = PadTimer::start(size, flags[0]);
                for &flag in &flags[1..] {
                    let t = timer.update(flag, SECONDS_PER_TICK);
                    prop_assert!(t >= 0.0 && t <= size.respawn_time());
                    if flag {
                        prop_assert_eq!(t, 0.0);
                    }
                }
            }
        }
    }
}
