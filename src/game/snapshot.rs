//! Broadcast gating
//!
//! Steady-state snapshots are throttled to bound bandwidth; discrete events
//! (input, joins, collisions, level-ups) force the next send through.

/// Decides when the tick loop should push a full-state snapshot
#[derive(Debug)]
pub struct BroadcastGate {
    /// Tick counter since last broadcast
    ticks_since_broadcast: u32,
    /// Broadcast interval in ticks
    interval_ticks: u32,
}

impl BroadcastGate {
    pub fn new(interval_ticks: u32) -> Self {
        Self {
            ticks_since_broadcast: 0,
            interval_ticks,
        }
    }

    /// Check if it's time to broadcast; call once per tick
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_broadcast += 1;
        if self.ticks_since_broadcast >= self.interval_ticks {
            self.ticks_since_broadcast = 0;
            true
        } else {
            false
        }
    }

    /// Force a broadcast on the next check (used for discrete events)
    pub fn force_next(&mut self) {
        self.ticks_since_broadcast = self.interval_ticks;
    }

    /// An out-of-band broadcast happened; restart the steady-state cadence
    pub fn reset(&mut self) {
        self.ticks_since_broadcast = 0;
    }
}
