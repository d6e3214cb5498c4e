//! Per-step liveness for the display layer.
//!
//! More than one source can light the same step (two pointers on one key,
//! a key plus a latch), so each step carries a reference count. When the
//! count falls to zero the step does not vanish: it gets a fade record
//! the display can animate, timed from the stop call rather than from the
//! generator's actual tail.
//!
//! All methods take the current time as a parameter instead of reading a
//! clock, so tests drive the tracker with fabricated instants and the
//! revive-during-fade race is checked without sleeping.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Visual fades never resolve faster than this, however short the audio
/// release is set.
pub const MIN_VISUAL_FADE_SECS: f32 = 0.25;

/// Map an audio release time to a visual fade duration.
pub fn visual_fade(release_secs: f32) -> Duration {
    Duration::from_secs_f32(release_secs.max(MIN_VISUAL_FADE_SECS))
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    started_at: Instant,
    duration: Duration,
}

impl Fade {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.started_at) >= self.duration
    }
}

/// Count and fade state of one step. The fade exists only while the
/// count is zero; the two are mutually exclusive.
#[derive(Debug, Default)]
struct Entry {
    count: u32,
    fade: Option<Fade>,
}

/// What the display layer gets per query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Liveness {
    /// At least one source is sounding this step right now.
    pub alive: bool,
    /// Fraction of the visual fade elapsed, in [0, 1), while a fade is
    /// pending. `None` when alive or fully dark.
    pub fade_elapsed: Option<f32>,
}

impl Liveness {
    const DARK: Liveness = Liveness {
        alive: false,
        fade_elapsed: None,
    };

    /// Anything worth drawing brighter than the idle key color.
    pub fn lit(&self) -> bool {
        self.alive || self.fade_elapsed.is_some()
    }
}

#[derive(Debug, Default)]
pub struct LivenessTracker {
    steps: HashMap<i32, Entry>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source began sounding `step`. Cancels any pending fade: a
    /// fresh press revives a fading key instantly, with no flicker.
    pub fn increment(&mut self, step: i32) {
        let entry = self.steps.entry(step).or_default();
        entry.count += 1;
        entry.fade = None;
    }

    /// A source stopped sounding `step`. On the 1→0 transition a fade
    /// record is created, sized from the configured audio release. The
    /// count never goes below zero, however unbalanced the events.
    pub fn decrement(&mut self, step: i32, now: Instant, release_secs: f32) {
        let Some(entry) = self.steps.get_mut(&step) else {
            return;
        };
        entry.count = entry.count.saturating_sub(1);
        if entry.count == 0 && entry.fade.is_none() {
            entry.fade = Some(Fade {
                started_at: now,
                duration: visual_fade(release_secs),
            });
        }
    }

    /// Non-blocking view of one step, consumed once per redraw.
    pub fn query(&self, step: i32, now: Instant) -> Liveness {
        let Some(entry) = self.steps.get(&step) else {
            return Liveness::DARK;
        };
        if entry.count > 0 {
            return Liveness {
                alive: true,
                fade_elapsed: None,
            };
        }
        match entry.fade {
            Some(fade) if !fade.expired(now) => {
                let elapsed = now.duration_since(fade.started_at).as_secs_f32();
                Liveness {
                    alive: false,
                    fade_elapsed: Some(elapsed / fade.duration.as_secs_f32()),
                }
            }
            _ => Liveness::DARK,
        }
    }

    /// Drop entries whose fade has run out. Expired fades already read
    /// as dark; this just keeps the map from accumulating dead steps
    /// over a long session.
    pub fn prune(&mut self, now: Instant) {
        self.steps
            .retain(|_, entry| entry.count > 0 || entry.fade.is_some_and(|f| !f.expired(now)));
    }

    /// Number of steps currently sounding (not counting fades).
    pub fn alive_count(&self) -> usize {
        self.steps.values().filter(|e| e.count > 0).count()
    }

    /// Steps currently sounding, in no particular order.
    pub fn alive_steps(&self) -> impl Iterator<Item = i32> + '_ {
        self.steps
            .iter()
            .filter(|(_, entry)| entry.count > 0)
            .map(|(&step, _)| step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    fn after(start: Instant, secs: f32) -> Instant {
        start + Duration::from_secs_f32(secs)
    }

    #[test]
    fn refcount_keeps_step_alive_until_last_source_leaves() {
        let mut tracker = LivenessTracker::new();
        let t = t0();

        tracker.increment(5);
        tracker.increment(5);
        tracker.decrement(5, t, 0.3);

        let state = tracker.query(5, t);
        assert!(state.alive, "one source still holds step 5");
        assert_eq!(state.fade_elapsed, None);

        tracker.decrement(5, t, 0.3);
        let state = tracker.query(5, t);
        assert!(!state.alive);
        assert!(state.fade_elapsed.is_some(), "last release starts a fade");
    }

    #[test]
    fn fade_reports_elapsed_fraction_and_expires() {
        let mut tracker = LivenessTracker::new();
        let t = t0();

        tracker.increment(7);
        tracker.decrement(7, t, 1.0);

        let mid = tracker.query(7, after(t, 0.5));
        let frac = mid.fade_elapsed.expect("fade pending at half time");
        assert!((frac - 0.5).abs() < 0.01, "expected ~0.5, got {frac}");

        let done = tracker.query(7, after(t, 1.1));
        assert_eq!(done, Liveness::DARK);
    }

    #[test]
    fn revive_during_fade_cancels_it() {
        let mut tracker = LivenessTracker::new();
        let t = t0();

        tracker.increment(7);
        tracker.decrement(7, t, 1.0);
        tracker.increment(7);

        let state = tracker.query(7, after(t, 0.1));
        assert!(state.alive);
        assert_eq!(state.fade_elapsed, None, "revive must clear the fade");

        // And the old fade's deadline passing changes nothing.
        let state = tracker.query(7, after(t, 2.0));
        assert!(state.alive);
    }

    #[test]
    fn short_releases_are_floored_visually() {
        let mut tracker = LivenessTracker::new();
        let t = t0();

        tracker.increment(3);
        tracker.decrement(3, t, 0.001);

        // Well past the audio release but inside the visual floor.
        let state = tracker.query(3, after(t, MIN_VISUAL_FADE_SECS * 0.5));
        assert!(state.fade_elapsed.is_some());
    }

    #[test]
    fn unbalanced_decrement_is_harmless() {
        let mut tracker = LivenessTracker::new();
        let t = t0();

        tracker.decrement(9, t, 0.3);
        assert_eq!(tracker.query(9, t), Liveness::DARK);

        tracker.increment(9);
        tracker.decrement(9, t, 0.3);
        tracker.decrement(9, t, 0.3);
        tracker.increment(9);
        assert!(tracker.query(9, t).alive, "count must never go negative");
    }

    #[test]
    fn prune_drops_only_expired_entries() {
        let mut tracker = LivenessTracker::new();
        let t = t0();

        tracker.increment(1);
        tracker.increment(2);
        tracker.decrement(2, t, 0.3);

        tracker.prune(after(t, 10.0));
        assert!(tracker.query(1, after(t, 10.0)).alive);
        assert_eq!(tracker.alive_count(), 1);
    }
}
