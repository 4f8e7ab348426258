//! Virtual clock for replay.
//!
//! Virtual time is never stored directly. It is always derived from an
//! anchor triple `(real, virtual, speed)`: at wall-clock instant `now` the
//! virtual time is `virtual + (now - real) * speed`. Changing speed or
//! position re-anchors the triple instead of touching the derived time, so
//! the only discontinuities are the ones a re-anchor asks for.

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualClock {
    anchor_real: DateTime<Utc>,
    anchor_virtual: DateTime<Utc>,
    speed: f64,
}

impl VirtualClock {
    pub fn new(anchor_real: DateTime<Utc>, anchor_virtual: DateTime<Utc>, speed: f64) -> Self {
        Self {
            anchor_real,
            anchor_virtual,
            speed,
        }
    }

    /// Virtual time corresponding to the wall-clock instant `now`.
    pub fn at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let elapsed = scale(now - self.anchor_real, self.speed);
        self.anchor_virtual
            .checked_add_signed(elapsed)
            .unwrap_or(if elapsed < TimeDelta::zero() {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }

    /// Same virtual time at `now`, advancing at `speed` from then on.
    pub fn with_speed(&self, now: DateTime<Utc>, speed: f64) -> Self {
        Self::new(now, self.at(now), speed)
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn anchor_real(&self) -> DateTime<Utc> {
        self.anchor_real
    }

    pub fn anchor_virtual(&self) -> DateTime<Utc> {
        self.anchor_virtual
    }
}

/// Multiply a duration by a floating-point factor at nanosecond precision,
/// falling back to milliseconds for spans too long to count in nanoseconds.
pub(crate) fn scale(delta: TimeDelta, factor: f64) -> TimeDelta {
    match delta.num_nanoseconds() {
        Some(nanos) => TimeDelta::nanoseconds((nanos as f64 * factor).round() as i64),
        None => TimeDelta::milliseconds((delta.num_milliseconds() as f64 * factor).round() as i64),
    }
}
