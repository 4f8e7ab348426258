use std::path::Path;

use agentscope_protocol::CanonicalEvent;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::clock::VirtualClock;
use crate::error::ReplayResult;
use crate::loader::{self, MAX_FILE_SIZE};

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Logs larger than this are rejected without being read.
    pub max_file_size: u64,
    /// Initial playback speed multiplier.
    pub default_speed: f64,
}

impl PlayerConfig {
    pub fn new() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            default_speed: 1.0,
        }
    }

    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn default_speed(mut self, speed: f64) -> Self {
        self.default_speed = speed;
        self
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        1.0
    }
}

#[derive(Debug)]
struct PlaybackState {
    events: Vec<CanonicalEvent>,
    position: usize,
    speed: f64,
    playing: bool,
    /// Set while playing.
    clock: Option<VirtualClock>,
    /// Virtual time captured by the last pause.
    paused_at: Option<DateTime<Utc>>,
    base_time: Option<DateTime<Utc>>,
}

impl PlaybackState {
    fn install(&mut self, events: Vec<CanonicalEvent>) {
        self.base_time = events.first().map(|event| event.ts);
        self.events = events;
        self.position = 0;
        self.playing = false;
        self.clock = None;
        self.paused_at = None;
    }

    /// Clock that maps `now` to the cursor's timestamp.
    fn anchor_at_cursor(&self, now: DateTime<Utc>) -> Option<VirtualClock> {
        self.events
            .get(self.position)
            .map(|event| VirtualClock::new(now, event.ts, self.speed))
    }

    /// While paused, the frozen virtual time tracks the cursor.
    fn sync_paused_time(&mut self) {
        if self.paused_at.is_some() {
            self.paused_at = self.events.get(self.position).map(|event| event.ts);
        }
    }

    fn last_index(&self) -> usize {
        self.events.len().saturating_sub(1)
    }
}

/// Scrubbable playback of a recorded event log against a virtual clock.
///
/// The cursor (`position`) and the virtual clock are separate controls:
/// stepping and seeking move the cursor, while [`Self::events_until`] answers
/// "what should be visible now" from the clock alone and never moves the
/// cursor. Starting playback or seeking while playing re-anchors the clock to
/// the cursor's event.
///
/// Every time-dependent control has an `*_at(now)` form that takes the
/// wall-clock instant explicitly; the plain form passes `Utc::now()`.
#[derive(Debug)]
pub struct ReplayPlayer {
    config: PlayerConfig,
    state: RwLock<PlaybackState>,
}

impl ReplayPlayer {
    pub fn new(config: PlayerConfig) -> Self {
        let speed = sanitize_speed(config.default_speed);
        Self {
            config,
            state: RwLock::new(PlaybackState {
                events: Vec::new(),
                position: 0,
                speed,
                playing: false,
                clock: None,
                paused_at: None,
                base_time: None,
            }),
        }
    }

    /// Replace the loaded log with the contents of a JSONL file.
    ///
    /// On any error the previously loaded log and playback state are left
    /// untouched. Returns the number of events loaded.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load_file(&self, path: impl AsRef<Path>) -> ReplayResult<usize> {
        let mut state = self.state.write();
        let events = match loader::read_event_log(path.as_ref(), self.config.max_file_size) {
            Ok(events) => events,
            Err(error) => {
                warn!(%error, "event log rejected");
                return Err(error);
            }
        };
        let count = events.len();
        state.install(events);
        info!(count, "event log loaded");
        Ok(count)
    }

    /// Replace the loaded log with events already in memory.
    pub fn load_events(&self, mut events: Vec<CanonicalEvent>) -> usize {
        loader::sort_events(&mut events);
        let count = events.len();
        self.state.write().install(events);
        debug!(count, "events loaded");
        count
    }

    pub fn play(&self) {
        self.play_at(Utc::now());
    }

    pub fn play_at(&self, now: DateTime<Utc>) {
        let mut state = self.state.write();
        if state.playing {
            return;
        }
        state.playing = true;
        state.paused_at = None;
        state.clock = state.anchor_at_cursor(now);
        debug!(position = state.position, speed = state.speed, "playback started");
    }

    pub fn pause(&self) {
        self.pause_at(Utc::now());
    }

    pub fn pause_at(&self, now: DateTime<Utc>) {
        let mut state = self.state.write();
        if !state.playing {
            return;
        }
        state.playing = false;
        state.paused_at = state.clock.take().map(|clock| clock.at(now));
        debug!(position = state.position, "playback paused");
    }

    /// Halt playback and rewind the cursor to the first event.
    pub fn stop(&self) {
        let mut state = self.state.write();
        state.playing = false;
        state.clock = None;
        state.paused_at = None;
        state.position = 0;
        debug!("playback stopped");
    }

    /// Non-positive or non-finite multipliers fall back to `1.0`.
    pub fn set_speed(&self, speed: f64) {
        self.set_speed_at(speed, Utc::now());
    }

    pub fn set_speed_at(&self, speed: f64, now: DateTime<Utc>) {
        let speed = sanitize_speed(speed);
        let mut state = self.state.write();
        if state.playing {
            state.clock = state.clock.map(|clock| clock.with_speed(now, speed));
        }
        state.speed = speed;
        debug!(speed, "playback speed changed");
    }

    pub fn step_forward(&self) {
        let mut state = self.state.write();
        if state.position < state.last_index() {
            state.position += 1;
            state.sync_paused_time();
        }
    }

    pub fn step_backward(&self) {
        let mut state = self.state.write();
        state.position = state.position.saturating_sub(1);
        state.sync_paused_time();
    }

    /// Move the cursor, clamped to the loaded range.
    pub fn seek(&self, position: i64) {
        self.seek_at(position, Utc::now());
    }

    pub fn seek_at(&self, position: i64, now: DateTime<Utc>) {
        let mut state = self.state.write();
        let last = i64::try_from(state.last_index()).unwrap_or(i64::MAX);
        state.position = usize::try_from(position.clamp(0, last)).unwrap_or(0);
        if state.playing {
            state.clock = state.anchor_at_cursor(now);
        } else {
            state.sync_paused_time();
        }
        debug!(position = state.position, "seeked");
    }

    /// Every event at or before the current virtual time, in order.
    ///
    /// Empty when not playing or when nothing is loaded.
    pub fn events_until(&self, now: DateTime<Utc>) -> Vec<CanonicalEvent> {
        self.events_until_from(0, now)
    }

    /// [`Self::events_until`] without the first `offset` visible events.
    ///
    /// Lets a tick loop fetch only what became visible since its last tick.
    pub fn events_until_from(&self, offset: usize, now: DateTime<Utc>) -> Vec<CanonicalEvent> {
        let state = self.state.read();
        if !state.playing {
            return Vec::new();
        }
        let Some(clock) = state.clock else {
            return Vec::new();
        };
        let virtual_now = clock.at(now);
        let end = state
            .events
            .partition_point(|event| event.ts <= virtual_now);
        state
            .events
            .get(offset..end)
            .map(<[CanonicalEvent]>::to_vec)
            .unwrap_or_default()
    }

    /// Current virtual time: live while playing, frozen while paused.
    pub fn virtual_time_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let state = self.state.read();
        if state.playing {
            state.clock.map(|clock| clock.at(now))
        } else {
            state.paused_at
        }
    }

    pub fn current_event(&self) -> Option<CanonicalEvent> {
        let state = self.state.read();
        state.events.get(state.position).cloned()
    }

    pub fn position(&self) -> usize {
        self.state.read().position
    }

    pub fn total(&self) -> usize {
        self.state.read().events.len()
    }

    pub fn is_playing(&self) -> bool {
        self.state.read().playing
    }

    pub fn speed(&self) -> f64 {
        self.state.read().speed
    }

    /// Timestamp of the first loaded event.
    pub fn base_time(&self) -> Option<DateTime<Utc>> {
        self.state.read().base_time
    }
}

impl Default for ReplayPlayer {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}
