use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::Configuration;

use super::{RandomSource, ReminderKind};

/// Produced when a reminder kind fires; consumed by the overlay presenter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRequest {
    pub id: Uuid,
    pub kind: ReminderKind,
    pub duration_sec: u32,
    pub requested_at: DateTime<Utc>,
}

impl OverlayRequest {
    pub fn new(kind: ReminderKind, duration_sec: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            duration_sec,
            requested_at: Utc::now(),
        }
    }
}

/// Per-kind countdowns plus the pause flag. Advanced by [`ReminderClock::tick`];
/// the caller decides whether a tick is admitted (overlay presentation suspends it).
#[derive(Debug, Clone)]
pub struct ReminderClock {
    config: Configuration,
    countdowns: [u32; 3],
    running: bool,
    /// 60 in production; `LOOKAWAY_DEBUG` shrinks a configured minute to one second.
    seconds_per_minute: u32,
}

impl ReminderClock {
    pub fn with_minute_length(config: Configuration, seconds_per_minute: u32) -> Self {
        let mut clock = Self {
            config,
            countdowns: [0; 3],
            running: true,
            seconds_per_minute: seconds_per_minute.max(1),
        };
        clock.reset();
        if clock.is_enabled(ReminderKind::Posture) {
            let posture = &mut clock.countdowns[ReminderKind::Posture.index()];
            *posture = posture.saturating_add(clock.config.posture_stagger_sec);
        }
        clock
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn countdown(&self, kind: ReminderKind) -> u32 {
        self.countdowns[kind.index()]
    }

    pub fn is_enabled(&self, kind: ReminderKind) -> bool {
        self.interval_min(kind) > 0
    }

    /// Full countdown for `kind` in seconds; 0 when disabled.
    pub fn interval_secs(&self, kind: ReminderKind) -> u32 {
        self.interval_min(kind).saturating_mul(self.seconds_per_minute)
    }

    fn interval_min(&self, kind: ReminderKind) -> u32 {
        match kind {
            ReminderKind::EyeRest => self.config.eye_rest_interval_min,
            ReminderKind::Posture => self.config.posture_interval_min,
            ReminderKind::WorkBreak => self.config.work_interval_min,
        }
    }

    /// Advances every enabled countdown by one second and returns the requests for the
    /// kinds that expired, in priority order. A paused clock returns nothing.
    pub fn tick(&mut self, rng: &mut dyn RandomSource) -> Vec<OverlayRequest> {
        if !self.running {
            return Vec::new();
        }

        let mut fired = Vec::new();
        for kind in ReminderKind::ALL {
            if !self.is_enabled(kind) {
                continue;
            }
            let full = self.interval_secs(kind);
            let countdown = &mut self.countdowns[kind.index()];
            *countdown = countdown.saturating_sub(1);
            if *countdown == 0 {
                *countdown = full;
                fired.push(OverlayRequest::new(kind, self.duration_for(kind, rng)));
            }
        }
        fired
    }

    /// Overlay duration for `kind`; work breaks are sampled at fire time.
    fn duration_for(&self, kind: ReminderKind, rng: &mut dyn RandomSource) -> u32 {
        match kind {
            ReminderKind::EyeRest => self.config.eye_rest_duration_sec,
            ReminderKind::Posture => self.config.posture_duration_sec,
            ReminderKind::WorkBreak => {
                let (min, max) = (
                    self.config.work_break_min_sec,
                    self.config.work_break_max_sec,
                );
                rng.uniform(min, max).clamp(min, max.max(min))
            }
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Discards elapsed progress. Disabled kinds sit at 0.
    pub fn reset(&mut self) {
        for kind in ReminderKind::ALL {
            self.countdowns[kind.index()] = self.interval_secs(kind);
        }
    }

    /// Swaps in a validated configuration and restarts every countdown from it.
    /// The posture stagger only applies at construction.
    pub fn apply_configuration(&mut self, config: Configuration) {
        self.config = config;
        self.reset();
    }
}
