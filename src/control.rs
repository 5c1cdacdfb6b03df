//! Message contract between the reminder service and the surfaces around it
//! (settings window, overlays, tray).
//!
//! Inbound traffic is a [`ControlMessage`] on an mpsc channel; outbound traffic goes
//! through the [`Notifier`] capability so the service never touches a window directly.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::{
    reminder::{OverlayRequest, ReminderKind},
    settings::{Configuration, ConfigurationPatch},
};

/// State snapshot mirrored to every surface once per tick (`timer-update`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerUpdate {
    pub eye_sec: u32,
    pub posture_sec: u32,
    pub work_sec: u32,
    pub work_enabled: bool,
    pub running: bool,
    pub overlay_active: Option<ReminderKind>,
    pub overlays_queued: usize,
}

impl TimerUpdate {
    pub fn countdown(&self, kind: ReminderKind) -> u32 {
        match kind {
            ReminderKind::EyeRest => self.eye_sec,
            ReminderKind::Posture => self.posture_sec,
            ReminderKind::WorkBreak => self.work_sec,
        }
    }

    pub fn is_enabled(&self, kind: ReminderKind) -> bool {
        kind != ReminderKind::WorkBreak || self.work_enabled
    }
}

#[derive(Debug)]
pub enum ControlMessage {
    /// Settings surface -> core. Replies whether the patch was validated and persisted.
    SaveSettings {
        patch: ConfigurationPatch,
        reply: oneshot::Sender<bool>,
    },
    ToggleTimer,
    SetRunning(bool),
    ResetTimers,
    /// Explicit early dismissal of whatever overlay is showing.
    CloseOverlay,
    /// An overlay surface went away (timeout, user close, crash).
    OverlayClosed(Uuid),
    /// An overlay page finished loading and began its countdown.
    OverlayStarted(Uuid),
    GetSnapshot(oneshot::Sender<TimerUpdate>),
    GetSettings(oneshot::Sender<Configuration>),
}

/// Outbound capability. Implementations must not block on the rendering surface;
/// errors are logged by the caller and never stop the scheduler.
pub trait Notifier: Send + 'static {
    /// Open the fullscreen view for `request` and start its countdown.
    fn present_overlay(&self, request: &OverlayRequest) -> Result<()>;

    /// Close the overlay surface for `id` if it still exists.
    fn close_overlay(&self, id: Uuid) -> Result<()>;

    fn timer_update(&self, update: &TimerUpdate) -> Result<()>;

    fn settings_saved(&self, saved: bool) -> Result<()>;

    /// Audible cue when an overlay opens.
    fn chime(&self);
}
