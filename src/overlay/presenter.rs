use std::collections::VecDeque;

use chrono::Utc;
use uuid::Uuid;

use crate::constants::time::{OVERLAY_GRACE_SECS, OVERLAY_SETTLE_SECS};
use crate::control::Notifier;
use crate::reminder::{OverlayRequest, ReminderKind};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// The surface opened the overlay; it is now the active one.
    Shown(OverlayRequest),
    /// Another overlay is active or pending; this one waits at `position` (1-based).
    Queued { position: usize },
    /// The surface could not open the overlay. Nothing became active.
    Dropped,
}

#[derive(Debug)]
struct ActiveOverlay {
    request: OverlayRequest,
    /// Ticks since the overlay opened, or since its countdown started once the
    /// page reports it. Compared against `duration_sec + grace_secs`.
    elapsed_secs: u32,
}

/// Single-active-overlay gate with FIFO queuing.
///
/// Requests arriving while an overlay is showing, or while earlier requests still wait,
/// are queued. After a dismissal the next request is shown once `settle_secs` ticks pass.
#[derive(Debug)]
pub struct OverlayPresenter {
    active: Option<ActiveOverlay>,
    queue: VecDeque<OverlayRequest>,
    settle_remaining: u32,
    settle_secs: u32,
    grace_secs: u32,
}

impl Default for OverlayPresenter {
    fn default() -> Self {
        Self::new(OVERLAY_SETTLE_SECS, OVERLAY_GRACE_SECS)
    }
}

impl OverlayPresenter {
    pub fn new(settle_secs: u32, grace_secs: u32) -> Self {
        Self {
            active: None,
            queue: VecDeque::new(),
            settle_remaining: 0,
            settle_secs,
            grace_secs,
        }
    }

    pub fn active(&self) -> Option<&OverlayRequest> {
        self.active.as_ref().map(|active| &active.request)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// No overlay showing and none waiting. The clock only ticks while idle.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn present(&mut self, request: OverlayRequest, notifier: &dyn Notifier) -> Presentation {
        if self.is_idle() {
            return self.show(request, notifier);
        }

        log_info!(
            "Queueing {:?} overlay {} behind {} pending",
            request.kind,
            request.id,
            self.queue.len() + usize::from(self.active.is_some())
        );
        self.queue.push_back(request);
        Presentation::Queued {
            position: self.queue.len(),
        }
    }

    /// Early dismissal requested by the user. No-op when nothing is showing.
    pub fn dismiss(&mut self, notifier: &dyn Notifier) -> Option<OverlayRequest> {
        let active = self.active.take()?;
        if let Err(err) = notifier.close_overlay(active.request.id) {
            log_warn!(
                "Failed to close overlay {}: {err:#}; treating it as dismissed",
                active.request.id
            );
        }
        log_info!("Dismissed {:?} overlay {}", active.request.kind, active.request.id);
        self.arm_settle();
        Some(active.request)
    }

    /// The surface for `id` closed. Stale ids (already dismissed, or replaced) are ignored.
    pub fn on_dismissed(&mut self, id: Uuid) -> bool {
        match &self.active {
            Some(active) if active.request.id == id => {
                log_info!("{:?} overlay {} closed", active.request.kind, id);
                self.active = None;
                self.arm_settle();
                true
            }
            _ => {
                log_debug!("Ignoring close of inactive overlay {}", id);
                false
            }
        }
    }

    /// The page for `id` loaded and started its countdown. Restarts the watchdog so
    /// page load time does not eat into the overlay's duration.
    pub fn on_started(&mut self, id: Uuid) -> bool {
        match &mut self.active {
            Some(active) if active.request.id == id => {
                log_debug!("Overlay {} countdown started after {}s", id, active.elapsed_secs);
                active.elapsed_secs = 0;
                true
            }
            _ => false,
        }
    }

    /// Drops queued requests whose kind `keep` rejects, e.g. after a kind is disabled.
    /// The active overlay is left alone. Returns how many were dropped.
    pub fn discard_queued(&mut self, keep: impl Fn(ReminderKind) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|request| keep(request.kind));
        let dropped = before - self.queue.len();
        if dropped > 0 {
            log_info!("Discarded {} queued overlay(s) for disabled reminders", dropped);
        }
        if self.queue.is_empty() {
            self.settle_remaining = 0;
        }
        dropped
    }

    /// Once per tick: runs the watchdog on the active overlay, or counts down the
    /// settling delay and shows the next queued request. Returns what was shown.
    pub fn advance(&mut self, notifier: &dyn Notifier) -> Option<OverlayRequest> {
        if let Some(active) = &mut self.active {
            active.elapsed_secs = active.elapsed_secs.saturating_add(1);
            let limit = active.request.duration_sec.saturating_add(self.grace_secs);
            if active.elapsed_secs > limit {
                let age = Utc::now() - active.request.requested_at;
                log_warn!(
                    "Overlay {} outlived its {}s duration ({}s since it was requested); closing it",
                    active.request.id,
                    active.request.duration_sec,
                    age.num_seconds()
                );
                self.dismiss(notifier);
            }
            return None;
        }

        if self.queue.is_empty() {
            return None;
        }

        self.settle_remaining = self.settle_remaining.saturating_sub(1);
        if self.settle_remaining > 0 {
            return None;
        }

        while let Some(next) = self.queue.pop_front() {
            if let Presentation::Shown(shown) = self.show(next, notifier) {
                return Some(shown);
            }
        }
        None
    }

    fn show(&mut self, request: OverlayRequest, notifier: &dyn Notifier) -> Presentation {
        match notifier.present_overlay(&request) {
            Ok(()) => {
                log_info!(
                    "Showing {:?} overlay {} for {}s",
                    request.kind,
                    request.id,
                    request.duration_sec
                );
                self.active = Some(ActiveOverlay {
                    request: request.clone(),
                    elapsed_secs: 0,
                });
                Presentation::Shown(request)
            }
            Err(err) => {
                log_error!(
                    "Failed to present {:?} overlay {}: {err:#}",
                    request.kind,
                    request.id
                );
                Presentation::Dropped
            }
        }
    }

    fn arm_settle(&mut self) {
        if !self.queue.is_empty() {
            self.settle_remaining = self.settle_secs;
        }
    }
}
