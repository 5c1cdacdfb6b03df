use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::info;
use tokio::{
    sync::{mpsc, oneshot},
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    constants::{
        time::{OVERLAY_GRACE_SECS, OVERLAY_SETTLE_SECS, SECONDS_PER_MINUTE, TICK_INTERVAL_MS},
        DEBUG_ENV,
    },
    control::{ControlMessage, Notifier, TimerUpdate},
    overlay::{OverlayPresenter, Presentation},
    reminder::{RandomSource, ReminderClock, ReminderKind},
    settings::{Configuration, ConfigurationPatch, SettingsStore},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

pub type ControlReceiver = mpsc::UnboundedReceiver<ControlMessage>;

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub seconds_per_minute: u32,
    pub settle_secs: u32,
    pub grace_secs: u32,
    pub tick_interval: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            seconds_per_minute: SECONDS_PER_MINUTE,
            settle_secs: OVERLAY_SETTLE_SECS,
            grace_secs: OVERLAY_GRACE_SECS,
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }
}

impl ServiceOptions {
    /// `LOOKAWAY_DEBUG=1` turns configured minutes into seconds.
    pub fn from_env() -> Self {
        let debug_mode = std::env::var(DEBUG_ENV)
            .map(|value| debug_enabled(&value))
            .unwrap_or(false);

        Self {
            seconds_per_minute: if debug_mode { 1 } else { SECONDS_PER_MINUTE },
            ..Self::default()
        }
    }
}

/// Accepts `1` or `true` (any case), ignoring surrounding whitespace.
fn debug_enabled(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Owns every piece of mutable scheduler state. All mutation goes through
/// [`ReminderService::tick`] and [`ReminderService::handle`], which the run loop
/// serializes.
pub struct ReminderService<N: Notifier> {
    clock: ReminderClock,
    presenter: OverlayPresenter,
    store: SettingsStore,
    notifier: N,
    rng: Box<dyn RandomSource>,
}

impl<N: Notifier> ReminderService<N> {
    pub fn new(
        store: SettingsStore,
        notifier: N,
        rng: Box<dyn RandomSource>,
        options: &ServiceOptions,
    ) -> Self {
        let config = store.load();
        info!(
            "Reminders: eye rest every {}m, posture every {}m, work breaks {}",
            config.eye_rest_interval_min,
            config.posture_interval_min,
            if config.work_interval_min > 0 {
                format!("every {}m", config.work_interval_min)
            } else {
                "off".to_string()
            }
        );

        Self {
            clock: ReminderClock::with_minute_length(config, options.seconds_per_minute),
            presenter: OverlayPresenter::new(options.settle_secs, options.grace_secs),
            store,
            notifier,
            rng,
        }
    }

    pub fn config(&self) -> &Configuration {
        self.clock.config()
    }

    pub fn snapshot(&self) -> TimerUpdate {
        TimerUpdate {
            eye_sec: self.clock.countdown(ReminderKind::EyeRest),
            posture_sec: self.clock.countdown(ReminderKind::Posture),
            work_sec: self.clock.countdown(ReminderKind::WorkBreak),
            work_enabled: self.clock.is_enabled(ReminderKind::WorkBreak),
            running: self.clock.is_running(),
            overlay_active: self.presenter.active().map(|request| request.kind),
            overlays_queued: self.presenter.queued(),
        }
    }

    /// One scheduler second. The clock is suspended while any overlay is showing
    /// or waiting, so overlay time never counts toward the next interval.
    pub fn tick(&mut self) {
        if self.presenter.advance(&self.notifier).is_some() {
            self.chime();
        }

        if self.presenter.is_idle() {
            for request in self.clock.tick(self.rng.as_mut()) {
                log_info!("{} reminder due", request.kind.label());
                match self.presenter.present(request, &self.notifier) {
                    Presentation::Shown(_) => self.chime(),
                    Presentation::Queued { position } => {
                        log_debug!("Reminder waits at queue position {position}")
                    }
                    Presentation::Dropped => {}
                }
            }
        }

        self.publish();
    }

    pub fn handle(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::SaveSettings { patch, reply } => {
                let saved = self.save_settings(&patch);
                if let Err(err) = self.notifier.settings_saved(saved) {
                    log_warn!("Failed to report settings result: {err:#}");
                }
                let _ = reply.send(saved);
            }
            ControlMessage::ToggleTimer => self.set_running(!self.clock.is_running()),
            ControlMessage::SetRunning(running) => self.set_running(running),
            ControlMessage::ResetTimers => {
                self.clock.reset();
                log_info!("Timers reset");
            }
            ControlMessage::CloseOverlay => {
                self.presenter.dismiss(&self.notifier);
            }
            ControlMessage::OverlayClosed(id) => {
                self.presenter.on_dismissed(id);
            }
            ControlMessage::OverlayStarted(id) => {
                self.presenter.on_started(id);
                return;
            }
            ControlMessage::GetSnapshot(reply) => {
                let _ = reply.send(self.snapshot());
                return;
            }
            ControlMessage::GetSettings(reply) => {
                let _ = reply.send(self.config().clone());
                return;
            }
        }

        self.publish();
    }

    /// Drives the service until `cancel` fires or every [`ServiceHandle`] is dropped.
    pub async fn run(
        mut self,
        mut rx: ControlReceiver,
        cancel: CancellationToken,
        tick_interval: Duration,
    ) {
        let mut ticker = time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;
        self.publish();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Reminder service shutting down");
                    break;
                }
                _ = ticker.tick() => self.tick(),
                message = rx.recv() => match message {
                    Some(message) => self.handle(message),
                    None => {
                        info!("Control channel closed; reminder service stopping");
                        break;
                    }
                },
            }
        }
    }

    fn set_running(&mut self, running: bool) {
        self.clock.set_running(running);
        log_info!("Reminders {}", if running { "resumed" } else { "paused" });
    }

    /// Validates, persists, then applies. Memory only changes once the file does.
    fn save_settings(&mut self, patch: &ConfigurationPatch) -> bool {
        let next = match self.config().merged(patch) {
            Ok(next) => next,
            Err(err) => {
                log_warn!("Rejected settings update: {err:#}");
                return false;
            }
        };

        if let Err(err) = self.store.save(&next) {
            log_error!("Failed to persist settings: {err:#}");
            return false;
        }

        log_info!("Settings saved to {}", self.store.path().display());
        self.clock.apply_configuration(next);
        let clock = &self.clock;
        self.presenter.discard_queued(|kind| clock.is_enabled(kind));
        true
    }

    fn chime(&self) {
        if self.config().sound_enabled {
            self.notifier.chime();
        }
    }

    fn publish(&self) {
        if let Err(err) = self.notifier.timer_update(&self.snapshot()) {
            log_warn!("Failed to publish timer update: {err:#}");
        }
    }
}

/// Cloneable sender side of the control channel, handed to commands, the tray and
/// window event handlers.
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl ServiceHandle {
    pub fn channel() -> (Self, ControlReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, message: ControlMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| anyhow!("reminder service is not running"))
    }

    pub fn toggle_timer(&self) -> Result<()> {
        self.send(ControlMessage::ToggleTimer)
    }

    pub fn set_running(&self, running: bool) -> Result<()> {
        self.send(ControlMessage::SetRunning(running))
    }

    pub fn reset_timers(&self) -> Result<()> {
        self.send(ControlMessage::ResetTimers)
    }

    pub fn close_overlay(&self) -> Result<()> {
        self.send(ControlMessage::CloseOverlay)
    }

    pub fn overlay_closed(&self, id: Uuid) -> Result<()> {
        self.send(ControlMessage::OverlayClosed(id))
    }

    pub fn overlay_started(&self, id: Uuid) -> Result<()> {
        self.send(ControlMessage::OverlayStarted(id))
    }

    pub async fn save_settings(&self, patch: ConfigurationPatch) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlMessage::SaveSettings { patch, reply })?;
        rx.await.context("reminder service dropped the settings reply")
    }

    pub async fn snapshot(&self) -> Result<TimerUpdate> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlMessage::GetSnapshot(reply))?;
        rx.await.context("reminder service dropped the snapshot reply")
    }

    pub async fn settings(&self) -> Result<Configuration> {
        let (reply, rx) = oneshot::channel();
        self.send(ControlMessage::GetSettings(reply))?;
        rx.await.context("reminder service dropped the settings reply")
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::testing::{FixedRandom, Notification, RecordingNotifier};

    fn options() -> ServiceOptions {
        ServiceOptions {
            settle_secs: 2,
            ..ServiceOptions::default()
        }
    }

    fn service_with(
        dir: &TempDir,
        config: Configuration,
    ) -> (ReminderService<RecordingNotifier>, RecordingNotifier) {
        let store = SettingsStore::new(dir.path().join("settings.json"));
        store.save(&config).unwrap();
        let notifier = RecordingNotifier::new();
        let service = ReminderService::new(
            store,
            notifier.clone(),
            Box::new(FixedRandom::new(90)),
            &options(),
        );
        (service, notifier)
    }

    fn ticks(service: &mut ReminderService<RecordingNotifier>, n: u32) {
        for _ in 0..n {
            service.tick();
        }
    }

    fn one_minute_eye_and_posture() -> Configuration {
        Configuration {
            eye_rest_interval_min: 1,
            posture_interval_min: 1,
            ..Configuration::default()
        }
    }

    #[test]
    fn starts_from_persisted_configuration() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service_with(
            &dir,
            Configuration {
                eye_rest_interval_min: 20,
                ..Configuration::default()
            },
        );

        assert_eq!(service.snapshot().eye_sec, 1200);
        assert_eq!(service.config().eye_rest_interval_min, 20);
    }

    #[test]
    fn every_tick_publishes_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(&dir, Configuration::default());

        ticks(&mut service, 3);

        let update = notifier.last_update().unwrap();
        assert_eq!(update.eye_sec, 3597);
        assert_eq!(update.posture_sec, 597);
        assert!(update.running);
        assert!(!update.work_enabled);
    }

    #[test]
    fn simultaneous_reminders_show_one_at_a_time_in_priority_order() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(&dir, one_minute_eye_and_posture());

        ticks(&mut service, 60);

        let presented = notifier.presented();
        assert_eq!(presented.len(), 1);
        assert_eq!(presented[0].kind, ReminderKind::EyeRest);
        let snapshot = service.snapshot();
        assert_eq!(snapshot.overlay_active, Some(ReminderKind::EyeRest));
        assert_eq!(snapshot.overlays_queued, 1);

        // Clock is suspended while the overlays are pending.
        ticks(&mut service, 10);
        assert_eq!(service.snapshot().eye_sec, 60);

        service.handle(ControlMessage::OverlayClosed(presented[0].id));
        assert_eq!(service.snapshot().overlay_active, None);
        ticks(&mut service, 1);
        assert_eq!(notifier.presented().len(), 1);
        ticks(&mut service, 1);

        let presented = notifier.presented();
        assert_eq!(presented.len(), 2);
        assert_eq!(presented[1].kind, ReminderKind::Posture);
        assert_eq!(service.snapshot().overlay_active, Some(ReminderKind::Posture));
        assert_eq!(service.snapshot().posture_sec, 60);

        service.handle(ControlMessage::OverlayClosed(presented[1].id));
        ticks(&mut service, 1);
        assert_eq!(service.snapshot().eye_sec, 59);
        assert_eq!(notifier.count(&Notification::Chime), 2);
    }

    #[test]
    fn muted_configuration_skips_the_chime() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(
            &dir,
            Configuration {
                eye_rest_interval_min: 1,
                sound_enabled: false,
                ..Configuration::default()
            },
        );

        ticks(&mut service, 60);

        assert_eq!(notifier.presented().len(), 1);
        assert_eq!(notifier.count(&Notification::Chime), 0);
    }

    #[test]
    fn work_break_uses_sampled_duration() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(
            &dir,
            Configuration {
                work_interval_min: 1,
                ..Configuration::default()
            },
        );

        ticks(&mut service, 60);

        let presented = notifier.presented();
        assert_eq!(presented[0].kind, ReminderKind::WorkBreak);
        assert_eq!(presented[0].duration_sec, 90);
    }

    #[test]
    fn close_overlay_dismisses_and_resumes_the_clock() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(
            &dir,
            Configuration {
                eye_rest_interval_min: 1,
                ..Configuration::default()
            },
        );
        ticks(&mut service, 60);
        let eye = notifier.presented()[0].clone();

        service.handle(ControlMessage::CloseOverlay);
        service.handle(ControlMessage::CloseOverlay);
        // The window's own close event arrives afterwards and is ignored.
        service.handle(ControlMessage::OverlayClosed(eye.id));
        ticks(&mut service, 1);

        assert_eq!(notifier.closed(), vec![eye.id]);
        assert_eq!(service.snapshot().overlay_active, None);
        assert_eq!(service.snapshot().eye_sec, 59);
    }

    #[test]
    fn toggle_pauses_and_resumes_without_losing_progress() {
        let dir = TempDir::new().unwrap();
        let (mut service, _) = service_with(&dir, Configuration::default());
        ticks(&mut service, 5);

        service.handle(ControlMessage::ToggleTimer);
        ticks(&mut service, 100);
        let paused = service.snapshot();
        assert!(!paused.running);
        assert_eq!(paused.eye_sec, 3595);
        assert_eq!(paused.posture_sec, 595);

        service.handle(ControlMessage::ToggleTimer);
        ticks(&mut service, 1);
        assert_eq!(service.snapshot().eye_sec, 3594);
    }

    #[test]
    fn set_running_is_absolute() {
        let dir = TempDir::new().unwrap();
        let (mut service, _) = service_with(&dir, Configuration::default());

        service.handle(ControlMessage::SetRunning(false));
        service.handle(ControlMessage::SetRunning(false));

        assert!(!service.snapshot().running);
    }

    #[test]
    fn reset_restores_full_intervals() {
        let dir = TempDir::new().unwrap();
        let (mut service, _) = service_with(&dir, Configuration::default());
        ticks(&mut service, 42);

        service.handle(ControlMessage::ResetTimers);

        assert_eq!(service.snapshot().eye_sec, 3600);
        assert_eq!(service.snapshot().posture_sec, 600);
    }

    #[test]
    fn valid_settings_are_persisted_and_applied() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(&dir, Configuration::default());
        ticks(&mut service, 10);
        let (reply, mut rx) = oneshot::channel();

        service.handle(ControlMessage::SaveSettings {
            patch: ConfigurationPatch {
                posture_interval_min: Some(15),
                work_interval_min: Some(50),
                ..Default::default()
            },
            reply,
        });

        assert!(rx.try_recv().unwrap());
        assert_eq!(notifier.count(&Notification::SettingsSaved(true)), 1);
        let snapshot = service.snapshot();
        assert_eq!(snapshot.eye_sec, 3600);
        assert_eq!(snapshot.posture_sec, 900);
        assert_eq!(snapshot.work_sec, 3000);
        assert!(snapshot.work_enabled);

        let reloaded = SettingsStore::new(dir.path().join("settings.json")).load();
        assert_eq!(reloaded.posture_interval_min, 15);
        assert_eq!(reloaded.work_interval_min, 50);
    }

    #[test]
    fn invalid_settings_are_rejected_before_mutation() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(&dir, Configuration::default());
        ticks(&mut service, 10);
        let (reply, mut rx) = oneshot::channel();

        service.handle(ControlMessage::SaveSettings {
            patch: ConfigurationPatch {
                work_break_min_sec: Some(600),
                work_break_max_sec: Some(60),
                ..Default::default()
            },
            reply,
        });

        assert!(!rx.try_recv().unwrap());
        assert_eq!(notifier.count(&Notification::SettingsSaved(false)), 1);
        assert_eq!(service.snapshot().eye_sec, 3590);
        assert_eq!(service.config(), &Configuration::default());
    }

    #[test]
    fn failed_persist_leaves_configuration_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let store = SettingsStore::new(blocker.join("settings.json"));
        let notifier = RecordingNotifier::new();
        let mut service = ReminderService::new(
            store,
            notifier.clone(),
            Box::new(FixedRandom::new(90)),
            &options(),
        );
        let (reply, mut rx) = oneshot::channel();

        service.handle(ControlMessage::SaveSettings {
            patch: ConfigurationPatch {
                eye_rest_interval_min: Some(5),
                ..Default::default()
            },
            reply,
        });

        assert!(!rx.try_recv().unwrap());
        assert_eq!(service.config().eye_rest_interval_min, 60);

        // The scheduler keeps ticking after the failure.
        service.tick();
        assert_eq!(service.snapshot().eye_sec, 3599);
    }

    #[test]
    fn disabling_work_breaks_drops_a_queued_work_break() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(
            &dir,
            Configuration {
                eye_rest_interval_min: 1,
                work_interval_min: 1,
                ..Configuration::default()
            },
        );
        ticks(&mut service, 60);
        let eye = notifier.presented()[0].clone();
        assert_eq!(service.snapshot().overlays_queued, 1);
        let (reply, mut rx) = oneshot::channel();

        service.handle(ControlMessage::SaveSettings {
            patch: ConfigurationPatch {
                work_interval_min: Some(0),
                ..Default::default()
            },
            reply,
        });
        assert!(rx.try_recv().unwrap());
        service.handle(ControlMessage::OverlayClosed(eye.id));
        ticks(&mut service, 3);

        let kinds: Vec<_> = notifier.presented().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![ReminderKind::EyeRest]);
        let snapshot = service.snapshot();
        assert!(!snapshot.work_enabled);
        assert_eq!(snapshot.overlays_queued, 0);
        assert_eq!(snapshot.eye_sec, 57);
    }

    #[test]
    fn countdown_start_extends_the_watchdog_window() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(
            &dir,
            Configuration {
                eye_rest_interval_min: 1,
                ..Configuration::default()
            },
        );
        ticks(&mut service, 60);
        let eye = notifier.presented()[0].clone();

        ticks(&mut service, 20);
        service.handle(ControlMessage::OverlayStarted(eye.id));
        ticks(&mut service, 35);
        assert_eq!(service.snapshot().overlay_active, Some(ReminderKind::EyeRest));

        ticks(&mut service, 1);
        assert_eq!(service.snapshot().overlay_active, None);
        assert_eq!(notifier.closed(), vec![eye.id]);
    }

    #[test]
    fn debug_flag_accepts_one_or_true() {
        assert!(debug_enabled("1"));
        assert!(debug_enabled("true"));
        assert!(debug_enabled("TRUE"));
        assert!(debug_enabled(" 1\n"));
        assert!(!debug_enabled(""));
        assert!(!debug_enabled("0"));
        assert!(!debug_enabled("yes"));
        assert!(!debug_enabled("false"));
    }

    #[test]
    fn queries_do_not_publish() {
        let dir = TempDir::new().unwrap();
        let (mut service, notifier) = service_with(&dir, Configuration::default());
        let (reply, mut rx) = oneshot::channel();

        service.handle(ControlMessage::GetSettings(reply));

        assert_eq!(rx.try_recv().unwrap(), Configuration::default());
        assert!(notifier.take().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_ticks_and_serves_the_control_channel() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service_with(&dir, Configuration::default());
        let (handle, rx) = ServiceHandle::channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(service.run(rx, cancel.clone(), Duration::from_secs(1)));

        time::sleep(Duration::from_millis(5_500)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.eye_sec, 3595);

        handle.toggle_timer().unwrap();
        time::sleep(Duration::from_secs(10)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert!(!snapshot.running);
        assert_eq!(snapshot.eye_sec, 3595);

        assert!(handle
            .save_settings(ConfigurationPatch {
                eye_rest_interval_min: Some(30),
                ..Default::default()
            })
            .await
            .unwrap());
        assert_eq!(handle.settings().await.unwrap().eye_rest_interval_min, 30);

        cancel.cancel();
        task.await.unwrap();
        assert!(handle.toggle_timer().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_stops_when_every_handle_is_dropped() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service_with(&dir, Configuration::default());
        let (handle, rx) = ServiceHandle::channel();
        let task = tokio::spawn(service.run(rx, CancellationToken::new(), Duration::from_secs(1)));

        drop(handle);

        task.await.unwrap();
    }
}
