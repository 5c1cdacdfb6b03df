//! Fakes shared by the unit tests.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use uuid::Uuid;

use crate::{
    control::{Notifier, TimerUpdate},
    reminder::{OverlayRequest, RandomSource},
};

/// Always returns the same sample.
pub struct FixedRandom(u32);

impl FixedRandom {
    pub fn new(value: u32) -> Self {
        Self(value)
    }
}

impl RandomSource for FixedRandom {
    fn uniform(&mut self, _min: u32, _max: u32) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Presented(OverlayRequest),
    Closed(Uuid),
    Update(TimerUpdate),
    SettingsSaved(bool),
    Chime,
}

/// Records every outbound call. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    log: Arc<Mutex<Vec<Notification>>>,
    fail_presents: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_presents(&self, fail: bool) {
        *self.fail_presents.lock().unwrap() = fail;
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    pub fn presented(&self) -> Vec<OverlayRequest> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notification::Presented(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> Vec<Uuid> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|n| match n {
                Notification::Closed(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn last_update(&self) -> Option<TimerUpdate> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|n| match n {
                Notification::Update(update) => Some(update.clone()),
                _ => None,
            })
    }

    pub fn count(&self, wanted: &Notification) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|n| *n == wanted)
            .count()
    }

    fn push(&self, notification: Notification) {
        self.log.lock().unwrap().push(notification);
    }
}

impl Notifier for RecordingNotifier {
    fn present_overlay(&self, request: &OverlayRequest) -> Result<()> {
        if *self.fail_presents.lock().unwrap() {
            bail!("overlay window could not be created");
        }
        self.push(Notification::Presented(request.clone()));
        Ok(())
    }

    fn close_overlay(&self, id: Uuid) -> Result<()> {
        self.push(Notification::Closed(id));
        Ok(())
    }

    fn timer_update(&self, update: &TimerUpdate) -> Result<()> {
        self.push(Notification::Update(update.clone()));
        Ok(())
    }

    fn settings_saved(&self, saved: bool) -> Result<()> {
        self.push(Notification::SettingsSaved(saved));
        Ok(())
    }

    fn chime(&self) {
        self.push(Notification::Chime);
    }
}
