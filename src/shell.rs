//! Tauri side of the control channel: windows, event emission and the
//! [`Notifier`] implementation the reminder service talks to.

use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use tauri::{
    webview::PageLoadEvent, AppHandle, Emitter, Manager, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder, Window, WindowEvent,
};
use uuid::Uuid;

use crate::{
    audio::AudioHandle,
    constants::{events, window},
    control::{Notifier, TimerUpdate},
    reminder::OverlayRequest,
    service::ServiceHandle,
    tray::TrayMenu,
    AppState,
};

const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_error, log_warn};

pub fn overlay_label(id: Uuid) -> String {
    format!("{}{}", window::OVERLAY_PREFIX, id)
}

pub fn parse_overlay_label(label: &str) -> Option<Uuid> {
    label
        .strip_prefix(window::OVERLAY_PREFIX)
        .and_then(|id| Uuid::parse_str(id).ok())
}

pub struct TauriNotifier {
    app: AppHandle,
    audio: AudioHandle,
    tray: TrayMenu,
}

impl TauriNotifier {
    pub fn new(app: AppHandle, audio: AudioHandle, tray: TrayMenu) -> Self {
        Self { app, audio, tray }
    }
}

impl Notifier for TauriNotifier {
    fn present_overlay(&self, request: &OverlayRequest) -> Result<()> {
        let id = request.id;
        let label = overlay_label(id);
        let duration_sec = request.duration_sec;
        let page = WebviewUrl::App(request.kind.page().into());

        WebviewWindowBuilder::new(&self.app, &label, page)
            .title(request.kind.label())
            .fullscreen(true)
            .decorations(false)
            .always_on_top(true)
            .skip_taskbar(true)
            .resizable(false)
            .focused(true)
            .on_page_load(move |overlay, payload| {
                if payload.event() == PageLoadEvent::Finished {
                    let target = overlay.label().to_string();
                    if let Err(err) =
                        overlay.emit_to(target.as_str(), events::START_COUNTDOWN, duration_sec)
                    {
                        log_warn!("Failed to start countdown on {target}: {err}");
                        return;
                    }
                    if let Err(err) = overlay.state::<AppState>().service.overlay_started(id) {
                        log_warn!("Could not report started overlay {id}: {err:#}");
                    }
                }
            })
            .build()
            .with_context(|| format!("failed to create overlay window {label}"))?;
        Ok(())
    }

    fn close_overlay(&self, id: Uuid) -> Result<()> {
        match self.app.get_webview_window(&overlay_label(id)) {
            Some(overlay) => overlay
                .close()
                .with_context(|| format!("failed to close overlay {id}")),
            // Already gone (user closed it, or the process behind it died).
            None => Ok(()),
        }
    }

    fn timer_update(&self, update: &TimerUpdate) -> Result<()> {
        if let Err(err) = self.tray.refresh(&self.app, update) {
            log_debug!("Tray refresh failed: {err}");
        }
        self.app
            .emit(events::TIMER_UPDATE, update)
            .context("failed to emit timer-update")
    }

    fn settings_saved(&self, saved: bool) -> Result<()> {
        self.app
            .emit_to(window::SETTINGS, events::SETTINGS_SAVED, saved)
            .context("failed to emit settings-saved")
    }

    fn chime(&self) {
        if let Err(err) = self.audio.chime() {
            log_warn!("Failed to play chime: {err}");
        }
    }
}

/// Created hidden; shown from the tray, on reopen, and once shortly after launch.
pub fn create_settings_window(app: &AppHandle, service: ServiceHandle) -> Result<WebviewWindow> {
    WebviewWindowBuilder::new(
        app,
        window::SETTINGS,
        WebviewUrl::App(window::SETTINGS_PAGE.into()),
    )
    .title(window::SETTINGS_TITLE)
    .inner_size(900.0, 700.0)
    .min_inner_size(800.0, 600.0)
    .visible(false)
    .on_page_load(move |settings, payload| {
        if payload.event() == PageLoadEvent::Finished {
            push_settings(settings, service.clone());
        }
    })
    .build()
    .context("failed to create settings window")
}

pub fn show_settings(app: &AppHandle) {
    let Some(settings) = app.get_webview_window(window::SETTINGS) else {
        log_warn!("Settings window is gone");
        return;
    };
    let _ = settings.unminimize();
    let _ = settings.show();
    let _ = settings.set_focus();

    let service = app.state::<AppState>().service.clone();
    push_settings(settings, service);
}

/// Shows the settings window once after launch.
pub fn schedule_first_show(app: &AppHandle) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(Duration::from_millis(window::FIRST_SHOW_DELAY_MS)).await;
        show_settings(&app);
    });
}

fn push_settings(settings: WebviewWindow, service: ServiceHandle) {
    tauri::async_runtime::spawn(async move {
        match service.settings().await {
            Ok(config) => {
                if let Err(err) =
                    settings.emit_to(window::SETTINGS, events::LOAD_SETTINGS, &config)
                {
                    log_warn!("Failed to send settings to the settings window: {err}");
                }
            }
            Err(err) => log_error!("Could not read settings for the settings window: {err:#}"),
        }
    });
}

pub fn quit(app: &AppHandle) {
    let state = app.state::<AppState>();
    state.quitting.store(true, Ordering::SeqCst);
    state.cancel.cancel();
    state.audio.stop();
    app.exit(0);
}

/// Settings hides instead of closing; any overlay going away counts as a dismissal.
pub fn on_window_event(window: &Window, event: &WindowEvent) {
    match event {
        WindowEvent::CloseRequested { api, .. } if window.label() == window::SETTINGS => {
            let quitting = window.state::<AppState>().quitting.load(Ordering::SeqCst);
            if !quitting {
                let _ = window.hide();
                api.prevent_close();
            }
        }
        WindowEvent::Destroyed => {
            if let Some(id) = parse_overlay_label(window.label()) {
                if let Err(err) = window.state::<AppState>().service.overlay_closed(id) {
                    log_warn!("Could not report closed overlay {id}: {err:#}");
                }
            }
        }
        _ => {}
    }
}
