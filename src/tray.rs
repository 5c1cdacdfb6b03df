//! Menu-bar / system tray surface.
//!
//! Everything shown here is derived from the latest [`TimerUpdate`]; menu actions
//! forward straight to the reminder service. The tray keeps no state of its own.

use tauri::{
    menu::{MenuBuilder, MenuItem, MenuItemBuilder},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    App, AppHandle, Manager, Wry,
};

use crate::{
    constants::{self, menu},
    control::TimerUpdate,
    reminder::ReminderKind,
    shell,
    AppState,
};

/// `M:SS`, minutes unpadded.
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Shortest non-zero countdown among enabled kinds.
pub fn next_reminder(update: &TimerUpdate) -> Option<u32> {
    ReminderKind::ALL
        .into_iter()
        .filter(|kind| update.is_enabled(*kind))
        .map(|kind| update.countdown(kind))
        .filter(|secs| *secs > 0)
        .min()
}

pub fn tray_title(update: &TimerUpdate) -> String {
    if update.overlay_active.is_some() {
        return " break".to_string();
    }
    match next_reminder(update) {
        Some(secs) if update.running => format!(" {}", format_time(secs)),
        Some(secs) => format!(" {} (paused)", format_time(secs)),
        None => String::new(),
    }
}

pub fn countdown_label(update: &TimerUpdate, kind: ReminderKind) -> String {
    if update.is_enabled(kind) {
        format!("{}: {}", kind.label(), format_time(update.countdown(kind)))
    } else {
        format!("{}: off", kind.label())
    }
}

pub fn toggle_label(running: bool) -> &'static str {
    if running {
        "Pause"
    } else {
        "Resume"
    }
}

/// Items whose text follows the timer.
#[derive(Clone)]
pub struct TrayMenu {
    eye_rest: MenuItem<Wry>,
    posture: MenuItem<Wry>,
    work_break: MenuItem<Wry>,
    toggle: MenuItem<Wry>,
}

impl TrayMenu {
    pub fn refresh(&self, app: &AppHandle, update: &TimerUpdate) -> tauri::Result<()> {
        self.eye_rest
            .set_text(countdown_label(update, ReminderKind::EyeRest))?;
        self.posture
            .set_text(countdown_label(update, ReminderKind::Posture))?;
        self.work_break
            .set_text(countdown_label(update, ReminderKind::WorkBreak))?;
        self.toggle.set_text(toggle_label(update.running))?;

        if let Some(tray) = app.tray_by_id(constants::TRAY_ID) {
            tray.set_title(Some(tray_title(update)))?;
        }
        Ok(())
    }
}

pub fn setup(app: &App) -> tauri::Result<TrayMenu> {
    let eye_rest = MenuItemBuilder::with_id(menu::EYE_REST, "Eye Rest: --:--")
        .enabled(false)
        .build(app)?;
    let posture = MenuItemBuilder::with_id(menu::POSTURE, "Posture: --:--")
        .enabled(false)
        .build(app)?;
    let work_break = MenuItemBuilder::with_id(menu::WORK_BREAK, "Work Break: off")
        .enabled(false)
        .build(app)?;
    let toggle = MenuItemBuilder::with_id(menu::TOGGLE, toggle_label(true)).build(app)?;
    let reset = MenuItemBuilder::with_id(menu::RESET, "Reset Timers").build(app)?;
    let settings = MenuItemBuilder::with_id(menu::SETTINGS, "Settings...").build(app)?;
    let quit = MenuItemBuilder::with_id(menu::QUIT, "Quit LookAway").build(app)?;

    let tray_menu = MenuBuilder::new(app)
        .item(&eye_rest)
        .item(&posture)
        .item(&work_break)
        .separator()
        .item(&toggle)
        .item(&reset)
        .item(&settings)
        .separator()
        .item(&quit)
        .build()?;

    let mut builder = TrayIconBuilder::with_id(constants::TRAY_ID)
        .tooltip(constants::TRAY_TOOLTIP)
        .menu(&tray_menu)
        .show_menu_on_left_click(false)
        .on_menu_event(move |app, event| {
            let state = app.state::<AppState>();
            let result = match event.id().as_ref() {
                menu::TOGGLE => state.service.toggle_timer(),
                menu::RESET => state.service.reset_timers(),
                menu::SETTINGS => {
                    shell::show_settings(app);
                    Ok(())
                }
                menu::QUIT => {
                    shell::quit(app);
                    Ok(())
                }
                _ => Ok(()),
            };
            if let Err(err) = result {
                log::error!("Tray action '{}' failed: {err:#}", event.id().as_ref());
            }
        })
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                shell::show_settings(tray.app_handle());
            }
        });

    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone());
    }
    builder.build(app)?;

    Ok(TrayMenu {
        eye_rest,
        posture,
        work_break,
        toggle,
    })
}
