/// Settings filename (under the per-user app config directory)
pub const SETTINGS_FILE: &str = "settings.json";

/// Environment flag that treats every configured minute as one second
pub const DEBUG_ENV: &str = "LOOKAWAY_DEBUG";

/// Tray icon ID
pub const TRAY_ID: &str = "main-tray";

/// Tray tooltip
pub const TRAY_TOOLTIP: &str = "LookAway - Wellness Reminders";

/// Window labels and pages
pub mod window {
    pub const SETTINGS: &str = "settings";
    pub const SETTINGS_PAGE: &str = "settings.html";
    pub const SETTINGS_TITLE: &str = "LookAway - Settings";

    /// Overlay windows are labelled `overlay-<uuid>`
    pub const OVERLAY_PREFIX: &str = "overlay-";

    /// Delay before the settings window is first shown after launch
    pub const FIRST_SHOW_DELAY_MS: u64 = 500;
}

/// Event names emitted to the webviews
pub mod events {
    pub const TIMER_UPDATE: &str = "timer-update";
    pub const LOAD_SETTINGS: &str = "load-settings";
    pub const SETTINGS_SAVED: &str = "settings-saved";
    pub const START_COUNTDOWN: &str = "start-countdown";
}

/// Menu item IDs
pub mod menu {
    pub const EYE_REST: &str = "eye-rest";
    pub const POSTURE: &str = "posture";
    pub const WORK_BREAK: &str = "work-break";
    pub const TOGGLE: &str = "toggle";
    pub const RESET: &str = "reset";
    pub const SETTINGS: &str = "settings";
    pub const QUIT: &str = "quit";
}

/// Time constants
pub mod time {
    /// Seconds per minute
    pub const SECONDS_PER_MINUTE: u32 = 60;

    /// Scheduler cadence
    pub const TICK_INTERVAL_MS: u64 = 1000;

    /// Pause between a dismissed overlay and the next queued one
    pub const OVERLAY_SETTLE_SECS: u32 = 2;

    /// Extra ticks an overlay may outlive its duration before it is force-closed
    pub const OVERLAY_GRACE_SECS: u32 = 5;
}
