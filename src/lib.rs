mod audio;
mod constants;
mod control;
mod overlay;
mod reminder;
mod service;
mod settings;
mod shell;
mod tray;
mod utils;

#[cfg(test)]
mod testing;

use std::sync::atomic::AtomicBool;

use audio::AudioHandle;
use reminder::ThreadRandom;
use service::{
    commands::{
        close_overlay, get_settings, get_timer_state, reset_timers, save_settings,
        set_timer_running, toggle_timer,
    },
    ReminderService, ServiceHandle, ServiceOptions,
};
use settings::SettingsStore;
use shell::TauriNotifier;
use tauri::{Manager, RunEvent};
use tokio_util::sync::CancellationToken;

pub(crate) struct AppState {
    pub(crate) service: ServiceHandle,
    pub(crate) audio: AudioHandle,
    pub(crate) cancel: CancellationToken,
    pub(crate) quitting: AtomicBool,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("LookAway starting up...");

    let app = tauri::Builder::default()
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let config_dir = app
                    .path()
                    .app_config_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&config_dir)?;

                let store = SettingsStore::new(config_dir.join(constants::SETTINGS_FILE));
                let options = ServiceOptions::from_env();
                if options.seconds_per_minute != constants::time::SECONDS_PER_MINUTE {
                    log::warn!("{} set: intervals run in seconds", constants::DEBUG_ENV);
                }

                let (service_handle, control_rx) = ServiceHandle::channel();
                let audio = AudioHandle::new();
                let cancel = CancellationToken::new();

                app.manage(AppState {
                    service: service_handle.clone(),
                    audio: audio.clone(),
                    cancel: cancel.clone(),
                    quitting: AtomicBool::new(false),
                });

                let tray_menu = tray::setup(app)?;
                let notifier = TauriNotifier::new(app.handle().clone(), audio, tray_menu);
                let service =
                    ReminderService::new(store, notifier, Box::new(ThreadRandom), &options);
                tauri::async_runtime::spawn(service.run(
                    control_rx,
                    cancel,
                    options.tick_interval,
                ));

                shell::create_settings_window(app.handle(), service_handle)?;
                shell::schedule_first_show(app.handle());

                // Menu-bar only on macOS
                #[cfg(target_os = "macos")]
                {
                    app.set_activation_policy(tauri::ActivationPolicy::Accessory);
                }

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .on_window_event(shell::on_window_event)
        .invoke_handler(tauri::generate_handler![
            get_timer_state,
            get_settings,
            save_settings,
            toggle_timer,
            set_timer_running,
            reset_timers,
            close_overlay,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| match event {
        // Keep running in the tray when the last window goes away.
        RunEvent::ExitRequested { code: None, api, .. } => api.prevent_exit(),
        #[cfg(target_os = "macos")]
        RunEvent::Reopen { .. } => shell::show_settings(app_handle),
        RunEvent::Exit => {
            let state = app_handle.state::<AppState>();
            state.cancel.cancel();
            state.audio.stop();
        }
        _ => {}
    });
}
