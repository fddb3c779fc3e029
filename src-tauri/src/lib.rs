pub mod api;
pub mod banner;
pub mod commands;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod params;
pub mod settings;
pub mod state;
pub mod upload;
pub mod view;

use tauri::{Manager, WindowEvent, Wry};

use crate::api::HttpApi;
use crate::config::AppConfig;
use crate::controller::FormController;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load();
    log::info!("Using QR service at {}", config.api_base);
    let api = HttpApi::new(&config.api_base)?;

    tauri::Builder::default()
        .plugin(
            tauri::plugin::Builder::<Wry>::new("navigation-guard")
                .on_navigation(|_, url| {
                    let allowed = commands::is_app_url(url);
                    if !allowed {
                        log::warn!("Blocked navigation to {}", url);
                    }
                    allowed
                })
                .build(),
        )
        .setup(move |app| {
            let controller = FormController::new(api, app.handle().clone(), config);
            app.manage(controller);
            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::DragDrop(drag) = event {
                commands::handle_drag_drop(window, drag);
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::initialize,
            commands::load_images,
            commands::select_upload_file,
            commands::upload_path,
            commands::select_image,
            commands::generate_qr,
            commands::download_qr,
            commands::update_field,
            commands::export_settings,
            commands::import_settings,
            commands::select_settings_file,
            commands::reset_form,
            commands::set_drop_zone,
            commands::session_state
        ])
        .run(tauri::generate_context!())?;

    Ok(())
}
