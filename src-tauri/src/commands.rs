use rfd::FileDialog;
use serde_json::Value;
use std::path::PathBuf;
use tauri::{AppHandle, DragDropEvent, Manager, PhysicalPosition, State, Window};
use url::Url;

use crate::api::HttpApi;
use crate::controller::FormController;
use crate::settings::SETTINGS_FILENAME;
use crate::state::SessionState;
use crate::view::DropZone;

pub type StudioController = FormController<HttpApi, AppHandle>;

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "bmp", "gif", "tiff", "webp", "svg"];

#[tauri::command]
pub async fn initialize(controller: State<'_, StudioController>) -> Result<(), String> {
    controller.initialize().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn load_images(controller: State<'_, StudioController>) -> Result<(), String> {
    controller
        .load_uploaded_images()
        .await
        .map_err(|e| e.to_string())
}

/// Opens a native picker and uploads the chosen image. An empty string means cancelled.
#[tauri::command]
pub async fn select_upload_file(controller: State<'_, StudioController>) -> Result<String, String> {
    let result = FileDialog::new()
        .set_directory(".")
        .add_filter("Images", &IMAGE_EXTENSIONS)
        .pick_file();

    match result {
        Some(path) => controller.upload_path(&path).await.map_err(|e| e.to_string()),
        None => Ok(String::new()),
    }
}

#[tauri::command]
pub async fn upload_path(
    path: String,
    controller: State<'_, StudioController>,
) -> Result<String, String> {
    controller
        .upload_path(&PathBuf::from(path))
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn select_image(
    filename: String,
    controller: State<'_, StudioController>,
) -> Result<(), String> {
    controller.select_image(&filename);
    Ok(())
}

#[tauri::command]
pub async fn generate_qr(controller: State<'_, StudioController>) -> Result<String, String> {
    controller.generate_qr().await.map_err(|e| e.to_string())
}

/// Saves the last generated code where the user chooses. Returns the saved path,
/// or an empty string when the dialog was cancelled.
#[tauri::command]
pub async fn download_qr(controller: State<'_, StudioController>) -> Result<String, String> {
    let filename = controller.download_qr().map_err(|e| e.to_string())?;

    let result = FileDialog::new()
        .set_file_name(&filename)
        .add_filter("PNG image", &["png"])
        .save_file();

    match result {
        Some(path) => {
            controller
                .save_qr(&filename, &path)
                .await
                .map_err(|e| e.to_string())?;
            Ok(path.to_string_lossy().to_string())
        }
        None => Ok(String::new()),
    }
}

#[tauri::command]
pub async fn update_field(
    key: String,
    value: Value,
    controller: State<'_, StudioController>,
) -> Result<bool, String> {
    Ok(controller.update_field(&key, &value))
}

/// Writes the settings document to a user-chosen file and returns its text.
#[tauri::command]
pub async fn export_settings(controller: State<'_, StudioController>) -> Result<String, String> {
    let result = FileDialog::new()
        .set_file_name(SETTINGS_FILENAME)
        .add_filter("JSON files", &["json"])
        .save_file();

    match result {
        Some(path) => controller
            .export_settings_to(&path)
            .await
            .map_err(|e| e.to_string()),
        None => Ok(controller.export_settings()),
    }
}

#[tauri::command]
pub async fn import_settings(
    contents: String,
    controller: State<'_, StudioController>,
) -> Result<usize, String> {
    controller
        .import_settings(&contents)
        .map_err(|e| e.to_string())
}

/// Opens a native picker for a settings file. Zero applied fields when cancelled.
#[tauri::command]
pub async fn select_settings_file(
    controller: State<'_, StudioController>,
) -> Result<usize, String> {
    let result = FileDialog::new()
        .set_directory(".")
        .add_filter("JSON files", &["json"])
        .pick_file();

    match result {
        Some(path) => controller
            .import_settings_path(&path)
            .await
            .map_err(|e| e.to_string()),
        None => Ok(0),
    }
}

#[tauri::command]
pub async fn reset_form(controller: State<'_, StudioController>) -> Result<(), String> {
    controller.reset_form();
    Ok(())
}

#[tauri::command]
pub async fn set_drop_zone(
    zone: DropZone,
    controller: State<'_, StudioController>,
) -> Result<(), String> {
    controller.set_drop_zone(zone);
    Ok(())
}

#[tauri::command]
pub async fn session_state(
    controller: State<'_, StudioController>,
) -> Result<SessionState, String> {
    Ok(controller.session())
}

/// Routes native window drag-and-drop onto the upload area.
pub fn handle_drag_drop(window: &Window, event: &DragDropEvent) {
    let Some(controller) = window.try_state::<StudioController>() else {
        return;
    };
    let controller = controller.inner().clone();
    let scale = window.scale_factor().unwrap_or(1.0);
    let logical = |position: &PhysicalPosition<f64>| {
        let point = position.to_logical::<f64>(scale);
        (point.x, point.y)
    };

    match event {
        DragDropEvent::Enter { position, .. } | DragDropEvent::Over { position } => {
            let (x, y) = logical(position);
            controller.drag_over(x, y);
        }
        DragDropEvent::Leave => controller.drag_leave(),
        DragDropEvent::Drop { paths, position } => {
            let paths = paths.clone();
            let (x, y) = logical(position);
            tauri::async_runtime::spawn(async move {
                if let Some(Err(e)) = controller.drop_paths_at(paths, x, y).await {
                    log::debug!("Dropped file not uploaded: {}", e);
                }
            });
        }
        _ => {}
    }
}

/// Pages the main window may navigate to: the bundled frontend only.
pub fn is_app_url(url: &Url) -> bool {
    match url.scheme() {
        "tauri" => true,
        "http" | "https" => url.host_str() == Some("tauri.localhost"),
        _ => false,
    }
}
