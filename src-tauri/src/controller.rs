//! The form controller: every user action on the page lands here.
//!
//! Operations render their own feedback (banners, loading state, previews)
//! through the [`View`] before returning, so callers may ignore the result.
//! Locks are never held across an `.await`; concurrent operations interleave
//! and the last response to arrive wins the preview.

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::api::{ApiReply, Endpoints, GenerateRequest, QrApi};
use crate::banner::{Banner, BannerKind, BannerSlot};
use crate::config::AppConfig;
use crate::debounce::Debouncer;
use crate::error::{StudioError, ValidationError};
use crate::params::{FieldId, FieldKind, FormState, GenerationParams};
use crate::settings;
use crate::state::{SessionAction, SessionState};
use crate::upload::UploadFile;
use crate::view::{DropZone, View, ViewEvent};

struct Inner<A, V> {
    api: A,
    view: V,
    endpoints: Endpoints,
    config: AppConfig,
    session: RwLock<SessionState>,
    form: Mutex<FormState>,
    debouncer: Debouncer,
    banner: BannerSlot,
    drop_zone: Mutex<Option<DropZone>>,
}

/// Cheap to clone; all clones share the same session.
pub struct FormController<A, V> {
    inner: Arc<Inner<A, V>>,
}

impl<A, V> Clone for FormController<A, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Splits a 2xx reply into the produced filename or the server's complaint.
fn accepted(reply: ApiReply) -> Result<String, String> {
    if !reply.success {
        return Err(reply.message_or_default().to_string());
    }
    match reply.filename {
        Some(filename) if !filename.is_empty() => Ok(filename),
        _ => Err("reply did not name a file".to_string()),
    }
}

impl<A: QrApi, V: View> FormController<A, V> {
    pub fn new(api: A, view: V, config: AppConfig) -> Self {
        let inner = Inner {
            endpoints: Endpoints::new(&config.api_base),
            debouncer: Debouncer::new(Duration::from_millis(config.debounce_ms)),
            banner: BannerSlot::new(Duration::from_millis(config.banner_ms)),
            session: RwLock::new(SessionState::new()),
            form: Mutex::new(FormState::new()),
            drop_zone: Mutex::new(None),
            api,
            view,
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn session(&self) -> SessionState {
        self.inner.session.read().clone()
    }

    pub fn form(&self) -> FormState {
        self.inner.form.lock().clone()
    }

    pub fn banner(&self) -> Option<Banner> {
        self.inner.banner.current()
    }

    pub fn regeneration_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    fn dispatch(&self, action: SessionAction) -> SessionState {
        let mut session = self.inner.session.write();
        let next = std::mem::take(&mut *session).reduce(action);
        *session = next.clone();
        next
    }

    fn render(&self, event: ViewEvent) {
        self.inner.view.render(event);
    }

    fn notify(&self, kind: BannerKind, text: impl Into<String>) {
        self.inner
            .banner
            .show(&self.inner.view, Banner::new(kind, text));
    }

    fn reject(&self, err: ValidationError) -> StudioError {
        log::warn!("Rejected: {}", err);
        self.notify(BannerKind::Error, err.to_string());
        err.into()
    }

    fn render_gallery(&self, state: &SessionState) {
        let endpoints = &self.inner.endpoints;
        let entries = state.gallery(|filename| endpoints.preview(filename));
        self.render(ViewEvent::Gallery { entries });
    }

    fn render_field(&self, form: &FormState, id: FieldId) {
        if id.kind() == FieldKind::Range {
            self.render(ViewEvent::RangeValue {
                field: id.key(),
                value: form.text(id).to_string(),
            });
        }
    }

    fn render_form(&self) {
        let form = self.form();
        self.render(ViewEvent::form(&form));
        for (id, value) in form.range_values() {
            self.render(ViewEvent::RangeValue { field: id.key(), value });
        }
        self.render(ViewEvent::Visibility(form.visibility()));
    }

    /// Page-load wiring: push the form to the view, then fetch the gallery.
    pub async fn initialize(&self) -> Result<(), StudioError> {
        self.render_form();
        let state = self.session();
        self.render(ViewEvent::Placeholder {
            visible: state.placeholder_visible,
        });
        self.render_gallery(&state);
        self.load_uploaded_images().await
    }

    pub async fn load_uploaded_images(&self) -> Result<(), StudioError> {
        match self.inner.api.list_images().await {
            Ok(images) => {
                log::debug!("Loaded {} uploaded images", images.len());
                let state = self.dispatch(SessionAction::ImagesLoaded(images));
                self.render_gallery(&state);
                Ok(())
            }
            Err(e) => {
                log::error!("Error loading images: {}", e);
                self.notify(BannerKind::Error, "Error loading uploaded images");
                Err(e.into())
            }
        }
    }

    /// Validates and uploads a background image. On success it becomes the selection.
    pub async fn upload_image(&self, file: UploadFile) -> Result<String, StudioError> {
        if let Err(e) = file.validate(self.inner.config.max_upload_bytes) {
            return Err(self.reject(e));
        }

        log::info!("Uploading {} ({} bytes)", file.name, file.size());
        self.notify(BannerKind::Info, "Uploading image...");

        match self.inner.api.upload(file).await {
            Ok(reply) => match accepted(reply) {
                Ok(filename) => {
                    let state = self.dispatch(SessionAction::ImageUploaded(filename.clone()));
                    self.render_gallery(&state);
                    self.notify(BannerKind::Success, "Image uploaded successfully!");
                    Ok(filename)
                }
                Err(message) => {
                    log::warn!("Upload refused: {}", message);
                    self.notify(BannerKind::Error, format!("Upload failed: {}", message));
                    Err(StudioError::Application(message))
                }
            },
            Err(e) => {
                log::error!("Upload error: {}", e);
                self.notify(BannerKind::Error, format!("Upload error: {}", e));
                Err(e.into())
            }
        }
    }

    /// Uploads a local file. Oversized or non-image files are rejected before being read.
    pub async fn upload_path(&self, path: &Path) -> Result<String, StudioError> {
        match UploadFile::from_path(path, self.inner.config.max_upload_bytes).await {
            Ok(file) => self.upload_image(file).await,
            Err(StudioError::Validation(e)) => Err(self.reject(e)),
            Err(e) => {
                log::error!("Failed to read {:?}: {}", path, e);
                self.notify(BannerKind::Error, format!("Upload error: {}", e));
                Err(e.into())
            }
        }
    }

    pub fn select_image(&self, filename: &str) {
        let state = self.dispatch(SessionAction::ImageSelected(filename.to_string()));
        self.render_gallery(&state);
        self.notify(BannerKind::Success, format!("Image selected: {}", filename));
    }

    /// Requests a render with the current form. Returns the generated filename.
    pub async fn generate_qr(&self) -> Result<String, StudioError> {
        let Some(filename) = self.session().selected_image else {
            return Err(self.reject(ValidationError::NoImageSelected));
        };

        let form = self.form();
        if form.text(FieldId::Data).trim().is_empty() {
            return Err(self.reject(ValidationError::EmptyPayload));
        }
        let params = GenerationParams::from_form(&form).map_err(|e| self.reject(e))?;

        self.dispatch(SessionAction::GenerationStarted);
        self.render(ViewEvent::Loading { active: true });
        log::info!("Generating QR code for {}", filename);

        let request = GenerateRequest { filename, params };
        let outcome = match self.inner.api.generate(request).await {
            Ok(reply) => match accepted(reply) {
                Ok(output) => {
                    let preview_url = self.inner.endpoints.download_uncached(&output, now_ms());
                    self.dispatch(SessionAction::GenerationSucceeded {
                        filename: output.clone(),
                        preview_url: preview_url.clone(),
                    });
                    self.render(ViewEvent::Preview { url: preview_url });
                    self.render(ViewEvent::Placeholder { visible: false });
                    self.notify(BannerKind::Success, "QR code generated successfully!");
                    Ok(output)
                }
                Err(message) => {
                    log::warn!("Generation refused: {}", message);
                    self.dispatch(SessionAction::GenerationFailed);
                    self.render(ViewEvent::Placeholder { visible: true });
                    self.notify(BannerKind::Error, format!("Generation failed: {}", message));
                    Err(StudioError::Application(message))
                }
            },
            Err(e) => {
                log::error!("Generation error: {}", e);
                self.dispatch(SessionAction::GenerationFailed);
                self.render(ViewEvent::Placeholder { visible: true });
                self.notify(BannerKind::Error, format!("Generation error: {}", e));
                Err(e.into())
            }
        };

        self.render(ViewEvent::Loading { active: false });
        outcome
    }

    /// Names the last generated code for the shell to save. No request is made here.
    pub fn download_qr(&self) -> Result<String, StudioError> {
        let Some(filename) = self.session().last_generated else {
            return Err(self.reject(ValidationError::NothingToDownload));
        };

        log::info!("Download requested for {}", filename);
        self.notify(BannerKind::Success, "Download started!");
        Ok(filename)
    }

    /// Fetches a generated code from the service and writes it to `dest`.
    pub async fn save_qr(&self, filename: &str, dest: &Path) -> Result<(), StudioError> {
        let written = match self.inner.api.download(filename.to_string()).await {
            Ok(bytes) => tokio::fs::write(dest, bytes).await.map_err(StudioError::from),
            Err(e) => Err(e.into()),
        };

        match written {
            Ok(()) => {
                log::info!("Saved {} to {:?}", filename, dest);
                self.notify(BannerKind::Success, format!("Saved {}", dest.display()));
                Ok(())
            }
            Err(e) => {
                log::error!("Download error: {}", e);
                self.notify(BannerKind::Error, format!("Download error: {}", e));
                Err(e)
            }
        }
    }

    /// Schedules a debounced regeneration when there is already a preview to refresh.
    pub fn on_parameter_change(&self) -> bool {
        let state = self.session();
        if state.selected_image.is_none() || !state.has_preview() {
            return false;
        }

        let controller = self.clone();
        self.inner.debouncer.schedule(async move {
            // feedback was already rendered
            let _ = controller.generate_qr().await;
        });
        true
    }

    /// Change event from a form control. Unknown keys are ignored.
    pub fn update_field(&self, key: &str, value: &Value) -> bool {
        let Some(id) = FieldId::from_key(key) else {
            log::debug!("Ignoring change for unknown field {}", key);
            return false;
        };

        let form = {
            let mut form = self.inner.form.lock();
            form.set_json(id, value);
            form.clone()
        };
        self.render_field(&form, id);
        self.render(ViewEvent::Visibility(form.visibility()));
        self.on_parameter_change()
    }

    /// Serializes the form, including the selected image, as pretty JSON.
    pub fn export_settings(&self) -> String {
        let selected = self.session().selected_image;
        settings::export_json(&self.form(), selected.as_deref())
    }

    /// Writes the export document to `dest`, normally a `qr-generator-settings.json`
    /// the user picked.
    pub async fn export_settings_to(&self, dest: &Path) -> Result<String, StudioError> {
        let contents = self.export_settings();
        match tokio::fs::write(dest, &contents).await {
            Ok(()) => {
                log::info!("Exported settings to {:?}", dest);
                Ok(contents)
            }
            Err(e) => {
                log::error!("Failed to write {:?}: {}", dest, e);
                self.notify(BannerKind::Error, format!("Error exporting settings: {}", e));
                Err(e.into())
            }
        }
    }

    pub fn import_settings(&self, text: &str) -> Result<usize, StudioError> {
        let result = {
            let mut form = self.inner.form.lock();
            settings::import_json(&mut form, text)
        };

        match result {
            Ok(applied) => {
                log::info!("Imported {} settings", applied);
                self.render_form();
                self.notify(BannerKind::Success, "Settings imported successfully!");
                Ok(applied)
            }
            Err(e) => {
                log::warn!("Settings import failed: {}", e);
                self.notify(BannerKind::Error, "Error importing settings: Invalid JSON file");
                Err(e.into())
            }
        }
    }

    pub async fn import_settings_path(&self, path: &Path) -> Result<usize, StudioError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => self.import_settings(&text),
            Err(e) => {
                log::error!("Failed to read {:?}: {}", path, e);
                self.notify(BannerKind::Error, format!("Error importing settings: {}", e));
                Err(e.into())
            }
        }
    }

    /// Restores the default form. Does not trigger a regeneration.
    pub fn reset_form(&self) {
        *self.inner.form.lock() = FormState::default();
        self.render_form();
    }

    /// Records where the upload area sits so native drops elsewhere are ignored.
    pub fn set_drop_zone(&self, zone: DropZone) {
        *self.inner.drop_zone.lock() = Some(zone);
    }

    /// Until the page reports its upload area, the whole window accepts drops.
    fn over_drop_zone(&self, x: f64, y: f64) -> bool {
        self.inner
            .drop_zone
            .lock()
            .map_or(true, |zone| zone.contains(x, y))
    }

    /// Drag movement at logical window coordinates.
    pub fn drag_over(&self, x: f64, y: f64) {
        if self.over_drop_zone(x, y) {
            self.drag_enter();
        } else {
            self.drag_leave();
        }
    }

    pub fn drag_enter(&self) {
        if !self.session().drop_highlight {
            self.dispatch(SessionAction::DragEntered);
            self.render(ViewEvent::DropHighlight { active: true });
        }
    }

    pub fn drag_leave(&self) {
        if self.session().drop_highlight {
            self.dispatch(SessionAction::DragLeft);
            self.render(ViewEvent::DropHighlight { active: false });
        }
    }

    /// Uploads the first dropped file. `None` when nothing was dropped.
    pub async fn drop_files(&self, files: Vec<UploadFile>) -> Option<Result<String, StudioError>> {
        self.drag_leave();
        let file = files.into_iter().next()?;
        Some(self.upload_image(file).await)
    }

    /// Native drop at logical window coordinates. Drops outside the upload area are ignored.
    pub async fn drop_paths_at(
        &self,
        paths: Vec<PathBuf>,
        x: f64,
        y: f64,
    ) -> Option<Result<String, StudioError>> {
        self.drag_leave();
        if !self.over_drop_zone(x, y) {
            log::debug!("Ignoring drop outside the upload area at ({}, {})", x, y);
            return None;
        }
        let path = paths.into_iter().next()?;
        Some(self.upload_path(&path).await)
    }
}
