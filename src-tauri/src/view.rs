//! View events sent from the controller to the webview.
//!
//! JSON messages tagged by `type`, emitted on [`VIEW_EVENT`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tauri::{AppHandle, Emitter, Runtime};

use crate::banner::Banner;
use crate::params::{FormState, Visibility};
use crate::state::GalleryEntry;

pub const VIEW_EVENT: &str = "studio://view";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    /// Full gallery contents; an empty list means "no images uploaded yet".
    Gallery { entries: Vec<GalleryEntry> },
    /// New source for the QR preview image.
    Preview { url: String },
    Placeholder { visible: bool },
    /// While active the generate button is disabled and the preview hidden.
    Loading { active: bool },
    Banner(Banner),
    BannerCleared,
    Form { values: Map<String, Value> },
    Visibility(Visibility),
    RangeValue { field: &'static str, value: String },
    DropHighlight { active: bool },
}

impl ViewEvent {
    pub fn form(form: &FormState) -> Self {
        let values = form
            .values()
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::from(value)))
            .collect();
        ViewEvent::Form { values }
    }
}

/// Bounds of the upload area in logical window pixels, as reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DropZone {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DropZone {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Presentation sink. Rendering never fails from the controller's point of view.
pub trait View: Clone + Send + Sync + 'static {
    fn render(&self, event: ViewEvent);
}

impl<R: Runtime> View for AppHandle<R> {
    fn render(&self, event: ViewEvent) {
        self.emit(VIEW_EVENT, &event).unwrap_or_else(|e| {
            log::warn!("Emit error: {}", e);
        });
    }
}
