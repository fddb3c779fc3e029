//! Session state for the form controller.
//!
//! State is an immutable value. Every change goes through
//! [`SessionState::reduce`], which returns the next state.

use serde::Serialize;

/// Gallery labels longer than this are cut and suffixed with `...`.
pub const GALLERY_LABEL_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// The image list was fetched; replaces the known images.
    ImagesLoaded(Vec<String>),
    /// An upload succeeded; the new image is appended and selected.
    ImageUploaded(String),
    ImageSelected(String),
    GenerationStarted,
    GenerationSucceeded { filename: String, preview_url: String },
    GenerationFailed,
    DragEntered,
    DragLeft,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub selected_image: Option<String>,
    pub last_generated: Option<String>,
    pub known_images: Vec<String>,
    pub loading: bool,
    /// Last preview source; kept across later failures, like an `<img>` keeps its `src`.
    pub preview_url: Option<String>,
    pub placeholder_visible: bool,
    pub drop_highlight: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            placeholder_visible: true,
            ..Self::default()
        }
    }

    pub fn reduce(self, action: SessionAction) -> Self {
        match action {
            SessionAction::ImagesLoaded(images) => Self {
                known_images: images,
                ..self
            },
            SessionAction::ImageUploaded(filename) => {
                let mut known_images = self.known_images;
                known_images.push(filename.clone());
                Self {
                    selected_image: Some(filename),
                    known_images,
                    ..self
                }
            }
            SessionAction::ImageSelected(filename) => Self {
                selected_image: Some(filename),
                ..self
            },
            SessionAction::GenerationStarted => Self {
                loading: true,
                ..self
            },
            SessionAction::GenerationSucceeded { filename, preview_url } => Self {
                loading: false,
                last_generated: Some(filename),
                preview_url: Some(preview_url),
                placeholder_visible: false,
                ..self
            },
            SessionAction::GenerationFailed => Self {
                loading: false,
                placeholder_visible: true,
                ..self
            },
            SessionAction::DragEntered => Self {
                drop_highlight: true,
                ..self
            },
            SessionAction::DragLeft => Self {
                drop_highlight: false,
                ..self
            },
        }
    }

    pub fn has_preview(&self) -> bool {
        self.preview_url.is_some()
    }

    /// The preview panel is hidden while a request is in flight.
    pub fn gallery(&self, preview_url: impl Fn(&str) -> String) -> Vec<GalleryEntry> {
        self.known_images
            .iter()
            .map(|filename| GalleryEntry {
                filename: filename.clone(),
                preview_url: preview_url(filename),
                label: gallery_label(filename),
                selected: self.selected_image.as_deref() == Some(filename.as_str()),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryEntry {
    pub filename: String,
    pub preview_url: String,
    pub label: String,
    pub selected: bool,
}

pub fn gallery_label(filename: &str) -> String {
    if filename.chars().count() > GALLERY_LABEL_CHARS {
        let head: String = filename.chars().take(GALLERY_LABEL_CHARS).collect();
        format!("{}...", head)
    } else {
        filename.to_string()
    }
}
