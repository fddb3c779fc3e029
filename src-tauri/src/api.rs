//! Client side of the QR rendering service.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::future::Future;
use url::Url;

use crate::error::ApiError;
use crate::params::GenerationParams;
use crate::upload::UploadFile;

/// Builds every URL the controller hands out or calls.
///
/// An empty base yields root-relative paths such as `/api/images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn images(&self) -> String {
        format!("{}/api/images", self.base)
    }

    pub fn upload(&self) -> String {
        format!("{}/api/upload", self.base)
    }

    pub fn generate(&self) -> String {
        format!("{}/api/generate", self.base)
    }

    pub fn preview(&self, filename: &str) -> String {
        format!("{}/api/preview/{}", self.base, filename)
    }

    pub fn download(&self, filename: &str) -> String {
        format!("{}/api/download/{}", self.base, filename)
    }

    /// Download URL with a `t` query so the webview refetches a regenerated image.
    pub fn download_uncached(&self, filename: &str, timestamp_ms: u128) -> String {
        format!("{}?t={}", self.download(filename), timestamp_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ImageList {
    #[serde(default)]
    pub images: Vec<String>,
}

/// Body of `/api/upload` and `/api/generate` replies.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiReply {
    #[serde(default)]
    pub success: bool,
    pub filename: Option<String>,
    pub message: Option<String>,
}

impl ApiReply {
    pub fn ok(filename: &str) -> Self {
        Self {
            success: true,
            filename: Some(filename.to_string()),
            message: None,
        }
    }

    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            filename: None,
            message: Some(message.to_string()),
        }
    }

    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("no message from server")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub filename: String,
    pub params: GenerationParams,
}

impl GenerateRequest {
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        self.params.multipart_fields(&self.filename)
    }
}

/// The HTTP seam. The controller only talks to the service through this trait.
pub trait QrApi: Send + Sync + 'static {
    fn list_images(&self) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    fn upload(&self, file: UploadFile) -> impl Future<Output = Result<ApiReply, ApiError>> + Send;

    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<ApiReply, ApiError>> + Send;

    /// Bytes of a generated code, for saving to disk.
    fn download(&self, filename: String)
        -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;
}

pub struct HttpApi {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpApi {
    pub fn new(base: &str) -> Result<Self, ApiError> {
        Url::parse(base).map_err(|source| ApiError::BadBase {
            base: base.to_string(),
            source,
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoints: Endpoints::new(base),
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Extracts `detail` from an error body, whether it is a string or a structured list.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

impl QrApi for HttpApi {
    async fn list_images(&self) -> Result<Vec<String>, ApiError> {
        let response = self.client.get(self.endpoints.images()).send().await?;
        let list: ImageList = check_status(response).await?.json().await?;
        Ok(list.images)
    }

    async fn upload(&self, file: UploadFile) -> Result<ApiReply, ApiError> {
        let part = Part::bytes(file.bytes)
            .file_name(file.name)
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoints.upload())
            .multipart(form)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn generate(&self, request: GenerateRequest) -> Result<ApiReply, ApiError> {
        let form = request
            .fields()
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value));

        let response = self
            .client
            .post(self.endpoints.generate())
            .multipart(form)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }

    async fn download(&self, filename: String) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(self.endpoints.download(&filename))
            .send()
            .await?;
        let bytes = check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_endpoints_match_the_page_paths() {
        let endpoints = Endpoints::new("");
        assert_eq!(endpoints.images(), "/api/images");
        assert_eq!(endpoints.preview("cat.png"), "/api/preview/cat.png");
        assert_eq!(
            endpoints.download_uncached("qr_123.png", 1700000000000),
            "/api/download/qr_123.png?t=1700000000000"
        );
    }

    #[test]
    fn base_trailing_slash_is_dropped() {
        let endpoints = Endpoints::new("http://127.0.0.1:8000/");
        assert_eq!(endpoints.upload(), "http://127.0.0.1:8000/api/upload");
        assert_eq!(endpoints.generate(), "http://127.0.0.1:8000/api/generate");
    }

    #[test]
    fn http_client_needs_an_absolute_base() {
        assert!(HttpApi::new("http://localhost:8000").is_ok());
        assert!(matches!(
            HttpApi::new("/relative"),
            Err(ApiError::BadBase { .. })
        ));
    }

    #[test]
    fn replies_tolerate_missing_fields() {
        let reply: ApiReply = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message_or_default(), "no message from server");

        let reply: ApiReply = serde_json::from_str(
            r#"{"success": true, "filename": "qr_1.png", "message": "ok", "output_path": "qr_1.png"}"#,
        )
        .unwrap();
        assert_eq!(
            reply,
            ApiReply {
                success: true,
                filename: Some("qr_1.png".into()),
                message: Some("ok".into()),
            }
        );

        let list: ImageList = serde_json::from_str("{}").unwrap();
        assert!(list.images.is_empty());
    }

    #[test]
    fn error_detail_reads_string_and_structured_bodies() {
        assert_eq!(
            error_detail(r#"{"detail": "Background image not found"}"#).as_deref(),
            Some("Background image not found")
        );
        assert!(error_detail(r#"{"detail": [{"loc": ["body", "filename"]}]}"#)
            .unwrap()
            .contains("filename"));
        assert_eq!(error_detail("Internal Server Error"), None);
    }
}
