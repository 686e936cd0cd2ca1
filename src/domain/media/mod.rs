//! Admin image uploads, forwarded to the hosted media API with an unsigned preset.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, header},
};
use reqwest::multipart::{Form, Part};
use tracing::{error, info, instrument};

use crate::{
    domain::{auth::AdminSession, notifier::SharedNotifier},
    infra::ClientError,
};

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Media uploads are not configured (cloud name and upload preset are required).")]
    NotConfigured,
    #[error("The uploaded file is empty.")]
    EmptyFile,
    #[error("Error al subir imagen")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub secure_url: String,
}

pub async fn upload_endpoint(
    AdminSession(_admin): AdminSession,
    State(uploader): State<MediaUploader>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, ClientError> {
    let filename = query.filename.unwrap_or_else(|| "upload".to_owned());
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let secure_url = uploader.upload(&filename, body.to_vec(), content_type.as_deref()).await?;
    Ok(Json(UploadResponse { secure_url }))
}

//------------------------- Uploader ----------------------------

#[derive(Clone)]
pub struct MediaUploader {
    client: reqwest::Client,
    base_url: String,
    cloud_name: Option<String>,
    upload_preset: Option<String>,
    notifier: SharedNotifier,
}

#[derive(serde::Deserialize)]
struct UploadResult {
    secure_url: Option<String>,
}

impl MediaUploader {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        cloud_name: Option<String>,
        upload_preset: Option<String>,
        notifier: SharedNotifier,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            cloud_name: cloud_name.filter(|c| !c.is_empty()),
            upload_preset: upload_preset.filter(|p| !p.is_empty()),
            notifier,
        }
    }

    /// Returns the hosted `secure_url` of the uploaded image.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, MediaError> {
        let result = self.try_upload(filename, bytes, content_type).await;
        match &result {
            Ok(url) => {
                info!("Image uploaded to {url}");
                self.notifier.success("Imagen subida correctamente");
            }
            Err(e) => {
                error!("Error uploading image: {e}");
                self.notifier.error("Error al subir imagen");
            }
        }
        result
    }

    async fn try_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, MediaError> {
        let (Some(cloud_name), Some(upload_preset)) = (&self.cloud_name, &self.upload_preset) else {
            return Err(MediaError::NotConfigured);
        };
        if bytes.is_empty() {
            return Err(MediaError::EmptyFile);
        }

        let mut file = Part::bytes(bytes).file_name(filename.to_owned());
        if let Some(content_type) = content_type {
            file = file.mime_str(content_type)?;
        }
        let form = Form::new().part("file", file).text("upload_preset", upload_preset.clone());

        let response = self
            .client
            .post(format!("{}/v1_1/{cloud_name}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body: UploadResult = response.json().await?;
        body.secure_url
            .filter(|url| status.is_success() && !url.is_empty())
            .ok_or_else(|| MediaError::Rejected(format!("upload answered {status} without a secure_url")))
    }
}
