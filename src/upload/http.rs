use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::upload::{self, ImageFile};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Carries the endpoint's own message untouched.
    #[error("{message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("upload response did not contain a URL")]
    MissingUrl,
    #[error("upload response contained an unusable URL ({url}): {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Deserialize, Default)]
struct UploadResponse {
    url: Option<String>,
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

pub struct Client {
    endpoint: Url,
    field: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl Client {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Transport)?;
        Ok(Self {
            endpoint,
            field: "file".to_owned(),
            token: None,
            client,
        })
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

fn persisted_url(raw: String) -> Result<Url, Error> {
    let url = Url::parse(&raw).map_err(|e| Error::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl {
            url: raw,
            reason: "not an http(s) URL".to_owned(),
        });
    }
    Ok(url)
}

impl upload::Client for Client {
    type Error = Error;

    async fn upload(&self, image: &ImageFile) -> Result<Url, Self::Error> {
        let part = reqwest::multipart::Part::bytes(image.body.to_vec())
            .file_name(image.upload_name())
            .mime_str(image.content_type.as_ref())
            .map_err(Error::Transport)?;
        let form = reqwest::multipart::Form::new().part(self.field.clone(), part);

        let mut request = self.client.post(self.endpoint.clone()).multipart(form);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        debug!(endpoint = %self.endpoint, name = %image.name, size = image.body.len(), "upload image");
        let response = request.send().await.map_err(Error::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Transport)?;
        let parsed = serde_json::from_str::<UploadResponse>(&body).unwrap_or_default();

        if !status.is_success() {
            let message = parsed
                .error
                .or(parsed.message)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| format!("upload failed with status {status}"));
            warn!(%status, reason = %message, "upload rejected");
            return Err(Error::Rejected { status, message });
        }

        parsed
            .url
            .or(parsed.image_url)
            .ok_or(Error::MissingUrl)
            .and_then(persisted_url)
    }
}
