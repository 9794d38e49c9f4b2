//! Image storage client.
//!
//! Uploads review images to the ImageKit-style storage API and derives
//! transformed delivery URLs. The dashboard displays review images at a fixed
//! width, so every delivery URL applies the same transformation chain.

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::ImageKitConfig;

/// Transformation applied to review image delivery URLs.
const REVIEW_TRANSFORMATION: &str = "tr:q-auto,f-webp,w-600";

/// Errors that can occur when interacting with image storage.
#[derive(Debug, Error)]
pub enum ImageKitError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response body.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// An uploaded file as reported by the storage API.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    /// Storage path of the uploaded file (leading slash included).
    #[serde(rename = "filePath")]
    pub file_path: String,
}

/// Client for the image storage API.
#[derive(Clone)]
pub struct ImageKitClient {
    client: reqwest::Client,
    upload_url: String,
    url_endpoint: String,
    private_key: SecretString,
}

impl ImageKitClient {
    /// Create a new image storage client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ImageKitConfig) -> Result<Self, ImageKitError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            url_endpoint: config.url_endpoint.trim_end_matches('/').to_owned(),
            private_key: config.private_key.clone(),
        })
    }

    /// Upload a file into the given folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the upload.
    pub async fn upload(
        &self,
        file_name: &str,
        data: Vec<u8>,
        folder: &str,
    ) -> Result<UploadedImage, ImageKitError> {
        let part = Part::bytes(data).file_name(file_name.to_owned());
        let form = Form::new()
            .part("file", part)
            .text("fileName", file_name.to_owned())
            .text("folder", folder.to_owned());

        let response = self
            .client
            .post(&self.upload_url)
            .basic_auth(self.private_key.expose_secret(), Some(""))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ImageKitError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ImageKitError::Parse(e.to_string()))
    }

    /// Delivery URL for an uploaded file with the review transformation
    /// applied (quality auto, webp, 600px wide).
    #[must_use]
    pub fn delivery_url(&self, file_path: &str) -> String {
        let path = if file_path.starts_with('/') {
            file_path.to_owned()
        } else {
            format!("/{file_path}")
        };
        format!("{}/{REVIEW_TRANSFORMATION}{path}", self.url_endpoint)
    }
}
