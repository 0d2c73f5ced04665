//! Provider-specific upload implementations.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use merviz_core::{HostingProvider, HostingSettings};
use serde::Deserialize;

use crate::{Error, Result, TRACING_TARGET_HOSTING};

const IMGUR_UPLOAD_URL: &str = "https://api.imgur.com/3/image";
const SMMS_UPLOAD_URL: &str = "https://sm.ms/api/v2/upload";

/// Client for the configured image-hosting backend.
#[derive(Debug, Clone)]
pub struct ImageHost {
    http: reqwest::Client,
    settings: HostingSettings,
}

impl ImageHost {
    /// Creates a client for the given hosting settings.
    pub fn new(settings: HostingSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// Uploads an artifact and returns its public URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider is not fully configured, the
    /// artifact cannot be read, or the provider rejects the upload.
    pub async fn upload(&self, artifact: &Path) -> Result<String> {
        let data = tokio::fs::read(artifact)
            .await
            .map_err(|_| Error::ArtifactNotFound(artifact.display().to_string()))?;
        let file_name = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact")
            .to_owned();

        tracing::debug!(
            target: TRACING_TARGET_HOSTING,
            provider = %self.settings.provider,
            bytes = data.len(),
            "uploading artifact to image host"
        );

        let url = match self.settings.provider {
            HostingProvider::Imgur => self.upload_imgur(data).await?,
            HostingProvider::SmMs => self.upload_smms(data, file_name).await?,
            HostingProvider::Custom => self.upload_custom(data, file_name).await?,
        };

        tracing::info!(
            target: TRACING_TARGET_HOSTING,
            provider = %self.settings.provider,
            url = %url,
            "artifact uploaded"
        );
        Ok(url)
    }

    async fn upload_imgur(&self, data: Vec<u8>) -> Result<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| Error::NotConfigured("imgur requires a client id".to_owned()))?;

        #[derive(Deserialize)]
        struct ImgurData {
            link: Option<String>,
            error: Option<serde_json::Value>,
        }
        #[derive(Deserialize)]
        struct ImgurResponse {
            success: bool,
            data: ImgurData,
        }

        let response: ImgurResponse = self
            .http
            .post(IMGUR_UPLOAD_URL)
            .header("Authorization", format!("Client-ID {api_key}"))
            .json(&serde_json::json!({
                "image": BASE64.encode(&data),
                "type": "base64",
            }))
            .send()
            .await?
            .json()
            .await?;

        if !response.success {
            return Err(Error::Rejected {
                provider: "imgur".to_owned(),
                message: response
                    .data
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown error".to_owned()),
            });
        }
        response.data.link.ok_or_else(|| Error::InvalidResponse {
            provider: "imgur".to_owned(),
            message: "no link in response".to_owned(),
        })
    }

    async fn upload_smms(&self, data: Vec<u8>, file_name: String) -> Result<String> {
        #[derive(Deserialize)]
        struct SmMsData {
            url: Option<String>,
        }
        #[derive(Deserialize)]
        struct SmMsResponse {
            success: bool,
            message: Option<String>,
            data: Option<SmMsData>,
        }

        let form = reqwest::multipart::Form::new().part(
            "smfile",
            reqwest::multipart::Part::bytes(data).file_name(file_name),
        );

        let mut request = self.http.post(SMMS_UPLOAD_URL).multipart(form);
        if let Some(api_key) = &self.settings.api_key {
            request = request.header("Authorization", api_key.clone());
        }

        let response: SmMsResponse = request.send().await?.json().await?;

        if !response.success {
            return Err(Error::Rejected {
                provider: "sm.ms".to_owned(),
                message: response
                    .message
                    .unwrap_or_else(|| "unknown error".to_owned()),
            });
        }
        response
            .data
            .and_then(|d| d.url)
            .ok_or_else(|| Error::InvalidResponse {
                provider: "sm.ms".to_owned(),
                message: "no url in response".to_owned(),
            })
    }

    async fn upload_custom(&self, data: Vec<u8>, file_name: String) -> Result<String> {
        let upload_url = self
            .settings
            .upload_url
            .as_deref()
            .ok_or_else(|| Error::NotConfigured("custom hosting requires an upload URL".to_owned()))?;

        #[derive(Deserialize)]
        struct CustomResponse {
            url: Option<String>,
        }

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(data).file_name(file_name),
        );

        let mut request = self.http.post(upload_url).multipart(form);
        for (name, value) in &self.settings.headers {
            request = request.header(name, value);
        }

        let response: CustomResponse = request.send().await?.json().await?;

        response.url.ok_or_else(|| Error::InvalidResponse {
            provider: "custom".to_owned(),
            message: "no url in response".to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_imgur_without_api_key_is_not_configured() {
        let host = ImageHost::new(HostingSettings {
            provider: HostingProvider::Imgur,
            api_key: None,
            ..HostingSettings::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("chart.png");
        std::fs::write(&artifact, b"png-bytes").unwrap();

        let err = host.upload(&artifact).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_custom_without_url_is_not_configured() {
        let host = ImageHost::new(HostingSettings {
            provider: HostingProvider::Custom,
            upload_url: None,
            ..HostingSettings::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("chart.png");
        std::fs::write(&artifact, b"png-bytes").unwrap();

        let err = host.upload(&artifact).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_reported() {
        let host = ImageHost::new(HostingSettings {
            provider: HostingProvider::Imgur,
            api_key: Some("client-id".to_owned()),
            ..HostingSettings::default()
        });
        let err = host
            .upload(Path::new("/nonexistent/chart.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ArtifactNotFound(_)));
    }
}
