//! Image generation and image download.
//!
//! [`ImageService`] is the seam the mind-map pipeline talks to: one call turns
//! a prompt into an image URL, another turns a URL into bytes.
//! [`HttpImageService`] speaks the OpenAI `/v1/images/generations` protocol,
//! which most image gateways also accept.

use crate::config::GenerationConfig;
use crate::error::{PptGenError, ServiceError};
use crate::pipeline::llm::map_reqwest_error;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Where a generated image can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// The service hosts the image; fetch it with [`ImageService::fetch`].
    Url(String),
    /// The service returned the image inline (`b64_json`).
    Inline(Vec<u8>),
}

/// An image-generation backend.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Request exactly one image for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ServiceError>;

    /// Download image bytes from `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ServiceError>;
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

/// OpenAI-compatible image generation over reqwest.
#[derive(Debug, Clone)]
pub struct HttpImageService {
    client: reqwest::Client,
    download: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    size: String,
    api_timeout_secs: u64,
    download_timeout_secs: u64,
}

impl HttpImageService {
    pub fn new(config: &GenerationConfig) -> Result<Self, PptGenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| PptGenError::Internal(format!("HTTP client: {e}")))?;
        let download = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()
            .map_err(|e| PptGenError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            download,
            endpoint: config.image_endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.image_model.clone(),
            size: config.image_size.clone(),
            api_timeout_secs: config.api_timeout_secs,
            download_timeout_secs: config.download_timeout_secs,
        })
    }
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ServiceError> {
        let body = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
        };
        debug!("POST {} (model {}, size {})", self.endpoint, self.model, self.size);

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.api_timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::status(status.as_u16(), text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.api_timeout_secs))?;
        parse_image_response(&text)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        debug!("GET {}", url);
        let response = self
            .download
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.download_timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::status(status.as_u16(), ""));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, self.download_timeout_secs))?;
        Ok(bytes.to_vec())
    }
}

/// Take the first image out of an images-API response body.
pub(crate) fn parse_image_response(body: &str) -> Result<GeneratedImage, ServiceError> {
    let parsed: ImageResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
    let datum = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::MalformedResponse("empty data array".into()))?;

    match (datum.url, datum.b64_json) {
        (Some(url), _) if !url.is_empty() => Ok(GeneratedImage::Url(url)),
        (_, Some(b64)) => STANDARD
            .decode(b64.trim())
            .map(GeneratedImage::Inline)
            .map_err(|e| ServiceError::MalformedResponse(format!("b64_json: {e}"))),
        _ => Err(ServiceError::MalformedResponse(
            "data[0] has neither url nor b64_json".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_response() {
        let body = r#"{"created":1,"data":[{"url":"https://img.example/a.png"}]}"#;
        assert_eq!(
            parse_image_response(body).unwrap(),
            GeneratedImage::Url("https://img.example/a.png".into())
        );
    }

    #[test]
    fn inline_response() {
        let b64 = STANDARD.encode(b"\x89PNG fake");
        let body = format!(r#"{{"data":[{{"b64_json":"{b64}"}}]}}"#);
        assert_eq!(
            parse_image_response(&body).unwrap(),
            GeneratedImage::Inline(b"\x89PNG fake".to_vec())
        );
    }

    #[test]
    fn empty_or_malformed_response() {
        assert!(parse_image_response(r#"{"data":[]}"#).is_err());
        assert!(parse_image_response(r#"{"data":[{}]}"#).is_err());
        assert!(parse_image_response("<html>").is_err());
    }

    #[test]
    fn request_shape() {
        let req = ImageRequest {
            model: "dall-e-3",
            prompt: "@startmindmap\n* a\n@endmindmap",
            n: 1,
            size: "1024x1024",
        };
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["n"], 1);
        assert_eq!(json["size"], "1024x1024");
        assert_eq!(json["model"], "dall-e-3");
    }
}
