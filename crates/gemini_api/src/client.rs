use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::GeminiApiConfig;
use crate::error::{status_error, GeminiApiError};
use crate::payload::{GenerateContentRequest, GenerateContentResponse, Operation, PredictLongRunningRequest};
use crate::url::{model_endpoint, normalize_base_url, operation_endpoint};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug)]
pub struct GeminiApiClient {
    http: Client,
    config: GeminiApiConfig,
    base_url: String,
}

/// Media bytes fetched from a provider-hosted URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedMedia {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl GeminiApiClient {
    pub fn new(config: GeminiApiConfig) -> Result<Self, GeminiApiError> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiApiError::MissingApiKey);
        }

        let base_url = normalize_base_url(&config.base_url);
        reqwest::Url::parse(&base_url)
            .map_err(|error| GeminiApiError::InvalidBaseUrl(format!("{base_url}: {error}")))?;

        let mut builder = Client::builder().default_headers(default_headers(&config)?);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(GeminiApiError::from)?;

        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    pub fn config(&self) -> &GeminiApiConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<RequestBuilder, GeminiApiError> {
        validate_generate_content(request)?;
        Ok(self
            .http
            .post(model_endpoint(&self.base_url, model, "generateContent"))
            .json(request))
    }

    /// One `generateContent` call. No retries happen at this layer.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiApiError> {
        let response = self.build_generate_content(model, request)?.send().await?;
        read_json(response).await
    }

    /// Starts a video job and returns its operation handle.
    pub async fn start_video_generation(
        &self,
        model: &str,
        request: &PredictLongRunningRequest,
    ) -> Result<Operation, GeminiApiError> {
        let response = self
            .http
            .post(model_endpoint(&self.base_url, model, "predictLongRunning"))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn get_operation(&self, name: &str) -> Result<Operation, GeminiApiError> {
        let response = self
            .http
            .get(operation_endpoint(&self.base_url, name))
            .send()
            .await?;
        let operation: Operation = read_json(response).await?;
        if let Some(error) = operation.error.as_ref().filter(|_| operation.done) {
            return Err(GeminiApiError::OperationFailed {
                code: error.code,
                message: error
                    .message
                    .clone()
                    .unwrap_or_else(|| "video operation failed".to_string()),
            });
        }
        Ok(operation)
    }

    /// Fetches provider-hosted media. The API key header is attached, which the
    /// files endpoint requires.
    pub async fn download(&self, uri: &str) -> Result<DownloadedMedia, GeminiApiError> {
        let response = self.http.get(uri).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| !value.is_empty());
        let bytes = response.bytes().await?.to_vec();
        Ok(DownloadedMedia { bytes, mime_type })
    }
}

fn default_headers(config: &GeminiApiConfig) -> Result<HeaderMap, GeminiApiError> {
    let mut headers = HeaderMap::new();
    let mut key = HeaderValue::from_str(config.api_key.trim())
        .map_err(|_| GeminiApiError::Unknown("API key contains invalid header characters".to_string()))?;
    key.set_sensitive(true);
    headers.insert(API_KEY_HEADER, key);

    if let Some(user_agent) = config.user_agent.as_deref() {
        let value = HeaderValue::from_str(user_agent)
            .map_err(|_| GeminiApiError::Unknown(format!("invalid user agent: {user_agent}")))?;
        headers.insert(USER_AGENT, value);
    }
    Ok(headers)
}

fn validate_generate_content(request: &GenerateContentRequest) -> Result<(), GeminiApiError> {
    let has_parts = request
        .contents
        .iter()
        .any(|content| !content.parts.is_empty());
    if has_parts {
        return Ok(());
    }

    Err(GeminiApiError::Unknown(
        "generateContent requires at least one content part".to_string(),
    ))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GeminiApiError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    serde_json::from_str(&body).map_err(GeminiApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Part;

    #[test]
    fn new_rejects_blank_api_key() {
        let error = GeminiApiClient::new(GeminiApiConfig::new("  ")).expect_err("blank key");
        assert!(matches!(error, GeminiApiError::MissingApiKey));
    }

    #[test]
    fn new_rejects_unparseable_base_url() {
        let error = GeminiApiClient::new(GeminiApiConfig::new("key").with_base_url("not a url"))
            .expect_err("invalid url");
        assert!(matches!(error, GeminiApiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn generate_content_preflight_rejects_empty_parts() {
        let client = GeminiApiClient::new(GeminiApiConfig::new("key")).expect("client");
        let request = GenerateContentRequest::user_turn(Vec::new(), None);

        assert!(client.build_generate_content("m", &request).is_err());

        let request = GenerateContentRequest::user_turn(vec![Part::text("hi")], None);
        assert!(client.build_generate_content("m", &request).is_ok());
    }
}
