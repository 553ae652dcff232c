//! Azure Document Intelligence client.
//!
//! The production [`DocumentAnalyzer`] implementation. Analysis is a two
//! phase REST exchange: submit the document as `base64Source` to the
//! `:analyze` endpoint (HTTP 202 with an `Operation-Location` header), then
//! poll that operation URL until the service reports `succeeded`.
//!
//! ## Retry strategy
//!
//! HTTP 429 / 5xx responses on submission are transient and frequent under
//! load. Exponential backoff (`retry_backoff_ms * 2^attempt`) avoids
//! thundering-herd: with 500 ms base and 3 retries the wait sequence is
//! 500 ms → 1 s → 2 s. Other 4xx responses are configuration or input
//! problems and fail immediately. The poll loop is bounded by the
//! configured timeout so one stuck operation cannot hang a whole run.

use crate::analysis::{AnalyzeRequest, AnalyzeResponse, DocumentAnalyzer, Paragraph, Table};
use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

const DEFAULT_API_VERSION: &str = "2024-11-30";
const POLL_INTERVAL_MS: u64 = 1500;

/// Azure Document Intelligence analyzer.
#[derive(Debug)]
pub struct AzureAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    max_retries: u32,
    retry_backoff_ms: u64,
    timeout: Duration,
}

impl AzureAnalyzer {
    /// Build a client against an explicit endpoint and key.
    ///
    /// # Errors
    /// [`AnalyzeError::ServiceNotConfigured`] when either value is empty.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalyzeError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let api_key = api_key.into();
        if endpoint.is_empty() || api_key.is_empty() {
            return Err(AnalyzeError::ServiceNotConfigured {
                hint: "Provide a non-empty Azure Document Intelligence endpoint and API key."
                    .to_string(),
            });
        }

        // Per-request timeout; the poll loop enforces the overall bound.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs.max(1)))
            .build()
            .map_err(|e| AnalyzeError::Internal(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            api_version: DEFAULT_API_VERSION.to_string(),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            timeout: Duration::from_secs(config.api_timeout_secs.max(1)),
        })
    }

    /// Build a client from `AZURE_DI_ENDPOINT` / `AZURE_DI_KEY`.
    pub fn from_env(config: &AnalysisConfig) -> Result<Self, AnalyzeError> {
        let endpoint = std::env::var("AZURE_DI_ENDPOINT").unwrap_or_default();
        let api_key = std::env::var("AZURE_DI_KEY").unwrap_or_default();
        if endpoint.is_empty() || api_key.is_empty() {
            return Err(AnalyzeError::ServiceNotConfigured {
                hint: "Set AZURE_DI_ENDPOINT to your Document Intelligence endpoint URL and \
                       AZURE_DI_KEY to an API key for it."
                    .to_string(),
            });
        }
        Self::new(endpoint, api_key, config)
    }

    /// Override the service API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    fn submit_url(&self, model_id: &str) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze",
            self.endpoint, model_id
        )
    }

    fn submit_query(&self, request: &AnalyzeRequest) -> Vec<(String, String)> {
        let mut query = vec![("api-version".to_string(), self.api_version.clone())];
        if let Some(locale) = &request.locale {
            query.push(("locale".to_string(), locale.clone()));
        }
        if !request.features.is_empty() {
            let features = request
                .features
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(",");
            query.push(("features".to_string(), features));
        }
        query.push((
            "outputContentFormat".to_string(),
            request.output_format.as_str().to_string(),
        ));
        query
    }

    /// Submit the document, returning the operation URL to poll.
    async fn submit(&self, request: &AnalyzeRequest) -> Result<String, AnalyzeError> {
        let url = self.submit_url(&request.model_id);
        let query = self.submit_query(request);
        let body = serde_json::json!({ "base64Source": BASE64.encode(&request.document) });

        let mut last_err = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Analysis submit retry {}/{} after {}ms: {}",
                    attempt, self.max_retries, backoff, last_err
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            let sent = self
                .client
                .post(&url)
                .query(&query)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .json(&body)
                .send()
                .await;

            match sent {
                Ok(resp) if resp.status().is_success() => {
                    match resp
                        .headers()
                        .get("operation-location")
                        .and_then(|v| v.to_str().ok())
                    {
                        Some(location) => {
                            debug!("Analysis accepted, polling {location}");
                            return Ok(location.to_string());
                        }
                        None => {
                            last_err = "response missing Operation-Location header".to_string();
                        }
                    }
                }
                Ok(resp) => {
                    let status = resp.status();
                    let detail = resp.text().await.unwrap_or_default();
                    let msg = format!("HTTP {status}: {detail}");
                    // 429 and 5xx are transient; everything else is on us.
                    if status.as_u16() != 429 && !status.is_server_error() {
                        return Err(AnalyzeError::ServiceFailed {
                            subdocument: 0,
                            detail: msg,
                        });
                    }
                    last_err = msg;
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
        }

        Err(AnalyzeError::ServiceFailed {
            subdocument: 0,
            detail: format!("submit failed after {} retries: {last_err}", self.max_retries),
        })
    }

    /// Poll the operation URL until the analysis succeeds, fails, or the
    /// configured timeout elapses.
    async fn poll(&self, url: &str, started: Instant) -> Result<WireAnalyzeResult, AnalyzeError> {
        loop {
            if started.elapsed() > self.timeout {
                return Err(AnalyzeError::ServiceTimeout {
                    subdocument: 0,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
            }

            let operation: OperationResponse = self
                .client
                .get(url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| AnalyzeError::ServiceFailed {
                    subdocument: 0,
                    detail: format!("polling analysis operation: {e}"),
                })?
                .json()
                .await
                .map_err(|e| AnalyzeError::ServiceFailed {
                    subdocument: 0,
                    detail: format!("decoding analysis operation: {e}"),
                })?;

            match operation.status.as_str() {
                "succeeded" => {
                    return operation
                        .analyze_result
                        .ok_or_else(|| AnalyzeError::ServiceFailed {
                            subdocument: 0,
                            detail: "operation succeeded without an analyzeResult".to_string(),
                        });
                }
                "failed" => {
                    let detail = operation
                        .error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| "analysis failed without error detail".to_string());
                    return Err(AnalyzeError::ServiceFailed {
                        subdocument: 0,
                        detail,
                    });
                }
                status => {
                    debug!("Analysis operation status: {status}");
                    sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureAnalyzer {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, AnalyzeError> {
        let started = Instant::now();
        let operation_url = self.submit(&request).await?;
        let result = self.poll(&operation_url, started).await?;
        Ok(AnalyzeResponse {
            page_count: result.pages.len() as u32,
            paragraphs: result.paragraphs,
            tables: result.tables,
            raw_content: result.content,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    status: String,
    #[serde(default)]
    analyze_result: Option<WireAnalyzeResult>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireAnalyzeResult {
    pages: Vec<WirePage>,
    paragraphs: Vec<Paragraph>,
    tables: Vec<Table>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePage {
    #[serde(default)]
    #[allow(dead_code)]
    page_number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisFeature, OutputFormat};

    fn analyzer() -> AzureAnalyzer {
        AzureAnalyzer::new(
            "https://example.cognitiveservices.azure.com/",
            "secret",
            &AnalysisConfig::default(),
        )
        .unwrap()
    }

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            document: vec![1, 2, 3],
            model_id: "prebuilt-layout".to_string(),
            locale: Some("pl-PL".to_string()),
            features: vec![AnalysisFeature::StyleFont, AnalysisFeature::KeyValuePairs],
            output_format: OutputFormat::Markdown,
        }
    }

    #[test]
    fn empty_credentials_are_not_configured() {
        let err = AzureAnalyzer::new("", "key", &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::ServiceNotConfigured { .. }));
        let err = AzureAnalyzer::new("https://x", "", &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyzeError::ServiceNotConfigured { .. }));
    }

    #[test]
    fn submit_url_strips_trailing_slash() {
        let a = analyzer();
        assert_eq!(
            a.submit_url("prebuilt-layout"),
            "https://example.cognitiveservices.azure.com/documentintelligence/documentModels/prebuilt-layout:analyze"
        );
    }

    #[test]
    fn submit_query_carries_locale_features_and_format() {
        let a = analyzer();
        let query = a.submit_query(&request());
        assert!(query.contains(&("api-version".to_string(), DEFAULT_API_VERSION.to_string())));
        assert!(query.contains(&("locale".to_string(), "pl-PL".to_string())));
        assert!(query.contains(&(
            "features".to_string(),
            "styleFont,keyValuePairs".to_string()
        )));
        assert!(query.contains(&(
            "outputContentFormat".to_string(),
            "markdown".to_string()
        )));
    }

    #[test]
    fn operation_response_decodes_succeeded_shape() {
        let json = r#"{
            "status": "succeeded",
            "analyzeResult": {
                "pages": [{"pageNumber": 1}, {"pageNumber": 2}],
                "paragraphs": [{"role": "title", "content": "T",
                                "boundingRegions": [{"pageNumber": 1}]}],
                "tables": [],
                "content": "T"
            }
        }"#;
        let op: OperationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(op.status, "succeeded");
        let result = op.analyze_result.unwrap();
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.paragraphs[0].content.as_deref(), Some("T"));
    }

    #[test]
    fn operation_response_decodes_failed_shape() {
        let json = r#"{"status": "failed", "error": {"code": "InvalidRequest", "message": "bad"}}"#;
        let op: OperationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(op.status, "failed");
        assert_eq!(op.error.unwrap().code, "InvalidRequest");
    }
}
