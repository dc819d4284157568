//! Payment proof validator
//!
//! Sends the payment screenshot and the expected transfer fields to a
//! multimodal model and turns the answer into a structured verdict. The
//! workflow always receives a `Verdict`: provider errors, malformed model
//! output, and timeouts all become rejections with the cause in `details`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rifa_common::db::models::Verdict;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const GENERATE_CONTENT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";

/// Confidence reported when no validator is configured. Sits above the
/// workflow's acceptance threshold: an unconfigured validator approves.
const STUB_CONFIDENCE: f64 = 0.7;

/// Validator client errors
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Malformed verdict from provider: {0}")]
    MalformedVerdict(String),

    #[error("No payment screenshot provided")]
    MissingImage,
}

/// Expected transfer fields the screenshot must match.
#[derive(Debug, Clone)]
pub struct ExpectedPayment {
    pub amount: f64,
    pub reference: String,
    pub bank: Option<String>,
    pub phone: Option<String>,
}

/// Screenshot handed to the validator.
#[derive(Debug, Clone)]
pub enum ProofImage {
    /// Reachable object URL; fetched before validation.
    Url(String),
    /// Base64 payload sent by the client directly.
    Inline { mime_type: String, data: String },
}

/// The workflow's seam: anything that can turn a proof into a verdict.
///
/// Implementations must be infallible; every failure mode is expressed as a
/// rejecting verdict.
pub trait ValidateProof {
    fn validate(
        &self,
        image: Option<&ProofImage>,
        expected: &ExpectedPayment,
    ) -> impl std::future::Future<Output = Verdict> + Send;
}

/// Payment proof validator client
#[derive(Clone)]
pub struct ProofValidator {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl ProofValidator {
    pub fn new(
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ValidatorError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidatorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            model,
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl ValidateProof for ProofValidator {
    /// Validate a payment proof. Never fails: every outcome is a verdict.
    async fn validate(&self, image: Option<&ProofImage>, expected: &ExpectedPayment) -> Verdict {
        let Some(api_key) = self.api_key.clone() else {
            warn!("Proof validator not configured; approving without inspection");
            return Verdict {
                valid: true,
                confidence: STUB_CONFIDENCE,
                details: "validator not configured; proof approved without inspection"
                    .to_string(),
            };
        };

        let call = self.request_verdict(&api_key, image, expected);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(verdict)) => {
                info!(
                    valid = verdict.valid,
                    confidence = verdict.confidence,
                    "Proof validation verdict received"
                );
                verdict
            }
            Ok(Err(e)) => {
                warn!("Proof validation failed: {}", e);
                Verdict {
                    valid: false,
                    confidence: 0.0,
                    details: format!("validation failed: {}", e),
                }
            }
            Err(_) => {
                warn!("Proof validation timed out after {:?}", self.timeout);
                Verdict {
                    valid: false,
                    confidence: 0.0,
                    details: "validation timed out".to_string(),
                }
            }
        }
    }
}

impl ProofValidator {
    async fn request_verdict(
        &self,
        api_key: &str,
        image: Option<&ProofImage>,
        expected: &ExpectedPayment,
    ) -> Result<Verdict, ValidatorError> {
        let image = image.ok_or(ValidatorError::MissingImage)?;
        let (mime_type, data) = self.image_payload(image).await?;

        let url = format!(
            "{}/{}:generateContent?key={}",
            GENERATE_CONTENT_BASE_URL, self.model, api_key
        );
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": verdict_prompt(expected) },
                    { "inline_data": { "mime_type": mime_type, "data": data } },
                ]
            }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        debug!(model = %self.model, "Querying proof validation model");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ValidatorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ValidatorError::Api(status.as_u16(), error_text));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ValidatorError::MalformedVerdict(e.to_string()))?;

        parse_verdict(&payload)
    }

    async fn image_payload(&self, image: &ProofImage) -> Result<(String, String), ValidatorError> {
        match image {
            ProofImage::Inline { mime_type, data } => Ok((mime_type.clone(), data.clone())),
            ProofImage::Url(url) => {
                debug!("Fetching payment screenshot: {}", url);
                let response = self
                    .http_client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ValidatorError::Network(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ValidatorError::Api(
                        status.as_u16(),
                        format!("screenshot fetch failed: {}", url),
                    ));
                }

                let mime_type = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("image/jpeg")
                    .to_string();
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ValidatorError::Network(e.to_string()))?;

                Ok((mime_type, BASE64.encode(&bytes)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Extract and strictly parse the verdict from the model response.
///
/// The model is instructed to answer with bare JSON; anything that does not
/// parse into the verdict schema is a provider failure, not a crash.
fn parse_verdict(response: &GenerateContentResponse) -> Result<Verdict, ValidatorError> {
    let text = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.as_deref())
        .ok_or_else(|| {
            ValidatorError::MalformedVerdict("response carried no text part".to_string())
        })?;

    let verdict: Verdict = serde_json::from_str(text.trim())
        .map_err(|e| ValidatorError::MalformedVerdict(e.to_string()))?;

    if !(0.0..=1.0).contains(&verdict.confidence) {
        return Err(ValidatorError::MalformedVerdict(format!(
            "confidence {} outside [0, 1]",
            verdict.confidence
        )));
    }

    Ok(verdict)
}

fn verdict_prompt(expected: &ExpectedPayment) -> String {
    format!(
        "You are reviewing a bank transfer screenshot for a raffle ticket purchase.\n\
         Expected amount: Bs. {:.2}\n\
         Expected reference ending in: {}\n\
         Expected bank: {}\n\
         Expected payer phone: {}\n\
         Answer with a single JSON object and no prose: \
         {{\"valid\": boolean, \"confidence\": number between 0 and 1, \
         \"details\": short explanation}}. \
         Set valid to true only if the screenshot plausibly shows this transfer.",
        expected.amount,
        expected.reference,
        expected.bank.as_deref().unwrap_or("not specified"),
        expected.phone.as_deref().unwrap_or("not specified"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> ExpectedPayment {
        ExpectedPayment {
            amount: 500.0,
            reference: "4321".to_string(),
            bank: Some("Banco de Venezuela".to_string()),
            phone: Some("04141234567".to_string()),
        }
    }

    fn response_with_text(text: &str) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![Candidate {
                content: Some(CandidateContent {
                    parts: vec![CandidatePart {
                        text: Some(text.to_string()),
                    }],
                }),
            }],
        }
    }

    #[tokio::test]
    async fn test_unconfigured_validator_approves_with_stub_verdict() {
        let validator =
            ProofValidator::new(None, "gemini-1.5-flash".to_string(), Duration::from_secs(5))
                .unwrap();

        let verdict = validator.validate(None, &expected()).await;

        assert!(verdict.valid);
        assert!(verdict.confidence > 0.6, "stub must clear the threshold");
    }

    #[test]
    fn test_parse_verdict_accepts_strict_json() {
        let response = response_with_text(
            r#"{"valid": true, "confidence": 0.92, "details": "amount and reference match"}"#,
        );

        let verdict = parse_verdict(&response).unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.confidence, 0.92);
    }

    #[test]
    fn test_parse_verdict_rejects_fenced_markdown() {
        // The old service stripped markdown fences by hand; here fenced
        // output is a provider failure.
        let response = response_with_text(
            "```json\n{\"valid\": true, \"confidence\": 0.9, \"details\": \"ok\"}\n```",
        );

        assert!(matches!(
            parse_verdict(&response),
            Err(ValidatorError::MalformedVerdict(_))
        ));
    }

    #[test]
    fn test_parse_verdict_rejects_out_of_range_confidence() {
        let response =
            response_with_text(r#"{"valid": true, "confidence": 7.5, "details": "ok"}"#);

        assert!(matches!(
            parse_verdict(&response),
            Err(ValidatorError::MalformedVerdict(_))
        ));
    }

    #[test]
    fn test_parse_verdict_rejects_empty_response() {
        let response = GenerateContentResponse { candidates: vec![] };

        assert!(matches!(
            parse_verdict(&response),
            Err(ValidatorError::MalformedVerdict(_))
        ));
    }

    #[test]
    fn test_prompt_names_the_expected_fields() {
        let prompt = verdict_prompt(&expected());
        assert!(prompt.contains("500.00"));
        assert!(prompt.contains("4321"));
        assert!(prompt.contains("Banco de Venezuela"));
    }
}
