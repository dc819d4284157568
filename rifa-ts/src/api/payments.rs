//! Payment validation endpoints
//!
//! POST /validate-payment runs the full submission workflow; POST /test-ai
//! exercises the proof validator on its own.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rifa_common::db::models::Verdict;
use serde::{Deserialize, Serialize};

use crate::services::validator::{ExpectedPayment, ProofImage, ValidateProof};
use crate::workflow::{self, PaymentProof, SubmissionReceipt, WorkflowError};
use crate::{ApiError, ApiResult, AppState};

/// POST /validate-payment request body.
///
/// Historical clients sent camelCase and a few divergent names; the aliases
/// fold them into one canonical schema at the boundary.
#[derive(Debug, Default, Deserialize)]
pub struct ValidatePaymentRequest {
    pub name: Option<String>,
    #[serde(default, alias = "cedula", alias = "nationalId")]
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub quantity: Option<u32>,
    #[serde(default, alias = "bankFrom", alias = "bank")]
    pub bank_from: Option<String>,
    #[serde(default, alias = "paymentPhone")]
    pub payment_phone: Option<String>,
    #[serde(default, alias = "amountPaid", alias = "amount")]
    pub amount_paid: Option<f64>,
    pub reference: Option<String>,
    #[serde(default, alias = "screenshotUrl")]
    pub screenshot_url: Option<String>,
    #[serde(default, alias = "inlineImage")]
    pub inline_image: Option<String>,
    #[serde(default, alias = "inlineImageMime")]
    pub inline_image_mime: Option<String>,
}

impl TryFrom<ValidatePaymentRequest> for PaymentProof {
    type Error = WorkflowError;

    fn try_from(request: ValidatePaymentRequest) -> Result<Self, Self::Error> {
        let name = required_text(request.name, "name")?;
        let phone = required_text(request.phone, "phone")?;
        let reference = required_text(request.reference, "reference")?;

        let amount_paid = request
            .amount_paid
            .ok_or_else(|| WorkflowError::InvalidRequest("amount_paid is required".to_string()))?;
        if amount_paid <= 0.0 {
            return Err(WorkflowError::InvalidRequest(
                "amount_paid must be positive".to_string(),
            ));
        }

        let quantity = request
            .quantity
            .ok_or_else(|| WorkflowError::InvalidRequest("quantity is required".to_string()))?;
        if quantity < 1 {
            return Err(WorkflowError::InvalidRequest(
                "quantity must be at least 1".to_string(),
            ));
        }

        let image = if let Some(url) = request.screenshot_url.filter(|u| !u.trim().is_empty()) {
            Some(ProofImage::Url(url))
        } else if let Some(data) = request.inline_image.filter(|d| !d.trim().is_empty()) {
            Some(ProofImage::Inline {
                mime_type: request
                    .inline_image_mime
                    .unwrap_or_else(|| "image/jpeg".to_string()),
                data,
            })
        } else {
            None
        };

        Ok(PaymentProof {
            name,
            national_id: request.national_id,
            phone,
            email: request.email,
            quantity,
            bank_from: request.bank_from,
            payment_phone: request.payment_phone,
            amount_paid,
            reference,
            image,
        })
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, WorkflowError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(WorkflowError::InvalidRequest(format!(
            "{} is required",
            field
        ))),
    }
}

/// POST /validate-payment response
#[derive(Debug, Serialize)]
pub struct ValidatePaymentResponse {
    pub success: bool,
    #[serde(rename = "ticketNumbers", skip_serializing_if = "Option::is_none")]
    pub ticket_numbers: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "aiResult", skip_serializing_if = "Option::is_none")]
    pub ai_result: Option<Verdict>,
}

impl ValidatePaymentResponse {
    fn accepted(ticket_numbers: Vec<i64>) -> Self {
        Self {
            success: true,
            ticket_numbers: Some(ticket_numbers),
            error: None,
            ai_result: None,
        }
    }

    fn rejected(error: String, verdict: Option<Verdict>) -> Self {
        Self {
            success: false,
            ticket_numbers: None,
            error: Some(error),
            ai_result: verdict,
        }
    }
}

/// POST /validate-payment
///
/// Business rejections (duplicate reference, failed validation) come back
/// 200 with `success: false`; only malformed requests and internal failures
/// use error status codes.
pub async fn validate_payment(
    State(state): State<AppState>,
    Json(request): Json<ValidatePaymentRequest>,
) -> ApiResult<Json<ValidatePaymentResponse>> {
    let proof = PaymentProof::try_from(request).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match workflow::submit_payment(&state.db, state.validator.as_ref(), &proof).await {
        Ok(receipt) => {
            state
                .notifier
                .dispatch(format_submission_message(&proof, &receipt));
            Ok(Json(ValidatePaymentResponse::accepted(
                receipt.ticket_numbers,
            )))
        }
        Err(WorkflowError::InvalidRequest(message)) => Err(ApiError::BadRequest(message)),
        Err(WorkflowError::DuplicatePayment) => Ok(Json(ValidatePaymentResponse::rejected(
            "Duplicate payment: this reference was already registered".to_string(),
            None,
        ))),
        Err(WorkflowError::Rejected(verdict)) => Ok(Json(ValidatePaymentResponse::rejected(
            verdict.details.clone(),
            Some(verdict),
        ))),
        Err(WorkflowError::Internal(message)) => {
            tracing::error!("Payment submission failed: {}", message);
            Err(ApiError::Internal(
                "internal error, please try again".to_string(),
            ))
        }
    }
}

fn format_submission_message(proof: &PaymentProof, receipt: &SubmissionReceipt) -> String {
    let numbers = receipt
        .ticket_numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "🎫 *New participation*\n\n\
         👤 {}\n\
         🪪 {}\n\
         📱 {}\n\
         📧 {}\n\n\
         💰 Bs. {:.2}\n\
         🏦 {}\n\
         🔢 Ref: ...{}\n\n\
         🎰 Tickets: {}\n\
         ✅ Confidence: {:.0}%",
        proof.name,
        proof.national_id.as_deref().unwrap_or("N/A"),
        proof.phone,
        proof.email.as_deref().unwrap_or("N/A"),
        proof.amount_paid,
        proof.bank_from.as_deref().unwrap_or("N/A"),
        proof.reference,
        numbers,
        receipt.verdict.confidence * 100.0,
    )
}

/// Echo of the expected fields sent to the validator by /test-ai.
#[derive(Debug, Serialize)]
pub struct TestData {
    pub amount: f64,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// POST /test-ai response
#[derive(Debug, Serialize)]
pub struct TestAiResponse {
    pub success: bool,
    #[serde(rename = "testData")]
    pub test_data: TestData,
    #[serde(rename = "aiResult")]
    pub ai_result: Verdict,
}

/// POST /test-ai
///
/// Operator tool: run the validator against an uploaded screenshot and the
/// given expected fields without touching the database.
pub async fn test_ai(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<TestAiResponse>> {
    let mut image: Option<ProofImage> = None;
    let mut amount: Option<f64> = None;
    let mut reference: Option<String> = None;
    let mut bank: Option<String> = None;
    let mut phone: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let mime_type = field.content_type().unwrap_or("image/jpeg").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
                image = Some(ProofImage::Inline {
                    mime_type,
                    data: BASE64.encode(&bytes),
                });
            }
            Some("amount") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read field: {}", e)))?;
                amount = Some(text.trim().parse().map_err(|_| {
                    ApiError::BadRequest("amount must be a number".to_string())
                })?);
            }
            Some("reference") => {
                reference = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read field: {}", e))
                })?);
            }
            Some("bank") => {
                bank = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read field: {}", e))
                })?);
            }
            Some("phone") => {
                phone = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read field: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let (Some(amount), Some(reference)) = (amount, reference) else {
        return Err(ApiError::BadRequest(
            "amount and reference are required".to_string(),
        ));
    };

    let expected = ExpectedPayment {
        amount,
        reference: reference.clone(),
        bank: bank.clone(),
        phone: phone.clone(),
    };
    let ai_result = state.validator.validate(image.as_ref(), &expected).await;

    Ok(Json(TestAiResponse {
        success: true,
        test_data: TestData {
            amount,
            reference,
            bank,
            phone,
        },
        ai_result,
    }))
}

/// Build payment routes
pub fn payments_routes() -> Router<AppState> {
    Router::new()
        .route("/validate-payment", post(validate_payment))
        .route("/test-ai", post(test_ai))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> serde_json::Value {
        serde_json::json!({
            "name": "Ana Pérez",
            "cedula": "V-12345678",
            "phone": "04141234567",
            "quantity": 2,
            "bankFrom": "Banco de Venezuela",
            "paymentPhone": "04140000000",
            "amountPaid": 500.0,
            "reference": "4321",
            "screenshotUrl": "https://example.test/proof.png",
        })
    }

    #[test]
    fn test_aliases_resolve_to_canonical_fields() {
        let request: ValidatePaymentRequest =
            serde_json::from_value(full_request()).unwrap();
        let proof = PaymentProof::try_from(request).unwrap();

        assert_eq!(proof.national_id.as_deref(), Some("V-12345678"));
        assert_eq!(proof.bank_from.as_deref(), Some("Banco de Venezuela"));
        assert_eq!(proof.amount_paid, 500.0);
        assert!(matches!(proof.image, Some(ProofImage::Url(_))));
    }

    #[test]
    fn test_snake_case_fields_also_accepted() {
        let request: ValidatePaymentRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "phone": "0414",
            "quantity": 1,
            "bank_from": "Banesco",
            "amount_paid": 100.0,
            "reference": "9911",
        }))
        .unwrap();
        let proof = PaymentProof::try_from(request).unwrap();

        assert_eq!(proof.bank_from.as_deref(), Some("Banesco"));
        assert!(proof.image.is_none());
    }

    #[test]
    fn test_missing_name_is_invalid() {
        let mut value = full_request();
        value.as_object_mut().unwrap().remove("name");
        let request: ValidatePaymentRequest = serde_json::from_value(value).unwrap();

        assert!(matches!(
            PaymentProof::try_from(request),
            Err(WorkflowError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_zero_quantity_is_invalid() {
        let mut value = full_request();
        value["quantity"] = serde_json::json!(0);
        let request: ValidatePaymentRequest = serde_json::from_value(value).unwrap();

        assert!(matches!(
            PaymentProof::try_from(request),
            Err(WorkflowError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_non_positive_amount_is_invalid() {
        let mut value = full_request();
        value["amountPaid"] = serde_json::json!(-5.0);
        let request: ValidatePaymentRequest = serde_json::from_value(value).unwrap();

        assert!(matches!(
            PaymentProof::try_from(request),
            Err(WorkflowError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_inline_image_defaults_to_jpeg() {
        let request: ValidatePaymentRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "phone": "0414",
            "quantity": 1,
            "amountPaid": 100.0,
            "reference": "9911",
            "inlineImage": "aGVsbG8=",
        }))
        .unwrap();
        let proof = PaymentProof::try_from(request).unwrap();

        match proof.image {
            Some(ProofImage::Inline { ref mime_type, .. }) => {
                assert_eq!(mime_type, "image/jpeg")
            }
            _ => panic!("expected inline image"),
        }
    }
}
