//! Ticket allocation workflow
//!
//! Orchestrates one payment proof submission end to end: duplicate
//! detection, participant and payment recording, verdict evaluation, and
//! contiguous ticket-number assignment.

use rifa_common::db::is_unique_violation;
use rifa_common::db::models::{PaymentStatus, Verdict};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::payments::NewPayment;
use crate::db::{participants, payments, tickets};
use crate::services::validator::{ExpectedPayment, ProofImage, ValidateProof};

/// A verdict must clear this confidence to count as approved.
pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Bound on transaction retries when concurrent submissions race for the
/// same ticket numbers.
const ALLOCATION_RETRIES: u32 = 3;

/// Workflow failure taxonomy
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Missing or malformed submission fields
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A validated payment with this reference already exists
    #[error("Duplicate payment: this reference was already registered")]
    DuplicatePayment,

    /// The validator rejected the proof, or its confidence was too low
    #[error("Payment rejected: {}", .0.details)]
    Rejected(Verdict),

    /// Store or provider failure; nothing the caller can act on
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<rifa_common::Error> for WorkflowError {
    fn from(err: rifa_common::Error) -> Self {
        WorkflowError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        WorkflowError::Internal(err.to_string())
    }
}

/// One validated submission, ready for the workflow.
///
/// Field aliases and required-field checks happen at the HTTP boundary;
/// by this point the proof is structurally sound.
#[derive(Debug, Clone)]
pub struct PaymentProof {
    pub name: String,
    pub national_id: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub quantity: u32,
    pub bank_from: Option<String>,
    pub payment_phone: Option<String>,
    pub amount_paid: f64,
    pub reference: String,
    pub image: Option<ProofImage>,
}

impl PaymentProof {
    /// Fields the validator compares the screenshot against.
    pub fn expected_payment(&self) -> ExpectedPayment {
        ExpectedPayment {
            amount: self.amount_paid,
            reference: self.reference.clone(),
            bank: self.bank_from.clone(),
            phone: self.payment_phone.clone(),
        }
    }

    /// What gets recorded in the payment row as the screenshot reference.
    pub fn screenshot_reference(&self) -> Option<&str> {
        match &self.image {
            Some(ProofImage::Url(url)) => Some(url.as_str()),
            Some(ProofImage::Inline { .. }) => Some("inline"),
            None => None,
        }
    }
}

/// Outcome of a fully accepted submission.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub participant_id: i64,
    pub payment_id: i64,
    pub ticket_numbers: Vec<i64>,
    pub verdict: Verdict,
}

/// Run one payment proof submission.
///
/// The participant row is written before validation and kept on rejection;
/// every attempt leaves an audit trail. Tickets are only ever written in the
/// same transaction as a validated payment, so a success response always
/// means every requested ticket is persisted.
pub async fn submit_payment<V: ValidateProof>(
    pool: &SqlitePool,
    validator: &V,
    proof: &PaymentProof,
) -> Result<SubmissionReceipt, WorkflowError> {
    // Fast path. The partial unique index on validated references is the
    // real guard when two submissions race past this check.
    if payments::find_validated_by_reference(pool, &proof.reference)
        .await?
        .is_some()
    {
        info!(reference = %proof.reference, "Duplicate payment reference");
        return Err(WorkflowError::DuplicatePayment);
    }

    let participant_id = participants::insert_participant(
        pool,
        &proof.name,
        proof.national_id.as_deref(),
        &proof.phone,
        proof.email.as_deref(),
    )
    .await?;

    let verdict = validator
        .validate(proof.image.as_ref(), &proof.expected_payment())
        .await;

    let accepted = verdict.valid && verdict.confidence > CONFIDENCE_THRESHOLD;
    if !accepted {
        let payment_id = payments::insert_payment(
            pool,
            &new_payment(participant_id, proof, PaymentStatus::Rejected, &verdict),
        )
        .await?;
        info!(
            payment_id,
            valid = verdict.valid,
            confidence = verdict.confidence,
            "Payment rejected"
        );
        return Err(WorkflowError::Rejected(verdict));
    }

    let (payment_id, ticket_numbers) =
        record_validated_payment(pool, participant_id, proof, &verdict).await?;

    info!(
        participant_id,
        payment_id,
        tickets = ticket_numbers.len(),
        "Payment validated and tickets allocated"
    );

    Ok(SubmissionReceipt {
        participant_id,
        payment_id,
        ticket_numbers,
        verdict,
    })
}

/// Insert the validated payment and its contiguous ticket block in one
/// transaction.
///
/// A unique violation on the payment insert means a concurrent submission
/// validated the same reference first. A unique violation on a ticket insert
/// means the numbering race was lost; the transaction rolls back (no gaps)
/// and the whole write is retried with fresh numbers.
async fn record_validated_payment(
    pool: &SqlitePool,
    participant_id: i64,
    proof: &PaymentProof,
    verdict: &Verdict,
) -> Result<(i64, Vec<i64>), WorkflowError> {
    for attempt in 1..=ALLOCATION_RETRIES {
        let mut tx = pool.begin().await?;

        let payment_id = match payments::insert_payment(
            &mut *tx,
            &new_payment(participant_id, proof, PaymentStatus::Validated, verdict),
        )
        .await
        {
            Ok(id) => id,
            Err(ref e) if is_unique_violation(e) => {
                return Err(WorkflowError::DuplicatePayment);
            }
            Err(e) => return Err(e.into()),
        };

        match tickets::allocate_batch(&mut tx, participant_id, proof.quantity).await {
            Ok(numbers) => {
                tx.commit().await?;
                return Ok((payment_id, numbers));
            }
            Err(ref e) if is_unique_violation(e) => {
                warn!(attempt, "Ticket numbering collision; retrying allocation");
                tx.rollback().await.ok();
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(WorkflowError::Internal(
        "ticket allocation kept colliding with concurrent submissions".to_string(),
    ))
}

fn new_payment<'a>(
    participant_id: i64,
    proof: &'a PaymentProof,
    status: PaymentStatus,
    verdict: &'a Verdict,
) -> NewPayment<'a> {
    NewPayment {
        participant_id,
        bank_from: proof.bank_from.as_deref(),
        payment_phone: proof.payment_phone.as_deref(),
        amount_paid: proof.amount_paid,
        reference_suffix: &proof.reference,
        screenshot_reference: proof.screenshot_reference(),
        status,
        verdict,
    }
}
