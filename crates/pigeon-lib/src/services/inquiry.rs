// Inquiry Desk
// Contact form submission with a short-lived "sent" confirmation. Delivery is
// simulated; nothing leaves the process.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{InquiryField, InquiryForm};

/// How long the confirmation banner stays up
pub const SENT_BANNER_SECS: i64 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InquiryError {
    #[error("Please check: {}", field_list(.0))]
    Invalid(Vec<InquiryField>),
}

fn field_list(fields: &[InquiryField]) -> String {
    fields.iter().map(|f| f.label()).collect::<Vec<_>>().join(", ")
}

pub type InquiryResult<T> = Result<T, InquiryError>;

/// Acknowledgement for an accepted inquiry
#[derive(Debug, Clone, PartialEq)]
pub struct InquiryReceipt {
    pub id: Uuid,
    pub sent_at: DateTime<Utc>,
    pub form: InquiryForm,
}

#[derive(Debug, Default)]
pub struct InquiryDesk {
    last_sent: Option<DateTime<Utc>>,
    sent: Vec<InquiryReceipt>,
}

impl InquiryDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, form: InquiryForm, now: DateTime<Utc>) -> InquiryResult<InquiryReceipt> {
        let invalid = form.invalid_fields();
        if !invalid.is_empty() {
            return Err(InquiryError::Invalid(invalid));
        }

        let receipt = InquiryReceipt {
            id: Uuid::new_v4(),
            sent_at: now,
            form,
        };
        log::info!(
            "[inquiry] {} sent an inquiry ({})",
            receipt.form.name.trim(),
            receipt.form.budget.label()
        );
        self.last_sent = Some(now);
        self.sent.push(receipt.clone());
        Ok(receipt)
    }

    /// Whether the confirmation banner is showing at `now`
    pub fn is_sent_at(&self, now: DateTime<Utc>) -> bool {
        match self.last_sent {
            Some(sent_at) => now >= sent_at && now - sent_at < Duration::seconds(SENT_BANNER_SECS),
            None => false,
        }
    }

    pub fn sent(&self) -> &[InquiryReceipt] {
        &self.sent
    }
}
