// Contact inquiry form model

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Estimated budget options offered by the form
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    #[default]
    Under10k,
    From10kTo25k,
    From25kTo50k,
    Over50k,
}

impl Budget {
    pub const ALL: [Budget; 4] = [
        Budget::Under10k,
        Budget::From10kTo25k,
        Budget::From25kTo50k,
        Budget::Over50k,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Budget::Under10k => "Under $10k",
            Budget::From10kTo25k => "$10k - $25k",
            Budget::From25kTo50k => "$25k - $50k",
            Budget::Over50k => "$50k+",
        }
    }

    pub fn from_label(label: &str) -> Option<Budget> {
        Budget::ALL.into_iter().find(|b| b.label() == label.trim())
    }
}

/// A field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryField {
    Name,
    Email,
    Brief,
}

impl InquiryField {
    pub fn label(&self) -> &'static str {
        match self {
            InquiryField::Name => "Full Name",
            InquiryField::Email => "Email Address",
            InquiryField::Brief => "Project Brief",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InquiryForm {
    pub name: String,
    pub email: String,
    /// Optional company or brand
    #[serde(default)]
    pub company: String,
    pub brief: String,
    #[serde(default)]
    pub budget: Budget,
}

impl InquiryForm {
    /// Returns every field that is missing or malformed, in form order
    pub fn invalid_fields(&self) -> Vec<InquiryField> {
        let mut invalid = Vec::new();
        if self.name.trim().is_empty() {
            invalid.push(InquiryField::Name);
        }
        if !is_plausible_email(&self.email) {
            invalid.push(InquiryField::Email);
        }
        if self.brief.trim().is_empty() {
            invalid.push(InquiryField::Brief);
        }
        invalid
    }
}

fn is_plausible_email(email: &str) -> bool {
    match EMAIL_PATTERN.as_ref() {
        Some(re) => re.is_match(email.trim()),
        None => email.contains('@'),
    }
}
