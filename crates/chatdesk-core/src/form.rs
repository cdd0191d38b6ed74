//! Sequential contact-form collection
//!
//! The collector walks an ordered list of fields. Each accepted value moves
//! the cursor forward; once the last field is stored the complete draft is
//! handed back for submission exactly once.

use chatdesk_api::ContactForm;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\s()-]{6,20}$").unwrap());

/// A contact field the server may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Name,
    Email,
    Phone,
    Company,
    Interest,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Name => "name",
            FieldKind::Email => "email",
            FieldKind::Phone => "phone",
            FieldKind::Company => "company",
            FieldKind::Interest => "interest",
        }
    }

    /// Parse a field name as sent by the server
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "name" => Some(FieldKind::Name),
            "email" => Some(FieldKind::Email),
            "phone" => Some(FieldKind::Phone),
            "company" => Some(FieldKind::Company),
            "interest" => Some(FieldKind::Interest),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display and validation settings of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub label: &'static str,
    pub placeholder: &'static str,
    /// Question shown when the client asks for the field itself
    pub prompt: &'static str,
    pub required: bool,
}

impl FieldSpec {
    pub fn for_kind(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Name => Self {
                kind,
                label: "Name",
                placeholder: "Your full name",
                prompt: "What is your name?",
                required: true,
            },
            FieldKind::Email => Self {
                kind,
                label: "Email",
                placeholder: "your@email.com",
                prompt: "What email address can we reach you at?",
                required: true,
            },
            FieldKind::Phone => Self {
                kind,
                label: "Phone",
                placeholder: "Your phone number",
                prompt: "What is your phone number?",
                required: true,
            },
            FieldKind::Company => Self {
                kind,
                label: "Company",
                placeholder: "Your company name",
                prompt: "Which company do you work for?",
                required: true,
            },
            FieldKind::Interest => Self {
                kind,
                label: "Interest",
                placeholder: "What are you interested in?",
                prompt: "Which products or services are you interested in?",
                required: false,
            },
        }
    }

    /// Validate raw input, returning the value to store or the reason it was rejected
    pub fn validate(&self, input: &str) -> std::result::Result<String, String> {
        let value = input.trim();

        if value.is_empty() {
            return if self.required {
                Err(format!("{} is required", self.label))
            } else {
                Ok(String::new())
            };
        }

        match self.kind {
            FieldKind::Email if !EMAIL_RE.is_match(value) => {
                Err("Please enter a valid email address".to_string())
            }
            FieldKind::Phone if !PHONE_RE.is_match(value) => {
                Err("Please enter a valid phone number".to_string())
            }
            _ => Ok(value.to_string()),
        }
    }
}

/// What happens to the draft when the server rejects a submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Discard the draft
    #[default]
    Clear,
    /// Keep the draft so it can be resubmitted with `/retry`
    Retain,
}

/// Form collection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Field order
    pub fields: Vec<FieldKind>,
    pub on_failure: FailurePolicy,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            fields: vec![
                FieldKind::Name,
                FieldKind::Email,
                FieldKind::Phone,
                FieldKind::Company,
                FieldKind::Interest,
            ],
            on_failure: FailurePolicy::Clear,
        }
    }
}

/// Values collected so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    values: BTreeMap<FieldKind, String>,
}

impl ContactDraft {
    /// Value stored for a field
    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        self.values.get(&kind).map(String::as_str)
    }

    /// Store a validated value, replacing any earlier one
    pub fn set(&mut self, kind: FieldKind, value: impl Into<String>) {
        self.values.insert(kind, value.into());
    }

    /// Whether a field already has a value
    pub fn contains(&self, kind: FieldKind) -> bool {
        self.values.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of fields with a value
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Drop every stored value
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Build the payload posted to the contact endpoint
    pub fn to_form(&self) -> ContactForm {
        let value = |kind| self.get(kind).unwrap_or_default().to_string();
        ContactForm {
            name: value(FieldKind::Name),
            email: value(FieldKind::Email),
            phone: value(FieldKind::Phone),
            company: value(FieldKind::Company),
            interest: value(FieldKind::Interest),
        }
    }

    /// Fill the draft from an inferred form; empty values are left unset
    pub fn from_form(form: &ContactForm) -> Self {
        let mut draft = Self::default();
        for (kind, value) in [
            (FieldKind::Name, &form.name),
            (FieldKind::Email, &form.email),
            (FieldKind::Phone, &form.phone),
            (FieldKind::Company, &form.company),
            (FieldKind::Interest, &form.interest),
        ] {
            if !value.is_empty() {
                draft.set(kind, value.clone());
            }
        }
        draft
    }
}

/// Collector state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// No form open
    Idle,
    /// Waiting for the field at this index
    Collecting(usize),
    /// The complete draft has been handed out for submission
    Submitting,
}

/// Result of feeding a value into the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Value rejected; the same field stays active
    Invalid { spec: FieldSpec, reason: String },
    /// Value stored; this field is next
    Next(FieldSpec),
    /// Last field stored; submit this form
    Complete(ContactForm),
}

/// Sequential form collector
#[derive(Debug, Clone)]
pub struct FormCollector {
    config: FormConfig,
    draft: ContactDraft,
    state: FormState,
}

impl FormCollector {
    /// Create an idle collector for the configured fields
    pub fn new(config: FormConfig) -> Self {
        Self {
            config,
            draft: ContactDraft::default(),
            state: FormState::Idle,
        }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Current collector state
    pub fn state(&self) -> FormState {
        self.state
    }

    /// Values collected so far, or kept after a failed submission
    pub fn draft(&self) -> &ContactDraft {
        &self.draft
    }

    /// Whether user input goes to a field
    pub fn is_collecting(&self) -> bool {
        matches!(self.state, FormState::Collecting(_))
    }

    /// Whether a complete draft is waiting for the server's answer
    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    /// Field currently being collected
    pub fn current_field(&self) -> Option<FieldSpec> {
        match self.state {
            FormState::Collecting(i) => self.config.fields.get(i).copied().map(FieldSpec::for_kind),
            _ => None,
        }
    }

    fn first_missing(&self, upto: usize) -> Option<usize> {
        self.config.fields[..=upto]
            .iter()
            .position(|kind| !self.draft.contains(*kind))
    }

    /// Begin collecting from the first missing field
    pub fn start(&mut self) -> Option<FieldSpec> {
        if self.is_submitting() || self.config.fields.is_empty() {
            return None;
        }
        let index = self
            .first_missing(self.config.fields.len() - 1)
            .unwrap_or(0);
        self.state = FormState::Collecting(index);
        self.current_field()
    }

    /// Activate a field requested by the server.
    ///
    /// The cursor lands on the first missing field at or before the requested
    /// one. Unknown field names and requests during submission are ignored.
    pub fn activate(&mut self, field: &str) -> Option<FieldSpec> {
        if self.is_submitting() {
            tracing::debug!("ignoring field request '{}' during submission", field);
            return None;
        }
        let Some(kind) = FieldKind::parse(field) else {
            tracing::warn!("server requested unknown field '{}'", field);
            return None;
        };
        let Some(index) = self.config.fields.iter().position(|k| *k == kind) else {
            tracing::warn!("server requested field '{}' which is not configured", field);
            return None;
        };

        let cursor = self.first_missing(index).unwrap_or(index);
        self.state = FormState::Collecting(cursor);
        self.current_field()
    }

    /// Feed a user message into the active field; `None` when not collecting
    pub fn submit_value(&mut self, input: &str) -> Option<FieldOutcome> {
        let FormState::Collecting(index) = self.state else {
            return None;
        };
        let spec = FieldSpec::for_kind(*self.config.fields.get(index)?);

        let value = match spec.validate(input) {
            Ok(value) => value,
            Err(reason) => return Some(FieldOutcome::Invalid { spec, reason }),
        };
        self.draft.set(spec.kind, value);

        let next = index + 1;
        match self.config.fields.get(next) {
            Some(kind) => {
                self.state = FormState::Collecting(next);
                Some(FieldOutcome::Next(FieldSpec::for_kind(*kind)))
            }
            None => {
                self.state = FormState::Submitting;
                Some(FieldOutcome::Complete(self.draft.to_form()))
            }
        }
    }

    /// Enter submission with a form inferred from free text
    pub fn submit_direct(&mut self, form: &ContactForm) {
        self.draft = ContactDraft::from_form(form);
        self.state = FormState::Submitting;
    }

    /// Record the submission result. Returns whether the draft was kept.
    pub fn finish_submission(&mut self, success: bool) -> bool {
        self.state = FormState::Idle;
        let retain = !success && self.config.on_failure == FailurePolicy::Retain;
        if !retain {
            self.draft.clear();
        }
        retain
    }

    /// Resubmit a retained draft
    pub fn retry(&mut self) -> Option<ContactForm> {
        if self.state != FormState::Idle || self.draft.is_empty() {
            return None;
        }
        self.state = FormState::Submitting;
        Some(self.draft.to_form())
    }

    /// Drop the draft and return to idle
    pub fn reset(&mut self) {
        self.draft.clear();
        self.state = FormState::Idle;
    }
}
