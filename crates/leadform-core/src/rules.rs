//! Rule generation for lead forms.
//!
//! The rule set for a form is derived from a [`FormState`] snapshot and is
//! always rebuilt in full; nothing here patches an existing set.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dom::{FieldSelector, Form, FormId, classes};
use crate::mode::ContactMode;

/// Digits required in a complete phone number (country code included).
pub const PHONE_DIGITS: usize = 11;

static EMAIL_SHAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// One constraint on a field value.
///
/// Every check except `Required` passes on an empty value; emptiness is the
/// business of the `Required` check layered in front of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Check {
    Required,
    MinLength { value: usize },
    Email,
    /// Custom predicate: exactly `digits` digits once non-digits are stripped.
    PhoneDigits { digits: usize },
}

impl Check {
    pub fn passes(&self, value: &str) -> bool {
        let trimmed = value.trim();
        match self {
            Check::Required => !trimmed.is_empty(),
            _ if trimmed.is_empty() => true,
            Check::MinLength { value: min } => trimmed.chars().count() >= *min,
            Check::Email => is_email_shaped(trimmed),
            Check::PhoneDigits { digits } => phone_digits(trimmed).len() == *digits,
        }
    }
}

/// A check with the message shown when it fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleCheck {
    #[serde(flatten)]
    pub check: Check,
    pub error_message: String,
}

impl RuleCheck {
    pub fn new(check: Check, error_message: impl Into<String>) -> Self {
        Self {
            check,
            error_message: error_message.into(),
        }
    }
}

/// Ordered checks bound to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldRule {
    pub selector: FieldSelector,
    pub checks: Vec<RuleCheck>,
}

impl FieldRule {
    /// First failing check for `value`, in declaration order.
    pub fn first_failure(&self, value: &str) -> Option<&RuleCheck> {
        self.checks.iter().find(|rule| !rule.check.passes(value))
    }

    pub fn passes(&self, value: &str) -> bool {
        self.first_failure(value).is_none()
    }
}

/// Layout variant of a form; the bottom call-to-action form requires a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormVariant {
    Standard,
    CtaBottom,
}

/// Which optional controls exist on a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldPresence {
    pub name: bool,
    pub city: bool,
    /// Class of the vehicle-model alias in use, if any.
    pub model: Option<String>,
    pub message: bool,
    pub select: bool,
    pub phone: bool,
    pub email: bool,
}

/// Snapshot the rule generator derives rules from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormState {
    pub form: FormId,
    pub variant: FormVariant,
    pub present: FieldPresence,
    /// Raw contact selector value; `None` when the form has no selector.
    pub selection: Option<String>,
}

impl FormState {
    pub fn capture(id: FormId, form: &Form) -> Self {
        let variant = if form.has_class(classes::CTA_BOTTOM) {
            FormVariant::CtaBottom
        } else {
            FormVariant::Standard
        };
        let present = FieldPresence {
            name: form.has_control(classes::NAME),
            city: form.has_control(classes::CITY),
            model: form.model_alias().map(str::to_string),
            message: form.has_control(classes::MESSAGE),
            select: form.has_control(classes::SELECT),
            phone: form.has_control(classes::PHONE),
            email: form.has_control(classes::EMAIL),
        };
        Self {
            form: id,
            variant,
            present,
            selection: form.value(classes::SELECT).map(str::to_string),
        }
    }

    /// Contact mode for this snapshot. A form without a selector uses
    /// whichever contact control it has, phone first.
    pub fn mode(&self) -> ContactMode {
        match self.selection.as_deref() {
            None if self.present.email && !self.present.phone => ContactMode::Email,
            selection => ContactMode::from_selection(selection),
        }
    }
}

/// Build the complete rule set for the current state of a form.
///
/// Fields absent from the form never appear. Exactly one of the phone or
/// email rules is emitted while a contact mode is active, and neither when
/// the selector is empty.
pub fn compute_rules(state: &FormState) -> Vec<FieldRule> {
    let field = |class: &str| FieldSelector::new(state.form, class);
    let mut rules = Vec::new();

    if state.present.name {
        rules.push(FieldRule {
            selector: field(classes::NAME),
            checks: vec![
                RuleCheck::new(Check::Required, "Enter the company name"),
                RuleCheck::new(Check::MinLength { value: 2 }, "At least 2 characters"),
            ],
        });
    }

    if state.present.city {
        rules.push(FieldRule {
            selector: field(classes::CITY),
            checks: vec![
                RuleCheck::new(Check::Required, "Enter the city"),
                RuleCheck::new(Check::MinLength { value: 2 }, "At least 2 characters"),
            ],
        });
    }

    if state.variant == FormVariant::CtaBottom && state.present.message {
        rules.push(FieldRule {
            selector: field(classes::MESSAGE),
            checks: vec![
                RuleCheck::new(Check::Required, "Add a comment"),
                RuleCheck::new(Check::MinLength { value: 3 }, "At least 3 characters"),
            ],
        });
    }

    if let Some(alias) = state.present.model.as_deref() {
        rules.push(FieldRule {
            selector: field(alias),
            checks: vec![
                RuleCheck::new(Check::Required, "Enter the vehicle make"),
                RuleCheck::new(Check::MinLength { value: 2 }, "At least 2 characters"),
            ],
        });
    }

    if state.present.select {
        rules.push(FieldRule {
            selector: field(classes::SELECT),
            checks: vec![RuleCheck::new(Check::Required, "Choose a contact method")],
        });
    }

    match state.mode() {
        ContactMode::Unset => {}
        ContactMode::Email if state.present.email => rules.push(FieldRule {
            selector: field(classes::EMAIL),
            checks: vec![
                RuleCheck::new(Check::Required, "Enter your email"),
                RuleCheck::new(Check::Email, "Enter a valid email"),
            ],
        }),
        ContactMode::Tel if state.present.phone => rules.push(FieldRule {
            selector: field(classes::PHONE),
            checks: vec![
                RuleCheck::new(Check::Required, "Enter your phone"),
                RuleCheck::new(
                    Check::PhoneDigits {
                        digits: PHONE_DIGITS,
                    },
                    "Enter a valid phone number",
                ),
            ],
        }),
        ContactMode::Email | ContactMode::Tel => {}
    }

    rules
}

/// Digits of a phone value with every other character removed.
pub fn phone_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

pub fn is_email_shaped(value: &str) -> bool {
    EMAIL_SHAPE
        .as_ref()
        .is_some_and(|shape| shape.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_predicate_counts_digits_only() {
        let check = Check::PhoneDigits { digits: PHONE_DIGITS };
        assert_eq!(phone_digits("+7 (912) 345-67-89"), "79123456789");
        assert!(check.passes("+7 (912) 345-67-89"));
        assert!(!check.passes("12345"));
        assert!(!check.passes("+7 (912) 345-67-899"));
    }

    #[test]
    fn non_required_checks_skip_empty_values() {
        assert!(Check::Email.passes(""));
        assert!(Check::MinLength { value: 2 }.passes(""));
        assert!(!Check::Required.passes("   "));
    }

    #[test]
    fn email_shape() {
        assert!(is_email_shaped("user@example.com"));
        assert!(!is_email_shaped("user@example"));
        assert!(!is_email_shaped("us er@example.com"));
        assert!(!is_email_shaped("@example.com"));
    }

    #[test]
    fn first_failure_follows_declaration_order() {
        let rule = FieldRule {
            selector: FieldSelector::new(FormId(1), classes::PHONE),
            checks: vec![
                RuleCheck::new(Check::Required, "required"),
                RuleCheck::new(Check::PhoneDigits { digits: 11 }, "digits"),
            ],
        };
        assert_eq!(
            rule.first_failure("").map(|c| c.error_message.as_str()),
            Some("required")
        );
        assert_eq!(
            rule.first_failure("123").map(|c| c.error_message.as_str()),
            Some("digits")
        );
        assert!(rule.passes("89123456789"));
    }
}
