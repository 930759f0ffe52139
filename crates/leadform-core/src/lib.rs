//! Core contracts for leadform.
//!
//! This crate holds the headless document model, contact-mode switching,
//! phone masking, rule generation and the validator interface. It performs
//! no I/O; submission lives in `leadform-submit`.

pub mod contact;
pub mod dom;
pub mod error;
pub mod mask;
pub mod mode;
pub mod rules;
pub mod validator;

pub use contact::{CAPTION_EMAIL, CAPTION_PHONE, CAPTION_UNSET, set_contact_mode};
pub use dom::{
    Control, Document, FieldSelector, Form, FormId, FormSelector, InputType, Page, SharedForm,
    classes, lock_form,
};
pub use error::{Error, Result};
pub use mask::{MaskController, MaskEngine, MaskPattern, PHONE_TEMPLATE, PatternMask};
pub use mode::ContactMode;
pub use rules::{
    Check, FieldPresence, FieldRule, FormState, FormVariant, PHONE_DIGITS, RuleCheck,
    compute_rules, is_email_shaped, phone_digits,
};
pub use validator::{
    FieldIssue, RuleValidator, RuleValidatorFactory, ValidSubmitHandler, ValidationReport,
    Validator, ValidatorFactory, bind_validator, evaluate_rule, submit_ready,
};
