//! Validator interface, the built-in rule engine, and binding.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::{Document, Form, FormId, FormSelector};
use crate::error::{Error, Result};
use crate::rules::{FieldRule, RuleCheck};

/// Invoked with the form id once every bound rule passes.
pub type ValidSubmitHandler = Box<dyn FnMut(FormId) + Send>;

/// Inline failure for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub selector: String,
    pub class: String,
    pub message: String,
}

/// Outcome of a full validation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    /// Returns true when no field failed.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn push(&mut self, issue: FieldIssue) {
        self.issues.push(issue);
    }
}

/// Narrow validation-engine contract; any engine honoring it can be bound.
pub trait Validator: Send {
    fn form(&self) -> FormId;

    fn add_rule(&mut self, rule: FieldRule);

    fn on_valid_submit(&mut self, handler: ValidSubmitHandler);

    /// Run every rule against the form, surface inline messages and, when
    /// all pass, fire the valid-submit handlers.
    fn handle_submit(&mut self, form: &mut Form) -> ValidationReport;

    /// Release handlers and rules and drop the inline messages this
    /// validator wrote. A destroyed validator never fires again.
    fn destroy(&mut self, form: &mut Form);

    fn is_destroyed(&self) -> bool;
}

/// Builds fresh validators for a form.
pub trait ValidatorFactory: Send + Sync {
    fn create(&self, form: FormId) -> Box<dyn Validator>;
}

/// Evaluate one rule against the form. A missing control reads as empty.
pub fn evaluate_rule<'r>(form: &Form, rule: &'r FieldRule) -> Option<&'r RuleCheck> {
    let value = form.value(&rule.selector.class).unwrap_or("");
    rule.first_failure(value)
}

/// Lightweight readiness check behind the submit button's disabled state.
///
/// Uses the same predicates as [`RuleValidator`], so it agrees with a full
/// validation pass for the same field values.
pub fn submit_ready(form: &Form, rules: &[FieldRule]) -> bool {
    rules.iter().all(|rule| evaluate_rule(form, rule).is_none())
}

/// Built-in engine: first failing check per field becomes the inline error.
pub struct RuleValidator {
    form: FormId,
    rules: Vec<FieldRule>,
    handlers: Vec<ValidSubmitHandler>,
    destroyed: bool,
}

impl RuleValidator {
    pub fn new(form: FormId) -> Self {
        Self {
            form,
            rules: Vec::new(),
            handlers: Vec::new(),
            destroyed: false,
        }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }
}

impl Validator for RuleValidator {
    fn form(&self) -> FormId {
        self.form
    }

    fn add_rule(&mut self, rule: FieldRule) {
        if !self.destroyed {
            self.rules.push(rule);
        }
    }

    fn on_valid_submit(&mut self, handler: ValidSubmitHandler) {
        if !self.destroyed {
            self.handlers.push(handler);
        }
    }

    fn handle_submit(&mut self, form: &mut Form) -> ValidationReport {
        let mut report = ValidationReport::default();
        if self.destroyed {
            return report;
        }

        for rule in &self.rules {
            let failure = evaluate_rule(form, rule).map(|check| check.error_message.clone());
            if let Some(control) = form.control_mut(&rule.selector.class) {
                control.error = failure.clone();
            }
            if let Some(message) = failure {
                report.push(FieldIssue {
                    selector: rule.selector.to_string(),
                    class: rule.selector.class.clone(),
                    message,
                });
            }
        }

        if report.is_ok() {
            for handler in &mut self.handlers {
                handler(self.form);
            }
        } else {
            debug!(
                event = "validation_failed",
                form = %self.form,
                issues = report.issues.len()
            );
        }
        report
    }

    fn destroy(&mut self, form: &mut Form) {
        for rule in self.rules.drain(..) {
            if let Some(control) = form.control_mut(&rule.selector.class) {
                control.error = None;
            }
        }
        self.handlers.clear();
        self.destroyed = true;
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Factory for [`RuleValidator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleValidatorFactory;

impl ValidatorFactory for RuleValidatorFactory {
    fn create(&self, form: FormId) -> Box<dyn Validator> {
        Box::new(RuleValidator::new(form))
    }
}

/// Bind a fresh validator carrying `rules` to the form `id`.
///
/// An empty rule list is accepted as is; a missing one is a configuration
/// error, as is a selector that matches no form.
pub fn bind_validator(
    document: &Document,
    id: FormId,
    rules: Option<Vec<FieldRule>>,
    factory: &dyn ValidatorFactory,
) -> Result<Box<dyn Validator>> {
    let selector = FormSelector(id);
    if document.find(id).is_none() {
        return Err(Error::Configuration(format!(
            "no form matches selector {selector}"
        )));
    }
    let rules = rules.ok_or_else(|| {
        Error::Configuration(format!("no validation rules supplied for {selector}"))
    })?;

    let mut validator = factory.create(id);
    let count = rules.len();
    for rule in rules {
        validator.add_rule(rule);
    }
    debug!(event = "validator_bound", form = %id, rules = count);
    Ok(validator)
}
