//! Headless document model for the site's lead forms.
//!
//! Pages are described declaratively (TOML/JSON) and loaded into a
//! [`Document`], which hands out shared form handles to the runtime.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Class names the engine recognizes on forms and controls.
pub mod classes {
    pub const FORM: &str = "form";
    pub const CTA_BOTTOM: &str = "cta-bottom__form";
    pub const NAME: &str = "input-name";
    pub const CITY: &str = "input-city";
    pub const MESSAGE: &str = "input-mess";
    pub const SELECT: &str = "select-contact";
    pub const PHONE: &str = "input-tel";
    pub const EMAIL: &str = "input-email";
    /// Vehicle-model field aliases, in probe order.
    pub const MODEL_ALIASES: [&str; 4] = ["input-model", "input-brand", "input-car", "input-mark"];
}

/// Stable identifier assigned to a form at discovery time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct FormId(pub u32);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selector resolving to one registered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormSelector(pub FormId);

impl fmt::Display for FormSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "form.{}[data-validate-id=\"{}\"]", classes::FORM, self.0)
    }
}

/// Selector for one control, scoped to its owning form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSelector {
    pub form: FormId,
    pub class: String,
}

impl FieldSelector {
    pub fn new(form: FormId, class: impl Into<String>) -> Self {
        Self {
            form,
            class: class.into(),
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .{}", FormSelector(self.form), self.class)
    }
}

/// `type` attribute of a control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    #[default]
    Text,
    Email,
    Tel,
    Textarea,
    Select,
}

/// One input, textarea or select inside a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Control {
    pub class: String,
    /// Submission key; falls back to the class when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub input_type: InputType,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub filled: bool,
    /// Inline message written by the validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Control {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: None,
            value: String::new(),
            input_type: InputType::Text,
            hidden: false,
            disabled: false,
            filled: false,
            error: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    pub fn field_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.class)
    }

    /// Visible and enabled.
    pub fn is_active(&self) -> bool {
        !self.hidden && !self.disabled
    }
}

/// Wrapper around the phone/email inputs with its caption.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContactGroup {
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub filled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubmitButton {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub loading: bool,
}

/// A form element and the state the engine tracks on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_id: Option<FormId>,
    pub classes: Vec<String>,
    pub controls: Vec<Control>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_group: Option<ContactGroup>,
    /// The control preceding the contact group was widened into its space.
    #[serde(default)]
    pub selector_widened: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<SubmitButton>,
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub submitting: bool,
    #[serde(default)]
    pub initialized: bool,
}

impl Form {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_contact_group(mut self) -> Self {
        self.contact_group = Some(ContactGroup::default());
        self
    }

    pub fn with_submit(mut self) -> Self {
        self.submit = Some(SubmitButton::default());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn has_control(&self, class: &str) -> bool {
        self.control(class).is_some()
    }

    pub fn control(&self, class: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.class == class)
    }

    pub fn control_mut(&mut self, class: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|c| c.class == class)
    }

    pub fn value(&self, class: &str) -> Option<&str> {
        self.control(class).map(|c| c.value.as_str())
    }

    /// Returns false when no control carries `class`.
    pub fn set_value(&mut self, class: &str, value: impl Into<String>) -> bool {
        match self.control_mut(class) {
            Some(control) => {
                control.value = value.into();
                true
            }
            None => false,
        }
    }

    /// First vehicle-model alias present on the form.
    pub fn model_alias(&self) -> Option<&'static str> {
        classes::MODEL_ALIASES
            .into_iter()
            .find(|alias| self.has_control(alias))
    }

    /// Base class plus at least one contact control.
    pub fn is_submission_target(&self) -> bool {
        self.has_class(classes::FORM)
            && (self.has_control(classes::SELECT)
                || self.has_control(classes::PHONE)
                || self.has_control(classes::EMAIL))
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        if let Some(submit) = self.submit.as_mut() {
            submit.disabled = loading;
            submit.loading = loading;
        }
    }

    pub fn set_submit_disabled(&mut self, disabled: bool) {
        if let Some(submit) = self.submit.as_mut() {
            submit.disabled = disabled;
        }
    }

    pub fn submit_disabled(&self) -> Option<bool> {
        self.submit.as_ref().map(|s| s.disabled)
    }

    pub fn clear_filled(&mut self) {
        for control in &mut self.controls {
            control.filled = false;
        }
        if let Some(group) = self.contact_group.as_mut() {
            group.filled = false;
        }
    }

    /// Empties every text value. The contact selector keeps its value so the
    /// bound rule set keeps matching the visible fields.
    pub fn reset(&mut self) {
        for control in &mut self.controls {
            if control.class != classes::SELECT {
                control.value.clear();
            }
        }
    }
}

/// Serializable page description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Page {
    #[serde(default)]
    pub forms: Vec<Form>,
}

/// Form handle shared between the runtime, validators and in-flight requests.
pub type SharedForm = Arc<Mutex<Form>>;

/// Lock a shared form, recovering the data from a poisoned lock.
pub fn lock_form(form: &SharedForm) -> MutexGuard<'_, Form> {
    form.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live document: every form on the page behind a shared handle.
#[derive(Debug, Default)]
pub struct Document {
    forms: Vec<SharedForm>,
    next_id: u32,
}

impl Document {
    pub fn from_page(page: Page) -> Self {
        let next_id = page
            .forms
            .iter()
            .filter_map(|form| form.validate_id)
            .map(|id| id.0)
            .max()
            .unwrap_or(0);
        Self {
            forms: page
                .forms
                .into_iter()
                .map(|form| Arc::new(Mutex::new(form)))
                .collect(),
            next_id,
        }
    }

    pub fn forms(&self) -> &[SharedForm] {
        &self.forms
    }

    /// Resolve a form selector.
    pub fn find(&self, id: FormId) -> Option<SharedForm> {
        self.forms
            .iter()
            .find(|form| lock_form(form).validate_id == Some(id))
            .cloned()
    }

    /// Register every submission target not yet initialized, assigning
    /// sequential validate ids. Returns the newly registered forms.
    pub fn discover_forms(&mut self) -> Vec<(FormId, SharedForm)> {
        let mut discovered = Vec::new();
        for shared in &self.forms {
            let mut form = lock_form(shared);
            if form.initialized || !form.is_submission_target() {
                continue;
            }
            form.initialized = true;
            let id = match form.validate_id {
                Some(id) => id,
                None => {
                    self.next_id += 1;
                    let id = FormId(self.next_id);
                    form.validate_id = Some(id);
                    id
                }
            };
            discovered.push((id, Arc::clone(shared)));
        }
        discovered
    }

    /// Snapshot of the current page state.
    pub fn to_page(&self) -> Page {
        Page {
            forms: self.forms.iter().map(|form| lock_form(form).clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead_form() -> Form {
        Form::new(["form"])
            .with_control(Control::new(classes::NAME))
            .with_control(Control::new(classes::PHONE))
    }

    #[test]
    fn selectors_are_scoped_to_the_form() {
        let field = FieldSelector::new(FormId(3), classes::NAME);
        assert_eq!(
            field.to_string(),
            "form.form[data-validate-id=\"3\"] .input-name"
        );
    }

    #[test]
    fn discovery_requires_base_class_and_contact_control() {
        let page = Page {
            forms: vec![
                lead_form(),
                Form::new(["search"]).with_control(Control::new(classes::PHONE)),
                Form::new(["form"]).with_control(Control::new(classes::NAME)),
                lead_form(),
            ],
        };
        let mut document = Document::from_page(page);
        let ids: Vec<FormId> = document
            .discover_forms()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![FormId(1), FormId(2)]);
        assert!(document.discover_forms().is_empty());
    }

    #[test]
    fn reset_keeps_contact_selection() {
        let mut form = lead_form()
            .with_control(Control::new(classes::SELECT).with_value("Email"))
            .with_contact_group();
        form.set_value(classes::NAME, "Acme");
        form.controls[0].filled = true;
        form.reset();
        form.clear_filled();
        assert_eq!(form.value(classes::NAME), Some(""));
        assert_eq!(form.value(classes::SELECT), Some("Email"));
        assert!(form.controls.iter().all(|c| !c.filled));
    }
}
