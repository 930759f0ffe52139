//! Contact mode switching for a single form.

use tracing::debug;

use crate::dom::{FieldSelector, Form, FormId, InputType, classes};
use crate::mask::MaskController;
use crate::mode::ContactMode;

pub const CAPTION_UNSET: &str = "Phone/Email";
pub const CAPTION_PHONE: &str = "Phone";
pub const CAPTION_EMAIL: &str = "Email";

/// Apply `mode` to the form's contact controls in one step.
///
/// The phone mask is detached and the phone value cleared first, whatever the
/// target mode. Afterwards exactly one of phone/email is visible and enabled,
/// and the mask is attached only for an active phone mode.
pub fn set_contact_mode(form: &mut Form, id: FormId, mode: ContactMode, mask: &mut MaskController) {
    mask.detach();
    if let Some(phone) = form.control_mut(classes::PHONE) {
        phone.value.clear();
        phone.filled = false;
    }
    if let Some(email) = form.control_mut(classes::EMAIL) {
        email.filled = false;
    }
    if let Some(group) = form.contact_group.as_mut() {
        group.filled = false;
    }

    if !mode.is_active() {
        if let Some(group) = form.contact_group.as_mut() {
            group.hidden = true;
            group.caption = CAPTION_UNSET.to_string();
        }
        form.selector_widened = true;
        if let Some(email) = form.control_mut(classes::EMAIL) {
            email.hidden = true;
            email.disabled = true;
        }
        if let Some(phone) = form.control_mut(classes::PHONE) {
            phone.hidden = false;
            phone.disabled = false;
        }
        debug!(event = "contact_mode_unset", form = %id);
        return;
    }

    if let Some(group) = form.contact_group.as_mut() {
        group.hidden = false;
    }
    form.selector_widened = false;

    let (shown, hidden, input_type, caption) = match mode {
        ContactMode::Email => (classes::EMAIL, classes::PHONE, InputType::Email, CAPTION_EMAIL),
        _ => (classes::PHONE, classes::EMAIL, InputType::Text, CAPTION_PHONE),
    };

    if let Some(control) = form.control_mut(hidden) {
        control.hidden = true;
        control.disabled = true;
    }
    if let Some(control) = form.control_mut(shown) {
        control.hidden = false;
        control.disabled = false;
        control.value.clear();
        control.input_type = input_type;
    }
    if let Some(group) = form.contact_group.as_mut() {
        group.caption = caption.to_string();
    }

    if mode == ContactMode::Tel && form.has_control(classes::PHONE) {
        mask.attach(FieldSelector::new(id, classes::PHONE));
    }
    debug!(event = "contact_mode_set", form = %id, mode = %mode);
}
