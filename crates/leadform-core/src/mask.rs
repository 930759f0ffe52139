//! Input masking for the phone control.

use tracing::debug;

use crate::dom::FieldSelector;

/// Fixed template for phone input; `9` marks a digit slot.
pub const PHONE_TEMPLATE: &str = "+7 (999) 999-99-99";

/// Template plus the rules for when masking steps aside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPattern {
    pub template: String,
    /// Literal prefix of the template; digits inside it are never slot input.
    pub prefix: String,
    /// Raw values starting with one of these are left unmasked.
    pub passthrough: Vec<char>,
}

impl MaskPattern {
    pub fn phone() -> Self {
        Self {
            template: PHONE_TEMPLATE.to_string(),
            prefix: "+7".to_string(),
            passthrough: vec!['7', '8'],
        }
    }

    /// Format a raw value through the template.
    ///
    /// Applying the mask to already masked text yields the same text.
    pub fn apply(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.starts_with(self.passthrough.as_slice()) {
            return raw.to_string();
        }

        let body = raw.strip_prefix(self.prefix.as_str()).unwrap_or(raw);
        let mut digits = body.chars().filter(char::is_ascii_digit).peekable();
        if digits.peek().is_none() {
            return String::new();
        }

        let mut out = String::with_capacity(self.template.len());
        for (idx, slot) in self.template.char_indices() {
            if slot == '9' && idx >= self.prefix.len() {
                match digits.next() {
                    Some(digit) => out.push(digit),
                    None => break,
                }
            } else {
                if digits.peek().is_none() {
                    break;
                }
                out.push(slot);
            }
        }
        out
    }
}

/// Masking capability attached to a single control.
pub trait MaskEngine: Send {
    fn attach(&mut self, field: &FieldSelector, pattern: &MaskPattern);
    fn detach(&mut self);
    /// Transform typed text; identity while detached.
    fn apply(&self, raw: &str) -> String;
}

/// Template-driven mask engine.
#[derive(Debug, Default)]
pub struct PatternMask {
    pattern: Option<MaskPattern>,
}

impl MaskEngine for PatternMask {
    fn attach(&mut self, _field: &FieldSelector, pattern: &MaskPattern) {
        self.pattern = Some(pattern.clone());
    }

    fn detach(&mut self) {
        self.pattern = None;
    }

    fn apply(&self, raw: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern.apply(raw),
            None => raw.to_string(),
        }
    }
}

/// Tracks whether the phone mask is attached and to which field.
pub struct MaskController {
    engine: Box<dyn MaskEngine>,
    pattern: MaskPattern,
    attached: Option<FieldSelector>,
}

impl MaskController {
    pub fn new(engine: Box<dyn MaskEngine>, pattern: MaskPattern) -> Self {
        Self {
            engine,
            pattern,
            attached: None,
        }
    }

    pub fn phone() -> Self {
        Self::new(Box::<PatternMask>::default(), MaskPattern::phone())
    }

    /// Attach to `field`; a no-op when already attached there.
    pub fn attach(&mut self, field: FieldSelector) {
        if self.attached.as_ref() == Some(&field) {
            return;
        }
        self.detach();
        self.engine.attach(&field, &self.pattern);
        debug!(event = "mask_attached", field = %field);
        self.attached = Some(field);
    }

    /// Detach if attached. Returns whether a mask was removed.
    pub fn detach(&mut self) -> bool {
        match self.attached.take() {
            Some(field) => {
                self.engine.detach();
                debug!(event = "mask_detached", field = %field);
                true
            }
            None => false,
        }
    }

    pub fn attached_to(&self) -> Option<&FieldSelector> {
        self.attached.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn apply(&self, raw: &str) -> String {
        if self.attached.is_some() {
            self.engine.apply(raw)
        } else {
            raw.to_string()
        }
    }
}

impl std::fmt::Debug for MaskController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskController")
            .field("pattern", &self.pattern)
            .field("attached", &self.attached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_digit_slots_in_order() {
        let pattern = MaskPattern::phone();
        assert_eq!(pattern.apply("9123456789"), "+7 (912) 345-67-89");
        assert_eq!(pattern.apply("912"), "+7 (912");
        assert_eq!(pattern.apply("91234567890000"), "+7 (912) 345-67-89");
    }

    #[test]
    fn masked_text_is_stable() {
        let pattern = MaskPattern::phone();
        let masked = pattern.apply("9123456789");
        assert_eq!(pattern.apply(&masked), masked);
    }

    #[test]
    fn country_code_digit_suppresses_masking() {
        let pattern = MaskPattern::phone();
        assert_eq!(pattern.apply("89123456789"), "89123456789");
        assert_eq!(pattern.apply("7912"), "7912");
        assert_eq!(pattern.apply("abc"), "");
    }

    #[test]
    fn detach_is_idempotent() {
        let mut mask = MaskController::phone();
        assert!(!mask.detach());
        mask.attach(FieldSelector::new(crate::dom::FormId(1), "input-tel"));
        assert!(mask.is_attached());
        assert!(mask.detach());
        assert!(!mask.detach());
        assert_eq!(mask.apply("912"), "912");
    }
}
