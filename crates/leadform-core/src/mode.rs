use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which contact channel a form currently requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContactMode {
    Tel,
    Email,
    /// The contact selector exists but nothing is selected.
    Unset,
}

impl ContactMode {
    /// Derive the mode from the contact selector value.
    ///
    /// `None` means the form has no selector at all and is phone-only.
    /// Any value mentioning "mail" (case-insensitive) selects email; any other
    /// non-empty value selects phone.
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            None => ContactMode::Tel,
            Some("") => ContactMode::Unset,
            Some(value) if value.to_lowercase().contains("mail") => ContactMode::Email,
            Some(_) => ContactMode::Tel,
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, ContactMode::Unset)
    }
}

impl fmt::Display for ContactMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContactMode::Tel => "tel",
            ContactMode::Email => "email",
            ContactMode::Unset => "unset",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_substring_selects_email() {
        assert_eq!(ContactMode::from_selection(Some("Email")), ContactMode::Email);
        assert_eq!(ContactMode::from_selection(Some("E-MAIL")), ContactMode::Email);
        assert_eq!(ContactMode::from_selection(Some("Gmail")), ContactMode::Email);
        assert_eq!(ContactMode::from_selection(Some("Telegram")), ContactMode::Tel);
        assert_eq!(ContactMode::from_selection(Some("Phone")), ContactMode::Tel);
    }

    #[test]
    fn empty_selection_is_unset() {
        assert_eq!(ContactMode::from_selection(Some("")), ContactMode::Unset);
        assert_eq!(ContactMode::from_selection(Some("  ")), ContactMode::Unset);
        assert_eq!(ContactMode::from_selection(None), ContactMode::Tel);
        assert!(!ContactMode::Unset.is_active());
    }
}
