use std::path::{Path, PathBuf};

use leadform_submit::{ModalSpec, SubmitConfig};
use serde::{Deserialize, Serialize};

use crate::{CliError, CliResult};

/// Logging preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Append JSON log lines to this file.
    pub json_file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json_file: None,
        }
    }
}

/// Contents of `leadform.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub submit: SubmitConfig,
    pub modals: Vec<ModalSpec>,
    pub log: LogSettings,
}

impl Settings {
    /// Declared modals, or the two feedback modals when none are declared.
    pub fn modal_specs(&self) -> Vec<ModalSpec> {
        if self.modals.is_empty() {
            vec![
                ModalSpec::new(self.submit.modals.success.clone()),
                ModalSpec::new(self.submit.modals.error.clone()),
            ]
        } else {
            self.modals.clone()
        }
    }
}

/// Load settings from `path`, falling back to defaults when the file is absent.
pub fn load_settings(path: &Path) -> CliResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    if settings.submit.timeout_ms == 0 {
        return Err(CliError::InvalidConfig(
            "submit.timeout_ms must be greater than zero".to_string(),
        ));
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [submit]
            origin = "https://dealer.example"

            [[modals]]
            id = "modal-success"

            [[modals]]
            id = "modal-error"
            "#,
        )
        .expect("parse settings");
        assert_eq!(settings.submit.timeout_ms, 15_000);
        assert_eq!(settings.log.filter, "info");
        assert_eq!(settings.modal_specs().len(), 2);
    }

    #[test]
    fn default_modals_follow_configured_ids() {
        let settings = Settings::default();
        let ids: Vec<String> = settings.modal_specs().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["modal-success", "modal-error"]);
    }
}
