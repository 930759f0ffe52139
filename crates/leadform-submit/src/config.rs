use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{SubmitError, SubmitResult};

pub const DEFAULT_ENDPOINT_PATH: &str = "/wp-content/themes/autoclick/assets/mail.php";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const SUCCESS_MODAL: &str = "modal-success";
pub const ERROR_MODAL: &str = "modal-error";

/// Ids of the terminal feedback modals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalIds {
    pub success: String,
    pub error: String,
}

impl Default for ModalIds {
    fn default() -> Self {
        Self {
            success: SUCCESS_MODAL.to_string(),
            error: ERROR_MODAL.to_string(),
        }
    }
}

/// Where and how submissions are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    /// Site origin, e.g. `https://example.com`.
    pub origin: String,
    pub endpoint_path: String,
    pub timeout_ms: u64,
    pub modals: ModalIds,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost".to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            modals: ModalIds::default(),
        }
    }
}

impl SubmitConfig {
    /// Fixed destination: origin joined with the endpoint path.
    pub fn destination(&self) -> SubmitResult<Url> {
        let origin = Url::parse(&self.origin)
            .map_err(|err| SubmitError::Destination(format!("{}: {err}", self.origin)))?;
        origin
            .join(&self.endpoint_path)
            .map_err(|err| SubmitError::Destination(format!("{}: {err}", self.endpoint_path)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_joins_origin_and_path() {
        let config = SubmitConfig {
            origin: "https://dealer.example".to_string(),
            ..SubmitConfig::default()
        };
        let destination = config.destination().expect("destination");
        assert_eq!(
            destination.as_str(),
            "https://dealer.example/wp-content/themes/autoclick/assets/mail.php"
        );
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn bad_origin_is_reported() {
        let config = SubmitConfig {
            origin: "not a url".to_string(),
            ..SubmitConfig::default()
        };
        assert!(matches!(
            config.destination(),
            Err(SubmitError::Destination(_))
        ));
    }
}
