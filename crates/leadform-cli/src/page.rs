use std::path::Path;

use leadform_core::{FormId, Page};
use serde::{Deserialize, Serialize};

use crate::{CliError, CliResult};

/// Load a page description; `.json` files are read as JSON, anything else as TOML.
pub fn load_page(path: &Path) -> CliResult<Page> {
    let content = std::fs::read_to_string(path)?;
    let page = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    Ok(page)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// One user interaction replayed against the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Select { form: FormId, value: String },
    Input { form: FormId, class: String, value: String },
    Submit { form: FormId },
    Retry,
    Acknowledge {
        #[serde(default)]
        modal: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

pub fn load_script(path: &Path) -> CliResult<Script> {
    let content = std::fs::read_to_string(path)?;
    let script: Script = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    if script.steps.is_empty() {
        return Err(CliError::InvalidConfig(format!(
            "{} contains no steps",
            path.display()
        )));
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_steps_parse_from_toml() {
        let script: Script = toml::from_str(
            r#"
            [[steps]]
            action = "select"
            form = 1
            value = "Email"

            [[steps]]
            action = "input"
            form = 1
            class = "input-email"
            value = "lead@example.com"

            [[steps]]
            action = "submit"
            form = 1

            [[steps]]
            action = "acknowledge"
            "#,
        )
        .expect("parse script");
        assert_eq!(script.steps.len(), 4);
        assert_eq!(
            script.steps[0],
            Step::Select {
                form: FormId(1),
                value: "Email".to_string()
            }
        );
        assert_eq!(script.steps[3], Step::Acknowledge { modal: None });
    }

    #[test]
    fn page_parses_from_toml() {
        let page: Page = toml::from_str(
            r#"
            [[forms]]
            classes = ["form", "cta-bottom__form"]

            [[forms.controls]]
            class = "input-name"

            [[forms.controls]]
            class = "input-tel"
            "#,
        )
        .expect("parse page");
        assert_eq!(page.forms.len(), 1);
        assert!(page.forms[0].is_submission_target());
    }

    #[test]
    fn json_extension_is_case_insensitive() {
        assert!(is_json(Path::new("page.JSON")));
        assert!(!is_json(Path::new("page.toml")));
    }
}
