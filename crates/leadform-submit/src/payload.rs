use leadform_core::Form;
use serde::Serialize;

/// Serialized form contents, in document order.
///
/// Disabled controls are left out, as a browser would when building form data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
}

impl FormPayload {
    pub fn from_form(form: &Form) -> Self {
        let fields = form
            .controls
            .iter()
            .filter(|control| !control.disabled)
            .map(|control| (control.field_name().to_string(), control.value.clone()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Multipart body for the wire.
    pub fn to_multipart(&self) -> reqwest::multipart::Form {
        self.fields
            .iter()
            .fold(reqwest::multipart::Form::new(), |body, (name, value)| {
                body.text(name.clone(), value.clone())
            })
    }
}

impl FromIterator<(String, String)> for FormPayload {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
