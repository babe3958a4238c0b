use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespaces a mapping hint may point into.
pub const HINT_NAMESPACES: &[&str] = &["cv", "optimized_cv", "user_profile"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFieldType {
    Text,
    Textarea,
    Email,
    Phone,
    Select,
    Multiselect,
    Checkbox,
    FileUpload,
    Date,
    Number,
    Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub field_id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FormFieldType,
    pub required: bool,
    #[serde(default)]
    pub mapping_hint: Option<String>,
}

impl FormField {
    pub fn new(
        field_id: impl Into<String>,
        label: impl Into<String>,
        field_type: FormFieldType,
        required: bool,
    ) -> Self {
        Self {
            field_id: field_id.into(),
            label: label.into(),
            field_type,
            required,
            mapping_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.mapping_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Duplicate field id '{0}' in form schema")]
    DuplicateFieldId(String),

    #[error("Field '{field_id}' has mapping hint '{hint}' outside the known namespaces")]
    UnknownHintNamespace { field_id: String, hint: String },
}

/// Declarative description of one application form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    pub ats_type: String,
    pub form_url: String,
    fields: Vec<FormField>,
}

impl FormSchema {
    /// Builds a schema, rejecting duplicate field ids and hints with an unknown namespace.
    pub fn new(
        ats_type: impl Into<String>,
        form_url: impl Into<String>,
        fields: Vec<FormField>,
    ) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.field_id.as_str()) {
                return Err(SchemaError::DuplicateFieldId(field.field_id.clone()));
            }
            if let Some(hint) = &field.mapping_hint {
                let namespace = hint.trim().split_once('.').map(|(ns, _)| ns).unwrap_or("");
                if !HINT_NAMESPACES.contains(&namespace) {
                    return Err(SchemaError::UnknownHintNamespace {
                        field_id: field.field_id.clone(),
                        hint: hint.clone(),
                    });
                }
            }
        }

        Ok(Self {
            ats_type: ats_type.into(),
            form_url: form_url.into(),
            fields,
        })
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    #[cfg(test)]
    pub fn field(&self, field_id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }
}

/// A resolved value for one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    #[cfg(test)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }
}

/// field_id → resolved value (`None` when unresolved), in schema order.
pub type FieldMapping = IndexMap<String, Option<FieldValue>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_rejects_duplicate_field_ids() {
        let result = FormSchema::new(
            "greenhouse",
            "https://x",
            vec![
                FormField::new("email", "Email", FormFieldType::Email, true),
                FormField::new("email", "Email again", FormFieldType::Email, false),
            ],
        );
        assert_eq!(result, Err(SchemaError::DuplicateFieldId("email".into())));
    }

    #[test]
    fn test_schema_rejects_unknown_hint_namespace() {
        let result = FormSchema::new(
            "greenhouse",
            "https://x",
            vec![FormField::new("email", "Email", FormFieldType::Email, true).with_hint("env.HOME")],
        );
        assert!(matches!(
            result,
            Err(SchemaError::UnknownHintNamespace { .. })
        ));
    }

    #[test]
    fn test_schema_accepts_known_namespaces() {
        let schema = FormSchema::new(
            "greenhouse",
            "https://x",
            vec![
                FormField::new("a", "A", FormFieldType::Text, true).with_hint("cv.full_name"),
                FormField::new("b", "B", FormFieldType::Text, false).with_hint("optimized_cv.cover_letter"),
                FormField::new("c", "C", FormFieldType::Text, false).with_hint("user_profile.phone"),
                FormField::new("d", "D", FormFieldType::Text, false),
            ],
        )
        .unwrap();
        assert_eq!(schema.fields().len(), 4);
        assert!(schema.field("c").is_some());
    }

    #[test]
    fn test_schema_accepts_hint_with_surrounding_whitespace() {
        let schema = FormSchema::new(
            "greenhouse",
            "https://x",
            vec![FormField::new("email", "Email", FormFieldType::Email, true).with_hint(" cv.email ")],
        )
        .unwrap();
        assert_eq!(schema.fields().len(), 1);
    }

    #[test]
    fn test_field_type_serializes_snake_case() {
        let json = serde_json::to_string(&FormFieldType::FileUpload).unwrap();
        assert_eq!(json, "\"file_upload\"");
    }

    #[test]
    fn test_field_value_emptiness() {
        assert!(FieldValue::Text(String::new()).is_empty());
        assert!(FieldValue::List(vec![]).is_empty());
        assert!(!FieldValue::List(vec!["Rust".into()]).is_empty());
    }
}
