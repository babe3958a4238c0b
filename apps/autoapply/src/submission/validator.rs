use serde::Serialize;

use crate::models::{FieldMapping, FormSchema};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Required field ids without a usable value, in schema order.
    pub missing_fields: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing_fields.is_empty()
    }
}

/// Checks that every required field maps to a non-null, non-empty value.
///
/// Pure function of (schema, mapping). A required field absent from the mapping
/// altogether counts as missing.
pub fn validate_mapping(schema: &FormSchema, mapping: &FieldMapping) -> ValidationReport {
    let missing_fields = schema
        .fields()
        .iter()
        .filter(|field| field.required)
        .filter(|field| match mapping.get(&field.field_id) {
            Some(Some(value)) => value.is_empty(),
            _ => true,
        })
        .map(|field| field.field_id.clone())
        .collect();

    ValidationReport { missing_fields }
}
