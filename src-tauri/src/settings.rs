//! Settings export/import as a flat JSON object.
//!
//! Keys are the field wire names plus `filename`. Import matches keys against
//! field identifiers and ignores everything else.

use serde::de::Error as _;
use serde_json::{Map, Value};

use crate::params::{parse_leading_int, FieldId, FieldKind, FormState};

pub const SETTINGS_FILENAME: &str = "qr-generator-settings.json";

/// Builds the export record from the raw form and the selected image.
pub fn export_record(form: &FormState, selected_image: Option<&str>) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(
        "filename".to_string(),
        selected_image.map_or(Value::Null, |name| Value::String(name.to_string())),
    );

    for id in FieldId::ALL {
        let value = match id.kind() {
            FieldKind::Checkbox => Value::Bool(form.checked(id)),
            FieldKind::Number | FieldKind::Range => parse_leading_int(form.text(id))
                .map_or(Value::Null, |n| Value::Number(n.into())),
            FieldKind::Text | FieldKind::Select => Value::String(form.text(id).to_string()),
        };
        record.insert(id.key().to_string(), value);
    }

    record
}

/// Pretty-printed export document.
pub fn export_json(form: &FormState, selected_image: Option<&str>) -> String {
    format!("{:#}", Value::Object(export_record(form, selected_image)))
}

/// Applies a settings document to the form and returns how many fields it touched.
///
/// The text is fully parsed before any field changes, so malformed JSON leaves
/// the form as it was. Values are written without validation. A `null`
/// document is rejected; any other non-object document touches nothing.
pub fn import_json(form: &mut FormState, text: &str) -> serde_json::Result<usize> {
    let settings: Value = serde_json::from_str(text)?;

    let entries = match settings {
        Value::Object(entries) => entries,
        Value::Null => return Err(serde_json::Error::custom("settings document is null")),
        _ => return Ok(0),
    };

    let mut applied = 0;
    for (key, value) in &entries {
        if let Some(id) = FieldId::from_key(key) {
            form.set_json(id, value);
            applied += 1;
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FieldValue, GenerationParams};
    use serde_json::json;

    #[test]
    fn export_is_pretty_and_typed() {
        let text = export_json(&FormState::new(), Some("cat.png"));
        assert!(text.starts_with("{\n  \"filename\": \"cat.png\""));

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["box_size"], json!(25));
        assert_eq!(value["enable_finder_overlay"], json!(true));
        assert_eq!(value["finder_shape"], json!("rounded_square"));
        assert_eq!(value["data"], json!("https://www.example.com"));
    }

    #[test]
    fn export_without_selection_writes_null_filename() {
        let record = export_record(&FormState::new(), None);
        assert_eq!(record["filename"], Value::Null);
        assert_eq!(record.len(), 17);
    }

    #[test]
    fn unreadable_integer_exports_as_null() {
        let mut form = FormState::new();
        form.set(FieldId::Border, FieldValue::Text("wide".to_string()));
        assert_eq!(export_record(&form, None)["border"], Value::Null);
    }

    #[test]
    fn round_trip_of_unmodified_form_keeps_params() {
        let form = FormState::new();
        let text = export_json(&form, Some("cat.png"));

        let mut restored = FormState::new();
        import_json(&mut restored, &text).unwrap();
        assert_eq!(
            GenerationParams::from_form(&restored).unwrap(),
            GenerationParams::from_form(&form).unwrap()
        );
    }

    #[test]
    fn round_trip_carries_edits_into_a_fresh_form() {
        let mut form = FormState::new();
        form.set_json(FieldId::FinderShape, &json!("circle"));
        form.set_json(FieldId::BoxSize, &json!("40"));
        form.set_json(FieldId::EnableFinderOverlay, &json!(false));
        let text = export_json(&form, None);

        let mut restored = FormState::new();
        import_json(&mut restored, &text).unwrap();
        assert_eq!(restored, form);
    }

    #[test]
    fn unknown_keys_are_ignored_and_missing_keys_untouched() {
        let mut form = FormState::new();
        let applied = import_json(&mut form, r#"{"border": 9, "theme": "dark"}"#).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(form.text(FieldId::Border), "9");
        assert_eq!(form.text(FieldId::Padding), "4");
    }

    #[test]
    fn mismatched_types_are_applied_as_is() {
        let mut form = FormState::new();
        import_json(&mut form, r#"{"box_size": "enormous", "data": 42}"#).unwrap();
        assert_eq!(form.text(FieldId::BoxSize), "enormous");
        assert_eq!(form.text(FieldId::Data), "42");
    }

    #[test]
    fn malformed_json_changes_nothing() {
        let mut form = FormState::new();
        form.set_json(FieldId::Border, &json!("7"));
        let before = form.clone();
        assert!(import_json(&mut form, "{\"border\": 1,").is_err());
        assert_eq!(form, before);
    }

    #[test]
    fn non_object_document_applies_nothing() {
        let mut form = FormState::new();
        assert_eq!(import_json(&mut form, "[1, 2, 3]").unwrap(), 0);
        assert_eq!(form, FormState::new());
    }

    #[test]
    fn null_document_is_rejected() {
        let mut form = FormState::new();
        form.set_json(FieldId::Border, &json!("7"));
        let before = form.clone();
        assert!(import_json(&mut form, "null").is_err());
        assert_eq!(form, before);
    }
}
