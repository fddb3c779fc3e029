//! Form model and typed generation parameters.
//!
//! `FormState` holds the raw values exactly as the webview reports them.
//! `GenerationParams` is the typed snapshot read from it once per action.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// How the background image is fitted behind the code.
    BackgroundMode { Stretched => "Stretched", Contained => "Contained" } default Stretched
);
wire_enum!(
    FinderShape { Circle => "circle", Square => "square", RoundedSquare => "rounded_square" } default RoundedSquare
);
wire_enum!(
    FinderColorMode { Static => "static", Dynamic => "dynamic" } default Dynamic
);
wire_enum!(
    /// Only meaningful when the finder color mode is dynamic.
    FinderDynamicSubmode { SingleColor => "single-color", MultiColor => "multi-color" } default SingleColor
);
wire_enum!(
    DataModuleShape { Diamond => "diamond", Square => "square", Circle => "circle" } default Diamond
);
wire_enum!(
    DataModuleColorMode { Adaptive => "adaptive", Static => "static" } default Adaptive
);
wire_enum!(
    ErrorCorrection { L => "L", M => "M", Q => "Q", H => "H" } default H
);

pub const DEFAULT_DATA: &str = "https://www.example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Select,
    Number,
    Range,
    Checkbox,
}

/// Every tracked form control. The identifier doubles as the wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    Data,
    BackgroundMode,
    FinderShape,
    FinderColorMode,
    FinderDynamicSubmode,
    DataModuleShape,
    DataModuleColorMode,
    BoxSize,
    Border,
    Padding,
    ErrorCorrection,
    BackgroundAlpha,
    BackgroundPadding,
    EnableFinderOverlay,
    FinderOverlayPadding,
    ReduceInnermostBrightness,
}

impl FieldId {
    pub const ALL: [FieldId; 16] = [
        FieldId::Data,
        FieldId::BackgroundMode,
        FieldId::FinderShape,
        FieldId::FinderColorMode,
        FieldId::FinderDynamicSubmode,
        FieldId::DataModuleShape,
        FieldId::DataModuleColorMode,
        FieldId::BoxSize,
        FieldId::Border,
        FieldId::Padding,
        FieldId::ErrorCorrection,
        FieldId::BackgroundAlpha,
        FieldId::BackgroundPadding,
        FieldId::EnableFinderOverlay,
        FieldId::FinderOverlayPadding,
        FieldId::ReduceInnermostBrightness,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FieldId::Data => "data",
            FieldId::BackgroundMode => "background_image_mode",
            FieldId::FinderShape => "finder_shape",
            FieldId::FinderColorMode => "finder_color_mode",
            FieldId::FinderDynamicSubmode => "finder_dynamic_submode",
            FieldId::DataModuleShape => "data_module_shape",
            FieldId::DataModuleColorMode => "data_module_color_mode",
            FieldId::BoxSize => "box_size",
            FieldId::Border => "border",
            FieldId::Padding => "padding",
            FieldId::ErrorCorrection => "error_correction",
            FieldId::BackgroundAlpha => "background_alpha",
            FieldId::BackgroundPadding => "background_padding",
            FieldId::EnableFinderOverlay => "enable_finder_overlay",
            FieldId::FinderOverlayPadding => "finder_overlay_padding",
            FieldId::ReduceInnermostBrightness => "reduce_innermost_brightness",
        }
    }

    pub fn from_key(key: &str) -> Option<FieldId> {
        FieldId::ALL.iter().copied().find(|id| id.key() == key)
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldId::Data => FieldKind::Text,
            FieldId::BackgroundMode
            | FieldId::FinderShape
            | FieldId::FinderColorMode
            | FieldId::FinderDynamicSubmode
            | FieldId::DataModuleShape
            | FieldId::DataModuleColorMode
            | FieldId::ErrorCorrection => FieldKind::Select,
            FieldId::Border | FieldId::Padding => FieldKind::Number,
            FieldId::BoxSize
            | FieldId::BackgroundAlpha
            | FieldId::BackgroundPadding
            | FieldId::FinderOverlayPadding => FieldKind::Range,
            FieldId::EnableFinderOverlay | FieldId::ReduceInnermostBrightness => {
                FieldKind::Checkbox
            }
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.kind(), FieldKind::Number | FieldKind::Range)
    }
}

/// Raw value of a single control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl FieldValue {
    /// Converts an incoming JSON value for the given control without validating it.
    /// Checkboxes take the value's truthiness, everything else its text.
    pub fn from_json(id: FieldId, value: &Value) -> FieldValue {
        if id.kind() == FieldKind::Checkbox {
            return FieldValue::Checked(is_truthy(value));
        }
        let text = match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        FieldValue::Text(text)
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(text) => Value::String(text),
            FieldValue::Checked(checked) => Value::Bool(checked),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Leading-integer parse: `"25"`, `" 25px"` and `"25.7"` all read as 25.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')) {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub finder_submode: bool,
    pub overlay_padding: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    values: BTreeMap<FieldId, FieldValue>,
}

impl Default for FormState {
    fn default() -> Self {
        let params = GenerationParams::default();
        let mut values = BTreeMap::new();
        for id in FieldId::ALL {
            values.insert(id, params.raw_value(id));
        }
        Self { values }
    }
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: FieldId) -> &FieldValue {
        // every FieldId is seeded in Default and never removed
        &self.values[&id]
    }

    pub fn text(&self, id: FieldId) -> &str {
        match self.get(id) {
            FieldValue::Text(text) => text,
            FieldValue::Checked(_) => "",
        }
    }

    pub fn checked(&self, id: FieldId) -> bool {
        matches!(self.get(id), FieldValue::Checked(true))
    }

    pub fn set(&mut self, id: FieldId, value: FieldValue) {
        self.values.insert(id, value);
    }

    pub fn set_json(&mut self, id: FieldId, value: &Value) {
        self.set(id, FieldValue::from_json(id, value));
    }

    pub fn visibility(&self) -> Visibility {
        Visibility {
            finder_submode: self.text(FieldId::FinderColorMode) == FinderColorMode::Dynamic.as_str(),
            overlay_padding: self.checked(FieldId::EnableFinderOverlay),
        }
    }

    /// Current text of every range control, for the value labels beside the sliders.
    pub fn range_values(&self) -> Vec<(FieldId, String)> {
        FieldId::ALL
            .iter()
            .filter(|id| id.kind() == FieldKind::Range)
            .map(|id| (*id, self.text(*id).to_string()))
            .collect()
    }

    /// Snapshot keyed by wire name, in declaration order.
    pub fn values(&self) -> Vec<(&'static str, FieldValue)> {
        FieldId::ALL
            .iter()
            .map(|id| (id.key(), self.get(*id).clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub data: String,
    pub background_mode: BackgroundMode,
    pub finder_shape: FinderShape,
    pub finder_color_mode: FinderColorMode,
    pub finder_dynamic_submode: FinderDynamicSubmode,
    pub data_module_shape: DataModuleShape,
    pub data_module_color_mode: DataModuleColorMode,
    pub box_size: i64,
    pub border: i64,
    pub padding: i64,
    pub error_correction: ErrorCorrection,
    pub background_alpha: i64,
    pub background_padding: i64,
    pub enable_finder_overlay: bool,
    pub finder_overlay_padding: i64,
    pub reduce_innermost_brightness: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            data: DEFAULT_DATA.to_string(),
            background_mode: BackgroundMode::default(),
            finder_shape: FinderShape::default(),
            finder_color_mode: FinderColorMode::default(),
            finder_dynamic_submode: FinderDynamicSubmode::default(),
            data_module_shape: DataModuleShape::default(),
            data_module_color_mode: DataModuleColorMode::default(),
            box_size: 25,
            border: 4,
            padding: 4,
            error_correction: ErrorCorrection::default(),
            background_alpha: 255,
            background_padding: 60,
            enable_finder_overlay: true,
            finder_overlay_padding: 15,
            reduce_innermost_brightness: true,
        }
    }
}

fn read_enum<T: FromStr>(form: &FormState, id: FieldId) -> Result<T, ValidationError> {
    let text = form.text(id);
    text.parse().map_err(|_| ValidationError::InvalidField {
        field: id.key(),
        value: text.to_string(),
    })
}

fn read_int(form: &FormState, id: FieldId) -> Result<i64, ValidationError> {
    let text = form.text(id);
    parse_leading_int(text).ok_or_else(|| ValidationError::InvalidField {
        field: id.key(),
        value: text.to_string(),
    })
}

impl GenerationParams {
    /// Reads the typed parameters out of the raw form. The payload is trimmed.
    pub fn from_form(form: &FormState) -> Result<Self, ValidationError> {
        Ok(Self {
            data: form.text(FieldId::Data).trim().to_string(),
            background_mode: read_enum(form, FieldId::BackgroundMode)?,
            finder_shape: read_enum(form, FieldId::FinderShape)?,
            finder_color_mode: read_enum(form, FieldId::FinderColorMode)?,
            finder_dynamic_submode: read_enum(form, FieldId::FinderDynamicSubmode)?,
            data_module_shape: read_enum(form, FieldId::DataModuleShape)?,
            data_module_color_mode: read_enum(form, FieldId::DataModuleColorMode)?,
            box_size: read_int(form, FieldId::BoxSize)?,
            border: read_int(form, FieldId::Border)?,
            padding: read_int(form, FieldId::Padding)?,
            error_correction: read_enum(form, FieldId::ErrorCorrection)?,
            background_alpha: read_int(form, FieldId::BackgroundAlpha)?,
            background_padding: read_int(form, FieldId::BackgroundPadding)?,
            enable_finder_overlay: form.checked(FieldId::EnableFinderOverlay),
            finder_overlay_padding: read_int(form, FieldId::FinderOverlayPadding)?,
            reduce_innermost_brightness: form.checked(FieldId::ReduceInnermostBrightness),
        })
    }

    fn raw_value(&self, id: FieldId) -> FieldValue {
        let text = |s: &str| FieldValue::Text(s.to_string());
        match id {
            FieldId::Data => text(&self.data),
            FieldId::BackgroundMode => text(self.background_mode.as_str()),
            FieldId::FinderShape => text(self.finder_shape.as_str()),
            FieldId::FinderColorMode => text(self.finder_color_mode.as_str()),
            FieldId::FinderDynamicSubmode => text(self.finder_dynamic_submode.as_str()),
            FieldId::DataModuleShape => text(self.data_module_shape.as_str()),
            FieldId::DataModuleColorMode => text(self.data_module_color_mode.as_str()),
            FieldId::BoxSize => text(&self.box_size.to_string()),
            FieldId::Border => text(&self.border.to_string()),
            FieldId::Padding => text(&self.padding.to_string()),
            FieldId::ErrorCorrection => text(self.error_correction.as_str()),
            FieldId::BackgroundAlpha => text(&self.background_alpha.to_string()),
            FieldId::BackgroundPadding => text(&self.background_padding.to_string()),
            FieldId::EnableFinderOverlay => FieldValue::Checked(self.enable_finder_overlay),
            FieldId::FinderOverlayPadding => text(&self.finder_overlay_padding.to_string()),
            FieldId::ReduceInnermostBrightness => {
                FieldValue::Checked(self.reduce_innermost_brightness)
            }
        }
    }

    /// Multipart text fields for `/api/generate`, in the order the service documents them.
    pub fn multipart_fields(&self, filename: &str) -> Vec<(&'static str, String)> {
        let mut fields = vec![("filename", filename.to_string())];
        for id in FieldId::ALL {
            let value = match self.raw_value(id) {
                FieldValue::Text(text) => text,
                FieldValue::Checked(checked) => checked.to_string(),
            };
            fields.push((id.key(), value));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_form_reads_as_default_params() {
        let params = GenerationParams::from_form(&FormState::new()).unwrap();
        assert_eq!(params, GenerationParams::default());
        assert_eq!(params.finder_shape, FinderShape::RoundedSquare);
        assert_eq!(params.error_correction, ErrorCorrection::H);
    }

    #[test]
    fn default_visibility_shows_both_groups() {
        let form = FormState::new();
        assert_eq!(
            form.visibility(),
            Visibility { finder_submode: true, overlay_padding: true }
        );
    }

    #[test]
    fn visibility_follows_color_mode_and_overlay_flag() {
        let mut form = FormState::new();
        form.set_json(FieldId::FinderColorMode, &json!("static"));
        form.set_json(FieldId::EnableFinderOverlay, &json!(false));
        assert_eq!(
            form.visibility(),
            Visibility { finder_submode: false, overlay_padding: false }
        );
    }

    #[test]
    fn payload_is_trimmed_on_read() {
        let mut form = FormState::new();
        form.set_json(FieldId::Data, &json!("  hello \n"));
        assert_eq!(GenerationParams::from_form(&form).unwrap().data, "hello");
    }

    #[test]
    fn integers_read_like_a_leading_parse() {
        assert_eq!(parse_leading_int("25"), Some(25));
        assert_eq!(parse_leading_int(" 12px"), Some(12));
        assert_eq!(parse_leading_int("25.7"), Some(25));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn unreadable_field_names_itself() {
        let mut form = FormState::new();
        form.set_json(FieldId::BoxSize, &json!("huge"));
        let err = GenerationParams::from_form(&form).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidField { field: "box_size", value: "huge".to_string() }
        );

        let mut form = FormState::new();
        form.set_json(FieldId::FinderShape, &json!("hexagon"));
        assert!(GenerationParams::from_form(&form).is_err());
    }

    #[test]
    fn checkbox_takes_truthiness() {
        let mut form = FormState::new();
        form.set_json(FieldId::ReduceInnermostBrightness, &json!(0));
        assert!(!form.checked(FieldId::ReduceInnermostBrightness));
        form.set_json(FieldId::ReduceInnermostBrightness, &json!("yes"));
        assert!(form.checked(FieldId::ReduceInnermostBrightness));
    }

    #[test]
    fn multipart_fields_follow_wire_order() {
        let fields = GenerationParams::default().multipart_fields("cat.png");
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys[0], "filename");
        assert_eq!(keys[1], "data");
        assert_eq!(keys.last(), Some(&"reduce_innermost_brightness"));
        assert_eq!(fields.len(), 17);
        assert!(fields.contains(&("box_size", "25".to_string())));
        assert!(fields.contains(&("enable_finder_overlay", "true".to_string())));
        assert!(fields.contains(&("finder_dynamic_submode", "single-color".to_string())));
    }

    #[test]
    fn range_controls_report_their_text() {
        let ranges = FormState::new().range_values();
        assert_eq!(
            ranges,
            vec![
                (FieldId::BoxSize, "25".to_string()),
                (FieldId::BackgroundAlpha, "255".to_string()),
                (FieldId::BackgroundPadding, "60".to_string()),
                (FieldId::FinderOverlayPadding, "15".to_string()),
            ]
        );
    }
}
