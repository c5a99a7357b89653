// Karabiner Conditions
// Predicates that scope a manipulator to apps, devices, variables and input sources

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::action::VariableValue;
use crate::error::{ConfigurationError, UnknownIdentifierError};
use crate::key::lookup;

/// A scoping predicate on a manipulator.
///
/// All conditions attached to one manipulator must hold for it to fire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    FrontmostApplicationIf(ApplicationMatch),
    FrontmostApplicationUnless(ApplicationMatch),
    DeviceIf(DeviceMatch),
    DeviceUnless(DeviceMatch),
    DeviceExistsIf(DeviceMatch),
    DeviceExistsUnless(DeviceMatch),
    KeyboardTypeIf(KeyboardTypeMatch),
    KeyboardTypeUnless(KeyboardTypeMatch),
    InputSourceIf(InputSourceMatch),
    InputSourceUnless(InputSourceMatch),
    VariableIf(VariableMatch),
    VariableUnless(VariableMatch),
    EventChangedIf(EventChangedMatch),
    EventChangedUnless(EventChangedMatch),
}

impl Condition {
    /// Only when one of the bundle identifier patterns matches the frontmost app
    pub fn app_if<I, S>(bundle_identifiers: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ApplicationMatch::bundles(bundle_identifiers).map(Condition::FrontmostApplicationIf)
    }

    pub fn app_unless<I, S>(bundle_identifiers: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ApplicationMatch::bundles(bundle_identifiers).map(Condition::FrontmostApplicationUnless)
    }

    pub fn device_if(
        identifiers: impl IntoIterator<Item = DeviceIdentifier>,
    ) -> Result<Self, ConfigurationError> {
        DeviceMatch::new("device_if", identifiers).map(Condition::DeviceIf)
    }

    pub fn device_unless(
        identifiers: impl IntoIterator<Item = DeviceIdentifier>,
    ) -> Result<Self, ConfigurationError> {
        DeviceMatch::new("device_unless", identifiers).map(Condition::DeviceUnless)
    }

    pub fn device_exists_if(
        identifiers: impl IntoIterator<Item = DeviceIdentifier>,
    ) -> Result<Self, ConfigurationError> {
        DeviceMatch::new("device_exists_if", identifiers).map(Condition::DeviceExistsIf)
    }

    pub fn device_exists_unless(
        identifiers: impl IntoIterator<Item = DeviceIdentifier>,
    ) -> Result<Self, ConfigurationError> {
        DeviceMatch::new("device_exists_unless", identifiers).map(Condition::DeviceExistsUnless)
    }

    pub fn keyboard_type_if(
        types: impl IntoIterator<Item = KeyboardType>,
    ) -> Result<Self, ConfigurationError> {
        KeyboardTypeMatch::new("keyboard_type_if", types).map(Condition::KeyboardTypeIf)
    }

    pub fn keyboard_type_unless(
        types: impl IntoIterator<Item = KeyboardType>,
    ) -> Result<Self, ConfigurationError> {
        KeyboardTypeMatch::new("keyboard_type_unless", types).map(Condition::KeyboardTypeUnless)
    }

    pub fn input_source_if(
        sources: impl IntoIterator<Item = InputSource>,
    ) -> Result<Self, ConfigurationError> {
        InputSourceMatch::new("input_source_if", sources).map(Condition::InputSourceIf)
    }

    pub fn input_source_unless(
        sources: impl IntoIterator<Item = InputSource>,
    ) -> Result<Self, ConfigurationError> {
        InputSourceMatch::new("input_source_unless", sources).map(Condition::InputSourceUnless)
    }

    pub fn variable_if(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Condition::VariableIf(VariableMatch::new(name, value))
    }

    pub fn variable_unless(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Condition::VariableUnless(VariableMatch::new(name, value))
    }

    pub fn event_changed_if(value: bool) -> Self {
        Condition::EventChangedIf(EventChangedMatch { value })
    }

    pub fn event_changed_unless(value: bool) -> Self {
        Condition::EventChangedUnless(EventChangedMatch { value })
    }
}

/// Frontmost application patterns (regular expressions)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ApplicationMatch {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bundle_identifiers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    file_paths: Vec<String>,
}

impl ApplicationMatch {
    pub fn new<B, P, S, T>(bundle_identifiers: B, file_paths: P) -> Result<Self, ConfigurationError>
    where
        B: IntoIterator<Item = S>,
        P: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let bundle_identifiers = validate_patterns(bundle_identifiers)?;
        let file_paths = validate_patterns(file_paths)?;
        if bundle_identifiers.is_empty() && file_paths.is_empty() {
            return Err(ConfigurationError::EmptyCondition {
                condition: "frontmost_application",
                field: "bundle identifier or file path",
            });
        }
        Ok(Self {
            bundle_identifiers,
            file_paths,
        })
    }

    pub fn bundles<I, S>(bundle_identifiers: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(bundle_identifiers, std::iter::empty::<String>())
    }

    pub fn paths<I, S>(file_paths: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(std::iter::empty::<String>(), file_paths)
    }

    pub fn bundle_identifiers(&self) -> &[String] {
        &self.bundle_identifiers
    }

    pub fn file_paths(&self) -> &[String] {
        &self.file_paths
    }
}

fn validate_patterns<I, S>(patterns: I) -> Result<Vec<String>, ConfigurationError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    patterns
        .into_iter()
        .map(Into::into)
        .map(|pattern| match Regex::new(&pattern) {
            Ok(_) => Ok(pattern),
            Err(e) => Err(ConfigurationError::InvalidPattern {
                reason: e.to_string(),
                pattern,
            }),
        })
        .collect()
}

/// Hardware identity of a device; every unset field matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceIdentifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_keyboard: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pointing_device: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_touch_bar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_built_in_keyboard: Option<bool>,
}

impl DeviceIdentifier {
    /// A keyboard identified by USB vendor and product id
    pub fn keyboard(vendor_id: u32, product_id: u32) -> Self {
        Self {
            vendor_id: Some(vendor_id),
            product_id: Some(product_id),
            is_keyboard: Some(true),
            ..Self::default()
        }
    }

    pub fn built_in_keyboard() -> Self {
        Self {
            is_built_in_keyboard: Some(true),
            ..Self::default()
        }
    }

    pub fn vendor_id(mut self, id: u32) -> Self {
        self.vendor_id = Some(id);
        self
    }

    pub fn product_id(mut self, id: u32) -> Self {
        self.product_id = Some(id);
        self
    }

    pub fn location_id(mut self, id: u32) -> Self {
        self.location_id = Some(id);
        self
    }

    pub fn device_address(mut self, address: impl Into<String>) -> Self {
        self.device_address = Some(address.into());
        self
    }

    pub fn is_keyboard(mut self, value: bool) -> Self {
        self.is_keyboard = Some(value);
        self
    }

    pub fn is_pointing_device(mut self, value: bool) -> Self {
        self.is_pointing_device = Some(value);
        self
    }

    pub fn is_touch_bar(mut self, value: bool) -> Self {
        self.is_touch_bar = Some(value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceMatch {
    identifiers: Vec<DeviceIdentifier>,
}

impl DeviceMatch {
    fn new(
        condition: &'static str,
        identifiers: impl IntoIterator<Item = DeviceIdentifier>,
    ) -> Result<Self, ConfigurationError> {
        let identifiers: Vec<_> = identifiers.into_iter().collect();
        if identifiers.is_empty() {
            return Err(ConfigurationError::EmptyCondition {
                condition,
                field: "device identifier",
            });
        }
        Ok(Self { identifiers })
    }

    pub fn identifiers(&self) -> &[DeviceIdentifier] {
        &self.identifiers
    }
}

/// Physical keyboard layout family
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum KeyboardType {
    #[strum(serialize = "ansi")]
    Ansi,
    #[strum(serialize = "iso")]
    Iso,
    #[strum(serialize = "jis")]
    Jis,
}

impl KeyboardType {
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    pub fn from_name(name: &str) -> Result<Self, UnknownIdentifierError> {
        lookup(name, KeyboardType::wire_name)
            .ok_or_else(|| UnknownIdentifierError::new("keyboard type", name.trim()))
    }
}

impl fmt::Display for KeyboardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for KeyboardType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardTypeMatch {
    keyboard_types: Vec<KeyboardType>,
}

impl KeyboardTypeMatch {
    fn new(
        condition: &'static str,
        types: impl IntoIterator<Item = KeyboardType>,
    ) -> Result<Self, ConfigurationError> {
        let keyboard_types: Vec<_> = types.into_iter().collect();
        if keyboard_types.is_empty() {
            return Err(ConfigurationError::EmptyCondition {
                condition,
                field: "keyboard type",
            });
        }
        Ok(Self { keyboard_types })
    }
}

/// Input source patterns; each set field is a regular expression
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InputSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_mode_id: Option<String>,
}

impl InputSource {
    pub fn language(pattern: impl Into<String>) -> Self {
        Self {
            language: Some(pattern.into()),
            ..Self::default()
        }
    }

    pub fn source_id(pattern: impl Into<String>) -> Self {
        Self {
            input_source_id: Some(pattern.into()),
            ..Self::default()
        }
    }

    fn patterns(&self) -> impl Iterator<Item = &String> {
        [&self.language, &self.input_source_id, &self.input_mode_id]
            .into_iter()
            .flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputSourceMatch {
    input_sources: Vec<InputSource>,
}

impl InputSourceMatch {
    fn new(
        condition: &'static str,
        sources: impl IntoIterator<Item = InputSource>,
    ) -> Result<Self, ConfigurationError> {
        let input_sources: Vec<_> = sources.into_iter().collect();
        if input_sources.is_empty() {
            return Err(ConfigurationError::EmptyCondition {
                condition,
                field: "input source",
            });
        }
        for source in &input_sources {
            validate_patterns(source.patterns().cloned())?;
        }
        Ok(Self { input_sources })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableMatch {
    pub name: String,
    pub value: VariableValue,
}

impl VariableMatch {
    pub fn new(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventChangedMatch {
    pub value: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frontmost_application_shape() {
        let cond = Condition::app_if(["^com\\.apple\\.Terminal$"]).unwrap();
        assert_eq!(
            serde_json::to_value(&cond).unwrap(),
            json!({
                "type": "frontmost_application_if",
                "bundle_identifiers": ["^com\\.apple\\.Terminal$"]
            })
        );
    }

    #[test]
    fn test_file_path_only_application() {
        let app = ApplicationMatch::paths(["/Applications/Emacs.app"]).unwrap();
        let cond = Condition::FrontmostApplicationUnless(app);
        assert_eq!(
            serde_json::to_value(&cond).unwrap(),
            json!({ "type": "frontmost_application_unless", "file_paths": ["/Applications/Emacs.app"] })
        );
    }

    #[test]
    fn test_empty_application_rejected() {
        let err = Condition::app_if(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyCondition { .. }));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = Condition::app_unless(["com.(broken"]).unwrap_err();
        match err {
            ConfigurationError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "com.(broken"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_device_condition_omits_unset_fields() {
        let cond = Condition::device_if([DeviceIdentifier::keyboard(1452, 835)]).unwrap();
        assert_eq!(
            serde_json::to_value(&cond).unwrap(),
            json!({
                "type": "device_if",
                "identifiers": [{ "vendor_id": 1452, "product_id": 835, "is_keyboard": true }]
            })
        );
        assert!(Condition::device_exists_unless(Vec::new()).is_err());
    }

    #[test]
    fn test_variable_and_event_conditions() {
        assert_eq!(
            serde_json::to_value(Condition::variable_if("f-layer", 1)).unwrap(),
            json!({ "type": "variable_if", "name": "f-layer", "value": 1 })
        );
        assert_eq!(
            serde_json::to_value(Condition::event_changed_unless(true)).unwrap(),
            json!({ "type": "event_changed_unless", "value": true })
        );
    }

    #[test]
    fn test_keyboard_type_and_input_source() {
        let kind = Condition::keyboard_type_if([KeyboardType::from_name("ISO").unwrap()]).unwrap();
        assert_eq!(
            serde_json::to_value(&kind).unwrap(),
            json!({ "type": "keyboard_type_if", "keyboard_types": ["iso"] })
        );
        assert!(KeyboardType::from_name("dvorak").is_err());

        let source = Condition::input_source_if([InputSource::language("^en$")]).unwrap();
        assert_eq!(
            serde_json::to_value(&source).unwrap(),
            json!({ "type": "input_source_if", "input_sources": [{ "language": "^en$" }] })
        );
        assert!(Condition::input_source_unless([InputSource::source_id("[")]).is_err());
    }
}
