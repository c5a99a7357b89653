// Karabiner Mapping Records
// Manipulators (input spec, outputs, conditions, timing) and the rules that group them

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::action::OutputAction;
use crate::condition::Condition;
use crate::error::ConfigurationError;
use crate::key::{Key, PointingButton};
use crate::modifier::ModifierSet;

/// What a manipulator listens for
#[derive(Debug, Clone, PartialEq)]
pub enum InputSpec {
    Key {
        key: Key,
        modifiers: ModifierSet,
    },
    PointingButton {
        button: PointingButton,
        modifiers: ModifierSet,
    },
    /// Two or more keys pressed within the simultaneous threshold
    Simultaneous {
        keys: Vec<Key>,
        options: SimultaneousOptions,
        modifiers: ModifierSet,
    },
}

impl InputSpec {
    pub fn key(key: impl Into<Key>, modifiers: ModifierSet) -> Self {
        InputSpec::Key {
            key: key.into(),
            modifiers,
        }
    }

    pub fn button(button: PointingButton, modifiers: ModifierSet) -> Self {
        InputSpec::PointingButton { button, modifiers }
    }

    /// A chord of at least two distinct keys
    pub fn simultaneous(
        keys: impl IntoIterator<Item = Key>,
        options: SimultaneousOptions,
        modifiers: ModifierSet,
    ) -> Result<Self, ConfigurationError> {
        let keys: Vec<Key> = keys.into_iter().collect();
        if keys.len() < 2 {
            return Err(ConfigurationError::ChordTooShort(keys.len()));
        }
        for (i, key) in keys.iter().enumerate() {
            if keys[..i].contains(key) {
                return Err(ConfigurationError::ChordDuplicateKey(key.wire_name().to_string()));
            }
        }
        Ok(InputSpec::Simultaneous {
            keys,
            options,
            modifiers,
        })
    }

    pub fn modifiers(&self) -> &ModifierSet {
        match self {
            InputSpec::Key { modifiers, .. }
            | InputSpec::PointingButton { modifiers, .. }
            | InputSpec::Simultaneous { modifiers, .. } => modifiers,
        }
    }

    /// The key of a single-key input
    pub fn single_key(&self) -> Option<Key> {
        match self {
            InputSpec::Key { key, .. } => Some(*key),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct SimultaneousEntry {
    key_code: Key,
}

impl Serialize for InputSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            InputSpec::Key { key, .. } => map.serialize_entry("key_code", key)?,
            InputSpec::PointingButton { button, .. } => {
                map.serialize_entry("pointing_button", button)?
            }
            InputSpec::Simultaneous { keys, .. } => {
                let entries: Vec<SimultaneousEntry> = keys
                    .iter()
                    .map(|&key_code| SimultaneousEntry { key_code })
                    .collect();
                map.serialize_entry("simultaneous", &entries)?;
            }
        }
        let modifiers = self.modifiers();
        if !modifiers.is_empty() {
            map.serialize_entry("modifiers", modifiers)?;
        }
        if let InputSpec::Simultaneous { options, .. } = self {
            if !options.is_empty() {
                map.serialize_entry("simultaneous_options", options)?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    Insensitive,
    Strict,
    StrictInverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyUpWhen {
    Any,
    All,
}

/// Chord behavior; unset fields fall back to the engine defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimultaneousOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detect_key_down_uninterruptedly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_down_order: Option<KeyOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_up_order: Option<KeyOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_up_when: Option<KeyUpWhen>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to_after_key_up: Vec<OutputAction>,
}

impl SimultaneousOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Timing thresholds in milliseconds.
///
/// Rule files use the short field names; the document uses `basic.*`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    #[serde(
        rename(serialize = "basic.simultaneous_threshold_milliseconds"),
        skip_serializing_if = "Option::is_none"
    )]
    pub simultaneous_threshold_ms: Option<u64>,
    #[serde(
        rename(serialize = "basic.to_delayed_action_delay_milliseconds"),
        skip_serializing_if = "Option::is_none"
    )]
    pub to_delayed_action_delay_ms: Option<u64>,
    #[serde(
        rename(serialize = "basic.to_if_alone_timeout_milliseconds"),
        skip_serializing_if = "Option::is_none"
    )]
    pub to_if_alone_timeout_ms: Option<u64>,
    #[serde(
        rename(serialize = "basic.to_if_held_down_threshold_milliseconds"),
        skip_serializing_if = "Option::is_none"
    )]
    pub to_if_held_down_threshold_ms: Option<u64>,
}

impl Parameters {
    /// The engine's own defaults
    pub fn engine_defaults() -> Self {
        Self {
            simultaneous_threshold_ms: Some(50),
            to_delayed_action_delay_ms: Some(500),
            to_if_alone_timeout_ms: Some(1000),
            to_if_held_down_threshold_ms: Some(500),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fill every unset field from `fallback`
    pub fn or(self, fallback: Parameters) -> Self {
        Self {
            simultaneous_threshold_ms: self
                .simultaneous_threshold_ms
                .or(fallback.simultaneous_threshold_ms),
            to_delayed_action_delay_ms: self
                .to_delayed_action_delay_ms
                .or(fallback.to_delayed_action_delay_ms),
            to_if_alone_timeout_ms: self.to_if_alone_timeout_ms.or(fallback.to_if_alone_timeout_ms),
            to_if_held_down_threshold_ms: self
                .to_if_held_down_threshold_ms
                .or(fallback.to_if_held_down_threshold_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ManipulatorType {
    Basic,
}

/// One low-level mapping.
///
/// Built by [`crate::ManipulatorBuilder`] or the layer compiler and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manipulator {
    #[serde(rename = "type")]
    kind: ManipulatorType,
    from: InputSpec,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    to: Vec<OutputAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    to_if_alone: Vec<OutputAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    to_after_key_up: Vec<OutputAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    to_if_held_down: Vec<OutputAction>,
    #[serde(skip_serializing_if = "Parameters::is_empty")]
    parameters: Parameters,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Everything but the input, as collected by a builder
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ManipulatorParts {
    pub to: Vec<OutputAction>,
    pub to_if_alone: Vec<OutputAction>,
    pub to_after_key_up: Vec<OutputAction>,
    pub to_if_held_down: Vec<OutputAction>,
    pub parameters: Parameters,
    pub conditions: Vec<Condition>,
    pub description: Option<String>,
}

impl Manipulator {
    pub(crate) fn new(from: InputSpec, parts: ManipulatorParts) -> Self {
        Self {
            kind: ManipulatorType::Basic,
            from,
            to: parts.to,
            to_if_alone: parts.to_if_alone,
            to_after_key_up: parts.to_after_key_up,
            to_if_held_down: parts.to_if_held_down,
            parameters: parts.parameters,
            conditions: parts.conditions,
            description: parts.description,
        }
    }

    pub fn from(&self) -> &InputSpec {
        &self.from
    }

    pub fn to(&self) -> &[OutputAction] {
        &self.to
    }

    pub fn to_if_alone(&self) -> &[OutputAction] {
        &self.to_if_alone
    }

    pub fn to_after_key_up(&self) -> &[OutputAction] {
        &self.to_after_key_up
    }

    pub fn to_if_held_down(&self) -> &[OutputAction] {
        &self.to_if_held_down
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A described, ordered group of manipulators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    description: String,
    manipulators: Vec<Manipulator>,
}

impl Rule {
    pub fn new(description: impl Into<String>, manipulators: Vec<Manipulator>) -> Self {
        Self {
            description: description.into(),
            manipulators,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn manipulators(&self) -> &[Manipulator] {
        &self.manipulators
    }
}
