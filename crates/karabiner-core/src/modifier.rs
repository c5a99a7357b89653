// Karabiner Modifier System
// Modifier key identities and the optional/mandatory modifier sets of an input

use std::fmt;

use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::error::UnknownIdentifierError;
use crate::key::lookup;

/// A modifier key.
///
/// Every modifier is also a valid output key code (see [`crate::Key`]), so
/// a key can be remapped to behave as a modifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ModifierKey {
    #[strum(serialize = "left_control")]
    LeftControl,
    #[strum(serialize = "left_shift")]
    LeftShift,
    #[strum(serialize = "left_option")]
    LeftOption,
    #[strum(serialize = "left_command")]
    LeftCommand,
    #[strum(serialize = "right_control")]
    RightControl,
    #[strum(serialize = "right_shift")]
    RightShift,
    #[strum(serialize = "right_option")]
    RightOption,
    #[strum(serialize = "right_command")]
    RightCommand,
    #[strum(serialize = "fn")]
    Fn,
    // Side-less variants match either side
    #[strum(serialize = "command")]
    Command,
    #[strum(serialize = "control")]
    Control,
    #[strum(serialize = "option")]
    Option,
    #[strum(serialize = "shift")]
    Shift,
    #[strum(serialize = "left_alt")]
    LeftAlt,
    #[strum(serialize = "left_gui")]
    LeftGui,
    #[strum(serialize = "right_alt")]
    RightAlt,
    #[strum(serialize = "right_gui")]
    RightGui,
    /// Wildcard: any modifier state
    #[strum(serialize = "any")]
    Any,
    /// Virtual composite of command, control, option and shift
    #[strum(serialize = "hyper")]
    Hyper,
}

impl ModifierKey {
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    pub fn from_name(name: &str) -> Result<Self, UnknownIdentifierError> {
        lookup(name, ModifierKey::wire_name)
            .ok_or_else(|| UnknownIdentifierError::new("modifier", name.trim()))
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for ModifierKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

/// Inline list of modifiers; real mappings rarely hold more than four.
pub type Modifiers = SmallVec<[ModifierKey; 4]>;

/// Modifier requirements of an input.
///
/// `mandatory` modifiers must be held for the input to match. Among any
/// additional held modifiers, only those listed in `optional` are tolerated.
/// An empty list is omitted from the document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ModifierSet {
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    optional: Modifiers,
    #[serde(skip_serializing_if = "SmallVec::is_empty")]
    mandatory: Modifiers,
}

impl ModifierSet {
    /// No requirements at all (strict matching: any held modifier blocks)
    pub fn none() -> Self {
        Self::default()
    }

    /// `optional: [any]`, the default for inputs declared without modifiers
    pub fn any() -> Self {
        Self::optional([ModifierKey::Any])
    }

    pub fn optional(modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        Self {
            optional: modifiers.into_iter().collect(),
            mandatory: Modifiers::new(),
        }
    }

    pub fn mandatory(modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        Self {
            optional: Modifiers::new(),
            mandatory: modifiers.into_iter().collect(),
        }
    }

    /// Add tolerated modifiers to this set
    pub fn with_optional(mut self, modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        self.optional.extend(modifiers);
        self
    }

    /// Add required modifiers to this set
    pub fn with_mandatory(mut self, modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        self.mandatory.extend(modifiers);
        self
    }

    pub fn optional_keys(&self) -> &[ModifierKey] {
        &self.optional
    }

    pub fn mandatory_keys(&self) -> &[ModifierKey] {
        &self.mandatory
    }

    pub fn is_empty(&self) -> bool {
        self.optional.is_empty() && self.mandatory.is_empty()
    }
}
