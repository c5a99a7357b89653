// Karabiner Output Actions
// The events a manipulator emits: keys, commands, variables, pointer actions

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ConfigurationError;
use crate::key::{Key, PointingButton};
use crate::modifier::{ModifierKey, Modifiers};

/// A single output event (`to`, `to_if_alone`, ... entries).
///
/// Exactly one kind of event per action; a mapping's output is an ordered
/// list of these, fired in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputAction {
    Key {
        key_code: Key,
        #[serde(skip_serializing_if = "SmallVec::is_empty")]
        modifiers: Modifiers,
    },
    ConsumerKey {
        consumer_key_code: String,
        #[serde(skip_serializing_if = "SmallVec::is_empty")]
        modifiers: Modifiers,
    },
    ShellCommand {
        shell_command: String,
    },
    SetVariable {
        set_variable: SetVariable,
    },
    MouseKey {
        mouse_key: MouseKey,
    },
    PointingButton {
        pointing_button: PointingButton,
        #[serde(skip_serializing_if = "SmallVec::is_empty")]
        modifiers: Modifiers,
    },
    SoftwareFunction {
        software_function: SoftwareFunction,
    },
}

impl OutputAction {
    pub fn key(key: impl Into<Key>) -> Self {
        OutputAction::Key {
            key_code: key.into(),
            modifiers: Modifiers::new(),
        }
    }

    /// Key press with modifiers held, e.g. Shift+9
    pub fn key_with(key: impl Into<Key>, modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        OutputAction::Key {
            key_code: key.into(),
            modifiers: modifiers.into_iter().collect(),
        }
    }

    pub fn consumer_key(code: impl Into<String>) -> Self {
        OutputAction::ConsumerKey {
            consumer_key_code: code.into(),
            modifiers: Modifiers::new(),
        }
    }

    pub fn shell(command: impl Into<String>) -> Self {
        OutputAction::ShellCommand {
            shell_command: command.into(),
        }
    }

    pub fn set_variable(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        OutputAction::SetVariable {
            set_variable: SetVariable::new(name, value),
        }
    }

    pub fn mouse(mouse_key: MouseKey) -> Self {
        OutputAction::MouseKey { mouse_key }
    }

    pub fn button(button: PointingButton) -> Self {
        OutputAction::PointingButton {
            pointing_button: button,
            modifiers: Modifiers::new(),
        }
    }

    pub fn software(function: SoftwareFunction) -> Self {
        OutputAction::SoftwareFunction {
            software_function: function,
        }
    }

    /// Attach modifiers to a key, consumer key or button press.
    ///
    /// Any other kind of action is rejected with
    /// [`ConfigurationError::ModifiersNotAllowed`].
    pub fn with_modifiers(
        mut self,
        extra: impl IntoIterator<Item = ModifierKey>,
    ) -> Result<Self, ConfigurationError> {
        match self {
            OutputAction::Key {
                ref mut modifiers, ..
            }
            | OutputAction::ConsumerKey {
                ref mut modifiers, ..
            }
            | OutputAction::PointingButton {
                ref mut modifiers, ..
            } => modifiers.extend(extra),
            ref other => return Err(ConfigurationError::ModifiersNotAllowed(other.slot_name())),
        }
        Ok(self)
    }

    /// The rule-file slot this action fills
    fn slot_name(&self) -> &'static str {
        match self {
            OutputAction::Key { .. } => "key",
            OutputAction::ConsumerKey { .. } => "consumer",
            OutputAction::ShellCommand { .. } => "shell",
            OutputAction::SetVariable { .. } => "set_variable",
            OutputAction::MouseKey { .. } => "mouse",
            OutputAction::PointingButton { .. } => "button",
            OutputAction::SoftwareFunction { .. } => "software_function",
        }
    }
}

impl From<Key> for OutputAction {
    fn from(key: Key) -> Self {
        OutputAction::key(key)
    }
}

impl From<crate::key::KeyCode> for OutputAction {
    fn from(code: crate::key::KeyCode) -> Self {
        OutputAction::key(code)
    }
}

impl From<ModifierKey> for OutputAction {
    fn from(modifier: ModifierKey) -> Self {
        OutputAction::key(modifier)
    }
}

impl From<PointingButton> for OutputAction {
    fn from(button: PointingButton) -> Self {
        OutputAction::button(button)
    }
}

impl From<MouseKey> for OutputAction {
    fn from(mouse_key: MouseKey) -> Self {
        OutputAction::mouse(mouse_key)
    }
}

/// Value stored in a Karabiner variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        VariableValue::Bool(value)
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        VariableValue::Int(value)
    }
}

impl From<i32> for VariableValue {
    fn from(value: i32) -> Self {
        VariableValue::Int(value.into())
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Text(value.to_string())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetVariable {
    pub name: String,
    pub value: VariableValue,
}

impl SetVariable {
    pub fn new(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Pointer movement and scrolling, in Karabiner's relative units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MouseKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_wheel: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_wheel: Option<i32>,
}

impl MouseKey {
    pub fn movement(x: i32, y: i32) -> Self {
        Self {
            x: (x != 0).then_some(x),
            y: (y != 0).then_some(y),
            ..Self::default()
        }
    }

    pub fn scroll(vertical: i32, horizontal: i32) -> Self {
        Self {
            vertical_wheel: (vertical != 0).then_some(vertical),
            horizontal_wheel: (horizontal != 0).then_some(horizontal),
            ..Self::default()
        }
    }

    pub fn speed(multiplier: f64) -> Self {
        Self {
            speed_multiplier: Some(multiplier),
            ..Self::default()
        }
    }
}

/// Built-in functions of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoftwareFunction {
    IokitPowerManagementSleepSystem {},
    OpenApplication {
        #[serde(skip_serializing_if = "Option::is_none")]
        bundle_identifier: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_path: Option<String>,
    },
    CgEventDoubleClick {
        button: u8,
    },
}

impl SoftwareFunction {
    pub fn sleep_system() -> Self {
        SoftwareFunction::IokitPowerManagementSleepSystem {}
    }

    pub fn open_bundle(bundle_identifier: impl Into<String>) -> Self {
        SoftwareFunction::OpenApplication {
            bundle_identifier: Some(bundle_identifier.into()),
            file_path: None,
        }
    }

    pub fn open_path(file_path: impl Into<String>) -> Self {
        SoftwareFunction::OpenApplication {
            bundle_identifier: None,
            file_path: Some(file_path.into()),
        }
    }
}

/// Slot-by-slot construction of an [`OutputAction`].
///
/// Used where the output kind is not known statically (rule files): each
/// slot may be filled, and `build()` insists that exactly one was.
#[derive(Debug, Clone, Default)]
pub struct OutputSlots {
    key: Option<Key>,
    modifiers: Modifiers,
    consumer_key: Option<String>,
    shell_command: Option<String>,
    set_variable: Option<SetVariable>,
    mouse_key: Option<MouseKey>,
    pointing_button: Option<PointingButton>,
    software_function: Option<SoftwareFunction>,
}

impl OutputSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn modifiers(mut self, modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn consumer_key(mut self, code: impl Into<String>) -> Self {
        self.consumer_key = Some(code.into());
        self
    }

    pub fn shell(mut self, command: impl Into<String>) -> Self {
        self.shell_command = Some(command.into());
        self
    }

    pub fn set_variable(mut self, variable: SetVariable) -> Self {
        self.set_variable = Some(variable);
        self
    }

    pub fn mouse(mut self, mouse_key: MouseKey) -> Self {
        self.mouse_key = Some(mouse_key);
        self
    }

    pub fn button(mut self, button: PointingButton) -> Self {
        self.pointing_button = Some(button);
        self
    }

    pub fn software(mut self, function: SoftwareFunction) -> Self {
        self.software_function = Some(function);
        self
    }

    pub fn build(self) -> Result<OutputAction, ConfigurationError> {
        let filled: Vec<&str> = [
            ("key", self.key.is_some()),
            ("consumer", self.consumer_key.is_some()),
            ("shell", self.shell_command.is_some()),
            ("set_variable", self.set_variable.is_some()),
            ("mouse", self.mouse_key.is_some()),
            ("button", self.pointing_button.is_some()),
            ("software_function", self.software_function.is_some()),
        ]
        .into_iter()
        .filter_map(|(slot, set)| set.then_some(slot))
        .collect();

        if filled.len() > 1 {
            return Err(ConfigurationError::AmbiguousOutput(filled.join(", ")));
        }

        let action = if let Some(key) = self.key {
            OutputAction::key(key)
        } else if let Some(code) = self.consumer_key {
            OutputAction::consumer_key(code)
        } else if let Some(command) = self.shell_command {
            OutputAction::shell(command)
        } else if let Some(variable) = self.set_variable {
            OutputAction::SetVariable {
                set_variable: variable,
            }
        } else if let Some(mouse_key) = self.mouse_key {
            OutputAction::mouse(mouse_key)
        } else if let Some(button) = self.pointing_button {
            OutputAction::button(button)
        } else if let Some(function) = self.software_function {
            OutputAction::software(function)
        } else {
            return Err(ConfigurationError::EmptyOutput);
        };

        if self.modifiers.is_empty() {
            Ok(action)
        } else {
            action.with_modifiers(self.modifiers)
        }
    }
}
