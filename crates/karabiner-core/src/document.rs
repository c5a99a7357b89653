// Karabiner Document
// The top-level karabiner.json structure and its pretty-printed serialization

use serde::{Serialize, Serializer};

use crate::action::OutputAction;
use crate::condition::{DeviceIdentifier, KeyboardType};
use crate::error::Result;
use crate::key::Key;
use crate::mapping::{Parameters, Rule};

/// The whole `karabiner.json` document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KarabinerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    global: Option<GlobalSettings>,
    profiles: Vec<Profile>,
}

impl KarabinerConfig {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            global: None,
            profiles,
        }
    }

    pub fn with_global(mut self, global: GlobalSettings) -> Self {
        self.global = Some(global);
        self
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Pretty-printed JSON with 4-space indentation
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GlobalSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_for_updates_on_startup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_in_menu_bar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_profile_name_in_menu_bar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsafe_ui: Option<bool>,
}

/// One named profile: rules plus per-device and global-to-profile settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    name: String,
    complex_modifications: ComplexModifications,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fn_function_keys: Vec<FnFunctionKey>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    simple_modifications: Vec<SimpleModification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected: Option<bool>,
    virtual_hid_keyboard: VirtualHidKeyboard,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    devices: Vec<DeviceConfiguration>,
    #[serde(skip_serializing_if = "ProfileParameters::is_empty")]
    parameters: ProfileParameters,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            complex_modifications: ComplexModifications::default(),
            fn_function_keys: Vec::new(),
            simple_modifications: Vec::new(),
            selected: None,
            virtual_hid_keyboard: VirtualHidKeyboard::default(),
            devices: Vec::new(),
            parameters: ProfileParameters::default(),
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.complex_modifications.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.complex_modifications.rules.extend(rules);
        self
    }

    /// Profile-wide timing thresholds; unset fields get the engine defaults
    pub fn complex_parameters(mut self, parameters: Parameters) -> Self {
        self.complex_modifications.parameters = parameters;
        self
    }

    pub fn simple_modification(mut self, modification: SimpleModification) -> Self {
        self.simple_modifications.push(modification);
        self
    }

    pub fn fn_function_key(mut self, key: FnFunctionKey) -> Self {
        self.fn_function_keys.push(key);
        self
    }

    pub fn device(mut self, device: DeviceConfiguration) -> Self {
        self.devices.push(device);
        self
    }

    pub fn virtual_hid_keyboard(mut self, keyboard: VirtualHidKeyboard) -> Self {
        self.virtual_hid_keyboard = keyboard;
        self
    }

    pub fn parameters(mut self, parameters: ProfileParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn complex_rules(&self) -> &[Rule] {
        &self.complex_modifications.rules
    }

    pub fn devices(&self) -> &[DeviceConfiguration] {
        &self.devices
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct ComplexModifications {
    #[serde(serialize_with = "with_engine_defaults")]
    parameters: Parameters,
    rules: Vec<Rule>,
}

fn with_engine_defaults<S: Serializer>(params: &Parameters, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    params.or(Parameters::engine_defaults()).serialize(serializer)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirtualHidKeyboard {
    pub country_code: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouse_key_xy_scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicate_sticky_modifier_keys_state: Option<bool>,
    pub keyboard_type_v2: KeyboardType,
}

impl Default for VirtualHidKeyboard {
    fn default() -> Self {
        Self {
            country_code: 0,
            mouse_key_xy_scale: None,
            indicate_sticky_modifier_keys_state: None,
            keyboard_type_v2: KeyboardType::Ansi,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_milliseconds_before_open_device: Option<u64>,
}

impl ProfileParameters {
    pub fn is_empty(&self) -> bool {
        self.delay_milliseconds_before_open_device.is_none()
    }
}

/// `{ "key_code": ... }`, the key form used by simple modifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyEntry {
    pub key_code: Key,
}

impl KeyEntry {
    pub fn new(key: impl Into<Key>) -> Self {
        KeyEntry {
            key_code: key.into(),
        }
    }
}

/// One-to-one key replacement applied before complex modifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleModification {
    pub from: KeyEntry,
    pub to: Vec<KeyEntry>,
}

impl SimpleModification {
    pub fn new(from: impl Into<Key>, to: impl Into<Key>) -> Self {
        Self {
            from: KeyEntry::new(from),
            to: vec![KeyEntry::new(to)],
        }
    }
}

/// What an `f1`..`f12` key sends when pressed without fn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FnFunctionKey {
    pub from: KeyEntry,
    pub to: Vec<OutputAction>,
}

impl FnFunctionKey {
    pub fn new(from: impl Into<Key>, to: Vec<OutputAction>) -> Self {
        Self {
            from: KeyEntry::new(from),
            to,
        }
    }
}

/// Per-device settings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceConfiguration {
    pub identifiers: DeviceIdentifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manipulate_caps_lock_led: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub simple_modifications: Vec<SimpleModification>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fn_function_keys: Vec<FnFunctionKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treat_as_built_in_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_built_in_keyboard_if_exists: Option<bool>,
}

impl DeviceConfiguration {
    pub fn new(identifiers: DeviceIdentifier) -> Self {
        Self {
            identifiers,
            ..Self::default()
        }
    }
}
