// Karabiner Config Parser - TOML with Serde
// Loads a rule file and compiles it into a Karabiner profile

use std::fmt;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;

use super::combo::{modifier_from_alias, parse_combo};
use crate::action::{MouseKey, OutputAction, OutputSlots, SetVariable, SoftwareFunction, VariableValue};
use crate::builder::{manipulator, Conditional, LayerBuilder, ManipulatorBuilder, RuleBuilder};
use crate::condition::{Condition, DeviceIdentifier, KeyboardType};
use crate::document::{
    DeviceConfiguration, FnFunctionKey, GlobalSettings, KarabinerConfig, Profile, ProfileParameters,
    SimpleModification, VirtualHidKeyboard,
};
use crate::error::{ConfigurationError, Error, UnknownIdentifierError};
use crate::key::{Key, PointingButton};
use crate::layer::LayerBinding;
use crate::mapping::{Parameters, Rule};
use crate::modifier::ModifierKey;

/// Rule file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("unknown device alias '{name}' (declare it under [devices.{name}])")]
    UnknownDevice { name: String },

    #[error(transparent)]
    Compile(#[from] Error),
}

impl ConfigError {
    /// The rule compilation error, if this is one
    pub fn compile_error(&self) -> Option<&Error> {
        match self {
            ConfigError::Compile(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UnknownIdentifierError> for ConfigError {
    fn from(e: UnknownIdentifierError) -> Self {
        ConfigError::Compile(e.into())
    }
}

impl From<ConfigurationError> for ConfigError {
    fn from(e: ConfigurationError) -> Self {
        ConfigError::Compile(e.into())
    }
}

/// Main configuration structure (root TOML table)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    #[serde(default)]
    pub profile: ProfileToml,

    pub global: Option<GlobalToml>,

    /// Profile-wide timing thresholds
    #[serde(default)]
    pub parameters: Parameters,

    pub virtual_hid_keyboard: Option<VirtualHidKeyboardToml>,

    /// Named device identifiers, referenced by alias elsewhere
    #[serde(default)]
    pub devices: IndexMap<String, DeviceIdentifier>,

    #[serde(default)]
    pub device_config: Vec<DeviceConfigToml>,

    #[serde(default)]
    pub simple_modification: Vec<SimpleModificationToml>,

    #[serde(default)]
    pub fn_function_key: Vec<FnFunctionKeyToml>,

    #[serde(default)]
    pub rule: Vec<RuleToml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileToml {
    #[serde(default = "default_profile_name")]
    pub name: String,
    #[serde(default = "default_selected")]
    pub selected: bool,
    pub delay_milliseconds_before_open_device: Option<u64>,
}

impl Default for ProfileToml {
    fn default() -> Self {
        Self {
            name: default_profile_name(),
            selected: default_selected(),
            delay_milliseconds_before_open_device: None,
        }
    }
}

fn default_profile_name() -> String {
    "Default".to_string()
}

fn default_selected() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalToml {
    pub check_for_updates_on_startup: Option<bool>,
    pub show_in_menu_bar: Option<bool>,
    pub show_profile_name_in_menu_bar: Option<bool>,
    pub unsafe_ui: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualHidKeyboardToml {
    pub country_code: Option<u32>,
    pub keyboard_type_v2: Option<String>,
    pub mouse_key_xy_scale: Option<u32>,
    pub indicate_sticky_modifier_keys_state: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfigToml {
    /// Alias from `[devices]`
    pub device: String,
    pub ignore: Option<bool>,
    pub manipulate_caps_lock_led: Option<bool>,
    pub treat_as_built_in_keyboard: Option<bool>,
    pub disable_built_in_keyboard_if_exists: Option<bool>,
    #[serde(default)]
    pub simple_modifications: Vec<SimpleModificationToml>,
    #[serde(default)]
    pub fn_function_keys: Vec<FnFunctionKeyToml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimpleModificationToml {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FnFunctionKeyToml {
    pub from: String,
    pub to: OutputListToml,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleToml {
    pub description: String,
    #[serde(default)]
    pub remap: Vec<RemapToml>,
    #[serde(default)]
    pub layer: Vec<LayerToml>,
}

/// One manipulator: a plain remap, dual-role key, chord or button mapping
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemapToml {
    pub from: Option<String>,
    pub from_button: Option<String>,
    #[serde(default)]
    pub simultaneous: Vec<String>,
    pub mandatory: Option<Vec<String>>,
    pub optional: Option<Vec<String>>,
    pub to: Option<OutputListToml>,
    pub alone: Option<OutputListToml>,
    pub after_key_up: Option<OutputListToml>,
    pub held: Option<OutputListToml>,
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub unless_apps: Vec<String>,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub unless_devices: Vec<String>,
    pub if_variable: Option<VariableToml>,
    pub unless_variable: Option<VariableToml>,
    pub parameters: Option<Parameters>,
    pub description: Option<String>,
}

/// Conditions shared by remaps and layer bindings
struct Scope<'a> {
    apps: &'a [String],
    unless_apps: &'a [String],
    devices: &'a [String],
    unless_devices: &'a [String],
    if_variable: Option<&'a VariableToml>,
    unless_variable: Option<&'a VariableToml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableToml {
    pub name: String,
    pub value: VariableValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerToml {
    pub trigger: Option<String>,
    pub threshold_ms: Option<u64>,
    #[serde(default)]
    pub bind: Vec<BindToml>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindToml {
    pub from: Option<String>,
    pub mandatory: Option<Vec<String>>,
    pub optional: Option<Vec<String>>,
    pub to: Option<OutputListToml>,
    #[serde(default)]
    pub apps: Vec<String>,
    #[serde(default)]
    pub unless_apps: Vec<String>,
    #[serde(default)]
    pub devices: Vec<String>,
    #[serde(default)]
    pub unless_devices: Vec<String>,
    pub if_variable: Option<VariableToml>,
    pub unless_variable: Option<VariableToml>,
}

/// One output entry or a list of them
#[derive(Debug, Clone)]
pub enum OutputListToml {
    One(OutputToml),
    Many(Vec<OutputToml>),
}

impl OutputListToml {
    fn entries(&self) -> &[OutputToml] {
        match self {
            OutputListToml::One(entry) => std::slice::from_ref(entry),
            OutputListToml::Many(entries) => entries,
        }
    }
}

/// Output entry: a combo string (`"left_shift-9"`) or a slot table
#[derive(Debug, Clone)]
pub enum OutputToml {
    Combo(String),
    Slots(OutputSlotsToml),
}

// Slot table errors keep the field name reported by `deny_unknown_fields`
struct OutputVisitor;

impl<'de> Visitor<'de> for OutputVisitor {
    type Value = OutputToml;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a key combo string or an output table")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(OutputToml::Combo(value.to_string()))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        OutputSlotsToml::deserialize(de::value::MapAccessDeserializer::new(map))
            .map(OutputToml::Slots)
    }
}

impl<'de> Deserialize<'de> for OutputToml {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OutputVisitor)
    }
}

struct OutputListVisitor;

impl<'de> Visitor<'de> for OutputListVisitor {
    type Value = OutputListToml;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an output entry or an array of output entries")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        OutputVisitor.visit_str(value).map(OutputListToml::One)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        OutputVisitor.visit_map(map).map(OutputListToml::One)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = seq.next_element::<OutputToml>()? {
            entries.push(entry);
        }
        Ok(OutputListToml::Many(entries))
    }
}

impl<'de> Deserialize<'de> for OutputListToml {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OutputListVisitor)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSlotsToml {
    pub key: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub consumer: Option<String>,
    pub shell: Option<String>,
    pub set_variable: Option<VariableToml>,
    pub mouse: Option<MouseKey>,
    pub button: Option<String>,
    pub software_function: Option<SoftwareFunctionToml>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SoftwareFunctionToml {
    #[serde(default)]
    pub sleep_system: bool,
    pub open_bundle: Option<String>,
    pub open_path: Option<String>,
    pub double_click: Option<u8>,
}

/// Validated rule file, ready to render
#[derive(Debug, Clone)]
pub struct Config {
    pub global: Option<GlobalSettings>,
    pub profile: Profile,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        info!("loading rules from {}", path.as_ref().display());
        Self::from_toml(&content)
    }

    /// Load configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_config()
    }

    /// The full document with this single profile
    pub fn to_document(&self) -> KarabinerConfig {
        let document = KarabinerConfig::new(vec![self.profile.clone()]);
        match &self.global {
            Some(global) => document.with_global(global.clone()),
            None => document,
        }
    }
}

impl ConfigToml {
    /// Convert raw TOML tables into a validated profile
    fn to_config(&self) -> Result<Config, ConfigError> {
        let mut profile = Profile::new(self.profile.name.as_str())
            .selected(self.profile.selected)
            .complex_parameters(self.parameters)
            .parameters(ProfileParameters {
                delay_milliseconds_before_open_device: self
                    .profile
                    .delay_milliseconds_before_open_device,
            });

        if let Some(keyboard) = &self.virtual_hid_keyboard {
            profile = profile.virtual_hid_keyboard(keyboard.to_keyboard()?);
        }

        for modification in &self.simple_modification {
            profile = profile.simple_modification(modification.to_modification()?);
        }
        for fn_key in &self.fn_function_key {
            profile = profile.fn_function_key(fn_key.to_fn_key()?);
        }
        for device in &self.device_config {
            profile = profile.device(device.to_device(&self.devices)?);
        }

        for rule in &self.rule {
            profile = profile.rule(rule.to_rule(&self.devices)?);
        }

        debug!(
            "profile '{}': {} rules, {} devices",
            profile.name(),
            profile.complex_rules().len(),
            profile.devices().len()
        );

        Ok(Config {
            global: self.global.as_ref().map(GlobalToml::to_settings),
            profile,
        })
    }
}

impl GlobalToml {
    fn to_settings(&self) -> GlobalSettings {
        GlobalSettings {
            check_for_updates_on_startup: self.check_for_updates_on_startup,
            show_in_menu_bar: self.show_in_menu_bar,
            show_profile_name_in_menu_bar: self.show_profile_name_in_menu_bar,
            unsafe_ui: self.unsafe_ui,
        }
    }
}

impl VirtualHidKeyboardToml {
    fn to_keyboard(&self) -> Result<VirtualHidKeyboard, ConfigError> {
        let mut keyboard = VirtualHidKeyboard::default();
        if let Some(code) = self.country_code {
            keyboard.country_code = code;
        }
        if let Some(name) = &self.keyboard_type_v2 {
            keyboard.keyboard_type_v2 = KeyboardType::from_name(name)?;
        }
        keyboard.mouse_key_xy_scale = self.mouse_key_xy_scale;
        keyboard.indicate_sticky_modifier_keys_state = self.indicate_sticky_modifier_keys_state;
        Ok(keyboard)
    }
}

impl SimpleModificationToml {
    fn to_modification(&self) -> Result<SimpleModification, ConfigError> {
        Ok(SimpleModification::new(parse_key(&self.from)?, parse_key(&self.to)?))
    }
}

impl FnFunctionKeyToml {
    fn to_fn_key(&self) -> Result<FnFunctionKey, ConfigError> {
        Ok(FnFunctionKey::new(parse_key(&self.from)?, self.to.to_actions()?))
    }
}

impl DeviceConfigToml {
    fn to_device(
        &self,
        devices: &IndexMap<String, DeviceIdentifier>,
    ) -> Result<DeviceConfiguration, ConfigError> {
        let mut device = DeviceConfiguration::new(resolve_device(devices, &self.device)?);
        device.ignore = self.ignore;
        device.manipulate_caps_lock_led = self.manipulate_caps_lock_led;
        device.treat_as_built_in_keyboard = self.treat_as_built_in_keyboard;
        device.disable_built_in_keyboard_if_exists = self.disable_built_in_keyboard_if_exists;
        for modification in &self.simple_modifications {
            device.simple_modifications.push(modification.to_modification()?);
        }
        for fn_key in &self.fn_function_keys {
            device.fn_function_keys.push(fn_key.to_fn_key()?);
        }
        Ok(device)
    }
}

impl RuleToml {
    /// Compile remaps (in file order) followed by layers
    fn to_rule(&self, devices: &IndexMap<String, DeviceIdentifier>) -> Result<Rule, ConfigError> {
        let mut builder = RuleBuilder::new(self.description.as_str());
        let mut position = 0;

        for remap in &self.remap {
            position += 1;
            let entry = remap
                .to_builder(devices)
                .map_err(|e| self.locate(e, position))?;
            builder = builder.manipulator(entry);
        }
        for layer in &self.layer {
            position += 1;
            let entry = layer
                .to_builder(devices)
                .map_err(|e| self.locate(e, position))?;
            builder = builder.layer(entry);
        }

        Ok(builder.build()?)
    }

    /// Attach this rule's description and the entry position to an error
    fn locate(&self, e: ConfigError, position: usize) -> ConfigError {
        match e {
            ConfigError::Compile(e) => {
                ConfigError::Compile(e.in_rule(self.description.as_str(), position))
            }
            other => other,
        }
    }
}

impl RemapToml {
    fn to_builder(
        &self,
        devices: &IndexMap<String, DeviceIdentifier>,
    ) -> Result<ManipulatorBuilder, ConfigError> {
        let mut builder = manipulator();

        let mut inputs = Vec::new();
        if let Some(name) = &self.from {
            builder = builder.from(parse_key(name)?);
            inputs.push("from");
        }
        if let Some(name) = &self.from_button {
            builder = builder.from_button(PointingButton::from_name(name)?);
            inputs.push("from_button");
        }
        if !self.simultaneous.is_empty() {
            let keys = self
                .simultaneous
                .iter()
                .map(|name| parse_key(name))
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.from_simultaneous(keys);
            inputs.push("simultaneous");
        }
        if inputs.len() > 1 {
            return Err(ConfigurationError::AmbiguousInput(inputs.join(", ")).into());
        }

        if let Some(names) = &self.mandatory {
            builder = builder.mandatory(parse_modifiers(names)?);
        }
        if let Some(names) = &self.optional {
            builder = builder.optional(parse_modifiers(names)?);
        }

        if let Some(list) = &self.to {
            builder = builder.to_actions(list.to_actions()?);
        }
        for action in actions_of(&self.alone)? {
            builder = builder.to_if_alone(action);
        }
        for action in actions_of(&self.after_key_up)? {
            builder = builder.to_after_key_up(action);
        }
        for action in actions_of(&self.held)? {
            builder = builder.to_if_held_down(action);
        }

        builder = self.scope().apply(builder, devices)?;

        if let Some(parameters) = self.parameters {
            builder = builder.parameters(parameters);
        }
        if let Some(description) = &self.description {
            builder = builder.description(description.as_str());
        }
        Ok(builder)
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            apps: &self.apps,
            unless_apps: &self.unless_apps,
            devices: &self.devices,
            unless_devices: &self.unless_devices,
            if_variable: self.if_variable.as_ref(),
            unless_variable: self.unless_variable.as_ref(),
        }
    }
}

impl LayerToml {
    fn to_builder(
        &self,
        devices: &IndexMap<String, DeviceIdentifier>,
    ) -> Result<LayerBuilder, ConfigError> {
        let mut layer = LayerBuilder::default();
        if let Some(name) = &self.trigger {
            layer = layer.trigger(parse_key(name)?);
        }
        if let Some(ms) = self.threshold_ms {
            layer = layer.threshold(ms);
        }
        for bind in &self.bind {
            layer = layer.binding(bind.to_binding(devices)?);
        }
        Ok(layer)
    }
}

impl BindToml {
    fn to_binding(
        &self,
        devices: &IndexMap<String, DeviceIdentifier>,
    ) -> Result<LayerBinding, ConfigError> {
        let name = self.from.as_deref().ok_or(ConfigurationError::MissingSource)?;
        let source = parse_key(name)?;
        let output = match &self.to {
            Some(list) => list.to_actions()?,
            None => {
                return Err(ConfigurationError::MissingOutput(source.wire_name().to_string()).into())
            }
        };

        let mut binding = LayerBinding::new(source, output)
            .with_conditions(self.scope().conditions(devices)?);
        if let Some(names) = &self.mandatory {
            binding.modifiers = binding.modifiers.with_mandatory(parse_modifiers(names)?);
        }
        if let Some(names) = &self.optional {
            binding.modifiers = binding.modifiers.with_optional(parse_modifiers(names)?);
        }
        Ok(binding)
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            apps: &self.apps,
            unless_apps: &self.unless_apps,
            devices: &self.devices,
            unless_devices: &self.unless_devices,
            if_variable: self.if_variable.as_ref(),
            unless_variable: self.unless_variable.as_ref(),
        }
    }
}

impl Scope<'_> {
    fn apply<B: Conditional>(
        &self,
        builder: B,
        devices: &IndexMap<String, DeviceIdentifier>,
    ) -> Result<B, ConfigError> {
        Ok(self
            .conditions(devices)?
            .into_iter()
            .fold(builder, |builder, condition| builder.when(condition)))
    }

    fn conditions(
        &self,
        devices: &IndexMap<String, DeviceIdentifier>,
    ) -> Result<Vec<Condition>, ConfigError> {
        let mut conditions = Vec::new();
        if !self.apps.is_empty() {
            conditions.push(Condition::app_if(self.apps)?);
        }
        if !self.unless_apps.is_empty() {
            conditions.push(Condition::app_unless(self.unless_apps)?);
        }
        if !self.devices.is_empty() {
            conditions.push(Condition::device_if(resolve_devices(devices, self.devices)?)?);
        }
        if !self.unless_devices.is_empty() {
            conditions.push(Condition::device_unless(resolve_devices(
                devices,
                self.unless_devices,
            )?)?);
        }
        if let Some(var) = self.if_variable {
            conditions.push(Condition::variable_if(var.name.as_str(), var.value.clone()));
        }
        if let Some(var) = self.unless_variable {
            conditions.push(Condition::variable_unless(var.name.as_str(), var.value.clone()));
        }
        Ok(conditions)
    }
}

impl OutputListToml {
    fn to_actions(&self) -> Result<Vec<OutputAction>, ConfigError> {
        self.entries().iter().map(OutputToml::to_action).collect()
    }
}

fn actions_of(list: &Option<OutputListToml>) -> Result<Vec<OutputAction>, ConfigError> {
    match list {
        Some(list) => list.to_actions(),
        None => Ok(Vec::new()),
    }
}

impl OutputToml {
    fn to_action(&self) -> Result<OutputAction, ConfigError> {
        match self {
            OutputToml::Combo(text) => Ok(parse_combo(text)?.into()),
            OutputToml::Slots(slots) => slots.to_action(),
        }
    }
}

impl OutputSlotsToml {
    fn to_action(&self) -> Result<OutputAction, ConfigError> {
        let mut slots = OutputSlots::new().modifiers(parse_modifiers(&self.modifiers)?);
        if let Some(name) = &self.key {
            slots = slots.key(parse_key(name)?);
        }
        if let Some(code) = &self.consumer {
            slots = slots.consumer_key(code.as_str());
        }
        if let Some(command) = &self.shell {
            slots = slots.shell(command.as_str());
        }
        if let Some(var) = &self.set_variable {
            slots = slots.set_variable(SetVariable::new(var.name.as_str(), var.value.clone()));
        }
        if let Some(mouse) = &self.mouse {
            slots = slots.mouse(mouse.clone());
        }
        if let Some(name) = &self.button {
            slots = slots.button(PointingButton::from_name(name)?);
        }
        if let Some(function) = &self.software_function {
            slots = slots.software(function.to_function()?);
        }
        Ok(slots.build()?)
    }
}

impl SoftwareFunctionToml {
    fn to_function(&self) -> Result<SoftwareFunction, ConfigurationError> {
        let mut chosen = Vec::new();
        if self.sleep_system {
            chosen.push(("sleep_system", SoftwareFunction::sleep_system()));
        }
        if let Some(bundle) = &self.open_bundle {
            chosen.push(("open_bundle", SoftwareFunction::open_bundle(bundle.as_str())));
        }
        if let Some(path) = &self.open_path {
            chosen.push(("open_path", SoftwareFunction::open_path(path.as_str())));
        }
        if let Some(button) = self.double_click {
            chosen.push(("double_click", SoftwareFunction::CgEventDoubleClick { button }));
        }
        if chosen.len() > 1 {
            let names: Vec<&str> = chosen.iter().map(|(name, _)| *name).collect();
            return Err(ConfigurationError::AmbiguousOutput(names.join(", ")));
        }
        chosen
            .pop()
            .map(|(_, function)| function)
            .ok_or(ConfigurationError::EmptyOutput)
    }
}

fn parse_key(name: &str) -> Result<Key, UnknownIdentifierError> {
    Key::from_name(name)
}

fn parse_modifiers(names: &[String]) -> Result<Vec<ModifierKey>, UnknownIdentifierError> {
    names.iter().map(|name| modifier_from_alias(name)).collect()
}

fn resolve_device(
    devices: &IndexMap<String, DeviceIdentifier>,
    alias: &str,
) -> Result<DeviceIdentifier, ConfigError> {
    devices
        .get(alias)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownDevice {
            name: alias.to_string(),
        })
}

fn resolve_devices(
    devices: &IndexMap<String, DeviceIdentifier>,
    aliases: &[String],
) -> Result<Vec<DeviceIdentifier>, ConfigError> {
    aliases
        .iter()
        .map(|alias| resolve_device(devices, alias))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn document(toml: &str) -> Value {
        let config = Config::from_toml(toml).unwrap();
        serde_json::from_str(&config.to_document().to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_for_empty_file() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.profile.name(), "Default");
        assert!(config.global.is_none());
        let value = document("");
        assert_eq!(value["profiles"][0]["selected"], true);
        assert_eq!(value["profiles"][0]["complex_modifications"]["rules"], json!([]));
    }

    #[test]
    fn test_dual_role_remap() {
        let value = document(
            r#"
            [[rule]]
            description = "caps"
            [[rule.remap]]
            from = "caps_lock"
            to = "right_control"
            alone = "escape"
            "#,
        );
        assert_eq!(
            value["profiles"][0]["complex_modifications"]["rules"][0]["manipulators"][0],
            json!({
                "type": "basic",
                "from": { "key_code": "caps_lock", "modifiers": { "optional": ["any"] } },
                "to": [{ "key_code": "right_control" }],
                "to_if_alone": [{ "key_code": "escape" }]
            })
        );
    }

    #[test]
    fn test_layer_with_combo_output() {
        let value = document(
            r#"
            [[rule]]
            description = "f layer"
            [[rule.layer]]
            trigger = "f"
            [[rule.layer.bind]]
            from = "j"
            to = "left_shift-9"
            "#,
        );
        let manipulators = &value["profiles"][0]["complex_modifications"]["rules"][0]["manipulators"];
        assert_eq!(manipulators.as_array().map(Vec::len), Some(2));
        assert_eq!(
            manipulators[0]["conditions"],
            json!([{ "type": "variable_if", "name": "f-layer", "value": 1 }])
        );
        assert_eq!(
            manipulators[1]["parameters"],
            json!({ "basic.simultaneous_threshold_milliseconds": 250 })
        );
    }

    #[test]
    fn test_two_output_slots_rejected() {
        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "ambiguous"
            [[rule.remap]]
            from = "a"
            to = { key = "b", shell = "open -a Safari" }
            "#,
        )
        .unwrap_err();
        let compile = err.compile_error().unwrap();
        assert!(matches!(
            compile.as_configuration(),
            Some(ConfigurationError::AmbiguousOutput(_))
        ));
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_unknown_key_name() {
        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "typo"
            [[rule.remap]]
            from = "caps_lok"
            to = "escape"
            "#,
        )
        .unwrap_err();
        let compile = err.compile_error().unwrap();
        assert_eq!(compile.as_unknown_identifier().map(|e| e.name.as_str()), Some("caps_lok"));
        match compile {
            Error::InRule { rule, position, .. } => {
                assert_eq!(rule, "typo");
                assert_eq!(*position, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_device_alias() {
        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "device"
            [[rule.remap]]
            from = "a"
            to = "b"
            devices = ["missing"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDevice { ref name } if name == "missing"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Config::from_toml("[profile]\nnmae = \"typo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_layer_without_trigger() {
        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "no trigger"
            [[rule.layer]]
            [[rule.layer.bind]]
            from = "j"
            to = "9"
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.compile_error().and_then(Error::as_configuration),
            Some(&ConfigurationError::MissingTrigger)
        );
    }

    #[test]
    fn test_bind_without_source() {
        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "no source"
            [[rule.layer]]
            trigger = "f"
            [[rule.layer.bind]]
            to = "9"
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.compile_error().and_then(Error::as_configuration),
            Some(&ConfigurationError::MissingSource)
        );
        assert!(err.compile_error().and_then(Error::as_illegal_layer_usage).is_none());
    }

    #[test]
    fn test_two_inputs_rejected() {
        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "two inputs"
            [[rule.remap]]
            from = "a"
            from_button = "button4"
            to = "b"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.compile_error().and_then(Error::as_configuration),
            Some(ConfigurationError::AmbiguousInput(_))
        ));
    }

    #[test]
    fn test_simple_modification_and_device() {
        let config = Config::from_toml(
            r#"
            [devices.anne]
            vendor_id = 1241
            product_id = 41618

            [[simple_modification]]
            from = "caps_lock"
            to = "escape"

            [[device_config]]
            device = "anne"
            ignore = false
            simple_modifications = [{ from = "left_option", to = "left_command" }]
            "#,
        )
        .unwrap();
        assert_eq!(config.profile.devices().len(), 1);
        assert_eq!(
            config.profile.devices()[0].simple_modifications[0],
            SimpleModification::new(ModifierKey::LeftOption, ModifierKey::LeftCommand)
        );
        let value: Value =
            serde_json::from_str(&config.to_document().to_json().unwrap()).unwrap();
        assert_eq!(
            value["profiles"][0]["simple_modifications"],
            json!([{ "from": { "key_code": "caps_lock" }, "to": [{ "key_code": "escape" }] }])
        );
    }

    #[test]
    fn test_modifiers_on_shell_output_rejected() {
        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "terminal"
            [[rule.remap]]
            from = "t"
            to = { shell = "open -a Safari", modifiers = ["left_shift"] }
            "#,
        )
        .unwrap_err();
        assert_eq!(
            err.compile_error().and_then(Error::as_configuration),
            Some(&ConfigurationError::ModifiersNotAllowed("shell"))
        );
        assert!(err.to_string().contains("terminal"));
    }

    #[test]
    fn test_output_slot_typo_names_the_field() {
        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "typo"
            [[rule.remap]]
            from = "t"
            to = { shel = "open -a Terminal" }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
        assert!(err.to_string().contains("shel"), "{err}");

        let err = Config::from_toml(
            r#"
            [[rule]]
            description = "typo in list"
            [[rule.remap]]
            from = "t"
            to = ["escape", { shel = "open -a Terminal" }]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("shel"), "{err}");
    }

    #[test]
    fn test_output_list_forms() {
        let value = document(
            r#"
            [[rule]]
            description = "lists"
            [[rule.remap]]
            from = "a"
            to = ["left_shift-b", { shell = "say hi" }]
            alone = { key = "escape" }
            "#,
        );
        let manipulator = &value["profiles"][0]["complex_modifications"]["rules"][0]["manipulators"][0];
        assert_eq!(
            manipulator["to"],
            json!([
                { "key_code": "b", "modifiers": ["left_shift"] },
                { "shell_command": "say hi" }
            ])
        );
        assert_eq!(manipulator["to_if_alone"], json!([{ "key_code": "escape" }]));
    }
}
