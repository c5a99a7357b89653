// Karabiner Rule Builders
// Fluent construction of manipulators, layers and rules

use log::{debug, trace, warn};

use crate::action::{OutputAction, VariableValue};
use crate::condition::{Condition, DeviceIdentifier, InputSource, KeyboardType};
use crate::error::{ConfigurationError, IllegalLayerUsageError, Result};
use crate::key::{Key, PointingButton};
use crate::layer::{self, LayerBinding, DEFAULT_LAYER_THRESHOLD_MS};
use crate::mapping::{InputSpec, Manipulator, ManipulatorParts, Parameters, Rule, SimultaneousOptions};
use crate::modifier::{ModifierKey, ModifierSet};

/// Start an empty manipulator
pub fn manipulator() -> ManipulatorBuilder {
    ManipulatorBuilder::default()
}

/// Start a manipulator listening on `key`
pub fn remap(key: impl Into<Key>) -> ManipulatorBuilder {
    manipulator().from(key)
}

/// `key` emits `tap` when pressed alone and acts as `hold` otherwise
pub fn dual_role(
    key: impl Into<Key>,
    tap: impl Into<OutputAction>,
    hold: impl Into<OutputAction>,
) -> ManipulatorBuilder {
    remap(key).to(hold).to_if_alone(tap)
}

/// Start a layer held on `trigger`
pub fn layer(trigger: impl Into<Key>) -> LayerBuilder {
    LayerBuilder::default().trigger(trigger)
}

pub fn rule(description: impl Into<String>) -> RuleBuilder {
    RuleBuilder::new(description)
}

/// Condition helpers shared by every builder that scopes a mapping.
///
/// Invalid conditions are remembered and reported when the builder is built.
pub trait Conditional: Sized {
    fn push_condition(self, condition: std::result::Result<Condition, ConfigurationError>) -> Self;

    fn when(self, condition: Condition) -> Self {
        self.push_condition(Ok(condition))
    }

    /// Only while one of the bundle identifier patterns is frontmost
    fn for_app<I, S>(self, bundle_identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_condition(Condition::app_if(bundle_identifiers))
    }

    fn unless_app<I, S>(self, bundle_identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_condition(Condition::app_unless(bundle_identifiers))
    }

    fn for_device(self, identifiers: impl IntoIterator<Item = DeviceIdentifier>) -> Self {
        self.push_condition(Condition::device_if(identifiers))
    }

    fn unless_device(self, identifiers: impl IntoIterator<Item = DeviceIdentifier>) -> Self {
        self.push_condition(Condition::device_unless(identifiers))
    }

    fn if_device_exists(self, identifiers: impl IntoIterator<Item = DeviceIdentifier>) -> Self {
        self.push_condition(Condition::device_exists_if(identifiers))
    }

    fn if_variable(self, name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        self.push_condition(Ok(Condition::variable_if(name, value)))
    }

    fn unless_variable(self, name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        self.push_condition(Ok(Condition::variable_unless(name, value)))
    }

    fn for_keyboard_type(self, types: impl IntoIterator<Item = KeyboardType>) -> Self {
        self.push_condition(Condition::keyboard_type_if(types))
    }

    fn for_input_source(self, sources: impl IntoIterator<Item = InputSource>) -> Self {
        self.push_condition(Condition::input_source_if(sources))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum InputDraft {
    Key(Key),
    Button(PointingButton),
    Chord(Vec<Key>),
}

/// Accumulates one manipulator (or one layer binding when a layer key is set).
#[derive(Debug, Clone, Default)]
pub struct ManipulatorBuilder {
    input: Option<InputDraft>,
    modifiers: Option<ModifierSet>,
    simultaneous_options: SimultaneousOptions,
    parts: ManipulatorParts,
    layer_key: Option<Key>,
    layer_threshold_ms: Option<u64>,
    error: Option<ConfigurationError>,
}

impl ManipulatorBuilder {
    pub fn from(mut self, key: impl Into<Key>) -> Self {
        self.input = Some(InputDraft::Key(key.into()));
        self
    }

    /// Listen on `key` with an explicit modifier set
    pub fn from_with(mut self, key: impl Into<Key>, modifiers: ModifierSet) -> Self {
        self.input = Some(InputDraft::Key(key.into()));
        self.modifiers = Some(modifiers);
        self
    }

    /// Listen on `key` only while all of `modifiers` are held
    pub fn from_mandatory(
        self,
        key: impl Into<Key>,
        modifiers: impl IntoIterator<Item = ModifierKey>,
    ) -> Self {
        self.from(key).mandatory(modifiers)
    }

    pub fn from_button(mut self, button: PointingButton) -> Self {
        self.input = Some(InputDraft::Button(button));
        self
    }

    pub fn from_simultaneous<K: Into<Key>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.input = Some(InputDraft::Chord(keys.into_iter().map(Into::into).collect()));
        self
    }

    /// Chord options for a [`ManipulatorBuilder::from_simultaneous`] input.
    ///
    /// Layer bindings emit their own options; `build_layer()` rejects these.
    pub fn simultaneous_options(mut self, options: SimultaneousOptions) -> Self {
        self.simultaneous_options = options;
        self
    }

    pub fn mandatory(mut self, modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        let set = self.modifiers.take().unwrap_or_default();
        self.modifiers = Some(set.with_mandatory(modifiers));
        self
    }

    pub fn optional(mut self, modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        let set = self.modifiers.take().unwrap_or_default();
        self.modifiers = Some(set.with_optional(modifiers));
        self
    }

    pub fn to(mut self, action: impl Into<OutputAction>) -> Self {
        self.parts.to.push(action.into());
        self
    }

    pub fn to_key_with(
        self,
        key: impl Into<Key>,
        modifiers: impl IntoIterator<Item = ModifierKey>,
    ) -> Self {
        self.to(OutputAction::key_with(key, modifiers))
    }

    pub fn to_shell(self, command: impl Into<String>) -> Self {
        self.to(OutputAction::shell(command))
    }

    pub fn to_variable(self, name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        self.to(OutputAction::set_variable(name, value))
    }

    pub fn to_actions(mut self, actions: impl IntoIterator<Item = OutputAction>) -> Self {
        self.parts.to.extend(actions);
        self
    }

    pub fn to_if_alone(mut self, action: impl Into<OutputAction>) -> Self {
        self.parts.to_if_alone.push(action.into());
        self
    }

    pub fn to_after_key_up(mut self, action: impl Into<OutputAction>) -> Self {
        self.parts.to_after_key_up.push(action.into());
        self
    }

    pub fn to_if_held_down(mut self, action: impl Into<OutputAction>) -> Self {
        self.parts.to_if_held_down.push(action.into());
        self
    }

    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.parts.parameters = parameters;
        self
    }

    pub fn to_if_alone_timeout(mut self, ms: u64) -> Self {
        self.parts.parameters.to_if_alone_timeout_ms = Some(ms);
        self
    }

    pub fn held_down_threshold(mut self, ms: u64) -> Self {
        self.parts.parameters.to_if_held_down_threshold_ms = Some(ms);
        self
    }

    pub fn simultaneous_threshold(mut self, ms: u64) -> Self {
        self.parts.parameters.simultaneous_threshold_ms = Some(ms);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.parts.description = Some(text.into());
        self
    }

    /// Make this a layer binding: held `trigger` retargets the input key
    pub fn layer_key(mut self, trigger: impl Into<Key>) -> Self {
        self.layer_key = Some(trigger.into());
        self
    }

    pub fn layer_threshold(mut self, ms: u64) -> Self {
        self.layer_threshold_ms = Some(ms);
        self
    }

    pub fn is_layer(&self) -> bool {
        self.layer_key.is_some()
    }

    /// Build a single manipulator
    pub fn build(self) -> Result<Manipulator> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        if let Some(trigger) = self.layer_key {
            return Err(IllegalLayerUsageError::SingleBuildOnLayer(trigger.wire_name().to_string()).into());
        }
        let input = self.input.ok_or(ConfigurationError::MissingInput)?;
        let from = match input {
            InputDraft::Key(key) => {
                InputSpec::key(key, self.modifiers.unwrap_or_else(ModifierSet::any))
            }
            InputDraft::Button(button) => {
                InputSpec::button(button, self.modifiers.unwrap_or_else(ModifierSet::any))
            }
            InputDraft::Chord(keys) => InputSpec::simultaneous(
                keys,
                self.simultaneous_options,
                self.modifiers.unwrap_or_default(),
            )?,
        };
        let manipulator = Manipulator::new(from, self.parts);
        trace!("built manipulator {:?}", manipulator.from());
        Ok(manipulator)
    }

    /// Build the mode mapping and engagement mapping of a layer binding
    pub fn build_layer(self) -> Result<[Manipulator; 2]> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        let trigger = self.layer_key.ok_or(ConfigurationError::MissingTrigger)?;
        let source = match self.input.ok_or(ConfigurationError::MissingInput)? {
            InputDraft::Key(key) => key,
            InputDraft::Button(_) => {
                return Err(IllegalLayerUsageError::SourceNotSingleKey("a pointing button").into())
            }
            InputDraft::Chord(_) => {
                return Err(IllegalLayerUsageError::SourceNotSingleKey("a simultaneous chord").into())
            }
        };
        if !self.simultaneous_options.is_empty() {
            return Err(IllegalLayerUsageError::SimultaneousOptionsOnLayer.into());
        }
        let threshold = self.layer_threshold_ms.unwrap_or(DEFAULT_LAYER_THRESHOLD_MS);
        let pair = layer::compile(
            trigger,
            source,
            self.modifiers.unwrap_or_default(),
            self.parts,
            threshold,
        )?;
        Ok(pair)
    }
}

impl Conditional for ManipulatorBuilder {
    fn push_condition(mut self, condition: std::result::Result<Condition, ConfigurationError>) -> Self {
        match condition {
            Ok(condition) => self.parts.conditions.push(condition),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }
}

/// A trigger key and the keys it retargets while held.
#[derive(Debug, Clone)]
pub struct LayerBuilder {
    trigger: Option<Key>,
    threshold_ms: u64,
    bindings: Vec<LayerBinding>,
    error: Option<ConfigurationError>,
}

impl Default for LayerBuilder {
    fn default() -> Self {
        Self {
            trigger: None,
            threshold_ms: DEFAULT_LAYER_THRESHOLD_MS,
            bindings: Vec::new(),
            error: None,
        }
    }
}

impl LayerBuilder {
    pub fn trigger(mut self, trigger: impl Into<Key>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn threshold(mut self, ms: u64) -> Self {
        self.threshold_ms = ms;
        self
    }

    /// Start binding `source`; finish with one of the `to*` methods
    pub fn bind(self, source: impl Into<Key>) -> BindingBuilder {
        BindingBuilder {
            layer: self,
            source: source.into(),
            modifiers: ModifierSet::none(),
            conditions: Vec::new(),
            error: None,
        }
    }

    /// Add a prepared binding
    pub fn binding(mut self, binding: LayerBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn build(self) -> Result<Vec<Manipulator>> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        let trigger = self.trigger.ok_or(ConfigurationError::MissingTrigger)?;
        if self.bindings.is_empty() {
            warn!("layer '{}' has no bindings", layer::layer_variable_name(trigger));
        }
        let mut manipulators = Vec::with_capacity(self.bindings.len() * 2);
        for binding in &self.bindings {
            manipulators.extend(binding.compile(trigger, self.threshold_ms)?);
        }
        debug!(
            "layer '{}': {} bindings, {} manipulators",
            layer::layer_variable_name(trigger),
            self.bindings.len(),
            manipulators.len()
        );
        Ok(manipulators)
    }
}

/// One binding in progress inside a [`LayerBuilder`]
#[derive(Debug, Clone)]
pub struct BindingBuilder {
    layer: LayerBuilder,
    source: Key,
    modifiers: ModifierSet,
    conditions: Vec<Condition>,
    error: Option<ConfigurationError>,
}

impl BindingBuilder {
    pub fn mandatory(mut self, modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        self.modifiers = self.modifiers.with_mandatory(modifiers);
        self
    }

    pub fn optional(mut self, modifiers: impl IntoIterator<Item = ModifierKey>) -> Self {
        self.modifiers = self.modifiers.with_optional(modifiers);
        self
    }

    pub fn to(self, action: impl Into<OutputAction>) -> LayerBuilder {
        self.to_actions([action.into()])
    }

    pub fn to_key(self, key: impl Into<Key>) -> LayerBuilder {
        self.to(OutputAction::key(key))
    }

    pub fn to_key_with(
        self,
        key: impl Into<Key>,
        modifiers: impl IntoIterator<Item = ModifierKey>,
    ) -> LayerBuilder {
        self.to(OutputAction::key_with(key, modifiers))
    }

    pub fn to_shell(self, command: impl Into<String>) -> LayerBuilder {
        self.to(OutputAction::shell(command))
    }

    pub fn to_actions(self, actions: impl IntoIterator<Item = OutputAction>) -> LayerBuilder {
        let mut layer = self.layer;
        if let Some(err) = self.error {
            layer.error.get_or_insert(err);
        }
        layer.bindings.push(LayerBinding {
            source: self.source,
            modifiers: self.modifiers,
            output: actions.into_iter().collect(),
            conditions: self.conditions,
        });
        layer
    }
}

impl Conditional for BindingBuilder {
    fn push_condition(mut self, condition: std::result::Result<Condition, ConfigurationError>) -> Self {
        match condition {
            Ok(condition) => self.conditions.push(condition),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }
}

#[derive(Debug, Clone)]
enum RuleEntry {
    Manipulator(Box<ManipulatorBuilder>),
    Layer(LayerBuilder),
    Built(Manipulator),
}

/// A described rule, assembled in order.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    description: String,
    entries: Vec<RuleEntry>,
}

impl RuleBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            entries: Vec::new(),
        }
    }

    /// Add a manipulator builder; one with a layer key expands to two mappings
    pub fn manipulator(mut self, builder: ManipulatorBuilder) -> Self {
        self.entries.push(RuleEntry::Manipulator(Box::new(builder)));
        self
    }

    pub fn layer(mut self, layer: LayerBuilder) -> Self {
        self.entries.push(RuleEntry::Layer(layer));
        self
    }

    /// Add an already built manipulator
    pub fn push(mut self, manipulator: Manipulator) -> Self {
        self.entries.push(RuleEntry::Built(manipulator));
        self
    }

    pub fn build(self) -> Result<Rule> {
        let description = self.description;
        if self.entries.is_empty() {
            warn!("rule '{}' has no manipulators", description);
        }

        let mut manipulators = Vec::new();
        for (index, entry) in self.entries.into_iter().enumerate() {
            let position = index + 1;
            let built = match entry {
                RuleEntry::Manipulator(builder) if builder.is_layer() => {
                    (*builder).build_layer().map(Vec::from)
                }
                RuleEntry::Manipulator(builder) => (*builder).build().map(|m| vec![m]),
                RuleEntry::Layer(layer) => layer.build(),
                RuleEntry::Built(manipulator) => Ok(vec![manipulator]),
            };
            manipulators.extend(built.map_err(|e| e.in_rule(description.as_str(), position))?);
        }

        debug!("rule '{}': {} manipulators", description, manipulators.len());
        Ok(Rule::new(description, manipulators))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::key::KeyCode;
    use serde_json::json;

    #[test]
    fn test_default_optional_any() {
        let m = remap(KeyCode::A).to(KeyCode::B).build().unwrap();
        assert_eq!(m.from().modifiers(), &ModifierSet::any());
    }

    #[test]
    fn test_mandatory_only_is_strict() {
        let m = manipulator()
            .from_mandatory(KeyCode::H, [ModifierKey::LeftControl])
            .to(KeyCode::LeftArrow)
            .build()
            .unwrap();
        assert_eq!(
            serde_json::to_value(m.from()).unwrap(),
            json!({ "key_code": "h", "modifiers": { "mandatory": ["left_control"] } })
        );
    }

    #[test]
    fn test_missing_from_is_configuration_error() {
        let err = manipulator().to(KeyCode::A).build().unwrap_err();
        assert_eq!(err.as_configuration(), Some(&ConfigurationError::MissingInput));
    }

    #[test]
    fn test_build_on_layer_builder_rejected() {
        let err = remap(KeyCode::J)
            .layer_key(KeyCode::F)
            .to(KeyCode::Num9)
            .build()
            .unwrap_err();
        assert_eq!(
            err.as_illegal_layer_usage(),
            Some(&IllegalLayerUsageError::SingleBuildOnLayer("f".to_string()))
        );
    }

    #[test]
    fn test_build_layer_requires_trigger() {
        let err = remap(KeyCode::J).to(KeyCode::Num9).build_layer().unwrap_err();
        assert_eq!(err.as_configuration(), Some(&ConfigurationError::MissingTrigger));
    }

    #[test]
    fn test_build_layer_requires_single_key() {
        let err = manipulator()
            .from_simultaneous([KeyCode::J, KeyCode::K])
            .layer_key(KeyCode::F)
            .to(KeyCode::Escape)
            .build_layer()
            .unwrap_err();
        assert!(err.as_illegal_layer_usage().is_some());

        let err = manipulator()
            .from_button(PointingButton::Button4)
            .layer_key(KeyCode::F)
            .to(KeyCode::Escape)
            .build_layer()
            .unwrap_err();
        assert_eq!(
            err.as_illegal_layer_usage(),
            Some(&IllegalLayerUsageError::SourceNotSingleKey("a pointing button"))
        );
    }

    #[test]
    fn test_layered_builder_carries_extras_to_both() {
        let [mode, engage] = remap(KeyCode::J)
            .layer_key(KeyCode::F)
            .layer_threshold(200)
            .to(KeyCode::Num9)
            .to_if_alone(KeyCode::J)
            .to_if_alone_timeout(300)
            .description("f/j")
            .build_layer()
            .unwrap();
        for m in [&mode, &engage] {
            assert_eq!(m.to_if_alone(), &[OutputAction::key(KeyCode::J)]);
            assert_eq!(m.description(), Some("f/j"));
            assert_eq!(m.parameters().to_if_alone_timeout_ms, Some(300));
        }
        assert_eq!(mode.parameters().simultaneous_threshold_ms, None);
        assert_eq!(engage.parameters().simultaneous_threshold_ms, Some(200));
    }

    #[test]
    fn test_invalid_condition_surfaces_at_build() {
        let err = remap(KeyCode::A)
            .to(KeyCode::B)
            .for_app(["(unclosed"])
            .build()
            .unwrap_err();
        assert!(matches!(
            err.as_configuration(),
            Some(ConfigurationError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_layer_builder_bindings_in_order() {
        let manipulators = layer(KeyCode::F)
            .bind(KeyCode::J)
            .to_key_with(KeyCode::Num9, [ModifierKey::LeftShift])
            .bind(KeyCode::K)
            .if_variable("vim", 1)
            .to_key_with(KeyCode::Num0, [ModifierKey::LeftShift])
            .build()
            .unwrap();
        assert_eq!(manipulators.len(), 4);
        assert_eq!(manipulators[0].from().single_key(), Some(KeyCode::J.into()));
        assert_eq!(manipulators[2].from().single_key(), Some(KeyCode::K.into()));
        assert_eq!(manipulators[3].conditions(), &[Condition::variable_if("vim", 1)]);
    }

    #[test]
    fn test_layer_without_trigger() {
        let err = LayerBuilder::default()
            .bind(KeyCode::J)
            .to_key(KeyCode::Num9)
            .build()
            .unwrap_err();
        assert_eq!(err.as_configuration(), Some(&ConfigurationError::MissingTrigger));
    }

    #[test]
    fn test_rule_error_names_position() {
        let err = rule("broken")
            .manipulator(remap(KeyCode::A).to(KeyCode::B))
            .manipulator(manipulator().to(KeyCode::C))
            .build()
            .unwrap_err();
        match &err {
            Error::InRule { rule, position, .. } => {
                assert_eq!(rule, "broken");
                assert_eq!(*position, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.as_configuration(), Some(&ConfigurationError::MissingInput));
    }

    #[test]
    fn test_rule_routes_layered_builders() {
        let rule = rule("mixed")
            .manipulator(dual_role(KeyCode::CapsLock, KeyCode::Escape, ModifierKey::RightControl))
            .manipulator(remap(KeyCode::J).layer_key(KeyCode::F).to(KeyCode::Num9))
            .layer(layer(KeyCode::D).bind(KeyCode::H).to_key(KeyCode::LeftArrow))
            .build()
            .unwrap();
        assert_eq!(rule.manipulators().len(), 5);
        assert_eq!(rule.description(), "mixed");
    }

    #[test]
    fn test_layer_rejects_custom_simultaneous_options() {
        let options = SimultaneousOptions {
            key_up_when: Some(crate::mapping::KeyUpWhen::All),
            ..SimultaneousOptions::default()
        };
        let err = remap(KeyCode::J)
            .layer_key(KeyCode::F)
            .simultaneous_options(options)
            .to(KeyCode::Num9)
            .build_layer()
            .unwrap_err();
        assert_eq!(
            err.as_illegal_layer_usage(),
            Some(&IllegalLayerUsageError::SimultaneousOptionsOnLayer)
        );
    }
}
