// Karabiner Layer Compiler
// Expands a layer binding into its mode mapping and engagement mapping

use log::trace;

use crate::action::OutputAction;
use crate::condition::Condition;
use crate::error::ConfigurationError;
use crate::key::Key;
use crate::mapping::{
    InputSpec, KeyOrder, KeyUpWhen, Manipulator, ManipulatorParts, SimultaneousOptions,
};
use crate::modifier::ModifierSet;

/// Window in which trigger and source must both go down to engage a layer
pub const DEFAULT_LAYER_THRESHOLD_MS: u64 = 250;

/// Name of the engine variable that latches a layer on, e.g. `f-layer`
pub fn layer_variable_name(trigger: Key) -> String {
    format!("{}-layer", trigger.wire_name())
}

/// One key retargeted while a layer is held
#[derive(Debug, Clone, PartialEq)]
pub struct LayerBinding {
    pub source: Key,
    pub modifiers: ModifierSet,
    pub output: Vec<OutputAction>,
    pub conditions: Vec<Condition>,
}

impl LayerBinding {
    pub fn new(source: impl Into<Key>, output: Vec<OutputAction>) -> Self {
        Self {
            source: source.into(),
            modifiers: ModifierSet::none(),
            output,
            conditions: Vec::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    /// Compile against `trigger` with the given simultaneous threshold
    pub fn compile(&self, trigger: Key, threshold_ms: u64) -> Result<[Manipulator; 2], ConfigurationError> {
        let parts = ManipulatorParts {
            to: self.output.clone(),
            conditions: self.conditions.clone(),
            ..ManipulatorParts::default()
        };
        compile(trigger, self.source, self.modifiers.clone(), parts, threshold_ms)
    }
}

/// Compile one binding into `[mode mapping, engagement mapping]`.
///
/// The mode mapping fires on the bare source key while the layer variable is
/// 1. The engagement mapping catches trigger then source pressed together,
/// latches the variable and fires the output at once; releasing either key
/// resets the variable. Pressing the source before the trigger does not
/// engage the layer.
pub(crate) fn compile(
    trigger: Key,
    source: Key,
    modifiers: ModifierSet,
    parts: ManipulatorParts,
    threshold_ms: u64,
) -> Result<[Manipulator; 2], ConfigurationError> {
    if source == trigger {
        return Err(ConfigurationError::SourceIsTrigger(source.wire_name().to_string()));
    }
    if parts.to.is_empty() {
        return Err(ConfigurationError::MissingOutput(source.wire_name().to_string()));
    }

    let variable = layer_variable_name(trigger);
    let modifiers = if modifiers.is_empty() {
        ModifierSet::any()
    } else {
        modifiers
    };

    let mut mode_parts = parts.clone();
    mode_parts
        .conditions
        .push(Condition::variable_if(variable.as_str(), 1));
    let mode = Manipulator::new(InputSpec::key(source, modifiers), mode_parts);

    let options = SimultaneousOptions {
        detect_key_down_uninterruptedly: Some(true),
        key_down_order: Some(KeyOrder::Strict),
        key_up_order: Some(KeyOrder::StrictInverse),
        key_up_when: Some(KeyUpWhen::Any),
        to_after_key_up: vec![OutputAction::set_variable(variable.as_str(), 0)],
    };
    let chord = InputSpec::simultaneous([trigger, source], options, ModifierSet::none())?;

    let mut engage_parts = parts;
    engage_parts
        .to
        .insert(0, OutputAction::set_variable(variable.as_str(), 1));
    engage_parts.parameters.simultaneous_threshold_ms = Some(threshold_ms);
    let engage = Manipulator::new(chord, engage_parts);

    trace!("layer {}: compiled binding for '{}'", variable, source);
    Ok([mode, engage])
}
