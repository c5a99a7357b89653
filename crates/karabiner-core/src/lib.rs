// Karabiner Core Library
// Typed rule model, layer compiler and karabiner.json serializer

pub mod action;
pub mod builder;
pub mod condition;
pub mod config;
pub mod document;
pub mod error;
pub mod key;
pub mod layer;
pub mod mapping;
pub mod modifier;

pub use action::{MouseKey, OutputAction, OutputSlots, SetVariable, SoftwareFunction, VariableValue};
pub use builder::{
    dual_role, layer, manipulator, remap, rule, BindingBuilder, Conditional, LayerBuilder,
    ManipulatorBuilder, RuleBuilder,
};
pub use condition::{
    ApplicationMatch, Condition, DeviceIdentifier, InputSource, KeyboardType,
};
pub use config::{parse_combo, ParsedCombo};
pub use document::{
    DeviceConfiguration, FnFunctionKey, GlobalSettings, KarabinerConfig, KeyEntry, Profile,
    ProfileParameters, SimpleModification, VirtualHidKeyboard,
};
pub use error::{ConfigurationError, Error, IllegalLayerUsageError, Result, UnknownIdentifierError};
pub use key::{Key, KeyCode, PointingButton};
pub use layer::{layer_variable_name, LayerBinding, DEFAULT_LAYER_THRESHOLD_MS};
pub use mapping::{InputSpec, KeyOrder, KeyUpWhen, Manipulator, Parameters, Rule, SimultaneousOptions};
pub use modifier::{ModifierKey, ModifierSet, Modifiers};

#[cfg(feature = "toml-config")]
pub use config::{Config, ConfigError};
