// Karabiner Config API - rule files
// Combo string parsing and the TOML rule file loader

pub mod combo;

#[cfg(feature = "toml-config")]
pub mod parser;

pub use combo::{modifier_from_alias, parse_combo, ParsedCombo};

#[cfg(feature = "toml-config")]
pub use parser::{Config, ConfigError, ConfigToml};
