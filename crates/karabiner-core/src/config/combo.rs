// Karabiner Config - Combo String Parser
// Parses key strings like "left_shift-9" or "Cmd-Shift-z" used in rule files

use crate::action::OutputAction;
use crate::error::UnknownIdentifierError;
use crate::key::Key;
use crate::modifier::{ModifierKey, Modifiers};

/// A key plus the modifiers held with it
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCombo {
    /// Modifiers in the order written, without repeats
    pub modifiers: Modifiers,
    /// The last hyphen-separated component
    pub key: Key,
}

impl From<ParsedCombo> for OutputAction {
    fn from(combo: ParsedCombo) -> Self {
        OutputAction::key_with(combo.key, combo.modifiers)
    }
}

/// Parse `"mod-mod-key"`.
///
/// Modifiers accept their wire names plus the short aliases `ctrl`, `cmd`,
/// `opt`, `alt` (left side). The key accepts any key or modifier name.
pub fn parse_combo(exp: &str) -> Result<ParsedCombo, UnknownIdentifierError> {
    let trimmed = exp.trim();
    if trimmed.is_empty() || trimmed.ends_with('-') {
        return Err(UnknownIdentifierError::new("key combo", trimmed));
    }

    let mut parts: Vec<&str> = trimmed.split('-').collect();
    // split() always yields at least one part
    let key_name = parts.pop().unwrap_or_default();
    let key = Key::from_name(key_name)?;

    let mut modifiers = Modifiers::new();
    for name in parts {
        let modifier = modifier_from_alias(name)?;
        if !modifiers.contains(&modifier) {
            modifiers.push(modifier);
        }
    }

    Ok(ParsedCombo { modifiers, key })
}

/// Resolve a modifier name or short alias
pub fn modifier_from_alias(name: &str) -> Result<ModifierKey, UnknownIdentifierError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "ctrl" => Ok(ModifierKey::LeftControl),
        "cmd" => Ok(ModifierKey::LeftCommand),
        "opt" | "alt" => Ok(ModifierKey::LeftOption),
        _ => ModifierKey::from_name(name),
    }
}
