// Karabiner Key Type
// Closed set of key codes understood by Karabiner-Elements

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::error::UnknownIdentifierError;
use crate::modifier::ModifierKey;

/// A non-modifier key code.
///
/// Each variant carries exactly one wire name, the string Karabiner expects
/// in `key_code` fields. Modifier keys live in [`ModifierKey`]; both convert
/// into [`Key`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum KeyCode {
    // Editing, whitespace and navigation
    #[strum(serialize = "caps_lock")]
    CapsLock,
    #[strum(serialize = "return_or_enter")]
    ReturnOrEnter,
    #[strum(serialize = "escape")]
    Escape,
    #[strum(serialize = "delete_or_backspace")]
    DeleteOrBackspace,
    #[strum(serialize = "delete_forward")]
    DeleteForward,
    #[strum(serialize = "tab")]
    Tab,
    #[strum(serialize = "spacebar")]
    Spacebar,
    #[strum(serialize = "hyphen")]
    Hyphen,
    #[strum(serialize = "equal_sign")]
    EqualSign,
    #[strum(serialize = "open_bracket")]
    OpenBracket,
    #[strum(serialize = "close_bracket")]
    CloseBracket,
    #[strum(serialize = "backslash")]
    Backslash,
    #[strum(serialize = "non_us_pound")]
    NonUsPound,
    #[strum(serialize = "semicolon")]
    Semicolon,
    #[strum(serialize = "quote")]
    Quote,
    #[strum(serialize = "grave_accent_and_tilde")]
    GraveAccentAndTilde,
    #[strum(serialize = "comma")]
    Comma,
    #[strum(serialize = "period")]
    Period,
    #[strum(serialize = "slash")]
    Slash,
    #[strum(serialize = "non_us_backslash")]
    NonUsBackslash,
    #[strum(serialize = "up_arrow")]
    UpArrow,
    #[strum(serialize = "down_arrow")]
    DownArrow,
    #[strum(serialize = "left_arrow")]
    LeftArrow,
    #[strum(serialize = "right_arrow")]
    RightArrow,
    #[strum(serialize = "page_up")]
    PageUp,
    #[strum(serialize = "page_down")]
    PageDown,
    #[strum(serialize = "home")]
    Home,
    #[strum(serialize = "end")]
    End,
    // Letters
    #[strum(serialize = "a")]
    A,
    #[strum(serialize = "b")]
    B,
    #[strum(serialize = "c")]
    C,
    #[strum(serialize = "d")]
    D,
    #[strum(serialize = "e")]
    E,
    #[strum(serialize = "f")]
    F,
    #[strum(serialize = "g")]
    G,
    #[strum(serialize = "h")]
    H,
    #[strum(serialize = "i")]
    I,
    #[strum(serialize = "j")]
    J,
    #[strum(serialize = "k")]
    K,
    #[strum(serialize = "l")]
    L,
    #[strum(serialize = "m")]
    M,
    #[strum(serialize = "n")]
    N,
    #[strum(serialize = "o")]
    O,
    #[strum(serialize = "p")]
    P,
    #[strum(serialize = "q")]
    Q,
    #[strum(serialize = "r")]
    R,
    #[strum(serialize = "s")]
    S,
    #[strum(serialize = "t")]
    T,
    #[strum(serialize = "u")]
    U,
    #[strum(serialize = "v")]
    V,
    #[strum(serialize = "w")]
    W,
    #[strum(serialize = "x")]
    X,
    #[strum(serialize = "y")]
    Y,
    #[strum(serialize = "z")]
    Z,
    // Digit row
    #[strum(serialize = "1")]
    Num1,
    #[strum(serialize = "2")]
    Num2,
    #[strum(serialize = "3")]
    Num3,
    #[strum(serialize = "4")]
    Num4,
    #[strum(serialize = "5")]
    Num5,
    #[strum(serialize = "6")]
    Num6,
    #[strum(serialize = "7")]
    Num7,
    #[strum(serialize = "8")]
    Num8,
    #[strum(serialize = "9")]
    Num9,
    #[strum(serialize = "0")]
    Num0,
    // Function row
    #[strum(serialize = "f1")]
    F1,
    #[strum(serialize = "f2")]
    F2,
    #[strum(serialize = "f3")]
    F3,
    #[strum(serialize = "f4")]
    F4,
    #[strum(serialize = "f5")]
    F5,
    #[strum(serialize = "f6")]
    F6,
    #[strum(serialize = "f7")]
    F7,
    #[strum(serialize = "f8")]
    F8,
    #[strum(serialize = "f9")]
    F9,
    #[strum(serialize = "f10")]
    F10,
    #[strum(serialize = "f11")]
    F11,
    #[strum(serialize = "f12")]
    F12,
    #[strum(serialize = "f13")]
    F13,
    #[strum(serialize = "f14")]
    F14,
    #[strum(serialize = "f15")]
    F15,
    #[strum(serialize = "f16")]
    F16,
    #[strum(serialize = "f17")]
    F17,
    #[strum(serialize = "f18")]
    F18,
    #[strum(serialize = "f19")]
    F19,
    #[strum(serialize = "f20")]
    F20,
    #[strum(serialize = "f21")]
    F21,
    #[strum(serialize = "f22")]
    F22,
    #[strum(serialize = "f23")]
    F23,
    #[strum(serialize = "f24")]
    F24,
    // Media and display
    #[strum(serialize = "display_brightness_decrement")]
    DisplayBrightnessDecrement,
    #[strum(serialize = "display_brightness_increment")]
    DisplayBrightnessIncrement,
    #[strum(serialize = "mission_control")]
    MissionControl,
    #[strum(serialize = "launchpad")]
    Launchpad,
    #[strum(serialize = "dashboard")]
    Dashboard,
    #[strum(serialize = "illumination_decrement")]
    IlluminationDecrement,
    #[strum(serialize = "illumination_increment")]
    IlluminationIncrement,
    #[strum(serialize = "rewind")]
    Rewind,
    #[strum(serialize = "play_or_pause")]
    PlayOrPause,
    #[strum(serialize = "fastforward")]
    Fastforward,
    #[strum(serialize = "mute")]
    Mute,
    #[strum(serialize = "volume_decrement")]
    VolumeDecrement,
    #[strum(serialize = "volume_increment")]
    VolumeIncrement,
    #[strum(serialize = "volume_down")]
    VolumeDown,
    #[strum(serialize = "volume_up")]
    VolumeUp,
    #[strum(serialize = "eject")]
    Eject,
    #[strum(serialize = "apple_display_brightness_decrement")]
    AppleDisplayBrightnessDecrement,
    #[strum(serialize = "apple_display_brightness_increment")]
    AppleDisplayBrightnessIncrement,
    #[strum(serialize = "apple_top_case_display_brightness_decrement")]
    AppleTopCaseDisplayBrightnessDecrement,
    #[strum(serialize = "apple_top_case_display_brightness_increment")]
    AppleTopCaseDisplayBrightnessIncrement,
    // Keypad
    #[strum(serialize = "keypad_num_lock")]
    KeypadNumLock,
    #[strum(serialize = "keypad_slash")]
    KeypadSlash,
    #[strum(serialize = "keypad_asterisk")]
    KeypadAsterisk,
    #[strum(serialize = "keypad_hyphen")]
    KeypadHyphen,
    #[strum(serialize = "keypad_plus")]
    KeypadPlus,
    #[strum(serialize = "keypad_enter")]
    KeypadEnter,
    #[strum(serialize = "keypad_1")]
    Keypad1,
    #[strum(serialize = "keypad_2")]
    Keypad2,
    #[strum(serialize = "keypad_3")]
    Keypad3,
    #[strum(serialize = "keypad_4")]
    Keypad4,
    #[strum(serialize = "keypad_5")]
    Keypad5,
    #[strum(serialize = "keypad_6")]
    Keypad6,
    #[strum(serialize = "keypad_7")]
    Keypad7,
    #[strum(serialize = "keypad_8")]
    Keypad8,
    #[strum(serialize = "keypad_9")]
    Keypad9,
    #[strum(serialize = "keypad_0")]
    Keypad0,
    #[strum(serialize = "keypad_period")]
    KeypadPeriod,
    #[strum(serialize = "keypad_equal_sign")]
    KeypadEqualSign,
    #[strum(serialize = "keypad_comma")]
    KeypadComma,
    #[strum(serialize = "keypad_equal_sign_as400")]
    KeypadEqualSignAs400,
    // Miscellaneous
    #[strum(serialize = "vk_none")]
    VkNone,
    #[strum(serialize = "print_screen")]
    PrintScreen,
    #[strum(serialize = "scroll_lock")]
    ScrollLock,
    #[strum(serialize = "pause")]
    Pause,
    #[strum(serialize = "insert")]
    Insert,
    #[strum(serialize = "application")]
    Application,
    #[strum(serialize = "help")]
    Help,
    #[strum(serialize = "power")]
    Power,
    #[strum(serialize = "execute")]
    Execute,
    #[strum(serialize = "menu")]
    Menu,
    #[strum(serialize = "select")]
    Select,
    #[strum(serialize = "stop")]
    Stop,
    #[strum(serialize = "again")]
    Again,
    #[strum(serialize = "undo")]
    Undo,
    #[strum(serialize = "cut")]
    Cut,
    #[strum(serialize = "copy")]
    Copy,
    #[strum(serialize = "paste")]
    Paste,
    #[strum(serialize = "find")]
    Find,
    // International and language
    #[strum(serialize = "international1")]
    International1,
    #[strum(serialize = "international2")]
    International2,
    #[strum(serialize = "international3")]
    International3,
    #[strum(serialize = "international4")]
    International4,
    #[strum(serialize = "international5")]
    International5,
    #[strum(serialize = "international6")]
    International6,
    #[strum(serialize = "international7")]
    International7,
    #[strum(serialize = "international8")]
    International8,
    #[strum(serialize = "international9")]
    International9,
    #[strum(serialize = "lang1")]
    Lang1,
    #[strum(serialize = "lang2")]
    Lang2,
    #[strum(serialize = "lang3")]
    Lang3,
    #[strum(serialize = "lang4")]
    Lang4,
    #[strum(serialize = "lang5")]
    Lang5,
    #[strum(serialize = "lang6")]
    Lang6,
    #[strum(serialize = "lang7")]
    Lang7,
    #[strum(serialize = "lang8")]
    Lang8,
    #[strum(serialize = "lang9")]
    Lang9,
    #[strum(serialize = "japanese_eisuu")]
    JapaneseEisuu,
    #[strum(serialize = "japanese_kana")]
    JapaneseKana,
    #[strum(serialize = "japanese_pc_nfer")]
    JapanesePcNfer,
    #[strum(serialize = "japanese_pc_xfer")]
    JapanesePcXfer,
    #[strum(serialize = "japanese_pc_katakana")]
    JapanesePcKatakana,
    // Legacy HID usages
    #[strum(serialize = "locking_caps_lock")]
    LockingCapsLock,
    #[strum(serialize = "locking_num_lock")]
    LockingNumLock,
    #[strum(serialize = "locking_scroll_lock")]
    LockingScrollLock,
    #[strum(serialize = "alternate_erase")]
    AlternateErase,
    #[strum(serialize = "sys_req_or_attention")]
    SysReqOrAttention,
    #[strum(serialize = "cancel")]
    Cancel,
    #[strum(serialize = "clear")]
    Clear,
    #[strum(serialize = "prior")]
    Prior,
    #[strum(serialize = "return")]
    Return,
    #[strum(serialize = "separator")]
    Separator,
    #[strum(serialize = "out")]
    Out,
    #[strum(serialize = "oper")]
    Oper,
    #[strum(serialize = "clear_or_again")]
    ClearOrAgain,
    #[strum(serialize = "cr_sel_or_props")]
    CrSelOrProps,
    #[strum(serialize = "ex_sel")]
    ExSel,
    // Virtual consumer keys
    #[strum(serialize = "vk_consumer_brightness_down")]
    VkConsumerBrightnessDown,
    #[strum(serialize = "vk_consumer_brightness_up")]
    VkConsumerBrightnessUp,
    #[strum(serialize = "vk_mission_control")]
    VkMissionControl,
    #[strum(serialize = "vk_launchpad")]
    VkLaunchpad,
    #[strum(serialize = "vk_dashboard")]
    VkDashboard,
    #[strum(serialize = "vk_consumer_illumination_down")]
    VkConsumerIlluminationDown,
    #[strum(serialize = "vk_consumer_illumination_up")]
    VkConsumerIlluminationUp,
    #[strum(serialize = "vk_consumer_previous")]
    VkConsumerPrevious,
    #[strum(serialize = "vk_consumer_play")]
    VkConsumerPlay,
    #[strum(serialize = "vk_consumer_next")]
    VkConsumerNext,}

impl KeyCode {
    /// The `key_code` string written to the document
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    /// Look up a key code by wire name or identifier, ignoring case
    pub fn from_name(name: &str) -> Result<Self, UnknownIdentifierError> {
        lookup(name, KeyCode::wire_name).ok_or_else(|| UnknownIdentifierError::new("key code", name.trim()))
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for KeyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

/// Any key usable in a `key_code` field: a plain key code or a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Code(KeyCode),
    Modifier(ModifierKey),
}

impl Key {
    pub fn wire_name(self) -> &'static str {
        match self {
            Key::Code(code) => code.wire_name(),
            Key::Modifier(modifier) => modifier.wire_name(),
        }
    }

    /// Look up a key by name. Plain key codes are tried before modifiers.
    pub fn from_name(name: &str) -> Result<Self, UnknownIdentifierError> {
        if let Ok(code) = KeyCode::from_name(name) {
            return Ok(Key::Code(code));
        }
        ModifierKey::from_name(name)
            .map(Key::Modifier)
            .map_err(|_| UnknownIdentifierError::new("key", name.trim()))
    }

    /// Every key, plain codes first
    pub fn iter() -> impl Iterator<Item = Key> {
        KeyCode::iter()
            .map(Key::Code)
            .chain(ModifierKey::iter().map(Key::Modifier))
    }

    pub fn as_modifier(self) -> Option<ModifierKey> {
        match self {
            Key::Modifier(modifier) => Some(modifier),
            Key::Code(_) => None,
        }
    }

    pub fn is_modifier(self) -> bool {
        self.as_modifier().is_some()
    }
}

impl From<KeyCode> for Key {
    fn from(code: KeyCode) -> Self {
        Key::Code(code)
    }
}

impl From<ModifierKey> for Key {
    fn from(modifier: ModifierKey) -> Self {
        Key::Modifier(modifier)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Key {
    type Err = UnknownIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Key::from_name(s)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

/// A mouse button, `button1` (primary) through `button32`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum PointingButton {
    #[strum(serialize = "button1")]
    Button1,
    #[strum(serialize = "button2")]
    Button2,
    #[strum(serialize = "button3")]
    Button3,
    #[strum(serialize = "button4")]
    Button4,
    #[strum(serialize = "button5")]
    Button5,
    #[strum(serialize = "button6")]
    Button6,
    #[strum(serialize = "button7")]
    Button7,
    #[strum(serialize = "button8")]
    Button8,
    #[strum(serialize = "button9")]
    Button9,
    #[strum(serialize = "button10")]
    Button10,
    #[strum(serialize = "button11")]
    Button11,
    #[strum(serialize = "button12")]
    Button12,
    #[strum(serialize = "button13")]
    Button13,
    #[strum(serialize = "button14")]
    Button14,
    #[strum(serialize = "button15")]
    Button15,
    #[strum(serialize = "button16")]
    Button16,
    #[strum(serialize = "button17")]
    Button17,
    #[strum(serialize = "button18")]
    Button18,
    #[strum(serialize = "button19")]
    Button19,
    #[strum(serialize = "button20")]
    Button20,
    #[strum(serialize = "button21")]
    Button21,
    #[strum(serialize = "button22")]
    Button22,
    #[strum(serialize = "button23")]
    Button23,
    #[strum(serialize = "button24")]
    Button24,
    #[strum(serialize = "button25")]
    Button25,
    #[strum(serialize = "button26")]
    Button26,
    #[strum(serialize = "button27")]
    Button27,
    #[strum(serialize = "button28")]
    Button28,
    #[strum(serialize = "button29")]
    Button29,
    #[strum(serialize = "button30")]
    Button30,
    #[strum(serialize = "button31")]
    Button31,
    #[strum(serialize = "button32")]
    Button32,
}

impl PointingButton {
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    pub fn from_name(name: &str) -> Result<Self, UnknownIdentifierError> {
        lookup(name, PointingButton::wire_name)
            .ok_or_else(|| UnknownIdentifierError::new("pointing button", name.trim()))
    }
}

impl fmt::Display for PointingButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for PointingButton {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

/// Shared name lookup for the closed key enumerations.
///
/// Accepts the wire name in any case (`caps_lock`, `CAPS_LOCK`) and the
/// identifier spelling (`CapsLock`, `capslock`, `Num1`).
pub(crate) fn lookup<T>(name: &str, wire_name: fn(T) -> &'static str) -> Option<T>
where
    T: Copy + fmt::Debug + FromStr + IntoEnumIterator,
{
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<T>() {
        return Some(value);
    }
    let wanted = compact(trimmed);
    T::iter().find(|value| {
        compact(wire_name(*value)) == wanted || format!("{:?}", value).to_ascii_lowercase() == wanted
    })
}

fn compact(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_wire_name_round_trip() {
        for key in Key::iter() {
            assert_eq!(Key::from_name(key.wire_name()), Ok(key), "{key:?}");
        }
        for button in PointingButton::iter() {
            assert_eq!(PointingButton::from_name(button.wire_name()), Ok(button));
        }
    }

    #[test]
    fn test_wire_names_are_unique() {
        let mut seen = HashSet::new();
        for key in Key::iter() {
            assert!(seen.insert(key.wire_name()), "duplicate wire name {}", key.wire_name());
        }
        let compacted: HashSet<String> = Key::iter().map(|k| compact(k.wire_name())).collect();
        assert_eq!(compacted.len(), seen.len());
    }

    #[test]
    fn test_lookup_by_identifier_spelling() {
        for code in KeyCode::iter() {
            let ident = format!("{:?}", code).to_lowercase();
            assert_eq!(KeyCode::from_name(&ident), Ok(code), "{ident}");
        }
        assert_eq!(Key::from_name("CapsLock"), Ok(Key::Code(KeyCode::CapsLock)));
        assert_eq!(Key::from_name("num9"), Ok(Key::Code(KeyCode::Num9)));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Key::from_name("RETURN_OR_ENTER"), Ok(Key::Code(KeyCode::ReturnOrEnter)));
        assert_eq!(Key::from_name("Left_Shift"), Ok(Key::Modifier(ModifierKey::LeftShift)));
        assert_eq!(Key::from_name(" j "), Ok(Key::Code(KeyCode::J)));
    }

    #[test]
    fn test_unknown_names_fail() {
        let err = Key::from_name("not_a_key").unwrap_err();
        assert_eq!(err.kind, "key");
        assert_eq!(err.name, "not_a_key");
        assert!(Key::from_name("").is_err());
        assert!(PointingButton::from_name("button33").is_err());
    }

    #[test]
    fn test_modifier_is_a_key() {
        let key: Key = ModifierKey::RightControl.into();
        assert_eq!(key.wire_name(), "right_control");
        assert_eq!(key.as_modifier(), Some(ModifierKey::RightControl));
        assert!(!Key::from(KeyCode::A).is_modifier());
    }

    #[test]
    fn test_key_serializes_as_wire_name() {
        let json = serde_json::to_string(&Key::from(KeyCode::Num0)).unwrap();
        assert_eq!(json, "\"0\"");
        let json = serde_json::to_string(&PointingButton::Button2).unwrap();
        assert_eq!(json, "\"button2\"");
    }
}
