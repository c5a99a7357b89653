// Document Generation Tests
//
// Builds complete profiles through the public API and checks the rendered
// karabiner.json text.
//
// Run with: cargo test --test document_test

use karabiner_core::{
    dual_role, manipulator, remap, rule, Conditional, ConfigurationError, DeviceConfiguration,
    DeviceIdentifier, GlobalSettings, KarabinerConfig, KeyCode, ModifierKey, OutputAction,
    Parameters, PointingButton, Profile, SimpleModification,
};
use serde_json::{json, Value};

fn caps_rule() -> karabiner_core::Rule {
    rule("Caps Lock to Escape/Control")
        .manipulator(dual_role(
            KeyCode::CapsLock,
            KeyCode::Escape,
            ModifierKey::RightControl,
        ))
        .build()
        .unwrap()
}

fn render(profile: Profile) -> Value {
    let text = KarabinerConfig::new(vec![profile]).to_json().unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_caps_lock_dual_role_document() {
    let value = render(Profile::new("Default").rule(caps_rule()));

    assert_eq!(
        value,
        json!({
            "profiles": [{
                "name": "Default",
                "complex_modifications": {
                    "parameters": {
                        "basic.simultaneous_threshold_milliseconds": 50,
                        "basic.to_delayed_action_delay_milliseconds": 500,
                        "basic.to_if_alone_timeout_milliseconds": 1000,
                        "basic.to_if_held_down_threshold_milliseconds": 500
                    },
                    "rules": [{
                        "description": "Caps Lock to Escape/Control",
                        "manipulators": [{
                            "type": "basic",
                            "from": {
                                "key_code": "caps_lock",
                                "modifiers": { "optional": ["any"] }
                            },
                            "to": [{ "key_code": "right_control" }],
                            "to_if_alone": [{ "key_code": "escape" }]
                        }]
                    }]
                },
                "virtual_hid_keyboard": {
                    "country_code": 0,
                    "keyboard_type_v2": "ansi"
                }
            }]
        })
    );
}

#[test]
fn test_rendering_is_deterministic() {
    let build = || {
        let profile = Profile::new("Default")
            .rule(caps_rule())
            .complex_parameters(Parameters {
                to_if_alone_timeout_ms: Some(300),
                ..Parameters::default()
            })
            .simple_modification(SimpleModification::new(
                KeyCode::NonUsBackslash,
                KeyCode::GraveAccentAndTilde,
            ));
        KarabinerConfig::new(vec![profile])
            .with_global(GlobalSettings {
                show_in_menu_bar: Some(false),
                ..GlobalSettings::default()
            })
            .to_json()
            .unwrap()
    };

    assert_eq!(build(), build());
}

#[test]
fn test_four_space_indentation() {
    let text = KarabinerConfig::new(vec![Profile::new("Default")])
        .to_json()
        .unwrap();
    assert!(text.starts_with("{\n    \"profiles\": [\n        {\n"));
}

#[test]
fn test_empty_slots_are_omitted() {
    let rule = rule("plain")
        .manipulator(remap(KeyCode::A).to(KeyCode::B))
        .build()
        .unwrap();
    let value = serde_json::to_value(&rule.manipulators()[0]).unwrap();
    let object = value.as_object().unwrap();

    for absent in [
        "to_if_alone",
        "to_after_key_up",
        "to_if_held_down",
        "parameters",
        "conditions",
        "description",
    ] {
        assert!(!object.contains_key(absent), "unexpected key {absent}");
    }
}

#[test]
fn test_profile_override_of_one_threshold_keeps_other_defaults() {
    let value = render(Profile::new("Default").complex_parameters(Parameters {
        to_if_alone_timeout_ms: Some(300),
        ..Parameters::default()
    }));

    assert_eq!(
        value["profiles"][0]["complex_modifications"]["parameters"],
        json!({
            "basic.simultaneous_threshold_milliseconds": 50,
            "basic.to_delayed_action_delay_milliseconds": 500,
            "basic.to_if_alone_timeout_milliseconds": 300,
            "basic.to_if_held_down_threshold_milliseconds": 500
        })
    );
}

#[test]
fn test_modifier_defaults_per_input_kind() {
    let rule = rule("inputs")
        .manipulator(
            manipulator()
                .from_mandatory(KeyCode::W, [ModifierKey::LeftControl])
                .to(KeyCode::Escape),
        )
        .manipulator(
            manipulator()
                .from_button(PointingButton::Button4)
                .to(KeyCode::Escape),
        )
        .manipulator(
            manipulator()
                .from_simultaneous([KeyCode::J, KeyCode::K])
                .to(KeyCode::Escape),
        )
        .build()
        .unwrap();
    let froms: Vec<Value> = rule
        .manipulators()
        .iter()
        .map(|m| serde_json::to_value(m).unwrap()["from"].clone())
        .collect();

    assert_eq!(
        froms[0],
        json!({ "key_code": "w", "modifiers": { "mandatory": ["left_control"] } })
    );
    assert_eq!(
        froms[1],
        json!({ "pointing_button": "button4", "modifiers": { "optional": ["any"] } })
    );
    assert_eq!(
        froms[2],
        json!({ "simultaneous": [{ "key_code": "j" }, { "key_code": "k" }] })
    );
}

#[test]
fn test_scoped_manipulator_and_device_configuration() {
    let anne = DeviceIdentifier::keyboard(1241, 41618);
    let rule = rule("terminal word delete")
        .manipulator(
            remap(KeyCode::W)
                .mandatory([ModifierKey::LeftControl])
                .to(OutputAction::key_with(
                    KeyCode::DeleteOrBackspace,
                    [ModifierKey::LeftOption],
                ))
                .for_app(["^com\\.apple\\.Terminal$"])
                .for_device([anne.clone()]),
        )
        .build()
        .unwrap();

    let mut device = DeviceConfiguration::new(anne);
    device.ignore = Some(false);
    let value = render(Profile::new("Default").rule(rule).device(device));
    let profile = &value["profiles"][0];

    assert_eq!(
        profile["complex_modifications"]["rules"][0]["manipulators"][0]["conditions"],
        json!([
            { "type": "frontmost_application_if", "bundle_identifiers": ["^com\\.apple\\.Terminal$"] },
            {
                "type": "device_if",
                "identifiers": [{ "vendor_id": 1241, "product_id": 41618, "is_keyboard": true }]
            }
        ])
    );
    assert_eq!(
        profile["devices"][0]["identifiers"],
        json!({ "vendor_id": 1241, "product_id": 41618, "is_keyboard": true })
    );
    assert_eq!(profile["devices"][0]["ignore"], false);
}

#[test]
fn test_invalid_condition_is_reported_at_build() {
    let err = rule("bad pattern")
        .manipulator(remap(KeyCode::A).to(KeyCode::B).for_app(["("]))
        .build()
        .unwrap_err();

    assert!(matches!(
        err.as_configuration(),
        Some(ConfigurationError::InvalidPattern { .. })
    ));
    assert!(err.to_string().contains("bad pattern"));
}

#[test]
fn test_missing_input_is_reported() {
    let err = rule("no input")
        .manipulator(manipulator().to(KeyCode::B))
        .build()
        .unwrap_err();
    assert_eq!(err.as_configuration(), Some(&ConfigurationError::MissingInput));
}
