use super::*;

fn storage_with(raw: &str) -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    storage.set_item(SETTINGS_KEY, raw).unwrap();
    storage
}

// =============================================================
// Keys
// =============================================================

#[test]
fn defaults_enable_deletion_and_tooltips_only() {
    let settings = Settings::default();
    for key in SettingKey::ALL {
        let expected = matches!(key, SettingKey::ShowDeletion | SettingKey::ShowTooltips);
        assert_eq!(settings.get(key), expected, "{key}");
    }
}

#[test]
fn key_names_round_trip() {
    for key in SettingKey::ALL {
        assert_eq!(key.name().parse::<SettingKey>().unwrap(), key);
    }
    assert!(matches!("nope".parse::<SettingKey>(), Err(SettingsError::UnknownKey(k)) if k == "nope"));
}

#[test]
fn effects_cover_scene_toggles() {
    assert_eq!(SettingKey::HideGround.effect(), Some(SettingEffect::Ground));
    assert_eq!(SettingKey::HideDecoObjects.effect(), Some(SettingEffect::DecoObjects));
    assert_eq!(SettingKey::ShowDanger.effect(), Some(SettingEffect::DangerObjects));
    assert_eq!(SettingKey::DisableObjectOutline.effect(), Some(SettingEffect::SelectionOutline));
    assert_eq!(SettingKey::HideMenu.effect(), None);
}

#[test]
fn entries_follow_menu_order() {
    let labels: Vec<&str> = Settings::default().entries().map(|(_, label, _)| label).collect();
    assert_eq!(labels.len(), 9);
    assert_eq!(labels[0], "Show who deleted an object");
    assert_eq!(labels[8], "Hide menu");
}

// =============================================================
// Loading
// =============================================================

#[test]
fn missing_blob_loads_defaults() {
    let mut storage = MemoryStorage::new();
    assert_eq!(Settings::load(&mut storage), Settings::default());
}

#[test]
fn saved_blob_overrides_defaults() {
    let mut storage = storage_with(r#"{"hideGround":true,"showTooltips":false}"#);
    let settings = Settings::load(&mut storage);
    assert!(settings.get(SettingKey::HideGround));
    assert!(!settings.get(SettingKey::ShowTooltips));
    assert!(settings.get(SettingKey::ShowDeletion));
}

#[test]
fn saved_values_use_js_truthiness() {
    let settings = Settings::parse(r#"{"hideGround":1,"hideMenu":"yes","showDanger":0,"showDeletion":null,"disableBG":""}"#)
        .unwrap();
    assert!(settings.get(SettingKey::HideGround));
    assert!(settings.get(SettingKey::HideMenu));
    assert!(!settings.get(SettingKey::ShowDanger));
    assert!(!settings.get(SettingKey::ShowDeletion));
    assert!(!settings.get(SettingKey::DisableBackground));
}

#[test]
fn corrupt_blob_is_removed() {
    let mut storage = storage_with("{not json");
    assert_eq!(Settings::load(&mut storage), Settings::default());
    assert_eq!(storage.get_item(SETTINGS_KEY), None);
}

#[test]
fn unknown_key_counts_as_corrupt() {
    let mut storage = storage_with(r#"{"hideGround":true,"legacyThing":true}"#);
    let settings = Settings::load(&mut storage);
    assert!(!settings.get(SettingKey::HideGround));
    assert_eq!(storage.get_item(SETTINGS_KEY), None);
}

#[test]
fn non_object_blob_counts_as_corrupt() {
    let mut storage = storage_with("[true, false]");
    assert_eq!(Settings::load(&mut storage), Settings::default());
    assert_eq!(storage.get_item(SETTINGS_KEY), None);
}

// =============================================================
// Changes
// =============================================================

#[test]
fn set_saves_every_key() {
    let mut storage = MemoryStorage::new();
    let mut settings = Settings::default();
    assert_eq!(settings.set(&mut storage, SettingKey::HideGround, true), Some(SettingEffect::Ground));
    let saved: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&storage.get_item(SETTINGS_KEY).unwrap()).unwrap();
    assert_eq!(saved.len(), 9);
    assert_eq!(saved["hideGround"], serde_json::Value::Bool(true));
    assert_eq!(Settings::load(&mut storage), settings);
}

#[test]
fn unchanged_value_has_no_effect() {
    let mut storage = MemoryStorage::new();
    let mut settings = Settings::default();
    assert_eq!(settings.set(&mut storage, SettingKey::HideGround, false), None);
    assert!(storage.get_item(SETTINGS_KEY).is_some());
}

#[test]
fn toggle_flips_and_reports_effect() {
    let mut storage = MemoryStorage::new();
    let mut settings = Settings::default();
    assert_eq!(settings.toggle(&mut storage, SettingKey::ShowTooltips), Some(SettingEffect::Tooltips));
    assert!(!settings.get(SettingKey::ShowTooltips));
    assert_eq!(settings.toggle(&mut storage, SettingKey::HideMenu), None);
    assert!(settings.get(SettingKey::HideMenu));
}

#[test]
fn failed_save_keeps_in_memory_value() {
    let mut storage = MemoryStorage::new();
    storage.set_read_only(true);
    let mut settings = Settings::default();
    assert_eq!(settings.set(&mut storage, SettingKey::ShowDanger, true), Some(SettingEffect::DangerObjects));
    assert!(settings.get(SettingKey::ShowDanger));
    assert_eq!(storage.get_item(SETTINGS_KEY), None);
    assert!(matches!(settings.save(&mut storage), Err(SettingsError::Storage(_))));
}
