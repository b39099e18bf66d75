use crate::error::Result;
use crate::settings::{
    config_dir, load_settings, load_stored_settings, log_path, save_settings, SETTING_KEYS,
};

pub fn show() -> Result<()> {
    let settings = load_settings();
    for key in SETTING_KEYS {
        println!("{:<24} {}", key, settings.get(key)?);
    }
    println!();
    println!("{:<24} {}", "settings file", config_dir().join("settings.json").display());
    println!("{:<24} {}", "log file", log_path().display());
    Ok(())
}

pub fn get(key: &str) -> Result<()> {
    println!("{}", load_settings().get(key)?);
    Ok(())
}

/// Change a stored setting. Environment overrides are not written back.
pub fn set(key: &str, value: &str) -> Result<()> {
    let mut settings = load_stored_settings();
    settings.set(key, value)?;
    save_settings(&settings)?;
    println!("{key} = {}", settings.get(key)?);
    Ok(())
}
