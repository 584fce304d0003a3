//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{anyhow, bail, Result};

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save()?;
            Output::success(&format!("Set {} = {}", key, value));
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` (e.g. `retrieval.top_k`) set to `raw`.
///
/// The new value keeps the type of the old one and the result must validate.
fn set_value(settings: &Settings, key: &str, raw: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings)?;

    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| anyhow!("Key must look like section.field, got '{}'", key))?;

    let table = root
        .get_mut(section)
        .and_then(toml::Value::as_table_mut)
        .ok_or_else(|| anyhow!("Unknown config section '{}'", section))?;

    let new_value = match table.get(field) {
        Some(toml::Value::Integer(_)) => toml::Value::Integer(raw.parse()?),
        Some(toml::Value::Float(_)) => toml::Value::Float(raw.parse()?),
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(raw.parse()?),
        Some(toml::Value::String(_)) | None => toml::Value::String(raw.to_string()),
        Some(other) => bail!("'{}' holds a {} and cannot be set from the command line", key, other.type_str()),
    };
    table.insert(field.to_string(), new_value);

    let updated: Settings = root.try_into()?;
    updated.validate()?;
    Ok(updated)
}
