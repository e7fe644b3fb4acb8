pub mod settings;

use std::path::{Path, PathBuf};

use crate::types::config::Settings;

pub use settings::SettingsError;


/// Persistent client configuration loaded from a config directory.
pub struct Data {
    settings: Settings,
    config_dir: PathBuf,
}


impl Data {
    /// Load `config_dir/settings.yaml`, falling back to the built-in
    /// defaults when the file does not exist.
    pub fn new(config_dir: &Path) -> Result<Data, SettingsError> {
        let settings = settings::load_or_default(config_dir)?;
        Ok(Data {
            settings,
            config_dir: config_dir.to_path_buf(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(settings::SETTINGS_FILE)
    }

    /// Write the current settings to `settings.yaml`, creating the config
    /// directory if needed.
    pub fn save(&self) -> Result<(), SettingsError> {
        std::fs::create_dir_all(&self.config_dir).map_err(|source| SettingsError::Write {
            path: self.config_dir.clone(),
            source,
        })?;
        settings::save(&self.settings_path(), &self.settings)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_new_with_missing_dir_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let data = Data::new(&dir.path().join("missing")).unwrap();
        assert_eq!(data.settings().message_ttl_ms, 8000);
        assert_eq!(data.settings().chains.len(), 2);
    }

    #[test]
    fn data_new_with_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.yaml"), "message_ttl_ms: 2500\n").unwrap();
        let data = Data::new(dir.path()).unwrap();
        assert_eq!(data.settings().message_ttl_ms, 2500);
        assert_eq!(data.config_dir(), dir.path());
    }

    #[test]
    fn save_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tracer");
        let data = Data::new(&nested).unwrap();
        data.save().unwrap();
        assert!(data.settings_path().exists());
        let again = Data::new(&nested).unwrap();
        assert_eq!(again.settings(), data.settings());
    }

    #[test]
    fn invalid_settings_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.yaml"), "chains: {}\n").unwrap();
        assert!(matches!(Data::new(dir.path()), Err(SettingsError::NoChains)));
    }
}
