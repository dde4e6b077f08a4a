//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Present and non-blank values only; `configparser` trims on read.
    fn has_value(&self, section: &str, key: &str) -> bool {
        self.config
            .get(section, key)
            .is_some_and(|v| !v.trim().is_empty())
    }

    fn typed<T>(
        &self,
        section: &str,
        key: &str,
        read: impl FnOnce(&Ini) -> Result<Option<T>, String>,
    ) -> Result<Option<T>, String> {
        if !self.has_value(section, key) {
            return Ok(None);
        }
        read(&self.config)
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        self.typed(section, key, |ini| ini.getint(section, key))
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String> {
        self.typed(section, key, |ini| ini.getfloat(section, key))
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        self.typed(section, key, |ini| ini.getboolcoerce(section, key))
    }
}
