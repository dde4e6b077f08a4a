//! Configuration access port.
//!
//! Sections in use: `[data]`, `[screener]`, `[criteria]`, `[web]`.
//!
//! Typed getters return `Ok(None)` for an absent or blank value and `Err`
//! with a short reason when the value is present but does not parse.

pub trait ConfigPort {
    /// Raw value, untrimmed. `None` when the section or key is absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;
    /// Accepts true/false, yes/no, on/off and 1/0, case-insensitively.
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String>;
}
