//! Configuration access port trait.

pub trait ConfigPort {
    /// Raw value of `[section] key`, if the key is present.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `true`/`yes`/`1` or `false`/`no`/`0`; anything else gives `default`.
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Name used in error messages, e.g. the file path.
    fn source_name(&self) -> &str;

    /// Trimmed value, or `default` when the key is missing or blank.
    fn get_string_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default.to_string())
    }
}
