//! Synthetic member names

/// Prefix that keeps generated members apart from user-declared ones
pub const DEFAULT_PREFIX: &str = "_weaver_assisted_";

/// Derives synthetic names by prefixing a base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameGenerator {
    prefix: String,
}

impl NameGenerator {
    /// Create a generator that prepends `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The prefix every generated name starts with
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefix `name` to form a synthetic member name
    pub fn generate(&self, name: &str) -> String {
        let mut result = String::with_capacity(self.prefix.len() + name.len());
        result.push_str(&self.prefix);
        result.push_str(name);
        result
    }
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

/// Whether `name` is usable as a member identifier
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
