//! Login failure reason table.

use std::collections::HashMap;

use emberlink_protocol::LoginFailReason;

/// Text shown for a refusal code nobody registered.
pub const UNKNOWN_REASON: &str = "Unknown reason";

/// Maps server refusal codes to text a player can read.
///
/// Starts with the codes every server knows; games register their own
/// with [`insert`](Self::insert).
#[derive(Debug, Clone)]
pub struct LoginReasons {
    table: HashMap<LoginFailReason, String>,
}

impl LoginReasons {
    /// A table with no entries; every code describes as [`UNKNOWN_REASON`].
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Adds or replaces the text for `code`.
    pub fn insert(&mut self, code: LoginFailReason, text: impl Into<String>) -> &mut Self {
        self.table.insert(code, text.into());
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, code: LoginFailReason, text: impl Into<String>) -> Self {
        self.insert(code, text);
        self
    }

    pub fn describe(&self, code: LoginFailReason) -> &str {
        self.table
            .get(&code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_REASON)
    }
}

impl Default for LoginReasons {
    fn default() -> Self {
        Self::empty()
            .with(LoginFailReason::ACCESS_DENIED, "Access denied")
            .with(LoginFailReason::NAME_TAKEN, "Name already in use")
            .with(LoginFailReason::SERVER_FULL, "Server is full")
            .with(LoginFailReason::BANNED, "Banned from this server")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_codes_are_described() {
        let reasons = LoginReasons::default();
        assert_eq!(reasons.describe(LoginFailReason::ACCESS_DENIED), "Access denied");
        assert_eq!(reasons.describe(LoginFailReason::SERVER_FULL), "Server is full");
    }

    #[test]
    fn test_unmapped_code_falls_back() {
        let reasons = LoginReasons::default();
        assert_eq!(reasons.describe(LoginFailReason(42)), UNKNOWN_REASON);
        assert_eq!(reasons.describe(LoginFailReason::NONE), UNKNOWN_REASON);
    }

    #[test]
    fn test_insert_overrides_and_extends() {
        let mut reasons = LoginReasons::default();
        reasons
            .insert(LoginFailReason::ACCESS_DENIED, "Wrong password")
            .insert(LoginFailReason(42), "Maintenance");
        assert_eq!(reasons.describe(LoginFailReason::ACCESS_DENIED), "Wrong password");
        assert_eq!(reasons.describe(LoginFailReason(42)), "Maintenance");
    }

    #[test]
    fn test_empty_table_knows_nothing() {
        let reasons = LoginReasons::empty();
        assert_eq!(reasons.describe(LoginFailReason::BANNED), UNKNOWN_REASON);
    }
}
