//! Client configuration.

/// Configuration for the encrypting client.
///
/// Built once and handed to the client; there is no mutation after
/// construction.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Allow reading objects written with legacy key-wrap or content
    /// algorithms. Off by default: legacy modes are unauthenticated.
    pub legacy_decrypt_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            legacy_decrypt_enabled: false,
        }
    }
}

impl ClientConfig {
    /// A config that accepts legacy envelopes.
    pub fn with_legacy_decrypt() -> Self {
        Self {
            legacy_decrypt_enabled: true,
        }
    }
}
