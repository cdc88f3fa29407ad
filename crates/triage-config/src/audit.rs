//! Audit integrity configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use triage_core::integrity::AuditSecret;

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AuditConfig {
    /// HMAC secret for incident audit digests. Empty disables signing and
    /// verification entirely (no stamps, no errors). Never serialized.
    #[serde(default, skip_serializing)]
    pub secret: String,
}

impl AuditConfig {
    /// Whether a secret is configured.
    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }

    /// The configured secret, or `None` when auditing is disabled.
    pub fn secret(&self) -> Option<AuditSecret> {
        AuditSecret::new(self.secret.clone())
    }
}

impl fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditConfig")
            .field(
                "secret",
                &if self.is_configured() { "[REDACTED]" } else { "" },
            )
            .finish()
    }
}
