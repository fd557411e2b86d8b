use serde::{Deserialize, Serialize};

/// Identifier and token relayed from the identity provider.
///
/// Sign-up with e-mail confirmation enabled returns a user without a session,
/// so both halves are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: Option<String>,
    pub access_token: Option<String>,
}
