//! Session gating for mutating operations.
//!
//! The auth provider's answer is carried as an explicit [`Session`] value
//! through every call that needs it; nothing reads ambient signed-in
//! state. Restores (and any other mutation) require `Authenticated`.

use anyhow::{bail, Result};
use shared::{Session, UserProfile};

/// Require a signed-in user, distinguishing "auth still resolving" from
/// "signed out".
pub fn require_authenticated(session: &Session) -> Result<&UserProfile> {
    match session {
        Session::Authenticated(user) => Ok(user),
        Session::Unresolved => bail!("authentication is still resolving"),
        Session::Anonymous => bail!("not signed in"),
    }
}
