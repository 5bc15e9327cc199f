//! Session lifecycle: start, refresh rotation and logout.

use tracing::{debug, info};

use super::state::AuthBackend;
use crate::error::GateError;
use crate::jwt::{JwtError, TokenKind, TokenPair, now_secs};

/// Why a session operation failed.
#[derive(Debug)]
pub enum SessionError {
    /// The presented refresh token was refused.
    Rejected(GateError),
    /// A replacement pair could not be issued.
    Issue(JwtError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Rejected(e) => write!(f, "{}", e),
            SessionError::Issue(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<GateError> for SessionError {
    fn from(e: GateError) -> Self {
        SessionError::Rejected(e)
    }
}

impl From<JwtError> for SessionError {
    fn from(e: JwtError) -> Self {
        SessionError::Issue(e)
    }
}

impl AuthBackend {
    /// Issue the initial token pair for a subject whose credentials were
    /// checked elsewhere.
    pub fn start_session(&self, subject_id: &str) -> Result<TokenPair, JwtError> {
        let pair = self.codec.issue_pair(subject_id)?;
        info!(subject = %subject_id, "Session started");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair, revoking the old one.
    pub fn rotate(&self, refresh_token: Option<&str>) -> Result<TokenPair, SessionError> {
        self.rotate_at(refresh_token, now_secs()?)
    }

    /// [`rotate`](Self::rotate) with an explicit clock.
    ///
    /// Each refresh token can be rotated once; presenting it again is refused
    /// as invalid.
    pub fn rotate_at(
        &self,
        refresh_token: Option<&str>,
        now: u64,
    ) -> Result<TokenPair, SessionError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(GateError::TokenAbsent)?;
        let principal = self
            .codec
            .verify_at(token, TokenKind::Refresh, now)
            .map_err(GateError::from)?;

        if !self
            .revocations
            .revoke(&principal.token_id, principal.expires_at)
        {
            debug!(subject = %principal.subject_id, "Refresh token reused");
            return Err(GateError::TokenInvalid.into());
        }

        let pair = self.codec.issue_pair_at(&principal.subject_id, now)?;
        debug!(subject = %principal.subject_id, "Session rotated");
        Ok(pair)
    }

    /// Revoke the presented refresh token if it still verifies.
    ///
    /// Logout always succeeds from the caller's point of view; returns whether
    /// a live session was revoked.
    pub fn logout(&self, refresh_token: Option<&str>) -> bool {
        let Some(token) = refresh_token.filter(|t| !t.is_empty()) else {
            return false;
        };
        match self.codec.verify(token, TokenKind::Refresh) {
            Ok(principal) => {
                let revoked = self
                    .revocations
                    .revoke(&principal.token_id, principal.expires_at);
                if revoked {
                    info!(subject = %principal.subject_id, "Session ended");
                }
                revoked
            }
            Err(_) => false,
        }
    }
}
