//! Authentication backend shared by routers.

use std::sync::Arc;

use super::cookie::CookieDescriptor;
use crate::jwt::TokenCodec;
use crate::revocation::SessionRevocation;
use crate::server_config::AuthSettings;

/// Everything the auth pipeline and session endpoints need.
pub struct AuthBackend {
    pub codec: TokenCodec,
    pub cookies: CookieDescriptor,
    pub revocations: Arc<dyn SessionRevocation>,
}

impl AuthBackend {
    pub fn new(settings: &AuthSettings, revocations: Arc<dyn SessionRevocation>) -> Self {
        Self {
            codec: TokenCodec::new(settings),
            cookies: CookieDescriptor::from_settings(settings),
            revocations,
        }
    }
}

/// Trait for state types that provide the auth backend.
pub trait HasAuthBackend {
    fn auth(&self) -> &AuthBackend;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard field.
///
/// The struct must have an `auth: Arc<AuthBackend>` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub auth: Arc<AuthBackend>,
///     // ... other fields
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            fn auth(&self) -> &$crate::auth::AuthBackend {
                &self.auth
            }
        }
    };
}
