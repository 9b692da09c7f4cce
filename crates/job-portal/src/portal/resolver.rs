use axum::http::HeaderMap;

use super::identity::{Identity, Role, UserId};

/// Header carrying the verified user id, set by the authenticating gateway.
pub const USER_HEADER: &str = "x-portal-user";
/// Header carrying the verified role label.
pub const ROLE_HEADER: &str = "x-portal-role";

/// Turns inbound request metadata into a verified [`Identity`].
///
/// Credential checks happen upstream; implementations only translate what
/// the identity provider already verified.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Identity;
}

/// Resolver for deployments behind a gateway that authenticates the caller
/// and forwards `x-portal-user` / `x-portal-role`. Anything missing or
/// malformed resolves to the anonymous identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedHeaderResolver;

impl IdentityResolver for TrustedHeaderResolver {
    fn resolve(&self, headers: &HeaderMap) -> Identity {
        let user = header_value(headers, USER_HEADER);
        let role = header_value(headers, ROLE_HEADER).and_then(Role::parse);

        match (user, role) {
            (Some(user), Some(role)) => Identity {
                id: UserId(user.to_string()),
                role,
                authenticated: true,
            },
            _ => Identity::anonymous(),
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
