//! Public-endpoint allowlist.

/// Endpoints that never carry an `Authorization` header.
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "login",
    "register",
    "generate-otp",
    "verify-otp",
    "forgot-password",
    "reset-password",
    "validate-username",
];

/// Whether `path` names a public endpoint.
///
/// Matches whole path segments, ignoring any query string, so
/// `/auth/login?x=1` is public and `/user/login-history` is not.
pub fn is_public_endpoint(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .any(|segment| PUBLIC_ENDPOINTS.contains(&segment))
}
