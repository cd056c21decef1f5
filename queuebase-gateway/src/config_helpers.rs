use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use queuebase_auth::{HmacSha256Verifier, KeyringValidator, RequestAuthenticator};
use queuebase_config::AuthConfig;

/// Build the request authenticator from the `[auth]` section.
///
/// `secret_key` becomes the key used when a request names no key id; each
/// entry of `keys` is selectable through `X-Queuebase-Key-Id`.
pub fn authenticator_from_config(cfg: &AuthConfig) -> RequestAuthenticator {
    let mut keyring = KeyringValidator::new();
    if let Some(secret) = cfg.secret_key.as_deref() {
        keyring = keyring.with_default(secret);
    }
    for (id, secret) in &cfg.keys {
        keyring = keyring.with_key(id.clone(), secret.as_str());
    }
    tracing::info!(
        default_key = cfg.secret_key.is_some(),
        key_ids = cfg.keys.len(),
        "request signing configured"
    );
    RequestAuthenticator::new(keyring, HmacSha256Verifier)
}

/// Parse host:port into a SocketAddr, with fallback to 0.0.0.0.
pub fn parse_bind_address(host: &str, port: u16) -> SocketAddr {
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, port))
        .or_else(|_| host.parse::<SocketAddr>())
        .or_else(|_| {
            host.trim_matches(|c| c == '[' || c == ']')
                .parse::<Ipv6Addr>()
                .map(|ip| SocketAddr::new(IpAddr::V6(ip), port))
        })
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)))
}
