use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts},
};

use crate::state::AppState;

const FORWARDED_FOR: &str = "X-Forwarded-For";

/// Client address used for rate limiting and audit fields.
///
/// The socket peer is the client unless it is one of
/// `server.trusted_proxies`, in which case the rightmost `X-Forwarded-For`
/// hop (the one that proxy appended) is used. Earlier hops are supplied by
/// the caller and never read.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

/// Resolve the client address from the peer and the forwarding header.
pub fn resolve_client_ip(
    peer: Option<IpAddr>,
    forwarded_for: Option<&str>,
    trusted_proxies: &[IpAddr],
) -> String {
    let Some(peer) = peer else {
        return "unknown".into();
    };
    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    forwarded_for
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .and_then(|hop| hop.parse::<IpAddr>().ok())
        .unwrap_or(peer)
        .to_string()
}

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let forwarded_for = parts
            .headers
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok());

        Ok(ClientIp(resolve_client_ip(
            peer,
            forwarded_for,
            &state.config.server.trusted_proxies,
        )))
    }
}

#[derive(Debug, Clone)]
pub struct UserAgent(pub Option<String>);

impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(UserAgent(
            parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        ))
    }
}
