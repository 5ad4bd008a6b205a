//! Client IP Strategies
//!
//! Pluggable ways of deriving the client address from an incoming request:
//! the socket peer address, or one of the forwarding headers set by
//! trusted reverse proxies.

use axum::extract::{ConnectInfo, Request};
use axum::http::header::{HeaderName, FORWARDED};
use std::net::{IpAddr, SocketAddr};

/// Default header for the forwarded-for strategies.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Reasons a client address could not be derived.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientIpError {
    #[error("connection info unavailable (serve the router with connect info)")]
    MissingConnectInfo,
    #[error("header {0} not present")]
    MissingHeader(String),
    #[error("header {0} does not contain a valid ip address")]
    InvalidHeader(String),
    #[error("no valid client address found in header {0}")]
    NoValidAddress(String),
    #[error("trusted proxy count must be greater than zero")]
    InvalidTrustedCount,
}

/// Strategy for deriving the client IP of a request.
///
/// Implementations are shared across request tasks. Any
/// `Fn(&Request) -> Result<IpAddr, ClientIpError>` closure is a strategy.
pub trait ClientIpStrategy: Send + Sync {
    fn client_ip(&self, req: &Request) -> Result<IpAddr, ClientIpError>;
}

impl<F> ClientIpStrategy for F
where
    F: Fn(&Request) -> Result<IpAddr, ClientIpError> + Send + Sync,
{
    fn client_ip(&self, req: &Request) -> Result<IpAddr, ClientIpError> {
        self(req)
    }
}

/// Peer address of the TCP connection.
///
/// Requires the router to be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteAddr;

impl ClientIpStrategy for RemoteAddr {
    fn client_ip(&self, req: &Request) -> Result<IpAddr, ClientIpError> {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(ClientIpError::MissingConnectInfo)
    }
}

/// Single-address header set by a trusted proxy, e.g. `X-Real-IP` or
/// `CF-Connecting-IP`. When repeated, the last value wins.
#[derive(Debug, Clone)]
pub struct SingleIpHeader {
    header: HeaderName,
}

impl SingleIpHeader {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl ClientIpStrategy for SingleIpHeader {
    fn client_ip(&self, req: &Request) -> Result<IpAddr, ClientIpError> {
        let value = req
            .headers()
            .get_all(&self.header)
            .iter()
            .last()
            .ok_or_else(|| ClientIpError::MissingHeader(self.header.to_string()))?;

        value
            .to_str()
            .ok()
            .and_then(parse_ip)
            .ok_or_else(|| ClientIpError::InvalidHeader(self.header.to_string()))
    }
}

/// Leftmost non-private address of a forwarded-for list.
///
/// Closest to the originating client but trivially spoofable; use only when
/// every proxy in front of the service is trusted to sanitize the header.
#[derive(Debug, Clone)]
pub struct LeftmostNonPrivate {
    header: HeaderName,
}

impl LeftmostNonPrivate {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for LeftmostNonPrivate {
    fn default() -> Self {
        Self::new(HeaderName::from_static(X_FORWARDED_FOR))
    }
}

impl ClientIpStrategy for LeftmostNonPrivate {
    fn client_ip(&self, req: &Request) -> Result<IpAddr, ClientIpError> {
        forwarded_addrs(req, &self.header)
            .into_iter()
            .flatten()
            .find(|ip| !is_private_or_reserved(ip))
            .ok_or_else(|| ClientIpError::NoValidAddress(self.header.to_string()))
    }
}

/// Rightmost non-private address of a forwarded-for list.
#[derive(Debug, Clone)]
pub struct RightmostNonPrivate {
    header: HeaderName,
}

impl RightmostNonPrivate {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for RightmostNonPrivate {
    fn default() -> Self {
        Self::new(HeaderName::from_static(X_FORWARDED_FOR))
    }
}

impl ClientIpStrategy for RightmostNonPrivate {
    fn client_ip(&self, req: &Request) -> Result<IpAddr, ClientIpError> {
        forwarded_addrs(req, &self.header)
            .into_iter()
            .rev()
            .flatten()
            .find(|ip| !is_private_or_reserved(ip))
            .ok_or_else(|| ClientIpError::NoValidAddress(self.header.to_string()))
    }
}

/// Address appended by the outermost of `trusted_count` known proxies.
///
/// Each trusted proxy appends the address it received the connection from,
/// so the client is `trusted_count` entries from the right.
#[derive(Debug, Clone)]
pub struct RightmostTrustedCount {
    header: HeaderName,
    trusted_count: usize,
}

impl RightmostTrustedCount {
    pub fn new(header: HeaderName, trusted_count: usize) -> Result<Self, ClientIpError> {
        if trusted_count == 0 {
            return Err(ClientIpError::InvalidTrustedCount);
        }
        Ok(Self {
            header,
            trusted_count,
        })
    }
}

impl ClientIpStrategy for RightmostTrustedCount {
    fn client_ip(&self, req: &Request) -> Result<IpAddr, ClientIpError> {
        let addrs = forwarded_addrs(req, &self.header);
        if addrs.len() < self.trusted_count {
            return Err(ClientIpError::NoValidAddress(self.header.to_string()));
        }

        addrs[addrs.len() - self.trusted_count]
            .ok_or_else(|| ClientIpError::NoValidAddress(self.header.to_string()))
    }
}

/// All entries of a comma-separated address header, across repeated header
/// lines, in order. Unparsable entries are kept as None so positions hold.
fn forwarded_addrs(req: &Request, header: &HeaderName) -> Vec<Option<IpAddr>> {
    let is_forwarded = *header == FORWARDED;
    req.headers()
        .get_all(header)
        .iter()
        .flat_map(|value| {
            value
                .to_str()
                .unwrap_or_default()
                .split(',')
                .map(|item| {
                    if is_forwarded {
                        parse_forwarded_for(item)
                    } else {
                        parse_ip(item)
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Parse the `for=` parameter of one RFC 7239 `Forwarded` element.
fn parse_forwarded_for(element: &str) -> Option<IpAddr> {
    element.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("for") {
            return None;
        }
        parse_ip(value.trim().trim_matches('"'))
    })
}

/// Parse an address that may carry a port or IPv6 brackets.
fn parse_ip(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    if let Ok(ip) = value.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Some(addr.ip());
    }
    value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .and_then(|v| v.parse::<IpAddr>().ok())
}

/// Private, loopback, link-local and other non-routable ranges.
pub fn is_private_or_reserved(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                // 100.64.0.0/10 shared address space
                || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_or_reserved(&IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (first & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (first & 0xffc0) == 0xfe80
        }
    }
}
