//! Country Resolver Port
//!
//! Defines the interface for resolving IP addresses to country codes.

use std::net::IpAddr;
use std::sync::Arc;

/// Failure of the underlying geolocation lookup.
///
/// An address that is simply missing from the database is not an error;
/// resolvers report it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("invalid geolocation database: {0}")]
    InvalidDatabase(String),
    #[error("geolocation database i/o error: {0}")]
    Io(String),
    #[error("failed to decode geolocation record: {0}")]
    Decoding(String),
}

/// Resolver for IP address to country code.
///
/// This is an outbound port that abstracts the GeoIP database.
/// Implementations are shared across request tasks and must allow
/// concurrent reads without external locking.
pub trait CountryResolver: Send + Sync {
    /// Resolve an IP address to its ISO 3166-1 alpha-2 country code.
    ///
    /// Returns `Ok(None)` when the database has no country for the address
    /// (private or reserved ranges, unmapped networks).
    fn resolve(&self, ip: IpAddr) -> Result<Option<String>, LookupError>;
}

impl<T: CountryResolver + ?Sized> CountryResolver for Arc<T> {
    fn resolve(&self, ip: IpAddr) -> Result<Option<String>, LookupError> {
        (**self).resolve(ip)
    }
}
