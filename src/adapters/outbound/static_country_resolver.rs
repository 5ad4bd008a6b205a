//! Static Country Resolver
//!
//! In-memory CountryResolver over a fixed address table. Useful for tests
//! and for pinning a handful of known addresses without a database.

use crate::domain::ports::{CountryResolver, LookupError};
use std::collections::HashMap;
use std::net::IpAddr;

/// Fixed IP → country table.
#[derive(Debug, Clone, Default)]
pub struct StaticCountryResolver {
    entries: HashMap<IpAddr, String>,
}

impl StaticCountryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an address to a country code.
    pub fn with(mut self, ip: IpAddr, country: &str) -> Self {
        self.entries.insert(ip, country.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CountryResolver for StaticCountryResolver {
    fn resolve(&self, ip: IpAddr) -> Result<Option<String>, LookupError> {
        Ok(self.entries.get(&ip).cloned())
    }
}
