//! MaxMind Country Resolver
//!
//! Implements CountryResolver using a MaxMind GeoLite2 / GeoIP2 database.

use crate::domain::ports::{CountryResolver, LookupError};
use maxminddb::{MaxMindDBError, Reader};
use serde::Deserialize;
use std::net::IpAddr;
use std::sync::Arc;

/// MaxMind country resolver.
///
/// Intended for GeoLite2-Country or GeoIP2-Country databases; any MMDB with a
/// `country.iso_code` field works. The reader is read-only and `Sync`, so one
/// handle is shared by every request task.
pub struct MaxMindCountryResolver {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindCountryResolver {
    /// Load a GeoIP database from a file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self::from_reader(Arc::new(reader)))
    }

    /// Load a GeoIP database already read into memory.
    pub fn from_bytes(bytes: Vec<u8>) -> anyhow::Result<Self> {
        let reader = Reader::from_source(bytes)?;
        Ok(Self::from_reader(Arc::new(reader)))
    }

    /// Wrap a reader whose lifecycle is owned by the caller.
    pub fn from_reader(reader: Arc<Reader<Vec<u8>>>) -> Self {
        Self { reader }
    }

    /// Database type from the MMDB metadata, e.g. `GeoLite2-Country`.
    pub fn database_type(&self) -> &str {
        &self.reader.metadata.database_type
    }

    /// Database build time as seconds since the Unix epoch.
    pub fn build_epoch(&self) -> u64 {
        self.reader.metadata.build_epoch
    }
}

impl CountryResolver for MaxMindCountryResolver {
    fn resolve(&self, ip: IpAddr) -> Result<Option<String>, LookupError> {
        #[derive(Debug, Deserialize)]
        struct Country {
            iso_code: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct CountryResp {
            country: Option<Country>,
        }

        match self.reader.lookup::<CountryResp>(ip) {
            Ok(resp) => Ok(resp
                .country
                .and_then(|c| c.iso_code)
                .filter(|code| !code.is_empty())),
            Err(e) => classify_error(e),
        }
    }
}

/// Separate "not in database" from genuine read failures.
fn classify_error(err: MaxMindDBError) -> Result<Option<String>, LookupError> {
    match err {
        MaxMindDBError::AddressNotFoundError(_) => Ok(None),
        MaxMindDBError::IoError(e) | MaxMindDBError::MapError(e) => Err(LookupError::Io(e)),
        MaxMindDBError::DecodingError(e) => Err(LookupError::Decoding(e)),
        MaxMindDBError::InvalidDatabaseError(e) => Err(LookupError::InvalidDatabase(e)),
        other => Err(LookupError::InvalidDatabase(other.to_string())),
    }
}
