//! geofilter Library
//!
//! Country-based allow/deny middleware for axum, backed by a MaxMind GeoIP
//! database. The domain layer holds the policy model and decision logic;
//! adapters connect it to HTTP requests and to the geolocation database.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;

// Re-export commonly used types
pub use adapters::inbound::{
    filter_ip, with_geo_filter, BlockHandler, ClientIpError, ClientIpStrategy,
    DefaultBlockResponse, IpFilter, IpFilterOptions, PathPrefixFilter, RequestFilter,
};
pub use adapters::outbound::{MaxMindCountryResolver, StaticCountryResolver};
pub use application::GeoPolicyService;
pub use config::{load_config, Config, ConfigError};
pub use domain::entities::{Decision, Policy};
pub use domain::ports::{CountryResolver, LookupError};
pub use domain::services::PolicyEngine;
pub use domain::value_objects::CountryCodeSet;
