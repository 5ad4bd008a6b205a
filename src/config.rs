use crate::adapters::inbound::{
    IpFilterOptions, LeftmostNonPrivate, PathPrefixFilter, RemoteAddr, RightmostNonPrivate,
    RightmostTrustedCount, SingleIpHeader,
};
use axum::http::HeaderName;
use std::str::FromStr;

const DEFAULT_FORWARDED_HEADER: &str = "x-forwarded-for";

/// Where the middleware takes the client address from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClientIpSource {
    /// TCP peer address
    #[default]
    RemoteAddr,
    /// Single-address header such as X-Real-IP
    Header(HeaderName),
    /// First public address of a forwarded-for list
    LeftmostNonPrivate(HeaderName),
    /// Last public address of a forwarded-for list
    RightmostNonPrivate(HeaderName),
    /// Entry added by the outermost of `count` trusted proxies
    RightmostTrustedCount { header: HeaderName, count: usize },
}

impl FromStr for ClientIpSource {
    type Err = ConfigError;

    /// Parse `remote-addr`, `header:<name>`, `leftmost-non-private[:<header>]`,
    /// `rightmost-non-private[:<header>]` or
    /// `rightmost-trusted-count:<n>[:<header>]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, rest) = match s.split_once(':') {
            Some((kind, rest)) => (kind, Some(rest)),
            None => (s, None),
        };

        match (kind.to_lowercase().as_str(), rest) {
            ("remote-addr", None) => Ok(Self::RemoteAddr),
            ("header", Some(name)) => Ok(Self::Header(parse_header(name)?)),
            ("leftmost-non-private", name) => Ok(Self::LeftmostNonPrivate(header_or_default(name)?)),
            ("rightmost-non-private", name) => {
                Ok(Self::RightmostNonPrivate(header_or_default(name)?))
            }
            ("rightmost-trusted-count", Some(rest)) => {
                let (count, header) = match rest.split_once(':') {
                    Some((count, header)) => (count, Some(header)),
                    None => (rest, None),
                };
                let count: usize = count
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidTrustedCount(count.to_string()))?;
                if count == 0 {
                    return Err(ConfigError::InvalidTrustedCount(count.to_string()));
                }
                Ok(Self::RightmostTrustedCount {
                    header: header_or_default(header)?,
                    count,
                })
            }
            _ => Err(ConfigError::InvalidClientIpStrategy(s.to_string())),
        }
    }
}

fn parse_header(name: &str) -> Result<HeaderName, ConfigError> {
    HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|_| ConfigError::InvalidHeaderName(name.to_string()))
}

fn header_or_default(name: Option<&str>) -> Result<HeaderName, ConfigError> {
    parse_header(name.unwrap_or(DEFAULT_FORWARDED_HEADER))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub geoip_path: String,
    pub whitelisted_countries: Vec<String>,
    pub blacklisted_countries: Vec<String>,
    pub client_ip: ClientIpSource,
    pub bypass_paths: Vec<String>,
    pub log_events: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            geoip_path: "GeoLite2-Country.mmdb".to_string(),
            whitelisted_countries: Vec::new(),
            blacklisted_countries: Vec::new(),
            client_ip: ClientIpSource::RemoteAddr,
            bypass_paths: Vec::new(),
            log_events: true,
            debug: false,
        }
    }
}

impl Config {
    /// Middleware options described by this configuration.
    pub fn filter_options(&self) -> Result<IpFilterOptions, ConfigError> {
        let mut options = IpFilterOptions::new().log_events(self.log_events);

        if !self.whitelisted_countries.is_empty() {
            options = options.whitelisted_countries(&self.whitelisted_countries);
        } else if !self.blacklisted_countries.is_empty() {
            options = options.blacklisted_countries(&self.blacklisted_countries);
        }

        for path in &self.bypass_paths {
            options = options.filter(PathPrefixFilter::new(path.clone()));
        }

        let options = match &self.client_ip {
            ClientIpSource::RemoteAddr => options.client_ip_strategy(RemoteAddr),
            ClientIpSource::Header(name) => {
                options.client_ip_strategy(SingleIpHeader::new(name.clone()))
            }
            ClientIpSource::LeftmostNonPrivate(name) => {
                options.client_ip_strategy(LeftmostNonPrivate::new(name.clone()))
            }
            ClientIpSource::RightmostNonPrivate(name) => {
                options.client_ip_strategy(RightmostNonPrivate::new(name.clone()))
            }
            ClientIpSource::RightmostTrustedCount { header, count } => {
                let strategy = RightmostTrustedCount::new(header.clone(), *count)
                    .map_err(|_| ConfigError::InvalidTrustedCount(count.to_string()))?;
                options.client_ip_strategy(strategy)
            }
        };

        Ok(options)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("GEOFILTER_WHITELIST and GEOFILTER_BLACKLIST are mutually exclusive")]
    ConflictingCountryLists,
    #[error("unknown client ip strategy: {0}")]
    InvalidClientIpStrategy(String),
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),
    #[error("invalid trusted proxy count: {0}")]
    InvalidTrustedCount(String),
    #[error("invalid boolean for {key}: {value}")]
    InvalidFlag { key: String, value: String },
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_flag(key: &str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value,
        }),
    }
}

/// Load configuration from the process environment.
#[cfg_attr(coverage_nightly, coverage(off))]
pub fn load_config() -> anyhow::Result<Config> {
    Ok(load_config_from(|key| std::env::var(key).ok())?)
}

/// Load configuration from any variable source.
pub fn load_config_from<F>(var: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let listen_addr = var("GEOFILTER_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

    let geoip_path = var("GEOFILTER_GEOIP_PATH").unwrap_or(defaults.geoip_path);

    let whitelisted_countries = split_list(var("GEOFILTER_WHITELIST"));
    let blacklisted_countries = split_list(var("GEOFILTER_BLACKLIST"));
    if !whitelisted_countries.is_empty() && !blacklisted_countries.is_empty() {
        return Err(ConfigError::ConflictingCountryLists);
    }

    let client_ip = match var("GEOFILTER_CLIENT_IP_STRATEGY") {
        Some(v) => v.parse()?,
        None => ClientIpSource::default(),
    };

    let bypass_paths = split_list(var("GEOFILTER_BYPASS_PATHS"));

    let log_events = parse_flag("GEOFILTER_LOG_EVENTS", var("GEOFILTER_LOG_EVENTS"), true)?;

    let debug = var("DEBUG").is_some();

    Ok(Config {
        listen_addr,
        geoip_path,
        whitelisted_countries,
        blacklisted_countries,
        client_ip,
        bypass_paths,
        log_events,
        debug,
    })
}
