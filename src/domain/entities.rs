//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the geofilter domain.
//! They have no external dependencies and contain only business logic.

use crate::domain::value_objects::CountryCodeSet;
use serde::Serialize;

/// Country access policy.
///
/// Built once when the filter is created and never mutated afterwards,
/// so it can be shared across every request without locking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "countries", rename_all = "lowercase")]
pub enum Policy {
    /// Deny by default, allow only listed countries
    Whitelist(CountryCodeSet),
    /// Allow by default, deny only listed countries
    Blacklist(CountryCodeSet),
    /// No list configured, allow everything
    #[default]
    Unrestricted,
}

impl Policy {
    /// Whitelist policy from raw codes.
    ///
    /// A list that normalizes to nothing restricts nothing.
    pub fn whitelist<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = CountryCodeSet::new(codes);
        if set.is_empty() {
            return Self::Unrestricted;
        }
        Self::Whitelist(set)
    }

    /// Blacklist policy from raw codes.
    pub fn blacklist<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = CountryCodeSet::new(codes);
        if set.is_empty() {
            return Self::Unrestricted;
        }
        Self::Blacklist(set)
    }

    /// Add whitelisted codes.
    ///
    /// Accumulates onto an existing whitelist; replaces any other policy.
    pub fn add_whitelisted<I, S>(self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self {
            Self::Whitelist(mut set) => {
                set.extend(codes);
                Self::Whitelist(set)
            }
            _ => Self::whitelist(codes),
        }
    }

    /// Add blacklisted codes.
    ///
    /// Accumulates onto an existing blacklist; replaces any other policy.
    pub fn add_blacklisted<I, S>(self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match self {
            Self::Blacklist(mut set) => {
                set.extend(codes);
                Self::Blacklist(set)
            }
            _ => Self::blacklist(codes),
        }
    }

    /// Configured countries, if any.
    pub fn countries(&self) -> Option<&CountryCodeSet> {
        match self {
            Self::Whitelist(set) | Self::Blacklist(set) => Some(set),
            Self::Unrestricted => None,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Whitelist(_) => "whitelist",
            Self::Blacklist(_) => "blacklist",
            Self::Unrestricted => "unrestricted",
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.countries() {
            Some(set) => write!(f, "{}({})", self.mode(), set),
            None => write!(f, "{}", self.mode()),
        }
    }
}

/// Outcome of checking one client address against the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Resolved country (ISO 3166-1 alpha-2), None when the address is unknown
    pub country: Option<String>,
}

impl Decision {
    pub fn new(allowed: bool, country: Option<String>) -> Self {
        Self { allowed, country }
    }

    /// Resolved country code, or an empty string when unknown.
    pub fn country_code(&self) -> &str {
        self.country.as_deref().unwrap_or("")
    }
}
