//! Geo Policy Service - Main application use case
//!
//! Resolves a client address to its country and applies the configured
//! policy. This is the transport-independent core used by the HTTP
//! middleware.

use crate::domain::entities::{Decision, Policy};
use crate::domain::ports::{CountryResolver, LookupError};
use crate::domain::services::PolicyEngine;
use std::net::IpAddr;
use std::sync::Arc;

/// Geo policy service.
///
/// Holds the immutable policy and a shared resolver handle; safe to call
/// from any number of request tasks at once.
pub struct GeoPolicyService {
    resolver: Arc<dyn CountryResolver>,
    policy: Policy,
}

impl GeoPolicyService {
    /// Create a new geo policy service.
    pub fn new(resolver: Arc<dyn CountryResolver>, policy: Policy) -> Self {
        Self { resolver, policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Decide whether a client address may pass.
    ///
    /// Fails only when the resolver fails; an address with no known country
    /// produces a decision with `country == None`.
    pub fn check(&self, ip: IpAddr) -> Result<Decision, LookupError> {
        let country = self.resolver.resolve(ip)?;
        let allowed = PolicyEngine::evaluate(&self.policy, country.as_deref());
        Ok(Decision::new(allowed, country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::StaticCountryResolver;
    use std::net::Ipv4Addr;

    struct BrokenResolver;

    impl CountryResolver for BrokenResolver {
        fn resolve(&self, _ip: IpAddr) -> Result<Option<String>, LookupError> {
            Err(LookupError::Io("disk on fire".to_string()))
        }
    }

    fn resolver() -> Arc<dyn CountryResolver> {
        Arc::new(
            StaticCountryResolver::new()
                .with(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), "US")
                .with(IpAddr::V4(Ipv4Addr::new(1, 2, 4, 8)), "CN")
                .with(IpAddr::V4(Ipv4Addr::new(1, 128, 0, 0)), "AU"),
        )
    }

    fn us() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))
    }

    fn unknown() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))
    }

    #[test]
    fn test_whitelist_without_country_denies() {
        let service = GeoPolicyService::new(resolver(), Policy::whitelist(["FR", "CH", "UK"]));
        let decision = service.check(us()).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.country_code(), "US");
    }

    #[test]
    fn test_blacklist_unlisted_country_allows() {
        let service = GeoPolicyService::new(resolver(), Policy::blacklist(["CH", "US", "UK"]));
        let decision = service.check(IpAddr::V4(Ipv4Addr::new(1, 2, 4, 8))).unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.country_code(), "CN");
    }

    #[test]
    fn test_blacklist_mixed_case_denies() {
        let service = GeoPolicyService::new(resolver(), Policy::blacklist(["ch", "us", "au"]));
        let decision = service.check(IpAddr::V4(Ipv4Addr::new(1, 128, 0, 0))).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.country_code(), "AU");
    }

    #[test]
    fn test_whitelist_unresolvable_denies() {
        let service = GeoPolicyService::new(resolver(), Policy::whitelist(["CH", "US", "UK"]));
        let decision = service.check(unknown()).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.country_code(), "");
    }

    #[test]
    fn test_blacklist_and_unrestricted_unresolvable_allow() {
        let blacklist = GeoPolicyService::new(resolver(), Policy::blacklist(["CH"]));
        let unrestricted = GeoPolicyService::new(resolver(), Policy::Unrestricted);

        assert!(blacklist.check(unknown()).unwrap().allowed);
        assert!(unrestricted.check(unknown()).unwrap().allowed);
    }

    #[test]
    fn test_lookup_failure_propagates() {
        let service = GeoPolicyService::new(Arc::new(BrokenResolver), Policy::Unrestricted);
        assert_eq!(
            service.check(us()),
            Err(LookupError::Io("disk on fire".to_string()))
        );
    }

    #[test]
    fn test_policy_accessor() {
        let policy = Policy::blacklist(["CN"]);
        let service = GeoPolicyService::new(resolver(), policy.clone());
        assert_eq!(service.policy(), &policy);
    }
}
