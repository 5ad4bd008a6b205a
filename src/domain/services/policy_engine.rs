//! Policy Engine - Domain service for access decisions
//!
//! Pure decision logic with no external dependencies.

use crate::domain::entities::Policy;

/// Country policy engine.
///
/// Decides whether a resolved country may pass a policy. The country is
/// compared case-insensitively against the policy's normalized set.
pub struct PolicyEngine;

impl PolicyEngine {
    /// Evaluate a country against a policy.
    ///
    /// An unknown or empty country is never a member of any set, so it is
    /// denied by a whitelist and allowed by a blacklist.
    ///
    /// # Examples
    /// ```
    /// use geofilter::domain::entities::Policy;
    /// use geofilter::domain::services::PolicyEngine;
    ///
    /// let policy = Policy::blacklist(["ch", "us", "au"]);
    /// assert!(!PolicyEngine::evaluate(&policy, Some("AU")));
    /// assert!(PolicyEngine::evaluate(&policy, None));
    /// ```
    pub fn evaluate(policy: &Policy, country: Option<&str>) -> bool {
        match policy {
            Policy::Whitelist(set) => country.is_some_and(|code| set.contains(code)),
            Policy::Blacklist(set) => !country.is_some_and(|code| set.contains(code)),
            Policy::Unrestricted => true,
        }
    }
}
