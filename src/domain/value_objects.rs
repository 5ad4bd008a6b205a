//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::Serialize;
use std::collections::BTreeSet;

/// Normalize a single country code: trim and uppercase.
///
/// Returns None for codes that are empty once trimmed.
///
/// # Examples
/// ```
/// use geofilter::domain::value_objects::normalize_country_code;
///
/// assert_eq!(normalize_country_code(" us "), Some("US".to_string()));
/// assert_eq!(normalize_country_code("  "), None);
/// ```
pub fn normalize_country_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase())
}

/// Set of normalized ISO 3166-1 alpha-2 country codes.
///
/// Every member is uppercase, trimmed and non-empty. Case variants of the
/// same code collapse to one member at construction time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountryCodeSet {
    codes: BTreeSet<String>,
}

impl CountryCodeSet {
    /// Build a set from raw configured codes, dropping empty entries.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(codes);
        set
    }

    /// Add more raw codes to the set.
    pub fn extend<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.codes.extend(
            codes
                .into_iter()
                .filter_map(|code| normalize_country_code(code.as_ref())),
        );
    }

    /// Case-insensitive membership test. Empty codes are never members.
    pub fn contains(&self, code: &str) -> bool {
        match normalize_country_code(code) {
            Some(normalized) => self.codes.contains(&normalized),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate over members in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for CountryCodeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl std::fmt::Display for CountryCodeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== normalize_country_code Tests =====

    #[test]
    fn test_normalize_uppercases_and_trims() {
        let tests = vec![("us", "US"), ("US", "US"), (" us ", "US"), ("\tfr\n", "FR")];

        for (input, expected) in tests {
            assert_eq!(
                normalize_country_code(input),
                Some(expected.to_string()),
                "Failed for input: {:?}",
                input
            );
        }
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert_eq!(normalize_country_code(""), None);
        assert_eq!(normalize_country_code("   "), None);
    }

    // ===== CountryCodeSet Tests =====

    #[test]
    fn test_set_collapses_case_variants() {
        let set = CountryCodeSet::new(["us", "US", " us "]);
        assert_eq!(set.len(), 1);
        assert!(set.contains("US"));
    }

    #[test]
    fn test_set_ignores_empty_codes() {
        let set = CountryCodeSet::new(["", "  ", "CH"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["CH"]);
    }

    #[test]
    fn test_set_contains_is_case_insensitive() {
        let set = CountryCodeSet::new(["ch", "us", "au"]);
        assert!(set.contains("AU"));
        assert!(set.contains("au"));
        assert!(set.contains(" Au "));
        assert!(!set.contains("FR"));
    }

    #[test]
    fn test_set_never_contains_empty_code() {
        let set = CountryCodeSet::new(["US"]);
        assert!(!set.contains(""));
        assert!(!set.contains(" "));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = vec![
            vec!["us", " fr", "CH "],
            vec!["", "de", "DE", "De"],
            vec![],
        ];

        for input in inputs {
            let once = CountryCodeSet::new(input.clone());
            let twice = CountryCodeSet::new(once.iter());
            assert_eq!(once, twice, "Failed for input: {:?}", input);
        }
    }

    #[test]
    fn test_set_extend_accumulates() {
        let mut set = CountryCodeSet::new(["FR"]);
        set.extend(["ch", "fr"]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["CH", "FR"]);
    }

    #[test]
    fn test_set_from_iterator() {
        let set: CountryCodeSet = vec!["jp".to_string(), "kr".to_string()]
            .into_iter()
            .collect();
        assert!(set.contains("JP"));
        assert!(set.contains("KR"));
    }

    #[test]
    fn test_set_display() {
        let set = CountryCodeSet::new(["us", "br"]);
        assert_eq!(set.to_string(), "BR,US");
    }

    #[test]
    fn test_empty_set() {
        let set = CountryCodeSet::default();
        assert!(set.is_empty());
        assert_eq!(set.to_string(), "");
    }
}
