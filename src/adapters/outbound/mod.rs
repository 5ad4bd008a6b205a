mod maxmind_country_resolver;
mod static_country_resolver;

pub use maxmind_country_resolver::MaxMindCountryResolver;
pub use static_country_resolver::StaticCountryResolver;
