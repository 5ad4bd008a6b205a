mod geo_policy_service;

pub use geo_policy_service::GeoPolicyService;
