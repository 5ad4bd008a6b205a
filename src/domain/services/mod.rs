mod policy_engine;

pub use policy_engine::PolicyEngine;
