//! Domain Layer
//!
//! Country policy model and decision logic, independent of HTTP and of the
//! geolocation database.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
