//! Service layer
//!
//! This module provides the lookup capability consumed by the
//! annotation middleware, behind a provider abstraction so hosts
//! and tests can plug in their own sources.

pub mod geoip;

pub use geoip::{GeoIpLookup, GeoIpProvider, GeoRecord};
