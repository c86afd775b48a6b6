//! Geostamp - GeoIP request annotation middleware for actix-web
//!
//! For each inbound request this library resolves a client address,
//! queries a geo-IP source, and injects the resulting location as
//! synthetic `x_geoip_*` request headers (plus a typed request
//! extension) for downstream handlers. Any client-supplied headers in
//! the reserved namespace are stripped unconditionally before the
//! trusted values are written.
//!
//! # Architecture
//! - `config`: Configuration management
//! - `services`: GeoIP lookup providers (MaxMind database, external API)
//! - `middleware`: The actix-web annotation middleware
//! - `utils`: Client address resolution
//!
//! # Usage
//! ```no_run
//! use std::sync::Arc;
//!
//! use actix_web::{App, HttpServer};
//! use geostamp::{GeoIpProvider, GeoStampConfig, GeoStampMiddleware};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = GeoStampConfig::load();
//!     let provider = match GeoIpProvider::from_config(&config.lookup) {
//!         Ok(provider) => Arc::new(provider),
//!         Err(e) => {
//!             eprintln!("{}", e);
//!             std::process::exit(1);
//!         }
//!     };
//!
//!     HttpServer::new(move || {
//!         App::new().wrap(GeoStampMiddleware::new(provider.clone(), &config))
//!     })
//!     .bind(("127.0.0.1", 8080))?
//!     .run()
//!     .await
//! }
//! ```

pub mod config;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod utils;

pub use config::GeoStampConfig;
pub use errors::{GeoStampError, Result};
pub use middleware::{GeoAnnotation, GeoStampMiddleware, should_annotate};
pub use services::{GeoIpLookup, GeoIpProvider, GeoRecord};
