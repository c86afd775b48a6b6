pub mod annotate;

pub use annotate::{GEOIP_HEADER_PREFIX, GeoAnnotation, GeoStampMiddleware, should_annotate};
