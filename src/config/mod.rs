mod structs;

pub use structs::{GeoStampConfig, LookupConfig, ResolverConfig};
