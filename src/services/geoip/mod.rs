//! GeoIP 服务模块
//!
//! 提供地址地理位置查询功能，支持：
//! - MaxMind GeoLite2/GeoIP2 本地数据库
//! - 外部 HTTP API 查询源 (ip-api.com)

mod external_api;
mod maxmind;
mod provider;

pub use external_api::ExternalApiProvider;
pub use maxmind::MaxMindProvider;
pub use provider::{GeoIpLookup, GeoIpProvider, GeoRecord};
