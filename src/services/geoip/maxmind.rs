//! MaxMind GeoLite2/GeoIP2 数据库实现
//!
//! 使用本地 City mmdb 文件进行 IP 地理位置查询

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use tracing::trace;

use super::provider::{GeoIpLookup, GeoRecord};

/// MaxMind GeoIP Provider
pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    /// 从文件路径创建 MaxMind Provider
    pub fn new(path: &str) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

#[async_trait]
impl GeoIpLookup for MaxMindProvider {
    async fn lookup(&self, address: &str) -> Option<GeoRecord> {
        let ip_addr: IpAddr = address.parse().ok()?;

        let result = self.reader.lookup(ip_addr).ok()?;
        let city: maxminddb::geoip2::City = result.decode().ok()??;

        let subdivision = city.subdivisions.first();
        let record = GeoRecord {
            country_code: city.country.iso_code.map(String::from).unwrap_or_default(),
            // GeoLite2/GeoIP2 不提供 alpha-3 代码
            country_code3: String::new(),
            country_name: city
                .country
                .names
                .english
                .map(|s| s.to_string())
                .unwrap_or_default(),
            continent_code: city.continent.code.map(String::from).unwrap_or_default(),
            region_name: subdivision
                .and_then(|s| s.names.english)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            city_name: city
                .city
                .names
                .english
                .map(|s| s.to_string())
                .unwrap_or_default(),
            postal_code: city.postal.code.map(String::from).unwrap_or_default(),
            latitude: city.location.latitude.unwrap_or_default(),
            longitude: city.location.longitude.unwrap_or_default(),
        };

        trace!(
            "MaxMind lookup for {}: country={:?}, city={:?}",
            address, record.country_code, record.city_name
        );

        Some(record)
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}
