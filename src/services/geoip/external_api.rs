//! 外部 GeoIP API 实现
//!
//! 使用外部 HTTP API 进行 IP 地理位置查询（如 ip-api.com）
//! 内置 LRU 缓存 + Singleflight 语义，避免重复查询

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoIpLookup, GeoRecord};

/// GeoIP 缓存 TTL（15 分钟）
const GEOIP_CACHE_TTL_SECS: u64 = 15 * 60;
/// GeoIP 缓存最大容量
const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;
/// HTTP 请求超时时间
const HTTP_TIMEOUT_SECS: u64 = 2;

/// 全局 HTTP Agent（ureq 的 Agent 是 Send + Sync）
static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

/// 外部 API GeoIP Provider
///
/// 内置 Moka 缓存：
/// - LRU 淘汰策略，最大 10000 条
/// - TTL 15 分钟
/// - Singleflight：同一地址的并发请求只发一次 HTTP
pub struct ExternalApiProvider {
    api_url_template: String,
    /// 地址 → GeoRecord 缓存（Option 用于负缓存）
    cache: Cache<String, Option<GeoRecord>>,
}

impl ExternalApiProvider {
    /// 创建外部 API Provider
    ///
    /// `api_url_template` 使用 `{ip}` 作为占位符
    /// 例如: `http://ip-api.com/json/{ip}?fields=status,country,countryCode,continentCode,regionName,city,zip,lat,lon`
    pub fn new(api_url_template: &str) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(GEOIP_CACHE_TTL_SECS))
            .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
            .build();

        Self {
            api_url_template: api_url_template.to_string(),
            cache,
        }
    }

    /// 从外部 API 获取 GeoIP 信息（同步，在 spawn_blocking 中调用）
    fn fetch_from_api_sync(url: String) -> Option<GeoRecord> {
        let agent = get_agent();

        let resp = match agent.get(&url).call() {
            Ok(r) => r,
            Err(e) => {
                warn!("GeoIP API request to \"{}\" failed: {}", url, e);
                return None;
            }
        };

        let json: serde_json::Value = match resp.into_body().read_json() {
            Ok(j) => j,
            Err(e) => {
                warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
                return None;
            }
        };

        // ip-api.com 成功时返回: {"country":"United States","countryCode":"US",...}
        // 失败时返回: {"status": "fail", ...}
        // 也支持其他 API 的常见字段名
        if json["status"].as_str() == Some("fail") {
            trace!("External API returned fail status");
            return None;
        }

        let record = GeoRecord {
            country_code: json["countryCode"]
                .as_str()
                .or_else(|| json["country_code"].as_str())
                .unwrap_or_default()
                .to_string(),
            country_code3: json["countryCode3"]
                .as_str()
                .or_else(|| json["country_code3"].as_str())
                .unwrap_or_default()
                .to_string(),
            country_name: json["country"]
                .as_str()
                .or_else(|| json["country_name"].as_str())
                .unwrap_or_default()
                .to_string(),
            continent_code: json["continentCode"]
                .as_str()
                .or_else(|| json["continent_code"].as_str())
                .unwrap_or_default()
                .to_string(),
            region_name: json["regionName"]
                .as_str()
                .or_else(|| json["region_name"].as_str())
                .unwrap_or_default()
                .to_string(),
            city_name: json["city"].as_str().unwrap_or_default().to_string(),
            postal_code: json["zip"]
                .as_str()
                .or_else(|| json["postal_code"].as_str())
                .unwrap_or_default()
                .to_string(),
            latitude: json["lat"].as_f64().unwrap_or_default(),
            longitude: json["lon"].as_f64().unwrap_or_default(),
        };

        trace!(
            "External API lookup: country={:?}, city={:?}",
            record.country_code, record.city_name
        );

        Some(record)
    }

    /// 从外部 API 获取 GeoIP 信息（异步包装）
    async fn fetch_from_api(&self, address: &str) -> Option<GeoRecord> {
        let url = self.api_url_template.replace("{ip}", address);

        // 使用 spawn_blocking 在线程池中执行同步 HTTP 请求
        tokio::task::spawn_blocking(move || Self::fetch_from_api_sync(url))
            .await
            .unwrap_or_else(|e| {
                warn!("GeoIP spawn_blocking failed: {}", e);
                None
            })
    }
}

#[async_trait]
impl GeoIpLookup for ExternalApiProvider {
    /// 查询地址的地理位置（带缓存 + Singleflight）
    ///
    /// - 缓存命中：直接返回
    /// - 缓存未命中：发起 HTTP 请求并缓存结果
    /// - 并发请求同一地址：只有一个发起请求，其他等待结果
    async fn lookup(&self, address: &str) -> Option<GeoRecord> {
        let key = address.to_string();

        // get_with 自带 singleflight 语义：
        // 同一 key 的并发调用只会执行一次闭包，其他等待结果
        self.cache
            .get_with(key, async {
                trace!("GeoIP cache miss for {}, fetching from API", address);
                self.fetch_from_api(address).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
