//! GeoIP Provider 抽象层
//!
//! 统一的 GeoIP 查询接口，根据配置选择实现：
//! 1. lookup.maxminddb_path 配置 → MaxMindProvider，打开失败即配置错误
//! 2. 否则 lookup.api_url 配置 → ExternalApiProvider
//! 3. 两者皆无 → 配置错误，拒绝启动

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::external_api::ExternalApiProvider;
use super::maxmind::MaxMindProvider;
use crate::config::LookupConfig;
use crate::errors::{GeoStampError, Result};

/// 一次成功查询返回的地理位置记录
///
/// 记录存在时所有字段都有值：数据源缺失的子字段为空串，
/// 坐标缺失时为 0.0，不使用 None 表示。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoRecord {
    /// ISO 3166-1 alpha-2 国家代码 (e.g., "CN", "US")
    pub country_code: String,
    /// ISO 3166-1 alpha-3 国家代码，数据源不提供时为空
    pub country_code3: String,
    /// 国家名称
    pub country_name: String,
    /// 大洲代码 (e.g., "AS", "NA")
    pub continent_code: String,
    /// 地区/省份名称
    pub region_name: String,
    /// 城市名称
    pub city_name: String,
    /// 邮政编码
    pub postal_code: String,
    /// 纬度
    pub latitude: f64,
    /// 经度
    pub longitude: f64,
}

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoIpLookup: Send + Sync {
    /// 查询地址的地理位置，未命中返回 None
    ///
    /// 空串或无法解析的地址同样视为未命中，不是错误
    async fn lookup(&self, address: &str) -> Option<GeoRecord>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 统一 GeoIP Provider
///
/// 进程启动时构造一次，以 Arc 共享给所有请求，只读使用
pub struct GeoIpProvider {
    inner: Arc<dyn GeoIpLookup>,
}

impl GeoIpProvider {
    /// 根据 LookupConfig 初始化
    ///
    /// 与请求路径不同，这里的失败是致命的：
    /// 配置的数据库打不开或没有配置任何查询源时返回 Err，
    /// 调用方不应继续对外提供服务。
    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        let inner: Arc<dyn GeoIpLookup> = if let Some(ref path) = config.maxminddb_path {
            let provider = MaxMindProvider::new(path).map_err(|e| {
                GeoStampError::lookup_source(format!(
                    "failed to open MaxMind database at {}: {}",
                    path, e
                ))
            })?;
            info!("GeoIP: Using MaxMind database at {}", path);
            Arc::new(provider)
        } else if let Some(ref url) = config.api_url {
            info!("GeoIP: Using external API at {}", url);
            Arc::new(ExternalApiProvider::new(url))
        } else {
            return Err(GeoStampError::configuration(
                "no lookup source configured: set lookup.maxminddb_path or lookup.api_url",
            ));
        };

        info!("GeoIP: Initialized with {} provider", inner.name());
        Ok(Self { inner })
    }

    /// 从任意 GeoIpLookup 实现构造（自定义查询源或测试桩）
    pub fn from_lookup(lookup: Arc<dyn GeoIpLookup>) -> Self {
        Self { inner: lookup }
    }

    /// 查询地址的地理位置
    pub async fn lookup(&self, address: &str) -> Option<GeoRecord> {
        self.inner.lookup(address).await
    }

    /// 获取当前使用的 provider 名称
    pub fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

impl Clone for GeoIpProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for GeoIpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoIpProvider")
            .field("provider", &self.inner.name())
            .finish()
    }
}
