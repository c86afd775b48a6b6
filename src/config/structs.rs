use serde::{Deserialize, Serialize};

/// 查询源配置
///
/// 两个字段二选一：maxminddb_path 优先。
/// 配置了 maxminddb_path 但文件无法打开属于致命配置错误，
/// 启动时报错，不做静默降级。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LookupConfig {
    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb / GeoIP2-City.mmdb)
    #[serde(default)]
    pub maxminddb_path: Option<String>,

    /// 外部 GeoIP API URL，使用 {ip} 作为占位符
    /// 例如: http://ip-api.com/json/{ip}?fields=status,country,countryCode,continentCode,regionName,city,zip,lat,lon
    #[serde(default)]
    pub api_url: Option<String>,
}

/// 客户端地址解析配置
///
/// 优先级：address_param > address_header > 连接对端地址。
/// 配置了某一来源但请求中缺失时，地址解析为空串，
/// 由查询源判定为未命中，不向下一优先级回退。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResolverConfig {
    /// 请求参数名（GET 查询串），优先级最高
    #[serde(default)]
    pub address_param: Option<String>,

    /// 请求头名称（如 "x-real-ip"），优先级次之
    #[serde(default)]
    pub address_header: Option<String>,
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - lookup: GeoIP 查询源
/// - resolver: 客户端地址解析策略
/// - emit_legacy_headers: 是否额外写入 geo-location / geo-country
/// - path_prefix: 仅注解匹配该前缀的请求路径，未配置时全部注解
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoStampConfig {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default = "default_emit_legacy_headers")]
    pub emit_legacy_headers: bool,
    #[serde(default)]
    pub path_prefix: Option<String>,
}

fn default_emit_legacy_headers() -> bool {
    true
}

impl Default for GeoStampConfig {
    fn default() -> Self {
        Self {
            lookup: LookupConfig::default(),
            resolver: ResolverConfig::default(),
            emit_legacy_headers: default_emit_legacy_headers(),
            path_prefix: None,
        }
    }
}

impl GeoStampConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > geostamp.toml > 默认值
    /// ENV 前缀：GS，分隔符：__
    /// 示例：GS__LOOKUP__MAXMINDDB_PATH=/var/lib/GeoLite2-City.mmdb
    pub fn load() -> Self {
        Self::load_from("geostamp.toml")
    }

    /// 从指定 TOML 文件和环境变量加载配置
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 GS，分隔符 __
            .add_source(
                Environment::with_prefix("GS")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<GeoStampConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeoStampConfig::default();
        assert!(config.lookup.maxminddb_path.is_none());
        assert!(config.lookup.api_url.is_none());
        assert!(config.resolver.address_param.is_none());
        assert!(config.resolver.address_header.is_none());
        assert!(config.emit_legacy_headers);
        assert!(config.path_prefix.is_none());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            emit_legacy_headers = false
            path_prefix = "/api"

            [lookup]
            maxminddb_path = "/var/lib/GeoLite2-City.mmdb"

            [resolver]
            address_param = "client_ip"
        "#;

        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .expect("config should build");
        let config: GeoStampConfig = settings.try_deserialize().expect("config should parse");

        assert_eq!(
            config.lookup.maxminddb_path.as_deref(),
            Some("/var/lib/GeoLite2-City.mmdb")
        );
        assert!(config.lookup.api_url.is_none());
        assert_eq!(config.resolver.address_param.as_deref(), Some("client_ip"));
        assert!(!config.emit_legacy_headers);
        assert_eq!(config.path_prefix.as_deref(), Some("/api"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            [resolver]
            address_header = "x-real-ip"
        "#;

        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .expect("config should build");
        let config: GeoStampConfig = settings.try_deserialize().expect("config should parse");

        assert_eq!(config.resolver.address_header.as_deref(), Some("x-real-ip"));
        // 未出现的键保持默认值
        assert!(config.emit_legacy_headers);
        assert!(config.lookup.maxminddb_path.is_none());
    }
}
