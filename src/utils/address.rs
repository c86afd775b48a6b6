//! 客户端地址解析
//!
//! 按优先级确定用于 GeoIP 查询的客户端地址：
//! 1. 配置的请求参数（查询串）
//! 2. 配置的请求头
//! 3. 连接对端地址

use actix_web::dev::ServiceRequest;

use crate::config::ResolverConfig;

/// 从查询串中提取指定参数的值
pub fn param_from_query(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// 从请求头提取地址
pub fn address_from_header(req: &ServiceRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim().to_string())
}

/// 连接对端地址（不含端口）
pub fn peer_address(req: &ServiceRequest) -> Option<String> {
    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// 解析客户端地址（核心逻辑）
///
/// 优先级：address_param > address_header > 对端地址。
/// 配置的来源在请求中缺失时解析为空串，不向下一优先级回退；
/// 这里不做任何语法校验，空串或畸形地址交由查询源判定为未命中。
pub fn resolve_address(config: &ResolverConfig, req: &ServiceRequest) -> String {
    if let Some(ref name) = config.address_param {
        return param_from_query(req.query_string(), name).unwrap_or_default();
    }

    if let Some(ref name) = config.address_header {
        return address_from_header(req, name).unwrap_or_default();
    }

    peer_address(req).unwrap_or_default()
}
