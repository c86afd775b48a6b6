//! GeoIP annotation middleware
//!
//! 在请求进入业务 handler 之前解析客户端地址并查询地理位置，
//! 将结果以 x_geoip_* 合成请求头写入请求，同时把类型化视图
//! 注入 request extensions。写入之前无条件清除保留命名空间下
//! 所有既有请求头，防止客户端伪造的字段到达下游。

use std::rc::Rc;
use std::sync::Arc;

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderMap, HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, trace};

use crate::config::{GeoStampConfig, ResolverConfig};
use crate::services::{GeoIpProvider, GeoRecord};
use crate::utils::address::resolve_address;

/// 保留请求头前缀，写入前统一清除
pub const GEOIP_HEADER_PREFIX: &str = "x_geoip_";

const H_MATCHED: &str = "x_geoip_matched";
const H_COUNTRY_CODE: &str = "x_geoip_country_code";
const H_COUNTRY_CODE3: &str = "x_geoip_country_code3";
const H_COUNTRY: &str = "x_geoip_country";
const H_CONTINENT: &str = "x_geoip_continent";
const H_REGION: &str = "x_geoip_region";
const H_CITY: &str = "x_geoip_city";
const H_POSTAL_CODE: &str = "x_geoip_postal_code";
const H_MATCHING_ADDRESS: &str = "x_geoip_matching_address";
const H_GEO_LOCATION: &str = "geo-location";
const H_GEO_COUNTRY: &str = "geo-country";

/// 注入到 request extensions 的类型化视图，
/// handler 可通过 `req.extensions().get::<GeoAnnotation>()` 获取
#[derive(Clone, Debug)]
pub struct GeoAnnotation {
    /// 实际参与查询的客户端地址
    pub address: String,
    /// 命中时的查询结果
    pub record: Option<GeoRecord>,
}

impl GeoAnnotation {
    pub fn matched(&self) -> bool {
        self.record.is_some()
    }
}

/// 路径前缀过滤
///
/// 未配置前缀时对所有请求生效；配置后仅注解匹配前缀的请求，
/// 不匹配的请求完全不做任何改动（包括清除保留头）
pub fn should_annotate(path_prefix: Option<&str>, path: &str) -> bool {
    match path_prefix {
        Some(prefix) => path.starts_with(prefix),
        None => true,
    }
}

/// 清除保留命名空间下所有既有请求头
///
/// 无条件执行：无论查询结果如何，客户端自带的 x_geoip_* 与
/// geo-location / geo-country 头都不得存活到下游
fn strip_reserved_headers(headers: &mut HeaderMap) {
    let reserved: Vec<HeaderName> = headers
        .keys()
        .filter(|name| {
            let n = name.as_str();
            n.starts_with(GEOIP_HEADER_PREFIX) || n == H_GEO_LOCATION || n == H_GEO_COUNTRY
        })
        .cloned()
        .collect();

    for name in reserved {
        headers.remove(&name);
    }
}

/// 头部值含非法字符时降级为空串，保证命中时键集合完整
fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// 命中：写入完整的 x_geoip_* 集合与可选的 legacy 头
fn apply_record(headers: &mut HeaderMap, record: &GeoRecord, address: &str, emit_legacy: bool) {
    headers.insert(
        HeaderName::from_static(H_MATCHED),
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static(H_COUNTRY_CODE),
        header_value(&record.country_code),
    );
    headers.insert(
        HeaderName::from_static(H_COUNTRY_CODE3),
        header_value(&record.country_code3),
    );
    headers.insert(
        HeaderName::from_static(H_COUNTRY),
        header_value(&record.country_name),
    );
    headers.insert(
        HeaderName::from_static(H_CONTINENT),
        header_value(&record.continent_code),
    );
    headers.insert(
        HeaderName::from_static(H_REGION),
        header_value(&record.region_name),
    );
    headers.insert(
        HeaderName::from_static(H_CITY),
        header_value(&record.city_name),
    );
    headers.insert(
        HeaderName::from_static(H_POSTAL_CODE),
        header_value(&record.postal_code),
    );
    // 让下游可以确认结果对应的是哪个地址
    headers.insert(
        HeaderName::from_static(H_MATCHING_ADDRESS),
        header_value(address),
    );

    if emit_legacy {
        let location = format!("{};{}", record.latitude, record.longitude);
        headers.insert(
            HeaderName::from_static(H_GEO_LOCATION),
            header_value(&location),
        );
        headers.insert(
            HeaderName::from_static(H_GEO_COUNTRY),
            header_value(&record.country_code),
        );
    }
}

struct AnnotateContext {
    provider: Arc<GeoIpProvider>,
    resolver: ResolverConfig,
    emit_legacy_headers: bool,
    path_prefix: Option<String>,
}

/// GeoIP 注解中间件工厂
#[derive(Clone)]
pub struct GeoStampMiddleware {
    provider: Arc<GeoIpProvider>,
    resolver: ResolverConfig,
    emit_legacy_headers: bool,
    path_prefix: Option<String>,
}

impl GeoStampMiddleware {
    /// provider 在进程启动时构造一次，以 Arc 在 worker 间共享
    pub fn new(provider: Arc<GeoIpProvider>, config: &GeoStampConfig) -> Self {
        Self {
            provider,
            resolver: config.resolver.clone(),
            emit_legacy_headers: config.emit_legacy_headers,
            path_prefix: config.path_prefix.clone(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for GeoStampMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = GeoStampService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(GeoStampService {
            service: Rc::new(service),
            ctx: Rc::new(AnnotateContext {
                provider: Arc::clone(&self.provider),
                resolver: self.resolver.clone(),
                emit_legacy_headers: self.emit_legacy_headers,
                path_prefix: self.path_prefix.clone(),
            }),
        }))
    }
}

pub struct GeoStampService<S> {
    service: Rc<S>,
    ctx: Rc<AnnotateContext>,
}

impl<S, B> Service<ServiceRequest> for GeoStampService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let srv = Rc::clone(&self.service);
        let ctx = Rc::clone(&self.ctx);

        Box::pin(async move {
            if !should_annotate(ctx.path_prefix.as_deref(), req.path()) {
                return srv.call(req).await;
            }

            let address = resolve_address(&ctx.resolver, &req);

            // 先清后写：未命中分支也不能让伪造的保留头存活
            strip_reserved_headers(req.headers_mut());

            match ctx.provider.lookup(&address).await {
                Some(record) => {
                    debug!(
                        "GeoIP matched {} -> {} ({})",
                        address, record.country_code, record.city_name
                    );
                    apply_record(
                        req.headers_mut(),
                        &record,
                        &address,
                        ctx.emit_legacy_headers,
                    );
                    req.extensions_mut().insert(GeoAnnotation {
                        address,
                        record: Some(record),
                    });
                }
                None => {
                    trace!("GeoIP miss for {:?}", address);
                    req.headers_mut().insert(
                        HeaderName::from_static(H_MATCHED),
                        HeaderValue::from_static("0"),
                    );
                    req.extensions_mut().insert(GeoAnnotation {
                        address,
                        record: None,
                    });
                }
            }

            srv.call(req).await
        })
    }
}
