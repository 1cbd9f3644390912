//! MaxMind GeoLite2 数据库实现
//!
//! 使用本地 GeoLite2-City.mmdb 查询，City 库不含 ISP 信息

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use tracing::trace;

use super::provider::{GeoError, GeoInfo, GeoIpLookup};

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
    async fn lookup(&self, ip: &str) -> Result<GeoInfo, GeoError> {
        let ip_addr: IpAddr = ip.parse().map_err(|_| GeoError::NotFound)?;

        let result = self
            .reader
            .lookup(ip_addr)
            .map_err(|e| GeoError::Unavailable(e.to_string()))?;
        let city: maxminddb::geoip2::City = result
            .decode()
            .map_err(|e| GeoError::Unavailable(e.to_string()))?
            .ok_or(GeoError::NotFound)?;

        let info = GeoInfo {
            city: city.city.names.english.map(|s| s.to_string()),
            country: city.country.names.english.map(|s| s.to_string()),
            isp: None,
            lat: city.location.latitude,
            lon: city.location.longitude,
        };

        trace!("MaxMind lookup for {}: {:?}", ip, info);
        Ok(info)
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}
