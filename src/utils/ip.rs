//! IP 地址处理工具
//!
//! - 从请求头 / 连接信息提取客户端 IP
//! - 判断是否为本地或私有地址（这些地址不做地理位置查询）

use std::net::{IpAddr, SocketAddr};

use actix_web::HttpRequest;
use actix_web::http::header::HeaderMap;

/// 无法识别客户端地址时使用的占位值
pub const UNKNOWN_IP: &str = "unknown";

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            // IPv4-mapped (::ffff:127.0.0.1) 按 IPv4 规则判断
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_or_local(&IpAddr::V4(v4));
            }
            // - fc00::/7 (ULA)
            // - fe80::/10 (Link-local)
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// 是否应跳过地理位置查询
///
/// 无法解析的地址（包括 "unknown"）一并视为本地，不外发查询。
pub fn should_skip_geolocation(ip: &str) -> bool {
    match parse_ip(ip) {
        Some(addr) => is_private_or_local(&addr),
        None => true,
    }
}

/// 解析 IP，兼容 "ip:port" 与 "[v6]:port"
pub fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

/// 解析并规范化转发头中的地址；不是合法 IP（或 ip:port）的值一律丢弃
fn forwarded_value(headers: &HeaderMap, name: &str, first_of_list: bool) -> Option<String> {
    let raw = headers.get(name)?.to_str().ok()?;
    let value = if first_of_list {
        raw.split(',').next()?
    } else {
        raw
    };
    parse_ip(value).map(|ip| ip.to_string())
}

/// 从 HeaderMap 提取转发的 IP
///
/// 优先 X-Forwarded-For 的第一个值（原始客户端），其次 X-Real-IP。
/// 转发头由客户端控制，只接受能解析为 IP 的值。
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    forwarded_value(headers, "x-forwarded-for", true)
        .or_else(|| forwarded_value(headers, "x-real-ip", false))
}

/// 从 HttpRequest 提取客户端 IP
///
/// 转发头 > 连接对端地址（去掉端口）> "unknown"
pub fn extract_client_ip(req: &HttpRequest) -> String {
    if let Some(ip) = extract_forwarded_ip_from_headers(req.headers()) {
        return ip;
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};
    use actix_web::test::TestRequest;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(HeaderName::from_static(k), HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_is_private_or_local_ipv4() {
        assert!(is_private_or_local(&"10.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"172.16.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"192.168.1.1".parse().unwrap()));
        assert!(is_private_or_local(&"127.0.0.1".parse().unwrap()));
        assert!(is_private_or_local(&"169.254.10.1".parse().unwrap()));
        assert!(!is_private_or_local(&"8.8.8.8".parse().unwrap()));
        assert!(!is_private_or_local(&"1.1.1.1".parse().unwrap()));
    }

    #[test]
    fn test_is_private_or_local_ipv6() {
        assert!(is_private_or_local(&"::1".parse().unwrap()));
        assert!(is_private_or_local(&"fd00::1".parse().unwrap()));
        assert!(is_private_or_local(&"fe80::1".parse().unwrap()));
        assert!(is_private_or_local(&"::ffff:127.0.0.1".parse().unwrap()));
        assert!(!is_private_or_local(
            &"2001:4860:4860::8888".parse().unwrap()
        ));
    }

    #[test]
    fn test_should_skip_geolocation() {
        assert!(should_skip_geolocation("127.0.0.1"));
        assert!(should_skip_geolocation("::1"));
        assert!(should_skip_geolocation(UNKNOWN_IP));
        assert!(should_skip_geolocation(""));
        assert!(!should_skip_geolocation("8.8.8.8"));
        assert!(!should_skip_geolocation("8.8.8.8:443"));
    }

    #[test]
    fn test_forwarded_for_takes_first_value() {
        let h = headers(&[("x-forwarded-for", " 203.0.113.7 , 10.0.0.2, 10.0.0.3")]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&h),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_real_ip_fallback() {
        let h = headers(&[("x-real-ip", "198.51.100.4")]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&h),
            Some("198.51.100.4".to_string())
        );
    }

    #[test]
    fn test_empty_forwarded_for_is_ignored() {
        let h = headers(&[("x-forwarded-for", "  ")]);
        assert_eq!(extract_forwarded_ip_from_headers(&h), None);
    }

    #[test]
    fn test_forwarded_garbage_is_rejected() {
        let h = headers(&[("x-forwarded-for", "not-an-ip, 10.0.0.2")]);
        assert_eq!(extract_forwarded_ip_from_headers(&h), None);

        let long = format!("{}, 10.0.0.2", "9".repeat(200));
        let mut h = HeaderMap::new();
        h.insert(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_str(&long).unwrap(),
        );
        assert_eq!(extract_forwarded_ip_from_headers(&h), None);
    }

    #[test]
    fn test_garbage_forwarded_for_falls_back_to_real_ip() {
        let h = headers(&[
            ("x-forwarded-for", "<script>"),
            ("x-real-ip", "198.51.100.4"),
        ]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&h),
            Some("198.51.100.4".to_string())
        );
    }

    #[test]
    fn test_forwarded_port_is_stripped() {
        let h = headers(&[("x-forwarded-for", "[2001:db8::1]:8443")]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&h),
            Some("2001:db8::1".to_string())
        );
    }

    #[test]
    fn test_extract_client_ip_ignores_invalid_header() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "definitely not an address"))
            .peer_addr("203.0.113.9:51234".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn test_extract_client_ip_from_peer() {
        let req = TestRequest::default()
            .peer_addr("203.0.113.9:51234".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn test_extract_client_ip_prefers_header() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.1, 10.0.0.1"))
            .peer_addr("10.0.0.1:80".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "203.0.113.1");
    }

    #[test]
    fn test_extract_client_ip_unknown() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_client_ip(&req), UNKNOWN_IP);
    }
}
