//! User-Agent 解析
//!
//! woothee 对识别不出的字段返回 "UNKNOWN"，这里统一换成 "Unknown" / ""

use woothee::parser::Parser;

use crate::storage::UNKNOWN;

const WOOTHEE_UNKNOWN: &str = "UNKNOWN";

/// 解析后的 UserAgent 信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
    pub device_type: String,
}

impl Default for ParsedUserAgent {
    fn default() -> Self {
        Self {
            browser: UNKNOWN.to_string(),
            browser_version: String::new(),
            os: UNKNOWN.to_string(),
            os_version: String::new(),
            device_type: UNKNOWN.to_string(),
        }
    }
}

/// UserAgent 解析 trait
pub trait UserAgentParse: Send + Sync {
    fn parse(&self, user_agent: Option<&str>) -> ParsedUserAgent;
}

/// 基于 woothee 的实现
#[derive(Debug, Default, Clone, Copy)]
pub struct WootheeParser;

fn known(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value != WOOTHEE_UNKNOWN).then(|| value.to_string())
}

/// woothee category → 设备类型
fn device_type_of(category: &str) -> &'static str {
    match category {
        "pc" => "Desktop",
        "smartphone" | "mobilephone" => "Mobile",
        "appliance" => "Appliance",
        "crawler" => "Bot",
        _ => UNKNOWN,
    }
}

impl UserAgentParse for WootheeParser {
    fn parse(&self, user_agent: Option<&str>) -> ParsedUserAgent {
        let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
            return ParsedUserAgent::default();
        };

        let Some(result) = Parser::new().parse(ua) else {
            return ParsedUserAgent::default();
        };

        ParsedUserAgent {
            browser: known(result.name).unwrap_or_else(|| UNKNOWN.to_string()),
            browser_version: known(result.version).unwrap_or_default(),
            os: known(result.os).unwrap_or_else(|| UNKNOWN.to_string()),
            os_version: known(&result.os_version).unwrap_or_default(),
            device_type: device_type_of(result.category).to_string(),
        }
    }
}
