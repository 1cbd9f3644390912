use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

/// 地理位置 / UA 字段的缺省值
pub const UNKNOWN: &str = "Unknown";
/// 本地或私有地址的国家字段
pub const LOCALHOST: &str = "Localhost";
/// search_text 中的字段分隔符（ASCII Unit Separator）
pub const SEARCH_SEPARATOR: char = '\u{1f}';

/// 一次页面访问记录
///
/// 采集时完成富化后创建，之后不再修改；只会被容量淘汰或管理员删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub id: i64,
    pub path: String,
    pub referrer: String,
    pub screen: String,
    pub ip: String,
    pub city: String,
    pub country: String,
    pub isp: String,
    pub browser: String,
    pub browser_version: String,
    pub os: String,
    pub os_version: String,
    pub device_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl PageView {
    fn searchable_fields(&self) -> [&str; 6] {
        [
            &self.path,
            &self.city,
            &self.country,
            &self.ip,
            &self.browser,
            &self.os,
        ]
    }

    /// 大小写不敏感的子串匹配（path / city / country / ip / browser / os 任一命中）
    ///
    /// `needle` 必须已经是小写，见 [`normalize_filter`]
    pub fn matches(&self, needle: &str) -> bool {
        self.searchable_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    /// SQL 后端的 search_text 列：各字段小写后以 [`SEARCH_SEPARATOR`] 连接
    ///
    /// 小写在应用层完成，数据库的 LOWER() 不一定处理非 ASCII 字符
    pub fn search_text(&self) -> String {
        self.searchable_fields()
            .iter()
            .map(|field| field.to_lowercase())
            .collect::<Vec<_>>()
            .join(&SEARCH_SEPARATOR.to_string())
    }

    /// 经纬度都存在时返回坐标
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// 规范化过滤文本：去掉分隔符和首尾空白、转小写，空串视为无过滤
pub fn normalize_filter(filter: Option<&str>) -> Option<String> {
    filter
        .map(|f| f.replace(SEARCH_SEPARATOR, ""))
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
}

/// 分组统计维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GroupField {
    /// city + country 组合，排除 city 为 Unknown 的记录
    CityCountry,
    Isp,
    Browser,
}

impl GroupField {
    /// 分组键；返回 None 表示该记录不参与统计
    pub fn key_of(self, view: &PageView) -> Option<(String, Option<String>)> {
        let (key, extra) = match self {
            GroupField::CityCountry => (&view.city, Some(view.country.clone())),
            GroupField::Isp => (&view.isp, None),
            GroupField::Browser => (&view.browser, None),
        };
        if key == UNKNOWN || key.is_empty() {
            return None;
        }
        Some((key.clone(), extra))
    }
}

/// 分组计数结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    /// 仅 CityCountry 维度有值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub count: u64,
}

/// 地图点位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub city: String,
    pub country: String,
    pub count: u64,
}

/// 汇总统计，每次从存储重新计算，不持久化
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_views: u64,
    pub unique_visitors: u64,
    pub active_countries: u64,
}

/// 是否计入 active_countries
pub fn is_real_country(country: &str) -> bool {
    !country.is_empty() && country != UNKNOWN && country != LOCALHOST
}
