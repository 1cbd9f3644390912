use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// 进程内存（重启丢失，受 retention_cap 约束）
    #[default]
    Memory,
    /// SeaORM 数据库（SQLite / PostgreSQL）
    Database,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "database" | "db" => Ok(Self::Database),
            _ => Err(format!(
                "Invalid store backend: '{}'. Valid: memory, database",
                s
            )),
        }
    }
}

/// 静态配置（从 TOML + 环境变量加载，启动时使用）
///
/// - server: 监听地址、端口、worker 数量、静态资源目录
/// - database: 数据库连接配置（store.backend = database 时使用）
/// - store: 存储后端选择与容量
/// - analytics: GeoIP 查询配置
/// - admin: 管理口令
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：单独的 ENV (PORT / ADMIN_PASSWORD / DATABASE_URL / DATA_HUB_URL) > BEACON__* ENV > config.toml > 默认值
    /// ENV 前缀：BEACON，分隔符：__
    /// 示例：BEACON__SERVER__PORT=3001
    pub fn load(path: Option<&str>) -> Self {
        use config::{Config, File};

        let path = path.unwrap_or("config.toml");

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Self::environment());

        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
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
        };

        config.apply_plain_env(|key| std::env::var(key).ok());
        config
    }

    /// BEACON__* 环境变量源
    ///
    /// 列表字段用逗号分隔，如 `BEACON__SERVER__CORS_ORIGINS=https://a.example,https://b.example`
    fn environment() -> config::Environment {
        config::Environment::with_prefix("BEACON")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
    }

    /// 兼容部署平台常用的无前缀环境变量
    pub fn apply_plain_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(secret) = lookup("ADMIN_PASSWORD").filter(|s| !s.is_empty()) {
            self.admin.secret = secret;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
            self.database.database_url = url;
            self.store.backend = StoreBackend::Database;
        }
        if let Some(url) = lookup("DATA_HUB_URL").filter(|s| !s.trim().is_empty()) {
            self.analytics.data_hub_url = Some(url.trim().to_string());
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
    /// 前端构建产物目录，SPA fallback 使用其中的 index.html
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// 允许跨域的 Origin，`*` 表示任意；为空时只允许同源
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// 最大保留条数；内存后端必须有上限，数据库后端为 None 时不限
    #[serde(default)]
    pub retention_cap: Option<usize>,
    /// Dashboard recent_logs 条数
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl StoreConfig {
    /// 内存后端实际生效的容量
    pub fn memory_cap(&self) -> usize {
        self.retention_cap
            .filter(|cap| *cap > 0)
            .unwrap_or(DEFAULT_MEMORY_CAP)
    }

    /// 规范化后的分页大小（1..=100）
    pub fn page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// 分析统计配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_enable_geo_lookup")]
    pub enable_geo_lookup: bool,
    /// MaxMind GeoLite2-City.mmdb 路径，可读时优先使用
    #[serde(default)]
    pub maxminddb_path: Option<String>,
    /// 外部 GeoIP API，`{ip}` 为占位符
    #[serde(default = "default_geoip_api_url")]
    pub geoip_api_url: String,
    /// 地理位置查询与数据中心转发的超时
    #[serde(default = "default_geoip_timeout_ms")]
    pub geoip_timeout_ms: u64,
    /// 中心实例的采集地址；设置后信号先转发过去，失败才本地记录
    #[serde(default)]
    pub data_hub_url: Option<String>,
    /// 转发时附带的 `source` 标记
    #[serde(default = "default_data_hub_source")]
    pub data_hub_source: String,
}

impl AnalyticsConfig {
    /// 空字符串视为未配置
    pub fn data_hub_url(&self) -> Option<&str> {
        self.data_hub_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// 管理配置
///
/// 单一静态口令，登录返回的 token 即口令本身，没有会话和过期。
/// 仅适合低风险场景。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub secret: String,
    /// 登录限流按转发头里的客户端地址分桶。
    /// 仅在前面有会覆盖 X-Forwarded-For / X-Real-IP 的反向代理时开启
    #[serde(default)]
    pub login_limit_by_forwarded: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

pub const DEFAULT_MEMORY_CAP: usize = 1000;
pub const MAX_PAGE_SIZE: usize = 100;

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3001
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_static_dir() -> String {
    "dist".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_database_url() -> String {
    "sqlite://analytics.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_page_size() -> usize {
    50
}

fn default_enable_geo_lookup() -> bool {
    true
}

fn default_geoip_api_url() -> String {
    "http://ip-api.com/json/{ip}?fields=status,message,country,city,isp,lat,lon".to_string()
}

fn default_geoip_timeout_ms() -> u64 {
    2500
}

fn default_data_hub_source() -> String {
    "beacon".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
            static_dir: default_static_dir(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            retention_cap: None,
            page_size: default_page_size(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enable_geo_lookup: default_enable_geo_lookup(),
            maxminddb_path: None,
            geoip_api_url: default_geoip_api_url(),
            geoip_timeout_ms: default_geoip_timeout_ms(),
            data_hub_url: None,
            data_hub_source: default_data_hub_source(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.memory_cap(), DEFAULT_MEMORY_CAP);
        assert_eq!(config.store.page_size(), 50);
        assert!(config.admin.secret.is_empty());
        assert!(config.analytics.geoip_api_url.contains("{ip}"));
        assert_eq!(config.analytics.data_hub_url(), None);
        assert_eq!(config.analytics.data_hub_source, "beacon");
    }

    #[test]
    fn test_page_size_is_clamped() {
        let mut store = StoreConfig::default();
        store.page_size = 0;
        assert_eq!(store.page_size(), 1);
        store.page_size = 5000;
        assert_eq!(store.page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_zero_cap_falls_back_to_default() {
        let store = StoreConfig {
            retention_cap: Some(0),
            ..Default::default()
        };
        assert_eq!(store.memory_cap(), DEFAULT_MEMORY_CAP);
    }

    #[test]
    fn test_plain_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8088"),
            ("ADMIN_PASSWORD", "hunter2"),
            ("DATABASE_URL", "postgres://localhost/beacon"),
            ("DATA_HUB_URL", " https://hub.example/api/collect "),
        ]
        .into_iter()
        .collect();

        let mut config = StaticConfig::default();
        config.apply_plain_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.admin.secret, "hunter2");
        assert_eq!(config.database.database_url, "postgres://localhost/beacon");
        assert_eq!(config.store.backend, StoreBackend::Database);
        assert_eq!(
            config.analytics.data_hub_url(),
            Some("https://hub.example/api/collect")
        );
    }

    #[test]
    fn test_blank_data_hub_url_is_unset() {
        let analytics = AnalyticsConfig {
            data_hub_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(analytics.data_hub_url(), None);

        let mut config = StaticConfig::default();
        config.apply_plain_env(|k| (k == "DATA_HUB_URL").then(|| "".to_string()));
        assert_eq!(config.analytics.data_hub_url, None);
    }

    #[test]
    fn test_cors_origins_env_is_a_comma_list() {
        let env: config::Map<String, String> = [
            (
                "BEACON__SERVER__CORS_ORIGINS".to_string(),
                "https://a.example,https://b.example".to_string(),
            ),
            ("BEACON__SERVER__PORT".to_string(), "4000".to_string()),
        ]
        .into_iter()
        .collect();

        let config: StaticConfig = config::Config::builder()
            .add_source(StaticConfig::environment().source(Some(env)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_plain_env_ignores_garbage_port() {
        let mut config = StaticConfig::default();
        config.apply_plain_env(|k| (k == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("DB".parse::<StoreBackend>(), Ok(StoreBackend::Database));
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
