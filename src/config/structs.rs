use serde::{Deserialize, Serialize};

use crate::errors::{AdminError, Result};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: 服务器地址、端口、CPU 数量
/// - api: 管理令牌与 CORS
/// - database: Appwrite 连接与集合 ID
/// - analytics: PostHog 连接
/// - revalidation: 主站缓存刷新
/// - cache / bulk / logging
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub revalidation: RevalidationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：STUDYSTACK，分隔符：__
    /// 示例：STUDYSTACK__SERVER__PORT=9999
    pub fn load_from(path: &str) -> Result<Self> {
        use config::{Config, Environment, File};

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("STUDYSTACK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AdminError::config(format!("Failed to build config: {}", e)))?;

        let config = settings
            .try_deserialize::<StaticConfig>()
            .map_err(|e| AdminError::config(format!("Failed to deserialize config: {}", e)))?;

        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AdminError::serialization(format!("Failed to encode config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
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
}

/// 管理 API 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Bearer token required on every `/api` route. Empty disables the admin API.
    #[serde(default)]
    pub admin_token: String,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// Appwrite 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    #[serde(default)]
    pub collections: CollectionsConfig,
    /// Precomputed dashboard documents living in the cache collection
    #[serde(default = "default_stats_document_id")]
    pub stats_document_id: String,
    #[serde(default = "default_uploaders_document_id")]
    pub uploaders_document_id: String,
    #[serde(default = "default_files_bucket_id")]
    pub files_bucket_id: String,
    #[serde(default = "default_activity_function_id")]
    pub activity_function_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    #[serde(default = "default_users_collection")]
    pub users: String,
    #[serde(default = "default_notes_collection")]
    pub notes: String,
    #[serde(default = "default_youtube_collection")]
    pub youtube: String,
    #[serde(default = "default_forms_collection")]
    pub forms: String,
    #[serde(default = "default_subjects_collection")]
    pub subjects: String,
    #[serde(default = "default_cache_collection")]
    pub cache: String,
}

/// PostHog 分析配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_posthog_host")]
    pub host: String,
    #[serde(default)]
    pub project_id: String,
    /// Project API key
    #[serde(default)]
    pub api_key: String,
    /// Personal API key, required by the person-level queries
    #[serde(default)]
    pub personal_api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// 主站缓存刷新配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevalidationConfig {
    #[serde(default = "default_main_app_url")]
    pub main_app_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_revalidation_timeout_secs")]
    pub timeout_secs: u64,
}

/// 查询缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_list_ttl")]
    pub list_ttl_secs: u64,
    #[serde(default = "default_options_ttl")]
    pub options_ttl_secs: u64,
    #[serde(default = "default_dashboard_ttl")]
    pub dashboard_ttl_secs: u64,
    #[serde(default = "default_analytics_ttl")]
    pub analytics_ttl_secs: u64,
}

/// 批量操作配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    #[serde(default = "default_bulk_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
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

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_database_endpoint() -> String {
    "https://cloud.appwrite.io/v1".to_string()
}

fn default_database_id() -> String {
    "studystack".to_string()
}

fn default_stats_document_id() -> String {
    "teacher_contributions".to_string()
}

fn default_uploaders_document_id() -> String {
    "note_uploaders".to_string()
}

fn default_files_bucket_id() -> String {
    "notes".to_string()
}

fn default_activity_function_id() -> String {
    "recent-activity".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_notes_collection() -> String {
    "notes".to_string()
}

fn default_youtube_collection() -> String {
    "youtube".to_string()
}

fn default_forms_collection() -> String {
    "forms".to_string()
}

fn default_subjects_collection() -> String {
    "subjects".to_string()
}

fn default_cache_collection() -> String {
    "cache".to_string()
}

fn default_posthog_host() -> String {
    "https://us.posthog.com".to_string()
}

fn default_main_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_revalidation_timeout_secs() -> u64 {
    10
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_list_ttl() -> u64 {
    300
}

fn default_options_ttl() -> u64 {
    900
}

fn default_dashboard_ttl() -> u64 {
    60
}

fn default_analytics_ttl() -> u64 {
    300
}

fn default_bulk_concurrency() -> usize {
    8
}

fn default_max_batch_size() -> usize {
    500
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
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            endpoint: default_database_endpoint(),
            project_id: String::new(),
            api_key: String::new(),
            database_id: default_database_id(),
            collections: CollectionsConfig::default(),
            stats_document_id: default_stats_document_id(),
            uploaders_document_id: default_uploaders_document_id(),
            files_bucket_id: default_files_bucket_id(),
            activity_function_id: default_activity_function_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            users: default_users_collection(),
            notes: default_notes_collection(),
            youtube: default_youtube_collection(),
            forms: default_forms_collection(),
            subjects: default_subjects_collection(),
            cache: default_cache_collection(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            host: default_posthog_host(),
            project_id: String::new(),
            api_key: String::new(),
            personal_api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RevalidationConfig {
    fn default() -> Self {
        Self {
            main_app_url: default_main_app_url(),
            token: None,
            timeout_secs: default_revalidation_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_capacity(),
            list_ttl_secs: default_list_ttl(),
            options_ttl_secs: default_options_ttl(),
            dashboard_ttl_secs: default_dashboard_ttl(),
            analytics_ttl_secs: default_analytics_ttl(),
        }
    }
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_bulk_concurrency(),
            max_batch_size: default_max_batch_size(),
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

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.cache.list_ttl_secs, 300);
        assert_eq!(config.cache.options_ttl_secs, 900);
        assert_eq!(config.cache.dashboard_ttl_secs, 60);
        assert_eq!(config.bulk.max_concurrency, 8);
        assert_eq!(config.bulk.max_batch_size, 500);
        assert!(config.revalidation.token.is_none());
        assert!(config.api.admin_token.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: StaticConfig = toml::from_str(
            r#"
            [database]
            project_id = "proj"

            [bulk]
            max_concurrency = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.database.project_id, "proj");
        assert_eq!(config.database.collections.youtube, "youtube");
        assert_eq!(config.bulk.max_concurrency, 2);
        assert_eq!(config.bulk.max_batch_size, 500);
    }

    #[test]
    fn test_sample_config_roundtrips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        StaticConfig::default().save_to_file(&path).unwrap();

        let loaded = StaticConfig::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.cache.analytics_ttl_secs, 300);
        assert_eq!(loaded.database.collections.forms, "forms");
    }
}
