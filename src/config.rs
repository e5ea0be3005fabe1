use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::models::interaction::{TombstonePolicy, UnknownVariant};

/// 交互记录使用的存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    SurrealDb,
}

impl FromStr for StorageBackend {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "surrealdb" | "surreal" => Ok(StorageBackend::SurrealDb),
            _ => Err(UnknownVariant {
                kind: "storage backend",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Storage configuration
    pub storage_backend: StorageBackend,
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Interaction settings
    pub tombstone_policy: TombstonePolicy,
    pub default_bookmarks_per_page: usize,
    pub max_bookmarks_per_page: usize,

    // 上游网关写入的已认证用户 ID 请求头
    pub user_id_header: String,

    // CORS configuration
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置，缺失的键使用默认值
    pub fn from_source<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            server_host: var("SERVER_HOST", "0.0.0.0"),
            server_port: var("SERVER_PORT", "3000").parse()?,
            environment: var("ENVIRONMENT", "development"),
            log_level: var("LOG_LEVEL", "promo_interactions=debug,tower_http=info"),

            storage_backend: var("STORAGE_BACKEND", "memory").parse()?,
            database_url: var("DATABASE_URL", "http://localhost:8000"),
            database_namespace: var("DATABASE_NAMESPACE", "promo"),
            database_name: var("DATABASE_NAME", "interactions"),
            database_username: var("DATABASE_USERNAME", "root"),
            database_password: var("DATABASE_PASSWORD", "root"),

            tombstone_policy: var("TOMBSTONE_POLICY", "retain").parse()?,
            default_bookmarks_per_page: var("DEFAULT_BOOKMARKS_PER_PAGE", "20").parse()?,
            max_bookmarks_per_page: var("MAX_BOOKMARKS_PER_PAGE", "100").parse()?,

            user_id_header: var("USER_ID_HEADER", "x-user-id").to_ascii_lowercase(),

            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS", "http://localhost:3001"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            environment: "development".to_string(),
            log_level: "promo_interactions=debug,tower_http=info".to_string(),
            storage_backend: StorageBackend::Memory,
            database_url: "http://localhost:8000".to_string(),
            database_namespace: "promo".to_string(),
            database_name: "interactions".to_string(),
            database_username: "root".to_string(),
            database_password: "root".to_string(),
            tombstone_policy: TombstonePolicy::Retain,
            default_bookmarks_per_page: 20,
            max_bookmarks_per_page: 100,
            user_id_header: "x-user-id".to_string(),
            cors_allowed_origins: "http://localhost:3001".to_string(),
        }
    }
}
