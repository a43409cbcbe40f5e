use std::path::PathBuf;

use chrono_tz::Tz;

/// 默认业务时区
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Ho_Chi_Minh;

/// 服务器配置 - 激活服务的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/activation | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | TIMEZONE | Asia/Ho_Chi_Minh | 业务时区 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志文件目录 |
/// | CATALOG_SEED_PATH | (无) | 目录种子 JSON (门店/教练/套餐/课程) |
/// | STARTING_SOON_MINUTES | 60 | "即将开始" 标签提前量(分钟) |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | MATCH_PAGE_SIZE | 20 | 教练匹配默认分页大小 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/activation HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 业务时区 (课程日期与时间均按此时区解释)
    pub timezone: Tz,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// 启动时导入的目录种子
    pub catalog_seed_path: Option<String>,
    pub starting_soon_minutes: i64,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    pub match_page_size: u32,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/activation".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(DEFAULT_TIMEZONE),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            catalog_seed_path: std::env::var("CATALOG_SEED_PATH")
                .ok()
                .filter(|p| !p.is_empty()),
            starting_soon_minutes: std::env::var("STARTING_SOON_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            match_page_size: std::env::var("MATCH_PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(20),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
            .join("database")
            .join("activation.redb")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(PathBuf::from(&self.work_dir).join("database"))?;
        if let Some(log_dir) = &self.log_dir {
            std::fs::create_dir_all(log_dir)?;
        }
        Ok(())
    }

    pub fn starting_soon(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.starting_soon_minutes.max(0))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        config.log_dir = Some(dir.path().join("logs").to_string_lossy().into_owned());

        config.ensure_work_dir_structure().unwrap();
        assert!(dir.path().join("database").is_dir());
        assert!(dir.path().join("logs").is_dir());
        assert!(config.database_path().ends_with("database/activation.redb"));
        assert_eq!(config.http_port, 0);
    }

    #[test]
    fn test_starting_soon_never_negative() {
        let mut config = Config::with_overrides("/tmp/unused", 0);
        config.starting_soon_minutes = -5;
        assert_eq!(config.starting_soon(), chrono::Duration::zero());
    }
}
