// ==========================================
// 车队批量导入系统 - 配置层
// ==========================================
// 职责: 进程启动时一次性物化配置并显式注入
// 红线: 不使用环境感知的全局可变状态,组件只接受注入的配置
// 来源: 环境变量(.env 由入口加载)
// ==========================================

use std::path::PathBuf;
use thiserror::Error;

// ==========================================
// ConfigError - 配置错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("环境变量缺失: {0}")]
    MissingVar(&'static str),

    #[error("环境变量取值无效 ({name}): {value}")]
    InvalidVar { name: &'static str, value: String },
}

// ==========================================
// ApiConfig - 远端API配置
// ==========================================
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub bearer_token: String,
    pub timeout_secs: u64, // 单次HTTP调用超时
}

// ==========================================
// SubmitConfig - 提交配置
// ==========================================
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub concurrency: usize,  // 批并发数
    pub pacing_secs: u64,    // 批间休眠秒数
}

impl SubmitConfig {
    pub fn pacing(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.pacing_secs)
    }
}

// ==========================================
// DirConfig - 工作目录配置
// ==========================================
#[derive(Debug, Clone)]
pub struct DirConfig {
    pub pending: PathBuf,   // 待处理文件目录
    pub processed: PathBuf, // 成功产物目录
    pub error: PathBuf,     // 错误产物目录
}

// ==========================================
// AppConfig - 应用配置(一次构造,全程注入)
// ==========================================
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub submit: SubmitConfig,
    pub dirs: DirConfig,
}

impl AppConfig {
    /// 从环境变量物化配置
    ///
    /// # 必填
    /// - BASE_URL / BEARER_TOKEN
    ///
    /// # 可选(含默认值)
    /// - FLEET_HTTP_TIMEOUT_SECS (30)
    /// - FLEET_CONCURRENCY (5) / FLEET_PACING_SECS (1)
    /// - FLEET_PENDING_DIR (./pending) / FLEET_PROCESSED_DIR (./processed)
    ///   / FLEET_ERROR_DIR (./error)
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        Ok(AppConfig {
            api: ApiConfig {
                base_url: required_var("BASE_URL")?,
                bearer_token: required_var("BEARER_TOKEN")?,
                timeout_secs: numeric_var("FLEET_HTTP_TIMEOUT_SECS", 30)?,
            },
            submit: SubmitConfig {
                concurrency: numeric_var("FLEET_CONCURRENCY", 5)?,
                pacing_secs: numeric_var("FLEET_PACING_SECS", 1)?,
            },
            dirs: DirConfig {
                pending: path_var("FLEET_PENDING_DIR", "./pending"),
                processed: path_var("FLEET_PROCESSED_DIR", "./processed"),
                error: path_var("FLEET_ERROR_DIR", "./error"),
            },
        })
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn numeric_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidVar { name, value: raw }),
        Err(_) => Ok(default),
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
