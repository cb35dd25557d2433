// ==========================================
// 车队批量导入系统 - API客户端错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// API客户端错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== HTTP 层错误 =====
    #[error("远端返回非成功状态: {status}, 响应体: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP 传输失败: {0}")]
    Transport(#[from] reqwest::Error),

    // ===== 响应解析错误 =====
    #[error("响应解析失败 ({context}): {message}")]
    Decode { context: String, message: String },

    // ===== 配置错误 =====
    #[error("客户端配置无效: {0}")]
    InvalidConfig(String),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
