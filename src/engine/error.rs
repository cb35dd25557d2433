// ==========================================
// 车队批量导入系统 - 行级错误类型
// ==========================================
// 职责: 映射阶段(规范化/解析/对账)的行级失败分类
// 红线: 行级错误在行边界被捕获转为结果桶,不得中断整次运行
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 行级错误类型(对单行致命,对运行非致命)
#[derive(Error, Debug)]
pub enum RowError {
    // ===== 规范化错误 =====
    #[error("必填字段缺失: {field}")]
    MissingField { field: String },

    #[error("字段值无效 (field={field}): {message}")]
    InvalidValue { field: String, message: String },

    #[error("整行为空")]
    EmptyRow,

    // ===== 实体解析错误 =====
    #[error("实体未找到 (field={field}): {value}")]
    EntityNotFound { field: String, value: String },

    // ===== 财务对账错误 =====
    #[error("总额对账失败: 计算值 {computed} 与申报值 {declared} 差异超限 ({detail})")]
    Reconciliation {
        computed: f64,
        declared: f64,
        detail: String,
    },
}

/// Result 类型别名
pub type RowResult<T> = Result<T, RowError>;
