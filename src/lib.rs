// ==========================================
// 车队批量导入系统 - 核心库
// ==========================================
// 技术栈: Rust + reqwest + calamine/csv
// 系统定位: 表格数据批量载入工具(目录缓存 → 行映射 → 定速提交 → 分桶报告)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// API客户端层 - 远端访问
pub mod client;

// 目录缓存层 - 参照数据
pub mod catalog;

// 读取层 - 表格文件
pub mod reader;

// 引擎层 - 行处理业务规则
pub mod engine;

// 报告层 - 结果产物
pub mod report;

// 配置层 - 环境物化
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AmountKind, CatalogEntry, CellValue, EntityKind, Frequency, LoadReport, LoadSummary, Payload,
    RawRow, RowOutcome,
};

// 目录缓存
pub use catalog::{CatalogCache, CatalogError};

// 客户端
pub use client::{ApiError, FleetApiClient};

// 引擎
pub use engine::{
    BatchSubmitter, EntityResolver, FuelCardMapper, HttpSubmitter, InsuranceMapper,
    LoadOrchestrator, ReminderMapper, RowError, RowMapper, ScheduledExpenseMapper, Submitter,
};

// 配置
pub use config::{AppConfig, ConfigError};

// 读取与报告
pub use reader::{ReadError, SheetReader};
pub use report::{ReportError, ResultReporter};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车队批量导入系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
