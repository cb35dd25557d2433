// ==========================================
// 车队批量导入系统 - 行结果模型
// ==========================================
// 职责: 单行处理的终态分类与整次运行的汇总
// 红线: RowOutcome 创建即终态,只聚合不修改
// ==========================================

use crate::domain::payload::Payload;
use crate::domain::row::RawRow;
use std::path::PathBuf;
use std::time::Duration;

// ==========================================
// RowOutcome - 行终态
// ==========================================
#[derive(Debug, Clone)]
pub enum RowOutcome {
    /// 映射并提交成功(api_id 为远端创建的记录ID,更新类端点无ID)
    Processed {
        row: RawRow,
        payload: Payload,
        api_id: Option<i64>,
    },
    /// 映射阶段失败(规范化/实体解析/对账)
    MappingError { row: RawRow, reason: String },
    /// 提交阶段失败(HTTP 非2xx/超时/传输错误)
    SubmissionError {
        row: RawRow,
        payload: Payload,
        reason: String,
    },
}

impl RowOutcome {
    pub fn row(&self) -> &RawRow {
        match self {
            RowOutcome::Processed { row, .. } => row,
            RowOutcome::MappingError { row, .. } => row,
            RowOutcome::SubmissionError { row, .. } => row,
        }
    }
}

// ==========================================
// LoadSummary - 计数汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub total_rows: usize,
    pub processed: usize,
    pub mapping_errors: usize,
    pub submission_errors: usize,
}

impl LoadSummary {
    pub fn from_outcomes(outcomes: &[RowOutcome]) -> LoadSummary {
        let mut summary = LoadSummary {
            total_rows: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                RowOutcome::Processed { .. } => summary.processed += 1,
                RowOutcome::MappingError { .. } => summary.mapping_errors += 1,
                RowOutcome::SubmissionError { .. } => summary.submission_errors += 1,
            }
        }
        summary
    }
}

// ==========================================
// LoadReport - 运行报告
// ==========================================
// 产物路径仅在对应桶非空时存在
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub run_id: String,
    pub source_file: String,
    pub summary: LoadSummary,
    pub processed_artifact: Option<PathBuf>,
    pub mapping_error_artifact: Option<PathBuf>,
    pub submission_error_artifact: Option<PathBuf>,
    pub elapsed: Duration,
}
