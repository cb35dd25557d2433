// ==========================================
// 车队批量导入系统 - 结果报告层
// ==========================================
// 职责: 行终态分桶落盘(成功 / 映射错误 / 提交错误)
// 口径: 产物保留原始列并追加诊断列;桶为空则不生成文件
// 命名: {时间戳}_{源文件名}_{桶后缀}.csv
// ==========================================

use crate::domain::{RowOutcome, RawRow};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

// ==========================================
// ReportError - 报告层错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("产物目录创建失败: {0}")]
    DirectoryError(String),

    #[error("产物写入失败: {0}")]
    WriteError(String),
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::WriteError(err.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::WriteError(err.to_string())
    }
}

// ==========================================
// ArtifactPaths - 本次运行生成的产物
// ==========================================
#[derive(Debug, Default)]
pub struct ArtifactPaths {
    pub processed: Option<PathBuf>,
    pub mapping_error: Option<PathBuf>,
    pub submission_error: Option<PathBuf>,
}

// ==========================================
// ResultReporter - 结果报告器
// ==========================================
pub struct ResultReporter {
    processed_dir: PathBuf,
    error_dir: PathBuf,
}

impl ResultReporter {
    pub fn new(processed_dir: impl Into<PathBuf>, error_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
            error_dir: error_dir.into(),
        }
    }

    /// 分桶落盘
    ///
    /// # 产物
    /// - processed → 成功目录,追加 source_row/sheet/api_id
    /// - mapping_error / submission_error → 错误目录,追加 source_row/sheet/error
    pub fn write_artifacts(
        &self,
        source_stem: &str,
        outcomes: &[RowOutcome],
    ) -> Result<ArtifactPaths, ReportError> {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();

        let mut processed = Vec::new();
        let mut mapping_errors = Vec::new();
        let mut submission_errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                RowOutcome::Processed { row, api_id, .. } => {
                    processed.push((row, api_id.map(|id| id.to_string())))
                }
                RowOutcome::MappingError { row, reason } => {
                    mapping_errors.push((row, Some(reason.clone())))
                }
                RowOutcome::SubmissionError { row, reason, .. } => {
                    submission_errors.push((row, Some(reason.clone())))
                }
            }
        }

        let mut artifacts = ArtifactPaths::default();

        if !processed.is_empty() {
            let path = self.artifact_path(&self.processed_dir, &timestamp, source_stem, "processed");
            write_bucket(&path, &processed, "api_id")?;
            info!(path = %path.display(), rows = processed.len(), "成功产物已生成");
            artifacts.processed = Some(path);
        }
        if !mapping_errors.is_empty() {
            let path =
                self.artifact_path(&self.error_dir, &timestamp, source_stem, "mapping_error");
            write_bucket(&path, &mapping_errors, "error")?;
            info!(path = %path.display(), rows = mapping_errors.len(), "映射错误产物已生成");
            artifacts.mapping_error = Some(path);
        }
        if !submission_errors.is_empty() {
            let path =
                self.artifact_path(&self.error_dir, &timestamp, source_stem, "submission_error");
            write_bucket(&path, &submission_errors, "error")?;
            info!(path = %path.display(), rows = submission_errors.len(), "提交错误产物已生成");
            artifacts.submission_error = Some(path);
        }

        Ok(artifacts)
    }

    fn artifact_path(
        &self,
        dir: &Path,
        timestamp: &str,
        source_stem: &str,
        suffix: &str,
    ) -> PathBuf {
        dir.join(format!("{}_{}_{}.csv", timestamp, source_stem, suffix))
    }
}

/// 单桶写盘: 原始列 + source_row + sheet + 诊断列
fn write_bucket(
    path: &Path,
    rows: &[(&RawRow, Option<String>)],
    diagnostic_column: &str,
) -> Result<(), ReportError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(|e| ReportError::DirectoryError(e.to_string()))?;

    // 桶内各行共享同一文件的列结构,以首行为准
    let columns = rows[0].0.columns.clone();

    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
    header.push("source_row");
    header.push("sheet");
    header.push(diagnostic_column);
    writer.write_record(&header)?;

    for (row, diagnostic) in rows {
        let mut record: Vec<String> = columns
            .iter()
            .map(|column| row.get(column).to_display_string())
            .collect();
        record.push(row.row_number.to_string());
        record.push(
            row.sheet_name
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_default(),
        );
        record.push(diagnostic.clone().unwrap_or_default());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CellValue;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_row(row_number: usize, plate: &str) -> RawRow {
        RawRow {
            source_file: Arc::new("flota.csv".to_string()),
            sheet_name: Some(Arc::new("HOJA1".to_string())),
            columns: Arc::new(vec!["Matricula".to_string(), "Total".to_string()]),
            cells: vec![
                CellValue::Text(plate.to_string()),
                CellValue::Number(100.0),
            ],
            row_number,
        }
    }

    #[test]
    fn test_empty_buckets_produce_no_files() {
        let temp = TempDir::new().unwrap();
        let reporter = ResultReporter::new(temp.path().join("ok"), temp.path().join("err"));

        let artifacts = reporter.write_artifacts("flota", &[]).unwrap();
        assert!(artifacts.processed.is_none());
        assert!(artifacts.mapping_error.is_none());
        assert!(artifacts.submission_error.is_none());
        // 目录也不应被创建
        assert!(!temp.path().join("ok").exists());
    }

    #[test]
    fn test_mapping_error_artifact_content() {
        let temp = TempDir::new().unwrap();
        let reporter = ResultReporter::new(temp.path().join("ok"), temp.path().join("err"));

        let outcomes = vec![RowOutcome::MappingError {
            row: sample_row(4, "0000-XXX"),
            reason: "实体未找到 (field=Matricula): 0000-XXX".to_string(),
        }];
        let artifacts = reporter.write_artifacts("flota", &outcomes).unwrap();

        let path = artifacts.mapping_error.expect("应生成映射错误产物");
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Matricula,Total,source_row,sheet,error"
        );
        let data_line = lines.next().unwrap();
        assert!(data_line.contains("0000-XXX"));
        assert!(data_line.contains(",4,HOJA1,"));
    }

    #[test]
    fn test_processed_artifact_carries_api_id() {
        let temp = TempDir::new().unwrap();
        let reporter = ResultReporter::new(temp.path().join("ok"), temp.path().join("err"));

        let row = sample_row(2, "1234-ABC");
        let payload = crate::domain::Payload::Expense(crate::domain::ExpensePayload {
            name: "x".to_string(),
            subtotal: 100.0,
            tax_type: crate::domain::AmountKind::Percentage,
            tax: 0.0,
            discount_type: crate::domain::AmountKind::Currency,
            discount: 0.0,
            total: 100.0,
            date: "2024-01-01T00:00:00.000Z".to_string(),
            expense_type_id: 1,
            vehicle_id: 1,
            driver_id: None,
            supplier_id: None,
            payment_method_id: None,
            odometer: None,
            custom_fields_metadata: None,
        });
        let outcomes = vec![RowOutcome::Processed {
            row,
            payload,
            api_id: Some(987),
        }];
        let artifacts = reporter.write_artifacts("flota", &outcomes).unwrap();

        let path = artifacts.processed.expect("应生成成功产物");
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.lines().next().unwrap().ends_with("api_id"));
        assert!(content.contains("987"));
    }
}
