// ==========================================
// 车队批量导入系统 - 管道编排器
// ==========================================
// 用途: 协调单文件的完整处理流程
// 流程: 读取 → 逐行映射(纯) → 批量提交 → 分桶报告
// 红线: 行级失败收敛为结果桶;文件级/目录级失败向上传播
// ==========================================

use crate::catalog::CatalogCache;
use crate::domain::{LoadReport, LoadSummary, Payload, RawRow, RowOutcome};
use crate::engine::mappers::RowMapper;
use crate::engine::submitter::{BatchSubmitter, Submitter};
use crate::reader::{ReadError, SheetReader};
use crate::report::{ReportError, ResultReporter};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

// ==========================================
// PipelineError - 管道错误(文件级致命)
// ==========================================
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

// ==========================================
// LoadOrchestrator - 导入编排器
// ==========================================
pub struct LoadOrchestrator<M>
where
    M: RowMapper,
{
    mapper: M,
    batch: BatchSubmitter,
    reporter: ResultReporter,
    submitter: Arc<dyn Submitter>,
}

impl<M> LoadOrchestrator<M>
where
    M: RowMapper,
{
    pub fn new(
        mapper: M,
        batch: BatchSubmitter,
        reporter: ResultReporter,
        submitter: Arc<dyn Submitter>,
    ) -> Self {
        Self {
            mapper,
            batch,
            reporter,
            submitter,
        }
    }

    /// 处理单个文件(主入口)
    ///
    /// # 流程
    /// 1. 读取并校验表头(缺必需列 → 文件级失败)
    /// 2. 逐行映射,失败行进映射错误桶
    /// 3. 批量提交(dry_run 时跳过,全部按成功归档且无远端ID)
    /// 4. 分桶落盘 + 汇总
    pub async fn run_file<P: AsRef<Path>>(
        &self,
        file_path: P,
        cache: &CatalogCache,
        dry_run: bool,
    ) -> Result<LoadReport, PipelineError> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let source_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let source_stem = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        info!(run_id = %run_id, file = %source_file, mapper = self.mapper.name(), "开始处理文件");

        // === 步骤 1: 读取与表头校验 ===
        let sheets = SheetReader::read_file(path, self.mapper.required_columns())?;

        // === 步骤 2: 逐行映射 ===
        let mut outcomes: Vec<RowOutcome> = Vec::new();
        let mut pending: Vec<(Payload, RawRow)> = Vec::new();

        for sheet in &sheets {
            let sheet_label = sheet.sheet_name.as_deref().unwrap_or("-");
            let mut mapped = 0usize;
            let mut failed = 0usize;

            for row in &sheet.rows {
                // 尾随空白行不计入任何桶
                if row.is_blank() {
                    continue;
                }

                match self.mapper.map(row, cache) {
                    Ok(payload) => {
                        mapped += 1;
                        pending.push((payload, row.clone()));
                    }
                    Err(err) => {
                        failed += 1;
                        warn!(row = row.row_number, sheet = sheet_label, error = %err, "行映射失败");
                        outcomes.push(RowOutcome::MappingError {
                            row: row.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
            }

            info!(sheet = sheet_label, mapped, mapping_errors = failed, "工作表映射完成");
        }

        // === 步骤 3: 提交 ===
        if dry_run {
            info!(rows = pending.len(), "试运行模式,跳过提交");
            outcomes.extend(pending.into_iter().map(|(payload, row)| {
                RowOutcome::Processed {
                    row,
                    payload,
                    api_id: None,
                }
            }));
        } else {
            outcomes.extend(
                self.batch
                    .submit_all(self.submitter.as_ref(), pending)
                    .await,
            );
        }

        // === 步骤 4: 分桶报告 ===
        let artifacts = self.reporter.write_artifacts(&source_stem, &outcomes)?;
        let summary = LoadSummary::from_outcomes(&outcomes);
        let elapsed = start_time.elapsed();

        info!(
            run_id = %run_id,
            total = summary.total_rows,
            processed = summary.processed,
            mapping_errors = summary.mapping_errors,
            submission_errors = summary.submission_errors,
            elapsed_ms = elapsed.as_millis() as u64,
            "文件处理完成"
        );

        Ok(LoadReport {
            run_id,
            source_file,
            summary,
            processed_artifact: artifacts.processed,
            mapping_error_artifact: artifacts.mapping_error,
            submission_error_artifact: artifacts.submission_error,
            elapsed,
        })
    }
}
