// ==========================================
// 车队批量导入系统 - BatchSubmitter 集成测试
// ==========================================
// 覆盖: 批量化(屏障+定速)、单行失败隔离、结果顺序
// ==========================================

use async_trait::async_trait;
use fleet_loader::client::{ApiError, SubmitResponse};
use fleet_loader::domain::{
    AmountKind, CellValue, ExpensePayload, Payload, RawRow, RowOutcome,
};
use fleet_loader::engine::{BatchSubmitter, Submitter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

// ==========================================
// 测试辅助: 载荷与原始行
// ==========================================

fn expense_payload(name: &str) -> Payload {
    Payload::Expense(ExpensePayload {
        name: name.to_string(),
        subtotal: 100.0,
        tax_type: AmountKind::Percentage,
        tax: 21.0,
        discount_type: AmountKind::Currency,
        discount: 0.0,
        total: 121.0,
        date: "2024-01-15T09:00:00.000Z".to_string(),
        expense_type_id: 1,
        vehicle_id: 1,
        driver_id: None,
        supplier_id: None,
        payment_method_id: None,
        odometer: None,
        custom_fields_metadata: None,
    })
}

fn raw_row(row_number: usize) -> RawRow {
    RawRow {
        source_file: Arc::new("lote.csv".to_string()),
        sheet_name: None,
        columns: Arc::new(vec!["Nombre".to_string()]),
        cells: vec![CellValue::Text(format!("fila-{}", row_number))],
        row_number,
    }
}

fn pending_rows(count: usize) -> Vec<(Payload, RawRow)> {
    (0..count)
        .map(|idx| (expense_payload(&format!("gasto-{}", idx)), raw_row(idx + 2)))
        .collect()
}

// ==========================================
// RecordingSubmitter - 记录每次调用的虚拟时刻
// ==========================================
struct RecordingSubmitter {
    start: tokio::time::Instant,
    calls: Mutex<Vec<u64>>, // 调用发起时刻(虚拟毫秒)
}

impl RecordingSubmitter {
    fn new() -> Self {
        Self {
            start: tokio::time::Instant::now(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Submitter for RecordingSubmitter {
    async fn send(&self, _payload: &Payload) -> Result<SubmitResponse, ApiError> {
        self.calls
            .lock()
            .await
            .push(self.start.elapsed().as_millis() as u64);
        // 模拟网络耗时
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(SubmitResponse { id: Some(1) })
    }
}

// ==========================================
// FlakySubmitter - 指定名称的载荷失败
// ==========================================
struct FlakySubmitter {
    failing_name: String,
}

#[async_trait]
impl Submitter for FlakySubmitter {
    async fn send(&self, payload: &Payload) -> Result<SubmitResponse, ApiError> {
        let name = match payload {
            Payload::Expense(expense) => expense.name.clone(),
            _ => String::new(),
        };
        if name == self.failing_name {
            Err(ApiError::Status {
                status: 422,
                body: "validación fallida".to_string(),
            })
        } else {
            Ok(SubmitResponse { id: Some(777) })
        }
    }
}

// ==========================================
// 测试用例
// ==========================================

#[tokio::test(start_paused = true)]
async fn test_twelve_payloads_concurrency_five_run_in_three_batches() {
    // === 准备 ===
    let submitter = RecordingSubmitter::new();
    let batch = BatchSubmitter::new(5, Duration::from_secs(1));

    // === 执行 ===
    let outcomes = batch.submit_all(&submitter, pending_rows(12)).await;

    // === 验证 ===
    assert_eq!(outcomes.len(), 12, "应返回全部12行的终态");
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, RowOutcome::Processed { .. })));

    // 同批调用在同一虚拟时刻发起;批间隔 = 网络耗时 + 定速休眠
    let calls = submitter.calls.lock().await;
    let mut batch_starts: Vec<u64> = calls.clone();
    batch_starts.dedup();
    assert_eq!(batch_starts.len(), 3, "12行/并发5 应切成3批 (5,5,2)");

    let batch_sizes: Vec<usize> = batch_starts
        .iter()
        .map(|start| calls.iter().filter(|c| *c == start).count())
        .collect();
    assert_eq!(batch_sizes, vec![5, 5, 2]);

    // 批间至少包含1秒定速休眠
    assert!(batch_starts[1] - batch_starts[0] >= 1000);
    assert!(batch_starts[2] - batch_starts[1] >= 1000);
}

#[tokio::test]
async fn test_single_failure_does_not_affect_siblings() {
    // === 准备: 第二行注定失败 ===
    let submitter = FlakySubmitter {
        failing_name: "gasto-1".to_string(),
    };
    let batch = BatchSubmitter::new(5, Duration::from_millis(0));

    // === 执行 ===
    let outcomes = batch.submit_all(&submitter, pending_rows(5)).await;

    // === 验证: 仅失败行进入提交错误桶,其余照常 ===
    assert_eq!(outcomes.len(), 5);
    for (idx, outcome) in outcomes.iter().enumerate() {
        if idx == 1 {
            match outcome {
                RowOutcome::SubmissionError { reason, row, .. } => {
                    assert!(reason.contains("422"), "失败原因应携带HTTP状态: {}", reason);
                    assert_eq!(row.row_number, 3);
                }
                other => panic!("第2行期望 SubmissionError, 得到 {:?}", bucket_name(other)),
            }
        } else {
            assert!(
                matches!(outcome, RowOutcome::Processed { api_id: Some(777), .. }),
                "第{}行应提交成功",
                idx + 1
            );
        }
    }
}

#[tokio::test]
async fn test_outcome_order_matches_input_order() {
    let submitter = FlakySubmitter {
        failing_name: "no-existe".to_string(),
    };
    let batch = BatchSubmitter::new(2, Duration::from_millis(0));

    let outcomes = batch.submit_all(&submitter, pending_rows(7)).await;

    let row_numbers: Vec<usize> = outcomes.iter().map(|o| o.row().row_number).collect();
    assert_eq!(row_numbers, vec![2, 3, 4, 5, 6, 7, 8]);
}

#[tokio::test]
async fn test_empty_input_is_noop() {
    let submitter = RecordingSubmitter::new();
    let batch = BatchSubmitter::new(5, Duration::from_secs(1));

    let outcomes = batch.submit_all(&submitter, Vec::new()).await;

    assert!(outcomes.is_empty());
    assert!(submitter.calls.lock().await.is_empty());
}

fn bucket_name(outcome: &RowOutcome) -> &'static str {
    match outcome {
        RowOutcome::Processed { .. } => "Processed",
        RowOutcome::MappingError { .. } => "MappingError",
        RowOutcome::SubmissionError { .. } => "SubmissionError",
    }
}
