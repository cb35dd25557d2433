// ==========================================
// 车队批量导入系统 - 行数据模型
// ==========================================
// 职责: 表格单元格与原始行的内存表示
// 红线: RawRow 读入后不再修改,报表阶段原样回写
// ==========================================

use chrono::NaiveDateTime;
use std::fmt;
use std::sync::Arc;

// ==========================================
// CellValue - 单元格值
// ==========================================
// 统一缺失口径: 空串/纯空白/NaN 一律收敛为 Empty
// 不在此层做业务解析,只做类型承载
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// 从原始字符串构造(trim 后为空 → Empty)
    pub fn from_raw_str(raw: &str) -> CellValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    /// 从浮点构造(NaN → Empty)
    pub fn from_raw_number(value: f64) -> CellValue {
        if value.is_nan() {
            CellValue::Empty
        } else {
            CellValue::Number(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// 报表回写用的字符串形式(Empty → 空串)
    pub fn to_display_string(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// ==========================================
// RawRow - 原始表格行
// ==========================================
// 列名通过 Arc 在全表共享,行只持有单元格
// row_number 为表格中的1基行号(含表头偏移),用于报表定位
#[derive(Debug, Clone)]
pub struct RawRow {
    pub source_file: Arc<String>,     // 来源文件名
    pub sheet_name: Option<Arc<String>>, // 来源工作表(CSV 无)
    pub columns: Arc<Vec<String>>,    // 表头(全表共享)
    pub cells: Vec<CellValue>,        // 与 columns 等长
    pub row_number: usize,            // 表格1基行号
}

impl RawRow {
    /// 按列名取单元格,列不存在视同 Empty
    pub fn get(&self, column: &str) -> &CellValue {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.cells.get(idx))
            .unwrap_or(&CellValue::Empty)
    }

    /// 整行是否为空(全部单元格 Empty)
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> RawRow {
        RawRow {
            source_file: Arc::new("test.csv".to_string()),
            sheet_name: None,
            columns: Arc::new(vec!["Matricula".to_string(), "Total".to_string()]),
            cells: vec![CellValue::Text("1234-ABC".to_string()), CellValue::Number(10.5)],
            row_number: 2,
        }
    }

    #[test]
    fn test_cell_from_raw_str_whitespace_is_empty() {
        assert_eq!(CellValue::from_raw_str("   "), CellValue::Empty);
        assert_eq!(CellValue::from_raw_str(""), CellValue::Empty);
        assert_eq!(
            CellValue::from_raw_str(" x "),
            CellValue::Text("x".to_string())
        );
    }

    #[test]
    fn test_cell_from_raw_number_nan_is_empty() {
        assert_eq!(CellValue::from_raw_number(f64::NAN), CellValue::Empty);
        assert_eq!(CellValue::from_raw_number(1.25), CellValue::Number(1.25));
    }

    #[test]
    fn test_row_get_missing_column_is_empty() {
        let row = sample_row();
        assert_eq!(*row.get("NoExiste"), CellValue::Empty);
        assert_eq!(
            *row.get("Matricula"),
            CellValue::Text("1234-ABC".to_string())
        );
    }

    #[test]
    fn test_row_is_blank() {
        let mut row = sample_row();
        assert!(!row.is_blank());
        row.cells = vec![CellValue::Empty, CellValue::Empty];
        assert!(row.is_blank());
    }
}
