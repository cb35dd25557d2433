// ==========================================
// 车队批量导入系统 - 表格读取层
// ==========================================
// 职责: CSV/Excel → RawRow(含表头校验)
// 支持: .csv / .xls / .xlsx,Excel 多工作表
// 红线: 必需列缺失 → 整个文件快速失败,不进入行处理
// ==========================================

use crate::domain::row::{CellValue, RawRow};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

// ==========================================
// ReadError - 读取层错误类型(文件级致命)
// ==========================================
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}(仅支持 .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("必需列缺失 ({location}): {columns:?}")]
    MissingColumns {
        location: String,
        columns: Vec<String>,
    },
}

impl From<std::io::Error> for ReadError {
    fn from(err: std::io::Error) -> Self {
        ReadError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ReadError {
    fn from(err: csv::Error) -> Self {
        ReadError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ReadError {
    fn from(err: calamine::Error) -> Self {
        ReadError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ReadResult<T> = Result<T, ReadError>;

// ==========================================
// SheetData - 一张工作表的读取结果
// ==========================================
#[derive(Debug)]
pub struct SheetData {
    pub sheet_name: Option<String>,
    pub rows: Vec<RawRow>,
}

// ==========================================
// SheetReader - 通用表格读取器(按扩展名自动选择)
// ==========================================
pub struct SheetReader;

impl SheetReader {
    /// 读取整个文件并校验必需列
    ///
    /// # 返回
    /// - CSV: 单个 SheetData(sheet_name = None)
    /// - Excel: 每个非空工作表一个 SheetData
    ///
    /// # 失败
    /// - 任一非空工作表缺必需列 → MissingColumns(文件级)
    pub fn read_file<P: AsRef<Path>>(
        file_path: P,
        required_columns: &[&str],
    ) -> ReadResult<Vec<SheetData>> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ReadError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(vec![Self::read_csv(path, required_columns)?]),
            "xlsx" | "xls" => Self::read_excel(path, required_columns),
            _ => Err(ReadError::UnsupportedFormat(ext)),
        }
    }

    fn read_csv(path: &Path, required_columns: &[&str]) -> ReadResult<SheetData> {
        let source_file = Arc::new(file_name_of(path));
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let columns: Arc<Vec<String>> = Arc::new(
            reader
                .headers()?
                .iter()
                .map(|h| h.trim().to_string())
                .collect(),
        );
        validate_columns(&columns, required_columns, &file_name_of(path))?;

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut cells: Vec<CellValue> = record
                .iter()
                .map(CellValue::from_raw_str)
                .collect();
            cells.resize(columns.len(), CellValue::Empty);

            rows.push(RawRow {
                source_file: source_file.clone(),
                sheet_name: None,
                columns: columns.clone(),
                cells,
                row_number: row_idx + 2, // +2: 1基行号且跳过表头
            });
        }

        debug!(file = %source_file, rows = rows.len(), "CSV 读取完成");
        Ok(SheetData {
            sheet_name: None,
            rows,
        })
    }

    fn read_excel(path: &Path, required_columns: &[&str]) -> ReadResult<Vec<SheetData>> {
        let source_file = Arc::new(file_name_of(path));
        let mut workbook = open_workbook_auto(path)?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::new();

        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name)?;
            let mut range_rows = range.rows();

            // 无表头的空工作表直接跳过
            let Some(header_row) = range_rows.next() else {
                debug!(sheet = %sheet_name, "空工作表,跳过");
                continue;
            };

            let columns: Arc<Vec<String>> = Arc::new(
                header_row
                    .iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect(),
            );
            let location = format!("{} / {}", source_file, sheet_name);
            validate_columns(&columns, required_columns, &location)?;

            let sheet_arc = Arc::new(sheet_name.clone());
            let mut rows = Vec::new();
            for (row_idx, data_row) in range_rows.enumerate() {
                let mut cells: Vec<CellValue> =
                    data_row.iter().map(excel_cell_to_value).collect();
                cells.resize(columns.len(), CellValue::Empty);

                rows.push(RawRow {
                    source_file: source_file.clone(),
                    sheet_name: Some(sheet_arc.clone()),
                    columns: columns.clone(),
                    cells,
                    row_number: row_idx + 2,
                });
            }

            debug!(sheet = %sheet_name, rows = rows.len(), "工作表读取完成");
            sheets.push(SheetData {
                sheet_name: Some(sheet_name),
                rows,
            });
        }

        Ok(sheets)
    }
}

fn validate_columns(
    columns: &[String],
    required_columns: &[&str],
    location: &str,
) -> ReadResult<()> {
    let missing: Vec<String> = required_columns
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReadError::MissingColumns {
            location: location.to_string(),
            columns: missing,
        })
    }
}

fn excel_cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_raw_str(s),
        Data::Float(f) => CellValue::from_raw_number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from_raw_str(s),
        Data::Error(_) => CellValue::Empty,
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
