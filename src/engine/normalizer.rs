// ==========================================
// 车队批量导入系统 - 行规范化引擎
// ==========================================
// 职责: 单元格 → 规范标量(文本/小数/日期/布尔)
// 缺失口径: 空串/纯空白/NaN 统一视为缺失,绝不默认为零
// 日期口径: 来源系统为 Europe/Madrid 民用时间,统一转 UTC
//           输出 ISO-8601 毫秒精度 + 'Z'
// 红线: 纯内存计算,无I/O
// ==========================================

use crate::domain::row::{CellValue, RawRow};
use crate::engine::error::{RowError, RowResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::Madrid;
use chrono_tz::Tz;

/// 来源系统的民用时区
pub const SOURCE_TIMEZONE: Tz = Madrid;

// ==========================================
// 文本
// ==========================================

/// 可选文本字段(trim 后为空 → None;数值/布尔单元格转字符串)
pub fn opt_text(row: &RawRow, column: &str) -> Option<String> {
    cell_to_text(row.get(column))
}

/// 必填文本字段
pub fn req_text(row: &RawRow, column: &str) -> RowResult<String> {
    opt_text(row, column).ok_or_else(|| RowError::MissingField {
        field: column.to_string(),
    })
}

fn cell_to_text(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty => None,
        other => {
            let text = other.to_display_string();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

// ==========================================
// 小数
// ==========================================

/// 可选小数字段(解析失败 → None,不默认为零)
pub fn opt_decimal(row: &RawRow, column: &str) -> Option<f64> {
    match row.get(column) {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => parse_decimal_str(s),
        _ => None,
    }
}

/// 必填小数字段(缺失与不可解析分别报错)
pub fn req_decimal(row: &RawRow, column: &str) -> RowResult<f64> {
    match row.get(column) {
        CellValue::Empty => Err(RowError::MissingField {
            field: column.to_string(),
        }),
        CellValue::Number(n) => Ok(*n),
        CellValue::Text(s) => parse_decimal_str(s).ok_or_else(|| RowError::InvalidValue {
            field: column.to_string(),
            message: format!("无法解析为数值: {}", s),
        }),
        other => Err(RowError::InvalidValue {
            field: column.to_string(),
            message: format!("无法解析为数值: {}", other),
        }),
    }
}

/// 带默认值零的小数字段
///
/// 仅用于税/折扣这类口径上允许留空表示零的列(调用方的文档化默认)。
pub fn decimal_or_zero(row: &RawRow, column: &str) -> f64 {
    opt_decimal(row, column).unwrap_or(0.0)
}

/// 解析带货币符号与千分位分隔符的数值文本
///
/// 规则:
/// - 去除 €/$/空格
/// - '.' 与 ',' 同时出现时,靠后者为小数点,另一个为千分位
/// - 只出现一种分隔符且出现多次时视为千分位
/// - 单个 ',' 视为小数点(来源为西语区表格)
pub fn parse_decimal_str(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | ' ' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            let (decimal, thousands) = if dot > comma { ('.', ',') } else { (',', '.') };
            cleaned
                .chars()
                .filter(|&c| c != thousands)
                .map(|c| if c == decimal { '.' } else { c })
                .collect::<String>()
        }
        (None, Some(_)) => {
            if cleaned.matches(',').count() > 1 {
                cleaned.replace(',', "")
            } else {
                cleaned.replace(',', ".")
            }
        }
        (Some(_), None) => {
            if cleaned.matches('.').count() > 1 {
                cleaned.replace('.', "")
            } else {
                cleaned
            }
        }
        (None, None) => cleaned,
    };

    normalized.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

// ==========================================
// 布尔
// ==========================================

/// 可选布尔字段(西语真值口径: si/sí/s/1/true/yes/y)
pub fn opt_bool(row: &RawRow, column: &str) -> Option<bool> {
    match row.get(column) {
        CellValue::Bool(b) => Some(*b),
        CellValue::Number(n) => Some(*n != 0.0),
        CellValue::Text(s) => Some(matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "1" | "si" | "sí" | "s" | "yes" | "y"
        )),
        _ => None,
    }
}

// ==========================================
// 日期时间
// ==========================================

// 已解析的时间戳: 来源即UTC(幂等路径)或民用时间(待换算)
enum ParsedStamp {
    Utc(DateTime<Utc>),
    Civil(NaiveDateTime),
}

/// 可选日期字段 → UTC ISO-8601(毫秒 + 'Z')
pub fn opt_utc_date(
    row: &RawRow,
    date_column: &str,
    time_column: Option<&str>,
) -> RowResult<Option<String>> {
    if row.get(date_column).is_empty() {
        return Ok(None);
    }
    req_utc_date(row, date_column, time_column).map(Some)
}

/// 必填日期字段 → UTC ISO-8601(毫秒 + 'Z')
///
/// # 口径
/// - 接受 DD/MM/YYYY、YYYY-MM-DD、YYYYMMDD 与表格原生日期单元格
/// - 已是 UTC ISO-8601 的文本原样换算(幂等)
/// - 可选时间列: HH:MM、HHMM 或原生时间单元格;缺省为 00:00
/// - 民用时间按 Europe/Madrid 含夏令时规则换算 UTC
pub fn req_utc_date(
    row: &RawRow,
    date_column: &str,
    time_column: Option<&str>,
) -> RowResult<String> {
    let stamp = parse_date_cell(row.get(date_column), date_column)?;

    let stamp = match (stamp, time_column) {
        (ParsedStamp::Civil(civil), Some(col)) => {
            let time = parse_time_cell(row.get(col), col)?;
            ParsedStamp::Civil(civil.date().and_time(time.unwrap_or(civil.time())))
        }
        (stamp, _) => stamp,
    };

    let utc = match stamp {
        ParsedStamp::Utc(instant) => instant,
        ParsedStamp::Civil(civil) => civil_to_utc(civil, date_column)?,
    };

    Ok(format_utc_iso(&utc))
}

fn parse_date_cell(cell: &CellValue, field: &str) -> RowResult<ParsedStamp> {
    match cell {
        CellValue::Empty => Err(RowError::MissingField {
            field: field.to_string(),
        }),
        CellValue::DateTime(dt) => Ok(ParsedStamp::Civil(*dt)),
        CellValue::Text(s) => parse_date_str(s.trim(), field),
        CellValue::Number(n) => {
            // 数值单元格按 YYYYMMDD 紧凑日期处理(燃油卡对账单口径)
            parse_date_str(&format!("{}", *n as i64), field)
        }
        other => Err(RowError::InvalidValue {
            field: field.to_string(),
            message: format!("无法解析为日期: {}", other),
        }),
    }
}

fn parse_date_str(raw: &str, field: &str) -> RowResult<ParsedStamp> {
    // 幂等路径: 已是UTC时间戳的文本
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ParsedStamp::Utc(instant.with_timezone(&Utc)));
    }

    for format in ["%d/%m/%Y", "%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(ParsedStamp::Civil(
                date.and_time(NaiveTime::from_hms_opt(0, 0, 0).expect("00:00 有效")),
            ));
        }
    }

    Err(RowError::InvalidValue {
        field: field.to_string(),
        message: format!("无法解析为日期: {}", raw),
    })
}

fn parse_time_cell(cell: &CellValue, field: &str) -> RowResult<Option<NaiveTime>> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::DateTime(dt) => Ok(Some(dt.time())),
        CellValue::Text(s) => parse_time_str(s.trim(), field).map(Some),
        CellValue::Number(n) => {
            // 数值单元格按 HMM/HHMM 紧凑时刻处理
            let compact = format!("{:04}", *n as i64);
            parse_time_str(&compact, field).map(Some)
        }
        other => Err(RowError::InvalidValue {
            field: field.to_string(),
            message: format!("无法解析为时刻: {}", other),
        }),
    }
}

fn parse_time_str(raw: &str, field: &str) -> RowResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H%M"))
        .map_err(|_| RowError::InvalidValue {
            field: field.to_string(),
            message: format!("无法解析为时刻: {}", raw),
        })
}

/// 民用时间 → UTC
///
/// 夏令时二义时间取较早偏移;不存在的时间(春季跳变)为行级错误。
fn civil_to_utc(civil: NaiveDateTime, field: &str) -> RowResult<DateTime<Utc>> {
    match SOURCE_TIMEZONE.from_local_datetime(&civil) {
        chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        chrono::LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        chrono::LocalResult::None => Err(RowError::InvalidValue {
            field: field.to_string(),
            message: format!("民用时间在 {} 不存在(夏令时跳变): {}", SOURCE_TIMEZONE, civil),
        }),
    }
}

fn format_utc_iso(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
