// ==========================================
// 车队批量导入系统 - 目录条目模型
// ==========================================
// 用途: 目录缓存的最小统一条目(车辆/司机/供应商/支付方式/类型化目录)
// 红线: 拉取后不可变,生命周期 = 一次运行
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CatalogEntry - 目录条目
// ==========================================
// 二级键口径:
// - 车辆: 规范化车牌(去标点,大写)
// - 司机: 邮箱(小写)
// - 支付方式: slug
// - 类型化目录: referenceCode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,                       // 远端主键
    pub name: String,                  // 显示名称(一级键)
    pub secondary_key: Option<String>, // 二级键(种类相关,已规范化)
}

impl CatalogEntry {
    pub fn new(id: i64, name: impl Into<String>, secondary_key: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            secondary_key,
        }
    }
}

/// 车牌规范化: 去除所有非字母数字字符并转大写
///
/// 源数据中同一车牌会以 "1234-ABC" / "1234 ABC" / "1234abc" 等形式出现,
/// 统一后才能作为二级键精确比对。
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}
