// ==========================================
// 车队批量导入系统 - 行映射器
// ==========================================
// 职责: 每个来源表格族一个映射器(规范化 + 解析 + 对账 + 组装载荷)
// 红线: 映射为纯函数,目录缓存只读,失败只影响本行
// ==========================================

use crate::catalog::CatalogCache;
use crate::domain::{EntityKind, Payload, RawRow};
use crate::engine::error::RowResult;

pub mod fuel_card;
pub mod insurance;
pub mod reminder;
pub mod scheduled_expense;

pub use fuel_card::FuelCardMapper;
pub use insurance::InsuranceMapper;
pub use reminder::ReminderMapper;
pub use scheduled_expense::ScheduledExpenseMapper;

// ==========================================
// RowMapper - 行映射能力
// ==========================================
pub trait RowMapper: Send + Sync {
    /// 映射器名(日志与产物命名)
    fn name(&self) -> &'static str;

    /// 必需表头集合(缺列 → 整个文件快速失败)
    fn required_columns(&self) -> &'static [&'static str];

    /// 映射所需的目录种类(运行前一次性加载)
    fn catalog_kinds(&self) -> &'static [EntityKind];

    /// 单行映射: 规范化 → 实体解析 → 对账 → 载荷
    fn map(&self, row: &RawRow, cache: &CatalogCache) -> RowResult<Payload>;
}

// 入口按运行参数动态选择映射器
impl RowMapper for Box<dyn RowMapper> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn required_columns(&self) -> &'static [&'static str] {
        (**self).required_columns()
    }

    fn catalog_kinds(&self) -> &'static [EntityKind] {
        (**self).catalog_kinds()
    }

    fn map(&self, row: &RawRow, cache: &CatalogCache) -> RowResult<Payload> {
        (**self).map(row, cache)
    }
}
