// ==========================================
// 车队批量导入系统 - 领域类型定义
// ==========================================
// 职责: 枚举类型与序列化口径
// 红线: 序列化格式与远端API字段口径一致,不得私自改名
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 实体目录种类 (Entity Kind)
// ==========================================
// 用途: 目录缓存按种类拉取与索引
// 前四类走 skip/take 分页端点, 后两类走类型化目录端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Vehicles,
    Drivers,
    Suppliers,
    PaymentMethods,
    ExpenseTypes,
    FuelTypes,
    InsuranceTypes,
}

impl EntityKind {
    /// 类型化目录的远端标识(非类型化目录返回 None)
    pub fn catalog_slug(&self) -> Option<&'static str> {
        match self {
            EntityKind::ExpenseTypes => Some("EXPENSES-TYPES"),
            EntityKind::FuelTypes => Some("FUEL-TYPES-OF-FUELS"),
            EntityKind::InsuranceTypes => Some("INSURANCE-TYPES"),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Vehicles => write!(f, "VEHICLES"),
            EntityKind::Drivers => write!(f, "DRIVERS"),
            EntityKind::Suppliers => write!(f, "SUPPLIERS"),
            EntityKind::PaymentMethods => write!(f, "PAYMENT_METHODS"),
            EntityKind::ExpenseTypes => write!(f, "EXPENSE_TYPES"),
            EntityKind::FuelTypes => write!(f, "FUEL_TYPES"),
            EntityKind::InsuranceTypes => write!(f, "INSURANCE_TYPES"),
        }
    }
}

// ==========================================
// 金额口径 (Amount Kind)
// ==========================================
// 用途: 税与折扣共用的口径标记(百分比 / 货币金额)
// 序列化格式: 与API的 taxType/discountType 字段一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmountKind {
    Percentage,
    Currency,
}

impl fmt::Display for AmountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountKind::Percentage => write!(f, "PERCENTAGE"),
            AmountKind::Currency => write!(f, "CURRENCY"),
        }
    }
}

// ==========================================
// 周期频率 (Frequency)
// ==========================================
// 用途: 周期性支出 / 保险付款频率
// 序列化格式: 小写(API的 frecuency 字段口径)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Day,
    Week,
    Month,
    Year,
}

impl Frequency {
    /// 从源表格的西班牙语取值解析(大小写与前后空白不敏感)
    pub fn parse(value: &str) -> Option<Frequency> {
        match value.trim().to_lowercase().as_str() {
            "día" | "dia" | "diario" | "day" => Some(Frequency::Day),
            "semana" | "semanal" | "week" => Some(Frequency::Week),
            "mes" | "mensual" | "month" => Some(Frequency::Month),
            "año" | "ano" | "anual" | "year" => Some(Frequency::Year),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Day => write!(f, "day"),
            Frequency::Week => write!(f, "week"),
            Frequency::Month => write!(f, "month"),
            Frequency::Year => write!(f, "year"),
        }
    }
}

// ==========================================
// 提醒优先级 (Reminder Priority)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPriority {
    High,
    Medium,
    Low,
}

impl ReminderPriority {
    pub fn parse(value: &str) -> Option<ReminderPriority> {
        match value.trim().to_lowercase().as_str() {
            "alta" | "high" => Some(ReminderPriority::High),
            "media" | "medium" => Some(ReminderPriority::Medium),
            "baja" | "low" => Some(ReminderPriority::Low),
            _ => None,
        }
    }
}

// ==========================================
// 提醒目标实体 (Reminder Entity Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderEntityType {
    Drivers,
    Vehicles,
}

impl ReminderEntityType {
    pub fn parse(value: &str) -> Option<ReminderEntityType> {
        match value.trim().to_lowercase().as_str() {
            "conductores" | "drivers" => Some(ReminderEntityType::Drivers),
            "vehículos" | "vehiculos" | "vehicles" => Some(ReminderEntityType::Vehicles),
            _ => None,
        }
    }
}

// ==========================================
// 通知时间单位 (Notification Unit)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationUnit {
    Minutes,
    Hours,
    Days,
}

impl NotificationUnit {
    pub fn parse(value: &str) -> Option<NotificationUnit> {
        match value.trim().to_lowercase().as_str() {
            "minutos" | "minutes" => Some(NotificationUnit::Minutes),
            "horas" | "hours" => Some(NotificationUnit::Hours),
            "días" | "dias" | "days" => Some(NotificationUnit::Days),
            _ => None,
        }
    }
}
