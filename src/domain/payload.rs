// ==========================================
// 车队批量导入系统 - 提交载荷模型
// ==========================================
// 职责: 按目标实体定义类型化的API载荷
// 红线: 字段名与远端API一致(camelCase),构造即有效
// 红线: 仅燃油/普通支出这一真实类型分支使用带标签联合
// ==========================================

use crate::domain::types::{
    AmountKind, Frequency, NotificationUnit, ReminderEntityType, ReminderPriority,
};
use serde::Serialize;

// ==========================================
// ExpensePayload - 普通支出
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    pub name: String,
    pub subtotal: f64,
    pub tax_type: AmountKind,
    pub tax: f64,
    pub discount_type: AmountKind,
    pub discount: f64,
    pub total: f64,
    pub date: String, // UTC ISO-8601, 毫秒精度
    pub expense_type_id: i64,
    pub vehicle_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields_metadata: Option<String>, // JSON 字符串(API口径)
}

// ==========================================
// FuelPayload - 燃油操作
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelPayload {
    pub volume: f64,
    pub price_per_unit: f64,
    pub tax_type: AmountKind,
    pub tax: f64,
    pub discount_type: AmountKind,
    pub discount: f64,
    pub total: f64,
    pub date: String,
    pub fuel_type_id: i64,
    pub vehicle_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields_metadata: Option<String>,
}

// ==========================================
// ScheduledExpensePayload - 周期性支出
// ==========================================
// 注: frecuency 的拼写沿用远端API字段
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledExpensePayload {
    pub name: String,
    pub expense_type_id: i64,
    pub subtotal: f64,
    pub tax_type: AmountKind,
    pub tax: f64,
    pub discount_type: AmountKind,
    pub discount: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_id: Option<i64>,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub frecuency: Frequency,
}

// ==========================================
// ReminderPayload - 任务提醒
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderNotification {
    pub type_id: String, // "email" | "push"
    pub amount: i64,
    pub unit: NotificationUnit,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub limit_date: String,
    pub priority_id: ReminderPriority,
    pub notifications: Vec<ReminderNotification>,
    pub user_ids: Vec<i64>,
    pub entity_type: ReminderEntityType,
    pub entity_id: i64,
    pub responsible_id: i64,
}

// ==========================================
// VehiclePropertiesPayload - 车辆属性更新(保险字段)
// ==========================================
// vehicle_id 只用于路由(PUT /vehicles/{id}/properties),不进请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePropertiesPayload {
    #[serde(skip)]
    pub vehicle_id: i64,
    pub insurance_policy_number: String,
    pub insurance_supplier_id: i64,
    pub insurance_start_date: String,
    pub insurance_end_date: String,
    pub insurance_subtotal: f64,
    pub insurance_tax_type: AmountKind,
    pub insurance_tax: f64,
    pub insurance_total_amount: f64,
    pub insurance_type_id: i64,
    pub insurance_payment_frequency: Frequency,
    pub create_insurance_scheduled_expense: bool,
}

// ==========================================
// Payload - 提交载荷联合
// ==========================================
// 提交器按变体路由到对应端点
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Expense(ExpensePayload),
    Fuel(FuelPayload),
    ScheduledExpense(ScheduledExpensePayload),
    Reminder(ReminderPayload),
    VehicleProperties(VehiclePropertiesPayload),
}

impl Payload {
    /// 载荷种类名(日志与报表用)
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Expense(_) => "expense",
            Payload::Fuel(_) => "fuel",
            Payload::ScheduledExpense(_) => "scheduled-expense",
            Payload::Reminder(_) => "reminder",
            Payload::VehicleProperties(_) => "vehicle-properties",
        }
    }
}
