// ==========================================
// 车队批量导入系统 - 财务对账引擎
// ==========================================
// 职责: 由分量重算总额并与申报值核对
// 容差: 1e-4 绝对值
// 红线: 两种对账口径是显式独立操作,不得合并 --
//       net 口径以 subtotal 为基准真值, gross 口径以含税金额为基准真值
// ==========================================

use crate::domain::types::AmountKind;
use crate::engine::error::{RowError, RowResult};
use serde::Serialize;

/// 对账绝对容差
pub const RECONCILE_EPSILON: f64 = 1e-4;

// ==========================================
// ReconciledAmounts - net 口径对账结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledAmounts {
    pub subtotal: f64,
    pub tax_kind: AmountKind,
    pub tax: f64,
    pub discount_kind: AmountKind,
    pub discount: f64,
    pub total: f64,
}

// ==========================================
// GrossReconciliation - gross 口径对账结果
// ==========================================
// 含税金额反推: subtotal 与税额为派生量,折扣为两含税申报值的残差
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrossReconciliation {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub discount_percentage: f64,
    pub tax_amount: f64,
    pub total: f64,
}

/// net 口径对账
///
/// # 算法
/// - discount_amount = PERCENTAGE ? discount/100*subtotal : discount
/// - after_discount  = subtotal - discount_amount
/// - tax_amount      = PERCENTAGE ? tax/100*after_discount : tax
/// - computed        = after_discount + tax_amount
///
/// # 失败
/// |computed - declared_total| > 1e-4 → Reconciliation(行级)
pub fn reconcile_net(
    subtotal: f64,
    tax_kind: AmountKind,
    tax: f64,
    discount_kind: AmountKind,
    discount: f64,
    declared_total: f64,
) -> RowResult<ReconciledAmounts> {
    let discount_amount = match discount_kind {
        AmountKind::Percentage => discount / 100.0 * subtotal,
        AmountKind::Currency => discount,
    };
    let after_discount = subtotal - discount_amount;

    let tax_amount = match tax_kind {
        AmountKind::Percentage => tax / 100.0 * after_discount,
        AmountKind::Currency => tax,
    };
    let computed = after_discount + tax_amount;

    if (computed - declared_total).abs() > RECONCILE_EPSILON {
        return Err(RowError::Reconciliation {
            computed,
            declared: declared_total,
            detail: format!(
                "subtotal={}, tax={}({}) , discount={}({})",
                subtotal, tax, tax_kind, discount, discount_kind
            ),
        });
    }

    Ok(ReconciledAmounts {
        subtotal,
        tax_kind,
        tax,
        discount_kind,
        discount,
        total: declared_total,
    })
}

/// gross 口径对账(含税金额反推)
///
/// # 算法
/// - subtotal = gross / (1 + tax_pct/100)
/// - |gross| > |gross_total| 时两申报值的残差视为折扣:
///   discount_amount = (gross_total - gross) / (1 + tax_pct/100)
///   discount_percentage = (gross - gross_total) / |gross| * 100
/// - tax_amount = (subtotal + discount_amount) * tax_pct/100
/// - computed   = subtotal + discount_amount + tax_amount
///
/// # 失败
/// |computed - gross_total| > 1e-4 → Reconciliation(行级)
pub fn reconcile_gross(tax_pct: f64, gross: f64, gross_total: f64) -> RowResult<GrossReconciliation> {
    let tax_divisor = 1.0 + tax_pct / 100.0;
    let subtotal = gross / tax_divisor;

    let (discount_amount, discount_percentage) = if gross.abs() > gross_total.abs() {
        (
            (gross_total - gross) / tax_divisor,
            (gross - gross_total) / gross.abs() * 100.0,
        )
    } else {
        (0.0, 0.0)
    };

    let tax_amount = (subtotal + discount_amount) * (tax_pct / 100.0);
    let computed = subtotal + discount_amount + tax_amount;

    if (computed - gross_total).abs() > RECONCILE_EPSILON {
        return Err(RowError::Reconciliation {
            computed,
            declared: gross_total,
            detail: format!("tax_pct={}, gross={}, gross_total={}", tax_pct, gross, gross_total),
        });
    }

    Ok(GrossReconciliation {
        subtotal,
        discount_amount,
        discount_percentage,
        tax_amount,
        total: computed,
    })
}
