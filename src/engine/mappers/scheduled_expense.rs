// ==========================================
// 车队批量导入系统 - 周期性支出映射器
// ==========================================
// 来源: 租赁/长租合同表格(一行一份周期性支出)
// 对账: net 口径(subtotal 为基准真值,与申报周期总额核对)
// 口径: 货币金额列优先于百分比列,两者皆空 → 货币 0
// ==========================================

use crate::catalog::CatalogCache;
use crate::domain::{AmountKind, EntityKind, Frequency, Payload, RawRow, ScheduledExpensePayload};
use crate::engine::error::{RowError, RowResult};
use crate::engine::mappers::RowMapper;
use crate::engine::normalizer;
use crate::engine::reconciler;
use crate::engine::resolver::EntityResolver;

const COL_NAME: &str = "Nombre del gasto*";
const COL_EXPENSE_TYPE: &str = "Tipo de gasto*";
const COL_SUBTOTAL: &str = "Subtotal*";
const COL_TAX_PCT: &str = "Porcentaje impuesto";
const COL_TAX_CURRENCY: &str = "Impuesto monetario";
const COL_DISCOUNT_PCT: &str = "Porcentaje descuento";
const COL_DISCOUNT_CURRENCY: &str = "Descuento monetario";
const COL_TOTAL: &str = "Total*";
const COL_EMAIL: &str = "Email";
const COL_PLATE: &str = "Matricula";
const COL_SUPPLIER: &str = "Proveedor";
const COL_PAYMENT_METHOD: &str = "Medio de pago";
const COL_START_DATE: &str = "Fecha inicio*";
const COL_END_DATE: &str = "Fecha fin";
const COL_FREQUENCY: &str = "Frecuencia del gasto*";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_NAME,
    COL_EXPENSE_TYPE,
    COL_SUBTOTAL,
    COL_TOTAL,
    COL_START_DATE,
    COL_FREQUENCY,
];

const CATALOG_KINDS: &[EntityKind] = &[
    EntityKind::Vehicles,
    EntityKind::Drivers,
    EntityKind::Suppliers,
    EntityKind::PaymentMethods,
    EntityKind::ExpenseTypes,
];

// ==========================================
// ScheduledExpenseMapper
// ==========================================
pub struct ScheduledExpenseMapper;

impl ScheduledExpenseMapper {
    pub fn new() -> Self {
        Self
    }

    /// 货币列优先,其次百分比列,皆空 → 货币 0(留空即零的文档化默认)
    fn amount_with_kind(
        row: &RawRow,
        currency_column: &str,
        percentage_column: &str,
    ) -> (AmountKind, f64) {
        let currency = normalizer::decimal_or_zero(row, currency_column);
        if currency > 0.0 {
            return (AmountKind::Currency, currency);
        }
        let percentage = normalizer::decimal_or_zero(row, percentage_column);
        if percentage > 0.0 {
            return (AmountKind::Percentage, percentage);
        }
        (AmountKind::Currency, 0.0)
    }
}

impl Default for ScheduledExpenseMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RowMapper for ScheduledExpenseMapper {
    fn name(&self) -> &'static str {
        "scheduled-expense"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED_COLUMNS
    }

    fn catalog_kinds(&self) -> &'static [EntityKind] {
        CATALOG_KINDS
    }

    fn map(&self, row: &RawRow, cache: &CatalogCache) -> RowResult<Payload> {
        if row.is_blank() {
            return Err(RowError::EmptyRow);
        }
        let resolver = EntityResolver::new(cache);

        let name = normalizer::req_text(row, COL_NAME)?;

        let expense_type_query = normalizer::req_text(row, COL_EXPENSE_TYPE)?;
        let expense_type =
            resolver.resolve(EntityKind::ExpenseTypes, COL_EXPENSE_TYPE, &expense_type_query)?;

        let (tax_kind, tax) = Self::amount_with_kind(row, COL_TAX_CURRENCY, COL_TAX_PCT);
        let (discount_kind, discount) =
            Self::amount_with_kind(row, COL_DISCOUNT_CURRENCY, COL_DISCOUNT_PCT);

        let subtotal = normalizer::req_decimal(row, COL_SUBTOTAL)?;
        let declared_total = normalizer::req_decimal(row, COL_TOTAL)?;
        let amounts = reconciler::reconcile_net(
            subtotal,
            tax_kind,
            tax,
            discount_kind,
            discount,
            declared_total,
        )?;

        // 司机与车辆均为可选,未命中不阻断本行
        let user_id = normalizer::opt_text(row, COL_EMAIL)
            .and_then(|email| resolver.resolve_optional(EntityKind::Drivers, COL_EMAIL, &email))
            .map(|entry| entry.id);
        let vehicle_id = normalizer::opt_text(row, COL_PLATE)
            .and_then(|plate| resolver.resolve_optional(EntityKind::Vehicles, COL_PLATE, &plate))
            .map(|entry| entry.id);
        let supplier_id = normalizer::opt_text(row, COL_SUPPLIER)
            .and_then(|name| resolver.resolve_optional(EntityKind::Suppliers, COL_SUPPLIER, &name))
            .map(|entry| entry.id);
        let payment_method_id = normalizer::opt_text(row, COL_PAYMENT_METHOD)
            .and_then(|pm| {
                resolver.resolve_optional(EntityKind::PaymentMethods, COL_PAYMENT_METHOD, &pm)
            })
            .map(|entry| entry.id);

        let start_date = normalizer::req_utc_date(row, COL_START_DATE, None)?;
        let end_date = normalizer::opt_utc_date(row, COL_END_DATE, None)?;

        let frequency_raw = normalizer::req_text(row, COL_FREQUENCY)?;
        let frecuency = Frequency::parse(&frequency_raw).ok_or_else(|| RowError::InvalidValue {
            field: COL_FREQUENCY.to_string(),
            message: format!("频率不可识别: {}", frequency_raw),
        })?;

        Ok(Payload::ScheduledExpense(ScheduledExpensePayload {
            name,
            expense_type_id: expense_type.id,
            subtotal: amounts.subtotal,
            tax_type: amounts.tax_kind,
            tax: amounts.tax,
            discount_type: amounts.discount_kind,
            discount: amounts.discount,
            total: amounts.total,
            user_id,
            vehicle_id,
            supplier_id,
            payment_method_id,
            start_date,
            end_date,
            frecuency,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CatalogEntry, CellValue};
    use std::sync::Arc;

    fn test_cache() -> CatalogCache {
        CatalogCache::from_entries(vec![
            (
                EntityKind::ExpenseTypes,
                vec![
                    CatalogEntry::new(74093, "Renting", None),
                    CatalogEntry::new(74084, "Leasing", None),
                ],
            ),
            (
                EntityKind::Drivers,
                vec![CatalogEntry::new(
                    500,
                    "Ana López",
                    Some("ana.lopez@flota.es".to_string()),
                )],
            ),
            (
                EntityKind::Vehicles,
                vec![CatalogEntry::new(600, "Furgoneta 1", Some("1234ABC".to_string()))],
            ),
            (EntityKind::Suppliers, vec![CatalogEntry::new(1, "ALD", None)]),
            (
                EntityKind::PaymentMethods,
                vec![CatalogEntry::new(700, "Transferencia", Some("transfer".to_string()))],
            ),
        ])
    }

    fn contract_row(overrides: &[(&str, CellValue)]) -> RawRow {
        let columns = vec![
            COL_NAME,
            COL_EXPENSE_TYPE,
            COL_SUBTOTAL,
            COL_TAX_PCT,
            COL_TAX_CURRENCY,
            COL_DISCOUNT_PCT,
            COL_DISCOUNT_CURRENCY,
            COL_TOTAL,
            COL_EMAIL,
            COL_PLATE,
            COL_SUPPLIER,
            COL_PAYMENT_METHOD,
            COL_START_DATE,
            COL_END_DATE,
            COL_FREQUENCY,
        ];
        let mut cells = vec![
            CellValue::Text("Renting Furgoneta 1".to_string()),
            CellValue::Text("renting".to_string()),
            CellValue::Text("400,00 €".to_string()),
            CellValue::Text("21".to_string()),
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Empty,
            CellValue::Text("484,00 €".to_string()),
            CellValue::Text("ana.lopez@flota.es".to_string()),
            CellValue::Text("1234-ABC".to_string()),
            CellValue::Text("ALD".to_string()),
            CellValue::Text("Transferencia".to_string()),
            CellValue::Text("01/02/2024".to_string()),
            CellValue::Text("01/02/2025".to_string()),
            CellValue::Text("Mensual".to_string()),
        ];
        for (column, value) in overrides {
            let idx = columns.iter().position(|c| c == column).unwrap();
            cells[idx] = value.clone();
        }
        RawRow {
            source_file: Arc::new("contratos.xlsx".to_string()),
            sheet_name: Some(Arc::new("RENTING".to_string())),
            columns: Arc::new(columns.into_iter().map(String::from).collect()),
            cells,
            row_number: 2,
        }
    }

    #[test]
    fn test_maps_full_contract_row() {
        let cache = test_cache();
        let mapper = ScheduledExpenseMapper::new();
        let payload = mapper.map(&contract_row(&[]), &cache).unwrap();

        match payload {
            Payload::ScheduledExpense(scheduled) => {
                assert_eq!(scheduled.expense_type_id, 74093);
                assert_eq!(scheduled.subtotal, 400.0);
                assert_eq!(scheduled.tax_type, AmountKind::Percentage);
                assert_eq!(scheduled.tax, 21.0);
                assert_eq!(scheduled.total, 484.0);
                assert_eq!(scheduled.user_id, Some(500));
                assert_eq!(scheduled.vehicle_id, Some(600));
                assert_eq!(scheduled.frecuency, Frequency::Month);
                // 民用日期 00:00 冬令时 → 前一日 23:00 UTC
                assert_eq!(scheduled.start_date, "2024-01-31T23:00:00.000Z");
            }
            other => panic!("期望周期性支出载荷, 得到 {:?}", other.kind_name()),
        }
    }

    #[test]
    fn test_currency_tax_wins_over_percentage() {
        let cache = test_cache();
        let mapper = ScheduledExpenseMapper::new();
        let payload = mapper
            .map(
                &contract_row(&[
                    (COL_TAX_CURRENCY, CellValue::Text("84".to_string())),
                    (COL_TOTAL, CellValue::Text("484".to_string())),
                ]),
                &cache,
            )
            .unwrap();
        match payload {
            Payload::ScheduledExpense(scheduled) => {
                assert_eq!(scheduled.tax_type, AmountKind::Currency);
                assert_eq!(scheduled.tax, 84.0);
            }
            other => panic!("期望周期性支出载荷, 得到 {:?}", other.kind_name()),
        }
    }

    #[test]
    fn test_total_mismatch_is_row_error() {
        let cache = test_cache();
        let mapper = ScheduledExpenseMapper::new();
        let err = mapper
            .map(
                &contract_row(&[(COL_TOTAL, CellValue::Text("999".to_string()))]),
                &cache,
            )
            .unwrap_err();
        assert!(matches!(err, RowError::Reconciliation { .. }));
    }

    #[test]
    fn test_unknown_driver_stays_optional() {
        let cache = test_cache();
        let mapper = ScheduledExpenseMapper::new();
        let payload = mapper
            .map(
                &contract_row(&[(COL_EMAIL, CellValue::Text("nadie@flota.es".to_string()))]),
                &cache,
            )
            .unwrap();
        match payload {
            Payload::ScheduledExpense(scheduled) => assert_eq!(scheduled.user_id, None),
            other => panic!("期望周期性支出载荷, 得到 {:?}", other.kind_name()),
        }
    }
}
