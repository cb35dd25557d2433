// ==========================================
// 车队批量导入系统 - 保险属性映射器
// ==========================================
// 来源: 保单表格(一行一辆车的在保信息)
// 目标: 车辆属性更新(保险字段),PUT 到车辆属性端点
// 对账: net 口径,折扣恒为零(保费无折扣列)
// ==========================================

use crate::catalog::CatalogCache;
use crate::domain::{AmountKind, EntityKind, Payload, RawRow, VehiclePropertiesPayload};
use crate::domain::types::Frequency;
use crate::engine::error::{RowError, RowResult};
use crate::engine::mappers::RowMapper;
use crate::engine::normalizer;
use crate::engine::reconciler;
use crate::engine::resolver::EntityResolver;

const COL_PLATE: &str = "Matrícula*";
const COL_POLICY: &str = "Número de Poliza*";
const COL_SUPPLIER: &str = "Proveedor*";
const COL_INSURANCE_TYPE: &str = "Tipo de Seguro*";
const COL_START_DATE: &str = "Fecha inicio*";
const COL_END_DATE: &str = "Fecha fin*";
const COL_SUBTOTAL: &str = "Prima Subtotal*";
const COL_TAX_KIND: &str = "Tipo de Impuesto*";
const COL_TAX: &str = "Valor de Impuesto*";
const COL_TOTAL: &str = "Prima Total*";
const COL_FREQUENCY: &str = "Frecuencia de Pago*";
const COL_CREATE_SCHEDULED: &str = "Crear Gasto Programado";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_PLATE,
    COL_POLICY,
    COL_SUPPLIER,
    COL_INSURANCE_TYPE,
    COL_START_DATE,
    COL_END_DATE,
    COL_SUBTOTAL,
    COL_TAX_KIND,
    COL_TAX,
    COL_TOTAL,
    COL_FREQUENCY,
];

const CATALOG_KINDS: &[EntityKind] = &[
    EntityKind::Vehicles,
    EntityKind::Suppliers,
    EntityKind::InsuranceTypes,
];

// ==========================================
// InsuranceMapper
// ==========================================
pub struct InsuranceMapper;

impl InsuranceMapper {
    pub fn new() -> Self {
        Self
    }

    fn tax_kind(raw: &str) -> RowResult<AmountKind> {
        match raw.trim().to_lowercase().as_str() {
            "porcentaje" | "percentage" => Ok(AmountKind::Percentage),
            "moneda" | "currency" => Ok(AmountKind::Currency),
            other => Err(RowError::InvalidValue {
                field: COL_TAX_KIND.to_string(),
                message: format!("税口径不可识别: {}", other),
            }),
        }
    }
}

impl Default for InsuranceMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RowMapper for InsuranceMapper {
    fn name(&self) -> &'static str {
        "insurance"
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

        let plate = normalizer::req_text(row, COL_PLATE)?;
        let vehicle = resolver.resolve(EntityKind::Vehicles, COL_PLATE, &plate)?;

        let supplier_query = normalizer::req_text(row, COL_SUPPLIER)?;
        let supplier = resolver.resolve(EntityKind::Suppliers, COL_SUPPLIER, &supplier_query)?;

        let type_query = normalizer::req_text(row, COL_INSURANCE_TYPE)?;
        let insurance_type =
            resolver.resolve(EntityKind::InsuranceTypes, COL_INSURANCE_TYPE, &type_query)?;

        let tax_kind = Self::tax_kind(&normalizer::req_text(row, COL_TAX_KIND)?)?;
        let subtotal = normalizer::req_decimal(row, COL_SUBTOTAL)?;
        let tax = normalizer::req_decimal(row, COL_TAX)?;
        let declared_total = normalizer::req_decimal(row, COL_TOTAL)?;
        let amounts = reconciler::reconcile_net(
            subtotal,
            tax_kind,
            tax,
            AmountKind::Currency,
            0.0,
            declared_total,
        )?;

        let frequency_raw = normalizer::req_text(row, COL_FREQUENCY)?;
        let frequency = Frequency::parse(&frequency_raw).ok_or_else(|| RowError::InvalidValue {
            field: COL_FREQUENCY.to_string(),
            message: format!("付款频率不可识别: {}", frequency_raw),
        })?;

        Ok(Payload::VehicleProperties(VehiclePropertiesPayload {
            vehicle_id: vehicle.id,
            insurance_policy_number: normalizer::req_text(row, COL_POLICY)?,
            insurance_supplier_id: supplier.id,
            insurance_start_date: normalizer::req_utc_date(row, COL_START_DATE, None)?,
            insurance_end_date: normalizer::req_utc_date(row, COL_END_DATE, None)?,
            insurance_subtotal: amounts.subtotal,
            insurance_tax_type: amounts.tax_kind,
            insurance_tax: amounts.tax,
            insurance_total_amount: amounts.total,
            insurance_type_id: insurance_type.id,
            insurance_payment_frequency: frequency,
            create_insurance_scheduled_expense: normalizer::opt_bool(row, COL_CREATE_SCHEDULED)
                .unwrap_or(false),
        }))
    }
}
