// ==========================================
// 车队批量导入系统 - 燃油卡对账单映射器
// ==========================================
// 来源: 油卡运营商月度对账单(一行一笔操作)
// 分支: 产品码命中燃油类型目录 → 燃油;命中支出类型目录 → 普通支出
// 对账: gross 口径(含税金额为基准真值,残差为折扣)
// ==========================================

use crate::catalog::CatalogCache;
use crate::domain::{
    AmountKind, EntityKind, ExpensePayload, FuelPayload, Payload, RawRow,
};
use crate::engine::error::{RowError, RowResult};
use crate::engine::mappers::RowMapper;
use crate::engine::normalizer;
use crate::engine::reconciler;
use crate::engine::resolver::EntityResolver;

// 对账单列名(运营商导出格式,固定)
const COL_PLATE: &str = "MATRICULA";
const COL_CARD: &str = "NUM_TARJET";
const COL_PRODUCT: &str = "COD_PRODU";
const COL_DATE: &str = "FEC_OPERAC";
const COL_TIME: &str = "HOR_OPERAC";
const COL_ODOMETER: &str = "KILOMETROS";
const COL_VOLUME: &str = "NUM_LITROS";
const COL_TAX_PCT: &str = "IVA";
const COL_GROSS: &str = "IMPORTE";
const COL_GROSS_TOTAL: &str = "IMP_TOTAL";
const COL_ACCOUNT: &str = "COD_CLI";
const COL_FISCAL_CODE: &str = "COD_ESTABL";

const REQUIRED_COLUMNS: &[&str] = &[
    COL_PLATE,
    COL_CARD,
    COL_PRODUCT,
    COL_DATE,
    COL_TIME,
    COL_ODOMETER,
    COL_VOLUME,
    COL_TAX_PCT,
    COL_GROSS,
    COL_GROSS_TOTAL,
    COL_ACCOUNT,
    COL_FISCAL_CODE,
];

const CATALOG_KINDS: &[EntityKind] = &[
    EntityKind::Vehicles,
    EntityKind::PaymentMethods,
    EntityKind::Suppliers,
    EntityKind::FuelTypes,
    EntityKind::ExpenseTypes,
];

// ==========================================
// FuelCardMapper
// ==========================================
pub struct FuelCardMapper {
    /// 对账单所属供应商名(None = 不写 supplierId)
    supplier_name: Option<String>,
}

impl FuelCardMapper {
    pub fn new(supplier_name: Option<String>) -> Self {
        Self { supplier_name }
    }

    /// 卡号规范化: "1234567.0" 这类浮点文本收敛为整数 slug
    fn card_slug(row: &RawRow) -> RowResult<String> {
        let raw = normalizer::req_text(row, COL_CARD)?;
        match normalizer::parse_decimal_str(&raw) {
            Some(n) if n.fract() == 0.0 => Ok(format!("{}", n as i64)),
            _ => Ok(raw),
        }
    }

    fn custom_fields(
        row: &RawRow,
        product_description: &str,
        per_unit: Option<(f64, f64)>,
    ) -> RowResult<String> {
        let mut metadata = serde_json::json!({
            "cf_fuelcard_raw_filename": row.source_file.as_str(),
            "cf_fuelcard_product_description": product_description,
            "cf_fuelcard_account_id": normalizer::opt_text(row, COL_ACCOUNT),
            "cf_fuelcard_original_odometer": normalizer::opt_text(row, COL_ODOMETER),
            "cf_fuelcard_fiscal_code": normalizer::opt_text(row, COL_FISCAL_CODE),
        });
        if let Some((discount_per_unit, price_per_unit_final)) = per_unit {
            metadata["cf_fuelcard_discount_per_unit"] = discount_per_unit.into();
            metadata["cf_fuelcard_price_per_unit_final"] = price_per_unit_final.into();
        }
        serde_json::to_string(&metadata).map_err(|e| RowError::InvalidValue {
            field: "customFieldsMetadata".to_string(),
            message: e.to_string(),
        })
    }
}

impl RowMapper for FuelCardMapper {
    fn name(&self) -> &'static str {
        "fuel-card"
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

        let card_slug = Self::card_slug(row)?;
        let payment_method =
            resolver.resolve(EntityKind::PaymentMethods, COL_CARD, &card_slug)?;

        let supplier_id = match &self.supplier_name {
            Some(name) => Some(
                resolver
                    .resolve(EntityKind::Suppliers, "supplier", name)?
                    .id,
            ),
            None => None,
        };

        let date = normalizer::req_utc_date(row, COL_DATE, Some(COL_TIME))?;

        // 里程只在为正时有意义,0/负值按缺失处理
        let odometer = normalizer::opt_decimal(row, COL_ODOMETER)
            .map(|km| km as i64)
            .filter(|km| *km > 0);

        let tax_pct = normalizer::req_decimal(row, COL_TAX_PCT)?;
        let gross = normalizer::req_decimal(row, COL_GROSS)?;
        let gross_total = normalizer::req_decimal(row, COL_GROSS_TOTAL)?;
        let totals = reconciler::reconcile_gross(tax_pct, gross, gross_total)?;

        // 产品码分支: 燃油类型目录优先,其次支出类型目录
        let product_code = normalizer::req_text(row, COL_PRODUCT)?;
        if let Some(fuel_type) =
            cache.find_by_reference_code(EntityKind::FuelTypes, &product_code)
        {
            let volume = normalizer::req_decimal(row, COL_VOLUME)?;
            if volume <= 0.0 {
                return Err(RowError::InvalidValue {
                    field: COL_VOLUME.to_string(),
                    message: format!("升数必须为正: {}", volume),
                });
            }

            let price_per_unit = totals.subtotal / volume;
            let discount_per_unit = (gross - gross_total) / volume;
            let price_per_unit_final = totals.total / volume;

            return Ok(Payload::Fuel(FuelPayload {
                volume,
                price_per_unit,
                tax_type: AmountKind::Percentage,
                tax: tax_pct,
                discount_type: AmountKind::Percentage,
                discount: totals.discount_percentage,
                total: totals.total,
                date,
                fuel_type_id: fuel_type.id,
                vehicle_id: vehicle.id,
                driver_id: None,
                supplier_id,
                payment_method_id: Some(payment_method.id),
                odometer,
                reference: None,
                custom_fields_metadata: Some(Self::custom_fields(
                    row,
                    &fuel_type.name,
                    Some((discount_per_unit, price_per_unit_final)),
                )?),
            }));
        }

        if let Some(expense_type) =
            cache.find_by_reference_code(EntityKind::ExpenseTypes, &product_code)
        {
            return Ok(Payload::Expense(ExpensePayload {
                name: expense_type.name.clone(),
                subtotal: totals.subtotal,
                tax_type: AmountKind::Percentage,
                tax: tax_pct,
                discount_type: AmountKind::Percentage,
                discount: totals.discount_percentage,
                total: totals.total,
                date,
                expense_type_id: expense_type.id,
                vehicle_id: vehicle.id,
                driver_id: None,
                supplier_id,
                payment_method_id: Some(payment_method.id),
                odometer,
                custom_fields_metadata: Some(Self::custom_fields(
                    row,
                    &expense_type.name,
                    None,
                )?),
            }));
        }

        Err(RowError::EntityNotFound {
            field: COL_PRODUCT.to_string(),
            value: product_code,
        })
    }
}
