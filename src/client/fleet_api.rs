// ==========================================
// 车队批量导入系统 - 车队API客户端
// ==========================================
// 职责: Bearer 鉴权的REST访问(目录列表 + 记录提交)
// 分页口径: skip/take 两段式(先探总数,再全量拉取)
// 红线: 客户端只做传输与信封解析,不做业务映射
// ==========================================

use crate::client::error::{ApiError, ApiResult};
use crate::config::ApiConfig;
use crate::domain::{normalize_plate, CatalogEntry, EntityKind};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

// ==========================================
// 响应信封
// ==========================================

#[derive(Debug, Deserialize)]
struct PageMetadata {
    #[serde(rename = "_total_rows")]
    total_rows: u64,
}

#[derive(Debug, Deserialize)]
struct VehiclesEnvelope {
    #[serde(rename = "_metadata")]
    metadata: Option<PageMetadata>,
    #[serde(default)]
    vehicles: Vec<VehicleDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VehicleDto {
    id: i64,
    name: Option<String>,
    registration_number_v2: Option<String>,
    registration_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersEnvelope {
    #[serde(rename = "_metadata")]
    metadata: Option<PageMetadata>,
    #[serde(default)]
    list: Vec<UserDto>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    id: i64,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuppliersEnvelope {
    #[serde(rename = "_metadata")]
    metadata: Option<PageMetadata>,
    #[serde(default)]
    suppliers: Vec<SupplierDto>,
}

#[derive(Debug, Deserialize)]
struct SupplierDto {
    id: i64,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodsEnvelope {
    #[serde(rename = "_metadata")]
    metadata: Option<PageMetadata>,
    #[serde(rename = "paymentMethods", default)]
    payment_methods: Vec<PaymentMethodDto>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodDto {
    id: i64,
    name: Option<String>,
    slug: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogItemDto {
    id: i64,
    name: Option<String>,
    // referenceCode 在远端既可能是数字也可能是字符串
    #[serde(default)]
    reference_code: Option<Value>,
}

/// 提交响应(创建类端点返回新记录ID,更新类端点无)
#[derive(Debug, Clone)]
pub struct SubmitResponse {
    pub id: Option<i64>,
}

// ==========================================
// FleetApiClient - 车队API客户端
// ==========================================
pub struct FleetApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl FleetApiClient {
    /// 创建新的客户端实例
    ///
    /// # 参数
    /// - config: API配置(地址/令牌/超时)
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ApiError::InvalidConfig("BASE_URL 为空".to_string()));
        }
        if config.bearer_token.trim().is_empty() {
            return Err(ApiError::InvalidConfig("BEARER_TOKEN 为空".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.bearer_token.clone(),
        })
    }

    /// 拉取一个目录种类的全部条目
    ///
    /// # 口径
    /// - Vehicles/Drivers/Suppliers/PaymentMethods: 两段式分页
    /// - ExpenseTypes/FuelTypes: 类型化目录端点,一次返回全量
    pub async fn list_entries(&self, kind: EntityKind) -> ApiResult<Vec<CatalogEntry>> {
        match kind {
            EntityKind::Vehicles => self.list_vehicles().await,
            EntityKind::Drivers => self.list_drivers().await,
            EntityKind::Suppliers => self.list_suppliers().await,
            EntityKind::PaymentMethods => self.list_payment_methods().await,
            EntityKind::ExpenseTypes | EntityKind::FuelTypes | EntityKind::InsuranceTypes => {
                // catalog_slug 对类型化目录必然存在
                self.list_catalog(kind.catalog_slug().expect("typed catalog slug"))
                    .await
            }
        }
    }

    async fn list_vehicles(&self) -> ApiResult<Vec<CatalogEntry>> {
        let probe: VehiclesEnvelope = self
            .get_json("/vehicles", &[("skip", "0"), ("take", "1")])
            .await?;
        let total = probe.metadata.map(|m| m.total_rows).unwrap_or(0);
        debug!(total, "车辆总数探测完成");

        let take = total.to_string();
        let envelope: VehiclesEnvelope = self
            .get_json("/vehicles", &[("skip", "0"), ("take", &take)])
            .await?;

        Ok(envelope
            .vehicles
            .into_iter()
            .map(|v| {
                let plate = v
                    .registration_number_v2
                    .or(v.registration_number)
                    .map(|p| normalize_plate(&p))
                    .filter(|p| !p.is_empty());
                let name = v.name.unwrap_or_else(|| format!("vehicle-{}", v.id));
                CatalogEntry::new(v.id, name, plate)
            })
            .collect())
    }

    async fn list_drivers(&self) -> ApiResult<Vec<CatalogEntry>> {
        // userType=4: 司机
        let probe: UsersEnvelope = self
            .get_json("/users", &[("skip", "0"), ("take", "1"), ("userType", "4")])
            .await?;
        let total = probe.metadata.map(|m| m.total_rows).unwrap_or(0);
        debug!(total, "司机总数探测完成");

        let take = total.to_string();
        let envelope: UsersEnvelope = self
            .get_json("/users", &[("skip", "0"), ("take", &take), ("userType", "4")])
            .await?;

        Ok(envelope
            .list
            .into_iter()
            .map(|u| {
                let email = u
                    .email
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty());
                let name = u.name.unwrap_or_else(|| format!("user-{}", u.id));
                CatalogEntry::new(u.id, name, email)
            })
            .collect())
    }

    async fn list_suppliers(&self) -> ApiResult<Vec<CatalogEntry>> {
        let probe: SuppliersEnvelope = self
            .get_json(
                "/suppliers",
                &[("collectionType", "supplier"), ("skip", "0"), ("take", "1")],
            )
            .await?;
        let total = probe.metadata.map(|m| m.total_rows).unwrap_or(0);

        let take = total.to_string();
        let envelope: SuppliersEnvelope = self
            .get_json(
                "/suppliers",
                &[("collectionType", "supplier"), ("skip", "0"), ("take", &take)],
            )
            .await?;

        Ok(envelope
            .suppliers
            .into_iter()
            .map(|s| {
                let name = s.name.unwrap_or_else(|| format!("supplier-{}", s.id));
                CatalogEntry::new(s.id, name, None)
            })
            .collect())
    }

    async fn list_payment_methods(&self) -> ApiResult<Vec<CatalogEntry>> {
        let probe: PaymentMethodsEnvelope = self
            .get_json("/payment-methods", &[("skip", "0"), ("take", "1")])
            .await?;
        let total = probe.metadata.map(|m| m.total_rows).unwrap_or(0);

        let take = total.to_string();
        let envelope: PaymentMethodsEnvelope = self
            .get_json("/payment-methods", &[("skip", "0"), ("take", &take)])
            .await?;

        Ok(envelope
            .payment_methods
            .into_iter()
            .map(|p| {
                let slug = p.slug.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
                let name = p.name.unwrap_or_else(|| format!("payment-method-{}", p.id));
                CatalogEntry::new(p.id, name, slug)
            })
            .collect())
    }

    async fn list_catalog(&self, slug: &str) -> ApiResult<Vec<CatalogEntry>> {
        let path = format!("/catalogs/{}", slug);
        let items: Vec<CatalogItemDto> = self.get_json(&path, &[]).await?;

        Ok(items
            .into_iter()
            .map(|item| {
                let code = item.reference_code.and_then(|v| reference_code_to_key(&v));
                let name = item.name.unwrap_or_else(|| format!("catalog-{}", item.id));
                CatalogEntry::new(item.id, name, code)
            })
            .collect())
    }

    /// POST 创建记录,返回远端ID
    pub async fn post(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &impl serde::Serialize,
    ) -> ApiResult<SubmitResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .query(query)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let id = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_i64));
        Ok(SubmitResponse { id })
    }

    /// PUT 更新记录(无返回ID)
    pub async fn put(&self, path: &str, body: &impl serde::Serialize) -> ApiResult<SubmitResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(SubmitResponse { id: None })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            context: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// referenceCode 规范化: 数字与字符串统一为比对键
fn reference_code_to_key(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            // "007" 与 7 视为同一引用码
            match trimmed.parse::<i64>() {
                Ok(n) => Some(n.to_string()),
                Err(_) => Some(trimmed.to_string()),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_code_number_and_string_agree() {
        assert_eq!(
            reference_code_to_key(&Value::from(7)),
            Some("7".to_string())
        );
        assert_eq!(
            reference_code_to_key(&Value::from("007")),
            Some("7".to_string())
        );
        assert_eq!(
            reference_code_to_key(&Value::from("GAS-95")),
            Some("GAS-95".to_string())
        );
        assert_eq!(reference_code_to_key(&Value::from("  ")), None);
    }

    #[test]
    fn test_vehicles_envelope_parsing() {
        let raw = r#"{
            "_metadata": {"_total_rows": 2},
            "vehicles": [
                {"id": 1, "name": "Furgoneta 1", "registrationNumberV2": "1234-ABC"},
                {"id": 2, "registrationNumber": "5678 DEF"}
            ]
        }"#;
        let envelope: VehiclesEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.metadata.unwrap().total_rows, 2);
        assert_eq!(envelope.vehicles.len(), 2);
        assert_eq!(envelope.vehicles[1].registration_number.as_deref(), Some("5678 DEF"));
    }
}
