// ==========================================
// 车队批量导入系统 - 目录缓存
// ==========================================
// 职责: 每次运行一次性拉取参照数据并建立内存索引
// 红线: 加载后只读;必需目录为空 → 整次运行失败
// 红线: 索引顺序为 id 升序(确定性并列裁决口径)
// ==========================================

use crate::client::{ApiError, FleetApiClient};
use crate::domain::{normalize_plate, CatalogEntry, EntityKind};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

// ==========================================
// CatalogError - 目录加载错误(运行级致命)
// ==========================================
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("目录 {kind} 在远端无任何条目,无法安全映射")]
    Empty { kind: EntityKind },

    #[error("目录 {kind} 拉取失败: {source}")]
    Fetch {
        kind: EntityKind,
        #[source]
        source: ApiError,
    },
}

// ==========================================
// CatalogIndex - 单一种类的索引
// ==========================================
// entries 按 id 升序保存;名称/二级键索引在重复时保留最小 id
#[derive(Debug, Default)]
struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
    by_secondary: HashMap<String, usize>,
}

impl CatalogIndex {
    fn build(mut entries: Vec<CatalogEntry>) -> CatalogIndex {
        entries.sort_by_key(|e| e.id);

        let mut by_name = HashMap::new();
        let mut by_secondary = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_name.entry(entry.name.trim().to_lowercase()).or_insert(idx);
            if let Some(key) = &entry.secondary_key {
                by_secondary.entry(key.to_lowercase()).or_insert(idx);
            }
        }

        CatalogIndex {
            entries,
            by_name,
            by_secondary,
        }
    }
}

// ==========================================
// CatalogCache - 目录缓存
// ==========================================
pub struct CatalogCache {
    indexes: HashMap<EntityKind, CatalogIndex>,
}

impl CatalogCache {
    /// 加载指定种类的目录(每次运行一次)
    ///
    /// # 失败
    /// - 任一种类拉取失败或为空 → CatalogError(运行终止)
    pub async fn load(
        client: &FleetApiClient,
        kinds: &[EntityKind],
    ) -> Result<CatalogCache, CatalogError> {
        let mut indexes = HashMap::new();

        for &kind in kinds {
            let entries = client
                .list_entries(kind)
                .await
                .map_err(|source| CatalogError::Fetch { kind, source })?;

            if entries.is_empty() {
                return Err(CatalogError::Empty { kind });
            }

            info!(kind = %kind, count = entries.len(), "目录加载完成");
            indexes.insert(kind, CatalogIndex::build(entries));
        }

        Ok(CatalogCache { indexes })
    }

    /// 从内存条目构造(测试与离线场景)
    pub fn from_entries(parts: Vec<(EntityKind, Vec<CatalogEntry>)>) -> CatalogCache {
        let indexes = parts
            .into_iter()
            .map(|(kind, entries)| (kind, CatalogIndex::build(entries)))
            .collect();
        CatalogCache { indexes }
    }

    /// 某一种类的全部条目(id 升序;未加载 → 空切片)
    pub fn entries(&self, kind: EntityKind) -> &[CatalogEntry] {
        self.indexes
            .get(&kind)
            .map(|index| index.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_loaded(&self, kind: EntityKind) -> bool {
        self.indexes.contains_key(&kind)
    }

    /// 一级键精确查找(名称,大小写不敏感)
    pub fn find_by_name(&self, kind: EntityKind, name: &str) -> Option<&CatalogEntry> {
        let index = self.indexes.get(&kind)?;
        index
            .by_name
            .get(&name.trim().to_lowercase())
            .map(|&idx| &index.entries[idx])
    }

    /// 二级键精确查找(已规范化的键)
    pub fn find_by_secondary(&self, kind: EntityKind, key: &str) -> Option<&CatalogEntry> {
        let index = self.indexes.get(&kind)?;
        index
            .by_secondary
            .get(&key.to_lowercase())
            .map(|&idx| &index.entries[idx])
    }

    /// 车辆按车牌查找(入参可为未规范化车牌)
    pub fn find_vehicle_by_plate(&self, plate: &str) -> Option<&CatalogEntry> {
        let normalized = normalize_plate(plate);
        if normalized.is_empty() {
            return None;
        }
        self.find_by_secondary(EntityKind::Vehicles, &normalized)
    }

    /// 司机按姓名精确查找
    pub fn find_driver_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.find_by_name(EntityKind::Drivers, name)
    }

    /// 司机按邮箱查找
    pub fn find_driver_by_email(&self, email: &str) -> Option<&CatalogEntry> {
        self.find_by_secondary(EntityKind::Drivers, email.trim())
    }

    /// 支付方式按 slug 查找
    pub fn find_payment_method_by_slug(&self, slug: &str) -> Option<&CatalogEntry> {
        self.find_by_secondary(EntityKind::PaymentMethods, slug.trim())
    }

    /// 类型化目录按引用码查找
    ///
    /// 引用码统一为数值规范形式("007" 与 7 同键,见客户端层)
    pub fn find_by_reference_code(&self, kind: EntityKind, code: &str) -> Option<&CatalogEntry> {
        let trimmed = code.trim();
        let key = match trimmed.parse::<i64>() {
            Ok(n) => n.to_string(),
            Err(_) => trimmed.to_string(),
        };
        self.find_by_secondary(kind, &key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle_cache() -> CatalogCache {
        CatalogCache::from_entries(vec![(
            EntityKind::Vehicles,
            vec![
                CatalogEntry::new(20, "Furgoneta B", Some("5678DEF".to_string())),
                CatalogEntry::new(10, "Furgoneta A", Some("1234ABC".to_string())),
            ],
        )])
    }

    #[test]
    fn test_entries_sorted_by_id() {
        let cache = vehicle_cache();
        let ids: Vec<i64> = cache
            .entries(EntityKind::Vehicles)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn test_find_vehicle_by_raw_plate() {
        let cache = vehicle_cache();
        let entry = cache.find_vehicle_by_plate("1234-abc").expect("应命中");
        assert_eq!(entry.id, 10);
        assert!(cache.find_vehicle_by_plate("0000XXX").is_none());
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let cache = vehicle_cache();
        let entry = cache
            .find_by_name(EntityKind::Vehicles, "  furgoneta a ")
            .expect("应命中");
        assert_eq!(entry.id, 10);
    }

    #[test]
    fn test_duplicate_name_resolves_to_lowest_id() {
        let cache = CatalogCache::from_entries(vec![(
            EntityKind::Suppliers,
            vec![
                CatalogEntry::new(5, "Repsol", None),
                CatalogEntry::new(3, "Repsol", None),
            ],
        )]);
        let entry = cache.find_by_name(EntityKind::Suppliers, "repsol").unwrap();
        assert_eq!(entry.id, 3);
    }

    #[test]
    fn test_reference_code_numeric_normalization() {
        let cache = CatalogCache::from_entries(vec![(
            EntityKind::FuelTypes,
            vec![CatalogEntry::new(1, "Diésel", Some("7".to_string()))],
        )]);
        assert!(cache
            .find_by_reference_code(EntityKind::FuelTypes, "007")
            .is_some());
        assert!(cache
            .find_by_reference_code(EntityKind::FuelTypes, "8")
            .is_none());
    }

    #[test]
    fn test_unloaded_kind_is_empty() {
        let cache = vehicle_cache();
        assert!(cache.entries(EntityKind::Drivers).is_empty());
        assert!(!cache.is_loaded(EntityKind::Drivers));
    }
}
