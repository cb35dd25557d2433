// ==========================================
// 车队批量导入系统 - 实体解析引擎
// ==========================================
// 职责: 规范化标识 → 目录条目
// 匹配顺序: 一级键精确 → 二级键精确 → 子串包含
// 并列裁决: id 升序首个命中(确定性口径)
// 红线: 子串回退命中必须输出 warn 日志(已知歧义来源)
// ==========================================

use crate::catalog::CatalogCache;
use crate::domain::{normalize_plate, CatalogEntry, EntityKind};
use crate::engine::error::{RowError, RowResult};
use tracing::warn;

// ==========================================
// EntityResolver - 实体解析器
// ==========================================
pub struct EntityResolver<'a> {
    cache: &'a CatalogCache,
}

impl<'a> EntityResolver<'a> {
    pub fn new(cache: &'a CatalogCache) -> Self {
        Self { cache }
    }

    /// 必填字段解析(未命中 → EntityNotFound)
    pub fn resolve(
        &self,
        kind: EntityKind,
        field: &str,
        query: &str,
    ) -> RowResult<&'a CatalogEntry> {
        self.lookup(kind, field, query)
            .ok_or_else(|| RowError::EntityNotFound {
                field: field.to_string(),
                value: query.trim().to_string(),
            })
    }

    /// 可选字段解析(未命中 → None,不报错)
    pub fn resolve_optional(
        &self,
        kind: EntityKind,
        field: &str,
        query: &str,
    ) -> Option<&'a CatalogEntry> {
        self.lookup(kind, field, query)
    }

    fn lookup(&self, kind: EntityKind, field: &str, query: &str) -> Option<&'a CatalogEntry> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }

        // 1) 一级键: 名称精确(大小写不敏感)
        if let Some(entry) = self.cache.find_by_name(kind, trimmed) {
            return Some(entry);
        }

        // 2) 二级键精确: 原样键;车辆另试规范化车牌
        if let Some(entry) = self.cache.find_by_secondary(kind, trimmed) {
            return Some(entry);
        }
        if kind == EntityKind::Vehicles {
            let plate = normalize_plate(trimmed);
            if !plate.is_empty() {
                if let Some(entry) = self.cache.find_by_secondary(kind, &plate) {
                    return Some(entry);
                }
            }
        }

        // 3) 子串包含(id 升序首个命中)
        let needle = trimmed.to_lowercase();
        let hit = self.cache.entries(kind).iter().find(|entry| {
            entry.name.to_lowercase().contains(&needle)
                || entry
                    .secondary_key
                    .as_ref()
                    .is_some_and(|key| key.to_lowercase().contains(&needle))
        });

        if let Some(entry) = hit {
            // 子串回退可能落在同名前缀的错误实体上,留痕供人工复核
            warn!(
                kind = %kind,
                field,
                query = trimmed,
                resolved_id = entry.id,
                resolved_name = %entry.name,
                "实体经子串回退命中,存在歧义风险"
            );
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CatalogEntry;

    fn driver_cache() -> CatalogCache {
        CatalogCache::from_entries(vec![(
            EntityKind::Drivers,
            vec![
                CatalogEntry::new(30, "Juan García", Some("juan.garcia@flota.es".to_string())),
                CatalogEntry::new(10, "Juan Pérez", Some("juan.perez@flota.es".to_string())),
                CatalogEntry::new(20, "Ana López", Some("ana.lopez@flota.es".to_string())),
            ],
        )])
    }

    #[test]
    fn test_exact_name_wins_over_substring() {
        let cache = driver_cache();
        let resolver = EntityResolver::new(&cache);
        let entry = resolver
            .resolve(EntityKind::Drivers, "Conductor", "juan pérez")
            .unwrap();
        assert_eq!(entry.id, 10);
    }

    #[test]
    fn test_secondary_key_match() {
        let cache = driver_cache();
        let resolver = EntityResolver::new(&cache);
        let entry = resolver
            .resolve(EntityKind::Drivers, "Email", "ana.lopez@flota.es")
            .unwrap();
        assert_eq!(entry.id, 20);
    }

    #[test]
    fn test_substring_fallback_deterministic_lowest_id() {
        let cache = driver_cache();
        let resolver = EntityResolver::new(&cache);
        // "Juan" 同时包含于两名司机,按 id 升序裁决
        let entry = resolver
            .resolve(EntityKind::Drivers, "Conductor", "Juan")
            .unwrap();
        assert_eq!(entry.id, 10);
        // 重复调用结果一致
        let again = resolver
            .resolve(EntityKind::Drivers, "Conductor", "Juan")
            .unwrap();
        assert_eq!(again.id, entry.id);
    }

    #[test]
    fn test_vehicle_plate_punctuation_stripped() {
        let cache = CatalogCache::from_entries(vec![(
            EntityKind::Vehicles,
            vec![CatalogEntry::new(7, "Camión 7", Some("1234ABC".to_string()))],
        )]);
        let resolver = EntityResolver::new(&cache);
        let entry = resolver
            .resolve(EntityKind::Vehicles, "Matricula", "1234-abc")
            .unwrap();
        assert_eq!(entry.id, 7);
    }

    #[test]
    fn test_not_found_carries_field_and_value() {
        let cache = driver_cache();
        let resolver = EntityResolver::new(&cache);
        match resolver.resolve(EntityKind::Drivers, "Conductor", "Zacarías") {
            Err(RowError::EntityNotFound { field, value }) => {
                assert_eq!(field, "Conductor");
                assert_eq!(value, "Zacarías");
            }
            other => panic!("期望 EntityNotFound, 得到 {:?}", other),
        }
    }

    #[test]
    fn test_optional_miss_is_none() {
        let cache = driver_cache();
        let resolver = EntityResolver::new(&cache);
        assert!(resolver
            .resolve_optional(EntityKind::Drivers, "Conductor", "Zacarías")
            .is_none());
        assert!(resolver
            .resolve_optional(EntityKind::Drivers, "Conductor", "  ")
            .is_none());
    }
}
