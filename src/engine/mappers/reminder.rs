// ==========================================
// 车队批量导入系统 - 任务提醒映射器
// ==========================================
// 来源: 维护/行政任务表格(一行一条提醒)
// 目标实体: 司机(按姓名)或车辆(按名称/车牌)
// 无金额字段,不经过财务对账
// ==========================================

use crate::catalog::CatalogCache;
use crate::domain::{
    EntityKind, NotificationUnit, Payload, RawRow, ReminderEntityType, ReminderNotification,
    ReminderPayload, ReminderPriority,
};
use crate::engine::error::{RowError, RowResult};
use crate::engine::mappers::RowMapper;
use crate::engine::normalizer;
use crate::engine::resolver::EntityResolver;

const COL_NAME: &str = "Nombre de la Tarea*";
const COL_DESCRIPTION: &str = "Descripción";
const COL_DUE_DATE: &str = "Fecha Vto Tarea*";
const COL_DUE_TIME: &str = "Hora*";
const COL_PRIORITY: &str = "Prioridad*";
const COL_ENTITY_KIND: &str = "Opciones";
const COL_ENTITY: &str = "Entidad*";
const COL_RESPONSIBLE: &str = "Responsable de la Tarea";
const COL_CHANNELS: &str = "Recordatorio";
const COL_NOTIFY_AMOUNT: &str = "valor*";
const COL_NOTIFY_UNIT: &str = "Unidad de tiempo de notificación";

const REQUIRED_COLUMNS: &[&str] = &[COL_NAME, COL_DUE_DATE, COL_ENTITY_KIND, COL_ENTITY];

const CATALOG_KINDS: &[EntityKind] = &[EntityKind::Drivers, EntityKind::Vehicles];

// ==========================================
// ReminderMapper
// ==========================================
pub struct ReminderMapper;

impl ReminderMapper {
    pub fn new() -> Self {
        Self
    }

    /// 渠道列为自由文本,按关键词拆出 email / push 通知
    fn notifications(row: &RawRow) -> Vec<ReminderNotification> {
        let channels = match normalizer::opt_text(row, COL_CHANNELS) {
            Some(text) => text.to_lowercase(),
            None => return Vec::new(),
        };

        let amount = normalizer::opt_decimal(row, COL_NOTIFY_AMOUNT)
            .map(|n| n as i64)
            .filter(|n| *n > 0)
            .unwrap_or(1);
        let unit = normalizer::opt_text(row, COL_NOTIFY_UNIT)
            .and_then(|raw| NotificationUnit::parse(&raw))
            .unwrap_or(NotificationUnit::Hours);

        let mut notifications = Vec::new();
        if channels.contains("email") {
            notifications.push(ReminderNotification {
                type_id: "email".to_string(),
                amount,
                unit,
            });
        }
        if channels.contains("notificaci") || channels.contains("push") {
            notifications.push(ReminderNotification {
                type_id: "push".to_string(),
                amount,
                unit,
            });
        }
        notifications
    }
}

impl Default for ReminderMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RowMapper for ReminderMapper {
    fn name(&self) -> &'static str {
        "reminder"
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
        let description = normalizer::opt_text(row, COL_DESCRIPTION);
        let limit_date = normalizer::req_utc_date(row, COL_DUE_DATE, Some(COL_DUE_TIME))?;

        let priority_id = normalizer::opt_text(row, COL_PRIORITY)
            .and_then(|raw| ReminderPriority::parse(&raw))
            .unwrap_or(ReminderPriority::Medium);

        let entity_type = normalizer::opt_text(row, COL_ENTITY_KIND)
            .and_then(|raw| ReminderEntityType::parse(&raw))
            .unwrap_or(ReminderEntityType::Drivers);

        let entity_query = normalizer::req_text(row, COL_ENTITY)?;
        let entity = match entity_type {
            ReminderEntityType::Drivers => {
                resolver.resolve(EntityKind::Drivers, COL_ENTITY, &entity_query)?
            }
            ReminderEntityType::Vehicles => {
                resolver.resolve(EntityKind::Vehicles, COL_ENTITY, &entity_query)?
            }
        };

        // 责任人缺省: 目标为司机时由目标本人负责
        let responsible_query = normalizer::opt_text(row, COL_RESPONSIBLE).or_else(|| {
            if entity_type == ReminderEntityType::Drivers {
                Some(entity_query.clone())
            } else {
                None
            }
        });
        let responsible_query = responsible_query.ok_or_else(|| RowError::MissingField {
            field: COL_RESPONSIBLE.to_string(),
        })?;
        let responsible =
            resolver.resolve(EntityKind::Drivers, COL_RESPONSIBLE, &responsible_query)?;

        Ok(Payload::Reminder(ReminderPayload {
            name,
            description,
            limit_date,
            priority_id,
            notifications: Self::notifications(row),
            user_ids: vec![responsible.id],
            entity_type,
            entity_id: entity.id,
            responsible_id: responsible.id,
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
                EntityKind::Drivers,
                vec![
                    CatalogEntry::new(10, "Juan Pérez", Some("juan.perez@flota.es".to_string())),
                    CatalogEntry::new(20, "Ana López", Some("ana.lopez@flota.es".to_string())),
                ],
            ),
            (
                EntityKind::Vehicles,
                vec![CatalogEntry::new(600, "Furgoneta 1", Some("1234ABC".to_string()))],
            ),
        ])
    }

    fn reminder_row(overrides: &[(&str, CellValue)]) -> RawRow {
        let columns = vec![
            COL_NAME,
            COL_DESCRIPTION,
            COL_DUE_DATE,
            COL_DUE_TIME,
            COL_PRIORITY,
            COL_ENTITY_KIND,
            COL_ENTITY,
            COL_RESPONSIBLE,
            COL_CHANNELS,
            COL_NOTIFY_AMOUNT,
            COL_NOTIFY_UNIT,
        ];
        let mut cells = vec![
            CellValue::Text("Renovar ITV".to_string()),
            CellValue::Text("Cita en la estación".to_string()),
            CellValue::Text("15/06/2024".to_string()),
            CellValue::Text("09:00".to_string()),
            CellValue::Text("Alta".to_string()),
            CellValue::Text("Conductores".to_string()),
            CellValue::Text("Juan Pérez".to_string()),
            CellValue::Empty,
            CellValue::Text("Email y Notificación".to_string()),
            CellValue::Number(2.0),
            CellValue::Text("días".to_string()),
        ];
        for (column, value) in overrides {
            let idx = columns.iter().position(|c| c == column).unwrap();
            cells[idx] = value.clone();
        }
        RawRow {
            source_file: Arc::new("tareas.xlsx".to_string()),
            sheet_name: Some(Arc::new("TAREAS".to_string())),
            columns: Arc::new(columns.into_iter().map(String::from).collect()),
            cells,
            row_number: 3,
        }
    }

    #[test]
    fn test_maps_driver_reminder() {
        let cache = test_cache();
        let mapper = ReminderMapper::new();
        let payload = mapper.map(&reminder_row(&[]), &cache).unwrap();

        match payload {
            Payload::Reminder(reminder) => {
                assert_eq!(reminder.name, "Renovar ITV");
                assert_eq!(reminder.priority_id, ReminderPriority::High);
                assert_eq!(reminder.entity_type, ReminderEntityType::Drivers);
                assert_eq!(reminder.entity_id, 10);
                // 责任人缺省为目标司机本人
                assert_eq!(reminder.responsible_id, 10);
                assert_eq!(reminder.user_ids, vec![10]);
                // 夏令时 Madrid 09:00 → UTC 07:00
                assert_eq!(reminder.limit_date, "2024-06-15T07:00:00.000Z");
                assert_eq!(reminder.notifications.len(), 2);
                assert_eq!(reminder.notifications[0].type_id, "email");
                assert_eq!(reminder.notifications[0].amount, 2);
                assert_eq!(reminder.notifications[0].unit, NotificationUnit::Days);
            }
            other => panic!("期望提醒载荷, 得到 {:?}", other.kind_name()),
        }
    }

    #[test]
    fn test_vehicle_reminder_requires_responsible() {
        let cache = test_cache();
        let mapper = ReminderMapper::new();
        let err = mapper
            .map(
                &reminder_row(&[
                    (COL_ENTITY_KIND, CellValue::Text("Vehículos".to_string())),
                    (COL_ENTITY, CellValue::Text("1234-ABC".to_string())),
                ]),
                &cache,
            )
            .unwrap_err();
        assert!(matches!(err, RowError::MissingField { ref field } if field == COL_RESPONSIBLE));
    }

    #[test]
    fn test_vehicle_reminder_with_responsible() {
        let cache = test_cache();
        let mapper = ReminderMapper::new();
        let payload = mapper
            .map(
                &reminder_row(&[
                    (COL_ENTITY_KIND, CellValue::Text("Vehículos".to_string())),
                    (COL_ENTITY, CellValue::Text("1234-ABC".to_string())),
                    (COL_RESPONSIBLE, CellValue::Text("Ana López".to_string())),
                ]),
                &cache,
            )
            .unwrap();
        match payload {
            Payload::Reminder(reminder) => {
                assert_eq!(reminder.entity_type, ReminderEntityType::Vehicles);
                assert_eq!(reminder.entity_id, 600);
                assert_eq!(reminder.responsible_id, 20);
            }
            other => panic!("期望提醒载荷, 得到 {:?}", other.kind_name()),
        }
    }

    #[test]
    fn test_unknown_entity_is_mapping_error() {
        let cache = test_cache();
        let mapper = ReminderMapper::new();
        let err = mapper
            .map(
                &reminder_row(&[(COL_ENTITY, CellValue::Text("Zacarías".to_string()))]),
                &cache,
            )
            .unwrap_err();
        assert!(matches!(err, RowError::EntityNotFound { .. }));
    }

    #[test]
    fn test_no_channels_means_no_notifications() {
        let cache = test_cache();
        let mapper = ReminderMapper::new();
        let payload = mapper
            .map(&reminder_row(&[(COL_CHANNELS, CellValue::Empty)]), &cache)
            .unwrap();
        match payload {
            Payload::Reminder(reminder) => assert!(reminder.notifications.is_empty()),
            other => panic!("期望提醒载荷, 得到 {:?}", other.kind_name()),
        }
    }
}
