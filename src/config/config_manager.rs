// ==========================================
// 物流派车系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::allocation_config_trait::{AllocationConfigReader, ConfigResult};
use crate::db::{ensure_config_schema, open_sqlite_connection};
use crate::domain::types::ApprovalPolicy;
use crate::engine::order_parser::{DEFAULT_ITEM_SEPARATOR, DEFAULT_LOAD_MARKER};
use crate::engine::trip_allocator::{
    DEFAULT_MAX_TRIPS_PER_LINE, DEFAULT_MAX_WAITING_ITEMS, HARD_MAX_TRIPS_PER_LINE,
    HARD_MAX_WAITING_ITEMS,
};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（config_kv 不存在时自动建表）
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            ensure_config_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 批量运行时记录所用配置，便于复现
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖现有 global 配置
    /// - `__meta_` 前缀的元信息不回写
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            if key.starts_with("__meta_") {
                continue;
            }
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// AllocationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AllocationConfigReader for ConfigManager {
    async fn get_item_separator(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::ITEM_SEPARATOR, DEFAULT_ITEM_SEPARATOR)?;
        if value.trim().is_empty() {
            tracing::warn!(config_key = config_keys::ITEM_SEPARATOR, "分隔符为空，使用默认值");
            return Ok(DEFAULT_ITEM_SEPARATOR.to_string());
        }
        Ok(value)
    }

    async fn get_load_marker_suffixes(&self) -> ConfigResult<Vec<String>> {
        let value =
            self.get_config_or_default(config_keys::LOAD_MARKER_SUFFIXES, DEFAULT_LOAD_MARKER)?;

        let markers: Vec<String> = value
            .split('|')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if markers.is_empty() {
            Ok(vec![DEFAULT_LOAD_MARKER.to_string()])
        } else {
            Ok(markers)
        }
    }

    async fn get_max_waiting_items(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(
            config_keys::MAX_WAITING_ITEMS,
            &DEFAULT_MAX_WAITING_ITEMS.to_string(),
        )?;

        match value.trim().parse::<usize>() {
            Ok(n) if (1..=HARD_MAX_WAITING_ITEMS).contains(&n) => Ok(n),
            _ => {
                tracing::warn!(
                    config_key = config_keys::MAX_WAITING_ITEMS,
                    raw_value = %value,
                    hard_limit = HARD_MAX_WAITING_ITEMS,
                    "待配载项上限配置无效，使用默认值"
                );
                Ok(DEFAULT_MAX_WAITING_ITEMS)
            }
        }
    }

    async fn get_max_trips_per_line(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(
            config_keys::MAX_TRIPS_PER_LINE,
            &DEFAULT_MAX_TRIPS_PER_LINE.to_string(),
        )?;

        match value.trim().parse::<usize>() {
            Ok(n) if (1..=HARD_MAX_TRIPS_PER_LINE).contains(&n) => Ok(n),
            _ => {
                tracing::warn!(
                    config_key = config_keys::MAX_TRIPS_PER_LINE,
                    raw_value = %value,
                    hard_limit = HARD_MAX_TRIPS_PER_LINE,
                    "车次数上限配置无效，使用默认值"
                );
                Ok(DEFAULT_MAX_TRIPS_PER_LINE)
            }
        }
    }

    async fn get_default_capacity(&self) -> ConfigResult<Option<f64>> {
        let value = match self.get_config_value(config_keys::TRIP_CAPACITY_DEFAULT)? {
            Some(v) => v,
            None => return Ok(None),
        };

        match value.trim().parse::<f64>() {
            Ok(c) if c.is_finite() && c > 0.0 => Ok(Some(c)),
            _ => {
                tracing::warn!(
                    config_key = config_keys::TRIP_CAPACITY_DEFAULT,
                    raw_value = %value,
                    "默认载重上限配置无效，忽略"
                );
                Ok(None)
            }
        }
    }

    async fn get_batch_approval_policy(&self) -> ConfigResult<ApprovalPolicy> {
        let value = self.get_config_or_default(config_keys::CARRY_OVER_BATCH_POLICY, "DECLINE_ALL")?;
        Ok(value.parse::<ApprovalPolicy>().unwrap_or_else(|e| {
            tracing::warn!(config_key = config_keys::CARRY_OVER_BATCH_POLICY, error = %e, "按拒绝处理");
            ApprovalPolicy::DeclineAll
        }))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 订单解析
    pub const ITEM_SEPARATOR: &str = "item_separator";
    pub const LOAD_MARKER_SUFFIXES: &str = "load_marker_suffixes"; // 以 | 分隔

    // 车次分配
    pub const MAX_WAITING_ITEMS: &str = "max_waiting_items";
    pub const MAX_TRIPS_PER_LINE: &str = "max_trips_per_line";
    pub const TRIP_CAPACITY_DEFAULT: &str = "trip_capacity_default";

    // 批量模式
    pub const CARRY_OVER_BATCH_POLICY: &str = "carry_over_batch_policy";
}
