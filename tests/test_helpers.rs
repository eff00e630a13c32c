// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;
use trip_dispatch::db::{configure_sqlite_connection, ensure_config_schema};
use trip_dispatch::domain::{CarryOverEntry, CarryOverIndex, Trip};
use trip_dispatch::CarryOverOrigin;

/// 创建临时测试数据库并初始化 config_kv
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_test_connection(&db_path)?;
    ensure_config_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 写入 global scope 配置
pub fn insert_test_config(conn: &Connection, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

/// 单条前次分配结转
pub fn carry_over(customer: &str, amount: f64) -> CarryOverIndex {
    let mut index = CarryOverIndex::new();
    index.insert(CarryOverEntry::new(
        customer,
        test_date(),
        "AM",
        amount,
        CarryOverOrigin::PriorAllocation,
    ));
    index
}

/// 按车次号分组的 (客户, 数量)，保持首次出现顺序
pub fn group_by_trip(trips: &[Trip]) -> Vec<(String, Vec<(String, f64)>)> {
    let mut groups: Vec<(String, Vec<(String, f64)>)> = Vec::new();
    for trip in trips {
        match groups.iter_mut().find(|(id, _)| *id == trip.trip_id) {
            Some((_, members)) => members.push((trip.customer.clone(), trip.load())),
            None => groups.push((
                trip.trip_id.clone(),
                vec![(trip.customer.clone(), trip.load())],
            )),
        }
    }
    groups
}
