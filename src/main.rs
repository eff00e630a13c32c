// ==========================================
// 物流派车系统 - 批量分配入口
// ==========================================
// 用法: trip-dispatch <orders.csv> [carry_over.json]
// 输出: stdout 逐行分配结果 JSON；日志走 stderr
// 结转确认: 按配置 carry_over_batch_policy 非交互处理
// ==========================================

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use trip_dispatch::config::{AllocationSettings, ConfigManager};
use trip_dispatch::db::get_default_db_path;
use trip_dispatch::domain::{CarryOverEntry, CarryOverIndex, OrderLine, Trip, TripCapacity};
use trip_dispatch::engine::{AllocationSummary, SequentialTripIdSupplier, TripAllocationEngine};
use trip_dispatch::importer::{load_carry_over_file, OrderFileParser};
use trip_dispatch::logging;

#[derive(Debug, Serialize)]
struct LineReport {
    line_no: usize,
    date: NaiveDate,
    shift: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trips: Option<Vec<Trip>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<AllocationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchReport {
    settings: AllocationSettings,
    lines: Vec<LineReport>,
    carry_over: Vec<CarryOverEntry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (orders_path, carry_over_path) = match args.as_slice() {
        [orders] => (PathBuf::from(orders), None),
        [orders, carry_over] => (PathBuf::from(orders), Some(PathBuf::from(carry_over))),
        _ => bail!("用法: trip-dispatch <orders.csv> [carry_over.json]"),
    };

    tracing::info!("==================================================");
    tracing::info!("{} - 车次分配批量模式", trip_dispatch::APP_NAME);
    tracing::info!("系统版本: {}", trip_dispatch::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let config = ConfigManager::new(&db_path).map_err(|e| anyhow!(e))?;
    let settings = AllocationSettings::load(&config)
        .await
        .map_err(|e| anyhow!(e))
        .context("加载分配配置失败")?;

    let lines = OrderFileParser::new(settings.default_capacity)
        .parse(&orders_path)
        .with_context(|| format!("读取订单文件失败: {}", orders_path.display()))?;

    let mut index = match &carry_over_path {
        Some(path) => load_carry_over_file(path)
            .with_context(|| format!("读取结转文件失败: {}", path.display()))?,
        None => CarryOverIndex::new(),
    };

    let report = run_batch(&settings, &lines, &mut index).await;
    let failed = report.lines.iter().filter(|l| l.error.is_some()).count();

    println!("{}", serde_json::to_string_pretty(&report)?);

    if failed > 0 {
        tracing::warn!(failed, total = report.lines.len(), "部分订单行分配失败");
    }
    Ok(())
}

/// 按文件顺序逐行分配；车次号按日期各自从 001 编号
async fn run_batch(
    settings: &AllocationSettings,
    lines: &[OrderLine],
    index: &mut CarryOverIndex,
) -> BatchReport {
    let engine = TripAllocationEngine::new(settings);
    let mut policy = settings.batch_approval_policy;
    let mut suppliers: HashMap<NaiveDate, SequentialTripIdSupplier> = HashMap::new();

    let mut reports = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let ids = suppliers
            .entry(line.date)
            .or_insert_with(|| SequentialTripIdSupplier::new(line.date));

        let result = engine
            .allocate_order_line_async(line, index, &mut policy, ids)
            .await;

        let report = match result {
            Ok(trips) => {
                let summary = TripCapacity::new(line.capacity)
                    .map(|capacity| AllocationSummary::from_trips(&trips, capacity));
                LineReport {
                    line_no: i + 1,
                    date: line.date,
                    shift: line.shift.clone(),
                    trips: Some(trips),
                    summary,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(line_no = i + 1, error = %e, "订单行分配失败，已跳过");
                LineReport {
                    line_no: i + 1,
                    date: line.date,
                    shift: line.shift.clone(),
                    trips: None,
                    summary: None,
                    error: Some(e.to_string()),
                }
            }
        };
        reports.push(report);
    }

    let mut carry_over: Vec<CarryOverEntry> = index.entries().cloned().collect();
    carry_over.sort_by(|a, b| (a.date, &a.customer).cmp(&(b.date, &b.customer)));

    BatchReport {
        settings: settings.clone(),
        lines: reports,
        carry_over,
    }
}
