// ==========================================
// 物流派车系统 - 订单文件解析器
// ==========================================
// 支持: CSV (.csv)
// 列: date, shift, customers, quantities[, capacity]
// 表头大小写不敏感，兼容中文表头
// ==========================================

use crate::domain::order::OrderLine;
use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, instrument};

const FIELD_DATE: &str = "date";
const FIELD_SHIFT: &str = "shift";
const FIELD_CUSTOMERS: &str = "customers";
const FIELD_QUANTITIES: &str = "quantities";
const FIELD_CAPACITY: &str = "capacity";

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// 表头 → 标准字段名
fn canonical_field(header: &str) -> Option<&'static str> {
    match header.trim().to_ascii_lowercase().as_str() {
        "date" | "日期" => Some(FIELD_DATE),
        "shift" | "班次" => Some(FIELD_SHIFT),
        "customers" | "customer" | "客户" => Some(FIELD_CUSTOMERS),
        "quantities" | "quantity" | "数量" => Some(FIELD_QUANTITIES),
        "capacity" | "载重" | "载重上限" => Some(FIELD_CAPACITY),
        _ => None,
    }
}

// ==========================================
// OrderFileParser
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct OrderFileParser {
    default_capacity: Option<f64>,
}

impl OrderFileParser {
    /// # 参数
    /// - default_capacity: capacity 列缺失或为空时使用
    pub fn new(default_capacity: Option<f64>) -> Self {
        Self { default_capacity }
    }

    /// 解析订单 CSV 文件
    #[instrument(skip(self), fields(path = %file_path.display()))]
    pub fn parse(&self, file_path: &Path) -> ImportResult<Vec<OrderLine>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        if let Some(ext) = file_path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(file_path)?;
        let lines = self.parse_reader(file)?;
        debug!(line_count = lines.len(), "订单文件解析完成");
        Ok(lines)
    }

    /// 从任意读取源解析订单 CSV
    ///
    /// # 返回
    /// 按文件顺序的订单行（空白行跳过）；行号从 1 开始计数（不含表头）
    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<Vec<OrderLine>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许省略末尾 capacity 列
            .from_reader(reader);

        let headers: Vec<Option<&'static str>> =
            reader.headers()?.iter().map(canonical_field).collect();

        let mut lines = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let row = row_idx + 1;

            let mut row_map: HashMap<&'static str, String> = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(Some(field)) = headers.get(col_idx) {
                    row_map.insert(*field, value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            lines.push(self.map_row(row, &row_map)?);
        }

        Ok(lines)
    }

    fn map_row(&self, row: usize, row_map: &HashMap<&'static str, String>) -> ImportResult<OrderLine> {
        let date_raw = required(row, row_map, FIELD_DATE)?;
        let date = parse_date(date_raw).ok_or_else(|| ImportError::DateFormatError {
            row,
            value: date_raw.to_string(),
        })?;

        let shift = required(row, row_map, FIELD_SHIFT)?;
        let customers = required(row, row_map, FIELD_CUSTOMERS)?;
        let quantities = required(row, row_map, FIELD_QUANTITIES)?;

        // 非正的载重上限交由引擎按 InvalidCapacity 报告
        let capacity = match row_map.get(FIELD_CAPACITY).filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse::<f64>().map_err(|e| ImportError::ValueError {
                row,
                field: FIELD_CAPACITY.to_string(),
                message: format!("{}: {}", raw, e),
            })?,
            None => self.default_capacity.ok_or_else(|| ImportError::MissingField {
                row,
                field: FIELD_CAPACITY.to_string(),
            })?,
        };

        Ok(OrderLine::new(customers, quantities, date, shift, capacity))
    }
}

fn required<'a>(
    row: usize,
    row_map: &'a HashMap<&'static str, String>,
    field: &'static str,
) -> ImportResult<&'a str> {
    row_map
        .get(field)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ImportError::MissingField {
            row,
            field: field.to_string(),
        })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
