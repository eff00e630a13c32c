// ==========================================
// 物流派车系统 - 结转文件加载
// ==========================================
// 格式: JSON 数组，元素为 CarryOverEntry
// approved / exhausted 缺省为 false
// ==========================================

use crate::domain::carry_over::{CarryOverEntry, CarryOverIndex};
use crate::importer::error::{ImportError, ImportResult};
use std::fs;
use std::path::Path;

/// 读取结转 JSON 文件并建立索引
pub fn load_carry_over_file(file_path: &Path) -> ImportResult<CarryOverIndex> {
    if !file_path.exists() {
        return Err(ImportError::FileNotFound(file_path.display().to_string()));
    }

    if let Some(ext) = file_path.extension() {
        if !ext.eq_ignore_ascii_case("json") {
            return Err(ImportError::UnsupportedFormat(
                ext.to_string_lossy().to_string(),
            ));
        }
    }

    let content = fs::read_to_string(file_path)?;
    let index = parse_carry_over_json(&content)?;
    tracing::info!(
        path = %file_path.display(),
        entry_count = index.len(),
        "结转余量已加载"
    );
    Ok(index)
}

/// 解析结转 JSON 文本
pub fn parse_carry_over_json(content: &str) -> ImportResult<CarryOverIndex> {
    let entries: Vec<CarryOverEntry> = serde_json::from_str(content)?;
    Ok(CarryOverIndex::from_entries(entries))
}
