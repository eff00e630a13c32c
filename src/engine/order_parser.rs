// ==========================================
// 物流派车系统 - 订单行解析器
// ==========================================
// 职责: 拆分复合订单行为 (客户, 数量) 对，识别整车标记
// 输入: 客户复合串 + 数量复合串
// 输出: ParsedItem 列表（纯函数，无副作用）
// ==========================================

use crate::config::AllocationSettings;
use crate::domain::order::ParsedItem;
use crate::engine::error::{AllocationError, AllocationResult};

/// 默认复合项分隔符
pub const DEFAULT_ITEM_SEPARATOR: &str = ",";

/// 默认整车标记后缀（大小写不敏感）
pub const DEFAULT_LOAD_MARKER: &str = "L";

// ==========================================
// OrderParser - 订单行解析器
// ==========================================
#[derive(Debug, Clone)]
pub struct OrderParser {
    separator: String,
    load_markers: Vec<String>, // 按长度降序，优先匹配最长后缀
}

impl OrderParser {
    /// 构造函数
    ///
    /// # 参数
    /// - `separator`: 复合项分隔符，空串回退为默认值
    /// - `load_markers`: 整车标记后缀列表，空白项被忽略
    pub fn new(separator: impl Into<String>, load_markers: Vec<String>) -> Self {
        let separator = separator.into();
        let separator = if separator.trim().is_empty() {
            DEFAULT_ITEM_SEPARATOR.to_string()
        } else {
            separator
        };

        let mut load_markers: Vec<String> = load_markers
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        load_markers.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then_with(|| a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()))
        });
        load_markers.dedup_by(|a, b| a.eq_ignore_ascii_case(b));

        Self {
            separator,
            load_markers,
        }
    }

    pub fn from_settings(settings: &AllocationSettings) -> Self {
        Self::new(
            settings.item_separator.clone(),
            settings.load_marker_suffixes.clone(),
        )
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 解析订单行
    ///
    /// # 返回
    /// - Ok(Vec<ParsedItem>): 按录入顺序
    /// - Err(CountMismatch): 客户与数量个数不同
    /// - Err(InvalidQuantity): 任一数量不合法
    pub fn parse(&self, customers: &str, quantities: &str) -> AllocationResult<Vec<ParsedItem>> {
        let customer_tokens = self.split_tokens(customers);
        let quantity_tokens = self.split_tokens(quantities);

        if customer_tokens.len() != quantity_tokens.len() {
            return Err(AllocationError::CountMismatch {
                customers: customer_tokens.len(),
                quantities: quantity_tokens.len(),
            });
        }

        customer_tokens
            .iter()
            .zip(quantity_tokens.iter())
            .enumerate()
            .map(|(position, (customer, quantity))| self.parse_item(position, customer, quantity))
            .collect()
    }

    /// 解析单个 (客户, 数量) 对
    pub fn parse_item(
        &self,
        position: usize,
        customer: &str,
        quantity: &str,
    ) -> AllocationResult<ParsedItem> {
        let customer = customer.trim();
        if customer.is_empty() {
            return Err(AllocationError::InvalidQuantity {
                position,
                token: quantity.to_string(),
                reason: "客户为空".to_string(),
            });
        }

        let (amount, fixed) = self.parse_quantity(position, quantity)?;
        Ok(ParsedItem {
            customer: customer.to_string(),
            amount,
            fixed,
        })
    }

    /// 按分隔符拆分，去空白并丢弃空项
    pub fn split_tokens(&self, raw: &str) -> Vec<String> {
        raw.split(self.separator.as_str())
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect()
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn parse_quantity(&self, position: usize, token: &str) -> AllocationResult<(f64, bool)> {
        let trimmed = token.trim();
        let (number_part, fixed) = match self.strip_load_marker(trimmed) {
            Some(rest) => (rest.trim(), true),
            None => (trimmed, false),
        };

        let invalid = |reason: &str| AllocationError::InvalidQuantity {
            position,
            token: token.to_string(),
            reason: reason.to_string(),
        };

        if number_part.is_empty() {
            return Err(invalid("缺少数值"));
        }

        let amount = number_part
            .parse::<f64>()
            .map_err(|_| invalid("不是数字"))?;

        if !amount.is_finite() {
            return Err(invalid("数值非有限"));
        }
        if amount <= 0.0 {
            return Err(invalid("数值必须大于 0"));
        }

        Ok((amount, fixed))
    }

    /// 剥离整车标记后缀（大小写不敏感），未命中返回 None
    fn strip_load_marker<'a>(&self, token: &'a str) -> Option<&'a str> {
        self.load_markers.iter().find_map(|marker| {
            if token.len() < marker.len() {
                return None;
            }
            let split_at = token.len() - marker.len();
            if !token.is_char_boundary(split_at) {
                return None;
            }
            let (rest, suffix) = token.split_at(split_at);
            if suffix.eq_ignore_ascii_case(marker) {
                Some(rest)
            } else {
                None
            }
        })
    }
}

impl Default for OrderParser {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_SEPARATOR, vec![DEFAULT_LOAD_MARKER.to_string()])
    }
}
