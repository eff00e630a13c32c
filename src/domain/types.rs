// ==========================================
// 物流派车系统 - 领域类型定义
// ==========================================
// 职责: 结转来源、批量确认策略等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与配置/日志一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 结转来源 (Carry-Over Origin)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarryOverOrigin {
    PriorAllocation, // 上一次分配遗留
    SameSubmission,  // 同一次提交中其他行产生
}

impl fmt::Display for CarryOverOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarryOverOrigin::PriorAllocation => write!(f, "PRIOR_ALLOCATION"),
            CarryOverOrigin::SameSubmission => write!(f, "SAME_SUBMISSION"),
        }
    }
}

impl std::str::FromStr for CarryOverOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "PRIOR_ALLOCATION" | "PRIOR" => Ok(CarryOverOrigin::PriorAllocation),
            "SAME_SUBMISSION" | "SAME" => Ok(CarryOverOrigin::SameSubmission),
            other => Err(format!("未知结转来源: {}", other)),
        }
    }
}

// ==========================================
// 结转确认策略 (Approval Policy)
// ==========================================
// 用途: 批量/非交互模式下替代人工确认
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalPolicy {
    ApproveAll, // 全部合并
    DeclineAll, // 全部拒绝
}

impl Default for ApprovalPolicy {
    // 无决策等同于拒绝
    fn default() -> Self {
        ApprovalPolicy::DeclineAll
    }
}

impl fmt::Display for ApprovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalPolicy::ApproveAll => write!(f, "APPROVE_ALL"),
            ApprovalPolicy::DeclineAll => write!(f, "DECLINE_ALL"),
        }
    }
}

impl std::str::FromStr for ApprovalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "APPROVE_ALL" | "APPROVE" => Ok(ApprovalPolicy::ApproveAll),
            "DECLINE_ALL" | "DECLINE" => Ok(ApprovalPolicy::DeclineAll),
            other => Err(format!("未知确认策略: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_display_and_parse() {
        assert_eq!(CarryOverOrigin::PriorAllocation.to_string(), "PRIOR_ALLOCATION");
        assert_eq!(
            "same-submission".parse::<CarryOverOrigin>().unwrap(),
            CarryOverOrigin::SameSubmission
        );
        assert!("tomorrow".parse::<CarryOverOrigin>().is_err());
    }

    #[test]
    fn test_policy_defaults_to_decline() {
        assert_eq!(ApprovalPolicy::default(), ApprovalPolicy::DeclineAll);
        assert_eq!("approve".parse::<ApprovalPolicy>().unwrap(), ApprovalPolicy::ApproveAll);
    }
}
