// ==========================================
// 物流派车系统 - 日志初始化
// ==========================================
// 输出: stderr（stdout 只写批量结果 JSON）
// 级别: RUST_LOG，未设置或无法解析时为 info
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认日志级别
pub const DEFAULT_LOG_FILTER: &str = "info";

/// 测试日志级别（分配决策为 debug）
pub const TEST_LOG_FILTER: &str = "trip_dispatch=debug";

/// 解析日志过滤指令，空白或非法时回退为默认级别
pub fn resolve_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// 批量运行入口调用一次
pub fn init() {
    let directive = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    fmt()
        .with_env_filter(resolve_filter(directive.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 测试用，可重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(TEST_LOG_FILTER))
        .with_test_writer()
        .try_init();
}
