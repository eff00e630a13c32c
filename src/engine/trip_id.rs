// ==========================================
// 物流派车系统 - 车次号供给
// ==========================================
// 职责: 定义车次号供给接口；引擎把它当作不透明回调
// 红线: 每个车次调用一次，而非每条记录一次
// ==========================================

use chrono::NaiveDate;
use uuid::Uuid;

/// 车次号供给（调用方保证当日范围内唯一）
pub trait TripIdSupplier {
    fn next_trip_id(&mut self) -> String;
}

impl<F> TripIdSupplier for F
where
    F: FnMut() -> String,
{
    fn next_trip_id(&mut self) -> String {
        self()
    }
}

// ==========================================
// SequentialTripIdSupplier - 按日顺序编号
// ==========================================
// 格式: [prefix]YYYYMMDD-NNN
#[derive(Debug, Clone)]
pub struct SequentialTripIdSupplier {
    prefix: String,
    date: NaiveDate,
    next_seq: u32,
}

impl SequentialTripIdSupplier {
    /// 从 1 开始编号
    pub fn new(date: NaiveDate) -> Self {
        Self::starting_at(date, 1)
    }

    /// 从指定序号继续编号（当日已有车次时使用）
    pub fn starting_at(date: NaiveDate, next_seq: u32) -> Self {
        Self {
            prefix: String::new(),
            date,
            next_seq: next_seq.max(1),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// 下一个将要发放的序号
    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }
}

impl TripIdSupplier for SequentialTripIdSupplier {
    fn next_trip_id(&mut self) -> String {
        let id = format!(
            "{}{}-{:03}",
            self.prefix,
            self.date.format("%Y%m%d"),
            self.next_seq
        );
        self.next_seq = self.next_seq.saturating_add(1);
        id
    }
}

// ==========================================
// UuidTripIdSupplier - 全局唯一编号
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTripIdSupplier;

impl TripIdSupplier for UuidTripIdSupplier {
    fn next_trip_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}
