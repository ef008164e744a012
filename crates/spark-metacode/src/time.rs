use std::time::Duration;

/// `MonotonicTimePoint` 以相对时间刻度表达单调时钟读数。
///
/// # 设计背景（Why）
/// - [`Deadline`](crate::Deadline) 需要一个可比较、可饱和相加的时间点，但本 crate 不持有计时器；
///   宿主运行时提供读数，这里只负责运算。
///
/// # 契约说明（What）
/// - **前置条件**：参与比较的时间点必须来自同一计时来源。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicTimePoint(Duration);

impl MonotonicTimePoint {
    /// 根据启动以来的偏移量构造时间点。
    pub fn from_offset(offset: Duration) -> Self {
        MonotonicTimePoint(offset)
    }

    /// 返回自启动以来的时间偏移。
    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// 计算两个时间点的饱和差值。
    pub fn saturating_duration_since(&self, earlier: MonotonicTimePoint) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// 基于当前时间点创建新的偏移量。
    pub fn saturating_add(&self, delta: Duration) -> MonotonicTimePoint {
        MonotonicTimePoint(self.0.saturating_add(delta))
    }
}
