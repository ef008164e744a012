use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::metadata::{Metadata, MetadataValue, keys, parse_bool};
use crate::time::MonotonicTimePoint;

/// [`CallContext::range`] 使用的键过滤器。
pub type KeyFilter<'a> = &'a dyn Fn(&str) -> bool;

/// 取消原语，统一表达跨任务的可中断性。
///
/// # 逻辑解析（How）
/// - 内部以 [`AtomicBool`] 表达取消状态，并通过 [`Arc`] 在父子上下文之间共享；
/// - `cancel` 在首次成功设置取消位时返回 `true`，重复调用返回 `false`。
///
/// # 风险提示（Trade-offs）
/// - 不提供回调注册；调用方需在长耗时路径上自行检查 `is_cancelled`。
#[derive(Clone, Debug)]
pub struct Cancellation {
    inner: Arc<CancellationState>,
}

#[derive(Debug, Default)]
struct CancellationState {
    flag: AtomicBool,
}

impl Cancellation {
    /// 创建处于“未取消”状态的取消令牌。
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState::default()),
        }
    }

    /// 查询当前是否已被标记取消。
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::Acquire)
    }

    /// 将当前令牌标记为取消，返回是否为首次触发。
    pub fn cancel(&self) -> bool {
        self.inner
            .flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// 派生共享同一原子位的子令牌。
    pub fn child(&self) -> Self {
        self.clone()
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// 截止原语，描述操作的最迟完成时间；为空表示未设置硬超时。
///
/// 截止时间不会自动驱动取消，调用方检测到超时后需自行调用 [`Cancellation::cancel`]。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline {
    instant: Option<MonotonicTimePoint>,
}

impl Deadline {
    /// 创建未设置截止时间的实例。
    pub const fn none() -> Self {
        Self { instant: None }
    }

    /// 根据绝对时间点构造截止时间。
    pub fn at(instant: MonotonicTimePoint) -> Self {
        Self {
            instant: Some(instant),
        }
    }

    /// 基于当前时间点加持续时间生成截止时间。
    pub fn with_timeout(now: MonotonicTimePoint, timeout: Duration) -> Self {
        Self::at(now.saturating_add(timeout))
    }

    pub fn instant(&self) -> Option<MonotonicTimePoint> {
        self.instant
    }

    /// 距离截止时间的剩余时长；已超时返回零，未设置截止时间返回 `None`。
    pub fn remaining(&self, now: MonotonicTimePoint) -> Option<Duration> {
        self.instant
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// 判断是否已经超时。
    pub fn is_expired(&self, now: MonotonicTimePoint) -> bool {
        match self.instant {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }
}

#[derive(Debug)]
struct CallContextInner {
    cancellation: Cancellation,
    deadline: Deadline,
    metadata: Option<Arc<Metadata>>,
}

/// 调用上下文：在函数签名之间显式传递取消、截止时间与请求元数据。
///
/// # 设计背景（Why）
/// - 元数据不依赖环境式的隐式查找，而是随上下文参数显式流动，使每个函数的数据来源在签名中可见；
/// - 一个上下文至多挂载一份 [`Metadata`]，重新挂载即替换，不做合并。
///
/// # 契约说明（What）
/// - 挂载的元数据以 `Arc` 共享且只读，并发读者之间无竞争；修改必须先 [`Metadata::copy`]；
/// - [`with_metadata`](Self::with_metadata)、[`with_deadline`](Self::with_deadline) 派生的子上下文
///   共享父级取消令牌；
/// - [`detached`](Self::detached) 派生全新的根上下文，不继承取消与截止时间，只保留元数据副本
///   （去掉 [`keys::TRACE`]），用于在请求结束后继续执行后台任务。
///
/// # 风险提示（Trade-offs）
/// - 克隆成本为一次引用计数递增；派生子上下文会分配新的内部节点。
#[derive(Clone, Debug)]
pub struct CallContext {
    inner: Arc<CallContextInner>,
}

impl CallContext {
    /// 无取消、无截止时间、无元数据的根上下文。
    pub fn background() -> Self {
        CallContextBuilder::default().build()
    }

    /// 创建上下文构建器。
    pub fn builder() -> CallContextBuilder {
        CallContextBuilder::default()
    }

    /// 获取取消原语。
    pub fn cancellation(&self) -> &Cancellation {
        &self.inner.cancellation
    }

    /// 查询截止时间。
    pub fn deadline(&self) -> Deadline {
        self.inner.deadline
    }

    /// 派生挂载 `metadata` 的子上下文，替换（而非合并）已有元数据。
    pub fn with_metadata(&self, metadata: Metadata) -> Self {
        self.derive(self.inner.deadline, Some(Arc::new(metadata)))
    }

    /// 派生具有新截止时间的子上下文，元数据与取消令牌保持共享。
    pub fn with_deadline(&self, deadline: Deadline) -> Self {
        self.derive(deadline, self.inner.metadata.clone())
    }

    fn derive(&self, deadline: Deadline, metadata: Option<Arc<Metadata>>) -> Self {
        Self {
            inner: Arc::new(CallContextInner {
                cancellation: self.inner.cancellation.child(),
                deadline,
                metadata,
            }),
        }
    }

    /// 读取挂载的元数据。返回值只读，修改请在副本上进行。
    pub fn metadata(&self) -> Option<&Metadata> {
        self.inner.metadata.as_deref()
    }

    /// 派生脱离父级生命周期的根上下文。
    ///
    /// # 执行逻辑（How）
    /// - 父级携带元数据时：复制一份、移除追踪标识，挂到全新根上下文；
    /// - 否则返回普通根上下文。
    pub fn detached(&self) -> Self {
        let root = Self::background();
        match self.metadata() {
            Some(metadata) => {
                let mut copy = metadata.copy();
                copy.remove(keys::TRACE);
                root.with_metadata(copy)
            }
            None => root,
        }
    }

    /// 读取原始值；无元数据或缺少该键时返回 `None`。
    pub fn raw_value(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata()?.get(key)
    }

    /// 读取字符串值；无元数据、缺键或类型不符时返回空串。
    pub fn string_value(&self, key: &str) -> &str {
        self.raw_value(key)
            .and_then(MetadataValue::as_str)
            .unwrap_or_default()
    }

    /// 读取 `i64` 值；仅 `Int64` 变体有效，`Int(i32)` 等其他类型返回 `0`。
    pub fn int64_value(&self, key: &str) -> i64 {
        self.raw_value(key)
            .and_then(MetadataValue::as_i64)
            .unwrap_or_default()
    }

    /// 读取布尔值：`Bool(true)` 或可按标准规则解析为真的字符串返回 `true`，其余一律 `false`。
    pub fn bool_value(&self, key: &str) -> bool {
        let Some(value) = self.raw_value(key) else {
            return false;
        };
        value
            .as_bool()
            .or_else(|| value.as_str().and_then(parse_bool))
            .unwrap_or(false)
    }

    /// 遍历元数据条目，仅访问通过过滤器的键；不提供过滤器时访问全部条目。
    ///
    /// # Panics
    /// - 提供了多于一个过滤器。
    ///
    /// ```rust
    /// use spark_metacode::{CallContext, keys, pairs};
    ///
    /// let ctx = CallContext::background()
    ///     .with_metadata(pairs!("foo", "bar", keys::REMOTE_IP, "127.0.0.1"));
    /// let mut forwarded = Vec::new();
    /// ctx.range(|key, _| forwarded.push(key.to_owned()), &[&keys::is_outgoing_key]);
    /// assert_eq!(forwarded, vec![keys::REMOTE_IP.to_owned()]);
    /// ```
    pub fn range<F>(&self, mut visit: F, filters: &[KeyFilter<'_>])
    where
        F: FnMut(&str, &MetadataValue),
    {
        if filters.len() > 1 {
            tracing::error!(filters = filters.len(), "range accepts at most one filter");
            panic!(
                "metadata: Range got {} filters, at most one is allowed",
                filters.len()
            );
        }
        let Some(metadata) = self.metadata() else {
            return;
        };
        let filter = filters.first();
        for (key, value) in metadata {
            if filter.is_none_or(|accept| accept(key.as_str())) {
                visit(key.as_str(), value);
            }
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Display for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deadline = match self.deadline().instant() {
            Some(instant) => format!("{:?}", instant.as_duration()),
            None => "none".to_string(),
        };
        write!(
            f,
            "CallContext{{cancelled={}, deadline={}, metadata={}}}",
            self.cancellation().is_cancelled(),
            deadline,
            self.metadata().map_or(0, Metadata::len)
        )
    }
}

/// `CallContext` 构建器，用于在请求入口一次性组装根上下文。
#[derive(Debug, Default)]
pub struct CallContextBuilder {
    cancellation: Cancellation,
    deadline: Deadline,
    metadata: Option<Metadata>,
}

impl CallContextBuilder {
    /// 设置取消原语。
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// 设置截止时间。
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// 设置初始元数据。
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> CallContext {
        CallContext {
            inner: Arc::new(CallContextInner {
                cancellation: self.cancellation,
                deadline: self.deadline,
                metadata: self.metadata.map(Arc::new),
            }),
        }
    }
}
