//! 构造宏。
//!
//! - 仅做语法层面的转换，不隐藏全局状态；
//! - [`pairs!`] 把扁平的 `键, 值, 键, 值 ...` 序列交给 [`Metadata::pairs`](crate::Metadata::pairs)；
//! - [`status!`] 以格式化文案构造 [`Status`](crate::Status)。

/// 以扁平键值序列构造 [`Metadata`](crate::Metadata)。
///
/// # 设计动机（Why）
/// - 入口层常需要一次性写入多种类型的值（字符串、布尔、整数），逐个调用 `insert` 样板过多；
/// - 宏把每个参数经由 `MetadataValue::from` 统一转换，保留与 [`Metadata::pairs`](crate::Metadata::pairs)
///   相同的校验语义。
///
/// # 契约说明（What）
/// - 参数个数必须为偶数，否则在运行期 panic；
/// - 偶数位（0、2、4…）必须是字符串，否则 panic；
/// - 重复键按出现顺序覆盖，最后一次写入生效。
///
/// ```rust
/// use spark_metacode::{keys, pairs};
///
/// let md = pairs!(keys::REMOTE_IP, "127.0.0.1", keys::MIRROR, true);
/// assert_eq!(md.len(), 2);
/// ```
#[macro_export]
macro_rules! pairs {
    () => {
        $crate::Metadata::new()
    };
    ($($item:expr),+ $(,)?) => {
        $crate::Metadata::pairs([$($crate::MetadataValue::from($item)),+])
    };
}

/// 以格式化文案构造 [`Status`](crate::Status)，等价于 [`Status::newf`](crate::Status::newf)。
///
/// ```rust
/// use spark_metacode::{SERVER_ERR, status};
///
/// let status = status!(SERVER_ERR, "shard {} unavailable", 7);
/// assert_eq!(status.raw_message(), "shard 7 unavailable");
/// ```
#[macro_export]
macro_rules! status {
    ($code:expr, $($arg:tt)+) => {
        $crate::Status::newf($code, ::core::format_args!($($arg)+))
    };
}
