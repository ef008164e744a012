use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::sync::Arc;

pub mod keys;

/// 元数据值，覆盖入口层最常写入的几种类型，并以 `Opaque` 承载任意类型。
///
/// # 契约说明（What）
/// - 各变体互不转换：`Int(i32)` 不会被当作 `Int64` 读取，类型不符时读取方得到零值；
/// - `Opaque` 以 `Arc<dyn Any>` 共享，比较时按指针判断是否为同一实例。
#[derive(Clone)]
#[non_exhaustive]
pub enum MetadataValue {
    Str(String),
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f64),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl MetadataValue {
    /// 包装任意类型。
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        MetadataValue::Opaque(Arc::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// 仅 `Int64` 变体返回值。
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int64(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// `Opaque` 变体向下转型。
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            MetadataValue::Opaque(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// 变体名称，用于诊断信息。
    pub fn kind(&self) -> &'static str {
        match self {
            MetadataValue::Str(_) => "string",
            MetadataValue::Bool(_) => "bool",
            MetadataValue::Int(_) => "i32",
            MetadataValue::Int64(_) => "i64",
            MetadataValue::Float(_) => "f64",
            MetadataValue::Opaque(_) => "opaque",
        }
    }
}

impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MetadataValue::Str(a), MetadataValue::Str(b)) => a == b,
            (MetadataValue::Bool(a), MetadataValue::Bool(b)) => a == b,
            (MetadataValue::Int(a), MetadataValue::Int(b)) => a == b,
            (MetadataValue::Int64(a), MetadataValue::Int64(b)) => a == b,
            (MetadataValue::Float(a), MetadataValue::Float(b)) => a == b,
            (MetadataValue::Opaque(a), MetadataValue::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Str(value) => write!(f, "{value:?}"),
            MetadataValue::Bool(value) => write!(f, "{value}"),
            MetadataValue::Int(value) => write!(f, "{value}i32"),
            MetadataValue::Int64(value) => write!(f, "{value}i64"),
            MetadataValue::Float(value) => write!(f, "{value}f64"),
            MetadataValue::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<&String> for MetadataValue {
    fn from(value: &String) -> Self {
        MetadataValue::Str(value.clone())
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int64(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

/// 请求级键值旁路信道，随 [`CallContext`](crate::CallContext) 传播。
///
/// # 设计背景（Why）
/// - 入口层写入对端地址、调用方身份、压测标记等信息，下游按需读取或转发；
/// - 一次请求中多个任务共享同一份元数据，因此挂载后只读，任何修改都发生在副本上。
///
/// # 契约说明（What）
/// - 键唯一，不保证遍历顺序；
/// - [`join`](Self::join)、[`copy`](Self::copy)、[`pairs`](Self::pairs) 都返回全新的值，浅拷贝各条目。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata(HashMap<String, MetadataValue>);

impl Metadata {
    /// 创建空元数据。
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// 浅拷贝给定映射。
    pub fn from_map(map: &HashMap<String, MetadataValue>) -> Self {
        Self(map.clone())
    }

    /// 以扁平的 `键, 值, 键, 值 ...` 序列构造。
    ///
    /// # Panics
    /// - 序列长度为奇数；
    /// - 偶数位元素不是字符串。
    ///
    /// 重复键按序列顺序覆盖，最后一次写入生效。
    pub fn pairs<I>(kv: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MetadataValue>,
    {
        let items: Vec<MetadataValue> = kv.into_iter().map(Into::into).collect();
        if items.len() % 2 == 1 {
            tracing::error!(len = items.len(), "odd number of metadata pair items");
            panic!(
                "metadata: Pairs got the odd number of input pairs for metadata: {}",
                items.len()
            );
        }
        let mut md = Metadata::new();
        let mut items = items.into_iter();
        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            let key = match key {
                MetadataValue::Str(key) => key,
                other => {
                    tracing::error!(kind = other.kind(), "non-string metadata pair key");
                    panic!("metadata: Pairs key must be a string, got {}", other.kind());
                }
            };
            md.0.insert(key, value);
        }
        md
    }

    /// 合并任意个元数据，重复键以靠后的参数为准；空输入得到空元数据。
    pub fn join<'a, I>(mds: I) -> Self
    where
        I: IntoIterator<Item = &'a Metadata>,
    {
        let mut out = Metadata::new();
        for md in mds {
            for (key, value) in &md.0 {
                out.0.insert(key.clone(), value.clone());
            }
        }
        out
    }

    /// 全新的浅拷贝，等价于 `Metadata::join([self])`。
    pub fn copy(&self) -> Self {
        Self::join([self])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// 写入或覆盖，返回旧值。只应作用于尚未挂载到上下文的副本。
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Option<MetadataValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.0.remove(key)
    }

    /// 遍历全部条目，顺序不保证。
    pub fn iter(&self) -> hash_map::Iter<'_, String, MetadataValue> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a MetadataValue);
    type IntoIter = hash_map::Iter<'a, String, MetadataValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<String>,
    V: Into<MetadataValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// 按标准布尔字符串规则解析：`1 t T TRUE true True` 为真，`0 f F FALSE false False` 为假。
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
