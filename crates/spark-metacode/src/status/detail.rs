use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 可作为 [`Status`](crate::Status) 详情携带的结构化载荷。
///
/// # 契约说明（What）
/// - `TYPE_URL` 是跨进程稳定的类型标识，接收方据此判断能否 [`DetailAny::unpack`]；
/// - 载荷通过 serde 编码为 JSON 值，因此即使接收方不认识该类型也能以 [`DetailAny::value`] 检视内容。
pub trait Detail: Serialize + DeserializeOwned {
    const TYPE_URL: &'static str;
}

/// [`Detail`] 的对象安全投影，允许一次追加多种类型的载荷。
pub trait DetailMessage {
    fn type_url(&self) -> &str;

    fn encode_value(&self) -> Result<Value, serde_json::Error>;
}

impl<T: Detail> DetailMessage for T {
    fn type_url(&self) -> &str {
        T::TYPE_URL
    }

    fn encode_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// 自描述的详情载荷：`{"@type": <类型标识>, "value": <JSON 值>}`。
///
/// # 设计背景（Why）
/// - 详情在传输中必须能在不预知类型的情况下独立解码，故以类型标识加自描述 JSON 值的标签联合表示；
/// - 接收方认识该类型时再按需 `unpack` 为具体结构体。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailAny {
    #[serde(rename = "@type")]
    type_url: String,
    value: Value,
}

impl DetailAny {
    /// 将具体类型编码为载荷。
    pub fn pack<T: Detail>(detail: &T) -> Result<Self, DetailError> {
        Self::encode_at(0, detail)
    }

    pub(crate) fn encode_at(index: usize, item: &dyn DetailMessage) -> Result<Self, DetailError> {
        let type_url = item.type_url().to_owned();
        match item.encode_value() {
            Ok(value) => Ok(Self { type_url, value }),
            Err(source) => Err(DetailError::Encode {
                index,
                type_url,
                source,
            }),
        }
    }

    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    /// 未经类型化的 JSON 内容。
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// 是否为 `T` 类型的载荷。
    pub fn is<T: Detail>(&self) -> bool {
        self.type_url == T::TYPE_URL
    }

    /// 解码为具体类型；类型标识不符或内容不匹配时返回错误。
    pub fn unpack<T: Detail>(&self) -> Result<T, DetailError> {
        if !self.is::<T>() {
            return Err(DetailError::TypeMismatch {
                expected: T::TYPE_URL,
                found: self.type_url.clone(),
            });
        }
        match T::deserialize(&self.value) {
            Ok(detail) => Ok(detail),
            Err(source) => Err(DetailError::Decode {
                type_url: self.type_url.clone(),
                source,
            }),
        }
    }
}

/// 详情编解码失败。
#[derive(Debug, Error)]
pub enum DetailError {
    /// 第 `index` 条载荷无法编码，整批追加被放弃。
    #[error("detail #{index} (`{type_url}`) cannot be encoded: {source}")]
    Encode {
        index: usize,
        type_url: String,
        #[source]
        source: serde_json::Error,
    },
    /// 载荷类型标识与期望类型不符。
    #[error("detail type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    /// 类型标识相符但内容无法解码。
    #[error("detail `{type_url}` cannot be decoded: {source}")]
    Decode {
        type_url: String,
        #[source]
        source: serde_json::Error,
    },
}
