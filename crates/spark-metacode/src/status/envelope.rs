use serde::{Deserialize, Serialize};

use super::{Codes, DetailAny, Status};
use crate::code::{Code, SERVER_ERR};

/// 诊断文案中回显的非法输入最大长度。
const ECHO_LIMIT: usize = 128;

/// `Status` 在 RPC 边界上的线上形态。
///
/// # 契约说明（What）
/// - `code`：32 位有符号整数；
/// - `message`：可为空；空串或等于十进制码值时，接收方应在本地解析文案；
/// - `details`：有序、自描述的详情载荷，接收方无需预知类型即可解码。
/// - JSON 为参考编码；字段缺省时 `message` 视为空串、`details` 视为空列表，`code` 必须存在。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEnvelope {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<DetailAny>,
}

impl StatusEnvelope {
    /// 编码为 JSON 字节。
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// 从 JSON 字节解码。
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// 文案是否为空或仅为码值本身，即“未携带自定义文案”。
    pub fn carries_default_message(&self) -> bool {
        self.message.is_empty() || self.message == self.code.to_string()
    }
}

impl Codes {
    /// 还原接收到的信封。
    ///
    /// # 执行逻辑（How）
    /// - 文案为空或与十进制码值完全一致时，折叠为纯 [`Codes::Code`]，由接收方使用本地文案目录解析；
    /// - 否则保留完整 [`Status`]，包括原始文案与详情。
    ///
    /// ```rust
    /// use spark_metacode::{Codes, SERVER_ERR, StatusEnvelope};
    ///
    /// let bare = Codes::from_envelope(StatusEnvelope {
    ///     code: -500,
    ///     message: "-500".into(),
    ///     ..Default::default()
    /// });
    /// assert!(matches!(bare, Codes::Code(code) if code == SERVER_ERR));
    /// ```
    pub fn from_envelope(envelope: StatusEnvelope) -> Codes {
        if envelope.carries_default_message() {
            Codes::Code(Code::from_i32(envelope.code))
        } else {
            Codes::Status(Status::from_envelope(envelope))
        }
    }

    /// 解码线上字节；无法解析为信封的输入降级为携带诊断文案的 [`SERVER_ERR`] `Status`。
    pub fn decode_envelope(bytes: &[u8]) -> Codes {
        match StatusEnvelope::decode(bytes) {
            Ok(envelope) => Codes::from_envelope(envelope),
            Err(err) => {
                let input = echo(&String::from_utf8_lossy(bytes));
                tracing::warn!(error = %err, input = %input, "undecodable status envelope");
                Codes::Status(crate::status!(
                    SERVER_ERR,
                    "invalid status envelope, got {input}: {err}"
                ))
            }
        }
    }

    /// 从已解析的 JSON 值还原；值不是信封时同样降级为 [`SERVER_ERR`] `Status`。
    pub fn from_transport_value(value: &serde_json::Value) -> Codes {
        match StatusEnvelope::deserialize(value) {
            Ok(envelope) => Codes::from_envelope(envelope),
            Err(err) => {
                let input = echo(&value.to_string());
                tracing::warn!(
                    error = %err,
                    input = %input,
                    "transport value is not a status envelope"
                );
                Codes::Status(crate::status!(
                    SERVER_ERR,
                    "invalid status envelope, got {input}: {err}"
                ))
            }
        }
    }

    /// 转换为待发送的信封；纯码值以空文案发送，让接收方本地解析。
    pub fn to_envelope(&self) -> StatusEnvelope {
        match self {
            Codes::Code(code) => StatusEnvelope {
                code: code.code(),
                ..StatusEnvelope::default()
            },
            Codes::Status(status) => status.to_envelope(),
        }
    }
}

fn echo(input: &str) -> String {
    if input.chars().count() <= ECHO_LIMIT {
        return input.to_owned();
    }
    let mut truncated: String = input.chars().take(ECHO_LIMIT).collect();
    truncated.push('…');
    truncated
}
