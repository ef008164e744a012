use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use crate::code::{Code, CodeRegistry};

mod detail;
mod envelope;

pub use detail::{Detail, DetailAny, DetailError, DetailMessage};
pub use envelope::StatusEnvelope;

/// `Status` 是携带码值、文案与结构化详情的富错误值，专为跨进程传输设计。
///
/// # 设计背景（Why）
/// - 纯 [`Code`] 只能表达“哪类失败”；当需要携带动态拼接的说明（如具体字段名）或结构化诊断数据时，
///   使用 `Status` 并在 RPC 边界序列化为 [`StatusEnvelope`]；
/// - 详情对本 crate 不透明，只保证每条都能自描述地独立解码。
///
/// # 契约说明（What）
/// - `message` 可为空，空文案对外回退为十进制码值；
/// - 详情追加具备原子性：任一载荷编码失败时不追加任何一条；
/// - 值在离开进程前可以多次追加详情，跨越边界后视为不可变。
#[derive(Clone, Debug, PartialEq)]
pub struct Status {
    code: i32,
    message: String,
    details: Vec<DetailAny>,
}

impl Status {
    /// 以码值与文案构造。
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// 以格式化参数构造，通常配合 [`status!`](crate::status!) 宏使用。
    pub fn newf(code: Code, args: fmt::Arguments<'_>) -> Self {
        Self::new(code, fmt::format(args))
    }

    /// 从进程级注册表快照文案后构造，之后的文案热更新不影响已构造的值。
    pub fn from_code(code: Code) -> Self {
        CodeRegistry::global().status_from_code(code)
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    /// 以 [`Code`] 形式返回码值。
    pub fn as_code(&self) -> Code {
        Code::from_i32(self.code)
    }

    /// 面向开发者的文案；`Status` 自带文案，因此忽略 `locale`。空文案回退为十进制码值。
    pub fn message(&self, _locale: &str) -> Cow<'_, str> {
        if self.message.is_empty() {
            Cow::Owned(self.code.to_string())
        } else {
            Cow::Borrowed(&self.message)
        }
    }

    /// 构造时传入的原始文案，可能为空。
    pub fn raw_message(&self) -> &str {
        &self.message
    }

    /// 已追加的详情，按追加顺序排列。
    pub fn details(&self) -> &[DetailAny] {
        &self.details
    }

    /// Builder 风格追加详情。
    ///
    /// 失败时返回的错误指明第几条、什么类型编码失败，原值随之丢弃；
    /// 需要在失败后继续使用原值时改用 [`append_details`](Self::append_details)。
    ///
    /// ```rust
    /// use serde::{Deserialize, Serialize};
    /// use spark_metacode::{Detail, Status, VALIDATE_ERR};
    ///
    /// #[derive(Serialize, Deserialize)]
    /// struct FieldViolation {
    ///     field: String,
    /// }
    ///
    /// impl Detail for FieldViolation {
    ///     const TYPE_URL: &'static str = "type.spark/FieldViolation";
    /// }
    ///
    /// let status = Status::new(VALIDATE_ERR, "invalid request")
    ///     .with_details(&[&FieldViolation { field: "email".into() }])
    ///     .unwrap();
    /// assert_eq!(status.details().len(), 1);
    /// ```
    pub fn with_details(mut self, payloads: &[&dyn DetailMessage]) -> Result<Self, DetailError> {
        self.append_details(payloads)?;
        Ok(self)
    }

    /// 就地追加详情：先全部编码，全部成功后才写入。
    pub fn append_details(&mut self, payloads: &[&dyn DetailMessage]) -> Result<(), DetailError> {
        let encoded = payloads
            .iter()
            .enumerate()
            .map(|(index, payload)| DetailAny::encode_at(index, *payload))
            .collect::<Result<Vec<_>, _>>()?;
        self.details.extend(encoded);
        Ok(())
    }

    /// 转换为传输信封。
    pub fn to_envelope(&self) -> StatusEnvelope {
        StatusEnvelope {
            code: self.code,
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }

    pub(crate) fn from_envelope(envelope: StatusEnvelope) -> Self {
        Self {
            code: envelope.code,
            message: envelope.message,
            details: envelope.details,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message(""))
    }
}

impl StdError for Status {}

/// 错误码能力的和类型：纯码值或富 `Status`。
///
/// # 设计意图（Why）
/// - 两种形态对外暴露相同的四项能力：错误串（`Display`）、码值、文案、详情；
/// - [`cause_of`](crate::cause_of) 与信封解码都返回该类型，调用方按需 `match` 取出具体形态。
///
/// # 契约说明（What）
/// - 相等性只比较整数码值，文案与详情不参与比较。
#[derive(Clone, Debug)]
pub enum Codes {
    Code(Code),
    Status(Status),
}

impl Codes {
    pub fn code(&self) -> i32 {
        match self {
            Codes::Code(code) => code.code(),
            Codes::Status(status) => status.code(),
        }
    }

    /// 纯码值走本地文案目录；`Status` 返回自带文案。
    pub fn message(&self, locale: &str) -> Cow<'_, str> {
        match self {
            Codes::Code(code) => Cow::Owned(code.message(locale)),
            Codes::Status(status) => status.message(locale),
        }
    }

    pub fn details(&self) -> &[DetailAny] {
        match self {
            Codes::Code(code) => code.details(),
            Codes::Status(status) => status.details(),
        }
    }

    /// 等价于 `to_string()`。
    pub fn error_string(&self) -> String {
        self.to_string()
    }

    /// 若为 `Status` 形态则返回其引用。
    pub fn as_status(&self) -> Option<&Status> {
        match self {
            Codes::Status(status) => Some(status),
            Codes::Code(_) => None,
        }
    }
}

impl PartialEq for Codes {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for Codes {}

impl fmt::Display for Codes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codes::Code(code) => fmt::Display::fmt(code, f),
            Codes::Status(status) => fmt::Display::fmt(status, f),
        }
    }
}

impl StdError for Codes {}

impl From<Code> for Codes {
    fn from(code: Code) -> Self {
        Codes::Code(code)
    }
}

impl From<Status> for Codes {
    fn from(status: Status) -> Self {
        Codes::Status(status)
    }
}
