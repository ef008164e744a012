use std::error::Error as StdError;
use std::fmt;

use crate::status::{Codes, DetailAny, Status};

mod messages;
mod registry;

pub use messages::{DEFAULT_LOCALE, MessageCatalog, MessageCatalogError, MessageTable};
pub use registry::CodeRegistry;

/// `Code` 是以有符号整数表达的业务结果码，也是最轻量的错误值。
///
/// # 设计背景（Why）
/// - 跨进程时只需传递一个小整数，文案由两端各自从本地安装的 [`MessageTable`] 解析；
/// - 作为 `Copy` 值类型可直接放进 `Result<T, Code>`，无需堆分配。
///
/// # 契约说明（What）
/// - `0` 表示无条件成功（[`OK`]）；负数保留给预定义的系统级结果；正数由业务通过
///   [`Code::register`] 登记；
/// - 任何码值在进程生命周期内全局唯一，重复登记在启动阶段直接 panic；
/// - [`Code::from_i32`] 仅做包装，不登记，用于解析对端传来的码值。
///
/// # 风险提示（Trade-offs）
/// - 唯一性只在注册表登记时检查；直接 `from_i32` 构造的值不受约束，调用方不应以此替代登记。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code(i32);

/// 正确。
pub const OK: Code = Code(0);
/// 成功。
pub const SUCCESS: Code = Code(1);
/// 木有改动。
pub const NOT_MODIFIED: Code = Code(-304);
/// 撞车跳转。
pub const TEMPORARY_REDIRECT: Code = Code(-307);
/// 请求错误。
pub const REQUEST_ERR: Code = Code(-400);
/// 未认证。
pub const UNAUTHORIZED: Code = Code(-401);
/// 访问权限不足。
pub const ACCESS_DENIED: Code = Code(-403);
/// 啥都木有。
pub const NOTHING_FOUND: Code = Code(-404);
/// 不支持该方法。
pub const METHOD_NOT_ALLOWED: Code = Code(-405);
/// 冲突。
pub const CONFLICT: Code = Code(-409);
/// 客户端取消请求。
pub const CANCELED: Code = Code(-498);
/// 服务器错误。
pub const SERVER_ERR: Code = Code(-500);
/// 过载保护，服务暂不可用。
pub const SERVICE_UNAVAILABLE: Code = Code(-503);
/// 服务调用超时。
pub const DEADLINE: Code = Code(-504);
/// 超出限制。
pub const LIMIT_EXCEED: Code = Code(-509);
/// 服务器请求参数校验出错。
pub const VALIDATE_ERR: Code = Code(-512);

/// 每个注册表在构造时预先登记的系统级码值。
pub(crate) const PREDEFINED: [Code; 16] = [
    OK,
    SUCCESS,
    NOT_MODIFIED,
    TEMPORARY_REDIRECT,
    REQUEST_ERR,
    UNAUTHORIZED,
    ACCESS_DENIED,
    NOTHING_FOUND,
    METHOD_NOT_ALLOWED,
    CONFLICT,
    CANCELED,
    SERVER_ERR,
    SERVICE_UNAVAILABLE,
    DEADLINE,
    LIMIT_EXCEED,
    VALIDATE_ERR,
];

impl Code {
    /// 包装整数而不登记，常用于还原对端传来的码值。
    pub const fn from_i32(value: i32) -> Self {
        Code(value)
    }

    /// 在进程级注册表中登记业务码。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`value > 0` 且尚未被登记；应在启动阶段、开始服务流量之前调用；
    /// - **后置条件**：返回的 `Code` 在进程内唯一；
    /// - **失败语义**：违反前置条件属于配置错误，直接 panic，不返回可恢复错误。
    ///
    /// ```rust
    /// use spark_metacode::Code;
    ///
    /// let order_missing = Code::register(10_404);
    /// assert_eq!(order_missing.code(), 10_404);
    /// ```
    pub fn register(value: i32) -> Self {
        CodeRegistry::global().register_business(value)
    }

    /// 返回整数码值。
    pub const fn code(self) -> i32 {
        self.0
    }

    /// 十进制字符串形式，作为通用的错误身份串。
    pub fn error_string(self) -> String {
        self.0.to_string()
    }

    /// 在进程级注册表当前安装的文案表中查找 `locale` 对应的文案。
    ///
    /// 未安装文案表、缺少该语言或缺少该码值时，回退为十进制字符串。
    pub fn message(self, locale: &str) -> String {
        CodeRegistry::global().message(self, locale)
    }

    /// 纯码值不携带详情。
    pub fn details(self) -> &'static [DetailAny] {
        &[]
    }

    /// 将字符串解析为码值。
    ///
    /// - 空串视为 [`OK`]；
    /// - 非数字串统一映射为 [`SERVER_ERR`]，保证失败信号不会丢失；
    /// - 其余按整数解析。
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return OK;
        }
        text.parse::<i32>().map(Code).unwrap_or(SERVER_ERR)
    }

    /// 判断任意错误解析出的码值是否与当前码值相同，参见 [`equal_error`]。
    pub fn equal_error(self, err: Option<&(dyn StdError + 'static)>) -> bool {
        cause_of(err).code() == self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for Code {}

impl From<i32> for Code {
    fn from(value: i32) -> Self {
        Code(value)
    }
}

impl From<Code> for i32 {
    fn from(code: Code) -> Self {
        code.0
    }
}

/// 从任意错误中还原出 [`Codes`]。
///
/// # 设计意图（Why）
/// - 业务层常把 `Code`/`Status` 包进自定义错误再向上传播；边界处需要重新拿到码值做响应映射；
/// - 匿名的外部错误也不能丢失失败信号，因此最终回退到字符串解析。
///
/// # 执行逻辑（How）
/// 1. `None` 视为成功，返回 [`OK`]；
/// 2. 沿 `source()` 链逐层尝试向下转型为 [`Codes`]、[`Code`]、[`Status`]，命中即返回；
/// 3. 全部未命中时，对最外层错误的 `to_string()` 调用 [`Code::parse`]：数字文本被当作码值，
///    其余文本降级为 [`SERVER_ERR`]。
///
/// # 风险提示（Trade-offs）
/// - 第 3 步会把“恰好是数字的错误文本”当成真实码值，这是有意保留的历史行为。
pub fn cause_of(err: Option<&(dyn StdError + 'static)>) -> Codes {
    let Some(err) = err else {
        return Codes::Code(OK);
    };
    let mut current = Some(err);
    while let Some(candidate) = current {
        if let Some(codes) = candidate.downcast_ref::<Codes>() {
            return codes.clone();
        }
        if let Some(code) = candidate.downcast_ref::<Code>() {
            return Codes::Code(*code);
        }
        if let Some(status) = candidate.downcast_ref::<Status>() {
            return Codes::Status(status.clone());
        }
        current = candidate.source();
    }
    Codes::Code(Code::parse(&err.to_string()))
}

/// 按整数码值比较两个 [`Codes`]，`None` 在任一侧都视为 [`OK`]。
pub fn equal(a: Option<&Codes>, b: Option<&Codes>) -> bool {
    let a = a.map_or(OK.code(), Codes::code);
    let b = b.map_or(OK.code(), Codes::code);
    a == b
}

/// 比较已知码值与任意错误经 [`cause_of`] 还原出的码值。
pub fn equal_error(code: &Codes, err: Option<&(dyn StdError + 'static)>) -> bool {
    cause_of(err).code() == code.code()
}
