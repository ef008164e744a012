#![deny(unsafe_code)]
#![doc = "spark-metacode: 跨服务边界共享的业务错误码、Status 信封与调用元数据契约。"]
#![doc = ""]
#![doc = "== 两个核心 =="]
#![doc = "1. 错误码注册表：进程级唯一的整数错误码、按语言切分的文案表、可跨进程传输的 `Status`。"]
#![doc = "2. 调用元数据：挂载在显式 `CallContext` 上的只读键值表，支持合并、过滤与入站/出站键分类。"]
#![doc = ""]
#![doc = "== 失败分级 =="]
#![doc = "注册冲突、非法业务码、奇数个键值参数、多个过滤器属于编程错误，直接 panic；"]
#![doc = "其余运行期异常（未知码、缺失文案、非法信封、类型不匹配）一律回退为兜底值，不会中断调用。"]

mod macros;

pub mod code;
pub mod contract;
pub mod metadata;
pub mod status;
pub mod time;

pub use code::{
    ACCESS_DENIED, CANCELED, CONFLICT, Code, CodeRegistry, DEADLINE, LIMIT_EXCEED,
    METHOD_NOT_ALLOWED, MessageCatalog, MessageCatalogError, MessageTable, NOT_MODIFIED,
    NOTHING_FOUND, OK, REQUEST_ERR, SERVER_ERR, SERVICE_UNAVAILABLE, SUCCESS, TEMPORARY_REDIRECT,
    UNAUTHORIZED, VALIDATE_ERR, cause_of, equal, equal_error,
};
pub use contract::{CallContext, CallContextBuilder, Cancellation, Deadline, KeyFilter};
pub use metadata::{Metadata, MetadataValue, keys};
pub use status::{Codes, Detail, DetailAny, DetailError, DetailMessage, Status, StatusEnvelope};
pub use time::MonotonicTimePoint;
