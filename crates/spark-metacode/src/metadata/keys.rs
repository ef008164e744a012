//! 常用元数据键及其入站/出站分类。
//!
//! - 出站键：向下游发起请求时需要透传的键；
//! - 入站键：从上游调用方收到时有意义的键，包含全部出站键以及调用方身份。
//!
//! 两个判定函数可直接作为 [`CallContext::range`](crate::CallContext::range) 的过滤器使用。

/// 对端 IP。
pub const REMOTE_IP: &str = "remote_ip";
/// 对端端口。
pub const REMOTE_PORT: &str = "remote_port";
/// 服务端监听地址。
pub const SERVER_ADDR: &str = "server_addr";
/// 客户端地址。
pub const CLIENT_ADDR: &str = "client_addr";
/// 集群标识。
pub const CLUSTER: &str = "cluster";
/// 染色标记，用于灰度与多环境路由。
pub const COLOR: &str = "color";
/// 分布式追踪标识。
pub const TRACE: &str = "trace";
/// 调用方身份。
pub const CALLER: &str = "caller";
/// 调用超时。
pub const TIMEOUT: &str = "timeout";
/// 压测流量标记。
pub const MIRROR: &str = "mirror";
/// 请求重要性等级。
pub const CRITICALITY: &str = "criticality";
/// 用户 ID。
pub const MID: &str = "mid";
/// 设备信息。
pub const DEVICE: &str = "device";
/// 请求 ID。
pub const REQUEST_ID: &str = "request_id";

const OUTGOING: [&str; 6] = [
    COLOR,
    REMOTE_IP,
    REMOTE_PORT,
    MIRROR,
    CRITICALITY,
    REQUEST_ID,
];

const INCOMING_ONLY: [&str; 1] = [CALLER];

/// 是否为需要向下游透传的键。
pub fn is_outgoing_key(key: &str) -> bool {
    OUTGOING.contains(&key)
}

/// 是否为从上游收到时有意义的键。
pub fn is_incoming_key(key: &str) -> bool {
    is_outgoing_key(key) || INCOMING_ONLY.contains(&key)
}
