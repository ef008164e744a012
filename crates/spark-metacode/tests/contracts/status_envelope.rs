//! `Status` 与传输信封契约测试。
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：信封是跨进程传播错误的唯一线上形态，折叠规则、降级规则与详情原子追加一旦漂移，
//!   上下游会对同一错误给出不同的文案或丢失诊断数据；
//! - **实施策略 (How)**：以 JSON 字节作为输入输出，覆盖“默认文案折叠”“自定义文案保留”“非信封输入降级”
//!   与“详情编码失败不留半成品”四类场景；
//! - **契约边界 (What)**：测试只依赖公开 API，不窥探 `Status` 内部字段。

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::json;
use spark_metacode::{
    Codes, Detail, DetailAny, DetailError, NOTHING_FOUND, SERVER_ERR, Status, StatusEnvelope,
    VALIDATE_ERR, status,
};
use tracing_test::traced_test;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct FieldViolation {
    field: String,
    reason: String,
}

impl Detail for FieldViolation {
    const TYPE_URL: &'static str = "type.spark/FieldViolation";
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct RetryInfo {
    delay_ms: u64,
}

impl Detail for RetryInfo {
    const TYPE_URL: &'static str = "type.spark/RetryInfo";
}

/// 序列化必定失败的载荷，用于验证原子追加。
#[derive(Debug, Deserialize)]
struct Unencodable;

impl Serialize for Unencodable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("payload refuses to serialize"))
    }
}

impl Detail for Unencodable {
    const TYPE_URL: &'static str = "type.spark/Unencodable";
}

/// 文案与码值文本相同时折叠为纯码值，不保留 `Status` 外壳。
#[test]
fn default_message_collapses_to_bare_code() {
    let bytes = br#"{"code":-500,"message":"-500"}"#;
    let codes = Codes::decode_envelope(bytes);
    match codes {
        Codes::Code(code) => assert_eq!(code, SERVER_ERR),
        Codes::Status(status) => panic!("不应保留 Status 外壳: {status:?}"),
    }
}

/// 缺省 `message` 字段同样视为默认文案。
#[test]
fn missing_message_field_collapses_to_bare_code() {
    let codes = Codes::decode_envelope(br#"{"code":-404}"#);
    assert!(codes.as_status().is_none());
    assert_eq!(codes.code(), NOTHING_FOUND.code());
}

/// 自定义文案连同详情一并保留。
#[test]
fn custom_message_preserves_status() {
    let original = Status::new(SERVER_ERR, "internal failure")
        .with_details(&[&RetryInfo { delay_ms: 250 }])
        .expect("合法载荷应编码成功");
    let bytes = original.to_envelope().encode().expect("信封应编码成功");

    let codes = Codes::decode_envelope(&bytes);
    let status = codes.as_status().expect("自定义文案应保留 Status");
    assert_eq!(status.code(), -500);
    assert_eq!(status.raw_message(), "internal failure");
    assert_eq!(status, &original);
    assert_eq!(
        status.details()[0].unpack::<RetryInfo>().expect("类型一致"),
        RetryInfo { delay_ms: 250 }
    );
}

/// 详情在线上以 `{"@type", "value"}` 自描述，接收方不认识类型时仍可检视内容。
#[test]
fn details_are_self_describing_on_the_wire() {
    let status = Status::new(VALIDATE_ERR, "invalid request")
        .with_details(&[&FieldViolation {
            field: "email".into(),
            reason: "malformed".into(),
        }])
        .expect("合法载荷应编码成功");
    let wire: serde_json::Value =
        serde_json::from_slice(&status.to_envelope().encode().expect("信封应编码成功"))
            .expect("编码结果应为 JSON");

    assert_eq!(
        wire,
        json!({
            "code": -512,
            "message": "invalid request",
            "details": [{
                "@type": "type.spark/FieldViolation",
                "value": { "field": "email", "reason": "malformed" }
            }]
        })
    );

    let decoded = Codes::from_transport_value(&wire);
    let detail: &DetailAny = &decoded.details()[0];
    assert_eq!(detail.type_url(), FieldViolation::TYPE_URL);
    assert_eq!(detail.value()["field"], "email");
    assert!(matches!(
        detail.unpack::<RetryInfo>(),
        Err(DetailError::TypeMismatch { .. })
    ));
}

/// 非信封输入降级为 `SERVER_ERR` 状态，文案中回显非法输入，并以 warn 级别记录。
#[test]
#[traced_test]
fn non_envelope_input_degrades_to_server_error() {
    let codes = Codes::decode_envelope(b"definitely not json");
    let status = codes.as_status().expect("降级结果应为 Status");
    assert_eq!(status.as_code(), SERVER_ERR);
    assert!(
        status.raw_message().contains("definitely not json"),
        "诊断文案应包含非法输入: {}",
        status.raw_message()
    );
    assert!(logs_contain("undecodable status envelope"));
}

/// 结构合法但不是信封的 JSON 值同样降级。
#[test]
fn foreign_transport_value_degrades_to_server_error() {
    let codes = Codes::from_transport_value(&json!({ "unexpected": true }));
    assert_eq!(codes.code(), SERVER_ERR.code());
    assert!(codes.message("").contains("unexpected"));
}

/// 任一载荷编码失败时整批放弃，错误指明失败载荷的序号与类型。
#[test]
fn failing_detail_aborts_the_whole_append() {
    let mut status = Status::new(SERVER_ERR, "busy");
    status
        .append_details(&[&RetryInfo { delay_ms: 5 }])
        .expect("首个载荷应编码成功");

    let err = status
        .append_details(&[&RetryInfo { delay_ms: 10 }, &Unencodable])
        .expect_err("第二个载荷应编码失败");

    match &err {
        DetailError::Encode {
            index, type_url, ..
        } => {
            assert_eq!(*index, 1);
            assert_eq!(type_url, Unencodable::TYPE_URL);
        }
        other => panic!("错误类型不符: {other:?}"),
    }
    assert!(err.to_string().contains("#1"));
    assert_eq!(status.details().len(), 1, "失败的批次不应留下任何条目");
}

/// 纯码值发送时不携带文案，由接收方在本地解析。
#[test]
fn bare_code_round_trips_as_code() {
    let envelope = Codes::from(NOTHING_FOUND).to_envelope();
    let bytes = envelope.encode().expect("信封应编码成功");
    let decoded = Codes::decode_envelope(&bytes);
    assert!(decoded.as_status().is_none());
    assert_eq!(decoded, Codes::from(NOTHING_FOUND));
}

/// `status!` 宏构造的值与直接构造等价，且空文案对外显示码值。
#[test]
fn status_macro_and_empty_message() {
    let formatted = status!(VALIDATE_ERR, "field {} is required", "email");
    assert_eq!(formatted.to_string(), "field email is required");

    let empty = Status::new(VALIDATE_ERR, "");
    assert_eq!(empty.to_string(), "-512");
    assert_eq!(StatusEnvelope::default().code, 0);
}
