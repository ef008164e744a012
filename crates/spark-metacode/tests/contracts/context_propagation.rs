//! 调用上下文传播契约测试。
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：元数据随 `CallContext` 显式流动；派生、脱离、遍历三类操作的语义直接决定
//!   后台任务能否拿到正确的调用方信息、是否会误继承已过期的截止时间或陈旧的追踪标识；
//! - **实施策略 (How)**：用固定的入口元数据构造上下文，分别断言读取器的类型规则、`detached` 的继承规则
//!   与 `range` 的过滤规则；
//! - **风险提示 (Trade-offs)**：`range` 不保证遍历顺序，断言前统一排序。

use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use spark_metacode::{
    CallContext, Cancellation, Deadline, KeyFilter, Metadata, MetadataValue, MonotonicTimePoint,
    keys, pairs,
};
use tracing_test::traced_test;

fn ingress_metadata() -> Metadata {
    pairs!(keys::REMOTE_IP, "127.0.0.1", keys::MIRROR, true)
}

fn context_with<const N: usize>(entries: [(&str, MetadataValue); N]) -> CallContext {
    let md: Metadata = entries.into_iter().collect();
    CallContext::background().with_metadata(md)
}

fn visited_keys(ctx: &CallContext, filters: &[KeyFilter<'_>]) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    ctx.range(
        |key, _| {
            seen.insert(key.to_owned());
        },
        filters,
    );
    seen
}

/// 挂载后可原样读回。
#[test]
fn attached_metadata_reads_back() {
    let ctx = CallContext::background().with_metadata(ingress_metadata());
    assert_eq!(ctx.metadata(), Some(&ingress_metadata()));
    assert!(CallContext::background().metadata().is_none());
}

/// 不含追踪标识时，`detached` 读回的元数据与原值相等。
#[test]
fn detached_keeps_metadata_without_trace() {
    let ctx = CallContext::background().with_metadata(ingress_metadata());
    let detached = ctx.detached();
    assert_eq!(detached.metadata(), Some(&ingress_metadata()));
}

/// 含追踪标识时，`detached` 去掉该键且不影响父上下文。
#[test]
fn detached_strips_trace_identifier() {
    let mut md = ingress_metadata();
    md.insert(keys::TRACE, "trace-7f3a");
    let ctx = CallContext::background().with_metadata(md);

    let detached = ctx.detached();
    let derived = detached.metadata().expect("应保留元数据副本");
    assert!(!derived.contains_key(keys::TRACE));
    assert_eq!(derived.len(), 2);
    // 父上下文保持不变。
    assert_eq!(ctx.string_value(keys::TRACE), "trace-7f3a");
}

/// 未挂载元数据时，`detached` 返回普通根上下文。
#[test]
fn detached_without_metadata_is_plain_root() {
    let token = Cancellation::new();
    let ctx = CallContext::builder()
        .with_cancellation(token.clone())
        .build();
    token.cancel();

    let detached = ctx.detached();
    assert!(detached.metadata().is_none());
    assert!(!detached.cancellation().is_cancelled());
}

/// 派生子上下文共享取消令牌；`detached` 既不继承取消，也不继承截止时间。
#[test]
fn detached_escapes_parent_cancellation_and_deadline() {
    let now = MonotonicTimePoint::from_offset(Duration::from_secs(10));
    let deadline = Deadline::with_timeout(now, Duration::from_millis(200));
    let parent = CallContext::builder()
        .with_deadline(deadline)
        .with_metadata(ingress_metadata())
        .build();
    let child = parent.with_metadata(pairs!("stage", "encode"));
    let detached = parent.detached();

    assert!(parent.cancellation().cancel());
    assert!(child.cancellation().is_cancelled(), "子上下文应共享取消");
    assert_eq!(child.deadline(), deadline);
    // 脱离的上下文既不继承取消，也没有截止时间。
    let much_later = now.saturating_add(Duration::from_secs(60));
    assert!(!detached.cancellation().is_cancelled());
    assert_eq!(detached.deadline(), Deadline::none());
    assert!(!detached.deadline().is_expired(much_later));
}

/// 布尔读取：`Bool(true)`、`"true"`、`"1"` 为真；`"0"`、缺键与无元数据为假。
#[test]
fn bool_value_rules() {
    let ctx = context_with([
        ("flag", true.into()),
        ("text_true", "true".into()),
        ("text_one", "1".into()),
        ("text_zero", "0".into()),
        ("garbage", "yes".into()),
    ]);
    assert!(ctx.bool_value("flag"));
    assert!(ctx.bool_value("text_true"));
    assert!(ctx.bool_value("text_one"));
    assert!(!ctx.bool_value("text_zero"));
    assert!(!ctx.bool_value("garbage"));
    assert!(!ctx.bool_value("absent"));
    assert!(!CallContext::background().bool_value("flag"));
}

/// `int64_value` 只识别 `Int64`，`Int(i32)` 返回零值而不做转换。
#[test]
fn int64_value_rejects_plain_integers() {
    let ctx = context_with([
        ("plain", 42i32.into()),
        ("wide", 42i64.into()),
        ("text", "42".into()),
    ]);
    assert_eq!(ctx.int64_value("plain"), 0);
    assert_eq!(ctx.int64_value("wide"), 42);
    assert_eq!(ctx.int64_value("text"), 0);
    assert_eq!(ctx.int64_value("absent"), 0);
}

/// 字符串读取在类型不符时返回空串，原始值读取器保留原类型。
#[test]
fn string_and_raw_value_readers() {
    let ctx = CallContext::background().with_metadata(ingress_metadata());
    assert_eq!(ctx.string_value(keys::REMOTE_IP), "127.0.0.1");
    assert_eq!(ctx.string_value(keys::MIRROR), "");
    let mirror = MetadataValue::Bool(true);
    assert_eq!(ctx.raw_value(keys::MIRROR), Some(&mirror));
    assert_eq!(CallContext::background().raw_value(keys::MIRROR), None);
}

/// 出站过滤器只访问需要透传的键。
#[test]
fn range_with_outgoing_filter_skips_private_keys() {
    let ctx = context_with([
        ("foo", "bar".into()),
        (keys::REMOTE_IP, "127.0.0.1".into()),
        (keys::MIRROR, "false".into()),
    ]);
    let seen = visited_keys(&ctx, &[&keys::is_outgoing_key]);
    let expected: BTreeSet<String> = [keys::REMOTE_IP, keys::MIRROR]
        .into_iter()
        .map(str::to_owned)
        .collect();
    assert_eq!(seen, expected);
}

/// 入站过滤器额外接受调用方身份，不提供过滤器时访问全部条目。
#[test]
fn range_with_incoming_filter_and_without_filter() {
    let ctx = context_with([
        (keys::CALLER, "billing".into()),
        (keys::COLOR, "blue".into()),
        (keys::TRACE, "t-1".into()),
        ("foo", "bar".into()),
    ]);
    let incoming = visited_keys(&ctx, &[&keys::is_incoming_key]);
    let expected: BTreeSet<String> = [keys::CALLER, keys::COLOR]
        .into_iter()
        .map(str::to_owned)
        .collect();
    assert_eq!(incoming, expected);
    assert_eq!(visited_keys(&ctx, &[]).len(), 4);
}

/// 闭包过滤器与无元数据上下文。
#[test]
fn range_accepts_closures_and_ignores_missing_metadata() {
    let ctx = context_with([
        ("x-a", 1i32.into()),
        ("x-b", 2i32.into()),
        ("y", 3i32.into()),
    ]);
    let prefixed = |key: &str| key.starts_with("x-");
    assert_eq!(visited_keys(&ctx, &[&prefixed]).len(), 2);

    let bare = CallContext::background();
    assert!(visited_keys(&bare, &[&prefixed]).is_empty());
}

/// 提供多于一个过滤器属于使用错误，panic 前记录 error 日志。
#[test]
#[traced_test]
fn range_with_multiple_filters_panics() {
    let ctx = CallContext::background().with_metadata(ingress_metadata());
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        visited_keys(&ctx, &[&keys::is_outgoing_key, &keys::is_incoming_key])
    }));
    assert!(outcome.is_err(), "多个过滤器应触发 panic");
    assert!(logs_contain("range accepts at most one filter"));
}
