use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::messages::{DEFAULT_LOCALE, MessageCatalog, MessageTable};
use super::{Code, PREDEFINED};
use crate::status::Status;

/// 进程级注册表，`Code::register`、`Code::message` 等便捷入口都委托给它。
static GLOBAL: OnceLock<CodeRegistry> = OnceLock::new();

/// 错误码注册表：保存已登记码值集合与当前生效的多语言文案目录。
///
/// # 设计背景（Why）
/// - 启动流程可以显式持有一个 `CodeRegistry` 并传递给需要解析文案的组件；
/// - 跨独立编译模块的场景仍需进程级单例，因此额外提供 [`CodeRegistry::global`]。
///
/// # 逻辑解析（How）
/// - 码值集合由 `parking_lot::Mutex` 保护，只在启动阶段写入，查询文案时不会触碰该锁；
/// - 文案目录放在 [`ArcSwap`] 中，安装新表即整体替换指针：读者要么看到旧目录，要么看到新目录，
///   不会观察到半更新状态，且替换不阻塞读者。
///
/// # 契约说明（What）
/// - 构造时自动登记全部预定义码值；
/// - 重复登记与非正业务码均属配置错误，在调用点直接 panic；
/// - 文案查询永不失败，缺失时回退为十进制字符串。
pub struct CodeRegistry {
    codes: Mutex<BTreeSet<i32>>,
    catalog: ArcSwap<MessageCatalog>,
}

impl CodeRegistry {
    /// 创建已登记全部预定义码值、文案目录为空的注册表。
    pub fn new() -> Self {
        let registry = Self {
            codes: Mutex::new(BTreeSet::new()),
            catalog: ArcSwap::from_pointee(MessageCatalog::new()),
        };
        for code in PREDEFINED {
            registry.register_predefined(code.code());
        }
        registry
    }

    /// 获取进程级注册表，首次访问时惰性初始化。
    pub fn global() -> &'static CodeRegistry {
        GLOBAL.get_or_init(CodeRegistry::new)
    }

    /// 登记业务码，要求 `value > 0` 且未被占用。
    ///
    /// # Panics
    /// - `value <= 0`；
    /// - `value` 已被登记（包括预定义码值 `0` 与 `1`）。
    pub fn register_business(&self, value: i32) -> Code {
        if value <= 0 {
            tracing::error!(code = value, "rejecting non-positive business code");
            panic!("business code must be greater than zero, got {value}");
        }
        self.insert(value)
    }

    /// 登记系统级码值，不检查符号，仅检查唯一性。
    ///
    /// # Panics
    /// - `value` 已被登记。
    pub fn register_predefined(&self, value: i32) -> Code {
        self.insert(value)
    }

    fn insert(&self, value: i32) -> Code {
        let inserted = self.codes.lock().insert(value);
        if !inserted {
            tracing::error!(code = value, "duplicate code registration");
            panic!("metacode code: {value} already exist");
        }
        tracing::debug!(code = value, "code registered");
        Code::from_i32(value)
    }

    /// 查询码值是否已登记。
    pub fn is_registered(&self, value: i32) -> bool {
        self.codes.lock().contains(&value)
    }

    /// 按升序返回已登记码值的快照。
    pub fn registered(&self) -> Vec<Code> {
        self.codes
            .lock()
            .iter()
            .copied()
            .map(Code::from_i32)
            .collect()
    }

    /// 替换默认语言（空字符串）的文案表。
    pub fn install_messages(&self, table: MessageTable) {
        self.install_locale_messages(DEFAULT_LOCALE, table);
    }

    /// 原子替换指定语言的文案表，其余语言保持不变。
    ///
    /// # 执行逻辑（How）
    /// - 通过 `ArcSwap::rcu` 复制当前目录、写入新表后整体发布；并发安装时闭包可能重放，
    ///   因此表本身以 `Arc` 共享，重放只复制指针。
    pub fn install_locale_messages(&self, locale: impl Into<String>, table: MessageTable) {
        let locale = locale.into();
        let entries = table.len();
        let table = Arc::new(table);
        self.catalog.rcu(|current| {
            let mut next = MessageCatalog::clone(current);
            next.insert_shared(locale.clone(), Arc::clone(&table));
            next
        });
        tracing::info!(locale = %locale, entries, "message table installed");
    }

    /// 以整份目录替换全部语言，适用于配置中心推送的全量重载。
    pub fn install_catalog(&self, catalog: MessageCatalog) {
        let locales = catalog.len();
        self.catalog.store(Arc::new(catalog));
        tracing::info!(locales, "message catalog installed");
    }

    /// 当前目录的快照；持有期间不受后续安装影响。
    pub fn catalog(&self) -> Arc<MessageCatalog> {
        self.catalog.load_full()
    }

    /// 解析码值在 `locale` 下的文案，缺失时回退为十进制字符串。
    pub fn message(&self, code: Code, locale: &str) -> String {
        self.catalog
            .load()
            .lookup(code, locale)
            .map(str::to_owned)
            .unwrap_or_else(|| code.error_string())
    }

    /// 构造 `Status`，其文案在构造时从默认语言快照，之后不再随目录变化。
    pub fn status_from_code(&self, code: Code) -> Status {
        Status::new(code, self.message(code, DEFAULT_LOCALE))
    }
}

impl Default for CodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeRegistry")
            .field("registered", &self.codes.lock().len())
            .field("locales", &self.catalog.load().len())
            .finish()
    }
}
