use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::Code;

/// 未指定语言时使用的默认语言标识。
pub const DEFAULT_LOCALE: &str = "";

/// 单一语言下的 `码值 -> 文案` 映射。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageTable(HashMap<i32, String>);

impl MessageTable {
    /// 创建空表。
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// 写入或覆盖一条文案。
    pub fn insert(&mut self, code: Code, message: impl Into<String>) {
        self.0.insert(code.code(), message.into());
    }

    /// 查找文案。
    pub fn get(&self, code: Code) -> Option<&str> {
        self.0.get(&code.code()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 遍历全部条目，顺序不保证。
    pub fn iter(&self) -> impl Iterator<Item = (Code, &str)> {
        self.0
            .iter()
            .map(|(code, message)| (Code::from_i32(*code), message.as_str()))
    }
}

impl From<HashMap<i32, String>> for MessageTable {
    fn from(map: HashMap<i32, String>) -> Self {
        Self(map)
    }
}

impl<S: Into<String>> FromIterator<(Code, S)> for MessageTable {
    fn from_iter<I: IntoIterator<Item = (Code, S)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(code, message)| (code.code(), message.into()))
                .collect(),
        )
    }
}

/// 配置文档的原始形态：`语言 -> 码值文本 -> 文案`。
type RawCatalog = HashMap<String, HashMap<String, String>>;

/// 按语言切分的文案目录，`语言 -> 文案表`。
///
/// # 契约说明（What）
/// - 每种语言的表以 `Arc` 共享，目录复制只复制指针；
/// - 配置文档形如 `{ "<语言>": { "<码值>": "<文案>" } }`，码值键必须是十进制整数，
///   默认语言使用空字符串键。
#[derive(Clone, Debug, Default)]
pub struct MessageCatalog {
    locales: HashMap<String, Arc<MessageTable>>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入或替换一种语言的表。
    pub fn insert(&mut self, locale: impl Into<String>, table: MessageTable) {
        self.insert_shared(locale.into(), Arc::new(table));
    }

    pub(crate) fn insert_shared(&mut self, locale: String, table: Arc<MessageTable>) {
        self.locales.insert(locale, table);
    }

    /// 获取某种语言的表。
    pub fn table(&self, locale: &str) -> Option<&MessageTable> {
        self.locales.get(locale).map(Arc::as_ref)
    }

    /// 在指定语言下查找文案，不做跨语言回退。
    pub fn lookup(&self, code: Code, locale: &str) -> Option<&str> {
        self.table(locale)?.get(code)
    }

    /// 已安装语言数量。
    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    /// 解析 JSON 格式的文案配置。
    pub fn from_json_str(document: &str) -> Result<Self, MessageCatalogError> {
        let raw: RawCatalog = serde_json::from_str(document)?;
        Self::from_raw(raw)
    }

    /// 解析 TOML 格式的文案配置。
    ///
    /// ```rust
    /// use spark_metacode::{MessageCatalog, NOTHING_FOUND};
    ///
    /// let catalog = MessageCatalog::from_toml_str(r#"
    ///     [zh-CN]
    ///     "-404" = "啥都木有"
    /// "#).unwrap();
    /// assert_eq!(catalog.lookup(NOTHING_FOUND, "zh-CN"), Some("啥都木有"));
    /// ```
    #[cfg(feature = "toml_config")]
    pub fn from_toml_str(document: &str) -> Result<Self, MessageCatalogError> {
        let raw: RawCatalog = toml::from_str(document)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawCatalog) -> Result<Self, MessageCatalogError> {
        let mut catalog = Self::new();
        for (locale, entries) in raw {
            let mut table = MessageTable::new();
            for (key, message) in entries {
                let Ok(code) = key.trim().parse::<i32>() else {
                    return Err(MessageCatalogError::InvalidCode {
                        locale: locale.clone(),
                        key,
                    });
                };
                table.insert(Code::from_i32(code), message);
            }
            catalog.insert(locale, table);
        }
        Ok(catalog)
    }
}

/// 文案配置解析失败。
#[derive(Debug, Error)]
pub enum MessageCatalogError {
    /// JSON 文档结构不合法。
    #[error("failed to parse JSON message catalog: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML 文档结构不合法。
    #[cfg(feature = "toml_config")]
    #[error("failed to parse TOML message catalog: {0}")]
    Toml(#[from] toml::de::Error),
    /// 码值键不是十进制整数。
    #[error("locale `{locale}` contains non-integer code key `{key}`")]
    InvalidCode { locale: String, key: String },
}
