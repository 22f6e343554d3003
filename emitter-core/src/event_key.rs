//! 事件键（EventKey）
//!
//! 分发目标的标识：字符串名称或唯一符号（symbol）。
//! 名称可按路径分隔符展开为多级子事件，符号永不展开。
//!
use crate::error::{EmitterError, EmitterResult};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 约定的错误事件名称
pub const ERROR_EVENT: &str = "error";

/// 事件键：名称或唯一符号
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKey {
    Name(Arc<str>),
    Symbol { id: Uuid, description: Arc<str> },
}

impl EventKey {
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        Self::Name(name.into())
    }

    /// 创建唯一符号键：描述相同的两个符号互不相等
    pub fn symbol(description: impl Into<Arc<str>>) -> Self {
        Self::Symbol {
            id: Uuid::new_v4(),
            description: description.into(),
        }
    }

    /// 约定的 `error` 事件键
    pub fn error() -> Self {
        Self::name(ERROR_EVENT)
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Symbol { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.as_name() == Some(ERROR_EVENT)
    }

    /// 空名称视为“缺失”的键
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Name(name) if name.is_empty())
    }

    pub fn validate(&self) -> EmitterResult<()> {
        if self.is_empty() {
            return Err(EmitterError::invalid_argument("event key must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Symbol { description, .. } => write!(f, "Symbol({description})"),
        }
    }
}

impl From<&str> for EventKey {
    fn from(value: &str) -> Self {
        Self::name(value)
    }
}

impl From<String> for EventKey {
    fn from(value: String) -> Self {
        Self::name(value)
    }
}

impl From<&String> for EventKey {
    fn from(value: &String) -> Self {
        Self::name(value.as_str())
    }
}

impl From<&EventKey> for EventKey {
    fn from(value: &EventKey) -> Self {
        value.clone()
    }
}

/// 一个或多个事件键（保持调用方给出的顺序）
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventKeys(Vec<EventKey>);

impl EventKeys {
    pub fn new(keys: Vec<EventKey>) -> Self {
        Self(keys)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventKey> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<EventKey> {
        self.0
    }

    /// 至少一个键，且每个键都非空
    pub fn validate(&self) -> EmitterResult<()> {
        if self.0.is_empty() {
            return Err(EmitterError::invalid_argument("missing event keys"));
        }
        self.0.iter().try_for_each(EventKey::validate)
    }
}

impl From<EventKey> for EventKeys {
    fn from(value: EventKey) -> Self {
        Self(vec![value])
    }
}

impl From<&EventKey> for EventKeys {
    fn from(value: &EventKey) -> Self {
        Self(vec![value.clone()])
    }
}

impl From<&str> for EventKeys {
    fn from(value: &str) -> Self {
        Self(vec![value.into()])
    }
}

impl From<String> for EventKeys {
    fn from(value: String) -> Self {
        Self(vec![value.into()])
    }
}

impl From<Vec<EventKey>> for EventKeys {
    fn from(value: Vec<EventKey>) -> Self {
        Self(value)
    }
}

impl From<Vec<&str>> for EventKeys {
    fn from(value: Vec<&str>) -> Self {
        Self(value.into_iter().map(EventKey::from).collect())
    }
}

impl From<&[&str]> for EventKeys {
    fn from(value: &[&str]) -> Self {
        Self(value.iter().copied().map(EventKey::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EventKeys {
    fn from(value: [&str; N]) -> Self {
        Self(value.into_iter().map(EventKey::from).collect())
    }
}

impl<const N: usize> From<[EventKey; N]> for EventKeys {
    fn from(value: [EventKey; N]) -> Self {
        Self(value.into())
    }
}

impl IntoIterator for EventKeys {
    type Item = EventKey;
    type IntoIter = std::vec::IntoIter<EventKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventKeys {
    type Item = &'a EventKey;
    type IntoIter = std::slice::Iter<'a, EventKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_with_same_description_are_distinct() {
        let a = EventKey::symbol("tick");
        let b = EventKey::symbol("tick");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.to_string(), "Symbol(tick)");
        assert!(a.as_name().is_none());
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(EventKey::from("").is_empty());
        assert!(EventKey::from("").validate().is_err());
        assert!(EventKey::from("ready").validate().is_ok());
        assert!(EventKey::error().is_error());
    }

    #[test]
    fn event_keys_keep_order_and_validate() {
        let keys = EventKeys::from(["a", "b", "a"]);
        let names: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
        assert!(keys.validate().is_ok());

        assert!(EventKeys::default().validate().is_err());
        assert!(EventKeys::from(vec!["ok", ""]).validate().is_err());
        assert_eq!(EventKeys::from("single").len(), 1);
    }
}
