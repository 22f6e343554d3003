//! 监听器（Listener）
//!
//! 以 `Arc` 共享的回调，按引用判等：克隆出的句柄与原句柄相等，
//! 内容相同但分别创建的两个监听器互不相等，移除时据此定位。
//!
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type ListenerFn = dyn Fn(&[Value]) + Send + Sync;

/// 事件监听器：接收分发时的载荷参数
#[derive(Clone)]
pub struct Listener(Arc<ListenerFn>);

impl Listener {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// 空监听器
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn call(&self, args: &[Value]) {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// 一个或多个监听器
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listeners(Vec<Listener>);

impl Listeners {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listener> {
        self.0.iter()
    }
}

impl From<Listener> for Listeners {
    fn from(value: Listener) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<Listener>> for Listeners {
    fn from(value: Vec<Listener>) -> Self {
        Self(value)
    }
}

impl<const N: usize> From<[Listener; N]> for Listeners {
    fn from(value: [Listener; N]) -> Self {
        Self(value.into())
    }
}

impl IntoIterator for Listeners {
    type Item = Listener;
    type IntoIter = std::vec::IntoIter<Listener>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
