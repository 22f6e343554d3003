//! 幂等移除句柄（Remover）
//!
//! 注册类操作统一返回 `Remover`：首次 `remove()` 执行移除动作，之后的调用均为空操作。
//! 是否已执行由句柄内的标记决定，而不是重新扫描目标列表，
//! 因此即便列表在两次调用之间被清空或重建也不会误删其他条目。
//!
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type RemoveFn = Box<dyn FnOnce() + Send>;

struct RemoverInner {
    removed: AtomicBool,
    action: Mutex<Option<RemoveFn>>,
}

/// 移除句柄：可克隆，所有克隆共享同一个“已移除”标记
#[derive(Clone)]
pub struct Remover {
    inner: Arc<RemoverInner>,
}

impl Remover {
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            inner: Arc::new(RemoverInner {
                removed: AtomicBool::new(false),
                action: Mutex::new(Some(Box::new(action))),
            }),
        }
    }

    /// 合并多个句柄：调用一次即依次调用全部
    pub fn all(removers: Vec<Remover>) -> Self {
        Self::new(move || {
            for remover in &removers {
                remover.remove();
            }
        })
    }

    /// 首次调用执行移除动作并返回 true，此后返回 false
    pub fn remove(&self) -> bool {
        if self.inner.removed.swap(true, Ordering::AcqRel) {
            return false;
        }

        // 先取出动作再释放锁，动作内部可再次调用本句柄
        let action = self
            .inner
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(action) = action {
            action();
        }
        true
    }

    pub fn is_removed(&self) -> bool {
        self.inner.removed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Remover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remover")
            .field("removed", &self.is_removed())
            .finish()
    }
}
