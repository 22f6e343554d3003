//! else 监听器与 else-error（ElseRegistry）
//!
//! 分发未被任何监听器处理时的兜底：
//! - 标记为 else-error 的事件合成一次 `error` 事件分发；
//! - 否则按注册顺序调用全部 else 监听器，视为已处理。
//!
//! else 监听器通过 `ElseHandle::remove_self` 在自身回调内移除自己。
//!
use dashmap::DashSet;
use emitter_core::{EmitterError, EventKey};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

type ElseFn = dyn Fn(&ElseHandle, &EventKey, &[Value]) + Send + Sync;

/// else 监听器：接收事件键与原始载荷
#[derive(Clone)]
pub struct ElseListener(Arc<ElseFn>);

impl ElseListener {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ElseHandle, &EventKey, &[Value]) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn ptr_eq(&self, other: &ElseListener) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ElseListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElseListener")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

type ElseList = RwLock<Vec<ElseListener>>;

/// 调用时传给 else 监听器的自身句柄
pub struct ElseHandle {
    listener: ElseListener,
    list: Weak<ElseList>,
}

impl ElseHandle {
    pub fn listener(&self) -> &ElseListener {
        &self.listener
    }

    /// 移除当前监听器的全部注册，下一次分发生效
    pub fn remove_self(&self) {
        if let Some(list) = self.list.upgrade() {
            remove_all(&list, &self.listener);
        }
    }
}

fn remove_all(list: &ElseList, listener: &ElseListener) -> usize {
    let mut list = list.write().unwrap_or_else(PoisonError::into_inner);
    let before = list.len();
    list.retain(|l| !l.ptr_eq(listener));
    before - list.len()
}

#[derive(Default)]
pub struct ElseRegistry {
    listeners: Arc<ElseList>,
    error_events: DashSet<EventKey>,
}

impl ElseRegistry {
    pub fn add(&self, listener: ElseListener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// 删除该监听器的所有出现，返回删除数量
    pub fn remove(&self, listener: &ElseListener) -> usize {
        remove_all(&self.listeners, listener)
    }

    pub fn clear(&self) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mark_error(&self, event: &EventKey) {
        if event.is_empty() {
            return;
        }
        self.error_events.insert(event.clone());
    }

    pub fn unmark_error(&self, event: &EventKey) {
        if event.is_empty() {
            return;
        }
        self.error_events.remove(event);
    }

    pub fn is_error_event(&self, event: &EventKey) -> bool {
        self.error_events.contains(event)
    }

    /// 以快照调用全部 else 监听器，无监听器时返回 false
    pub fn invoke(&self, event: &EventKey, args: &[Value]) -> bool {
        let snapshot: Vec<ElseListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if snapshot.is_empty() {
            return false;
        }

        let list = Arc::downgrade(&self.listeners);
        for listener in snapshot {
            let handle = ElseHandle {
                listener,
                list: list.clone(),
            };
            (handle.listener.0)(&handle, event, args);
        }
        true
    }
}

/// else-error 合成的 `error` 事件载荷
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "unhandled_event")]
pub struct UnhandledEvent {
    pub event: String,
    pub message: String,
}

impl UnhandledEvent {
    pub fn new(event: &EventKey) -> Self {
        let event = event.to_string();
        let message = EmitterError::unhandled_event(event.clone()).to_string();
        Self { event, message }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "kind": "unhandled_event",
            "event": self.event,
            "message": self.message,
        })
    }

    /// 从 `error` 事件载荷还原，形状不符时返回 None
    pub fn from_payload(payload: &Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn invoke_calls_listeners_in_order_with_event_and_args() {
        let registry = ElseRegistry::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second"] {
            let log = log.clone();
            registry.add(ElseListener::new(move |_, event, args| {
                log.lock().unwrap().push(format!("{name}:{event}:{}", args.len()));
            }));
        }

        assert!(registry.invoke(&"y".into(), &[json!(1), json!(2)]));
        assert_eq!(*log.lock().unwrap(), vec!["first:y:2", "second:y:2"]);
    }

    #[test]
    fn empty_registry_does_not_handle() {
        let registry = ElseRegistry::default();
        assert!(!registry.invoke(&"y".into(), &[]));
    }

    #[test]
    fn remove_deletes_every_occurrence() {
        let registry = ElseRegistry::default();
        let listener = ElseListener::new(|_, _, _| {});
        registry.add(listener.clone());
        registry.add(ElseListener::new(|_, _, _| {}));
        registry.add(listener.clone());

        assert_eq!(registry.remove(&listener), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.remove(&listener), 0);
    }

    #[test]
    fn listener_can_remove_itself_through_handle() {
        let registry = ElseRegistry::default();
        let calls = Arc::new(Mutex::new(0));
        {
            let calls = calls.clone();
            registry.add(ElseListener::new(move |handle, _, _| {
                *calls.lock().unwrap() += 1;
                handle.remove_self();
            }));
        }

        assert!(registry.invoke(&"a".into(), &[]));
        assert!(!registry.invoke(&"a".into(), &[]));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn unhandled_event_payload_round_trips() {
        let payload = UnhandledEvent::new(&"orders".into()).to_payload();
        assert_eq!(payload["message"], "no listener attached for event: orders");

        let parsed = UnhandledEvent::from_payload(&payload).unwrap();
        assert_eq!(parsed.event, "orders");
        assert!(UnhandledEvent::from_payload(&json!("boom")).is_none());
    }

    #[test]
    fn else_error_marks_ignore_empty_keys() {
        let registry = ElseRegistry::default();
        registry.mark_error(&"".into());
        registry.mark_error(&"x".into());
        assert!(registry.is_error_event(&"x".into()));
        assert!(!registry.is_error_event(&"".into()));
        registry.unmark_error(&"x".into());
        assert!(!registry.is_error_event(&"x".into()));
    }
}
