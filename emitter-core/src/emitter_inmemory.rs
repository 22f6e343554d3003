//! 内存版发射器（InMemoryEmitter）
//!
//! 基于 `DashMap` 的常规观察者注册表，满足 `BaseEmitter` 协议：
//! - 同一事件的监听器按注册顺序调用；
//! - 一次性监听器在调用前移除；
//! - 调用前先取快照并释放锁，监听器内可再次分发或增删监听器；
//! - 无人监听的 `error` 事件记录为错误日志并返回 false。
//!
use crate::emitter::BaseEmitter;
use crate::event_key::EventKey;
use crate::listener::Listener;
use dashmap::DashMap;
use serde_json::Value;

#[derive(Clone)]
struct Registration {
    listener: Listener,
    once: bool,
}

/// 简单的内存发射器实现
#[derive(Default)]
pub struct InMemoryEmitter {
    registry: DashMap<EventKey, Vec<Registration>>,
}

impl InMemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, event: &EventKey, listener: Listener, once: bool) {
        self.registry
            .entry(event.clone())
            .or_default()
            .push(Registration { listener, once });
    }
}

impl BaseEmitter for InMemoryEmitter {
    fn on(&self, event: &EventKey, listener: Listener) {
        self.register(event, listener, false);
    }

    fn once(&self, event: &EventKey, listener: Listener) {
        self.register(event, listener, true);
    }

    fn remove_listener(&self, event: &EventKey, listener: &Listener) -> bool {
        let removed = match self.registry.get_mut(event) {
            Some(mut regs) => match regs.iter().rposition(|r| r.listener.ptr_eq(listener)) {
                Some(index) => {
                    regs.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        };
        self.registry.remove_if(event, |_, regs| regs.is_empty());
        removed
    }

    fn listeners(&self, event: &EventKey) -> Vec<Listener> {
        self.registry
            .get(event)
            .map(|regs| regs.iter().map(|r| r.listener.clone()).collect())
            .unwrap_or_default()
    }

    fn listener_count(&self, event: &EventKey) -> usize {
        self.registry.get(event).map_or(0, |regs| regs.len())
    }

    fn emit(&self, event: &EventKey, args: &[Value]) -> bool {
        let snapshot: Vec<Listener> = {
            let Some(mut regs) = self.registry.get_mut(event) else {
                if event.is_error() {
                    tracing::error!(payload = ?args, "unhandled error event");
                }
                return false;
            };
            let snapshot = regs.iter().map(|r| r.listener.clone()).collect();
            regs.retain(|r| !r.once);
            snapshot
        };
        self.registry.remove_if(event, |_, regs| regs.is_empty());

        for listener in &snapshot {
            listener.call(args);
        }
        !snapshot.is_empty()
    }

    fn event_names(&self) -> Vec<EventKey> {
        self.registry.iter().map(|e| e.key().clone()).collect()
    }

    fn remove_all_listeners(&self, event: Option<&EventKey>) {
        match event {
            Some(event) => {
                self.registry.remove(event);
            }
            None => self.registry.clear(),
        }
    }
}
