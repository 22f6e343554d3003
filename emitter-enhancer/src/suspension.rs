//! 挂起闸门（SuspensionGate）
//!
//! 全局挂起标记与按事件挂起集合。被挂起的分发直接成为空操作并报告“未处理”，
//! 不调用监听器、过滤器或 else 监听器，也不返回错误。
//!
use dashmap::DashSet;
use emitter_core::EventKey;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct SuspensionGate {
    all: AtomicBool,
    events: DashSet<EventKey>,
}

impl SuspensionGate {
    pub fn set_all(&self, suspended: bool) {
        self.all.store(suspended, Ordering::SeqCst);
    }

    pub fn is_all(&self) -> bool {
        self.all.load(Ordering::SeqCst)
    }

    /// 空键被忽略
    pub fn suspend(&self, event: &EventKey) {
        if event.is_empty() {
            return;
        }
        self.events.insert(event.clone());
    }

    pub fn unsuspend(&self, event: &EventKey) {
        if event.is_empty() {
            return;
        }
        self.events.remove(event);
    }

    pub fn is_event_suspended(&self, event: &EventKey) -> bool {
        self.events.contains(event)
    }

    /// 全局挂起或该事件被挂起
    pub fn blocks(&self, event: &EventKey) -> bool {
        self.is_all() || self.is_event_suspended(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flag_blocks_every_event() {
        let gate = SuspensionGate::default();
        assert!(!gate.blocks(&"a".into()));
        gate.set_all(true);
        assert!(gate.blocks(&"a".into()));
        assert!(gate.blocks(&EventKey::symbol("b")));
        gate.set_all(false);
        assert!(!gate.blocks(&"a".into()));
    }

    #[test]
    fn per_event_marks_are_independent() {
        let gate = SuspensionGate::default();
        gate.suspend(&"a".into());
        assert!(gate.blocks(&"a".into()));
        assert!(!gate.blocks(&"b".into()));

        gate.unsuspend(&"b".into());
        gate.unsuspend(&"a".into());
        assert!(!gate.blocks(&"a".into()));
    }

    #[test]
    fn empty_keys_are_ignored() {
        let gate = SuspensionGate::default();
        gate.suspend(&"".into());
        assert!(!gate.is_event_suspended(&"".into()));
        gate.unsuspend(&"".into());
    }
}
