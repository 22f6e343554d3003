//! 基础发射器（BaseEmitter）协议
//!
//! 定义观察者模式发射器需要提供的最小注册表操作：注册、一次性注册、移除、
//! 枚举与同步分发。增强层只消费这些操作，不重新实现它们。
//!
use crate::{event_key::EventKey, listener::Listener};
use serde_json::Value;

/// 基础发射器：负责监听器注册表与同步分发
pub trait BaseEmitter: Send + Sync + 'static {
    fn on(&self, event: &EventKey, listener: Listener);

    /// 注册一次性监听器：首次分发前即被移除
    fn once(&self, event: &EventKey, listener: Listener);

    /// 移除一个匹配（按引用）的注册，返回是否确有移除
    fn remove_listener(&self, event: &EventKey, listener: &Listener) -> bool;

    fn listeners(&self, event: &EventKey) -> Vec<Listener>;

    fn listener_count(&self, event: &EventKey) -> usize {
        self.listeners(event).len()
    }

    /// 同步分发：至少一个监听器被调用时返回 true
    fn emit(&self, event: &EventKey, args: &[Value]) -> bool;

    fn event_names(&self) -> Vec<EventKey>;

    /// `None` 表示移除全部事件的监听器
    fn remove_all_listeners(&self, event: Option<&EventKey>);

    /// 是否已携带增强能力（用于阻止重复增强）
    fn is_enhanced(&self) -> bool {
        false
    }
}
