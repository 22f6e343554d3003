//! 事件发射器基础库（emitter-core）
//!
//! 定义增强层所消费的外部协作者协议及其最小实现：
//! - 事件键（`event_key`）：名称或唯一符号，以及“一个或多个键”的归一化；
//! - 监听器（`listener`）：按引用判等的共享回调；
//! - 基础发射器（`emitter`）：注册、一次性注册、移除、枚举与同步分发；
//! - 内存实现（`emitter_inmemory`）：用于测试、示例与本地开发；
//! - 统一错误（`error`）。
//!
//! 载荷以 `serde_json::Value` 的有序切片原样转发，发射器不解释其内容。
//!
pub mod emitter;
pub mod emitter_inmemory;
pub mod error;
pub mod event_key;
pub mod listener;

pub use emitter::BaseEmitter;
pub use emitter_inmemory::InMemoryEmitter;
pub use error::{EmitterError, EmitterResult};
pub use event_key::{ERROR_EVENT, EventKey, EventKeys};
pub use listener::{Listener, Listeners};
