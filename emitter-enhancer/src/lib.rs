//! 事件发射器增强层（emitter-enhancer）
//!
//! 在任意 `BaseEmitter` 之外叠加一条分发增强管线，而不重新实现监听器注册表：
//! - 挂起闸门（`suspension`）：整体或按事件静默分发；
//! - 过滤链（`filter`）：全局与按事件的谓词，任一返回 false 即否决本次分发；
//! - 兜底（`fallback`）：无人处理的事件转为 `error` 事件或交给 else 监听器；
//! - 事件路径：`a:b:c` 依次分发 `a`、`a:b`、`a:b:c`；
//! - 异步适配（`async_adapter`）：经调度器（`scheduler`）推迟分发或监听器调用；
//! - 注册组合子（`combinator`）：批量注册、自动过期、跨发射器转发，统一返回 `Remover`；
//! - 增强策略（`enhancer`）：派生新类型、就地标记类型或仅增强单个实例。
//!
//! 示例：
//! ```rust,ignore
//! let enhancer = Enhancer::default();
//! let emitter = enhancer.extend::<InMemoryEmitter>()?.create_default();
//! emitter.else_error("missing");
//! let remover = emitter.on("ready", Listener::new(|args| println!("{args:?}")));
//! emitter.emit(&"ready".into(), &[json!(1)]);
//! remover.remove();
//! ```
//!
pub mod async_adapter;
pub mod combinator;
pub mod config;
pub mod enhanced;
pub mod enhancer;
pub mod fallback;
pub mod filter;
pub mod remover;
pub mod scheduler;
pub mod suspension;

pub use async_adapter::AsyncEmitCallback;
pub use combinator::OnOptions;
pub use config::{EnhanceMode, EnhancerConfig};
pub use enhanced::EnhancedEmitter;
pub use enhancer::{EnhancedType, Enhancer, is_enhanced_type};
pub use fallback::{ElseHandle, ElseListener, ElseRegistry, UnhandledEvent};
pub use filter::{Filter, FilterChain, FilterScope};
pub use remover::Remover;
pub use scheduler::{DeferredScheduler, DeferredTask, TokioScheduler};
pub use suspension::SuspensionGate;

pub use emitter_core::{
    BaseEmitter, ERROR_EVENT, EmitterError, EmitterResult, EventKey, EventKeys, InMemoryEmitter,
    Listener, Listeners,
};
