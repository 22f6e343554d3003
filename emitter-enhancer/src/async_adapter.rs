//! 异步适配器
//!
//! - `emit_async`：分发推迟到调度器的下一轮，完成后可回调 `(event, args, handled)`；
//! - `as_async_listener` / `on_async`：被同步分发调用时只把真实监听器推入队列，立即返回。
//!
//! 延迟执行的监听器运行在原调用栈之外，其 panic 不会传播给分发方，
//! 而是由调度器记录。
//!
use crate::enhanced::EnhancedEmitter;
use crate::remover::Remover;
use emitter_core::{BaseEmitter, EmitterError, EmitterResult, EventKey, Listener};
use serde_json::Value;
use std::sync::Arc;

/// 异步分发完成回调：事件键、载荷、是否被处理
pub type AsyncEmitCallback = Box<dyn FnOnce(&EventKey, &[Value], bool) + Send + 'static>;

impl<E: BaseEmitter> EnhancedEmitter<E> {
    pub(crate) fn shared(&self) -> EmitterResult<Arc<Self>> {
        self.this
            .upgrade()
            .ok_or_else(|| EmitterError::scheduler("emitter is being dropped"))
    }

    /// 推迟分发，不关心结果
    pub fn emit_async(&self, event: impl Into<EventKey>, args: Vec<Value>) -> EmitterResult<()> {
        self.schedule_emit(event.into(), args, None)
    }

    /// 推迟分发，完成后以 `(event, args, handled)` 调用 `callback`
    pub fn emit_async_with<F>(
        &self,
        event: impl Into<EventKey>,
        args: Vec<Value>,
        callback: F,
    ) -> EmitterResult<()>
    where
        F: FnOnce(&EventKey, &[Value], bool) + Send + 'static,
    {
        self.schedule_emit(event.into(), args, Some(Box::new(callback)))
    }

    fn schedule_emit(
        &self,
        event: EventKey,
        args: Vec<Value>,
        callback: Option<AsyncEmitCallback>,
    ) -> EmitterResult<()> {
        event.validate()?;
        let this = self.shared()?;

        self.scheduler.defer(Box::new(move || {
            let handled = this.emit(&event, &args);
            if let Some(callback) = callback {
                callback(&event, &args, handled);
            }
        }))
    }

    /// 包装监听器：每次被调用时把真实调用连同参数副本推入调度队列
    pub fn as_async_listener(&self, listener: Listener) -> Listener {
        let scheduler = self.scheduler.clone();
        Listener::new(move |args| {
            let listener = listener.clone();
            let args = args.to_vec();
            if let Err(err) = scheduler.defer(Box::new(move || listener.call(&args))) {
                tracing::warn!(error = %err, "async listener invocation dropped");
            }
        })
    }

    /// 注册异步监听器；返回的句柄移除的是包装后的监听器
    pub fn on_async(
        &self,
        event: impl Into<EventKey>,
        listener: Listener,
    ) -> EmitterResult<Remover> {
        let event = event.into();
        event.validate()?;
        self.scheduler.ready()?;

        let wrapper = self.as_async_listener(listener);
        self.base.on(&event, wrapper.clone());
        Ok(self.listener_remover(event, wrapper))
    }
}
