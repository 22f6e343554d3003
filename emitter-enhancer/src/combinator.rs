//! 注册组合子
//!
//! 基于基础注册原语的批量注册、自动过期与跨发射器转发（proxy），
//! 所有注册均返回幂等的 `Remover`。
//!
use crate::enhanced::EnhancedEmitter;
use crate::remover::Remover;
use bon::Builder;
use emitter_core::{
    BaseEmitter, EmitterError, EmitterResult, EventKey, EventKeys, Listener, Listeners,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// `on_with` 的选项：多事件 × 多监听器，可选异步与自动过期
#[derive(Builder, Clone, Debug)]
pub struct OnOptions {
    #[builder(into)]
    events: EventKeys,
    #[builder(into)]
    listeners: Listeners,
    /// 以 `as_async_listener` 包装每个监听器
    #[builder(default)]
    is_async: bool,
    /// 到期后自动移除全部注册；零时长表示不过期
    timeout: Option<Duration>,
}

impl<E: BaseEmitter> EnhancedEmitter<E> {
    pub(crate) fn listener_remover(&self, event: EventKey, listener: Listener) -> Remover {
        let this = self.this.clone();
        Remover::new(move || {
            if let Some(this) = this.upgrade() {
                this.base.remove_listener(&event, &listener);
            }
        })
    }

    /// 注册监听器，返回绑定该（事件, 监听器）对的移除句柄
    pub fn on(&self, event: impl Into<EventKey>, listener: Listener) -> Remover {
        let event = event.into();
        self.base.on(&event, listener.clone());
        self.listener_remover(event, listener)
    }

    /// 注册一次性监听器
    pub fn once(&self, event: impl Into<EventKey>, listener: Listener) -> Remover {
        let event = event.into();
        self.base.once(&event, listener.clone());
        self.listener_remover(event, listener)
    }

    /// 按选项注册全部（事件, 监听器）组合，返回合并后的移除句柄
    ///
    /// 设置了正的 `timeout` 时，到期自动调用该句柄；提前手动调用会取消自动移除。
    pub fn on_with(&self, options: OnOptions) -> EmitterResult<Remover> {
        options.events.validate()?;
        if options.listeners.is_empty() {
            return Err(EmitterError::invalid_argument("missing listeners"));
        }
        let timeout = options.timeout.filter(|t| !t.is_zero());
        if options.is_async || timeout.is_some() {
            self.scheduler.ready()?;
        }

        let mut removers = Vec::with_capacity(options.events.len() * options.listeners.len());
        for event in options.events.iter() {
            for listener in options.listeners.iter() {
                let listener = if options.is_async {
                    self.as_async_listener(listener.clone())
                } else {
                    listener.clone()
                };
                self.base.on(event, listener.clone());
                removers.push(self.listener_remover(event.clone(), listener));
            }
        }

        let token = CancellationToken::new();
        let remover = {
            let token = token.clone();
            let all = Remover::all(removers);
            Remover::new(move || {
                token.cancel();
                all.remove();
            })
        };

        if let Some(timeout) = timeout {
            let expiring = remover.clone();
            let scheduled = self.scheduler.defer_after(
                timeout,
                token,
                Box::new(move || {
                    if expiring.remove() {
                        tracing::debug!("listeners expired after timeout");
                    }
                }),
            );
            if let Err(err) = scheduled {
                remover.remove();
                return Err(err);
            }
        }

        tracing::debug!(
            events = options.events.len(),
            listeners = options.listeners.len(),
            is_async = options.is_async,
            ?timeout,
            "registered listener set"
        );
        Ok(remover)
    }

    /// 同一监听器注册到多个事件
    pub fn on_any(
        &self,
        events: impl Into<EventKeys>,
        listener: Listener,
    ) -> EmitterResult<Remover> {
        let events = events.into();
        events.validate()?;

        let removers = events
            .into_iter()
            .map(|event| self.on(event, listener.clone()))
            .collect();
        Ok(Remover::all(removers))
    }

    /// 把来源发射器上的事件转发为本发射器的同名事件
    ///
    /// 转发监听器只持有本发射器的弱引用；返回的句柄注销全部转发监听器。
    pub fn proxy_events<S>(
        &self,
        sources: impl IntoIterator<Item = Arc<S>>,
        events: impl Into<EventKeys>,
    ) -> EmitterResult<Remover>
    where
        S: BaseEmitter + ?Sized,
    {
        let sources: Vec<Arc<S>> = sources.into_iter().collect();
        if sources.is_empty() {
            return Err(EmitterError::invalid_argument("missing source emitters"));
        }
        let events = events.into();
        events.validate()?;

        let mut removers = Vec::with_capacity(sources.len() * events.len());
        for event in events.iter() {
            for source in &sources {
                let forward = {
                    let this = self.this.clone();
                    let event = event.clone();
                    Listener::new(move |args| {
                        if let Some(this) = this.upgrade() {
                            this.emit(&event, args);
                        }
                    })
                };
                source.on(event, forward.clone());

                let source = source.clone();
                let event = event.clone();
                removers.push(Remover::new(move || {
                    source.remove_listener(&event, &forward);
                }));
            }
        }

        tracing::debug!(
            sources = sources.len(),
            events = events.len(),
            "proxying events"
        );
        Ok(Remover::all(removers))
    }

    /// 注册空监听器，使该事件始终视为已处理
    pub fn add_noop(&self, event: impl Into<EventKey>) -> Remover {
        self.on(event, Listener::noop())
    }

    /// 为 `error` 事件注册空监听器，抑制未处理错误的上报
    pub fn ignore_error(&self) -> Remover {
        self.add_noop(EventKey::error())
    }

    /// 移除所列事件的全部监听器
    pub fn remove_all_listeners(&self, events: impl Into<EventKeys>) {
        let events: EventKeys = events.into();
        for event in &events {
            self.base.remove_all_listeners(Some(event));
        }
    }

    pub fn clear_listeners(&self) {
        self.base.remove_all_listeners(None);
    }
}
