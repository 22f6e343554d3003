//! 过滤链（FilterChain）
//!
//! 分发前运行的同步谓词：先全局过滤器、后事件过滤器，各自按注册顺序；
//! 任一过滤器返回 false 即短路，后续过滤器与监听器都不再调用。
//!
use dashmap::DashMap;
use emitter_core::{EmitterResult, EventKey};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::remover::Remover;

type FilterFn = dyn Fn(&EventKey, &[Value]) -> bool + Send + Sync;

/// 过滤器：返回 true 继续分发，false 否决
#[derive(Clone)]
pub struct Filter(Arc<FilterFn>);

impl Filter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&EventKey, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn check(&self, event: &EventKey, args: &[Value]) -> bool {
        (self.0)(event, args)
    }

    pub fn ptr_eq(&self, other: &Filter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Filter")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// 过滤器作用域
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterScope {
    Global,
    Event(EventKey),
}

impl From<EventKey> for FilterScope {
    fn from(value: EventKey) -> Self {
        Self::Event(value)
    }
}

impl From<&str> for FilterScope {
    fn from(value: &str) -> Self {
        Self::Event(value.into())
    }
}

type FilterList = RwLock<Vec<Filter>>;

#[derive(Default)]
pub struct FilterChain {
    global: Arc<FilterList>,
    per_event: Arc<DashMap<EventKey, Vec<Filter>>>,
}

impl FilterChain {
    pub fn add(&self, scope: FilterScope, filter: Filter) -> EmitterResult<Remover> {
        match scope {
            FilterScope::Global => Ok(self.add_global(filter)),
            FilterScope::Event(event) => self.add_event(event, filter),
        }
    }

    pub fn add_global(&self, filter: Filter) -> Remover {
        self.global
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(filter.clone());

        let list = Arc::downgrade(&self.global);
        Remover::new(move || {
            let Some(list) = list.upgrade() else { return };
            let mut list = list.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(index) = list.iter().position(|f| f.ptr_eq(&filter)) {
                list.remove(index);
            }
        })
    }

    pub fn add_event(&self, event: EventKey, filter: Filter) -> EmitterResult<Remover> {
        event.validate()?;
        self.per_event
            .entry(event.clone())
            .or_default()
            .push(filter.clone());

        let map = Arc::downgrade(&self.per_event);
        Ok(Remover::new(move || {
            let Some(map) = map.upgrade() else { return };
            if let Some(mut list) = map.get_mut(&event) {
                if let Some(index) = list.iter().position(|f| f.ptr_eq(&filter)) {
                    list.remove(index);
                }
            }
            map.remove_if(&event, |_, list| list.is_empty());
        }))
    }

    /// 运行过滤链：全部通过返回 true
    pub fn allows(&self, event: &EventKey, args: &[Value]) -> bool {
        // 先取快照再调用，过滤器内部可增删过滤器
        let global: Vec<Filter> = self
            .global
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if !global.iter().all(|f| f.check(event, args)) {
            return false;
        }

        let scoped: Vec<Filter> = self
            .per_event
            .get(event)
            .map(|list| list.clone())
            .unwrap_or_default();
        scoped.iter().all(|f| f.check(event, args))
    }

    pub fn global_count(&self) -> usize {
        self.global
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn event_count(&self, event: &EventKey) -> usize {
        self.per_event.get(event).map_or(0, |list| list.len())
    }
}
