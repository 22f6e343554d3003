//! 增强发射器（EnhancedEmitter）
//!
//! 包装任意 `BaseEmitter`，在每次分发外层叠加：
//! 挂起闸门 → 路径展开 → 过滤链 → 基础分发 → 兜底（else-error / else 监听器）。
//!
//! 异步适配器与注册组合子分别位于 `async_adapter` 与 `combinator` 模块，
//! 它们通过同一个基础注册原语注册（可能被包装的）监听器。
//!
use crate::config::{EnhanceMode, EnhancerConfig};
use crate::fallback::{ElseListener, ElseRegistry, UnhandledEvent};
use crate::filter::{Filter, FilterChain, FilterScope};
use crate::remover::Remover;
use crate::scheduler::DeferredScheduler;
use crate::suspension::SuspensionGate;
use emitter_core::{BaseEmitter, EmitterResult, EventKey, Listener};
use serde_json::Value;
use std::any::type_name;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

pub struct EnhancedEmitter<E: BaseEmitter> {
    pub(crate) base: E,
    pub(crate) suspension: SuspensionGate,
    pub(crate) filters: FilterChain,
    pub(crate) fallback: ElseRegistry,
    pub(crate) scheduler: Arc<dyn DeferredScheduler>,
    pub(crate) this: Weak<Self>,
    path_separator: RwLock<Option<Arc<str>>>,
    mode: EnhanceMode,
}

impl<E: BaseEmitter> fmt::Debug for EnhancedEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancedEmitter")
            .field("base", &type_name::<E>())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<E: BaseEmitter> EnhancedEmitter<E> {
    pub(crate) fn new_shared(
        base: E,
        config: &EnhancerConfig,
        scheduler: Arc<dyn DeferredScheduler>,
    ) -> Arc<Self> {
        let separator = config
            .path_separator
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(Arc::from);

        Arc::new_cyclic(|this| Self {
            base,
            suspension: SuspensionGate::default(),
            filters: FilterChain::default(),
            fallback: ElseRegistry::default(),
            scheduler,
            this: this.clone(),
            path_separator: RwLock::new(separator),
            mode: config.mode,
        })
    }

    /// 被包装的基础发射器
    pub fn base(&self) -> &E {
        &self.base
    }

    pub fn mode(&self) -> EnhanceMode {
        self.mode
    }

    pub fn scheduler(&self) -> &Arc<dyn DeferredScheduler> {
        &self.scheduler
    }

    // --- 挂起闸门 ---

    pub fn set_suspended(&self, suspended: bool) {
        self.suspension.set_all(suspended);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspension.is_all()
    }

    pub fn suspend_all(&self) {
        self.set_suspended(true);
    }

    pub fn unsuspend_all(&self) {
        self.set_suspended(false);
    }

    /// 挂起单个事件（含 else 监听器），空键为空操作
    pub fn suspend(&self, event: impl Into<EventKey>) {
        self.suspension.suspend(&event.into());
    }

    pub fn unsuspend(&self, event: impl Into<EventKey>) {
        self.suspension.unsuspend(&event.into());
    }

    pub fn is_event_suspended(&self, event: impl Into<EventKey>) -> bool {
        self.suspension.is_event_suspended(&event.into())
    }

    // --- 过滤链 ---

    /// 注册过滤器，返回幂等的移除句柄
    pub fn add_filter(
        &self,
        scope: impl Into<FilterScope>,
        filter: Filter,
    ) -> EmitterResult<Remover> {
        self.filters.add(scope.into(), filter)
    }

    pub fn add_global_filter(&self, filter: Filter) -> Remover {
        self.filters.add_global(filter)
    }

    pub fn add_event_filter(
        &self,
        event: impl Into<EventKey>,
        filter: Filter,
    ) -> EmitterResult<Remover> {
        self.filters.add_event(event.into(), filter)
    }

    // --- 兜底 ---

    /// 添加 else 监听器：事件无人处理时按注册顺序调用（`error` 事件除外）
    pub fn add_else_listener(&self, listener: ElseListener) {
        self.fallback.add(listener);
    }

    /// 移除该监听器的全部注册
    pub fn remove_else_listener(&self, listener: &ElseListener) -> usize {
        self.fallback.remove(listener)
    }

    pub fn remove_all_else_listeners(&self) {
        self.fallback.clear();
    }

    pub fn else_listener_count(&self) -> usize {
        self.fallback.len()
    }

    /// 该事件无人处理时改为分发 `error` 事件，优先于 else 监听器
    pub fn else_error(&self, event: impl Into<EventKey>) {
        self.fallback.mark_error(&event.into());
    }

    pub fn remove_else_error(&self, event: impl Into<EventKey>) {
        self.fallback.unmark_error(&event.into());
    }

    pub fn is_else_error(&self, event: impl Into<EventKey>) -> bool {
        self.fallback.is_error_event(&event.into())
    }

    // --- 路径展开 ---

    /// 设置事件路径分隔符，`None` 或空串关闭展开
    pub fn set_path_separator(&self, separator: Option<&str>) {
        let separator = separator.filter(|s| !s.is_empty()).map(Arc::from);
        *self
            .path_separator
            .write()
            .unwrap_or_else(PoisonError::into_inner) = separator;
    }

    pub fn path_separator(&self) -> Option<String> {
        self.current_separator().map(|s| s.to_string())
    }

    fn current_separator(&self) -> Option<Arc<str>> {
        self.path_separator
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `a:b:c` 依次展开为 `a`、`a:b`、`a:b:c`；符号键与不含分隔符的名称不展开
    fn expand(&self, event: &EventKey) -> Vec<EventKey> {
        let separator = self.current_separator();
        match (separator, event.as_name()) {
            (Some(separator), Some(name)) if name.contains(&*separator) => {
                let mut path = String::with_capacity(name.len());
                name.split(&*separator)
                    .enumerate()
                    .map(|(index, segment)| {
                        if index > 0 {
                            path.push_str(&separator);
                        }
                        path.push_str(segment);
                        EventKey::name(path.as_str())
                    })
                    .collect()
            }
            _ => vec![event.clone()],
        }
    }

    // --- 分发 ---

    /// 同步分发：有监听器或 else 监听器处理时返回 true
    ///
    /// 全局挂起时整次调用为空操作；路径展开后的每个子事件独立经过
    /// 挂起检查、过滤链、基础分发与兜底，结果取逻辑或。
    pub fn emit(&self, event: &EventKey, args: &[Value]) -> bool {
        if self.suspension.is_all() {
            tracing::trace!(event = %event, "dispatch skipped: emitter suspended");
            return false;
        }

        let mut handled = false;
        for sub_event in self.expand(event) {
            handled |= self.dispatch(&sub_event, args);
        }
        handled
    }

    fn dispatch(&self, event: &EventKey, args: &[Value]) -> bool {
        if self.suspension.blocks(event) {
            tracing::trace!(event = %event, "dispatch skipped: event suspended");
            return false;
        }
        if !self.filters.allows(event, args) {
            tracing::trace!(event = %event, "dispatch vetoed by filter");
            return false;
        }
        if self.base.emit(event, args) {
            return true;
        }
        self.handle_unhandled(event, args)
    }

    fn handle_unhandled(&self, event: &EventKey, args: &[Value]) -> bool {
        // 无人处理的 error 交由基础发射器自身的约定
        if event.is_error() {
            return false;
        }

        if self.fallback.is_error_event(event) {
            tracing::debug!(event = %event, "no listener attached, emitting error event");
            let payload = UnhandledEvent::new(event).to_payload();
            return self.emit(&EventKey::error(), &[payload]);
        }

        let handled = self.fallback.invoke(event, args);
        if handled {
            tracing::debug!(event = %event, "event handled by else listeners");
        }
        handled
    }

    // --- 基础注册表透传 ---

    pub fn listeners(&self, event: impl Into<EventKey>) -> Vec<Listener> {
        self.base.listeners(&event.into())
    }

    pub fn listener_count(&self, event: impl Into<EventKey>) -> usize {
        self.base.listener_count(&event.into())
    }

    pub fn event_names(&self) -> Vec<EventKey> {
        self.base.event_names()
    }

    pub fn remove_listener(&self, event: impl Into<EventKey>, listener: &Listener) -> bool {
        self.base.remove_listener(&event.into(), listener)
    }
}

impl<E: BaseEmitter> BaseEmitter for EnhancedEmitter<E> {
    fn on(&self, event: &EventKey, listener: Listener) {
        self.base.on(event, listener);
    }

    fn once(&self, event: &EventKey, listener: Listener) {
        self.base.once(event, listener);
    }

    fn remove_listener(&self, event: &EventKey, listener: &Listener) -> bool {
        self.base.remove_listener(event, listener)
    }

    fn listeners(&self, event: &EventKey) -> Vec<Listener> {
        self.base.listeners(event)
    }

    fn listener_count(&self, event: &EventKey) -> usize {
        self.base.listener_count(event)
    }

    fn emit(&self, event: &EventKey, args: &[Value]) -> bool {
        EnhancedEmitter::emit(self, event, args)
    }

    fn event_names(&self) -> Vec<EventKey> {
        self.base.event_names()
    }

    fn remove_all_listeners(&self, event: Option<&EventKey>) {
        self.base.remove_all_listeners(event);
    }

    fn is_enhanced(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::TokioScheduler;
    use emitter_core::InMemoryEmitter;
    use serde_json::json;
    use std::sync::Mutex;

    fn emitter(separator: Option<&str>) -> Arc<EnhancedEmitter<InMemoryEmitter>> {
        let config = EnhancerConfig::builder()
            .maybe_path_separator(separator.map(str::to_string))
            .build();
        EnhancedEmitter::new_shared(
            InMemoryEmitter::new(),
            &config,
            Arc::new(TokioScheduler::new()),
        )
    }

    fn recorder() -> (Listener, Arc<Mutex<Vec<Vec<Value>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let listener = {
            let calls = calls.clone();
            Listener::new(move |args| calls.lock().unwrap().push(args.to_vec()))
        };
        (listener, calls)
    }

    #[test]
    fn expand_builds_prefix_paths() {
        let emitter = emitter(Some(":"));
        let names: Vec<String> = emitter
            .expand(&"a:b:c".into())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["a", "a:b", "a:b:c"]);

        assert_eq!(emitter.expand(&"plain".into()).len(), 1);
        assert_eq!(emitter.expand(&EventKey::symbol("a:b")).len(), 1);
    }

    #[test]
    fn expand_is_disabled_without_separator() {
        let emitter = emitter(None);
        assert_eq!(emitter.expand(&"a:b:c".into()), vec![EventKey::from("a:b:c")]);

        emitter.set_path_separator(Some("/"));
        assert_eq!(emitter.expand(&"a/b".into()).len(), 2);
        emitter.set_path_separator(Some(""));
        assert!(emitter.path_separator().is_none());
    }

    #[test]
    fn suspended_sub_path_is_skipped_independently() {
        let emitter = emitter(Some(":"));
        let (a, a_calls) = recorder();
        let (ab, ab_calls) = recorder();
        BaseEmitter::on(emitter.as_ref(), &"a".into(), a);
        BaseEmitter::on(emitter.as_ref(), &"a:b".into(), ab);

        emitter.suspend("a");
        assert!(emitter.emit(&"a:b".into(), &[json!(1)]));
        assert!(a_calls.lock().unwrap().is_empty());
        assert_eq!(ab_calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn else_error_on_error_event_does_not_recurse() {
        let emitter = emitter(None);
        emitter.else_error(EventKey::error());
        emitter.add_else_listener(ElseListener::new(|_, _, _| panic!("not for error")));
        assert!(!emitter.emit(&EventKey::error(), &[json!("boom")]));
    }

    #[test]
    fn enhanced_emitter_reports_itself_as_enhanced() {
        let emitter = emitter(None);
        assert!(BaseEmitter::is_enhanced(emitter.as_ref()));
        assert!(!emitter.base().is_enhanced());
    }
}
