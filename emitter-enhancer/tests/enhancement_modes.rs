use anyhow::Result as AnyResult;
use emitter_enhancer::{
    BaseEmitter, EmitterError, EnhanceMode, EnhancedEmitter, Enhancer, EnhancerConfig, EventKey,
    Filter, InMemoryEmitter, Listener, is_enhanced_type,
};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 业务侧自定义的基础发射器
#[derive(Default)]
struct Channel {
    inner: InMemoryEmitter,
    emitted: AtomicUsize,
}

impl BaseEmitter for Channel {
    fn on(&self, event: &EventKey, listener: Listener) {
        self.inner.on(event, listener);
    }
    fn once(&self, event: &EventKey, listener: Listener) {
        self.inner.once(event, listener);
    }
    fn remove_listener(&self, event: &EventKey, listener: &Listener) -> bool {
        self.inner.remove_listener(event, listener)
    }
    fn listeners(&self, event: &EventKey) -> Vec<Listener> {
        self.inner.listeners(event)
    }
    fn emit(&self, event: &EventKey, args: &[Value]) -> bool {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        self.inner.emit(event, args)
    }
    fn event_names(&self) -> Vec<EventKey> {
        self.inner.event_names()
    }
    fn remove_all_listeners(&self, event: Option<&EventKey>) {
        self.inner.remove_all_listeners(event);
    }
}

/// 以共享句柄形式转交已增强发射器的包装
struct Shared(Arc<dyn BaseEmitter>);

impl BaseEmitter for Shared {
    fn on(&self, event: &EventKey, listener: Listener) {
        self.0.on(event, listener);
    }
    fn once(&self, event: &EventKey, listener: Listener) {
        self.0.once(event, listener);
    }
    fn remove_listener(&self, event: &EventKey, listener: &Listener) -> bool {
        self.0.remove_listener(event, listener)
    }
    fn listeners(&self, event: &EventKey) -> Vec<Listener> {
        self.0.listeners(event)
    }
    fn emit(&self, event: &EventKey, args: &[Value]) -> bool {
        self.0.emit(event, args)
    }
    fn event_names(&self) -> Vec<EventKey> {
        self.0.event_names()
    }
    fn remove_all_listeners(&self, event: Option<&EventKey>) {
        self.0.remove_all_listeners(event);
    }
    fn is_enhanced(&self) -> bool {
        self.0.is_enhanced()
    }
}

#[test]
fn enhancement_wraps_the_base_dispatch() -> AnyResult<()> {
    let emitter = Enhancer::default().modify_instance(Channel::default())?;
    emitter.add_noop("a");

    assert!(emitter.emit(&"a".into(), &[]));
    assert!(!emitter.emit(&"b".into(), &[]));
    emitter.suspend("a");
    assert!(!emitter.emit(&"a".into(), &[]));

    // 被挂起的分发不会到达基础发射器
    assert_eq!(emitter.base().emitted.load(Ordering::Relaxed), 2);
    Ok(())
}

#[test]
fn every_strategy_yields_the_same_capabilities() -> AnyResult<()> {
    let modes = [
        EnhanceMode::Extend,
        EnhanceMode::Modify,
        EnhanceMode::ModifyInstance,
    ];
    for mode in modes {
        let enhancer = Enhancer::new(
            EnhancerConfig::builder()
                .mode(mode)
                .path_separator(":")
                .build(),
        );
        let emitter = enhancer.enhance(Channel::default())?;
        assert_eq!(emitter.mode(), mode);

        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let log = log.clone();
            emitter.on("a", Listener::new(move |_| log.lock().unwrap().push("a")));
        }
        emitter.else_error("a:b");
        emitter.ignore_error();
        assert!(emitter.emit(&"a:b".into(), &[json!(1)]));
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }
    // Modify 策略已在进程范围内标记该类型
    assert!(is_enhanced_type::<Channel>());
    assert!(Enhancer::default().extend::<Channel>().is_err());
    Ok(())
}

#[test]
fn enhanced_instances_cannot_be_enhanced_again() -> AnyResult<()> {
    let enhancer = Enhancer::default();
    let first = enhancer.modify_instance(Channel::default())?;
    let shared: Arc<dyn BaseEmitter> = first.clone();
    assert!(shared.is_enhanced());

    let err = enhancer.modify_instance(Shared(shared.clone())).unwrap_err();
    assert!(matches!(err, EmitterError::DoubleEnhancement { .. }));
    assert!(enhancer.enhance(Shared(shared)).is_err());

    // 未增强的共享句柄可以正常增强
    let plain: Arc<dyn BaseEmitter> = Arc::new(InMemoryEmitter::new());
    assert!(enhancer.modify_instance(Shared(plain)).is_ok());
    Ok(())
}

#[test]
fn proxy_between_enhanced_emitters() -> AnyResult<()> {
    let enhancer = Enhancer::default();
    let kind = enhancer.extend::<InMemoryEmitter>()?;
    let upstream: Arc<EnhancedEmitter<InMemoryEmitter>> = kind.create_default();
    let downstream = kind.create_default();

    let calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = calls.clone();
        downstream.on(
            "ping",
            Listener::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }),
        );
    }

    let source: Arc<dyn BaseEmitter> = upstream.clone();
    let stop = downstream.proxy_events([source], "ping")?;

    // 上游的过滤器同样作用于被转发的分发
    let veto = upstream.add_global_filter(Filter::new(|_, args| !args.is_empty()));
    assert!(!upstream.emit(&"ping".into(), &[]));
    assert!(upstream.emit(&"ping".into(), &[json!("hello")]));
    veto.remove();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    stop.remove();
    assert!(!upstream.emit(&"ping".into(), &[json!("again")]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn dropped_target_stops_receiving_forwarded_events() -> AnyResult<()> {
    let source = Arc::new(InMemoryEmitter::new());
    let target = Enhancer::default()
        .extend::<InMemoryEmitter>()?
        .create_default();
    target.proxy_events([source.clone()], "tick")?;
    drop(target);

    // 转发监听器只持有弱引用，目标释放后转发变为空操作
    assert!(source.emit(&"tick".into(), &[]));
    Ok(())
}
