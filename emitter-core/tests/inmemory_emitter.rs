use anyhow::Result as AnyResult;
use emitter_core::{BaseEmitter, EventKey, InMemoryEmitter, Listener};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

fn named(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Listener {
    let log = log.clone();
    Listener::new(move |_args: &[Value]| log.lock().unwrap().push(name.to_string()))
}

#[test]
fn listeners_run_in_registration_order() -> AnyResult<()> {
    let emitter = InMemoryEmitter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let event = EventKey::from("ordered");

    emitter.on(&event, named("first", &log));
    emitter.once(&event, named("second", &log));
    emitter.on(&event, named("third", &log));

    assert!(emitter.emit(&event, &[json!(null)]));
    assert!(emitter.emit(&event, &[json!(null)]));

    assert_eq!(
        *log.lock().unwrap(),
        vec!["first", "second", "third", "first", "third"]
    );
    Ok(())
}

#[test]
fn symbol_keys_are_isolated_from_names() -> AnyResult<()> {
    let emitter = InMemoryEmitter::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let symbol = EventKey::symbol("ready");

    emitter.on(&symbol, named("symbol", &log));

    assert!(!emitter.emit(&EventKey::from("ready"), &[]));
    assert!(emitter.emit(&symbol, &[]));
    assert_eq!(*log.lock().unwrap(), vec!["symbol"]);
    Ok(())
}

#[test]
fn shared_handle_delegates_to_the_same_registry() -> AnyResult<()> {
    let emitter = Arc::new(InMemoryEmitter::new());
    let shared: Arc<dyn BaseEmitter> = emitter.clone();
    let event = EventKey::from("shared");

    shared.on(&event, Listener::noop());
    assert_eq!(emitter.listener_count(&event), 1);
    assert!(!shared.is_enhanced());
    Ok(())
}
