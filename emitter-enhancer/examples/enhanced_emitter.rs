use emitter_enhancer::{
    BaseEmitter, ElseListener, EmitterResult, Enhancer, EnhancerConfig, Filter, InMemoryEmitter,
    Listener, OnOptions, UnhandledEvent,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> EmitterResult<()> {
    // tracing 的 log 特性把事件转交给 env_logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp(None)
        .init();

    let enhancer = Enhancer::new(EnhancerConfig::builder().path_separator(":").build());
    let orders = enhancer.extend::<InMemoryEmitter>()?.create_default();

    // 路径事件：order:paid 依次分发 order、order:paid
    orders.on(
        "order",
        Listener::new(|args| println!("order activity: {args:?}")),
    );
    let paid = orders.on(
        "order:paid",
        Listener::new(|args| println!("order paid: {args:?}")),
    );
    orders.emit(&"order:paid".into(), &[json!({"id": 1, "amount": 42})]);
    paid.remove();

    // 过滤：金额为 0 的支付被否决
    orders.add_event_filter(
        "order:paid",
        Filter::new(|_, args| {
            args.first()
                .and_then(|order| order.get("amount"))
                .and_then(Value::as_i64)
                .is_some_and(|amount| amount > 0)
        }),
    )?;
    let handled = orders.emit(&"order:paid".into(), &[json!({"id": 2, "amount": 0})]);
    println!("zero payment handled: {handled}");

    // 兜底：未处理的事件交给 else 监听器，order:lost 改为上报 error
    orders.add_else_listener(ElseListener::new(|_, event, args| {
        println!("nobody listened to {event}: {args:?}");
    }));
    orders.emit(&"audit".into(), &[json!("nightly")]);

    orders.on(
        "error",
        Listener::new(|args| {
            if let Some(error) = args.first().and_then(UnhandledEvent::from_payload) {
                println!("error event: {}", error.message);
            }
        }),
    );
    orders.else_error("refund");
    orders.emit(&"refund".into(), &[]);

    // 异步：监听器在当前分发返回后才执行
    orders.on_async(
        "shipment",
        Listener::new(|args| println!("shipment scheduled: {args:?}")),
    )?;
    orders.emit(&"shipment".into(), &[json!("parcel-7")]);
    println!("shipment dispatch returned");
    orders.scheduler().flush().await?;

    orders.emit_async_with("order", vec![json!("async")], |event, _, handled| {
        println!("async dispatch of {event} handled: {handled}");
    })?;
    orders.scheduler().flush().await?;

    // 自动过期的批量注册
    let watcher = orders.on_with(
        OnOptions::builder()
            .events(["inventory:low", "inventory:out"])
            .listeners(Listener::new(|args| println!("inventory alert: {args:?}")))
            .timeout(Duration::from_millis(50))
            .build(),
    )?;
    orders.emit(&"inventory:low".into(), &[json!("sku-1")]);
    tokio::time::sleep(Duration::from_millis(100)).await;
    orders.scheduler().flush().await?;
    println!("inventory watcher expired: {}", watcher.is_removed());

    // 转发：仓库发射器上的事件转为 orders 上的同名事件
    let warehouse = Arc::new(InMemoryEmitter::new());
    let stop = orders.proxy_events([warehouse.clone()], "order")?;
    warehouse.emit(&"order".into(), &[json!("restock")]);
    stop.remove();

    Ok(())
}
