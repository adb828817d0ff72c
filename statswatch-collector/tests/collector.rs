//! End-to-end behaviour of a running collector.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use statswatch_collector::{
    CallError, Client, Collector, CollectorError, MemoryRegistry, Node, ReadRequest, Request,
    Service, ServiceFilter, StatsResponse, WriteRequest,
};

/// Answers with a per-address request counter that grows on every call.
#[derive(Debug, Default)]
struct CountingClient {
    counters: Mutex<HashMap<String, u64>>,
    down: Mutex<Vec<String>>,
}

impl CountingClient {
    fn take_down(&self, address: &str) {
        self.down.lock().push(address.to_string());
    }
}

#[async_trait]
impl Client for CountingClient {
    fn protocol(&self) -> &str {
        "mucp"
    }

    async fn call(&self, request: &Request, address: &str) -> Result<serde_json::Value, CallError> {
        assert_eq!(request.method, "Debug.Stats");
        if self.down.lock().iter().any(|a| a == address) {
            return Err(CallError::Transport(format!("{address} refused")));
        }

        let requests = {
            let mut counters = self.counters.lock();
            let counter = counters.entry(address.to_string()).or_default();
            *counter += 1;
            *counter
        };

        Ok(serde_json::to_value(StatsResponse {
            started: 1_700_000_000,
            uptime: requests,
            requests,
            ..Default::default()
        })?)
    }
}

fn node(id: &str, address: &str) -> Node {
    Node::new(id, address).with_protocol("mucp")
}

fn registry() -> Arc<MemoryRegistry> {
    let registry = Arc::new(MemoryRegistry::new());
    registry.register(
        Service::new("orders", "v1")
            .with_node(node("orders-1", "10.0.0.1:9000"))
            .with_node(node("orders-2", "10.0.0.2:9000")),
    );
    registry.register(Service::new("orders", "v2").with_node(node("orders-3", "10.0.0.3:9000")));
    registry.register(Service::new("billing", "v1").with_node(node("billing-1", "10.0.1.1:9000")));
    registry
}

#[tokio::test(start_paused = true)]
async fn collects_current_and_past_stats() {
    let collector = Collector::builder()
        .registry(registry())
        .client(Arc::new(CountingClient::default()))
        .window(3)
        .build()
        .await
        .unwrap();
    let handler = collector.handler();
    let handle = collector.start();

    // ticks at 0s, 1s, 2s, 3s, 4s
    tokio::time::sleep(Duration::from_millis(4500)).await;

    let current = handler.read(&ReadRequest::current());
    assert_eq!(current.len(), 4);
    assert!(current.stats.iter().all(|s| s.requests == 5));
    assert!(current.stats.iter().all(|s| s.started == 1_700_000_000));

    // only the last three ticks survive
    let past = handler.read(&ReadRequest::past());
    assert_eq!(past.len(), 12);
    let mut counts: Vec<u64> = past.stats.iter().map(|s| s.requests).collect();
    counts.dedup();
    assert_eq!(counts, vec![3, 4, 5]);

    let filter = ServiceFilter::name("orders").version("v2");
    let orders_v2 = handler.read(&ReadRequest::past().with_service(filter));
    assert_eq!(orders_v2.len(), 3);
    assert!(orders_v2.stats.iter().all(|s| s.node_id() == "orders-3"));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failing_node_drops_out_and_returns() {
    let client = Arc::new(CountingClient::default());
    let collector = Collector::builder()
        .registry(registry())
        .client(client.clone())
        .build()
        .await
        .unwrap();
    let handler = collector.handler();

    collector.scrape_now().await;
    assert_eq!(handler.read(&ReadRequest::current()).len(), 4);

    client.take_down("10.0.1.1:9000");
    let report = collector.scrape_now().await;
    assert_eq!(report.failed(), 1);

    let billing = handler.read(&ReadRequest::current().with_service(ServiceFilter::name("billing")));
    assert!(billing.is_empty());

    // the earlier tick still has it
    let billing = handler.read(&ReadRequest::past().with_service(ServiceFilter::name("billing")));
    assert_eq!(billing.len(), 1);
}

#[tokio::test]
async fn deregistered_service_disappears_after_refresh() {
    let registry = registry();
    let collector = Collector::builder()
        .registry(registry.clone())
        .client(Arc::new(CountingClient::default()))
        .build()
        .await
        .unwrap();

    registry.deregister("billing");
    assert_eq!(collector.refresh_now().await.unwrap(), 2);

    collector.scrape_now().await;
    let current = collector.handler().read(&ReadRequest::current());
    assert_eq!(current.len(), 3);
    assert!(current.stats.iter().all(|s| s.name() == "orders"));
}

#[tokio::test]
async fn unreachable_registry_prevents_construction() {
    let registry = Arc::new(MemoryRegistry::new());
    registry.set_offline(true);

    let result = Collector::builder()
        .registry(registry)
        .client(Arc::new(CountingClient::default()))
        .build()
        .await;

    assert!(matches!(result, Err(CollectorError::InitialScan(_))));
}

#[tokio::test]
async fn writes_are_rejected_without_side_effects() {
    let collector = Collector::builder()
        .registry(registry())
        .client(Arc::new(CountingClient::default()))
        .build()
        .await
        .unwrap();
    collector.scrape_now().await;

    let handler = collector.handler();
    let before = handler.read(&ReadRequest::past());

    let err = handler
        .write(&WriteRequest {
            stats: before.stats.clone(),
        })
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    assert_eq!(handler.read(&ReadRequest::past()), before);
}
