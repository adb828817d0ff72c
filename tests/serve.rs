//! Runs the full service against a fake node and queries it over HTTP.

use std::convert::Infallible;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use statswatch::config::{Overrides, Settings};
use statswatch::query::{build_request, query};
use statswatch_types::StatsResponse;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Request paths seen by the fake node.
#[derive(Debug, Default)]
struct Paths(Mutex<Vec<String>>);

/// A node answering every request with fixed stats.
async fn fake_node(paths: Arc<Paths>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = serde_json::to_vec(&StatsResponse {
        started: 1_700_000_000,
        uptime: 60,
        memory: 1024,
        threads: 4,
        ..Default::default()
    })
    .unwrap();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let paths = paths.clone();
            let body = body.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    paths.0.lock().unwrap().push(req.uri().path().to_string());
                    let body = body.clone();
                    async move { Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(body)))) }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    addr
}

async fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn registry_file(node: SocketAddr) -> tempfile::NamedTempFile {
    let services = serde_json::json!([
        {
            "name": "orders",
            "version": "v1",
            "nodes": [
                {"id": "orders-1", "address": node.to_string(), "metadata": {"protocol": "http"}},
                {"id": "orders-2", "address": "127.0.0.1:9", "metadata": {"protocol": "grpc"}}
            ]
        }
    ]);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(services.to_string().as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn serves_scraped_stats() {
    let paths = Arc::new(Paths::default());
    let node = fake_node(paths.clone()).await;
    let registry = registry_file(node);
    let listen = free_addr().await;

    let overrides = Overrides {
        registry_file: Some(registry.path().to_path_buf()),
        listen: Some(listen.to_string()),
        scrape_interval: Some("50ms".into()),
        ..Default::default()
    };
    let settings = Settings::load(None, &overrides).unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let service = tokio::spawn(statswatch::run(settings, async {
        let _ = stop_rx.await;
    }));

    let request = build_request(Some("orders"), Some("v1"), false);
    let mut current = Vec::new();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Ok(rsp) = query(&listen.to_string(), &request, Duration::from_secs(1)).await {
            if !rsp.is_empty() {
                current = rsp.stats;
                break;
            }
        }
    }

    assert_eq!(current.len(), 1, "only the http node is scraped");
    assert_eq!(current[0].node_id(), "orders-1");
    assert_eq!(current[0].started, 1_700_000_000);
    assert_eq!(current[0].threads, 4);
    assert!(paths
        .0
        .lock()
        .unwrap()
        .iter()
        .all(|p| p == "/orders/Debug.Stats"));

    let past = query(
        &listen.to_string(),
        &build_request(None, None, true),
        Duration::from_secs(1),
    )
    .await
    .unwrap();
    assert!(!past.is_empty());

    stop_tx.send(()).unwrap();
    service.await.unwrap().unwrap();
}

#[tokio::test]
async fn missing_registry_file_fails_startup() {
    let overrides = Overrides {
        registry_file: Some("/nonexistent/statswatch/services.json".into()),
        listen: Some(free_addr().await.to_string()),
        ..Default::default()
    };
    let settings = Settings::load(None, &overrides).unwrap();

    let err = statswatch::run(settings, std::future::pending())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("initial directory scan failed"));
}
