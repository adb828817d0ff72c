//! Concurrent scraping of every known node.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use statswatch_types::{
    current_timestamp_secs, NodeRef, Snapshot, StatsRequest, StatsResponse, STATS_METHOD,
};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::{Client, Request};
use crate::directory::Directory;
use crate::error::CallError;
use crate::registry::{Node, Service};
use crate::state::PublishedState;

/// Outcome of a single scrape tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Nodes that matched the client protocol and were called.
    pub eligible: usize,
    /// Nodes that answered in time and made it into the batch.
    pub collected: usize,
}

impl TickReport {
    /// Nodes that were called but produced no snapshot.
    pub fn failed(&self) -> usize {
        self.eligible - self.collected
    }
}

/// Calls `Debug.Stats` on every eligible node and publishes the results.
///
/// A node is eligible when its service has nodes and its `protocol`
/// metadata equals [`Client::protocol`]. Every call runs in its own task
/// under its own deadline, so one slow node cannot hold back another. The
/// tick waits for every call before publishing, which bounds its length
/// by the slowest call, i.e. by `call_timeout`.
#[derive(Debug, Clone)]
pub struct Scraper {
    directory: Arc<Directory>,
    client: Arc<dyn Client>,
    state: Arc<PublishedState>,
    call_timeout: Duration,
}

impl Scraper {
    pub fn new(
        directory: Arc<Directory>,
        client: Arc<dyn Client>,
        state: Arc<PublishedState>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            client,
            state,
            call_timeout,
        }
    }

    /// Run one scrape tick and publish its batch.
    ///
    /// Failed nodes are logged and left out; a tick where every node fails
    /// still publishes, with an empty batch.
    pub async fn tick(&self) -> TickReport {
        // Taken once; a refresh during the tick does not affect it.
        let services = self.directory.snapshot();
        let protocol = self.client.protocol();

        let next: Arc<Mutex<Vec<Snapshot>>> = Arc::new(Mutex::new(Vec::new()));
        let mut calls = JoinSet::new();
        let mut eligible = 0;

        for service in services.iter() {
            for node in service.nodes.iter().filter(|n| n.protocol() == Some(protocol)) {
                eligible += 1;

                let client = self.client.clone();
                let next = next.clone();
                let service = service.clone();
                let node = node.clone();
                let timeout = self.call_timeout;

                calls.spawn(async move {
                    match scrape_node(client.as_ref(), &service, &node, timeout).await {
                        Ok(snapshot) => next.lock().push(snapshot),
                        Err(e) => warn!(
                            service = %service.name,
                            address = %node.address,
                            error = %e,
                            "error scraping node"
                        ),
                    }
                });
            }
        }

        while let Some(joined) = calls.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "scrape task aborted");
            }
        }

        let batch = std::mem::take(&mut *next.lock());
        let report = TickReport {
            eligible,
            collected: batch.len(),
        };
        self.state.publish(batch.into());

        debug!(
            eligible = report.eligible,
            collected = report.collected,
            "scrape tick published"
        );
        report
    }
}

/// Call one node and turn its answer into a snapshot stamped with local time.
async fn scrape_node(
    client: &dyn Client,
    service: &Service,
    node: &Node,
    timeout: Duration,
) -> Result<Snapshot, CallError> {
    let request = Request::new(service.name.as_str(), STATS_METHOD, &StatsRequest {})?;

    let body = tokio::time::timeout(timeout, client.call(&request, &node.address))
        .await
        .map_err(|_| CallError::Timeout(timeout))??;
    let stats: StatsResponse = serde_json::from_value(body)?;

    let node_ref = NodeRef {
        id: node.id.clone(),
        address: node.address.clone(),
    };
    Ok(stats.into_snapshot(
        service.name.as_str(),
        service.version.as_str(),
        node_ref,
        current_timestamp_secs(),
    ))
}
