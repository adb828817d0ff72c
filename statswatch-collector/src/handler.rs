//! The read-only stats service.

use std::sync::Arc;

use statswatch_types::{ReadRequest, ReadResponse, Snapshot, StreamRequest, WriteRequest};

use crate::error::StatsError;
use crate::state::PublishedState;

/// Identifier reported in errors from this service.
pub const SERVICE_ID: &str = "go.micro.debug.stats";

/// Answers queries against the published scrape results.
///
/// Reads only take the state's read lock long enough to clone the batch
/// handles they need; filtering happens afterwards.
#[derive(Debug, Clone)]
pub struct StatsHandler {
    state: Arc<PublishedState>,
    max_window: usize,
}

impl StatsHandler {
    /// Create a handler whose history reads return at most `max_window` ticks.
    pub fn new(state: Arc<PublishedState>, max_window: usize) -> Self {
        Self { state, max_window }
    }

    /// Most ticks a history read returns.
    pub fn max_window(&self) -> usize {
        self.max_window
    }

    /// Return current snapshots, or the retained history when `past` is set,
    /// filtered by the request's service.
    pub fn read(&self, request: &ReadRequest) -> ReadResponse {
        let batches = if request.past {
            self.state.history(self.max_window)
        } else {
            vec![self.state.current()]
        };

        let stats: Vec<Snapshot> = batches
            .iter()
            .flat_map(|batch| batch.iter())
            .filter(|snapshot| request.matches(snapshot))
            .cloned()
            .collect();

        ReadResponse { stats }
    }

    /// Stats are only produced by scraping.
    pub fn write(&self, _request: &WriteRequest) -> Result<(), StatsError> {
        Err(StatsError::NotImplemented {
            id: SERVICE_ID,
            operation: "write",
        })
    }

    /// Streaming is not supported.
    pub fn stream(&self, _request: &StreamRequest) -> Result<(), StatsError> {
        Err(StatsError::NotImplemented {
            id: SERVICE_ID,
            operation: "stream",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statswatch_types::ServiceFilter;

    use crate::state::Batch;

    fn snap(name: &str, version: &str, node: &str, ts: u64) -> Snapshot {
        Snapshot::builder()
            .service(name, version)
            .node(node, format!("{node}:1"))
            .timestamp(ts)
            .build()
    }

    fn batch(snaps: Vec<Snapshot>) -> Batch {
        snaps.into()
    }

    fn handler_with(batches: Vec<Batch>, window: usize) -> StatsHandler {
        let state = Arc::new(PublishedState::new(window));
        for b in batches {
            state.publish(b);
        }
        StatsHandler::new(state, window)
    }

    #[test]
    fn read_current_without_filter_returns_everything() {
        let current = vec![snap("svcA", "v1", "n1", 2), snap("svcB", "v1", "n2", 2)];
        let handler = handler_with(
            vec![batch(vec![snap("old", "v1", "n0", 1)]), batch(current.clone())],
            10,
        );

        let rsp = handler.read(&ReadRequest::current());
        assert_eq!(rsp.stats, current);
    }

    #[test]
    fn read_current_filters_by_name() {
        let handler = handler_with(
            vec![batch(vec![
                snap("X", "v1", "n1", 1),
                snap("Y", "v1", "n2", 1),
                snap("X", "v2", "n3", 1),
            ])],
            10,
        );

        let rsp = handler.read(&ReadRequest::current().with_service(ServiceFilter::name("X")));
        assert_eq!(rsp.len(), 2);
        assert!(rsp.stats.iter().all(|s| s.name() == "X"));
    }

    #[test]
    fn read_current_filters_by_name_and_version() {
        let handler = handler_with(
            vec![batch(vec![
                snap("svcA", "v1", "n1", 1),
                snap("svcA", "v2", "n2", 1),
                snap("svcA", "v2", "n3", 1),
            ])],
            10,
        );

        let filter = ServiceFilter::name("svcA").version("v2");
        let rsp = handler.read(&ReadRequest::current().with_service(filter));

        let nodes: Vec<&str> = rsp.stats.iter().map(|s| s.node_id()).collect();
        assert_eq!(nodes, vec!["n2", "n3"]);
    }

    #[test]
    fn read_past_concatenates_history_oldest_first() {
        let handler = handler_with(
            vec![
                batch(vec![snap("a", "v1", "n1", 1)]),
                batch(vec![snap("a", "v1", "n1", 2), snap("b", "v1", "n2", 2)]),
                batch(vec![snap("a", "v1", "n1", 3)]),
            ],
            10,
        );

        let rsp = handler.read(&ReadRequest::past());
        let stamps: Vec<u64> = rsp.stats.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![1, 2, 2, 3]);

        let rsp = handler.read(&ReadRequest::past().with_service(ServiceFilter::name("b")));
        assert_eq!(rsp.len(), 1);
    }

    #[test]
    fn read_past_is_bounded_by_max_window() {
        let state = Arc::new(PublishedState::new(10));
        for ts in 1..=5 {
            state.publish(batch(vec![snap("a", "v1", "n1", ts)]));
        }
        let handler = StatsHandler::new(state, 2);

        let stamps: Vec<u64> = handler
            .read(&ReadRequest::past())
            .stats
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(stamps, vec![4, 5]);
    }

    #[test]
    fn read_before_any_tick_is_empty() {
        let handler = handler_with(Vec::new(), 3);
        assert!(handler.read(&ReadRequest::current()).is_empty());
        assert!(handler.read(&ReadRequest::past()).is_empty());
    }

    #[test]
    fn unmatched_filter_is_an_empty_result() {
        let handler = handler_with(vec![batch(vec![snap("a", "v1", "n1", 1)])], 3);
        let rsp = handler.read(&ReadRequest::current().with_service(ServiceFilter::name("zzz")));
        assert!(rsp.is_empty());
    }

    #[test]
    fn repeated_reads_are_identical() {
        let handler = handler_with(
            vec![batch(vec![snap("a", "v1", "n1", 1), snap("b", "v1", "n2", 1)])],
            3,
        );
        let req = ReadRequest::past();
        assert_eq!(handler.read(&req), handler.read(&req));
    }

    #[test]
    fn write_and_stream_are_bad_requests() {
        let handler = handler_with(vec![batch(vec![snap("a", "v1", "n1", 1)])], 3);

        let err = handler.write(&WriteRequest::default()).unwrap_err();
        assert!(err.is_bad_request());
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("not implemented"));

        let err = handler.stream(&StreamRequest::default()).unwrap_err();
        assert!(err.is_bad_request());

        // nothing changed
        assert_eq!(handler.read(&ReadRequest::current()).len(), 1);
    }
}
