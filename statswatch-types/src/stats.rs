//! The `Debug.Stats` contract every scraped node implements.

use alloc::string::String;

use crate::{NodeRef, ServiceRef, Snapshot};

/// Request body for `Debug.Stats`. The endpoint takes no arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsRequest {}

/// Response of a node's `Debug.Stats` endpoint.
///
/// Missing fields decode as zero so that nodes running older runtimes which
/// do not report every counter are still recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "minicbor", derive(minicbor::Encode, minicbor::Decode))]
pub struct StatsResponse {
    /// Unix timestamp in seconds when the node started.
    #[cfg_attr(feature = "minicbor", n(0))]
    pub started: u64,

    /// Seconds since start.
    #[cfg_attr(feature = "minicbor", n(1))]
    pub uptime: u64,

    /// Heap memory in bytes.
    #[cfg_attr(feature = "minicbor", n(2))]
    pub memory: u64,

    /// Thread count.
    #[cfg_attr(feature = "minicbor", n(3))]
    pub threads: u64,

    /// Garbage collection count.
    #[cfg_attr(feature = "minicbor", n(4))]
    pub gc: u64,

    /// Total requests served.
    #[cfg_attr(feature = "minicbor", n(5))]
    pub requests: u64,

    /// Total failed requests.
    #[cfg_attr(feature = "minicbor", n(6))]
    pub errors: u64,
}

impl StatsResponse {
    /// Turn this response into a [`Snapshot`] for the given service node.
    ///
    /// `timestamp` is the collector-side capture time; the node's own
    /// `started` value is carried over unchanged.
    pub fn into_snapshot(
        self,
        name: impl Into<String>,
        version: impl Into<String>,
        node: NodeRef,
        timestamp: u64,
    ) -> Snapshot {
        Snapshot {
            service: ServiceRef {
                name: name.into(),
                version: version.into(),
                node,
            },
            started: i64::try_from(self.started).unwrap_or(i64::MAX),
            uptime: self.uptime,
            memory: self.memory,
            threads: self.threads,
            gc: self.gc,
            requests: self.requests,
            errors: self.errors,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_snapshot_keeps_remote_started_and_local_timestamp() {
        let rsp = StatsResponse {
            started: 1_700_000_000,
            uptime: 60,
            memory: 2048,
            threads: 4,
            gc: 7,
            requests: 100,
            errors: 3,
        };

        let node = NodeRef {
            id: "n1".into(),
            address: "10.0.0.1:1234".into(),
        };
        let snap = rsp.into_snapshot("svc", "v1", node, 1_700_000_500);

        assert_eq!(snap.started, 1_700_000_000);
        assert_eq!(snap.timestamp, 1_700_000_500);
        assert_eq!(snap.name(), "svc");
        assert_eq!(snap.node_id(), "n1");
        assert_eq!(snap.gc, 7);
        assert_eq!(snap.errors, 3);
    }

    #[test]
    fn oversized_started_saturates() {
        let rsp = StatsResponse {
            started: u64::MAX,
            ..Default::default()
        };
        let snap = rsp.into_snapshot("svc", "v1", NodeRef::default(), 0);
        assert_eq!(snap.started, i64::MAX);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn missing_fields_decode_as_zero() {
        let rsp: StatsResponse = serde_json::from_str(r#"{"uptime": 12, "threads": 3}"#).unwrap();
        assert_eq!(rsp.uptime, 12);
        assert_eq!(rsp.threads, 3);
        assert_eq!(rsp.memory, 0);
        assert_eq!(rsp.started, 0);
    }
}
