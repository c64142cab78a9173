//! Serializable topology snapshots of a graph.

use crate::error::Result;
use crate::pipeline::graph::Graph;
use crate::pipeline::id::NodeId;
use crate::types::ValueKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Snapshot of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub name: Option<String>,
    pub label: String,
    /// Operation description, `None` for op-less nodes.
    pub op: Option<String>,
    pub parents: Vec<NodeId>,
    pub unwrap_count: Option<usize>,
    pub value_kind: ValueKind,
}

/// Snapshot of a parent → child edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub from: NodeId,
    pub to: NodeId,
}

/// Complete topology snapshot of a graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

impl TopologySnapshot {
    pub(crate) fn capture(graph: &Graph) -> Self {
        let mut snapshot = Self::default();
        for (index, node) in graph.nodes().iter().enumerate() {
            let id = NodeId(index as u32);
            snapshot.edges.extend(
                node.parents()
                    .iter()
                    .map(|&from| EdgeSnapshot { from, to: id }),
            );
            snapshot.nodes.push(NodeSnapshot {
                id,
                name: node.name().map(str::to_string),
                label: node.label(),
                op: node.op().map(|op| op.describe()),
                parents: node.parents().to_vec(),
                unwrap_count: node.unwrap_count(),
                value_kind: node.value().kind(),
            });
        }
        snapshot
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the snapshot as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json_pretty()?)?;
        tracing::debug!("Saved topology snapshot to {:?}", path);
        Ok(())
    }
}
