//! Lazy graph construction and execution.
//!
//! Nodes live in a [`Graph`] arena and are addressed by [`NodeId`]. Deferred
//! function calls append function nodes; a [`Pipeline`] then fixes which
//! nodes are inputs and outputs and the order in which everything between
//! them runs.
//!
//! # Architecture
//!
//! ```text
//! [Input a] ──► [rescale] ──► [padding_2d] ──► output 0
//!           └─► [image_to_channel_num] ──────► output 1
//! ```
//!
//! # Design
//!
//! - **Arena storage**: nodes are a flat `Vec<Node>`, `NodeId` is the index.
//! - **Acyclic by construction**: a node's parents must exist before it.
//! - **Tagged operations**: `NodeOp` records the call, item access or nested
//!   pipeline, so graphs stay inspectable and serializable as snapshots.
//! - **Plan once**: the execution order is compiled when the pipeline is built.

pub mod compiled_plan;
pub mod compiler;
pub mod executor;
pub mod graph;
pub mod id;
pub mod node;
pub mod snapshot;

pub use compiled_plan::{ExecutionPlan, PlanStats};
pub use compiler::PlanCompiler;
pub use executor::{NodeList, Pipeline};
pub use graph::Graph;
pub use id::{GraphId, NodeId};
pub use node::{ArgSlot, Invocation, NestedPipeline, Node, NodeOp};
pub use snapshot::{EdgeSnapshot, NodeSnapshot, TopologySnapshot};
