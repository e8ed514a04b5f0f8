// Copyright 2026 the mpc_planner Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Diagnostic observation hooks (§4.10) and an `explain`-style renderer for
//! the dag, in the vein of `risingwave_common::util::explain_node`'s
//! `Distill`/`Pretty` pipeline.

use pretty_xmlish::{Pretty, PrettyConfig, XmlNode};
use serde::Serialize;

use crate::dag::{Dag, NodeId};
use crate::derive::ModeMap;
use crate::environment::Environment;

/// Called by [`crate::derive::derive_obligations`] before and after visiting
/// each node (`node` is `None` on the pre-loop and post-loop calls). A caller
/// that doesn't care about the trace can pass [`NullObserver`]; one that
/// wants a full record can pass [`JsonTraceObserver`].
pub trait StateObserver {
    fn snapshot(&mut self, node: Option<NodeId>, dag: &Dag, env: &Environment, mode: &ModeMap);
}

/// The zero-cost default: discards every snapshot.
pub struct NullObserver;

impl StateObserver for NullObserver {
    fn snapshot(&mut self, _node: Option<NodeId>, _dag: &Dag, _env: &Environment, _mode: &ModeMap) {}
}

#[derive(Debug, Clone, Serialize)]
struct Snapshot {
    node: Option<NodeId>,
    env: Environment,
    mode: ModeMap,
}

/// Accumulates every snapshot as a JSON value, for tests and for offline
/// debugging of a single pass run.
#[derive(Debug, Default)]
pub struct JsonTraceObserver {
    snapshots: Vec<Snapshot>,
}

impl JsonTraceObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Renders the accumulated trace as a pretty-printed JSON array.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshots)
    }
}

impl StateObserver for JsonTraceObserver {
    fn snapshot(&mut self, node: Option<NodeId>, _dag: &Dag, env: &Environment, mode: &ModeMap) {
        self.snapshots.push(Snapshot {
            node,
            env: env.clone(),
            mode: mode.clone(),
        });
    }
}

fn pretty_config() -> PrettyConfig {
    PrettyConfig {
        indent: 3,
        need_boundaries: false,
        width: 2048,
        reduced_spaces: true,
    }
}

/// Renders `dag` as a human-readable tree, one line per node, following each
/// node's children in order. Used for debugging and in the end-to-end test
/// scenarios to assert on shape without hand-building a `Dag` equality check.
pub fn explain(dag: &Dag) -> String {
    let mut out = String::new();
    let config = pretty_config();
    for &root in &dag.roots {
        let pretty = explain_node(dag, root);
        config.unicode(&mut out, &pretty);
        out.push('\n');
    }
    out
}

fn explain_node(dag: &Dag, id: NodeId) -> Pretty<'static> {
    let node = dag.node(id);
    let label = format!("{:?}{}", node.op.kind(), if node.op.is_mpc() { "[mpc]" } else { "" });
    let output_display = node.op.output().to_string();
    let fields = vec![("output", Pretty::display(&output_display))];
    let children: Vec<Pretty<'static>> = node.children.iter().map(|&c| explain_node(dag, c)).collect();
    Pretty::Record(XmlNode::simple_record(label, fields, children))
}
