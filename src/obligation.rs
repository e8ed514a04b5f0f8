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

//! A deferred aggregation, captured at the node that emitted it (§3/§4.4).

use serde::{Deserialize, Serialize};

use crate::dag::{Dag, NodeId};
use crate::operator::{catalog, Operator, OperatorKind, OperatorPayload};

/// `(src_node, emit_index, blocked_by?)`. `src_node` is the aggregation node
/// that originated this obligation; `emit_index` identifies which outgoing
/// edge it follows (an aggregation emits one per child, or exactly one if
/// it's a leaf); `blocked_by` is set only once the obligation has been
/// stopped and must be materialized on the edge into that node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub src: NodeId,
    pub emit_index: usize,
    pub blocked_by: Option<NodeId>,
}

impl Obligation {
    pub fn new(src: NodeId, emit_index: usize) -> Self {
        Self {
            src,
            emit_index,
            blocked_by: None,
        }
    }

    /// A human-readable identifier for log lines, mirroring the original's
    /// `Obligation::get_name()`.
    pub fn name(&self, dag: &Dag) -> String {
        format!("{}#{}", dag.node(self.src).op.output().name(), self.emit_index)
    }

    /// A clone of the aggregation operator that originated this obligation,
    /// used by the rewriter to materialize a realization node.
    pub fn operator(&self, dag: &Dag) -> Operator {
        dag.node(self.src).op.clone()
    }

    fn src_kind_payload<'a>(&self, dag: &'a Dag) -> (OperatorKind, &'a OperatorPayload) {
        let op = &dag.node(self.src).op;
        (op.kind(), op.payload())
    }

    /// True when this obligation's aggregation commutes past `op` (and, for
    /// binary operators, is compatible with `other`, a sibling obligation
    /// arriving on the other edge).
    pub fn can_pass(&self, dag: &Dag, op: &Operator, other: Option<&Obligation>) -> bool {
        let (src_kind, src_payload) = self.src_kind_payload(dag);
        let other_kp = other.map(|o| o.src_kind_payload(dag));
        catalog::can_pass(src_kind, src_payload, op, other_kp)
    }

    /// True when `op` is itself an aggregation that subsumes this obligation.
    pub fn can_absorb(&self, dag: &Dag, op: &Operator) -> bool {
        let (src_kind, src_payload) = self.src_kind_payload(dag);
        catalog::can_absorb(op.kind(), op.payload(), src_kind, src_payload)
    }
}
