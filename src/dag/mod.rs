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

//! The DAG arena (§3/§4.3, and the arena design note in §9).
//!
//! Nodes are stored in a flat `Vec` and referenced by a stable [`NodeId`]
//! index rather than through `Rc`/`RefCell` cycles: the parent↔child back
//! edges the spec requires are exactly the cycle an arena-of-indices sidesteps.
//! The arena owns all storage; the deriver and rewriter pass `NodeId`s around
//! and fetch nodes through it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::operator::Operator;

/// A stable index into a [`Dag`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A DAG vertex: an operator plus ordered parent/child edges.
///
/// Parent order is significant and stable: index 0 is "left", index 1 is
/// "right" for a binary operator such as `Join`. `loop_children` holds the
/// extra edges used when the DAG encodes a fixed-point/`While` construct;
/// the core pass here never needs to traverse them, but they are preserved
/// across every mutation so a `While`-aware caller can.
#[derive(Debug, Clone)]
pub struct DagNode {
    pub id: NodeId,
    pub op: Operator,
    pub parents: Vec<NodeId>,
    pub children: Vec<NodeId>,
    pub loop_children: Vec<NodeId>,
}

/// The operator DAG: a sequence of root nodes plus every node transitively
/// reachable from them, held in one arena.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    nodes: Vec<DagNode>,
    pub roots: Vec<NodeId>,
}

impl Dag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new, edgeless node and returns its id. Callers wire it
    /// into the graph with [`Dag::connect`] and, if appropriate, push it
    /// onto `roots` themselves.
    pub fn add_node(&mut self, op: Operator) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DagNode {
            id,
            op,
            parents: Vec::new(),
            children: Vec::new(),
            loop_children: Vec::new(),
        });
        id
    }

    pub fn add_root(&mut self, op: Operator) -> NodeId {
        let id = self.add_node(op);
        self.roots.push(id);
        id
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if id.0 >= self.nodes.len() {
            return Err(PlannerError::MissingParent {
                node: id,
                missing: id,
            });
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> &DagNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DagNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[DagNode] {
        &self.nodes
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    /// Adds the dual `parent -> child` / `child -> parent` edge pair. Every
    /// edge mutation in this crate goes through `connect`/`disconnect` so the
    /// two directions never drift apart (§4.3's edge-dual invariant).
    pub fn connect(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parents.push(parent);
        Ok(())
    }

    pub fn disconnect(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.retain(|&c| c != child);
        self.nodes[child.0].parents.retain(|&p| p != parent);
    }

    pub fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        self.nodes[id.0].children = children;
    }

    pub fn set_parents(&mut self, id: NodeId, parents: Vec<NodeId>) {
        self.nodes[id.0].parents = parents;
    }

    /// Swaps in `new_op`, preserving edges, and returns the operator that was
    /// there before. The old operator is simply dropped if the caller
    /// discards the return value (§5: "`replace_operator` destroys the old
    /// one").
    pub fn replace_operator(&mut self, id: NodeId, new_op: Operator) -> Operator {
        std::mem::replace(&mut self.nodes[id.0].op, new_op)
    }

    /// Nodes with no parents: the DAG's source relations.
    pub fn source_relations(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.parents.is_empty())
            .map(|n| n.id)
            .collect()
    }

    /// Whether `party` owns the output relation of at least one node.
    pub fn has_owner(&self, party: &crate::relation::OwnerId) -> bool {
        self.nodes.iter().any(|n| n.op.output().has_owner(party))
    }

    /// A topological order over every node reachable from `roots`, computed
    /// with Kahn's algorithm over the arena's own adjacency lists (no second
    /// graph representation is needed: the arena already *is* the
    /// adjacency). Errors on a node with more than two parents (the operator
    /// algebra does not admit this, §4.7) or on a cycle.
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        let n = self.nodes.len();
        let mut indeg = vec![0usize; n];
        for node in &self.nodes {
            if node.parents.len() > 2 {
                return Err(PlannerError::TooManyParents {
                    node: node.id,
                    parent_count: node.parents.len(),
                });
            }
            indeg[node.id.0] = node.parents.len();
        }

        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut queued = vec![false; n];
        for node in &self.nodes {
            if indeg[node.id.0] == 0 {
                queue.push_back(node.id);
                queued[node.id.0] = true;
            }
        }

        let mut order = Vec::with_capacity(n);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &child in &self.nodes[id.0].children {
                indeg[child.0] -= 1;
                if indeg[child.0] == 0 && !queued[child.0] {
                    queue.push_back(child);
                    queued[child.0] = true;
                }
            }
        }

        if order.len() != n {
            return Err(PlannerError::Cycle);
        }
        Ok(order)
    }
}
