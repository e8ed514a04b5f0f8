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

//! The ownership propagator (§4.6): a monotone accumulation of owners along
//! edges.
//!
//! Relations are value types here rather than shared pointers, so identity
//! across appearances of "the same" relation is tracked by name, in a
//! `relation name -> accumulated owners` backlog — the same role the
//! original's `owner_lookup` map plays when a relation's owners are mutated
//! through one of several aliasing pointers to it.

use std::collections::{BTreeSet, HashMap};

use crate::dag::{Dag, NodeId};
use crate::relation::{OwnerId, RelationName};

/// Traverses `order` (must be a valid topological order over `dag`) and
/// unions owners across input relations into each node's output relation,
/// also merging in any backlog accumulated under the same relation name from
/// earlier appearances. Idempotent: running this twice is a no-op, since
/// owner sets only grow and the second pass re-derives the same union.
pub fn propagate_ownership(dag: &mut Dag, order: &[NodeId]) {
    let mut owner_lookup: HashMap<RelationName, BTreeSet<OwnerId>> = HashMap::new();

    for &id in order {
        let output_name = dag.node(id).op.output().name().to_string();
        let mut acc = owner_lookup.remove(&output_name).unwrap_or_default();

        let node = dag.node_mut(id);
        for input in node.op.inputs_mut() {
            let name = input.name().to_string();
            let backlog = owner_lookup.entry(name).or_default();
            backlog.extend(input.owners().iter().cloned());
            input.add_owners(backlog.iter().cloned());
            acc.extend(backlog.iter().cloned());
        }

        node.op.output_mut().add_owners(acc.iter().cloned());
        tracing::debug!(
            relation = %output_name,
            owners = ?node.op.output().owners(),
            "propagated ownership"
        );
        owner_lookup.insert(output_name, acc);
    }
}
