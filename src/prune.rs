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

//! The two-sweep pruner (§4.9).
//!
//! First sweep: any node whose output relation is not owned by `party` is
//! *bad* and its operator is replaced with a [`crate::operator::Operator::dummy`]
//! over the same relation, so downstream references to it remain
//! resolvable. Second sweep: every node drops bad nodes from its children
//! list. Parent edges and root membership are left untouched — per the open
//! question in the design notes, a `Dummy` may still appear as a parent, and
//! downstream consumers are expected to tolerate that.

use std::collections::HashSet;

use crate::dag::{Dag, NodeId};
use crate::operator::Operator;
use crate::relation::OwnerId;

pub fn prune_dag(dag: &mut Dag, party: &OwnerId) {
    let span = tracing::debug_span!("prune_dag", party = %party);
    let _enter = span.enter();

    validate_owner(dag, party);

    let bad: HashSet<NodeId> = dag
        .nodes()
        .iter()
        .filter(|n| !n.op.output().has_owner(party))
        .map(|n| n.id)
        .collect();

    for &id in &bad {
        let output = dag.node(id).op.output().clone();
        tracing::debug!(node = ?id, relation = %output, "pruning node not owned by party");
        dag.replace_operator(id, Operator::dummy(output));
    }

    let all_ids: Vec<NodeId> = dag.nodes().iter().map(|n| n.id).collect();
    for id in all_ids {
        let kept: Vec<NodeId> = dag
            .node(id)
            .children
            .iter()
            .copied()
            .filter(|c| !bad.contains(c))
            .collect();
        dag.set_children(id, kept);
    }
}

/// Non-fatal sanity check (§7's `OwnerMissing`): a party that owns nothing
/// in the dag at all is almost certainly a configuration mistake, but
/// pruning is still well-defined (it just produces an all-`Dummy` dag), so
/// this only warns rather than aborting the pass.
fn validate_owner(dag: &Dag, party: &OwnerId) {
    if !dag.has_owner(party) {
        tracing::warn!(party = %party, "party owns no relation in this dag");
    }
}
