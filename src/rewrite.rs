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

//! The DAG rewriter (§4.8): a BFS from the roots that, for each visited
//! node's output relation `r`, either flips the operator to its mpc form or
//! realizes whatever obligation is still sitting in `env[r]` as a newly
//! spliced-in node.

use std::collections::{HashSet, VecDeque};

use crate::dag::{Dag, NodeId};
use crate::derive::ModeMap;
use crate::environment::Environment;
use crate::error::{PlannerError, Result};
use crate::operator::{Operator, OperatorKind};
use crate::relation::Relation;

pub fn rewrite_dag(dag: &mut Dag, mode: &ModeMap, env: &mut Environment) -> Result<()> {
    let span = tracing::debug_span!("rewrite_dag");
    let _enter = span.enter();

    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<NodeId> = dag.roots.iter().copied().collect();

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }

        let rel_name = dag.node(id).op.output().name().to_string();
        let node_mode = mode.get(&rel_name).copied();

        if node_mode == Some(crate::derive::Mode::Mpc) {
            let mpc_op = dag.node(id).op.to_mpc()?;
            tracing::debug!(node = ?id, relation = %rel_name, "swapped operator for its mpc form");
            dag.replace_operator(id, mpc_op);
        } else if env.has(&rel_name) {
            let obl = env.pop(&rel_name)?;
            tracing::debug!(node = ?id, obligation = %obl.name(dag), "realizing obligation");
            let new_op = obl.operator(dag);
            let blocked_by = obl.blocked_by;
            insert(dag, id, blocked_by, new_op, &rel_name)?;
        }

        for &child in &dag.node(id).children.clone() {
            queue.push_back(child);
        }
    }

    Ok(())
}

/// Splices a new node realizing `new_op` as a child of `at`, in front of
/// `child` if one is given (§4.8's `insert` helper): `at`'s output becomes
/// `new_op`'s sole input, and if `child` references `at`'s output directly
/// it is rewired to reference the realized node's own (pre-existing) output
/// relation instead. `new_op` keeps the output relation it already carries —
/// it is realizing that relation's obligation, so its identity must survive
/// the splice (§3, §4.8 step 1).
fn insert(
    dag: &mut Dag,
    at: NodeId,
    child: Option<NodeId>,
    mut new_op: Operator,
    at_rel_name: &str,
) -> Result<()> {
    let at_kind = dag.node(at).op.kind();
    if at_kind == OperatorKind::Dummy {
        return Err(PlannerError::UnexpectedOperator { node: at, kind: at_kind });
    }

    let at_relation = dag.node(at).op.output().clone();
    new_op.set_relations(vec![at_relation]);
    new_op.update_columns();
    let realized_relation = new_op.output().clone();

    let new_id = dag.add_node(new_op);
    dag.connect(at, new_id)?;

    if let Some(child_id) = child {
        dag.disconnect(at, child_id);
        dag.connect(new_id, child_id)?;
        let child_op = &mut dag.node_mut(child_id).op;
        child_op.rename_input(at_rel_name, realized_relation);
        child_op.update_columns();
    }

    tracing::debug!(at = ?at, realized = ?new_id, child = ?child, "materialized realization node");
    Ok(())
}
