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

//! The obligation deriver (§4.7): a topological walk that assigns each
//! node's mode and emits/pushes/blocks obligations along the way.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dag::{Dag, NodeId};
use crate::environment::Environment;
use crate::error::{PlannerError, Result};
use crate::obligation::Obligation;
use crate::observer::StateObserver;
use crate::operator::OperatorKind;
use crate::relation::RelationName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Local,
    Mpc,
}

impl Mode {
    pub fn is_mpc(self) -> bool {
        matches!(self, Mode::Mpc)
    }
}

pub type ModeMap = HashMap<RelationName, Mode>;

/// Runs the deriver over `order` (a valid topological order over `dag`),
/// mutating `env` and `mode` in place. `observer` is snapshotted before and
/// after each node, and once more at the end (§4.10).
pub fn derive_obligations(
    dag: &Dag,
    order: &[NodeId],
    env: &mut Environment,
    mode: &mut ModeMap,
    observer: &mut dyn StateObserver,
) -> Result<()> {
    let span = tracing::debug_span!("derive_obligations");
    let _enter = span.enter();

    for &cur in order {
        observer.snapshot(None, dag, env, mode);

        let node = dag.node(cur);
        let rel_name = node.op.output().name().to_string();

        if !node.op.output().is_shared() {
            tracing::trace!(relation = %rel_name, "relation not shared; staying local");
            mode.insert(rel_name, Mode::Local);
            observer.snapshot(Some(cur), dag, env, mode);
            continue;
        }

        let parents = node.parents.clone();
        let new_mode = match parents.len() {
            0 => {
                tracing::debug!(relation = %rel_name, "root relation found");
                emit(dag, cur, env)?
            }
            1 => {
                let par = parents[0];
                let par_name = dag.node(par).op.output().name().to_string();
                if mode.get(&par_name).copied().map(Mode::is_mpc).unwrap_or(false) {
                    Mode::Mpc
                } else if env.has(&par_name) {
                    let obl = env.pop(&par_name)?;
                    process(dag, Some(obl), None, cur, &par_name, "", env)?
                } else {
                    emit(dag, cur, env)?
                }
            }
            2 => {
                let left = parents[0];
                let right = parents[1];
                let left_name = dag.node(left).op.output().name().to_string();
                let right_name = dag.node(right).op.output().name().to_string();
                let left_mpc = mode.get(&left_name).copied().map(Mode::is_mpc).unwrap_or(false);
                let right_mpc = mode.get(&right_name).copied().map(Mode::is_mpc).unwrap_or(false);
                if left_mpc || right_mpc {
                    Mode::Mpc
                } else if env.has(&left_name) || env.has(&right_name) {
                    let left_obl = if env.has(&left_name) { Some(env.pop(&left_name)?) } else { None };
                    let right_obl = if env.has(&right_name) { Some(env.pop(&right_name)?) } else { None };
                    process(dag, left_obl, right_obl, cur, &left_name, &right_name, env)?
                } else {
                    emit(dag, cur, env)?
                }
            }
            n => {
                tracing::error!(node = ?cur, parent_count = n, "malformed dag: unexpected parent count");
                return Err(PlannerError::TooManyParents {
                    node: cur,
                    parent_count: n,
                });
            }
        };

        mode.insert(rel_name, new_mode);
        observer.snapshot(Some(cur), dag, env, mode);
    }

    observer.snapshot(None, dag, env, mode);
    Ok(())
}

/// `EmitObligation` (§4.7): aggregations emit one obligation per outgoing
/// edge (or exactly one if they're a leaf); `Join`/`Union` force mpc mode;
/// everything else just initializes the environment slot and stays local.
fn emit(dag: &Dag, cur: NodeId, env: &mut Environment) -> Result<Mode> {
    let node = dag.node(cur);
    let rel_name = node.op.output().name().to_string();

    if node.op.is_aggregation() {
        tracing::debug!(relation = %rel_name, "aggregation emitting obligations");
        let num_children = node.children.len();
        if num_children == 0 {
            let obl = Obligation::new(cur, 0);
            tracing::debug!(obligation = %obl.name(dag), "emitting obligation (leaf)");
            env.push(&rel_name, obl);
        } else {
            for i in 0..num_children {
                let obl = Obligation::new(cur, i);
                tracing::debug!(obligation = %obl.name(dag), "emitting obligation");
                env.push(&rel_name, obl);
            }
        }
        Ok(Mode::Local)
    } else if matches!(node.op.kind(), OperatorKind::Join | OperatorKind::Union) {
        env.init_for(&rel_name);
        Ok(Mode::Mpc)
    } else {
        env.init_for(&rel_name);
        Ok(Mode::Local)
    }
}

/// `ProcessObligation` (§4.7): either merges (passes) one obligation
/// forward, absorbs it, or blocks both it and its sibling back onto their
/// respective parents. Precondition: at least one of `left`/`right` is
/// `Some`.
fn process(
    dag: &Dag,
    left: Option<Obligation>,
    right: Option<Obligation>,
    cur: NodeId,
    left_name: &str,
    right_name: &str,
    env: &mut Environment,
) -> Result<Mode> {
    let (mut obl, other, par_name, other_par_name) = match (left, right) {
        (Some(l), r) => (l, r, left_name.to_string(), right_name.to_string()),
        (None, Some(r)) => (r, None, right_name.to_string(), String::new()),
        (None, None) => unreachable!("process() called with no obligations"),
    };

    let cur_op = dag.node(cur).op.clone();
    let cur_rel_name = cur_op.output().name().to_string();

    if obl.can_pass(dag, &cur_op, other.as_ref()) {
        tracing::debug!(node = ?cur, obligation = %obl.name(dag), "obligation passed through");
        env.push(&cur_rel_name, obl);
        Ok(Mode::Local)
    } else {
        tracing::debug!(node = ?cur, obligation = %obl.name(dag), "obligation blocked");
        if obl.can_absorb(dag, &cur_op) {
            tracing::debug!(node = ?cur, obligation = %obl.name(dag), "obligation absorbed");
            Ok(Mode::Mpc)
        } else {
            obl.blocked_by = Some(cur);
            env.push(&par_name, obl);
            if let Some(mut other) = other {
                other.blocked_by = Some(cur);
                env.push(&other_par_name, other);
            }
            Ok(Mode::Mpc)
        }
    }
}
