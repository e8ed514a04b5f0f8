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

//! Top-level orchestration (§4.2): ownership propagation, obligation
//! derivation, dag rewriting, and, for a given observing party, pruning.

use crate::dag::Dag;
use crate::derive::ModeMap;
use crate::environment::Environment;
use crate::error::Result;
use crate::observer::{NullObserver, StateObserver};
use crate::relation::OwnerId;
use crate::{derive, propagate, prune, rewrite};

/// The full rewrite, minus pruning: propagates ownership, derives
/// obligations and per-relation modes, and rewrites every operator to its
/// local or mpc form in place. Returns the final mode map, mainly so callers
/// (and the test scenarios) can assert on it directly.
pub fn run(dag: &mut Dag) -> Result<ModeMap> {
    run_with_observer(dag, &mut NullObserver)
}

/// As [`run`], but drives `observer` through every node visited by the
/// obligation deriver (§4.10).
pub fn run_with_observer(dag: &mut Dag, observer: &mut dyn StateObserver) -> Result<ModeMap> {
    let order = dag.topological_order()?;
    propagate::propagate_ownership(dag, &order);

    let mut env = Environment::new();
    let mut mode = ModeMap::new();
    for &src in &dag.source_relations() {
        let name = dag.node(src).op.output().name().to_string();
        mode.insert(name.clone(), derive::Mode::Local);
        env.init_for(&name);
    }

    derive::derive_obligations(dag, &order, &mut env, &mut mode, observer)?;
    rewrite::rewrite_dag(dag, &mode, &mut env)?;

    Ok(mode)
}

/// Runs the full pipeline and then prunes the result down to what `party`
/// can observe (§4.9). The two are kept as separate entry points because a
/// caller producing output for every party reruns only the (cheap) pruning
/// sweep once per party rather than the whole pass.
pub fn run_for_party(dag: &mut Dag, party: &OwnerId) -> Result<ModeMap> {
    let mode = run(dag)?;
    prune::prune_dag(dag, party);
    Ok(mode)
}
