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

//! End-to-end scenarios S1-S6 and the quantified invariants, driven through
//! the top-level `pass::run`/`pass::run_for_party` entry points.

use assert_matches::assert_matches;
use pretty_assertions::assert_eq as assert_eq_pretty;

use mpc_planner::derive::Mode;
use mpc_planner::operator::{AggPayload, ConditionTree, JoinPayload, Operator, OperatorKind, OperatorPayload};
use mpc_planner::{pass, Dag, OwnerId, Relation};

fn owner(id: &str) -> OwnerId {
    OwnerId::new(id)
}

fn input(name: &str, owners: &[&str]) -> Operator {
    Operator::new(
        OperatorKind::Input,
        "dir",
        vec![],
        Relation::new(name, owners.iter().map(|o| owner(o)), vec![]),
        None,
        OperatorPayload::None,
    )
}

fn select(input_name: &str, output_name: &str) -> Operator {
    Operator::new(
        OperatorKind::Select,
        "dir",
        vec![Relation::new(input_name, vec![], vec![])],
        Relation::new(output_name, vec![], vec![]),
        None,
        OperatorPayload::None,
    )
}

fn project(input_name: &str, output_name: &str, kept: &[&str]) -> Operator {
    Operator::new(
        OperatorKind::Project,
        "dir",
        vec![Relation::new(input_name, vec![], vec![])],
        Relation::new(output_name, vec![], vec![]),
        None,
        OperatorPayload::Projection(mpc_planner::operator::ProjectionPayload {
            kept_columns: kept.iter().map(|s| s.to_string()).collect(),
        }),
    )
}

// S1: single-party chain. No relation is ever shared, so nothing swaps.
#[test]
fn s1_single_party_chain_stays_entirely_local() {
    let mut dag = Dag::new();
    let r = dag.add_root(input("r", &["p1"]));
    let sel = dag.add_node(select("r", "sel"));
    let proj = dag.add_node(project("sel", "proj", &["g"]));
    dag.connect(r, sel).unwrap();
    dag.connect(sel, proj).unwrap();

    let mode = pass::run(&mut dag).unwrap();

    assert_eq!(mode.get("r"), Some(&Mode::Local));
    assert_eq!(mode.get("sel"), Some(&Mode::Local));
    assert_eq!(mode.get("proj"), Some(&Mode::Local));
    assert!(!dag.node(r).op.is_mpc());
    assert!(!dag.node(sel).op.is_mpc());
    assert!(!dag.node(proj).op.is_mpc());
    assert_eq!(dag.nodes().len(), 3, "no realization node should have been inserted");
}

// S2: an aggregation's obligation commutes past a projection that retains
// its group-by column, leaving both local, and a realization node is
// inserted below the projection.
#[test]
fn s2_late_aggregation_push_through() {
    let mut dag = Dag::new();
    let r = dag.add_root(input("r", &["p1", "p2"]));
    let agg = dag.add_node(Operator::new(
        OperatorKind::Sum,
        "dir",
        vec![Relation::new("r", vec![], vec![])],
        Relation::new("sum_r", vec![], vec![]),
        None,
        OperatorPayload::Aggregation(AggPayload {
            group_by: vec!["g".into()],
            column: Some("amount".into()),
        }),
    ));
    let proj = dag.add_node(project("sum_r", "kept", &["g"]));
    dag.connect(r, agg).unwrap();
    dag.connect(agg, proj).unwrap();

    let before = dag.nodes().len();
    let mode = pass::run(&mut dag).unwrap();

    assert_eq!(mode.get("sum_r"), Some(&Mode::Local));
    assert_eq!(mode.get("kept"), Some(&Mode::Local));
    assert!(!dag.node(agg).op.is_mpc());
    assert!(!dag.node(proj).op.is_mpc());
    assert_eq!(
        dag.nodes().len(),
        before + 1,
        "a realization node should have been spliced in below the projection"
    );
    let realized = dag.node(proj).children[0];
    assert_eq!(dag.node(realized).op.kind(), OperatorKind::Sum);
    assert_eq!(
        dag.node(realized).op.output().name(),
        "sum_r",
        "the realized node must still be named after the relation it materializes"
    );
}

// S3: joining two singly-owned relations forces the join into mpc mode.
#[test]
fn s3_join_forces_mpc() {
    let mut dag = Dag::new();
    let a = dag.add_root(input("a", &["p1"]));
    let b = dag.add_root(input("b", &["p2"]));
    let join = dag.add_node(Operator::new(
        OperatorKind::Join,
        "dir",
        vec![
            Relation::new("a", vec![], vec![]),
            Relation::new("b", vec![], vec![]),
        ],
        Relation::new("joined", vec![], vec![]),
        None,
        OperatorPayload::Join(JoinPayload { keys: vec!["k".into()] }),
    ));
    dag.connect(a, join).unwrap();
    dag.connect(b, join).unwrap();

    let mode = pass::run(&mut dag).unwrap();

    assert_eq!(mode.get("joined"), Some(&Mode::Mpc));
    assert!(dag.node(join).op.is_mpc());
    assert_eq!(dag.node(join).op.kind(), OperatorKind::Join);
}

// S4: a coarser Count absorbs a finer Count's obligation; no realization
// node is inserted for the absorbed obligation.
#[test]
fn s4_absorbed_aggregation() {
    let mut dag = Dag::new();
    let r = dag.add_root(input("r", &["p1", "p2"]));
    let lower = dag.add_node(Operator::new(
        OperatorKind::Count,
        "dir",
        vec![Relation::new("r", vec![], vec![])],
        Relation::new("count1", vec![], vec![]),
        None,
        OperatorPayload::Aggregation(AggPayload {
            group_by: vec!["g".into()],
            column: None,
        }),
    ));
    let upper = dag.add_node(Operator::new(
        OperatorKind::Count,
        "dir",
        vec![Relation::new("count1", vec![], vec![])],
        Relation::new("count2", vec![], vec![]),
        None,
        OperatorPayload::Aggregation(AggPayload {
            group_by: vec!["g".into()],
            column: None,
        }),
    ));
    dag.connect(r, lower).unwrap();
    dag.connect(lower, upper).unwrap();

    let before = dag.nodes().len();
    let mode = pass::run(&mut dag).unwrap();

    assert_eq!(mode.get("count1"), Some(&Mode::Local));
    assert_eq!(mode.get("count2"), Some(&Mode::Mpc));
    assert!(!dag.node(lower).op.is_mpc());
    assert!(dag.node(upper).op.is_mpc());
    assert_eq!(dag.nodes().len(), before, "an absorbed obligation inserts no new node");
}

// S5: an obligation blocked by a Select that reads the aggregated column
// forces mpc mode on the Select and a realization node upstream of it.
#[test]
fn s5_blocked_by_incompatible_select() {
    let mut dag = Dag::new();
    let r = dag.add_root(input("r", &["p1", "p2"]));
    let agg = dag.add_node(Operator::new(
        OperatorKind::Sum,
        "dir",
        vec![Relation::new("r", vec![], vec![])],
        Relation::new("sum_r", vec![], vec![]),
        None,
        OperatorPayload::Aggregation(AggPayload {
            group_by: vec!["g".into()],
            column: Some("amount".into()),
        }),
    ));
    let sel = dag.add_node(Operator::new(
        OperatorKind::Select,
        "dir",
        vec![Relation::new("sum_r", vec![], vec![])],
        Relation::new("filtered", vec![], vec![]),
        Some(ConditionTree {
            touched_columns: vec!["amount".into()],
        }),
        OperatorPayload::None,
    ));
    dag.connect(r, agg).unwrap();
    dag.connect(agg, sel).unwrap();

    let before = dag.nodes().len();
    let mode = pass::run(&mut dag).unwrap();

    assert_eq!(mode.get("sum_r"), Some(&Mode::Local));
    assert_eq!(mode.get("filtered"), Some(&Mode::Mpc));
    assert!(dag.node(sel).op.is_mpc());
    assert_eq!(
        dag.nodes().len(),
        before + 1,
        "the blocked aggregation should have been realized as a new node"
    );
}

// S6: a node whose final relation is not owned by the configured party
// becomes a Dummy and is dropped from its parents' children lists.
#[test]
fn s6_prune_foreign_output() {
    let mut dag = Dag::new();
    let a = dag.add_root(input("a", &["p1"]));
    let b = dag.add_node(select("a", "b"));
    dag.connect(a, b).unwrap();

    pass::run_for_party(&mut dag, &owner("p2")).unwrap();

    assert_eq!(dag.node(a).op.kind(), OperatorKind::Dummy);
    assert_eq!(dag.node(b).op.kind(), OperatorKind::Dummy);
    assert!(dag.node(a).children.is_empty());
}

// Property 1: ownership monotonicity.
#[test]
fn property_ownership_monotonicity() {
    let mut dag = Dag::new();
    let a = dag.add_root(input("a", &["p1"]));
    let b = dag.add_root(input("b", &["p2"]));
    let join = dag.add_node(Operator::new(
        OperatorKind::Join,
        "dir",
        vec![
            Relation::new("a", vec![], vec![]),
            Relation::new("b", vec![], vec![]),
        ],
        Relation::new("joined", vec![], vec![]),
        None,
        OperatorPayload::Join(JoinPayload { keys: vec!["k".into()] }),
    ));
    dag.connect(a, join).unwrap();
    dag.connect(b, join).unwrap();

    pass::run(&mut dag).unwrap();

    let joined_owners = dag.node(join).op.output().owners().clone();
    for input_rel in dag.node(join).op.inputs() {
        for o in input_rel.owners() {
            assert!(joined_owners.contains(o));
        }
    }
    assert!(joined_owners.contains(&owner("p1")));
    assert!(joined_owners.contains(&owner("p2")));
}

// Property 3: obligation conservation — nothing is left in the environment
// after a full run (`run_for_party` drives `rewrite_dag`, which realizes
// every still-blocked obligation).
#[test]
fn property_obligation_conservation() {
    let mut dag = Dag::new();
    let r = dag.add_root(input("r", &["p1", "p2"]));
    let agg = dag.add_node(Operator::new(
        OperatorKind::Sum,
        "dir",
        vec![Relation::new("r", vec![], vec![])],
        Relation::new("sum_r", vec![], vec![]),
        None,
        OperatorPayload::Aggregation(AggPayload {
            group_by: vec!["g".into()],
            column: Some("amount".into()),
        }),
    ));
    let sel = dag.add_node(Operator::new(
        OperatorKind::Select,
        "dir",
        vec![Relation::new("sum_r", vec![], vec![])],
        Relation::new("filtered", vec![], vec![]),
        Some(ConditionTree {
            touched_columns: vec!["amount".into()],
        }),
        OperatorPayload::None,
    ));
    dag.connect(r, agg).unwrap();
    dag.connect(agg, sel).unwrap();

    let mut env = mpc_planner::Environment::new();
    let mut mode = mpc_planner::ModeMap::new();
    let order = dag.topological_order().unwrap();
    mpc_planner::propagate::propagate_ownership(&mut dag, &order);
    for src in dag.source_relations() {
        let name = dag.node(src).op.output().name().to_string();
        mode.insert(name.clone(), Mode::Local);
        env.init_for(&name);
    }
    mpc_planner::derive::derive_obligations(&dag, &order, &mut env, &mut mode, &mut mpc_planner::observer::NullObserver).unwrap();
    mpc_planner::rewrite::rewrite_dag(&mut dag, &mode, &mut env).unwrap();

    assert!(
        !env.has("sum_r"),
        "the realized obligation must have been consumed by rewrite"
    );
}

// Property 4: idempotence of rewrite.
#[test]
fn property_rewrite_idempotence() {
    let mut dag = Dag::new();
    let a = dag.add_root(input("a", &["p1"]));
    let b = dag.add_root(input("b", &["p2"]));
    let join = dag.add_node(Operator::new(
        OperatorKind::Join,
        "dir",
        vec![
            Relation::new("a", vec![], vec![]),
            Relation::new("b", vec![], vec![]),
        ],
        Relation::new("joined", vec![], vec![]),
        None,
        OperatorPayload::Join(JoinPayload { keys: vec!["k".into()] }),
    ));
    dag.connect(a, join).unwrap();
    dag.connect(b, join).unwrap();

    pass::run(&mut dag).unwrap();
    let node_count_after_first = dag.nodes().len();
    let join_op_after_first = dag.node(join).op.clone();

    pass::run(&mut dag).unwrap();

    assert_eq!(dag.nodes().len(), node_count_after_first);
    assert_eq_pretty!(dag.node(join).op, join_op_after_first, "rewriting twice must leave the operator unchanged");
}

// Property 5: prune consistency.
#[test]
fn property_prune_consistency() {
    let mut dag = Dag::new();
    let a = dag.add_root(input("a", &["p1"]));
    let b = dag.add_node(select("a", "b"));
    dag.connect(a, b).unwrap();

    pass::run_for_party(&mut dag, &owner("p1")).unwrap();

    for node in dag.nodes() {
        if node.op.kind() != OperatorKind::Dummy {
            assert!(node.op.output().has_owner(&owner("p1")));
        }
    }
}

// Property 6: structural round-trip — an all-unshared dag rewrites to an
// all-local dag with no mpc swaps.
#[test]
fn property_structural_round_trip_for_unshared_dag() {
    let mut dag = Dag::new();
    let r = dag.add_root(input("r", &["p1"]));
    let sel = dag.add_node(select("r", "sel"));
    dag.connect(r, sel).unwrap();

    let mode = pass::run(&mut dag).unwrap();

    assert_matches!(mode.get("sel"), Some(Mode::Local));
    for node in dag.nodes() {
        assert!(!node.op.is_mpc());
    }
}
