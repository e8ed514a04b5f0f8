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

//! The per-operator-kind `can_pass`/`can_absorb` predicate table (§4.4).
//!
//! `spec.md` deliberately leaves this table to "the operator catalogue"; it
//! is grounded here on `original_source/src/ir/count_operator.h` (group-bys
//! and an aggregated column) and `agg_operator_mpc.cc` (the MPC/local split
//! per aggregation kind).

use super::{Operator, OperatorKind, OperatorPayload};

/// Whether an obligation rooted at an aggregation of `src_kind`/`src_payload`
/// commutes past `op`. `other` is the aggregation kind/payload of a sibling
/// obligation arriving on the other edge of a binary operator, if any.
pub fn can_pass(
    src_kind: OperatorKind,
    src_payload: &OperatorPayload,
    op: &Operator,
    other: Option<(OperatorKind, &OperatorPayload)>,
) -> bool {
    debug_assert!(src_kind.is_aggregation());
    let src_agg = match src_payload.as_aggregation() {
        Some(a) => a,
        None => return false,
    };
    let group_by = src_agg.group_by.as_slice();
    let agg_col = src_agg.column.as_deref();

    match op.kind() {
        // A predicate commutes past unless it reads the value the
        // obligation is still about to aggregate.
        OperatorKind::Select => match (op.condition(), agg_col) {
            (Some(cond), Some(col)) => !cond.touches(col),
            _ => true,
        },

        // A projection commutes past iff it retains every group-by column;
        // the aggregated column itself need not survive, since it's what the
        // realized aggregation will (re)produce.
        OperatorKind::Project => op
            .payload()
            .as_projection()
            .map(|p| group_by.iter().all(|c| p.kept_columns.iter().any(|k| k == c)))
            .unwrap_or(true),

        // A derived arithmetic column commutes past unless it shadows the
        // aggregated column or one of the group-by columns.
        OperatorKind::Div | OperatorKind::Mul | OperatorKind::Sub => op
            .payload()
            .as_arithmetic()
            .map(|a| {
                Some(a.output_column.as_str()) != agg_col
                    && !group_by.iter().any(|c| c == &a.output_column)
            })
            .unwrap_or(true),

        // Two aggregations on both sides of a join can be merged iff their
        // group-by keys both align with the join keys. A lone,
        // one-sided obligation cannot commute past a join: the join changes
        // the cardinality of exactly the side that did *not* carry an
        // obligation, so there is nothing to align it against.
        OperatorKind::Join | OperatorKind::Union => match other {
            Some((_, other_payload)) => {
                let join_keys = op.payload().as_join().map(|j| j.keys.as_slice()).unwrap_or(&[]);
                let other_group_by = other_payload
                    .as_aggregation()
                    .map(|a| a.group_by.as_slice())
                    .unwrap_or(&[]);
                !join_keys.is_empty()
                    && group_by.iter().all(|c| join_keys.contains(c))
                    && other_group_by.iter().all(|c| join_keys.contains(c))
            }
            None => false,
        },

        // Input/While are transparent control boundaries; Dummy only ever
        // appears after pruning runs (i.e. never during derivation).
        OperatorKind::Input | OperatorKind::While => true,
        OperatorKind::Dummy => false,

        // An aggregation never transparently passes an obligation through
        // itself: it either absorbs it (below) or blocks it.
        OperatorKind::Aggregate
        | OperatorKind::Count
        | OperatorKind::Min
        | OperatorKind::Max
        | OperatorKind::Sum
        | OperatorKind::Avg => false,
    }
}

/// Whether an aggregation of `upper_kind`/`upper_payload` subsumes an
/// incoming obligation rooted at `lower_kind`/`lower_payload`, removing it
/// without materializing a new node.
pub fn can_absorb(
    upper_kind: OperatorKind,
    upper_payload: &OperatorPayload,
    lower_kind: OperatorKind,
    lower_payload: &OperatorPayload,
) -> bool {
    if !upper_kind.is_aggregation() {
        return false;
    }
    let upper = match upper_payload.as_aggregation() {
        Some(a) => a,
        None => return false,
    };
    let lower = match lower_payload.as_aggregation() {
        Some(a) => a,
        None => return false,
    };
    // A coarser (or equal) upper grouping absorbs a finer lower one: every
    // column the lower aggregation grouped by must also appear in the
    // upper grouping.
    let coarser_grouping = lower.group_by.iter().all(|c| upper.group_by.contains(c));

    match (upper_kind, lower_kind) {
        // A Count absorbs any prior count over a coarser grouping,
        // regardless of the (irrelevant, since Count ignores its column)
        // aggregated column.
        (OperatorKind::Count, OperatorKind::Count) => coarser_grouping,

        // Same-kind Sum/Min/Max/Avg/Aggregate absorb a prior aggregation
        // over the same column and a coarser grouping.
        (OperatorKind::Sum, OperatorKind::Sum)
        | (OperatorKind::Min, OperatorKind::Min)
        | (OperatorKind::Max, OperatorKind::Max)
        | (OperatorKind::Avg, OperatorKind::Avg)
        | (OperatorKind::Aggregate, OperatorKind::Aggregate) => {
            coarser_grouping && upper.column == lower.column
        }

        _ => false,
    }
}
