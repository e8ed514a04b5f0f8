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

//! The operator model: a closed variant algebra over relational operators.
//!
//! Unlike a `dyn PlanNode` hierarchy, `Operator` is a single tagged enum of
//! [`OperatorKind`] plus an `is_mpc` flag and a kind-specific [`OperatorPayload`].
//! This is a deliberate departure from virtual dispatch: the operator
//! catalogue is closed (§4.1), so an exhaustive `match` on `OperatorKind`
//! catches a missing variant at compile time, which a trait-object hierarchy
//! would not.

pub mod catalog;

use enum_as_inner::EnumAsInner;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::relation::Relation;

/// The closed set of operator kinds this pass understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    Input,
    Select,
    Project,
    Join,
    Union,
    Aggregate,
    Count,
    Min,
    Max,
    Sum,
    Avg,
    Div,
    Mul,
    Sub,
    While,
    Dummy,
}

impl OperatorKind {
    /// Non-shareable control operators: their `to_mpc()` is the identity.
    pub fn is_non_shareable(self) -> bool {
        matches!(self, OperatorKind::Input | OperatorKind::Dummy | OperatorKind::While)
    }

    /// Aggregations share a common interface for the obligation deriver:
    /// they are the only operators that ever *emit* an obligation.
    pub fn is_aggregation(self) -> bool {
        matches!(
            self,
            OperatorKind::Aggregate
                | OperatorKind::Count
                | OperatorKind::Min
                | OperatorKind::Max
                | OperatorKind::Sum
                | OperatorKind::Avg
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(self, OperatorKind::Join | OperatorKind::Union)
    }
}

/// A filter predicate, reduced to the set of columns it reads. The obligation
/// catalogue only ever needs to know whether a predicate touches a
/// particular column (§4.4's "a count obligation passes a projection that
/// retains its group-by columns" reasoning extends the same way to
/// predicates), so a full expression tree would be unused machinery here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionTree {
    pub touched_columns: Vec<String>,
}

impl ConditionTree {
    pub fn touches(&self, column: &str) -> bool {
        self.touched_columns.iter().any(|c| c == column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggPayload {
    pub group_by: Vec<String>,
    pub column: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithKind {
    Div,
    Mul,
    Sub,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithPayload {
    pub kind: ArithKind,
    pub operands: Vec<String>,
    pub output_column: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionPayload {
    pub kept_columns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPayload {
    pub keys: Vec<String>,
}

/// Operator-specific payload: group-by columns, aggregated column, arithmetic
/// kind, and so on (§3). `EnumAsInner` gives each variant a cheap
/// `as_aggregation()`/`as_projection()`/... accessor used throughout the
/// catalogue instead of hand-written `if let` boilerplate at every call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumAsInner)]
pub enum OperatorPayload {
    None,
    Aggregation(AggPayload),
    Arithmetic(ArithPayload),
    Projection(ProjectionPayload),
    Join(JoinPayload),
}

/// A DAG operator: an input directory, its input relations (ordered — index
/// 0 is "left", 1 is "right" for binary operators, and this order is stable
/// throughout the pipeline), one output relation, an optional filter
/// predicate, and kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    kind: OperatorKind,
    is_mpc: bool,
    input_dir: String,
    inputs: Vec<Relation>,
    output: Relation,
    condition: Option<ConditionTree>,
    payload: OperatorPayload,
}

impl Operator {
    pub fn new(
        kind: OperatorKind,
        input_dir: impl Into<String>,
        inputs: Vec<Relation>,
        output: Relation,
        condition: Option<ConditionTree>,
        payload: OperatorPayload,
    ) -> Self {
        Self {
            kind,
            is_mpc: false,
            input_dir: input_dir.into(),
            inputs,
            output,
            condition,
            payload,
        }
    }

    /// A `Dummy` operator replacing one whose output is not observed by the
    /// current party. It keeps the same output relation object so downstream
    /// references remain resolvable (§4.9), and loses all payload.
    pub fn dummy(output: Relation) -> Self {
        Self {
            kind: OperatorKind::Dummy,
            is_mpc: false,
            input_dir: String::new(),
            inputs: Vec::new(),
            output,
            condition: None,
            payload: OperatorPayload::None,
        }
    }

    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    pub fn is_mpc(&self) -> bool {
        self.is_mpc
    }

    pub fn is_aggregation(&self) -> bool {
        self.kind.is_aggregation()
    }

    pub fn input_dir(&self) -> &str {
        &self.input_dir
    }

    pub fn inputs(&self) -> &[Relation] {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut Vec<Relation> {
        &mut self.inputs
    }

    pub fn output(&self) -> &Relation {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut Relation {
        &mut self.output
    }

    pub fn condition(&self) -> Option<&ConditionTree> {
        self.condition.as_ref()
    }

    pub fn payload(&self) -> &OperatorPayload {
        &self.payload
    }

    /// Overwrites the input relation list wholesale. The rewriter is the
    /// only caller that does this outside of construction (§4.3).
    pub fn set_relations(&mut self, rels: Vec<Relation>) {
        self.inputs = rels;
    }

    /// Renames a single input relation reference, used by the rewriter when
    /// splicing a realization node in between an operator and its child
    /// (§4.8 step 3).
    pub fn rename_input(&mut self, old_name: &str, new_rel: Relation) {
        for r in self.inputs.iter_mut() {
            if r.name() == old_name {
                *r = new_rel.clone();
            }
        }
    }

    /// Re-derives the output schema from the current inputs and payload.
    /// Aggregations project to group-by columns plus the aggregated column;
    /// `Project` projects to its kept columns; everything else passes
    /// through the (deduplicated, order-preserving) union of its inputs'
    /// columns.
    pub fn update_columns(&mut self) {
        let columns = if self.kind.is_aggregation() {
            match self.payload.as_aggregation() {
                Some(agg) => {
                    let mut cols = agg.group_by.clone();
                    if let Some(c) = &agg.column {
                        cols.push(c.clone());
                    }
                    cols
                }
                None => Vec::new(),
            }
        } else if self.kind == OperatorKind::Project {
            self.payload
                .as_projection()
                .map(|p| p.kept_columns.clone())
                .unwrap_or_default()
        } else {
            self.inputs
                .iter()
                .flat_map(|input| input.columns().iter().cloned())
                .unique()
                .collect()
        };
        self.output.set_columns(columns);
    }

    /// The MPC form of this operator. Non-shareable control operators
    /// (`Input`, `Dummy`, `While`) are their own MPC form (§4.1); every other
    /// kind flips the `is_mpc` flag. Already-MPC operators are returned
    /// unchanged, so calling `to_mpc()` twice is idempotent (testable
    /// property #4).
    pub fn to_mpc(&self) -> Result<Operator> {
        if self.is_mpc || self.kind.is_non_shareable() {
            return Ok(self.clone());
        }
        let mut mpc = self.clone();
        mpc.is_mpc = true;
        Ok(mpc)
    }
}
