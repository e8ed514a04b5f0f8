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

//! The closed error taxonomy for the rewrite pass (see the error handling
//! design in the project's requirements document). Every fallible entry
//! point in this crate returns [`Result<T>`].

use crate::dag::NodeId;
use crate::operator::OperatorKind;
use crate::relation::OwnerId;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum PlannerError {
    #[error("node {node:?} has {parent_count} parents, at most 2 are supported by the operator algebra")]
    TooManyParents { node: NodeId, parent_count: usize },

    #[error("node {node:?} references parent {missing:?}, which does not exist in this dag")]
    MissingParent { node: NodeId, missing: NodeId },

    #[error("cycle detected while computing a topological order over the dag")]
    Cycle,

    #[error("node {node:?} ({kind:?}) was asked to produce an mpc form it does not have")]
    UnexpectedOperator { node: NodeId, kind: OperatorKind },

    #[error("environment has no obligation stack initialized for relation {relation:?}")]
    EnvMissingKey { relation: String },

    #[error("configured party {0:?} does not own any relation in this dag")]
    OwnerMissing(OwnerId),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
