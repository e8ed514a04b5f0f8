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

//! A pass that rewrites a relational operator dag so that every operator
//! touching data shared across more than one party runs as an MPC protocol,
//! while everything a single party can compute alone stays local.
//!
//! The pipeline is four stages, run in order by [`pass::run`]:
//!
//! 1. [`propagate`] unions owners along edges until every relation's owner
//!    set has reached its fixed point.
//! 2. [`derive`] walks the dag in topological order, assigning each node a
//!    [`derive::Mode`] and threading deferred aggregations (an
//!    [`obligation::Obligation`]) through an [`environment::Environment`].
//! 3. [`rewrite`] flips each operator to its local or mpc form and
//!    materializes a realization node for every obligation left blocked.
//! 4. [`prune`], run once per observing party, replaces every node that
//!    party cannot see with a [`operator::Operator::dummy`].
//!
//! Nodes live in a [`dag::Dag`] arena and are addressed by [`dag::NodeId`]
//! rather than through shared, mutable references, so the parent/child back
//! edges a dag requires never become an `Rc`/`RefCell` cycle.

pub mod dag;
pub mod derive;
pub mod environment;
pub mod error;
pub mod obligation;
pub mod observer;
pub mod operator;
pub mod pass;
pub mod propagate;
pub mod prune;
pub mod relation;
pub mod rewrite;

pub use dag::{Dag, DagNode, NodeId};
pub use derive::{Mode, ModeMap};
pub use environment::Environment;
pub use error::{PlannerError, Result};
pub use obligation::Obligation;
pub use operator::{Operator, OperatorKind, OperatorPayload};
pub use relation::{OwnerId, Relation, RelationName};
