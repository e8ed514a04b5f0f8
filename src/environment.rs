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

//! The environment: a mapping from relation name to a stack of pending
//! obligations (§4.5).
//!
//! At most one obligation per relation is ever "live" along a single path,
//! so each relation's stack stays small; a `SmallVec` keeps the push/pop
//! protocol's storage inline in the common case instead of heap-allocating a
//! `Vec` per relation (per the arena design note in §9).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{PlannerError, Result};
use crate::obligation::Obligation;
use crate::relation::RelationName;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environment {
    stacks: HashMap<RelationName, SmallVec<[Obligation; 2]>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty obligation stack for `name` if one doesn't already
    /// exist. Must be called before any `has`/`pop` that expects the key to
    /// be meaningful; `push` auto-initializes, so callers that only ever
    /// push don't need to call this first.
    pub fn init_for(&mut self, name: &str) {
        self.stacks.entry(name.to_string()).or_default();
    }

    pub fn push(&mut self, name: &str, obligation: Obligation) {
        self.stacks.entry(name.to_string()).or_default().push(obligation);
    }

    /// Whether a non-empty obligation stack exists for `name`. Safe to call
    /// on a name that was never touched — it simply reads as "no
    /// obligations", since this is a query, not a protocol-sensitive
    /// mutation.
    pub fn has(&self, name: &str) -> bool {
        self.stacks.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Removes and returns the most-recently pushed obligation for `name`.
    /// Errors if the key was never initialized or its stack is empty — the
    /// deriver never calls this without first checking [`Environment::has`],
    /// so either condition indicates the stack-per-relation protocol was
    /// violated by the caller.
    pub fn pop(&mut self, name: &str) -> Result<Obligation> {
        self.stacks
            .get_mut(name)
            .and_then(|v| v.pop())
            .ok_or_else(|| PlannerError::EnvMissingKey {
                relation: name.to_string(),
            })
    }

    /// True iff every relation's obligation stack is empty — used to check
    /// the "no obligation remains in the environment after rewrite"
    /// conservation property (§8, property 3).
    pub fn is_fully_drained(&self) -> bool {
        self.stacks.values().all(|v| v.is_empty())
    }
}
