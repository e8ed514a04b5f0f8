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

//! The relation / owner model (named logical tables and the parties that own
//! them). Relations are value types in this crate: identity across the dag
//! is by name, mirroring how the ownership propagator and environment key
//! their state off relation names rather than off object identity.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A name used to key relations throughout the pass. A plain alias rather
/// than a newtype: relation names flow through `HashMap`/`Environment` keys
/// constantly and the extra wrapper would only add noise at call sites.
pub type RelationName = String;

/// An MPC party identifier. Kept distinct from `RelationName` so a node id,
/// relation name, and owner id can never be silently swapped for one another
/// at a call site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named logical table carrying an owner set and a column schema.
///
/// The only mutation this pipeline ever performs on a `Relation` is adding
/// owners (ownership only grows, see the propagator's monotonicity
/// invariant) or replacing the column list wholesale during
/// `Operator::update_columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    name: RelationName,
    owners: BTreeSet<OwnerId>,
    columns: Vec<String>,
}

impl Relation {
    pub fn new(
        name: impl Into<RelationName>,
        owners: impl IntoIterator<Item = OwnerId>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owners: owners.into_iter().collect(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owners(&self) -> &BTreeSet<OwnerId> {
        &self.owners
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn set_columns(&mut self, columns: Vec<String>) {
        self.columns = columns;
    }

    /// `|owners| > 1`: must be secret-shared among its owners.
    pub fn is_shared(&self) -> bool {
        self.owners.len() > 1
    }

    pub fn has_owner(&self, party: &OwnerId) -> bool {
        self.owners.contains(party)
    }

    /// Owner sets only grow; there is no owner-removal operation anywhere in
    /// this pipeline.
    pub fn add_owners(&mut self, owners: impl IntoIterator<Item = OwnerId>) {
        self.owners.extend(owners);
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.is_shared() {
            write!(f, "{{")?;
            for (i, o) in self.owners.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{o}")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}
