// Copyright 2025 Fernando Borretti
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

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;

/// The service's numeric identifier for a subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubjectId(u32);

impl SubjectId {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Maps subject display names to the service's subject identifiers. Must be
/// kept in lockstep with the service's subject registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectCatalog(BTreeMap<String, u32>);

impl Default for SubjectCatalog {
    fn default() -> Self {
        Self::from_pairs([("TOC", 1), ("Database", 2), ("SE", 3), ("CN", 4)])
    }
}

impl SubjectCatalog {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(name, id)| (name.to_string(), id))
                .collect(),
        )
    }

    pub fn resolve(&self, subject: &str) -> Result<SubjectId, InvalidSubject> {
        match self.0.get(subject) {
            Some(id) => Ok(SubjectId(*id)),
            None => Err(InvalidSubject {
                subject: subject.to_string(),
            }),
        }
    }

    /// Identifiers must be positive and unique.
    pub fn validate(&self) -> Fallible<()> {
        if self.0.is_empty() {
            return fail("subject catalog is empty.");
        }
        let mut seen: HashSet<u32> = HashSet::new();
        for (name, id) in &self.0 {
            if *id == 0 {
                return fail(format!("subject '{name}' has id 0; ids must be positive."));
            }
            if !seen.insert(*id) {
                return fail(format!("subject id {id} is used more than once."));
            }
        }
        Ok(())
    }
}

/// A session's subject is not in the catalog.
#[derive(Debug, PartialEq)]
pub struct InvalidSubject {
    pub subject: String,
}

impl Display for InvalidSubject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid subject: {}. Please contact administrator.",
            self.subject
        )
    }
}
