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

/// The attendance state of one student.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    Present,
    /// Marked absent in this session; can be toggled back.
    Absent,
    /// Absent in an earlier lecture the same day. Cannot be marked present.
    LockedAbsent,
}

impl Mark {
    pub fn is_present(self) -> bool {
        self == Mark::Present
    }

    pub fn is_locked(self) -> bool {
        self == Mark::LockedAbsent
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Mark::Present => "present",
            Mark::Absent => "absent",
            Mark::LockedAbsent => "locked",
        }
    }
}
