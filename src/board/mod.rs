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

pub mod generation;

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::client::AttendanceRecord;
use crate::client::MarkRequest;
use crate::error::Fallible;
use crate::types::mark::Mark;
use crate::types::session::Session;
use crate::types::student::RollNo;
use crate::types::student::Student;
use crate::types::subject::InvalidSubject;
use crate::types::subject::SubjectCatalog;

/// Load state of one remote resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Idle,
    Pending,
    Loaded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Idle,
    InFlight,
    Succeeded { filename: String },
    Failed,
}

/// Why a toggle was refused.
#[derive(Debug, PartialEq)]
pub enum ToggleRejected {
    /// The student was absent in an earlier lecture the same day.
    Locked(RollNo),
    NotOnRoster(RollNo),
}

impl Display for ToggleRejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ToggleRejected::Locked(_) => write!(
                f,
                "This student was absent in the first lecture and cannot be marked present."
            ),
            ToggleRejected::NotOnRoster(roll) => {
                write!(f, "Roll number {roll} is not on the roster.")
            }
        }
    }
}

/// The attendance board for one session: the roster, and the mark of every
/// student. A roll number with no entry in `marks` is present.
pub struct Board {
    session: Session,
    roster: Vec<Student>,
    marks: HashMap<RollNo, Mark>,
    roster_status: Resource,
    first_lecture_status: Resource,
    submission: Submission,
}

impl Board {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            roster: Vec::new(),
            marks: HashMap::new(),
            roster_status: Resource::Idle,
            first_lecture_status: Resource::Idle,
            submission: Submission::Idle,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn roster_status(&self) -> Resource {
        self.roster_status
    }

    pub fn first_lecture_status(&self) -> Resource {
        self.first_lecture_status
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn set_submission(&mut self, submission: Submission) {
        log::debug!("Submission: {:?} -> {:?}", self.submission, submission);
        self.submission = submission;
    }

    pub fn mark(&self, roll: &RollNo) -> Mark {
        self.marks.get(roll).copied().unwrap_or(Mark::Present)
    }

    /// Every roll number currently marked absent, locked or not.
    pub fn absentees(&self) -> BTreeSet<RollNo> {
        self.marks
            .iter()
            .filter(|(_, mark)| !mark.is_present())
            .map(|(roll, _)| roll.clone())
            .collect()
    }

    pub fn first_lecture_absentees(&self) -> BTreeSet<RollNo> {
        self.marks
            .iter()
            .filter(|(_, mark)| mark.is_locked())
            .map(|(roll, _)| roll.clone())
            .collect()
    }

    pub fn begin_roster(&mut self) {
        self.roster_status = Resource::Pending;
    }

    pub fn begin_first_lecture(&mut self) {
        self.first_lecture_status = Resource::Pending;
    }

    /// Replace the roster. A failed fetch is logged and leaves the roster as it
    /// was; the board then simply has fewer (or no) students to show.
    pub fn apply_roster(&mut self, result: Fallible<Vec<Student>>) {
        match result {
            Ok(students) => {
                log::debug!("Loaded {} students.", students.len());
                self.roster = students;
                self.roster_status = Resource::Loaded;
            }
            Err(e) => {
                log::error!("Failed to fetch students: {e}");
                self.roster_status = Resource::Failed;
            }
        }
    }

    /// Lock the first-lecture absentees, over any marks the user has made. A
    /// failed fetch is logged and no lock is applied.
    pub fn apply_first_lecture(&mut self, result: Fallible<Vec<RollNo>>) {
        match result {
            Ok(absentees) => {
                log::debug!("Loaded {} first-lecture absentees.", absentees.len());
                for roll in absentees {
                    self.marks.insert(roll, Mark::LockedAbsent);
                }
                self.first_lecture_status = Resource::Loaded;
            }
            Err(e) => {
                log::error!("Failed to fetch first lecture absentees: {e}");
                self.first_lecture_status = Resource::Failed;
            }
        }
    }

    /// Flip a student between present and absent. Returns the new mark.
    pub fn toggle(&mut self, roll: &RollNo) -> Result<Mark, ToggleRejected> {
        if !self.roster.iter().any(|student| &student.roll_no == roll) {
            return Err(ToggleRejected::NotOnRoster(roll.clone()));
        }
        match self.mark(roll) {
            Mark::LockedAbsent => Err(ToggleRejected::Locked(roll.clone())),
            Mark::Absent => {
                self.marks.remove(roll);
                Ok(Mark::Present)
            }
            Mark::Present => {
                self.marks.insert(roll.clone(), Mark::Absent);
                Ok(Mark::Absent)
            }
        }
    }

    /// The roster, in order, with each student's mark.
    pub fn tiles(&self) -> impl Iterator<Item = (&Student, Mark)> {
        self.roster
            .iter()
            .map(|student| (student, self.mark(&student.roll_no)))
    }

    /// Present and absent counts over the roster.
    pub fn counts(&self) -> (usize, usize) {
        let present = self.tiles().filter(|(_, mark)| mark.is_present()).count();
        (present, self.roster.len() - present)
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.tiles()
            .map(|(student, mark)| AttendanceRecord {
                student_id: student.id.clone(),
                is_present: mark.is_present(),
            })
            .collect()
    }

    /// Build the request for the service. Fails, before any network traffic,
    /// if the session's subject is not in the catalog.
    pub fn prepare_submission(
        &self,
        catalog: &SubjectCatalog,
    ) -> Result<MarkRequest, InvalidSubject> {
        let subject_id = catalog.resolve(&self.session.subject)?;
        Ok(MarkRequest {
            date: self.session.date.clone(),
            time: self.session.timing.clone(),
            subject_id,
            class_name: self.session.class.clone(),
            attendance_data: self.records(),
        })
    }
}
