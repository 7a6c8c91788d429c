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

use std::sync::Arc;
use std::sync::Mutex;

use crate::board::Board;
use crate::board::generation::Generation;
use crate::board::generation::Ticket;
use crate::client::Download;
use crate::client::ServiceClient;
use crate::config::Config;
use crate::error::Fallible;
use crate::types::session::Session;
use crate::types::student::RollNo;
use crate::types::student::Student;

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub client: ServiceClient,
    pub mutable: Arc<Mutex<MutableState>>,
}

pub struct MutableState {
    /// The mounted board, if the user is on the board page.
    pub board: Option<Board>,
    /// A message to show once, on the next render of the board.
    pub notice: Option<Notice>,
    /// The file returned by the last successful submission.
    pub download: Option<Download>,
    /// Whether the next render of the board should start the download.
    pub trigger_download: bool,
    pub mount: Generation,
    pub roster: Generation,
    pub first_lecture: Generation,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// The fetches a freshly mounted board needs, with the ticket each response
/// must present to be applied.
pub struct LoadPlan {
    pub session: Session,
    pub roster: Option<Ticket>,
    pub first_lecture: Option<Ticket>,
}

/// The responses to a [`LoadPlan`], each with the ticket it was issued.
pub struct Loaded {
    pub roster: Option<(Ticket, Fallible<Vec<Student>>)>,
    pub first_lecture: Option<(Ticket, Fallible<Vec<RollNo>>)>,
}

impl MutableState {
    pub fn new() -> Self {
        Self {
            board: None,
            notice: None,
            download: None,
            trigger_download: false,
            mount: Generation::default(),
            roster: Generation::default(),
            first_lecture: Generation::default(),
        }
    }

    /// Mount a fresh board for the session. Requests issued for any earlier
    /// board become stale.
    pub fn mount(&mut self, session: Session) -> LoadPlan {
        self.unmount();
        log::debug!("Mounting board for {}", session.to_query());
        let mut board = Board::new(session.clone());
        let roster = if session.wants_roster() {
            board.begin_roster();
            Some(self.roster.issue())
        } else {
            None
        };
        let first_lecture = if session.wants_first_lecture() {
            board.begin_first_lecture();
            Some(self.first_lecture.issue())
        } else {
            None
        };
        self.board = Some(board);
        LoadPlan {
            session,
            roster,
            first_lecture,
        }
    }

    /// Discard the board and everything attached to it.
    pub fn unmount(&mut self) {
        if self.board.take().is_some() {
            log::debug!("Unmounting board.");
        }
        self.notice = None;
        self.download = None;
        self.trigger_download = false;
        self.mount.invalidate();
        self.roster.invalidate();
        self.first_lecture.invalidate();
    }

    /// Apply the responses of a load, each only if its ticket is still current.
    pub fn apply_loaded(&mut self, session: &Session, loaded: Loaded) {
        if let Some((ticket, result)) = loaded.roster {
            if self.roster.is_current(ticket) {
                if let Some(board) = self.board.as_mut() {
                    board.apply_roster(result);
                }
            } else {
                log::debug!("Discarding stale roster response for class {}.", session.class);
            }
        }
        if let Some((ticket, result)) = loaded.first_lecture {
            if self.first_lecture.is_current(ticket) {
                if let Some(board) = self.board.as_mut() {
                    board.apply_first_lecture(result);
                }
            } else {
                log::debug!(
                    "Discarding stale first-lecture response for {} {}.",
                    session.date,
                    session.class
                );
            }
        }
    }

    /// Whether the board is mounted for exactly this session.
    pub fn is_mounted_for(&self, session: &Session) -> bool {
        match &self.board {
            Some(board) => board.session() == session,
            None => false,
        }
    }
}
