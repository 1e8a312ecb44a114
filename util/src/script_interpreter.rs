//! # Hexapod script interpreter module
//!
//! This module provides an interpreter for hexapod telecommand scripts,
//! allowing telecommands to be executed from these scripts.
//!
//! A script is a sequence of `<time_s>: <json_tc>;` entries, for example:
//!
//! ```text
//! 1.0: {"type": "SELECT_GAIT", "payload": "UP"};
//! 6.5: {"type": "SELECT_GAIT", "payload": "DIRECT_MOVEMENT"};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::tc::{Tc, TcParseError};
use crate::session::get_elapsed_seconds;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Matches one `<time>: <payload>;` entry of a script.
const ENTRY_REGEX: &str = r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
pub struct Command {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The Telecommand to run
    tc: Tc
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending_tcs`
/// to acquire a list of telecommands that need executing.
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    cmds: VecDeque<Command>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error("The script pattern is invalid: {0}")]
    InvalidPattern(regex::Error),

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid TC at {0} s: {1}")]
    InvalidTc(f64, TcParseError)
}

#[derive(Debug)]
pub enum PendingTcs {
    None,
    Some(Vec<Tc>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let cmds = Self::parse(&script)?;

        Ok(ScriptInterpreter {
            _script_path: path,
            cmds
        })
    }

    /// Create a new interpreter from the text of a script.
    pub fn from_text(script: &str) -> Result<Self, ScriptError> {
        Ok(ScriptInterpreter {
            _script_path: PathBuf::new(),
            cmds: Self::parse(script)?
        })
    }

    /// Return a vector of pending TCs, or `None` if no TCs need executing now.
    ///
    /// # Panics
    /// - If the session has not been initialised.
    pub fn get_pending_tcs(&mut self) -> PendingTcs {
        self.get_pending_tcs_at(get_elapsed_seconds())
    }

    /// Return the TCs whose execution time is before `current_time_s`.
    pub fn get_pending_tcs_at(&mut self, current_time_s: f64) -> PendingTcs {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingTcs::EndOfScript
        }

        let mut tc_vec: Vec<Tc> = vec![];

        // Pop items from the queue while the head's exec time is lower than
        // the current time
        while let Some(cmd) = self.cmds.front() {
            if cmd.exec_time_s >= current_time_s {
                break;
            }

            tc_vec.push(cmd.tc);
            self.cmds.pop_front();
        }

        // If the vector is longer than 0 return Some, otherwise None
        if !tc_vec.is_empty() {
            PendingTcs::Some(tc_vec)
        }
        else {
            PendingTcs::None
        }
    }

    /// Get the number of TCs in the script
    pub fn get_num_tcs(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    fn parse(script: &str) -> Result<VecDeque<Command>, ScriptError> {
        // Empty queue of commands
        let mut tc_queue: VecDeque<Command> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::new(ENTRY_REGEX)
            .multi_line(true)
            .build()
            .map_err(ScriptError::InvalidPattern)?;

        for cap in re.captures_iter(script) {
            let (time_str, payload) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(p)) => (t.as_str(), p.as_str()),
                _ => continue
            };

            // Parse the exec time
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            // Parse the TC from the payload. The scripts contain JSON only.
            let tc = Tc::from_json(payload)
                .map_err(|e| ScriptError::InvalidTc(exec_time_s, e))?;

            tc_queue.push_back(Command {
                exec_time_s,
                tc
            });
        }

        if tc_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(tc_queue)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::GaitId;

    const SCRIPT: &str = r#"
        0.5: {"type": "SELECT_GAIT", "payload": "UP"};
        2.0: {"type": "SET_HEIGHT", "payload": 100.0};
        2.0: {"type": "SELECT_GAIT", "payload": "UPDATE_HEIGHT"};
        8.25: {"type": "MAKE_SAFE"};
    "#;

    #[test]
    fn test_parse_script() {
        let si = ScriptInterpreter::from_text(SCRIPT).unwrap();
        assert_eq!(si.get_num_tcs(), 4);
        assert_eq!(si.get_duration(), 8.25);
    }

    #[test]
    fn test_pending_tcs() {
        let mut si = ScriptInterpreter::from_text(SCRIPT).unwrap();

        match si.get_pending_tcs_at(0.1) {
            PendingTcs::None => (),
            p => panic!("Expected no pending TCs, got {:?}", p)
        }

        match si.get_pending_tcs_at(0.6) {
            PendingTcs::Some(v) => assert_eq!(v, vec![Tc::SelectGait(GaitId::Up)]),
            p => panic!("Expected one pending TC, got {:?}", p)
        }

        match si.get_pending_tcs_at(5.0) {
            PendingTcs::Some(v) => assert_eq!(
                v,
                vec![Tc::SetHeight(100.0), Tc::SelectGait(GaitId::UpdateHeight)]
            ),
            p => panic!("Expected two pending TCs, got {:?}", p)
        }

        match si.get_pending_tcs_at(9.0) {
            PendingTcs::Some(v) => assert_eq!(v, vec![Tc::MakeSafe]),
            p => panic!("Expected one pending TC, got {:?}", p)
        }

        match si.get_pending_tcs_at(10.0) {
            PendingTcs::EndOfScript => (),
            p => panic!("Expected end of script, got {:?}", p)
        }
    }

    #[test]
    fn test_script_errors() {
        match ScriptInterpreter::from_text("nothing to see here") {
            Err(ScriptError::ScriptEmpty) => (),
            _ => panic!("Expected an empty script error")
        }

        match ScriptInterpreter::from_text(r#"1.0: {"type": "JUMP"};"#) {
            Err(ScriptError::InvalidTc(t, _)) => assert_eq!(t, 1.0),
            _ => panic!("Expected an invalid TC error")
        }

        match ScriptInterpreter::new("/no/such/script.hxs") {
            Err(ScriptError::ScriptNotFound(_)) => (),
            _ => panic!("Expected a script not found error")
        }
    }
}
