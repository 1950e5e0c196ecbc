//! Error types for the stpble library
//!
//! Only setup can fail in a way the caller has to handle: every later
//! problem is either reported to the peer as a GATT status or logged.

use crate::stack::StackError;
use std::fmt;
use thiserror::Error;

/// Step of the one-time stack initialisation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    EnableController,
    EnableHost,
    RegisterCallbacks,
    RegisterApp,
    SetLocalMtu,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStep::EnableController => "enable controller",
            SetupStep::EnableHost => "enable bluetooth host",
            SetupStep::RegisterCallbacks => "register callbacks",
            SetupStep::RegisterApp => "register gatts app",
            SetupStep::SetLocalMtu => "set local MTU",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The stack could not be brought up; the device cannot serve anything.
    #[error("{step} failed: {source}")]
    Setup {
        step: SetupStep,
        #[source]
        source: StackError,
    },
}

impl Error {
    pub(crate) fn setup(step: SetupStep) -> impl FnOnce(StackError) -> Error {
        move |source| Error::Setup { step, source }
    }
}
