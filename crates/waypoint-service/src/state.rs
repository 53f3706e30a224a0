//! # Request Lifecycle
//!
//! ```text
//! Init → Validating → ValidationError
//!                   → Selecting → Computing → Success | NotFound | AlgorithmError | Timeout
//!                                           → Retry → Computing → …
//!                                           → Failure (attempts exhausted)
//! ```
//!
//! [`RouteState::validate_transition`] is the single source of truth for
//! legal moves. [`Lifecycle`] tracks one request and logs every transition
//! at `debug`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use waypoint_core::RequestId;

use crate::response::RouteStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteState {
    Init,
    Validating,
    Selecting,
    Computing,
    Retry,
    Success,
    ValidationError,
    NotFound,
    AlgorithmError,
    Timeout,
    Failure,
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Validating => "VALIDATING",
            Self::Selecting => "SELECTING",
            Self::Computing => "COMPUTING",
            Self::Retry => "RETRY",
            Self::Success => "SUCCESS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::AlgorithmError => "ALGORITHM_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Failure => "FAILURE",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal route state transition {from} → {to}")]
pub struct StateError {
    pub from: RouteState,
    pub to: RouteState,
}

impl RouteState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Success
                | Self::ValidationError
                | Self::NotFound
                | Self::AlgorithmError
                | Self::Timeout
                | Self::Failure
        )
    }

    /// Terminal state for a response status.
    pub fn terminal(status: RouteStatus) -> Self {
        match status {
            RouteStatus::Success => Self::Success,
            RouteStatus::ValidationError => Self::ValidationError,
            RouteStatus::NotFound => Self::NotFound,
            RouteStatus::AlgorithmError => Self::AlgorithmError,
            RouteStatus::Timeout => Self::Timeout,
            RouteStatus::Failure => Self::Failure,
        }
    }

    /// Check that `self → next` is a legal move.
    ///
    /// Validation failures can also surface while selecting (a forced
    /// algorithm the graph cannot support) or from the search itself (an
    /// endpoint it cannot resolve). A deadline that passes during backoff
    /// ends `Retry` in `Timeout`.
    pub fn validate_transition(self, next: RouteState) -> Result<RouteState, StateError> {
        use RouteState::*;
        let legal = matches!(
            (self, next),
            (Init, Validating)
                | (Validating, Selecting)
                | (Validating, ValidationError)
                | (Selecting, Computing)
                | (Selecting, ValidationError)
                | (Computing, Success)
                | (Computing, NotFound)
                | (Computing, AlgorithmError)
                | (Computing, Timeout)
                | (Computing, Retry)
                | (Computing, Failure)
                | (Computing, ValidationError)
                | (Retry, Computing)
                | (Retry, Timeout)
        );
        if legal {
            Ok(next)
        } else {
            Err(StateError { from: self, to: next })
        }
    }
}

/// State tracker for one request.
#[derive(Debug)]
pub struct Lifecycle {
    request_id: RequestId,
    state: RouteState,
}

impl Lifecycle {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            state: RouteState::Init,
        }
    }

    pub fn state(&self) -> RouteState {
        self.state
    }

    /// Move to `next`. An illegal move is logged and leaves the state as is.
    pub fn advance(&mut self, next: RouteState) {
        match self.state.validate_transition(next) {
            Ok(state) => {
                tracing::debug!(
                    request_id = %self.request_id,
                    from = %self.state,
                    to = %state,
                    "route state transition"
                );
                self.state = state;
            }
            Err(err) => {
                tracing::error!(request_id = %self.request_id, "{err}");
                debug_assert!(false, "{err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RouteState::*;

    #[test]
    fn happy_path_is_legal() {
        let mut state = Init;
        for next in [Validating, Selecting, Computing, Success] {
            state = state.validate_transition(next).unwrap();
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn retry_loop_is_legal() {
        let mut state = Computing;
        for next in [Retry, Computing, Retry, Computing, Failure] {
            state = state.validate_transition(next).unwrap();
        }
        assert_eq!(state, Failure);
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [Success, ValidationError, NotFound, AlgorithmError, Timeout, Failure] {
            assert!(terminal.validate_transition(Computing).is_err());
            assert!(terminal.validate_transition(Retry).is_err());
        }
    }

    #[test]
    fn cannot_skip_validation() {
        assert_eq!(
            Init.validate_transition(Computing),
            Err(StateError {
                from: Init,
                to: Computing
            })
        );
        assert!(Validating.validate_transition(Success).is_err());
        assert!(Retry.validate_transition(Success).is_err());
    }

    #[test]
    fn lifecycle_tracks_state() {
        let mut lc = Lifecycle::new(RequestId::new("r").unwrap());
        lc.advance(Validating);
        lc.advance(ValidationError);
        assert_eq!(lc.state(), ValidationError);
        assert_eq!(RouteState::terminal(RouteStatus::Timeout), Timeout);
    }
}
