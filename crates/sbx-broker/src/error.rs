//! Out-of-band broker errors.
//!
//! Validation and business failures never appear here: they are recorded as
//! REJECTED orders in the account history (see `engine`). The only failures
//! that propagate as `Err` are the ones no order record can carry.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// No account with this id exists.
    UnknownAccount { account_id: String },
    /// Account creation requires a finite, strictly positive capital.
    InvalidInitialCapital { value: String },
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::UnknownAccount { account_id } => {
                write!(f, "unknown account: {account_id}")
            }
            BrokerError::InvalidInitialCapital { value } => {
                write!(f, "invalid initial capital: {value}")
            }
        }
    }
}

impl std::error::Error for BrokerError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
