//! Invocation records kept by every behavior plan.
//!
//! Each call to a double appends an [`Invocation`] to the called operation's
//! log before the configured behavior runs, so failing calls are counted too.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::value::Value;

/// Arguments of one call. Most operations take a handful.
pub type Arguments = SmallVec<[Value; 4]>;

/// A single recorded call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Engine-wide call order, starting at 0.
    pub sequence: u64,
    /// Arguments exactly as passed.
    pub arguments: Arguments,
}
