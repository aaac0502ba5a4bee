//! Contract violations raised by patterns, the rewriter, and the driver.

use derive_more::{Display, Error};

use crate::kind::OpKind;
use crate::refs::OpRef;

/// A broken rewrite contract.
///
/// Patterns that merely fail to match return `Ok(MatchOutcome::NoMatch)`;
/// these errors mean the IR or the driver's bookkeeping can no longer be
/// trusted, so the driver aborts on the first one.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum RewriteError {
    #[display("cannot erase {op} ({kind}): its results still have {uses} use(s)")]
    EraseWithLiveUses { op: OpRef, kind: OpKind, uses: usize },
    #[display("{op} was dispatched after being erased")]
    StaleDispatch { op: OpRef },
    #[display("pattern `{pattern}` mutated the IR at {op} but reported no match")]
    MutatedWithoutMatch { pattern: &'static str, op: OpRef },
    #[display("use-chain corrupted after `{pattern}`:\n{details}")]
    CorruptUseChain {
        pattern: &'static str,
        details: String,
    },
}
