//! Flow context threaded through the recursion.
//!
//! Contexts are small `Copy` values passed down by value, so entering a
//! construct extends the context for its children without any explicit
//! push/pop bookkeeping on the way back out.

use crate::ir::NodeId;

/// Targets for `break` and `continue` inside the innermost loop (or
/// switch, which overrides only the break target).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopContext {
    pub break_target: NodeId,
    /// `None` inside a switch that is not itself inside a loop:
    /// `break` is valid there but `continue` is not.
    pub continue_target: Option<NodeId>,
}

/// Pending `finally` region: early exits inside the protected code must
/// pass through here before leaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinallyContext {
    pub finally_entry: NodeId,
}

/// Everything a statement builder needs to know about its surroundings.
#[derive(Debug, Clone, Copy)]
pub struct FlowContext {
    /// The function's single exit node.
    pub exit: NodeId,
    pub loop_ctx: Option<LoopContext>,
    pub finally_ctx: Option<FinallyContext>,
}

impl FlowContext {
    /// Context at function-body top level.
    pub fn function(exit: NodeId) -> Self {
        FlowContext {
            exit,
            loop_ctx: None,
            finally_ctx: None,
        }
    }

    pub fn with_loop(self, loop_ctx: LoopContext) -> Self {
        FlowContext {
            loop_ctx: Some(loop_ctx),
            ..self
        }
    }

    pub fn with_finally(self, finally_ctx: FinallyContext) -> Self {
        FlowContext {
            finally_ctx: Some(finally_ctx),
            ..self
        }
    }

    /// Where abrupt exits (return, throw) actually go: the pending
    /// finally region if one is active, otherwise the function exit.
    pub fn unwind_target(self) -> NodeId {
        match self.finally_ctx {
            Some(f) => f.finally_entry,
            None => self.exit,
        }
    }

    /// Redirect a loop jump through the pending finally if any.
    pub fn through_finally(self, nominal: NodeId) -> NodeId {
        match self.finally_ctx {
            Some(f) => f.finally_entry,
            None => nominal,
        }
    }
}
