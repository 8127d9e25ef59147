//! The ReAct reasoning controller.
//!
//! Wraps an unreliable text generator in a deterministic, bounded loop:
//!
//! 1. **Pre-loop handlers** answer history questions without generating
//! 2. **Generate** the next step from the growing controller prompt
//! 3. **Parse** the output, repairing fences, labels and bare placeholders
//! 4. **Resolve** aliased tool names and fill `<last_result>` placeholders
//! 5. **Execute** the tool and feed the observation back
//!
//! The loop ends with exactly one final answer per request, either from the
//! generator, from a finalization rule, or from a labeled failure message.

pub mod controller;
pub mod heuristics;
pub mod history;
pub mod intent;
pub mod parsing;
pub mod prehandlers;
pub mod prompt;
pub mod resolver;

#[cfg(test)]
mod test_helpers;

pub use controller::{LoopExit, ReactController, ReactOutcome, FINAL_ANSWER_MARKER};
pub use heuristics::HeuristicRule;
pub use intent::{classify_intent, wants_multi_step, Intent};
pub use prehandlers::PreLoopHandler;
pub use prompt::ControllerPrompt;
