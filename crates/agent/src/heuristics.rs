//! Intent-conditioned early stops, checked after each tool execution.

use agentlab_core::tool::ToolOutput;

use crate::intent::{terminal_op, Intent};

/// Which rule ended the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicRule {
    Greet,
    Transform,
    SingleStepMath,
    TerminalMath,
}

impl HeuristicRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeuristicRule::Greet => "greet",
            HeuristicRule::Transform => "transform",
            HeuristicRule::SingleStepMath => "single_step_math",
            HeuristicRule::TerminalMath => "terminal_math",
        }
    }
}

/// Everything the rules look at for one executed step.
pub struct StepFacts<'a> {
    pub intent: Intent,
    pub multi_step: bool,
    pub prompt: &'a str,
    pub tool: &'a str,
    pub result: &'a ToolOutput,
}

/// The first rule satisfied by this step, if any.
pub fn check(facts: &StepFacts<'_>) -> Option<HeuristicRule> {
    match facts.intent {
        Intent::Greet if facts.tool == "greeting" && facts.result.non_empty_text().is_some() => {
            Some(HeuristicRule::Greet)
        }
        Intent::Transform
            if facts.tool == "to_uppercase" && facts.result.non_empty_text().is_some() =>
        {
            Some(HeuristicRule::Transform)
        }
        Intent::Math if facts.result.is_number() => {
            if !facts.multi_step {
                Some(HeuristicRule::SingleStepMath)
            } else if facts.tool == terminal_op(facts.prompt) {
                Some(HeuristicRule::TerminalMath)
            } else {
                None
            }
        }
        _ => None,
    }
}
