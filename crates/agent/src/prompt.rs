//! The per-request controller prompt.
//!
//! A [`ControllerPrompt`] is seeded once from the instruction header, the
//! rendered history and the request, and only ever grows by appending
//! repair hints and observation blocks. Each loop owns its own instance.

use agentlab_core::message::Turn;
use agentlab_core::tool::ToolDefinition;
use std::fmt::Display;

use crate::history::format_history;

const NEXT_CALL_GUIDANCE: &str = "Guidance: Output exactly ONE JSON tool call next.\nThought:";

/// Build the fixed instruction header, listing each tool's signature.
pub fn instruction_header(tools: &[ToolDefinition]) -> String {
    let signatures: String = tools
        .iter()
        .map(|t| format!("  {}\n", t.signature()))
        .collect();

    format!(
        r#"You are a reasoning assistant that MUST use tools and respond ONLY in one of these two forms:

1) TOOL CALL (valid JSON object; no markdown, no code fences, no 'TOOL CALL' prefix, no extra text):
{{"tool":"<tool_name>","args":{{ ... }}}}

2) FINAL ANSWER (string, not JSON):
Final Answer: <text>

STRICT RULES
- Tool names and arg keys are EXACT and case-sensitive. Use ONLY:
{signatures}- Do NOT invent tool names (e.g., divide_by, TO_UPPERCASE) or use a JSON tool named "FINAL ANSWER".
- If you refer to the previous observation, pass it as a QUOTED string placeholder, e.g. {{"text":"<last_result>"}} (never bare <last_result>).
- After each tool call, WAIT for the Observation before the next step.
- If an Observation contains [tool_error], fix your next tool call (do not provide a final answer yet).
- Output ONLY a JSON tool call or a "Final Answer:" line. Nothing else.
- Your goal each turn is to satisfy ONLY the most recent USER message.
- If the user is greeting or introducing themselves (e.g., "Hello, my name is ..."),
  call `greeting(name)` once, then return:
  Final Answer: <the greeting result>
  and stop. Do NOT make extra tool calls "for exploration"."#
    )
}

/// Append-only prompt text for one request.
#[derive(Debug, Clone)]
pub struct ControllerPrompt {
    text: String,
}

impl ControllerPrompt {
    pub fn seed(header: &str, history: &[Turn], request: &str) -> Self {
        Self {
            text: format!(
                "{header}\n\nConversation so far:\n{}\n\nUSER: {request}\nThought:",
                format_history(history)
            ),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Corrective hint after output with no JSON object in it.
    pub fn push_missing_call_repair(&mut self) {
        self.text.push_str(
            "\nObservation: Your last output was invalid (expected a JSON tool call). \
             Respond ONLY with a valid JSON tool call as specified.\n",
        );
        self.text.push_str(NEXT_CALL_GUIDANCE);
    }

    /// Corrective hint after a JSON object that did not parse as a call.
    pub fn push_invalid_json_repair(&mut self, error: &impl Display) {
        self.text.push_str(&format!(
            "\nObservation: Invalid JSON ({error}). Output ONLY a corrected JSON tool call.\n"
        ));
        self.text.push_str(NEXT_CALL_GUIDANCE);
    }

    /// Record an executed call and what it returned.
    pub fn push_observation(&mut self, call_json: &str, observation: &impl Display) {
        self.text.push_str(&format!(
            "\n{call_json}\nObservation: {observation}\n\
             Guidance: If the user's request is satisfied, output 'Final Answer: <text>' now. \
             Otherwise, output exactly ONE next JSON tool call.\nThought:"
        ));
    }
}
