//! The ReAct loop driver.
//!
//! One call to [`ReactController::run`] handles one request:
//!
//! 1. **Load** a recent window of the session's history
//! 2. **Pre-loop handlers** may answer straight from history
//! 3. **Step** up to the step limit: generate, parse, resolve, fill
//!    placeholders, execute, then check the repeat valve, the goodbye
//!    override and the intent heuristics
//! 4. **Persist** the request and its single final answer
//!
//! Every path ends in a final answer string; `run` never fails.

use agentlab_config::AgentConfig;
use agentlab_core::memory::HistoryStore;
use agentlab_core::message::{SessionId, Turn};
use agentlab_core::provider::Generator;
use agentlab_core::tool::{ToolOutput, ToolRegistry};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::heuristics::{self, HeuristicRule, StepFacts};
use crate::history::find_name_in_history;
use crate::intent::{classify_intent, wants_multi_step, Intent};
use crate::parsing::{extract_first_json, parse_tool_call, quote_bare_placeholders, strip_noise, value_text};
use crate::prehandlers::{self, goodbye_message, is_goodbye, PreLoopHandler};
use crate::prompt::{instruction_header, ControllerPrompt};
use crate::resolver::{closest_tool, fill_placeholders, resolve_tool, FINAL_ANSWER_SENTINEL};

/// Prefix marking a terminal answer, from the generator or the controller.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Answer when the step budget runs out or output stays unparseable.
pub const EXHAUSTED_MESSAGE: &str = "Reached max reasoning steps without final answer.";

/// Answer when a second JSON object fails to parse as a call.
pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON from model.";

/// Greeting names that mean "I don't actually know".
const GENERIC_NAMES: &[&str] = &["?", "user", "you"];

/// Greeting name when neither the call nor history supplies one.
const FALLBACK_GREETING_NAME: &str = "User";

/// How a request's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Answered from history before any generation.
    PreLoop(PreLoopHandler),
    /// The generator emitted a `Final Answer:` line.
    DirectAnswer,
    /// The generator called the final-answer pseudo-tool.
    FinalAnswerTool,
    /// The same call was issued twice in a row.
    RepeatedCall,
    /// A goodbye request was answered by the greeting tool.
    GoodbyeOverride,
    Heuristic(HeuristicRule),
    /// No JSON object, even after the repair hint.
    InvalidOutput,
    /// Unparseable JSON, even after the repair hint.
    InvalidJson,
    Exhausted,
}

/// The result of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactOutcome {
    /// The final answer, as persisted.
    pub answer: String,
    /// Generator calls made.
    pub steps: usize,
    pub exit: LoopExit,
}

impl ReactOutcome {
    fn new(answer: impl Into<String>, steps: usize, exit: LoopExit) -> Self {
        Self {
            answer: answer.into(),
            steps,
            exit,
        }
    }
}

/// Per-request loop state. Discarded when the loop exits.
#[derive(Default)]
struct LoopState {
    last_result: Option<ToolOutput>,
    last_action: Option<(String, String)>,
    repeat_count: usize,
    repaired_missing_call: bool,
    repaired_invalid_json: bool,
}

/// Drives the Thought → Tool → Observation loop for every request.
///
/// Holds no per-request state, so one controller can serve concurrent
/// requests from different sessions.
pub struct ReactController {
    generator: Arc<dyn Generator>,
    tools: Arc<ToolRegistry>,
    history: Arc<dyn HistoryStore>,
    header: String,
    handlers: Vec<PreLoopHandler>,
    single_step_limit: usize,
    multi_step_limit: usize,
    history_window: usize,
    wide_history_window: usize,
}

impl ReactController {
    pub fn new(
        generator: Arc<dyn Generator>,
        tools: Arc<ToolRegistry>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let header = instruction_header(&tools.definitions());
        Self {
            generator,
            tools,
            history,
            header,
            handlers: PreLoopHandler::ALL.to_vec(),
            single_step_limit: 4,
            multi_step_limit: 10,
            history_window: 6,
            wide_history_window: 20,
        }
    }

    /// Step budgets for ordinary and multi-step requests.
    pub fn with_step_limits(mut self, single: usize, multi: usize) -> Self {
        self.single_step_limit = single;
        self.multi_step_limit = multi;
        self
    }

    /// History turns read for ordinary requests and for pre-loop handlers.
    pub fn with_history_windows(mut self, default: usize, wide: usize) -> Self {
        self.history_window = default;
        self.wide_history_window = wide;
        self
    }

    /// Replace the pre-loop handler table. Order is dispatch order.
    pub fn with_handlers(mut self, handlers: Vec<PreLoopHandler>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Apply limits and windows from configuration.
    pub fn with_config(self, config: &AgentConfig) -> Self {
        self.with_step_limits(config.single_step_limit, config.multi_step_limit)
            .with_history_windows(config.history_window, config.wide_history_window)
    }

    /// The instruction header every prompt starts with.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Answer one request and persist the exchange.
    pub async fn run(&self, prompt: &str, session: &SessionId) -> ReactOutcome {
        let window = if prehandlers::needs_wide_window(&self.handlers, prompt) {
            self.wide_history_window
        } else {
            self.history_window
        };
        let history = match self.history.recent(session, window).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(session = %session, error = %e, "History unavailable, continuing without it");
                vec![]
            }
        };

        let intent = classify_intent(prompt);
        let multi_step = wants_multi_step(prompt);
        let step_limit = if multi_step {
            self.multi_step_limit
        } else {
            self.single_step_limit
        };
        info!(session = %session, intent = %intent, multi_step, step_limit, "ReAct loop starting");

        let outcome = match prehandlers::dispatch(&self.handlers, prompt, &history) {
            Some((handler, answer)) => {
                info!(handler = %handler, "Answered from history");
                ReactOutcome::new(answer, 0, LoopExit::PreLoop(handler))
            }
            None => self.drive(prompt, &history, intent, multi_step, step_limit).await,
        };

        if let Err(e) = self
            .history
            .persist_exchange(session, prompt, &outcome.answer)
            .await
        {
            warn!(session = %session, error = %e, "Failed to persist exchange");
        }

        info!(steps = outcome.steps, exit = ?outcome.exit, "ReAct loop completed");
        outcome
    }

    async fn drive(
        &self,
        prompt: &str,
        history: &[Turn],
        intent: Intent,
        multi_step: bool,
        step_limit: usize,
    ) -> ReactOutcome {
        let mut log = ControllerPrompt::seed(&self.header, history, prompt);
        let mut state = LoopState::default();
        let known = self.tools.names();

        for step in 1..=step_limit {
            let output = match self.generator.generate(log.as_str()).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    warn!(step, error = %e, "Generator failed, treating as empty output");
                    String::new()
                }
            };
            debug!(step, output = %output, "Generator output");

            if output.starts_with(FINAL_ANSWER_MARKER) {
                return ReactOutcome::new(output, step, LoopExit::DirectAnswer);
            }

            let cleaned = quote_bare_placeholders(&strip_noise(&output));
            let Some(block) = extract_first_json(&cleaned) else {
                if state.repaired_missing_call {
                    warn!(step, "Still no tool call after repair");
                    return ReactOutcome::new(EXHAUSTED_MESSAGE, step, LoopExit::InvalidOutput);
                }
                state.repaired_missing_call = true;
                info!(step, "No JSON tool call found, issuing repair hint");
                log.push_missing_call_repair();
                continue;
            };

            let call = match parse_tool_call(block) {
                Ok(call) => call,
                Err(e) => {
                    if state.repaired_invalid_json {
                        warn!(step, error = %e, "Invalid JSON after repair");
                        return ReactOutcome::new(INVALID_JSON_MESSAGE, step, LoopExit::InvalidJson);
                    }
                    state.repaired_invalid_json = true;
                    info!(step, error = %e, "Invalid tool call JSON, issuing repair hint");
                    log.push_invalid_json_repair(&e);
                    continue;
                }
            };

            let tool = resolve_tool(&call.tool, &known);
            if tool == FINAL_ANSWER_SENTINEL {
                let text = call
                    .text
                    .or_else(|| call.args.get("text").and_then(value_text))
                    .or_else(|| state.last_result.as_ref().map(ToString::to_string))
                    .unwrap_or_default();
                let answer = format!("{FINAL_ANSWER_MARKER} {text}").trim().to_string();
                return ReactOutcome::new(answer, step, LoopExit::FinalAnswerTool);
            }

            let last_text = state.last_result.as_ref().map(ToString::to_string);
            let mut args = fill_placeholders(&call.args, last_text.as_deref());
            let mut unnamed = false;
            if tool == "greeting" && is_generic_name(args.get("name")) {
                let name = find_name_in_history(history).unwrap_or_else(|| {
                    unnamed = true;
                    FALLBACK_GREETING_NAME.to_string()
                });
                args.insert("name".into(), Value::String(name));
            }

            let result = self.execute(&tool, &args, &known).await;
            info!(step, tool = %tool, result = %result, "Tool executed");
            state.last_result = Some(result.clone());

            let key = (tool.clone(), canonical_args(&args));
            if state.last_action.as_ref() == Some(&key) {
                state.repeat_count += 1;
            } else {
                state.repeat_count = 1;
                state.last_action = Some(key);
            }
            if state.repeat_count >= 2 {
                warn!(step, tool = %tool, "Same tool call repeated, finalizing");
                return ReactOutcome::new(
                    format!("{FINAL_ANSWER_MARKER} {result}"),
                    step,
                    LoopExit::RepeatedCall,
                );
            }

            if tool == "greeting" && is_goodbye(prompt) {
                let name = if unnamed {
                    None
                } else {
                    args.get("name").and_then(value_text)
                };
                info!(step, "Greeting called for a goodbye, converting");
                return ReactOutcome::new(
                    format!("{FINAL_ANSWER_MARKER} {}", goodbye_message(name.as_deref())),
                    step,
                    LoopExit::GoodbyeOverride,
                );
            }

            let facts = StepFacts {
                intent,
                multi_step,
                prompt,
                tool: &tool,
                result: &result,
            };
            if let Some(rule) = heuristics::check(&facts) {
                info!(step, rule = rule.as_str(), "Request satisfied, finalizing");
                return ReactOutcome::new(
                    format!("{FINAL_ANSWER_MARKER} {result}"),
                    step,
                    LoopExit::Heuristic(rule),
                );
            }

            log.push_observation(block, &result);
        }

        warn!(step_limit, "Step budget exhausted");
        ReactOutcome::new(EXHAUSTED_MESSAGE, step_limit, LoopExit::Exhausted)
    }

    /// Run a tool. Unknown names get a "did you mean" hint when one is close.
    async fn execute(&self, tool: &str, args: &Map<String, Value>, known: &[&str]) -> ToolOutput {
        let output = self.tools.execute(tool, args).await;
        if self.tools.contains(tool) {
            return output;
        }
        match (output, closest_tool(tool, known)) {
            (ToolOutput::Error(message), Some(suggestion)) => {
                ToolOutput::Error(format!("{message}. Did you mean '{suggestion}'?"))
            }
            (output, _) => output,
        }
    }
}

fn is_generic_name(name: Option<&Value>) -> bool {
    match name.and_then(value_text) {
        Some(name) => GENERIC_NAMES.contains(&name.to_lowercase().as_str()),
        None => true,
    }
}

/// Key-sorted JSON for repeat detection.
fn canonical_args(args: &Map<String, Value>) -> String {
    let sorted: BTreeMap<&String, &Value> = args.iter().collect();
    serde_json::to_string(&sorted).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedGenerator;
    use agentlab_core::error::{MemoryError, ProviderError};
    use agentlab_core::message::Role;
    use agentlab_memory::InMemoryHistory;
    use agentlab_tools::default_registry;

    struct Harness {
        generator: Arc<ScriptedGenerator>,
        history: InMemoryHistory,
        controller: ReactController,
    }

    fn harness_with(generator: ScriptedGenerator, history: InMemoryHistory) -> Harness {
        let generator = Arc::new(generator);
        let controller = ReactController::new(
            generator.clone(),
            Arc::new(default_registry()),
            Arc::new(history.clone()),
        );
        Harness {
            generator,
            history,
            controller,
        }
    }

    fn harness(outputs: &[&str]) -> Harness {
        harness_with(ScriptedGenerator::new(outputs), InMemoryHistory::new())
    }

    fn session() -> SessionId {
        SessionId::from("test")
    }

    #[tokio::test]
    async fn direct_final_answer_is_verbatim() {
        let h = harness(&["  Final Answer: 42  "]);
        let out = h.controller.run("tell me a number", &session()).await;
        assert_eq!(out.answer, "Final Answer: 42");
        assert_eq!(out.exit, LoopExit::DirectAnswer);
        assert_eq!(out.steps, 1);
    }

    #[tokio::test]
    async fn single_step_math_finalizes_on_first_number() {
        let h = harness(&[r#"{"tool":"add_numbers","args":{"a":2,"b":2}}"#]);
        let out = h.controller.run("what is 2 plus 2", &session()).await;
        assert_eq!(out.answer, "Final Answer: 4");
        assert_eq!(out.exit, LoopExit::Heuristic(HeuristicRule::SingleStepMath));
        assert_eq!(h.generator.call_count(), 1);
    }

    #[tokio::test]
    async fn multi_step_math_with_placeholder() {
        let h = harness(&[
            r#"{"tool":"add_numbers","args":{"a":2,"b":3}}"#,
            r#"{"tool":"multiply","args":{"a":"<last_result>","b":4}}"#,
        ]);
        let out = h.controller.run("Add 2 and 3 then multiply by 4", &session()).await;
        assert_eq!(out.answer, "Final Answer: 20");
        assert_eq!(out.exit, LoopExit::Heuristic(HeuristicRule::TerminalMath));

        let prompts = h.generator.prompts();
        assert!(prompts[1].starts_with(&prompts[0]));
        assert!(prompts[1].contains("\nObservation: 5\n"));
    }

    #[tokio::test]
    async fn greet_finalizes_with_greeting() {
        let h = harness(&["```json\n{\"tool\":\"Greeting\",\"args\":{\"name\":\"Ann\"}}\n```"]);
        let out = h.controller.run("Hello, my name is Ann", &session()).await;
        assert_eq!(out.answer, "Final Answer: Hello Ann");
        assert_eq!(out.exit, LoopExit::Heuristic(HeuristicRule::Greet));
    }

    #[tokio::test]
    async fn greeting_placeholder_name_uses_history() {
        let s = session();
        let history = InMemoryHistory::with_turns(&s, vec![Turn::user("call me bob")]).await;
        let h = harness_with(
            ScriptedGenerator::new(&[r#"{"tool":"greeting","args":{"name":"user"}}"#]),
            history,
        );
        let out = h.controller.run("hey there", &s).await;
        assert_eq!(out.answer, "Final Answer: Hello Bob");
    }

    #[tokio::test]
    async fn greeting_without_name_or_history() {
        let h = harness(&[r#"{"tool":"greeting","args":{}}"#]);
        let out = h.controller.run("hi", &session()).await;
        assert_eq!(out.answer, "Final Answer: Hello User");
    }

    #[tokio::test]
    async fn transform_with_bare_placeholder_repair() {
        let h = harness(&[
            r#"{"tool":"add_numbers","args":{"a":1,"b":1}}"#,
            r#"TOOL CALL: {"tool":"TO_UPPERCASE","args":{"text":<last_result>}}"#,
        ]);
        let out = h.controller.run("make the answer uppercase", &session()).await;
        assert_eq!(out.answer, "Final Answer: 2");
        assert_eq!(out.exit, LoopExit::Heuristic(HeuristicRule::Transform));
    }

    #[tokio::test]
    async fn repeated_call_finalizes_on_second_occurrence() {
        let call = r#"{"tool":"to_uppercase","args":{"text":"abc"}}"#;
        let h = harness(&[call, call, call]);
        let out = h.controller.run("do something", &session()).await;
        assert_eq!(out.answer, "Final Answer: ABC");
        assert_eq!(out.exit, LoopExit::RepeatedCall);
        assert_eq!(out.steps, 2);
        assert_eq!(h.generator.call_count(), 2);
    }

    #[tokio::test]
    async fn repeat_key_ignores_argument_order() {
        let h = harness(&[
            r#"{"tool":"multiply","args":{"a":2,"b":3}}"#,
            r#"{"tool":"MULTIPLY","args":{"b":3,"a":2}}"#,
        ]);
        let out = h.controller.run("multiply 2 by 3, then divide by 2", &session()).await;
        assert_eq!(out.exit, LoopExit::RepeatedCall);
        assert_eq!(out.answer, "Final Answer: 6");
    }

    #[tokio::test]
    async fn unparseable_output_gets_one_repair() {
        let h = harness(&["I think I should add", "still thinking"]);
        let out = h.controller.run("do something", &session()).await;
        assert_eq!(out.answer, EXHAUSTED_MESSAGE);
        assert_eq!(out.exit, LoopExit::InvalidOutput);
        assert_eq!(out.steps, 2);
        assert!(h.generator.prompts()[1].contains("Your last output was invalid"));
    }

    #[tokio::test]
    async fn invalid_json_gets_its_own_repair() {
        let h = harness(&[
            "no json",
            r#"{"tool": "add_numbers", "args": {"a": 1,}}"#,
            r#"{"tool":"add_numbers","args":{"a":1,"b":2}}"#,
        ]);
        let out = h.controller.run("please add 1 and 2", &session()).await;
        assert_eq!(out.answer, "Final Answer: 3");
        assert_eq!(out.steps, 3);
        assert!(h.generator.prompts()[2].contains("Observation: Invalid JSON ("));
    }

    #[tokio::test]
    async fn second_invalid_json_fails() {
        let h = harness(&[r#"{"args":{}}"#, r#"{"tool":42}"#]);
        let out = h.controller.run("do something", &session()).await;
        assert_eq!(out.answer, INVALID_JSON_MESSAGE);
        assert_eq!(out.exit, LoopExit::InvalidJson);
    }

    #[tokio::test]
    async fn terminates_on_endless_garbage() {
        let h = harness_with(ScriptedGenerator::repeating("???", 20), InMemoryHistory::new());
        let out = h.controller.run("add 1 then add 2 then add 3", &session()).await;
        assert!(out.steps <= 10);
        assert_eq!(out.answer, EXHAUSTED_MESSAGE);
    }

    #[tokio::test]
    async fn exhausts_step_budget() {
        let h = harness(&[
            r#"{"tool":"to_uppercase","args":{"text":"a"}}"#,
            r#"{"tool":"to_uppercase","args":{"text":"b"}}"#,
            r#"{"tool":"to_uppercase","args":{"text":"c"}}"#,
            r#"{"tool":"to_uppercase","args":{"text":"d"}}"#,
        ]);
        let out = h.controller.run("do something", &session()).await;
        assert_eq!(out.exit, LoopExit::Exhausted);
        assert_eq!(out.steps, 4);
        assert_eq!(out.answer, EXHAUSTED_MESSAGE);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_observation_with_hint() {
        let h = harness(&[
            r#"{"tool":"multiplyy","args":{"a":2,"b":3}}"#,
            r#"{"tool":"multiply","args":{"a":2,"b":3}}"#,
        ]);
        let out = h.controller.run("multiply 2 by 3", &session()).await;
        assert_eq!(out.answer, "Final Answer: 6");

        let second = &h.generator.prompts()[1];
        assert!(second.contains("Observation: [tool_error] Unknown tool 'multiplyy'. Available: "));
        assert!(second.contains("Did you mean 'multiply'?"));
    }

    #[tokio::test]
    async fn tool_error_does_not_finalize_math() {
        let h = harness(&[
            r#"{"tool":"divide","args":{"a":1,"b":0}}"#,
            "Final Answer: cannot divide by zero",
        ]);
        let out = h.controller.run("divide 1 by 0", &session()).await;
        assert_eq!(out.answer, "Final Answer: cannot divide by zero");
        assert!(h.generator.prompts()[1].contains("Observation: [tool_error] divide by zero"));
    }

    #[tokio::test]
    async fn final_answer_pseudo_tool() {
        let h = harness(&[
            r#"{"tool":"to_uppercase","args":{"text":"abc"}}"#,
            r#"{"tool":"FINAL ANSWER","args":{}}"#,
        ]);
        let out = h.controller.run("do something", &session()).await;
        assert_eq!(out.answer, "Final Answer: ABC");
        assert_eq!(out.exit, LoopExit::FinalAnswerTool);

        let h = harness(&[r#"{"tool":"final_answer","text":"done","args":{"text":"ignored"}}"#]);
        let out = h.controller.run("do something", &session()).await;
        assert_eq!(out.answer, "Final Answer: done");

        let h = harness(&[r#"{"tool":"FINAL_ANSWER"}"#]);
        let out = h.controller.run("do something", &session()).await;
        assert_eq!(out.answer, "Final Answer:");
    }

    #[tokio::test]
    async fn final_answer_pseudo_tool_in_any_case() {
        for name in ["Final Answer", "final answer"] {
            let call = format!(r#"{{"tool":"{name}","args":{{"text":"ABC"}}}}"#);
            let h = harness(&[r#"{"tool":"to_uppercase","args":{"text":"abc"}}"#, &call]);
            let out = h.controller.run("do something", &session()).await;
            assert_eq!(out.answer, "Final Answer: ABC");
            assert_eq!(out.exit, LoopExit::FinalAnswerTool);
            assert_eq!(out.steps, 2);
        }
    }

    #[tokio::test]
    async fn identity_query_skips_generator() {
        let s = session();
        let history = InMemoryHistory::with_turns(
            &s,
            vec![Turn::user("My name is Ann"), Turn::assistant("Hello Ann")],
        )
        .await;
        let h = harness_with(ScriptedGenerator::new(&[]), history);
        let out = h.controller.run("who am i?", &s).await;
        assert_eq!(out.answer, "Final Answer: You are Ann.");
        assert_eq!(out.exit, LoopExit::PreLoop(PreLoopHandler::Identity));
        assert_eq!(out.steps, 0);
        assert_eq!(h.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn first_calculation_reaches_past_default_window() {
        let s = session();
        let mut turns = vec![Turn::user("what is 40 plus 2"), Turn::assistant("Final Answer: 42")];
        for i in 0..5 {
            turns.push(Turn::user(format!("multiply {i} by 2")));
            turns.push(Turn::assistant(format!("Final Answer: {}", i * 2)));
        }
        let history = InMemoryHistory::with_turns(&s, turns).await;
        let h = harness_with(ScriptedGenerator::new(&[]), history);
        let out = h.controller.run("What was my first calculation?", &s).await;
        assert_eq!(out.answer, "Final Answer: 42");
    }

    #[tokio::test]
    async fn goodbye_override_when_handler_disabled() {
        let s = session();
        let history = InMemoryHistory::with_turns(&s, vec![Turn::user("I'm dana")]).await;
        let generator = Arc::new(ScriptedGenerator::new(&[r#"{"tool":"greeting","args":{"name":"?"}}"#]));
        let controller = ReactController::new(
            generator.clone(),
            Arc::new(default_registry()),
            Arc::new(history.clone()),
        )
        .with_handlers(vec![PreLoopHandler::Identity]);

        let out = controller.run("ok bye now", &s).await;
        assert_eq!(out.answer, "Final Answer: Goodbye, Dana!");
        assert_eq!(out.exit, LoopExit::GoodbyeOverride);
    }

    #[tokio::test]
    async fn goodbye_override_without_a_name_is_plain() {
        let generator = Arc::new(ScriptedGenerator::new(&[r#"{"tool":"greeting","args":{"name":"you"}}"#]));
        let controller = ReactController::new(
            generator.clone(),
            Arc::new(default_registry()),
            Arc::new(InMemoryHistory::new()),
        )
        .with_handlers(vec![PreLoopHandler::Identity]);

        let out = controller.run("see you later", &session()).await;
        assert_eq!(out.answer, "Final Answer: Goodbye!");
        assert_eq!(out.exit, LoopExit::GoodbyeOverride);
    }

    #[tokio::test]
    async fn exactly_one_exchange_persisted() {
        let h = harness(&["garbage", "more garbage"]);
        let s = session();
        let out = h.controller.run("do something", &s).await;

        let turns = h.history.recent(&s, 10).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "do something");
        assert_eq!(turns[1].content, out.answer);
    }

    #[tokio::test]
    async fn history_rendered_into_prompt() {
        let s = session();
        let history = InMemoryHistory::with_turns(
            &s,
            vec![Turn::user("add 1 and 1"), Turn::assistant("Final Answer: 2")],
        )
        .await;
        let h = harness_with(ScriptedGenerator::new(&["Final Answer: ok"]), history);
        h.controller.run("thanks", &s).await;

        let prompt = &h.generator.prompts()[0];
        assert!(prompt.starts_with(h.controller.header()));
        assert!(prompt.ends_with(
            "Conversation so far:\nUser: add 1 and 1\nAssistant: Final Answer: 2\n\nUSER: thanks\nThought:"
        ));
    }

    #[tokio::test]
    async fn generator_error_counts_as_empty_output() {
        let generator = ScriptedGenerator::with_results(vec![
            Err(ProviderError::Timeout("120s".into())),
            Ok("Final Answer: recovered".into()),
        ]);
        let h = harness_with(generator, InMemoryHistory::new());
        let out = h.controller.run("do something", &session()).await;
        assert_eq!(out.answer, "Final Answer: recovered");
        assert_eq!(out.steps, 2);
    }

    struct BrokenHistory;

    #[async_trait::async_trait]
    impl HistoryStore for BrokenHistory {
        fn name(&self) -> &str {
            "broken"
        }
        async fn append(&self, _: &SessionId, _: Role, _: &str) -> Result<(), MemoryError> {
            Err(MemoryError::Storage("disk full".into()))
        }
        async fn recent(&self, _: &SessionId, _: usize) -> Result<Vec<Turn>, MemoryError> {
            Err(MemoryError::QueryFailed("locked".into()))
        }
        async fn clear(&self, _: &SessionId) -> Result<usize, MemoryError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn history_failures_do_not_break_the_loop() {
        let controller = ReactController::new(
            Arc::new(ScriptedGenerator::new(&[r#"{"tool":"divide","args":{"a":10,"b":2}}"#])),
            Arc::new(default_registry()),
            Arc::new(BrokenHistory),
        );
        let out = controller.run("divide 10 by 2", &session()).await;
        assert_eq!(out.answer, "Final Answer: 5");
    }

    #[tokio::test]
    async fn config_limits_apply() {
        let config = AgentConfig {
            single_step_limit: 1,
            multi_step_limit: 2,
            history_window: 6,
            wide_history_window: 20,
        };
        let h = harness(&["x", "y"]);
        let controller = ReactController::new(
            h.generator.clone(),
            Arc::new(default_registry()),
            Arc::new(h.history.clone()),
        )
        .with_config(&config);
        let out = controller.run("do something", &session()).await;
        assert_eq!(out.exit, LoopExit::Exhausted);
        assert_eq!(out.steps, 1);
    }

    #[tokio::test]
    async fn concurrent_sessions_are_isolated() {
        let history = InMemoryHistory::new();
        let mut handles = Vec::new();
        for n in 0..4 {
            let history = history.clone();
            handles.push(tokio::spawn(async move {
                let call = format!(r#"{{"tool":"add_numbers","args":{{"a":{n},"b":1}}}}"#);
                let controller = ReactController::new(
                    Arc::new(ScriptedGenerator::new(&[call.as_str()])),
                    Arc::new(default_registry()),
                    Arc::new(history),
                );
                let s = SessionId::from(&format!("s{n}"));
                (n, controller.run(&format!("add {n} plus 1"), &s).await)
            }));
        }
        for handle in handles {
            let (n, out) = handle.await.unwrap();
            assert_eq!(out.answer, format!("Final Answer: {}", n + 1));
        }
        for n in 0..4 {
            let s = SessionId::from(&format!("s{n}"));
            assert_eq!(history.len(&s).await, 2);
        }
    }
}
