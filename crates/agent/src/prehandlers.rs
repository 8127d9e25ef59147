//! Fast-path handlers answered from history alone.
//!
//! Each handler is a predicate over the raw request plus a resolver over
//! the recent history. They are checked in [`PreLoopHandler::ALL`] order
//! and the first match answers the request without calling the generator.

use agentlab_core::message::Turn;
use regex_lite::Regex;
use std::sync::LazyLock;

use crate::history::{
    extract_name_from_prompt, find_name_in_history, first_numeric_answer, summarize_one_line,
};

static REMEMBER_THAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bremember that my name is\b").unwrap());

static IDENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bwho am i\??$").unwrap());

static SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(what (did|have) we (talked|talked about) so far|one line|summary|summarise|summarize)\b",
    )
    .unwrap()
});

static FIRST_CALCULATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(first|1st)\s+calculation\b").unwrap());

static GOODBYE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(good\s*bye|bye|see\s+you|see\s+ya|later)\b").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreLoopHandler {
    RememberName,
    Identity,
    Summary,
    FirstCalculation,
    Goodbye,
}

impl PreLoopHandler {
    /// Every handler, in dispatch order.
    pub const ALL: [PreLoopHandler; 5] = [
        PreLoopHandler::RememberName,
        PreLoopHandler::Identity,
        PreLoopHandler::Summary,
        PreLoopHandler::FirstCalculation,
        PreLoopHandler::Goodbye,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreLoopHandler::RememberName => "remember_name",
            PreLoopHandler::Identity => "identity",
            PreLoopHandler::Summary => "summary",
            PreLoopHandler::FirstCalculation => "first_calculation",
            PreLoopHandler::Goodbye => "goodbye",
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            PreLoopHandler::RememberName => {
                text.to_lowercase().contains("remember my name") || REMEMBER_THAT.is_match(text)
            }
            PreLoopHandler::Identity => IDENTITY.is_match(text.trim()),
            PreLoopHandler::Summary => SUMMARY.is_match(text),
            PreLoopHandler::FirstCalculation => FIRST_CALCULATION.is_match(text),
            PreLoopHandler::Goodbye => is_goodbye(text),
        }
    }

    /// Produce the final answer for `text` from `history`.
    pub fn resolve(&self, text: &str, history: &[Turn]) -> String {
        let answer = match self {
            PreLoopHandler::RememberName => {
                let name = extract_name_from_prompt(text)
                    .or_else(|| find_name_in_history(history))
                    .unwrap_or_else(|| "you".to_string());
                format!("Got it, I'll remember your name: {name}.")
            }
            PreLoopHandler::Identity => match find_name_in_history(history) {
                Some(name) => format!("You are {name}."),
                None => "I don't have your name yet. Tell me \"My name is ...\" and I'll remember."
                    .to_string(),
            },
            PreLoopHandler::Summary => summarize_one_line(history),
            PreLoopHandler::FirstCalculation => first_numeric_answer(history)
                .unwrap_or_else(|| "I couldn't find a prior calculation in this session.".to_string()),
            PreLoopHandler::Goodbye => goodbye_message(find_name_in_history(history).as_deref()),
        };
        format!("Final Answer: {answer}")
    }
}

impl std::fmt::Display for PreLoopHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_goodbye(text: &str) -> bool {
    GOODBYE.is_match(text)
}

/// `Goodbye, {name}!` or a plain `Goodbye!`, without the final-answer marker.
pub(crate) fn goodbye_message(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("Goodbye, {name}!"),
        None => "Goodbye!".to_string(),
    }
}

/// The first of `handlers` that fires for `text`, with its answer.
pub fn dispatch(
    handlers: &[PreLoopHandler],
    text: &str,
    history: &[Turn],
) -> Option<(PreLoopHandler, String)> {
    handlers
        .iter()
        .find(|h| h.matches(text))
        .map(|h| (*h, h.resolve(text, history)))
}

/// True when one of `handlers` will fire and so needs more history than an
/// ordinary step.
pub fn needs_wide_window(handlers: &[PreLoopHandler], text: &str) -> bool {
    handlers.iter().any(|h| h.matches(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[PreLoopHandler] = &PreLoopHandler::ALL;

    fn ann_history() -> Vec<Turn> {
        vec![Turn::user("My name is Ann"), Turn::assistant("Hello Ann")]
    }

    #[test]
    fn identity_query_uses_history() {
        let (handler, answer) = dispatch(ALL, "Who am I?", &ann_history()).unwrap();
        assert_eq!(handler, PreLoopHandler::Identity);
        assert_eq!(answer, "Final Answer: You are Ann.");
    }

    #[test]
    fn identity_without_name() {
        let (_, answer) = dispatch(ALL, "who am i", &[]).unwrap();
        assert!(answer.starts_with("Final Answer: I don't have your name yet"));
    }

    #[test]
    fn identity_must_end_the_request() {
        assert!(!PreLoopHandler::Identity.matches("who am i talking to right now"));
    }

    #[test]
    fn remember_name_prefers_current_text() {
        let (handler, answer) =
            dispatch(ALL, "Please remember that my name is bob", &ann_history()).unwrap();
        assert_eq!(handler, PreLoopHandler::RememberName);
        assert_eq!(answer, "Final Answer: Got it, I'll remember your name: Bob.");

        let (_, answer) = dispatch(ALL, "remember my name", &ann_history()).unwrap();
        assert_eq!(answer, "Final Answer: Got it, I'll remember your name: Ann.");

        let (_, answer) = dispatch(ALL, "remember my name", &[]).unwrap();
        assert_eq!(answer, "Final Answer: Got it, I'll remember your name: you.");
    }

    #[test]
    fn first_calculation_scans_chronologically() {
        let history = vec![
            Turn::user("what is 40 plus 2"),
            Turn::assistant("Final Answer: 42"),
            Turn::user("multiply 2 by 3"),
            Turn::assistant("Final Answer: 6"),
        ];
        let (handler, answer) = dispatch(ALL, "what was my first calculation?", &history).unwrap();
        assert_eq!(handler, PreLoopHandler::FirstCalculation);
        assert_eq!(answer, "Final Answer: 42");
    }

    #[test]
    fn first_calculation_missing() {
        let (_, answer) = dispatch(ALL, "what was my 1st calculation", &ann_history()).unwrap();
        assert_eq!(
            answer,
            "Final Answer: I couldn't find a prior calculation in this session."
        );
    }

    #[test]
    fn summary_request() {
        let (handler, answer) = dispatch(ALL, "Summarize our chat in one line", &ann_history()).unwrap();
        assert_eq!(handler, PreLoopHandler::Summary);
        assert_eq!(
            answer,
            "Final Answer: Greeted you as Ann, and you asked: \"My name is Ann\"."
        );
    }

    #[test]
    fn goodbye_personalized() {
        let (handler, answer) = dispatch(ALL, "ok, bye!", &ann_history()).unwrap();
        assert_eq!(handler, PreLoopHandler::Goodbye);
        assert_eq!(answer, "Final Answer: Goodbye, Ann!");

        let (_, answer) = dispatch(ALL, "Good bye", &[]).unwrap();
        assert_eq!(answer, "Final Answer: Goodbye!");
    }

    #[test]
    fn ordinary_requests_pass_through() {
        assert!(dispatch(ALL, "add 2 and 3", &ann_history()).is_none());
        assert!(dispatch(ALL, "Hello, my name is Ann", &[]).is_none());
        assert!(!needs_wide_window(ALL, "make this uppercase"));
    }

    #[test]
    fn wide_window_when_any_handler_fires() {
        assert!(needs_wide_window(ALL, "see you later"));
        assert!(needs_wide_window(ALL, "who am I?"));
        assert!(needs_wide_window(ALL, "remember my name"));
    }

    #[test]
    fn disabled_handlers_do_not_fire() {
        let only_identity = &[PreLoopHandler::Identity];
        assert!(dispatch(only_identity, "bye", &ann_history()).is_none());
        assert!(!needs_wide_window(only_identity, "bye"));
    }

    #[test]
    fn remember_name_beats_goodbye() {
        let (handler, _) = dispatch(ALL, "remember my name, bye", &[]).unwrap();
        assert_eq!(handler, PreLoopHandler::RememberName);
    }
}
