//! Reading facts back out of conversation history.
//!
//! Names, earlier calculation results and one-line recaps are all recovered
//! lexically from the stored turns; nothing here calls the generator.

use agentlab_core::message::{Role, Turn};
use regex_lite::Regex;
use std::sync::LazyLock;

/// Tried in order against each turn, newest turn first.
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bmy name is ([a-z][a-z]+)\b",
        r"(?i)\bi am ([a-z][a-z]+)\b",
        r"(?i)\bi'm ([a-z][a-z]+)\b",
        r"(?i)\bcall me ([a-z][a-z]+)\b",
        r"(?i)\bhello ([a-z][a-z]+)\b",
        r"(?i)\bhi ([a-z][a-z]+)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static STATED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmy name is\s+([a-z][a-z'-]*)").unwrap());

static FINAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Final Answer:\s*([-+]?\d+(?:\.\d+)?)\b").unwrap());

static BARE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([-+]?\d+(?:\.\d+)?)\b").unwrap());

static SHOUTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]{3,}").unwrap());

/// Turns considered by [`summarize_one_line`].
const SUMMARY_WINDOW: usize = 6;

/// Render turns as `User: ...` / `Assistant: ...` lines.
pub fn format_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| match t.role {
            Role::User => format!("User: {}", t.content),
            Role::Assistant => format!("Assistant: {}", t.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// First letter upper case, the rest lower case.
fn normalize_name(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The most recently stated or greeted name.
///
/// Stops at the newest turn with any match.
pub fn find_name_in_history(turns: &[Turn]) -> Option<String> {
    turns.iter().rev().find_map(|turn| {
        let text = turn.content.trim();
        NAME_PATTERNS
            .iter()
            .find_map(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| normalize_name(m.as_str()))
    })
}

/// A name introduced with "my name is" in the request itself.
pub fn extract_name_from_prompt(text: &str) -> Option<String> {
    STATED_NAME
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| normalize_name(m.as_str()))
}

/// The earliest numeric result in the assistant's turns.
///
/// Prefers a `Final Answer: <number>` turn; otherwise the first bare number
/// in any assistant turn.
pub fn first_numeric_answer(turns: &[Turn]) -> Option<String> {
    let assistant = || turns.iter().filter(|t| t.is_assistant());
    assistant()
        .find_map(|t| FINAL_NUMBER.captures(&t.content))
        .or_else(|| assistant().find_map(|t| BARE_NUMBER.captures(&t.content)))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// A one-sentence recap of the last few turns.
pub fn summarize_one_line(turns: &[Turn]) -> String {
    let recent = &turns[turns.len().saturating_sub(SUMMARY_WINDOW)..];

    let mut last_number = None;
    let mut transformed = false;
    for turn in recent.iter().filter(|t| t.is_assistant()) {
        if let Some(m) = FINAL_NUMBER.captures(&turn.content).and_then(|c| c.get(1)) {
            last_number = Some(m.as_str().to_string());
        }
        if turn.content.contains("Final Answer:") && SHOUTED.is_match(&turn.content) {
            transformed = true;
        }
    }

    let mut bits = vec![match find_name_in_history(recent) {
        Some(name) => format!("greeted you as {name}"),
        None => "exchanged a greeting".to_string(),
    }];
    if let Some(n) = last_number {
        bits.push(format!("did some math ending at {n}"));
    }
    if transformed {
        bits.push("applied an uppercase transform".to_string());
    }
    if let Some(last_user) = recent.iter().rev().find(|t| t.role == Role::User) {
        let collapsed = last_user.content.split_whitespace().collect::<Vec<_>>().join(" ");
        bits.push(format!("and you asked: \"{}\"", collapsed.trim_end_matches('.')));
    }

    let sentence = bits.join(", ");
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => format!("{}{}.", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_transcript() {
        let turns = vec![Turn::user("hi"), Turn::assistant("Final Answer: Hello")];
        assert_eq!(format_history(&turns), "User: hi\nAssistant: Final Answer: Hello");
        assert_eq!(format_history(&[]), "");
    }

    #[test]
    fn name_from_greeting_reply() {
        let turns = vec![Turn::user("My name is Ann"), Turn::assistant("Hello Ann")];
        assert_eq!(find_name_in_history(&turns).as_deref(), Some("Ann"));
    }

    #[test]
    fn newest_turn_wins() {
        let turns = vec![
            Turn::user("my name is bob"),
            Turn::user("actually, call me CAROL"),
        ];
        assert_eq!(find_name_in_history(&turns).as_deref(), Some("Carol"));
    }

    #[test]
    fn no_name_in_history() {
        let turns = vec![Turn::user("add 2 and 3"), Turn::assistant("Final Answer: 5")];
        assert_eq!(find_name_in_history(&turns), None);
    }

    #[test]
    fn name_from_prompt() {
        assert_eq!(
            extract_name_from_prompt("Please remember that my name is dave").as_deref(),
            Some("Dave")
        );
        assert_eq!(extract_name_from_prompt("remember my name"), None);
    }

    #[test]
    fn first_final_answer_number() {
        let turns = vec![
            Turn::user("what is 40 plus 2"),
            Turn::assistant("Final Answer: 42"),
            Turn::user("divide 10 by 2"),
            Turn::assistant("Final Answer: 5"),
        ];
        assert_eq!(first_numeric_answer(&turns).as_deref(), Some("42"));
    }

    #[test]
    fn falls_back_to_bare_number() {
        let turns = vec![
            Turn::assistant("Final Answer: Hello Ann"),
            Turn::assistant("The result was 12.5 overall"),
        ];
        assert_eq!(first_numeric_answer(&turns).as_deref(), Some("12.5"));
        assert_eq!(first_numeric_answer(&[Turn::user("7")]), None);
    }

    #[test]
    fn summary_mentions_everything() {
        let turns = vec![
            Turn::user("Hello, my name is Ann"),
            Turn::assistant("Final Answer: Hello Ann"),
            Turn::user("add 2 and 3"),
            Turn::assistant("Final Answer: 5"),
            Turn::user("uppercase   make me loud."),
            Turn::assistant("Final Answer: MAKE ME LOUD"),
        ];
        assert_eq!(
            summarize_one_line(&turns),
            "Greeted you as Ann, did some math ending at 5, applied an uppercase transform, \
             and you asked: \"uppercase make me loud\"."
        );
    }

    #[test]
    fn summary_of_empty_history() {
        assert_eq!(summarize_one_line(&[]), "Exchanged a greeting.");
    }

    #[test]
    fn summary_only_looks_at_recent_window() {
        let mut turns = vec![Turn::user("My name is Zed"), Turn::assistant("Final Answer: Hello Zed")];
        for i in 0..3 {
            turns.push(Turn::user(format!("question {i}")));
            turns.push(Turn::assistant("Final Answer: ok"));
        }
        assert_eq!(
            summarize_one_line(&turns),
            "Exchanged a greeting, and you asked: \"question 2\"."
        );
    }
}
