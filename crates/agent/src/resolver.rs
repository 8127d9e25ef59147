//! Tool name resolution and placeholder filling.

use serde_json::{Map, Value};

/// Resolved name for a pseudo-tool meaning "I'm done".
pub const FINAL_ANSWER_SENTINEL: &str = "__final_answer__";

/// Names generators invent, mapped to canonical tools.
const ALIASES: &[(&str, &str)] = &[
    ("Greeting", "greeting"),
    ("TO_UPPERCASE", "to_uppercase"),
    ("Divide", "divide"),
    ("divide_by", "divide"),
    ("divide_by_int", "divide"),
    ("FINAL ANSWER", FINAL_ANSWER_SENTINEL),
    ("FINAL_ANSWER", FINAL_ANSWER_SENTINEL),
    ("final_answer", FINAL_ANSWER_SENTINEL),
];

/// Tokens a generator may use to mean "the previous observation".
pub const PLACEHOLDERS: &[&str] = &[
    "<last_result>",
    "<previous_result>",
    "<previous_answer>",
    "<LAST_ANSWER>",
    "<last_answer>",
];

const SIMILARITY_CUTOFF: f64 = 0.6;

fn alias(name: &str) -> Option<&'static str> {
    ALIASES.iter().find(|(from, _)| *from == name).map(|(_, to)| *to)
}

fn alias_ignore_case(name: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(from, _)| from.eq_ignore_ascii_case(name))
        .map(|(_, to)| *to)
}

/// Map a generator-emitted tool name to a canonical tool name.
///
/// Tried in order: exact alias, case-insensitive match against `known`,
/// case-insensitive alias. Anything else is returned unchanged for the
/// caller to report as unknown.
pub fn resolve_tool(name: &str, known: &[&str]) -> String {
    if let Some(to) = alias(name) {
        return to.to_string();
    }
    let lower = name.to_lowercase();
    if known.contains(&lower.as_str()) {
        return lower;
    }
    alias_ignore_case(name).map_or_else(|| name.to_string(), str::to_string)
}

/// Replace placeholder-valued arguments with the last observation.
///
/// Only string values exactly equal to a placeholder token are replaced.
/// With no prior observation the arguments come back unchanged.
pub fn fill_placeholders(args: &Map<String, Value>, last_result: Option<&str>) -> Map<String, Value> {
    let Some(last) = last_result else {
        return args.clone();
    };
    args.iter()
        .map(|(key, value)| {
            let filled = match value {
                Value::String(s) if PLACEHOLDERS.contains(&s.as_str()) => Value::String(last.to_string()),
                other => other.clone(),
            };
            (key.clone(), filled)
        })
        .collect()
}

/// The known tool most similar to `name`, if any is close enough.
pub fn closest_tool<'a>(name: &str, known: &[&'a str]) -> Option<&'a str> {
    known
        .iter()
        .map(|candidate| (*candidate, similarity(name, candidate)))
        .filter(|(_, score)| *score >= SIMILARITY_CUTOFF)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}

/// Normalized similarity in `[0, 1]` from Levenshtein distance.
fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
