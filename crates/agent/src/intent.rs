//! Lexical intent classification.
//!
//! Computed once per request from the raw prompt. Pure and case-insensitive.

use regex_lite::Regex;
use std::sync::LazyLock;

static GREET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(hi|hello|hey)\b|my name is").unwrap());

static MATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(add|plus|sum|minus|subtract|multiply|times|divide|divided)\b|[+*/]|\d\s*x\s*\d",
    )
    .unwrap()
});

static TRANSFORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(uppercase|lowercase|capitalize|title case)\b").unwrap());

static MULTI_STEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(then|and then|after that|next)\b").unwrap());

/// Coarse label for what a request is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greet,
    Math,
    Transform,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greet => "greet",
            Intent::Math => "math",
            Intent::Transform => "transform",
            Intent::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label a request. Greeting cues win over arithmetic, arithmetic over
/// case transforms.
pub fn classify_intent(text: &str) -> Intent {
    if GREET.is_match(text) {
        Intent::Greet
    } else if MATH.is_match(text) {
        Intent::Math
    } else if TRANSFORM.is_match(text) {
        Intent::Transform
    } else {
        Intent::Unknown
    }
}

/// True when the request chains steps with a sequencing connective.
pub fn wants_multi_step(text: &str) -> bool {
    MULTI_STEP.is_match(text)
}

/// The tool expected to produce the final number of a chained arithmetic
/// request, inferred from the operation words in it.
pub fn terminal_op(text: &str) -> &'static str {
    let t = text.to_lowercase();
    if t.contains("divide") || t.contains('/') {
        "divide"
    } else if t.contains("multiply") || t.contains("times") || t.contains('*') {
        "multiply"
    } else {
        "add_numbers"
    }
}
