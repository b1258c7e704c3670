//! Phatic-message detection.
//!
//! A phatic message is pure social lubricant ("ok", "спасибо", a thumbs-up)
//! that carries no semantic weight. The topic tracker and the predictive loop
//! both skip such messages: a one-word "да" must neither read as a topic
//! change nor as a prediction failure.
//!
//! The heuristic boundary (short length + fixed filler list) is deliberately
//! swappable: consumers take a `PhaticPredicate` so the boundary can be tuned
//! without touching the pipeline.

/// Pluggable predicate deciding whether a message is phatic.
pub type PhaticPredicate = fn(&str) -> bool;

/// Filler tokens that never count as semantic content, regardless of length.
const PHATIC_TOKENS: &[&str] = &[
    // greetings / partings
    "привет", "здравствуй", "хай", "ку", "пока", "удачи",
    "hi", "hey", "hello", "bye", "goodnight",
    // acknowledgements
    "спасибо", "спс", "благодарю", "пожалуйста", "пжл",
    "thanks", "thx", "please",
    // minimal responses
    "ок", "ok", "okay", "ну", "хорошо", "ладно", "ага", "угу", "да", "нет",
    "yes", "no", "yep", "nope", "ясно", "понятно", "круто", "класс",
    "lol", "hmm", "хм", "cool", "nice", "sure",
    // emoji-only reactions
    "👍", "👋", "🙂", "👌", "🙏", "❤️",
];

/// Default phatic heuristic: fewer than 4 words, or every token is a filler.
///
/// Word count is the primary guard (the topic centroid needs at least a short
/// clause to be meaningful); the token list catches longer pure-filler
/// strings like "ну ладно хорошо спасибо".
pub fn default_phatic_predicate(text: &str) -> bool {
    let cleaned = text.trim().to_lowercase();
    if cleaned.is_empty() {
        return true;
    }

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() < 4 {
        return true;
    }

    words.iter().all(|w| {
        let w = w.trim_matches(|c: char| c.is_ascii_punctuation());
        w.is_empty() || PHATIC_TOKENS.contains(&w)
    })
}
