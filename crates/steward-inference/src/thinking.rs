//! Reasoning-block handling for thinking models.
//!
//! Some OpenAI-compatible models emit `<think>...</think>` before their
//! answer. The reasoning may itself mention the payload sentinel, so it is
//! removed before the reply is split.

const OPEN: &str = "<think>";
const CLOSE: &str = "</think>";

/// Answer text with every `<think>` block removed.
///
/// An unclosed `<think>` swallows the rest of the response. A response
/// without reasoning is returned untouched.
///
/// ```
/// use steward_inference::strip_thinking;
///
/// assert_eq!(strip_thinking("<think>Tomorrow is Feb 2.</think>Sure!"), "Sure!");
/// ```
pub fn strip_thinking(response: &str) -> String {
    if !response.contains(OPEN) {
        return response.to_string();
    }

    let mut answer = String::new();
    let mut rest = response;
    while let Some(start) = rest.find(OPEN) {
        answer.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        rest = match after_open.find(CLOSE) {
            Some(end) => &after_open[end + CLOSE.len()..],
            None => "",
        };
    }
    answer.push_str(rest);
    answer.trim().to_string()
}
