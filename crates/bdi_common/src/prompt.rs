//! Prompt Builder
//!
//! One prompt per symptom. The preamble steers the model toward the least
//! severe reading, and the prompt ends on the level cue so the first tokens
//! of the answer are the level itself.

/// Maximum number of characters of user text embedded in a prompt
pub const MAX_USER_TEXT_CHARS: usize = 4096 * 4;

/// Appended to user text that was cut at `MAX_USER_TEXT_CHARS`
pub const TRUNCATION_MARKER: &str = "...";

/// Closing cue the model is expected to complete
pub const LEVEL_CUE: &str = "Level (0, 1, 2 or 3):";

const PREAMBLE: &str = "Suppose you are a psychiatrist who prefer to give minor diagnoses rather than serious ones, read the posts as a whole";

/// Cut `text` to at most `max_chars` characters, marking the cut
pub fn truncate_user_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Build the prompt for one symptom question
pub fn build_prompt(symptom_question: &str, user_text: &str) -> String {
    let text = truncate_user_text(user_text, MAX_USER_TEXT_CHARS);
    format!(
        "{}, determine the level of \"{}\" and give a number in 0, 1, 2 or 3, then explain why.\n\
         User’s posts: {}\n\
         {}",
        PREAMBLE, symptom_question, text, LEVEL_CUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt("how sad the user feels", "I feel fine today.");
        assert!(prompt.starts_with("Suppose you are a psychiatrist"));
        assert!(prompt.contains("\"how sad the user feels\""));
        assert!(prompt.contains("User’s posts: I feel fine today.\n"));
        assert!(prompt.ends_with("Level (0, 1, 2 or 3):"));
    }

    #[test]
    fn test_prompt_exact_wording() {
        assert_eq!(
            build_prompt("how sad the user feels", "Rough week."),
            "Suppose you are a psychiatrist who prefer to give minor diagnoses rather than serious ones, \
             read the posts as a whole, determine the level of \"how sad the user feels\" and give a number \
             in 0, 1, 2 or 3, then explain why.\nUser’s posts: Rough week.\nLevel (0, 1, 2 or 3):"
        );
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt("q", "text"), build_prompt("q", "text"));
    }

    #[test]
    fn test_short_text_not_truncated() {
        assert_eq!(truncate_user_text("abc", 3), "abc");
        assert_eq!(truncate_user_text("", 3), "");
    }

    #[test]
    fn test_long_text_truncated_with_marker() {
        assert_eq!(truncate_user_text("abcdef", 3), "abc...");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        assert_eq!(truncate_user_text("ééééé", 2), "éé...");
    }

    #[test]
    fn test_prompt_embeds_truncated_text() {
        let long = "x".repeat(MAX_USER_TEXT_CHARS + 100);
        let prompt = build_prompt("q", &long);
        let expected = format!("{}{}", "x".repeat(MAX_USER_TEXT_CHARS), TRUNCATION_MARKER);
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"x".repeat(MAX_USER_TEXT_CHARS + 1)));
    }
}
