//! Refinement prompt and response extraction.
//!
//! The prompt ends with [`REFINED_DELIMITER`] as a completion cue.  Models
//! frequently echo part of the prompt back, so [`extract_refined`] keeps only
//! the text that follows the last occurrence of the delimiter.

/// Cue that closes the prompt and, when echoed, marks where the polished
/// script starts in the model's reply.
pub const REFINED_DELIMITER: &str = "Refined Script:";

const INSTRUCTION: &str = "\
You are a professional script editor for social media content.
Refine the following raw script into a concise, engaging, and grammatically correct script \
suitable for a 30-second YouTube Short or TikTok video.
Do not add any information not in the original script, including hashtags or extra content. \
Just polish it.";

/// Build the single user message sent to the chat-completion endpoint.
///
/// ```
/// use creator_studio::script::prompt::{build_prompt, REFINED_DELIMITER};
///
/// let prompt = build_prompt("dogs are great");
/// assert!(prompt.contains("Raw Script: dogs are great"));
/// assert!(prompt.trim_end().ends_with(REFINED_DELIMITER));
/// ```
pub fn build_prompt(raw: &str) -> String {
    let mut prompt = String::with_capacity(INSTRUCTION.len() + raw.len() + 64);
    prompt.push_str(INSTRUCTION);
    prompt.push_str("\n\nRaw Script: ");
    prompt.push_str(raw.trim());
    prompt.push_str("\n\n");
    prompt.push_str(REFINED_DELIMITER);
    prompt.push('\n');
    prompt
}

/// Pull the polished script out of a model reply.
///
/// Returns the text after the delimiter when present; otherwise (or when
/// nothing follows the delimiter) the whole trimmed reply.
pub fn extract_refined(content: &str) -> String {
    let content = content.trim();
    let after = content
        .rfind(REFINED_DELIMITER)
        .map(|idx| content[idx + REFINED_DELIMITER.len()..].trim())
        .unwrap_or(content);

    if after.is_empty() {
        content.to_string()
    } else {
        after.to_string()
    }
}

/// First non-blank line of `text`, trimmed.
///
/// Models tend to append editor notes after the script; only the leading
/// line is kept for narration.
pub fn headline(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
