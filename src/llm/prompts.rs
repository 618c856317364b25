use crate::models::VideoContext;

/// Heading that introduces the chunk text in the user message
pub const CHUNK_HEADING: &str = "Transcript Chunk:";

/// System prompt for the oracle (non-negotiable constraints)
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are correcting segments of a YouTube video transcript. These segments could be from anywhere in the video (beginning, middle, or end). Use the video title and description for context.

CRITICAL CONSTRAINTS:
- Only fix typos and grammar. Do NOT change meaning or structure.
- PRESERVE ALL NEWLINES: each line is a distinct transcript segment.
- Do NOT add, remove, or merge lines. The chunk has exactly {line_count} lines and your output must have exactly {line_count} lines.
- MAINTAIN SIMILAR LINE LENGTHS: each output line should be approximately the same character count as its corresponding input line (within 10%). Do NOT expand short lines into paragraphs and do NOT condense long lines.
- If a sentence is broken across lines, keep it broken the same way.
- PRESERVE THE ORIGINAL LANGUAGE: output must be in the same language as the input transcript.
- Keep corrections minimal. Output only the corrected lines, with no commentary.

EXAMPLE

Input:
up to 900. From 900 up to 1,100.
If you sold at the reasonable
valuations, when the gains that already
been had, you missed out big time. I

Output:
up to $900. From $900 up to $1,100.
If you sold at the reasonable
valuations, when the gains that already
had been had, you missed out big time. I"#;

/// Build the user message for one chunk
pub fn build_chunk_prompt(context: &VideoContext, chunk_text: &str) -> String {
    format!(
        "Video Title: {}\nVideo Description: {}\n\n{}\n{}",
        context.title, context.description, CHUNK_HEADING, chunk_text
    )
}

/// Recover the chunk text from a user message built by [`build_chunk_prompt`]
///
/// The chunk starts after the first blank-line-prefixed heading following
/// the description label, so heading text inside the chunk is left alone.
pub fn extract_chunk_text(user_content: &str) -> Option<&str> {
    let description = user_content.find("\nVideo Description:")?;
    let marker = format!("\n\n{}\n", CHUNK_HEADING);
    user_content[description..]
        .find(&marker)
        .map(|pos| &user_content[description + pos + marker.len()..])
}
