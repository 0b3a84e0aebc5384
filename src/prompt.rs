//! Prompt assembly for retrieval-augmented answers. Pure functions — no I/O,
//! no hidden state, output fully determined by the inputs.

use crate::models::{ChatMessage, SourceRef};

/// Base instruction set for every voter-facing answer.
pub fn base_prompt() -> String {
    String::from(
        "You are an assistant to provide reliable, unbiased, and informative \
         information to a voter in the 2024 United States election. The year is 2024 \
         and the current United States President is Joe Biden.\n\n\
         Ensure that you do not return ANY misinformation. It is better to avoid \
         saying something than to respond with wrong information.",
    )
}

/// Render the retrieved sources as a citation block: a preamble, one
/// `Title/URL/Content` line per source in input order, and the
/// markdown-citation instruction. No sources yields an empty string, and the
/// caller omits the block entirely.
pub fn source_block(sources: &[SourceRef]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let mut block = String::from(
        "Here is a list of sources that may or may not be relevant to the query:\n",
    );
    for source in sources {
        block.push_str(&format!(
            "\nTitle: {} URL: {} Content: {}",
            source.title.as_deref().unwrap_or_default(),
            source.url.as_deref().unwrap_or_default(),
            source.content.as_deref().unwrap_or_default(),
        ));
    }
    block.push_str(
        "\n\nUse any sources extremely judiciously ONLY if they are relevant, and cite \
         all pieces of your response if possible. Use direct quotes when possible. You \
         MUST cite sources by using markdown links, such as \
         [here is some link](https://someurl.com).",
    );
    block
}

/// Render the user's customization into directive sentences. Each present
/// field contributes one sentence; both absent yields an empty string.
pub fn customization_block(
    custom_instructions: Option<&str>,
    selected_state: Option<&str>,
) -> String {
    let mut block = String::new();
    if let Some(instructions) = custom_instructions.filter(|s| !s.is_empty()) {
        block.push_str(&format!(
            "You should respond to the user following these custom instructions, but \
             make sure to be unbiased and informative: \"{instructions}\". You must \
             still be factual, critical, unbiased, and nuanced, and cite all sources \
             when applicable.",
        ));
    }
    if let Some(state) = selected_state.filter(|s| !s.is_empty()) {
        if !block.is_empty() {
            block.push(' ');
        }
        block.push_str(&format!(
            "You should try to focus on specific information relevant to a voter in \
             {state}, but only if it is relevant.",
        ));
    }
    block
}

/// Assemble the full conversation: one system message (base instructions,
/// then the source block, then the customization block, empty segments
/// omitted) followed by one user message carrying exactly the query.
pub fn build_conversation(
    query: &str,
    sources: &[SourceRef],
    custom_instructions: Option<&str>,
    selected_state: Option<&str>,
) -> Vec<ChatMessage> {
    let mut system = base_prompt();
    for segment in [
        source_block(sources),
        customization_block(custom_instructions, selected_state),
    ] {
        if !segment.is_empty() {
            system.push_str("\n\n");
            system.push_str(&segment);
        }
    }

    vec![ChatMessage::system(system), ChatMessage::user(query)]
}
