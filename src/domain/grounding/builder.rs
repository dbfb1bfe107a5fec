//! Grounded prompt assembly
//!
//! The system message carries the citation rules and the numbered grounding
//! context; the user message is the caller's question exactly as asked.

use crate::domain::llm::{Message, Prompt};
use crate::domain::retrieval::NO_RELEVANT_CONTEXT;

const GROUNDED_INSTRUCTIONS: &str = "You answer questions using only the numbered sources \
provided below, drawn from a curated knowledge base of statutes, policy documents and \
video transcripts.

Rules:
1. Use only the information in the sources. Do not rely on outside knowledge.
2. Cite every claim with the bracketed number of the source that supports it, for example [1] \
or [2][3]. Only use numbers that appear in the sources.
3. If the sources do not answer the question, say so plainly instead of guessing. Never invent \
section numbers, deadlines, amounts or quotations.";

const NO_CONTEXT_INSTRUCTIONS: &str = "You answer questions using a curated knowledge base of \
statutes, policy documents and video transcripts. No passage in the knowledge base matched \
this question.

Rules:
1. Tell the user that the available sources do not cover this question.
2. Do not answer from outside knowledge and do not speculate.
3. Do not include bracketed citation markers such as [1], and do not mention any statute or \
section number.";

/// Builds generation prompts from a question and its grounding context
#[derive(Debug, Clone, Default)]
pub struct GroundedPromptBuilder;

impl GroundedPromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the prompt for one question
    pub fn build(&self, question: &str, grounding_context: &str) -> Prompt {
        let system = if has_no_context(grounding_context) {
            NO_CONTEXT_INSTRUCTIONS.to_string()
        } else {
            format!(
                "{}\n\nSources:\n\n{}",
                GROUNDED_INSTRUCTIONS,
                grounding_context.trim()
            )
        };

        Prompt::new(vec![Message::system(system), Message::user(question)])
    }
}

fn has_no_context(grounding_context: &str) -> bool {
    let trimmed = grounding_context.trim();
    trimmed.is_empty() || trimmed == NO_RELEVANT_CONTEXT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MessageRole;
    use crate::domain::query::expand;

    const CONTEXT: &str =
        "[1] Termination of periodic tenancy (section 90.427)\nA month-to-month tenancy may be terminated...";

    #[test]
    fn test_prompt_has_system_then_user() {
        let prompt = GroundedPromptBuilder::new().build("How much notice?", CONTEXT);

        assert_eq!(prompt.messages.len(), 2);
        assert_eq!(prompt.messages[0].role, MessageRole::System);
        assert_eq!(prompt.messages[1].role, MessageRole::User);
    }

    #[test]
    fn test_context_and_citation_rules_in_system_message() {
        let prompt = GroundedPromptBuilder::new().build("How much notice?", CONTEXT);
        let system = prompt.first(MessageRole::System).unwrap();

        assert!(system.contains(CONTEXT));
        assert!(system.contains("[1]"));
        assert!(system.contains("say so plainly"));
    }

    #[test]
    fn test_user_message_is_original_question() {
        let question = "Can my landlord evict me for a late fee?";
        let expanded = expand(question);
        assert_ne!(expanded, question);

        let prompt = GroundedPromptBuilder::new().build(question, CONTEXT);

        assert_eq!(prompt.first(MessageRole::User), Some(question));
        let system = prompt.first(MessageRole::System).unwrap();
        assert!(!system.contains("forcible entry and detainer"));
    }

    #[test]
    fn test_no_context_marker_switches_instructions() {
        let prompt = GroundedPromptBuilder::new().build("Unrelated question", NO_RELEVANT_CONTEXT);
        let system = prompt.first(MessageRole::System).unwrap();

        assert!(system.contains("do not cover this question"));
        assert!(system.contains("Do not include bracketed citation markers"));
        assert!(!system.contains(NO_RELEVANT_CONTEXT));
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = GroundedPromptBuilder::new();
        assert_eq!(builder.build("q", CONTEXT), builder.build("q", CONTEXT));
    }
}
