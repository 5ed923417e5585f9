//! Prompt construction for grounded answer generation
//!
//! The generation collaborator is held to a strict contract: answer only
//! from the supplied context, in the user's language, preserving table
//! markup and numeric formats, and fall back to the handoff token when
//! the context is insufficient.

use crate::context::ContextBundle;
use crate::parser::{TABLE_END_DELIMITER, TABLE_START_DELIMITER};

/// System prompt enforcing grounded, format-preserving answers
pub const SYSTEM_PROMPT: &str = r#"You are an enterprise retrieval-grounded question answering assistant.

CORE RULES (NON-NEGOTIABLE):
1. ANSWER ONLY from the provided CONTEXT. Do NOT use prior knowledge, memory, or external resources.
2. NEVER INVENT facts, numbers, or claims. If the CONTEXT lacks the information required to answer the QUESTION fully, do NOT guess.
3. The ONLY allowed fallback when the CONTEXT is insufficient is to output exactly the HANDOFF_MESSAGE token below. No additional text, no clarifications.

LANGUAGE HANDLING:
- Detect the language of the user's QUESTION and RESPOND STRICTLY in that same language.
- Do NOT describe or reveal the language detection step.

DOCUMENT UNDERSTANDING:
- The CONTEXT may include plain text, structured tables, and image references with captions.
- Preserve the original structure and formats from the CONTEXT when producing the answer.

FORMAT PRESERVATION:
- If the answer is derived from a table, return the answer as valid HTML using only <table>, <tr>, <th>, and <td> elements.
- Do NOT convert tables into paragraph prose.
- Preserve numerical values, currencies, dates, and percentages exactly as they appear in the CONTEXT.

SOURCE GROUNDING:
- Every factual statement must be traceable to CONTEXT passages. When helpful, cite the source identifier inline (e.g., [source: contracts.pdf#p3]).

ESCALATION (MANDATORY):
- If you cannot answer from the CONTEXT, output ONLY the HANDOFF_MESSAGE token, in the user's language, and nothing else.

ABSOLUTELY FORBIDDEN:
- Hallucinated facts, invented citations, or partial answers lacking supporting context.
- Explanations, examples, or steps that are not present in the CONTEXT."#;

/// Placeholder used when the bundle carries no text
const NO_TEXT_AVAILABLE: &str = "NO_TEXT_AVAILABLE";

/// Build the user prompt for one request
///
/// Sections appear in a fixed order so the model can rely on the layout:
/// question, handoff token, context text, delimited context tables,
/// context images, retrieval confidence, closing instructions.
pub fn build_rag_prompt(user_query: &str, context: &ContextBundle, handoff_message: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!("[QUESTION]\n{}", user_query));
    parts.push(format!("[HANDOFF_MESSAGE]\n{}", handoff_message));

    parts.push("[CONTEXT_TEXT]".to_string());
    if context.text.trim().is_empty() {
        parts.push(NO_TEXT_AVAILABLE.to_string());
    } else {
        parts.push(context.text.clone());
    }

    if !context.tables.is_empty() {
        parts.push("[CONTEXT_TABLES]".to_string());
        for table in &context.tables {
            parts.push(TABLE_START_DELIMITER.to_string());
            parts.push(table.clone());
            parts.push(TABLE_END_DELIMITER.to_string());
        }
    }

    if !context.images.is_empty() {
        parts.push("[CONTEXT_IMAGES]".to_string());
        for image in &context.images {
            parts.push(image.clone());
        }
    }

    parts.push(format!("[RETRIEVAL_CONFIDENCE]\n{}", context.confidence));

    parts.push(
        "[INSTRUCTIONS]\n\
         - Use ONLY the CONTEXT to answer.\n\
         - If the CONTEXT lacks the answer, output exactly the HANDOFF_MESSAGE above and nothing else.\n\
         - If deriving an answer from a table, return valid HTML table markup only."
            .to_string(),
    );

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(text: &str, tables: Vec<&str>) -> ContextBundle {
        ContextBundle {
            text: text.to_string(),
            tables: tables.into_iter().map(String::from).collect(),
            images: vec![],
            confidence: 0.8,
        }
    }

    #[test]
    fn test_sections_appear_in_order() {
        let prompt = build_rag_prompt(
            "What is the price?",
            &bundle("[source: a.pdf#p1] prices", vec!["<table></table>"]),
            "handoff",
        );

        let question = prompt.find("[QUESTION]").unwrap();
        let handoff = prompt.find("[HANDOFF_MESSAGE]").unwrap();
        let text = prompt.find("[CONTEXT_TEXT]").unwrap();
        let tables = prompt.find("[CONTEXT_TABLES]").unwrap();
        let confidence = prompt.find("[RETRIEVAL_CONFIDENCE]").unwrap();
        let instructions = prompt.find("[INSTRUCTIONS]").unwrap();

        assert!(question < handoff);
        assert!(handoff < text);
        assert!(text < tables);
        assert!(tables < confidence);
        assert!(confidence < instructions);
    }

    #[test]
    fn test_tables_are_delimited() {
        let prompt = build_rag_prompt(
            "q",
            &bundle("ctx", vec!["<table><tr><td>1</td></tr></table>"]),
            "handoff",
        );
        assert!(prompt.contains(TABLE_START_DELIMITER));
        assert!(prompt.contains(TABLE_END_DELIMITER));
    }

    #[test]
    fn test_empty_context_text_placeholder() {
        let prompt = build_rag_prompt("q", &bundle("   ", vec![]), "handoff");
        assert!(prompt.contains("NO_TEXT_AVAILABLE"));
        assert!(!prompt.contains("[CONTEXT_TABLES]"));
        assert!(!prompt.contains("[CONTEXT_IMAGES]"));
    }
}
