//! Grounded question-answering prompt.
//!
//! The template tells the generator to answer only from the supplied
//! passages and to say so explicitly when the answer is not there. This is
//! an instruction only; nothing checks the answer afterwards.

use crate::index::ScoredPassage;

/// Reply the generator is told to give when the passages lack an answer.
pub const NOT_FOUND_REPLY: &str = "The information was not found in the document.";

/// Join retrieved passages in retrieval order.
pub fn render_context(passages: &[ScoredPassage]) -> String {
    passages
        .iter()
        .map(|p| p.passage.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the full prompt for `question` over `passages`.
///
/// Substitution is a single pass, so placeholder-like text inside passages
/// or the question is left untouched.
pub fn render(passages: &[ScoredPassage], question: &str) -> String {
    format!(
        "\
You answer questions about a document. Use ONLY the reference passages below. \
Never use outside knowledge.

Steps (follow every step):

Step 1: Read the passages
- Read every line of the reference passages carefully.
- Do not skip any part.
- Do not guess or assume.

Step 2: Find the information
- Search the passages for the answer.
- When the question names a specific year, term, section or number, look for text that contains it exactly.
- Collect every relevant detail (codes, names, numbers).

Step 3: Verify
- Check that everything you found comes from the passages.
- If you are not sure, do not answer. Reply: \"{not_found}\"

Step 4: Answer
- Answer only with information found in the passages.
- Quote the passage wording where possible.
- When asked for a list, include every item.

Do NOT:
- use prior knowledge
- guess or speculate
- summarise away or truncate details
- embellish

Reference passages:
{context}

Question: {question}

Answer:",
        not_found = NOT_FOUND_REPLY,
        context = render_context(passages),
        question = question,
    )
}
