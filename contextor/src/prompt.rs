//! Prompt builder: instruction line + delimited context block + query.

/// Joins retrieved documents inside the context block.
pub const DOC_SEPARATOR: &str = "\n---------\n";

/// Context used when retrieval returns nothing.
pub const NO_DOCUMENTS: &str = "No relevant documents found in the knowledge base.";

/// Context block for the prompt; never empty.
pub fn build_context(documents: &[String]) -> String {
    if documents.is_empty() {
        NO_DOCUMENTS.to_string()
    } else {
        documents.join(DOC_SEPARATOR)
    }
}

/// Full prompt sent to the chat model.
///
/// # Example
/// ```
/// use contextor::prompt::{build_prompt, NO_DOCUMENTS};
/// let p = build_prompt("Lancer", &[], "How much HP does a mech have?");
/// assert!(p.contains(NO_DOCUMENTS));
/// assert!(p.ends_with("Answer:"));
/// ```
pub fn build_prompt(subject: &str, documents: &[String], query: &str) -> String {
    format!(
        "Use the following context to answer questions about {subject}. \
         Respond only with the contents of the rules.\n\
         \n\
         Context from documents:\n\
         ---\n\
         {context}\n\
         ---\n\
         \n\
         User Query: {query}\n\
         \n\
         Answer:",
        context = build_context(documents),
        query = query.trim(),
    )
}
