//! Prompt templates for the answer pipeline

use crate::core::format_hint::FormatHint;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for route classification
    pub fn router_system() -> &'static str {
        r#"You classify questions about a retail business (orders, products, customers, categories)
by where the answer comes from.

Routes:
- retrieval: the answer is written in the documents
  (policies, return windows, campaign dates, KPI definitions)
- query: the answer is a number, ranking, or aggregate computed from the database alone
- hybrid: the documents supply a definition or date range AND the database supplies the figures

Think first, then answer in exactly this format:
Reasoning: <one or two sentences>
Route: <retrieval|query|hybrid>"#
    }

    /// User prompt for route classification
    pub fn router_prompt(question: &str, exemplars: &str) -> String {
        let mut prompt = String::new();
        push_exemplars(&mut prompt, exemplars);
        prompt.push_str(&format!("Question: {}", question));
        prompt
    }

    /// System prompt for query generation
    pub fn query_system() -> &'static str {
        r#"You write SQLite queries for a retail database.
Rules:
- Use ONLY the tables and columns listed in the schema.
- Quote table names that contain spaces, e.g. "Order Details".
- Revenue is SUM(UnitPrice * Quantity * (1 - Discount)) over order lines.
- Dates are stored as text; filter with strftime or BETWEEN on 'YYYY-MM-DD'.
- Reading only: a single SELECT statement, no modifications.
Return the query alone, with no explanation."#
    }

    /// User prompt for query generation. `context` holds retrieved
    /// document text on the hybrid route.
    pub fn query_prompt(
        question: &str,
        schema: &str,
        context: Option<&str>,
        exemplars: &str,
    ) -> String {
        let mut prompt = String::new();
        push_exemplars(&mut prompt, exemplars);
        prompt.push_str(schema);
        prompt.push_str("\n\n");
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            prompt.push_str(&format!(
                "Document context (dates, definitions):\n{}\n\n",
                context
            ));
        }
        prompt.push_str(&format!("Question: {}\nSQL:", question));
        prompt
    }

    /// System prompt for query repair
    pub fn repair_system() -> &'static str {
        r#"You fix SQLite queries that failed to run.
You receive the question, the failed query, and the exact error from the database.
Revise the failed query so that it runs and still answers the question.
Use ONLY the tables and columns listed in the schema.
Return the corrected query alone, with no explanation."#
    }

    /// User prompt for query repair
    pub fn repair_prompt(
        question: &str,
        schema: &str,
        failed_sql: &str,
        error: &str,
        exemplars: &str,
    ) -> String {
        let mut prompt = String::new();
        push_exemplars(&mut prompt, exemplars);
        prompt.push_str(&format!(
            r#"{}

Question: {}

Failed query:
{}

Error:
{}

Corrected SQL:"#,
            schema, question, failed_sql, error
        ));
        prompt
    }

    /// System prompt for answer synthesis
    pub fn synthesis_system() -> &'static str {
        r#"You answer a retail question using only the evidence provided.
Output rules for the answer:
- int: only the whole number, e.g. 14
- float: only the number with 2 decimals, e.g. 1234.56
- {...}: a single JSON object with the requested fields
- list[...]: a JSON array with the requested elements
- str: a short phrase
No extra text in the answer. Then give a one-sentence explanation (under 20 words).

Respond in exactly this format:
Answer: <value>
Explanation: <sentence>"#
    }

    /// User prompt for answer synthesis
    pub fn synthesis_prompt(
        question: &str,
        hint: &FormatHint,
        query_results: Option<&str>,
        doc_context: Option<&str>,
        exemplars: &str,
    ) -> String {
        let mut prompt = String::new();
        push_exemplars(&mut prompt, exemplars);
        prompt.push_str(&format!(
            "Question: {}\nFormat hint: {}\n",
            question,
            hint.as_prompt_str()
        ));
        if let Some(results) = query_results {
            prompt.push_str(&format!("\nQuery results:\n{}\n", results));
        }
        if let Some(context) = doc_context {
            prompt.push_str(&format!("\nDocuments:\n{}\n", context));
        }
        prompt
    }
}

fn push_exemplars(prompt: &mut String, exemplars: &str) {
    if !exemplars.trim().is_empty() {
        prompt.push_str(exemplars);
        prompt.push_str("\n\n---\n\n");
    }
}
