//! Text handling for generated SQL

use super::schema::SchemaDescription;

/// Reduce a model completion to a single bare statement.
///
/// Strips markdown code fences, a leading `SQL:` label, and anything after
/// the first statement terminator. Returns an empty string when nothing
/// statement-like remains.
///
/// ```
/// use retail_domain::clean_generated_sql;
///
/// let raw = "```sql\nSELECT COUNT(*) FROM Orders;\n```\nThis counts orders.";
/// assert_eq!(clean_generated_sql(raw), "SELECT COUNT(*) FROM Orders");
/// ```
pub fn clean_generated_sql(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        // skip the language tag line
        let body = match after.split_once('\n') {
            Some((tag, rest)) if !tag.trim().contains(' ') => rest,
            _ => after.trim_start_matches("sql"),
        };
        text = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
    }

    let mut text = text.trim();
    for label in ["SQL:", "sql:", "Query:", "query:"] {
        if let Some(rest) = text.strip_prefix(label) {
            text = rest.trim();
        }
    }

    let statement = match find_terminator(text) {
        Some(end) => &text[..end],
        None => text,
    };
    statement.trim().to_string()
}

/// Byte index of the first `;` outside a quoted literal or identifier
fn find_terminator(sql: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, c) in sql.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' || c == '`' => quote = Some(c),
            None if c == ';' => return Some(idx),
            None => {}
        }
    }
    None
}

/// Tables of `schema` that appear in `sql`, in schema order.
///
/// Matches whole identifiers, bare or quoted, case-insensitively.
pub fn tables_referenced(sql: &str, schema: &SchemaDescription) -> Vec<String> {
    let identifiers = identifiers(sql);
    schema
        .tables
        .iter()
        .filter(|t| identifiers.iter().any(|i| i.eq_ignore_ascii_case(&t.name)))
        .map(|t| t.name.clone())
        .collect()
}

fn identifiers(sql: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                let name: String = chars.by_ref().take_while(|&n| n != close).collect();
                out.push(name);
            }
            '\'' => {
                // string literal, not an identifier
                for n in chars.by_ref() {
                    if n == '\'' {
                        break;
                    }
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&n) = chars.peek() {
                    if n.is_alphanumeric() || n == '_' {
                        word.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push(word);
            }
            _ => {}
        }
    }
    out
}
