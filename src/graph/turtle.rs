//! Turtle serialization of built graphs.

use std::fmt::Write;

use super::builder::Graph;
use super::term::{Fact, Predicate, Term, NAMESPACE, XSD_NAMESPACE};

/// Content type the store expects for graph documents.
pub const TURTLE_CONTENT_TYPE: &str = "text/turtle";

/// Escapes a free-text literal: `"` becomes `\"` and a newline becomes `\n`.
/// Nothing else is transformed.
pub fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        value.to_string()
    }
}

fn format_object(object: &Term) -> String {
    match object {
        Term::Node(name) => name.to_string(),
        Term::Class(class) => format!(":{}", class.local_name()),
        Term::Text(text) => format!("\"{}\"", escape_literal(text)),
        Term::Float(value) => format!("\"{}\"^^xsd:float", format_float(*value)),
    }
}

fn format_predicate(predicate: Predicate) -> String {
    match predicate {
        Predicate::Type => "a".to_string(),
        other => format!(":{}", other.local_name()),
    }
}

/// Renders facts as one Turtle document.
///
/// Consecutive facts about the same subject are joined into one statement.
/// The output only depends on the fact order.
pub struct GraphSerializer;

impl GraphSerializer {
    pub fn serialize(graph: &Graph) -> String {
        Self::serialize_facts(&graph.facts)
    }

    pub fn serialize_facts(facts: &[Fact]) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "@prefix : <{}> .", NAMESPACE);
        let _ = writeln!(out, "@prefix xsd: <{}> .", XSD_NAMESPACE);
        out.push('\n');

        let mut current_subject = None;
        for fact in facts {
            let line = format!(
                "{} {}",
                format_predicate(fact.predicate),
                format_object(&fact.object)
            );
            if current_subject == Some(&fact.subject) {
                let _ = write!(out, " ;\n  {}", line);
            } else {
                if current_subject.is_some() {
                    out.push_str(" .\n\n");
                }
                let _ = write!(out, "{} {}", fact.subject, line);
                current_subject = Some(&fact.subject);
            }
        }
        if current_subject.is_some() {
            out.push_str(" .\n\n");
        }
        out
    }
}
