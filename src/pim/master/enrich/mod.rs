//! Gold pass: marketing copy generated by an external text-generation service.
//!
//! The service sits behind [`DescriptionGenerator`] so the pass can run
//! against the Ollama HTTP API in production and a stub in tests. Progress is
//! reported through an explicit callback.

pub mod ollama;

use tracing::{debug, warn};

use crate::pim::master::error::Result;
use crate::pim::master::model::Table;

pub use ollama::OllamaGenerator;

/// Labels parsed from the generated text, in output column order.
pub const VERSION_LABELS: [&str; 3] = ["Creative", "Professional", "General"];

/// Produces one block of generated copy from two source descriptions.
pub trait DescriptionGenerator {
    fn generate(&self, desc_a: &str, desc_b: &str) -> Result<String>;
}

impl<F> DescriptionGenerator for F
where
    F: Fn(&str, &str) -> Result<String>,
{
    fn generate(&self, desc_a: &str, desc_b: &str) -> Result<String> {
        self(desc_a, desc_b)
    }
}

/// Substitutes `{name}` placeholders from `values`; `{{` and `}}` are literal
/// braces.
///
/// Returns the name of the first placeholder that has no value (or the
/// unterminated fragment) as the error.
pub fn render_template(
    template: &str,
    values: &[(&str, &str)],
) -> std::result::Result<String, String> {
    let mut rendered = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                rendered.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                rendered.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    name.push(next);
                }
                if !closed {
                    return Err(format!("{{{name}"));
                }
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => rendered.push_str(value),
                    None => return Err(name),
                }
            }
            other => rendered.push(other),
        }
    }

    Ok(rendered)
}

/// Renders the user prompt for one row. A template naming anything other than
/// `desc_a` / `desc_b` is sent verbatim after a warning.
pub fn build_prompt(template: &str, desc_a: &str, desc_b: &str) -> String {
    match render_template(template, &[("desc_a", desc_a), ("desc_b", desc_b)]) {
        Ok(prompt) => prompt,
        Err(missing) => {
            warn!(
                field = %missing,
                "prompt template references an unknown field, sending it unrendered"
            );
            template.to_string()
        }
    }
}

/// Extracts `Creative: …`, `Professional: …` and `General: …` lines from the
/// generated text. Unknown labels are ignored; missing labels stay empty; a
/// repeated label keeps its last value.
pub fn parse_versions(text: &str) -> [String; 3] {
    let mut versions: [String; 3] = Default::default();
    for line in text.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        if let Some(slot) = VERSION_LABELS.iter().position(|known| *known == label.trim()) {
            versions[slot] = value.trim().to_string();
        }
    }
    versions
}

/// Appends the generated `Creative`, `Professional` and `General` columns.
///
/// Both `source_columns` are created when missing; absent values are sent as
/// empty text. `progress` is called with `(done, total)` after every row. The
/// first generator failure aborts the pass.
pub fn gold_enrich<G, P>(
    table: &Table,
    generator: &G,
    source_columns: [&str; 2],
    mut progress: P,
) -> Result<Table>
where
    G: DescriptionGenerator + ?Sized,
    P: FnMut(usize, usize),
{
    let mut enriched = table.clone();
    let [first, second] = source_columns;
    let first = enriched.ensure_column(first, None);
    let second = enriched.ensure_column(second, None);

    let total = enriched.row_count();
    let mut generated = Vec::with_capacity(total);
    for row in 0..total {
        let desc_a = enriched.cell(row, first).unwrap_or("");
        let desc_b = enriched.cell(row, second).unwrap_or("");
        let text = generator.generate(desc_a, desc_b)?;
        debug!(row, length = text.len(), "generated copy");
        generated.push(parse_versions(&text));
        progress(row + 1, total);
    }

    let targets: Vec<usize> = VERSION_LABELS
        .iter()
        .map(|label| enriched.ensure_column(label, None))
        .collect();
    for (row, versions) in generated.into_iter().enumerate() {
        for (index, value) in targets.iter().zip(versions) {
            enriched.set_cell(row, *index, Some(value));
        }
    }

    Ok(enriched)
}
