//! Record formatting: JSON, Table, and Markdown output.

use serde::Serialize;

use kinbox_core::Knowledge;

/// Output format for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Markdown,
}

const COLUMNS: [&str; 10] = [
    "id", "name", "link", "theme", "sphere", "type", "subtype", "duration", "words", "read",
];

#[derive(Serialize)]
struct Listing<'a> {
    items: &'a [Knowledge],
    total: usize,
}

/// Format records in the specified output format.
#[must_use]
pub fn format_records(items: &[Knowledge], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(items),
        OutputFormat::Table => format_table(items),
        OutputFormat::Markdown => format_markdown(items),
    }
}

fn format_json(items: &[Knowledge]) -> String {
    let listing = Listing {
        items,
        total: items.len(),
    };
    serde_json::to_string_pretty(&listing).unwrap_or_else(|_| "{}".to_string())
}

fn cells(k: &Knowledge) -> [String; 10] {
    let r = &k.record;
    [
        k.id.clone(),
        r.name.clone(),
        r.link.clone(),
        r.theme.clone(),
        r.sphere.clone(),
        r.knowledge_type.clone(),
        r.subtype.clone(),
        r.duration.to_string(),
        r.word_count.to_string(),
        if k.is_read { "yes" } else { "no" }.to_string(),
    ]
}

/// Display width in characters, so Cyrillic text aligns.
fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad(s: &str, w: usize) -> String {
    format!("{s}{}", " ".repeat(w.saturating_sub(width(s))))
}

fn format_table(items: &[Knowledge]) -> String {
    if items.is_empty() {
        return "(no results)".to_string();
    }

    let rows: Vec<[String; 10]> = items.iter().map(cells).collect();

    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| width(c)).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(width(cell));
        }
    }

    let mut output = String::new();

    // Header
    let header: Vec<String> = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, c)| pad(c, widths[i]))
        .collect();
    output.push_str(&header.join(" | "));
    output.push('\n');

    // Separator
    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&sep.join("-+-"));
    output.push('\n');

    // Rows
    for row in &rows {
        let vals: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths[i]))
            .collect();
        output.push_str(&vals.join(" | "));
        output.push('\n');
    }

    output
}

fn format_markdown(items: &[Knowledge]) -> String {
    if items.is_empty() {
        return "*No results*\n".to_string();
    }

    let mut output = String::new();

    // Header
    output.push_str("| ");
    output.push_str(&COLUMNS.join(" | "));
    output.push_str(" |\n");

    // Separator
    output.push_str("| ");
    let seps: Vec<&str> = COLUMNS.iter().map(|_| "---").collect();
    output.push_str(&seps.join(" | "));
    output.push_str(" |\n");

    // Rows
    for k in items {
        let vals: Vec<String> = cells(k).iter().map(|c| c.replace('|', "\\|")).collect();
        output.push_str("| ");
        output.push_str(&vals.join(" | "));
        output.push_str(" |\n");
    }

    output
}
