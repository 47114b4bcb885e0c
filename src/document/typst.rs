// src/document/typst.rs
//! Typst source for the printable CV. User text only ever appears inside
//! Typst string literals, so markup characters in it stay inert.

use std::fmt::Write;

use crate::document::layout::{header, printable_sections, Entry};
use crate::types::cv_data::AggregatedCvData;

const PRELUDE: &str = r#"#set page(paper: "us-letter", margin: (x: 2cm, y: 2cm), numbering: "1 / 1")
#set text(font: ("Libertinus Serif", "New Computer Modern"), size: 10.5pt)
#set par(justify: true)

#let cv-section(title) = {
  v(0.8em)
  text(weight: "bold", size: 11pt, upper(title))
  line(length: 100%, stroke: 0.5pt)
}

#let cv-entry(heading: "", details: (), period: none, description: none) = block(breakable: false, below: 0.7em)[
  #grid(columns: (1fr, auto), text(weight: "bold", heading), if period != none { text(fill: luma(80), period) })
  #if details.len() > 0 { text(fill: luma(60), details.join(" · ")) }
  #if description != none { par(description) }
]
"#;

/// Quotes `input` as a Typst string literal.
pub fn typst_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('"');
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn optional(value: Option<&String>) -> String {
    value.map_or_else(|| "none".to_string(), |v| typst_string(v))
}

fn write_entry(out: &mut String, entry: &Entry) {
    let details: Vec<String> = entry.details.iter().map(|d| typst_string(d)).collect();
    // a one-element Typst array needs the trailing comma
    let details = match details.len() {
        0 => "()".to_string(),
        1 => format!("({},)", details[0]),
        _ => format!("({})", details.join(", ")),
    };
    let _ = writeln!(
        out,
        "#cv-entry(heading: {}, details: {}, period: {}, description: {})",
        typst_string(&entry.heading),
        details,
        optional(entry.period.as_ref()),
        optional(entry.description.as_ref()),
    );
}

pub fn render_source(data: &AggregatedCvData) -> String {
    let mut out = String::from(PRELUDE);
    out.push('\n');

    if let Some(header) = header(data) {
        let name = match &header.credentials {
            Some(credentials) => format!("{}, {}", header.name, credentials),
            None => header.name.clone(),
        };
        let _ = writeln!(
            out,
            "#align(center, text(size: 18pt, weight: \"bold\", {}))",
            typst_string(&name)
        );
        if let Some(specialty) = &header.specialty {
            let _ = writeln!(out, "#align(center, text(style: \"italic\", {}))", typst_string(specialty));
        }
        if !header.contact.is_empty() {
            let _ = writeln!(
                out,
                "#align(center, text(size: 9pt, {}))",
                typst_string(&header.contact.join(" | "))
            );
        }
    }

    for (key, entries) in printable_sections(data) {
        let _ = writeln!(out, "\n#cv-section({})", typst_string(key.name()));
        for entry in &entries {
            write_entry(&mut out, entry);
        }
    }

    out
}
