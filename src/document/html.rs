// src/document/html.rs
//! Print-style HTML preview. Pure: the same aggregate always yields the
//! same markup, empty sections never appear.

use std::fmt::Write;

use crate::document::layout::{header, printable_sections, Entry};
use crate::types::cv_data::AggregatedCvData;

const STYLE: &str = "body{font-family:Georgia,serif;max-width:800px;margin:0 auto;color:#222}\
h1{margin-bottom:0}h2{border-bottom:1px solid #999;font-size:1.1em;text-transform:uppercase}\
.entry{margin-bottom:.6em}.period{float:right;color:#555}.details{color:#444}\
.contact{color:#555}";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_entry(out: &mut String, entry: &Entry) {
    out.push_str("<div class=\"entry\">");
    if let Some(period) = &entry.period {
        let _ = write!(out, "<span class=\"period\">{}</span>", escape_html(period));
    }
    if !entry.heading.is_empty() {
        let _ = write!(out, "<strong>{}</strong>", escape_html(&entry.heading));
    }
    if !entry.details.is_empty() {
        let details: Vec<String> = entry.details.iter().map(|d| escape_html(d)).collect();
        let _ = write!(
            out,
            "<div class=\"details\">{}</div>",
            details.join(" &middot; ")
        );
    }
    if let Some(description) = &entry.description {
        let _ = write!(out, "<p>{}</p>", escape_html(description));
    }
    out.push_str("</div>");
}

pub fn render_preview(data: &AggregatedCvData) -> String {
    let mut out = String::new();
    let title = data.full_name().unwrap_or_else(|| "Curriculum Vitae".to_string());

    let _ = write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>",
        escape_html(&title),
        STYLE
    );

    if let Some(header) = header(data) {
        out.push_str("<header>");
        let name = match &header.credentials {
            Some(credentials) => format!("{}, {}", header.name, credentials),
            None => header.name.clone(),
        };
        let _ = write!(out, "<h1>{}</h1>", escape_html(&name));
        if let Some(specialty) = &header.specialty {
            let _ = write!(out, "<div class=\"specialty\">{}</div>", escape_html(specialty));
        }
        if !header.contact.is_empty() {
            let contact: Vec<String> = header.contact.iter().map(|c| escape_html(c)).collect();
            let _ = write!(
                out,
                "<div class=\"contact\">{}</div>",
                contact.join(" | ")
            );
        }
        out.push_str("</header>");
    }

    for (key, entries) in printable_sections(data) {
        let _ = write!(out, "<section><h2>{}</h2>", escape_html(key.name()));
        for entry in &entries {
            write_entry(&mut out, entry);
        }
        out.push_str("</section>");
    }

    out.push_str("</body></html>");
    out
}
