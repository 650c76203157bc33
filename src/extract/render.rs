use std::fmt::Write;

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    GrabError,
    ResultRow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `[(id, 'sentence', ...), ...]`, the tuple list the mining scripts consume
    #[default]
    Tuples,
    /// JSON array of row objects
    Json,
}

/// Renders all rows as one line of text.
pub fn render(rows: &[ResultRow], format: OutputFormat) -> Result<String, GrabError> {
    let text = match format {
        OutputFormat::Tuples => render_tuples(rows),
        OutputFormat::Json => serde_json::to_string(rows)?,
    };
    Ok(text.replace('\n', ""))
}

pub fn render_tuples(rows: &[ResultRow]) -> String {
    let mut out = String::from("[");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(
            out,
            "({}, {}, {}, {}, {}, {})",
            row.card_id,
            quote(&row.sentence),
            quote(&row.field_a),
            quote(&row.field_b),
            quote(&row.field_c),
            quote(&row.image)
        );
    }
    out.push(']');
    out
}

/// Quotes a string literal: single quotes unless the text holds a `'` and no `"`.
pub fn quote(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') { '"' } else { '\'' };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => {
                let code = c as u32;
                let _ = match code {
                    0..=0xff => write!(out, "\\x{:02x}", code),
                    0x100..=0xffff => write!(out, "\\u{:04x}", code),
                    _ => write!(out, "\\U{:08x}", code),
                };
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Characters a literal may carry as-is: everything except controls, format
/// characters, private use, and separators other than the plain space.
///
/// Unassigned code points are not tracked and pass through unescaped.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !matches!(c,
        // Cc
        '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}'
        // Zs, Zl, Zp
        | '\u{a0}' | '\u{1680}' | '\u{2000}'..='\u{200a}' | '\u{2028}' | '\u{2029}'
        | '\u{202f}' | '\u{205f}' | '\u{3000}'
        // Cf
        | '\u{ad}' | '\u{600}'..='\u{605}' | '\u{61c}' | '\u{6dd}' | '\u{70f}'
        | '\u{890}'..='\u{891}' | '\u{8e2}' | '\u{180e}' | '\u{200b}'..='\u{200f}'
        | '\u{202a}'..='\u{202e}' | '\u{2060}'..='\u{2064}' | '\u{2066}'..='\u{206f}'
        | '\u{feff}' | '\u{fff9}'..='\u{fffb}' | '\u{110bd}' | '\u{110cd}'
        | '\u{13430}'..='\u{1343f}' | '\u{1bca0}'..='\u{1bca3}' | '\u{1d173}'..='\u{1d17a}'
        | '\u{e0001}' | '\u{e0020}'..='\u{e007f}'
        // Co
        | '\u{e000}'..='\u{f8ff}' | '\u{f0000}'..='\u{ffffd}' | '\u{100000}'..='\u{10fffd}'
    )
}
