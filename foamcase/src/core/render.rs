//! Deterministic text rendering for [`FoamDocument`]s.
//!
//! Output layout:
//! - banner, `FoamFile` header, separator line
//! - top-level entries separated by a blank line
//! - `key value;` with keys padded to 16 columns, 4-space indentation
//! - nested dictionaries as `key` / `{` / entries / `}`

use std::fmt::Write as _;

use crate::core::dictionary::{Dictionary, FoamDocument, FoamHeader, Value};

const BANNER: &str = "\
/*--------------------------------*- C++ -*----------------------------------*\\
| Generated by foamcase. Manual edits are overwritten on the next build.      |
\\*---------------------------------------------------------------------------*/
";
const SEPARATOR: &str =
    "// * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * //\n";
const FOOTER: &str =
    "// ************************************************************************* //\n";

const INDENT: &str = "    ";
const KEY_WIDTH: usize = 15;

/// Render a full file: banner, header, body, footer.
pub fn render_document(document: &FoamDocument) -> String {
    let mut out = String::new();
    out.push_str(BANNER);
    render_header(&mut out, &document.header);
    out.push_str(SEPARATOR);
    out.push('\n');
    out.push_str(&render_body(&document.body));
    out.push('\n');
    out.push_str(FOOTER);
    out
}

/// Render only the dictionary entries (no banner or header).
pub fn render_body(body: &Dictionary) -> String {
    let mut out = String::new();
    for (key, value) in body.iter() {
        write_entry(&mut out, 0, key, value);
        out.push('\n');
    }
    out
}

fn render_header(out: &mut String, header: &FoamHeader) {
    let pad = INDENT;
    out.push_str("FoamFile\n{\n");
    let _ = writeln!(out, "{pad}{:<11} 2.0;", "version");
    let _ = writeln!(out, "{pad}{:<11} ascii;", "format");
    let _ = writeln!(out, "{pad}{:<11} {};", "class", header.class);
    let _ = writeln!(out, "{pad}{:<11} \"{}\";", "location", header.location);
    let _ = writeln!(out, "{pad}{:<11} {};", "object", header.object);
    out.push_str("}\n");
}

fn write_entry(out: &mut String, depth: usize, key: &str, value: &Value) {
    let pad = INDENT.repeat(depth);
    match value {
        Value::Dict(dict) => {
            let _ = writeln!(out, "{pad}{key}");
            let _ = writeln!(out, "{pad}{{");
            for (child_key, child_value) in dict.iter() {
                write_entry(out, depth + 1, child_key, child_value);
            }
            let _ = writeln!(out, "{pad}}}");
        }
        other => {
            let _ = writeln!(
                out,
                "{pad}{key:<width$} {};",
                render_value(other),
                width = KEY_WIDTH
            );
        }
    }
}

/// Inline rendering of a single value.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Word(word) => word.clone(),
        Value::Number(number) => format_number(*number),
        Value::Dimensions(dims) => {
            let parts: Vec<String> = dims.iter().map(i32::to_string).collect();
            format!("[{}]", parts.join(" "))
        }
        Value::Tagged(keyword, inner) => format!("{keyword} {}", render_value(inner)),
        Value::Tuple(items) => format!("({})", join_values(items)),
        Value::List(items) => format!("{}({})", items.len(), join_values(items)),
        Value::Dict(dict) => {
            let entries: Vec<String> = dict
                .iter()
                .map(|(key, value)| format!("{key} {};", render_value(value)))
                .collect();
            format!("{{ {} }}", entries.join(" "))
        }
    }
}

fn join_values(items: &[Value]) -> String {
    items.iter().map(render_value).collect::<Vec<_>>().join(" ")
}

/// Shortest round-trip form; exponent form outside `[1e-4, 1e15)`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if (1e-4..1e15).contains(&magnitude) {
        format!("{value}")
    } else {
        format!("{value:e}")
    }
}
