//! Source-preserving rewrites of edited `fields()` return values.
//!
//! An edited file is printed as its original text with only the returned list
//! replaced. Elements that came from the source keep their original text;
//! synthesized elements are formatted with `prettyplease`.

use proc_macro2::{LineColumn, Span};
use std::ops::Range;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Expr, Token, parse_quote};

use crate::context::MethodPath;
use crate::field::{is_empty_sentinel, is_vec_macro};

const MAX_WIDTH: usize = 100;
const INDENT: &str = "    ";

/// Byte range of an edited return value in the original source.
#[derive(Debug, Clone)]
pub(crate) struct SourceEdit {
    pub(crate) type_name: String,
    pub(crate) path: MethodPath,
    pub(crate) range: Range<usize>,
}

enum Element {
    Original(String),
    Rendered(String),
}

impl Element {
    fn text(&self) -> &str {
        match self {
            Element::Original(text) | Element::Rendered(text) => text,
        }
    }
}

/// Byte range covered by `span` in `source`, or `None` for synthesized tokens.
pub(crate) fn byte_range(source: &str, span: Span) -> Option<Range<usize>> {
    let (start, end) = (span.start(), span.end());
    if (start.line, start.column) >= (end.line, end.column) {
        return None;
    }
    let range = byte_offset(source, start)?..byte_offset(source, end)?;
    (range.start < range.end).then_some(range)
}

fn byte_offset(source: &str, pos: LineColumn) -> Option<usize> {
    let line_start = match pos.line {
        0 => return None,
        1 => 0,
        n => source.match_indices('\n').nth(n - 2)?.0 + 1,
    };
    let rest = &source[line_start..];
    let line = rest.find('\n').map_or(rest, |i| &rest[..i]);
    // Columns count characters, not bytes.
    line.char_indices()
        .map(|(i, _)| i)
        .chain([line.len()])
        .nth(pos.column)
        .map(|col| line_start + col)
}

/// Text replacing `source[range]` with the current return value `expr`.
///
/// Returns `None` when `expr` is neither `Vec::new()` nor a `vec![..]` list.
pub(crate) fn format_fields_list(source: &str, range: Range<usize>, expr: &Expr) -> Option<String> {
    if is_empty_sentinel(expr) {
        return Some("Vec::new()".to_string());
    }
    let Expr::Macro(list) = expr else { return None };
    if !is_vec_macro(list) {
        return None;
    }
    let elems = list
        .mac
        .parse_body_with(Punctuated::<Expr, Token![,]>::parse_terminated)
        .ok()?;
    let elements: Vec<Element> = elems
        .iter()
        .map(|elem| match byte_range(source, elem.span()) {
            Some(r) => Element::Original(source[r].to_string()),
            None => Element::Rendered(render_element(elem)),
        })
        .collect();

    let line_start = source[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[range.end..]
        .find('\n')
        .map_or(source.len(), |i| range.end + i);
    let indent: String = source[line_start..]
        .chars()
        .take_while(|c| matches!(c, ' ' | '\t'))
        .collect();

    let flat = elements.iter().all(|e| !e.text().contains('\n'));
    if flat && !source[range.clone()].contains('\n') {
        let joined = elements.iter().map(Element::text).collect::<Vec<_>>().join(", ");
        let line = format!("vec![{joined}]");
        let width = (range.start - line_start) + line.len() + (line_end - range.end);
        if width <= MAX_WIDTH {
            return Some(line);
        }
    }

    let inner = format!("{indent}{INDENT}");
    let mut out = String::from("vec![\n");
    for element in &elements {
        out.push_str(&inner);
        match element {
            Element::Original(text) => out.push_str(text),
            Element::Rendered(text) => out.push_str(&text.replace('\n', &format!("\n{inner}"))),
        }
        out.push_str(",\n");
    }
    out.push_str(&indent);
    out.push(']');
    Some(out)
}

/// Format a single expression with `prettyplease`, relative to column zero.
fn render_element(expr: &Expr) -> String {
    let file: syn::File = parse_quote!(const _: () = #expr;);
    let text = prettyplease::unparse(&file);
    let body = text.trim_end().trim_end_matches(';');
    let body = body.split_once('=').map_or(body, |(_, rest)| rest);
    let body = body.trim_start_matches(' ');
    let body = body.strip_prefix('\n').unwrap_or(body);
    let strip = body.len() - body.trim_start_matches(' ').len();
    body.lines()
        .map(|line| {
            let leading = line.len() - line.trim_start_matches(' ').len();
            &line[leading.min(strip)..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}
