//! Decoration of the server-rendered table markup.

pub const TABLE_ID: &str = "data-table";
pub const TABLE_CLASSES: [&str; 3] = ["table", "table-striped", "table-hover"];

const TABLE_OPEN: &str = "<table";

/// Tags the first `<table>` of server markup with the dashboard id and classes.
pub fn decorate_table_markup(markup: &str) -> String {
    let Some(start) = find_table_open(markup) else {
        return markup.to_string();
    };
    let Some(end) = tag_end(markup, start) else {
        return markup.to_string();
    };
    let attributes = &markup[start + TABLE_OPEN.len()..end];
    let self_closing = attributes.trim_end().ends_with('/');
    let attributes = attributes.trim_end().trim_end_matches('/');

    let mut classes: Vec<String> = attribute_value(attributes, "class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    for class in TABLE_CLASSES {
        if !classes.iter().any(|existing| existing == class) {
            classes.push(class.to_string());
        }
    }

    let mut rest = remove_attribute(attributes, "class");
    rest = remove_attribute(&rest, "id");
    let rest = rest.trim();

    let mut tag = format!(r#"<table id="{TABLE_ID}" class="{}""#, classes.join(" "));
    if !rest.is_empty() {
        tag.push(' ');
        tag.push_str(rest);
    }
    if self_closing {
        tag.push_str(" /");
    }

    format!("{}{}{}", &markup[..start], tag, &markup[end..])
}

/// Start of the first real `<table` tag; `<table-wrapper>` and the like do not count.
fn find_table_open(markup: &str) -> Option<usize> {
    let lower = markup.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    lower
        .match_indices(TABLE_OPEN)
        .map(|(at, _)| at)
        .find(|&at| match bytes.get(at + TABLE_OPEN.len()) {
            Some(next) => next.is_ascii_whitespace() || *next == b'>' || *next == b'/',
            None => false,
        })
}

/// Index of the `>` closing the tag that opens at `start`, skipping quoted values.
fn tag_end(markup: &str, start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &byte) in markup.as_bytes()[start..].iter().enumerate() {
        match quote {
            Some(open) if byte == open => quote = None,
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None if byte == b'>' => return Some(start + offset),
            None => {}
        }
    }
    None
}

/// Span of `name="..."` (or single-quoted) inside a tag's attribute text.
fn attribute_span(attributes: &str, name: &str) -> Option<(usize, usize, usize, usize)> {
    let lower = attributes.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut search_from = 0;
    while let Some(found) = lower[search_from..].find(name) {
        let at = search_from + found;
        search_from = at + name.len();
        let preceded_by_space = at == 0 || bytes[at - 1].is_ascii_whitespace();
        let after = lower[at + name.len()..].trim_start();
        if !preceded_by_space || !after.starts_with('=') {
            continue;
        }
        let value_region = after[1..].trim_start();
        let value_start = lower.len() - value_region.len();
        let quote = value_region.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let close = value_region[1..].find(quote)?;
        let value_end = value_start + 1 + close;
        return Some((at, value_start + 1, value_end, value_end + 1));
    }
    None
}

fn attribute_value<'a>(attributes: &'a str, name: &str) -> Option<&'a str> {
    attribute_span(attributes, name).map(|(_, start, end, _)| &attributes[start..end])
}

fn remove_attribute(attributes: &str, name: &str) -> String {
    match attribute_span(attributes, name) {
        Some((start, _, _, end)) => format!("{}{}", &attributes[..start], &attributes[end..]),
        None => attributes.to_string(),
    }
}
