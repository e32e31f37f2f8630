use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::UNKNOWN;

static INFOBOX: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.infobox, table.infobox_v2").unwrap());
static BDAY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.bday").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static VALUE_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// First infobox table in document order.
pub fn locate(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&INFOBOX).next()
}

/// Infobox text nodes concatenated as-is.
pub fn summary(doc: &Html) -> String {
    locate(doc)
        .map(|table| table.text().collect::<String>())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// First four-digit run of the infobox `bday` field.
///
/// "c. 1450" style dates are not special-cased and still yield their digits.
pub fn birth_year(doc: &Html) -> String {
    locate(doc)
        .and_then(|table| table.select(&BDAY).next())
        .and_then(|span| {
            let text: String = span.text().collect();
            YEAR_RE.find(&text).map(|m| m.as_str().to_string())
        })
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Value text of the first infobox row whose header mentions "born".
pub fn born_value(doc: &Html) -> Option<String> {
    let table = locate(doc)?;
    table.select(&ROW).find_map(|row| {
        let header = row.select(&HEADER_CELL).next()?;
        if !element_text(header).to_lowercase().contains("born") {
            return None;
        }
        let value = element_text(row.select(&VALUE_CELL).next()?);
        (!value.is_empty()).then_some(value)
    })
}

/// First paragraph with any visible text, whitespace-normalized.
pub fn first_paragraph(doc: &Html) -> String {
    doc.select(&PARAGRAPH)
        .map(element_text)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Text nodes joined by single spaces.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
