use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

use super::gazetteer::{find_countries, first_country};
use super::infobox::{born_value, collapse_ws, element_text};
use super::UNKNOWN;

/// How country of origin is read from a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CountryStrategy {
    /// Introductory phrases ("born in X") over the raw markup
    Phrase,
    /// Gazetteer lookup on the infobox "Born" row
    #[default]
    InfoboxRow,
}

/// Result of the pure extraction step. `Link` still needs a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryOutcome {
    Resolved(String),
    Link { href: String, fallback: String },
}

impl CountryOutcome {
    /// Value to use when the link cannot be followed.
    pub fn settle(self) -> String {
        match self {
            CountryOutcome::Resolved(s) => s,
            CountryOutcome::Link { fallback, .. } => fallback,
        }
    }
}

// Checked in order; first non-blank capture wins.
static PHRASES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)born in\s*([^,.]+)",
        r"(?i)from\s*([^,.]+)",
        r"(?i)originally from\s*([^,.]+)",
        r"(?i)raised in\s*([^,.]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CAPITALIZED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][\p{L}.'-]*(?:\s+[A-Z][\p{L}.'-]*)*$").unwrap()
});

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static COUNTRY_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.country-name").unwrap());

pub fn extract(strategy: CountryStrategy, html: &str, doc: &Html) -> CountryOutcome {
    match strategy {
        CountryStrategy::Phrase => from_phrase(html),
        CountryStrategy::InfoboxRow => CountryOutcome::Resolved(from_infobox_row(doc)),
    }
}

/// Span after the first matching introductory phrase.
pub fn from_phrase(html: &str) -> CountryOutcome {
    let Some(captured) = PHRASES.iter().find_map(|re| {
        let span = re.captures(html)?.get(1)?.as_str().trim();
        (!span.is_empty()).then_some(span)
    }) else {
        return CountryOutcome::Resolved(UNKNOWN.to_string());
    };

    if !captured.contains("<a") {
        return CountryOutcome::Resolved(captured.to_string());
    }

    let fragment = Html::parse_fragment(captured);
    let text = collapse_ws(&fragment.root_element().text().collect::<Vec<_>>().join(" "));
    let fallback = if text.is_empty() { UNKNOWN.to_string() } else { text };
    match fragment
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
    {
        Some(href) => CountryOutcome::Link {
            href: href.to_string(),
            fallback,
        },
        None => CountryOutcome::Resolved(fallback),
    }
}

/// `country-name` field of a linked page, if present.
pub fn country_name(linked: &str) -> Option<String> {
    let doc = Html::parse_document(linked);
    let name = element_text(doc.select(&COUNTRY_NAME).next()?);
    (!name.is_empty()).then_some(name)
}

/// Gazetteer match on the "Born" row, then a capitalized-segment guess.
pub fn from_infobox_row(doc: &Html) -> String {
    let Some(born) = born_value(doc) else {
        return UNKNOWN.to_string();
    };
    let found = find_countries(&born);
    if !found.is_empty() {
        debug!(?found, born = %born, "countries in born row");
        if let Some(country) = first_country(&born) {
            return country.to_string();
        }
    }
    born.rsplit(',')
        .map(|seg| seg.trim().trim_matches(|c: char| c == '(' || c == ')').trim())
        .find(|seg| !seg.is_empty() && CAPITALIZED_RE.is_match(seg))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: &str) -> Html {
        Html::parse_document(&format!(
            r#"<table class="infobox"><tr><th>Born</th><td>{value}</td></tr></table>"#
        ))
    }

    #[test]
    fn phrase_plain_text() {
        let out = from_phrase("<p>She was born in Lagos, Nigeria.</p>");
        assert_eq!(out, CountryOutcome::Resolved("Lagos".into()));
    }

    #[test]
    fn phrase_order_beats_position() {
        // "from" appears first in the text, but "born in" is checked first
        let out = from_phrase("Letters from home. He was born in Peru.");
        assert_eq!(out, CountryOutcome::Resolved("Peru".into()));
    }

    #[test]
    fn phrase_with_link() {
        let html = r#"born in <a href="/wiki/Kingdom_of_Italy" title="x">Italy</a>."#;
        match from_phrase(html) {
            CountryOutcome::Link { href, fallback } => {
                assert_eq!(href, "/wiki/Kingdom_of_Italy");
                assert_eq!(fallback, "Italy");
            }
            other => panic!("expected link, got {:?}", other),
        }
    }

    #[test]
    fn phrase_no_match() {
        assert_eq!(from_phrase("").settle(), UNKNOWN);
        assert_eq!(from_phrase("<p>nothing relevant</p>").settle(), UNKNOWN);
    }

    #[test]
    fn country_name_on_linked_page() {
        let page = r#"<div><span class="country-name"> Italy </span></div>"#;
        assert_eq!(country_name(page).as_deref(), Some("Italy"));
        assert_eq!(country_name("<p>none</p>"), None);
    }

    #[test]
    fn infobox_row_gazetteer() {
        assert_eq!(from_infobox_row(&row("June 1, 1926, Los Angeles, California, U.S.")), "United States");
        assert_eq!(from_infobox_row(&row("1879, Ulm, Germany")), "Germany");
        assert_eq!(from_infobox_row(&row("Stratford-upon-Avon, England")), "United Kingdom");
    }

    #[test]
    fn infobox_row_prefers_full_country_name() {
        assert_eq!(from_infobox_row(&row("15 March 1934, Lagos, Nigeria")), "Nigeria");
        assert_eq!(
            from_infobox_row(&row("1950, Santo Domingo, Dominican Republic")),
            "Dominican Republic"
        );
        assert_eq!(from_infobox_row(&row("1960, Bissau, Guinea-Bissau")), "Guinea-Bissau");
    }

    #[test]
    fn infobox_row_capitalized_fallback() {
        assert_eq!(from_infobox_row(&row("3 May 1901, Springfield, Freedonia")), "Freedonia");
    }

    #[test]
    fn infobox_row_missing() {
        assert_eq!(from_infobox_row(&Html::parse_document("<p>x</p>")), UNKNOWN);
        assert_eq!(from_infobox_row(&row("12 03 1901")), UNKNOWN);
    }

    #[test]
    fn strategy_dispatch() {
        let html = r#"<table class="infobox"><tr><th>Born</th><td>Lyon, France</td></tr></table><p>born in Lyon.</p>"#;
        let doc = Html::parse_document(html);
        assert_eq!(extract(CountryStrategy::InfoboxRow, html, &doc).settle(), "France");
        assert_eq!(extract(CountryStrategy::Phrase, html, &doc).settle(), "Lyon");
    }
}
