//! HTML parsing of search-engine result pages.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static RESULT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li.b_algo").expect("valid selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2 a").expect("valid selector"));

/// Max candidate name length, in chars
const MAX_NAME_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    pub name: String,
    pub site: String,
}

/// Extract organic result entries: list items of class "b_algo" holding
/// an "h2 a" anchor. Entries without a name or href are skipped.
pub fn parse_organic_results(html: &str) -> Vec<ResultEntry> {
    let document = Html::parse_document(html);

    let mut entries = vec![];
    for item in document.select(&RESULT_SELECTOR) {
        let Some(anchor) = item.select(&LINK_SELECTOR).next() else {
            continue;
        };

        let name: String = anchor.text().collect::<String>().trim().to_string();
        let name: String = name.chars().take(MAX_NAME_CHARS).collect();
        let site = anchor.attr("href").unwrap_or_default().trim().to_string();

        if name.is_empty() || site.is_empty() {
            continue;
        }

        entries.push(ResultEntry { name, site });
    }

    entries
}
