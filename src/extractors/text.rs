//! Text cleanup shared by the site extractors.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());
static FINAL_AND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+and\s+").unwrap());

/// Collapse runs of whitespace (NBSP included) into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// All descendant text of `el`, whitespace-normalized.
pub fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Text of the element itself, ignoring text inside child elements.
pub fn own_text(el: &ElementRef<'_>) -> String {
    let own: String = el
        .children()
        .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
        .collect();
    collapse_whitespace(&own)
}

/// First four-digit run in `s`.
pub fn first_year(s: &str) -> Option<String> {
    YEAR.find(s).map(|m| m.as_str().to_string())
}

/// Trim every name and drop the empty ones.
pub fn clean_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| collapse_whitespace(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect()
}

/// Split a plain comma list (`&` counts as a comma).
pub fn split_comma_list(s: &str) -> Vec<String> {
    clean_names(s.replace('&', ",").split(','))
}

/// Split "A, B and C" style lists: a comma list before the final "and",
/// then the trailing name. A list without "and" is split on commas.
pub fn split_names_with_final_and(s: &str) -> Vec<String> {
    let s = collapse_whitespace(s);
    let last_and = FINAL_AND.find_iter(&s).last();
    match last_and {
        Some(m) => {
            let (head, tail) = (&s[..m.start()], &s[m.end()..]);
            let mut names = clean_names(head.split(','));
            names.extend(clean_names([tail]));
            names
        }
        None => clean_names(s.split(',')),
    }
}

/// The first element sibling after `el` whose tag is `tag`, stopping at the
/// next element of the same kind as `el`.
pub fn next_sibling_element<'a>(el: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let label_tag = el.value().name();
    for sibling in el.next_siblings().filter_map(ElementRef::wrap) {
        let name = sibling.value().name();
        if name == tag {
            return Some(sibling);
        }
        if name == label_tag {
            return None;
        }
    }
    None
}
