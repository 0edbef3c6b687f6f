//! Field reader for BibTeX blocks embedded in proceedings pages.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{clean_names, collapse_whitespace};

static FIELD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s,{])(\w+)\s*=\s*").unwrap());

/// Value of `field` in `bibtex`, with inner braces removed and whitespace
/// collapsed. Handles `{...}` (nested), `"..."` and bare values. Field names
/// match case-insensitively.
pub fn field(bibtex: &str, name: &str) -> Option<String> {
    let start = FIELD_START
        .captures_iter(bibtex)
        .find(|c| c[1].eq_ignore_ascii_case(name))?
        .get(0)?
        .end();
    let raw = read_value(&bibtex[start..])?;
    let value = collapse_whitespace(&raw.replace(['{', '}'], ""));
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn read_value(rest: &str) -> Option<&str> {
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    match first {
        '{' => {
            let mut depth = 1usize;
            for (i, c) in chars {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(&rest[1..i]);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        '"' => {
            let mut depth = 0usize;
            for (i, c) in chars {
                match c {
                    '{' => depth += 1,
                    '}' => depth = depth.saturating_sub(1),
                    '"' if depth == 0 => return Some(&rest[1..i]),
                    _ => {}
                }
            }
            None
        }
        _ => {
            let end = rest
                .find(|c: char| c == ',' || c == '}' || c == '\n')
                .unwrap_or(rest.len());
            Some(rest[..end].trim())
        }
    }
}

/// Four-digit `year` of the entry.
pub fn year(bibtex: &str) -> Option<String> {
    field(bibtex, "year").filter(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
}

/// Author list of the entry. Names are separated by `and`; `Last, First`
/// becomes `First Last`. A list with no `and` is split on commas.
pub fn authors(bibtex: &str) -> Option<Vec<String>> {
    let raw = field(bibtex, "author")?;
    let parts = split_on_and(&raw);
    let names = if parts.len() == 1 && raw.matches(',').count() > 1 {
        clean_names(raw.split(','))
    } else {
        clean_names(parts.into_iter().map(reorder_name))
    };
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

fn split_on_and(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(pos) = rest.find(" and ") {
        parts.push(&rest[..pos]);
        rest = &rest[pos + 5..];
    }
    parts.push(rest);
    parts
}

fn reorder_name(name: &str) -> String {
    match name.split_once(',') {
        Some((last, first)) if !first.contains(',') => {
            format!("{} {}", first.trim(), last.trim())
        }
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACL_BIB: &str = r#"@inproceedings{smith-etal-2024-study,
    title = "A Study of {BERT} Probing",
    author = "Smith, Alice  and
      Lee, Bob  and
      M{\"u}ller, Carol",
    booktitle = "Proceedings of the 62nd Annual Meeting",
    year = "2024",
    abstract = "We probe {BERT} and find structure.",
}"#;

    const MLR_BIB: &str = r#"@InProceedings{pmlr-v202-kim23a,
  title = 	 {Scaling {Laws} Revisited},
  author =       {Kim, Dana and Park, Eun},
  booktitle = 	 {Proceedings of the 40th ICML},
  pages = 	 {1--10},
  year = 	 {2023},
  abstract = 	 {We revisit scaling laws. {A}ll of them.}
}"#;

    #[test]
    fn test_quoted_fields() {
        assert_eq!(year(ACL_BIB).as_deref(), Some("2024"));
        assert_eq!(
            field(ACL_BIB, "abstract").as_deref(),
            Some("We probe BERT and find structure.")
        );
        assert_eq!(
            authors(ACL_BIB).unwrap(),
            vec!["Alice Smith", "Bob Lee", "Carol M\\\"uller"]
        );
    }

    #[test]
    fn test_braced_fields() {
        assert_eq!(year(MLR_BIB).as_deref(), Some("2023"));
        assert_eq!(field(MLR_BIB, "title").as_deref(), Some("Scaling Laws Revisited"));
        assert_eq!(
            field(MLR_BIB, "abstract").as_deref(),
            Some("We revisit scaling laws. All of them.")
        );
        assert_eq!(authors(MLR_BIB).unwrap(), vec!["Dana Kim", "Eun Park"]);
    }

    #[test]
    fn test_booktitle_is_not_title() {
        let bib = "@inproceedings{x, booktitle = {Proc}, title = {Real}}";
        assert_eq!(field(bib, "title").as_deref(), Some("Real"));
    }

    #[test]
    fn test_bare_year_and_comma_authors() {
        let bib = "@misc{x, year = 2021, author = {Alice Smith, Bob Lee, Carol Kim}}";
        assert_eq!(year(bib).as_deref(), Some("2021"));
        assert_eq!(authors(bib).unwrap(), vec!["Alice Smith", "Bob Lee", "Carol Kim"]);
    }

    #[test]
    fn test_field_names_ignore_case_and_repeat_lookups() {
        let bib = "@misc{x, Author = {Lee, Ann}, YEAR = {2020}}";
        for _ in 0..3 {
            assert_eq!(year(bib).as_deref(), Some("2020"));
            assert_eq!(authors(bib).unwrap(), vec!["Ann Lee"]);
        }
        assert_eq!(field(bib, "year"), field(bib, "Year"));
    }

    #[test]
    fn test_missing_field() {
        assert!(field(MLR_BIB, "doi").is_none());
        assert!(authors("@misc{x, title = {t}}").is_none());
    }
}
