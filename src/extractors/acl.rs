use super::{bibtex, text, ExtractError, FieldStrategies, PageContext, SiteSpec};
use crate::fetch::LoadStrategy;

const BASE_URL: &str = "https://aclanthology.org";
const BIBTEX: &str = "#citeBibtexContent";

fn page_url(id: &str) -> String {
    format!("{}/{}/", BASE_URL, id)
}

pub static SITE: SiteSpec = SiteSpec {
    name: "acl",
    load: LoadStrategy::NetworkIdle,
    page_url,
    fields: FieldStrategies {
        date: &[year_entry, bibtex_year, year_from_id],
        authors: &[lead_author_links, bibtex_authors],
        abstract_text: &[abstract_span, bibtex_abstract],
    },
};

fn bibtex_text(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(ctx.first(BIBTEX)?.map(|el| el.text().collect::<String>()))
}

/// `<dt>Year:</dt><dd>2024</dd>` in the paper details list.
fn year_entry(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    for dt in ctx.all("dt")? {
        if !text::element_text(&dt).contains("Year:") {
            continue;
        }
        if let Some(dd) = text::next_sibling_element(&dt, "dd") {
            let year = text::element_text(&dd);
            if !year.is_empty() {
                return Ok(Some(year));
            }
        }
    }
    Ok(None)
}

fn bibtex_year(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(bibtex_text(ctx)?.and_then(|b| bibtex::year(&b)))
}

/// Anthology identifiers start with the year, e.g. `2024.acl-long.572`.
fn year_from_id(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(text::first_year(ctx.id))
}

fn lead_author_links(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(Some(ctx.link_texts("p.lead a")?).filter(|a| !a.is_empty()))
}

fn bibtex_authors(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(bibtex_text(ctx)?.and_then(|b| bibtex::authors(&b)))
}

fn abstract_span(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    ctx.text_of("div.acl-abstract span")
}

fn bibtex_abstract(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(bibtex_text(ctx)?.and_then(|b| bibtex::field(&b, "abstract")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER_PAGE: &str = r#"<html><body>
<section id="main">
  <h2 id="title"><a href="https://aclanthology.org/2024.acl-long.572.pdf">Probing Probes</a></h2>
  <p class="lead"><a href="/people/a/alice-smith/">Alice Smith</a>,
    <a href="/people/b/bob-lee/">Bob Lee</a></p>
  <div class="card-body acl-abstract"><h5 class="card-title">Abstract</h5><span>Probes   probe.</span></div>
  <dl>
    <dt>Anthology ID:</dt><dd>2024.acl-long.572</dd>
    <dt>Volume:</dt><dd>Proceedings of ACL</dd>
    <dt>Year:</dt><dd>2024</dd>
  </dl>
</section>
</body></html>"#;

    const BIBTEX_ONLY_PAGE: &str = r#"<html><body>
<pre id="citeBibtexContent">@inproceedings{lee-2022-x,
    title = "X",
    author = "Lee, Bob  and
      Smith, Alice",
    year = "2022",
    abstract = "From the {B}ib{T}e{X} block.",
}</pre>
</body></html>"#;

    #[test]
    fn test_paper_page() {
        let result = SITE.parse_page(PAPER_PAGE, "2024.acl-long.572");
        assert_eq!(result.date.as_deref(), Some("2024"));
        assert_eq!(
            result.authors.unwrap(),
            vec!["Alice Smith".to_string(), "Bob Lee".to_string()]
        );
        assert_eq!(result.abstract_text.as_deref(), Some("Probes probe."));
    }

    #[test]
    fn test_bibtex_fallbacks() {
        let result = SITE.parse_page(BIBTEX_ONLY_PAGE, "2022.emnlp-main.1");
        assert_eq!(result.date.as_deref(), Some("2022"));
        assert_eq!(
            result.authors.unwrap(),
            vec!["Bob Lee".to_string(), "Alice Smith".to_string()]
        );
        assert_eq!(result.abstract_text.as_deref(), Some("From the BibTeX block."));
    }

    #[test]
    fn test_year_from_identifier() {
        let result = SITE.parse_page("<html><body><p>moved</p></body></html>", "2024.acl-long.572");
        assert_eq!(result.date.as_deref(), Some("2024"));
        assert!(result.authors.is_none());
        assert!(result.abstract_text.is_none());
    }

    #[test]
    fn test_canonical_url() {
        assert_eq!(
            (SITE.page_url)("2024.acl-long.572"),
            "https://aclanthology.org/2024.acl-long.572/"
        );
    }
}
