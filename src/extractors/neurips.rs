use std::sync::LazyLock;

use regex::Regex;

use super::{text, ExtractError, FieldStrategies, PageContext, SiteSpec};
use crate::fetch::LoadStrategy;

const BASE_URL: &str = "https://proceedings.neurips.cc/paper";
const CONFERENCE_LINK: &str = r#"a[href*="/paper_files/paper/"]"#;

static NEURIPS_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)NeurIPS\s+(\d{4})").unwrap());
static ID_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})/").unwrap());
static HREF_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/paper_files/paper/(\d{4})/?").unwrap());

fn page_url(id: &str) -> String {
    format!("{}/{}", BASE_URL, id)
}

pub static SITE: SiteSpec = SiteSpec {
    name: "neurips",
    load: LoadStrategy::NetworkIdle,
    page_url,
    fields: FieldStrategies {
        date: &[conference_link_text, year_from_id, conference_link_href],
        authors: &[authors_paragraph],
        abstract_text: &[abstract_paragraph],
    },
};

fn capture(re: &Regex, s: &str) -> Option<String> {
    re.captures(s).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

fn conference_link_text(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(ctx
        .text_of(CONFERENCE_LINK)?
        .and_then(|t| capture(&NEURIPS_YEAR, &t)))
}

/// Identifiers look like `2023/hash/<hash>-Abstract-Conference.html`.
fn year_from_id(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(capture(&ID_YEAR, ctx.id))
}

fn conference_link_href(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(ctx
        .first(CONFERENCE_LINK)?
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| capture(&HREF_YEAR, href)))
}

/// First non-empty `<p>` after the `<h4>` headed `heading`.
fn paragraph_after(ctx: &PageContext<'_>, heading: &str) -> Result<Option<String>, ExtractError> {
    for h4 in ctx.all("h4")? {
        if !text::element_text(&h4).contains(heading) {
            continue;
        }
        let paragraph = h4
            .next_siblings()
            .filter_map(scraper::ElementRef::wrap)
            .take_while(|el| el.value().name() != "h4")
            .filter(|el| el.value().name() == "p")
            .map(|p| text::element_text(&p))
            .find(|t| !t.is_empty());
        if paragraph.is_some() {
            return Ok(paragraph);
        }
    }
    Ok(None)
}

fn authors_paragraph(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(paragraph_after(ctx, "Authors")?
        .map(|t| text::split_names_with_final_and(&t))
        .filter(|a| !a.is_empty()))
}

fn abstract_paragraph(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    paragraph_after(ctx, "Abstract")
}
