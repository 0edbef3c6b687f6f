use super::{bibtex, text, ExtractError, FieldStrategies, PageContext, SiteSpec};
use crate::fetch::LoadStrategy;

const BASE_URL: &str = "https://proceedings.mlr.press";
const BIBTEX: &str = "#bibtex";

fn page_url(id: &str) -> String {
    format!("{}/{}", BASE_URL, id)
}

pub static SITE: SiteSpec = SiteSpec {
    name: "mlr",
    load: LoadStrategy::NetworkIdle,
    page_url,
    fields: FieldStrategies {
        date: &[bibtex_year, info_year],
        authors: &[authors_span, bibtex_authors],
        abstract_text: &[abstract_div, bibtex_abstract],
    },
};

fn bibtex_text(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(ctx.first(BIBTEX)?.map(|el| el.text().collect::<String>()))
}

fn bibtex_year(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(bibtex_text(ctx)?.and_then(|b| bibtex::year(&b)))
}

/// `#info` reads like "Proceedings of ..., PMLR 202:1-10, 2023."
fn info_year(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(ctx.text_of("#info")?.and_then(|t| text::first_year(&t)))
}

/// `<span class="authors">Alice Smith, Bob Lee, Carol Kim</span>`; `&` may
/// separate the last name.
fn authors_span(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(ctx
        .text_of("span.authors")?
        .map(|t| text::split_comma_list(&t))
        .filter(|a| !a.is_empty()))
}

fn bibtex_authors(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(bibtex_text(ctx)?.and_then(|b| bibtex::authors(&b)))
}

fn abstract_div(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    ctx.text_of("#abstract")
}

fn bibtex_abstract(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(bibtex_text(ctx)?.and_then(|b| bibtex::field(&b, "abstract")))
}
