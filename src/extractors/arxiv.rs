use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{text, ExtractError, FieldStrategies, PageContext, SiteSpec};
use crate::fetch::LoadStrategy;

const BASE_URL: &str = "https://arxiv.org/abs";

static SUBMITTED_ON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Submitted on (\d{1,2} [A-Za-z]+ \d{4})").unwrap());
static OLD_DATELINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:Submitted|v\d+)\s+on\s+(\d{1,2}\s+[A-Za-z]+\s+\d{4})\]").unwrap()
});
static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[v\d+\]\s+\w+,\s+(\d{1,2}\s+[A-Za-z]+\s+\d{4})").unwrap());
static ANY_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2} [A-Za-z]+ \d{4})").unwrap());
static ABSTRACT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*Abstract:\s*").unwrap());

fn page_url(id: &str) -> String {
    format!("{}/{}", BASE_URL, id)
}

pub static SITE: SiteSpec = SiteSpec {
    name: "arxiv",
    load: LoadStrategy::NetworkIdle,
    page_url,
    fields: FieldStrategies {
        date: &[submitted_on, older_dateline, any_dateline_date, citation_date],
        authors: &[author_links, metatable_author_links, citation_authors],
        abstract_text: &[abstract_block, citation_abstract],
    },
};

/// `"11 Oct 2023"` -> `"2023-10"`.
pub fn normalize_date(raw: &str) -> Result<String, ExtractError> {
    let cleaned = text::collapse_whitespace(raw);
    NaiveDate::parse_from_str(&cleaned, "%d %b %Y")
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|source| ExtractError::Date {
            text: cleaned,
            source,
        })
}

fn dateline(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    match ctx.text_of(".dateline")? {
        Some(t) => Ok(Some(t)),
        None => ctx.text_of(".submission-history"),
    }
}

fn date_from(ctx: &PageContext<'_>, re: &Regex) -> Result<Option<String>, ExtractError> {
    let Some(line) = dateline(ctx)? else {
        return Ok(None);
    };
    match re.captures(&line).and_then(|c| c.get(1)) {
        Some(m) => normalize_date(m.as_str()).map(Some),
        None => Ok(None),
    }
}

/// Original submission date, not the latest revision.
fn submitted_on(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    date_from(ctx, &SUBMITTED_ON)
}

fn older_dateline(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    match date_from(ctx, &OLD_DATELINE)? {
        Some(d) => Ok(Some(d)),
        None => date_from(ctx, &VERSION_LINE),
    }
}

fn any_dateline_date(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    let date = date_from(ctx, &ANY_DATE)?;
    if let Some(ref d) = date {
        tracing::info!(id = ctx.id, "Using first date found in dateline: {}", d);
    }
    Ok(date)
}

/// `<meta name="citation_date" content="2023/10/11">`.
fn citation_date(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    let Some(raw) = ctx.meta_values("citation_date")?.into_iter().next() else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&raw, "%Y/%m/%d")
        .map(|d| Some(d.format("%Y-%m").to_string()))
        .map_err(|source| ExtractError::Date { text: raw, source })
}

fn author_links(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(Some(ctx.link_texts(".authors a")?).filter(|a| !a.is_empty()))
}

fn metatable_author_links(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(Some(ctx.link_texts(".metatable .authors a")?).filter(|a| !a.is_empty()))
}

/// Highwire tags list authors as `Last, First`.
fn citation_authors(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    let names: Vec<String> = ctx
        .meta_values("citation_author")?
        .iter()
        .map(|n| match n.split_once(',') {
            Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
            None => n.clone(),
        })
        .collect();
    Ok(Some(text::clean_names(names)).filter(|a| !a.is_empty()))
}

fn abstract_block(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    let Some(el) = ctx.first("blockquote.abstract, .abstract")? else {
        return Ok(None);
    };
    let full = text::element_text(&el);
    let descriptor = el
        .select(&super::selector(".descriptor")?)
        .next()
        .map(|d| text::element_text(&d))
        .unwrap_or_default();
    let body = if descriptor.is_empty() {
        full
    } else {
        full.replacen(&descriptor, "", 1)
    };
    let body = ABSTRACT_PREFIX.replace(&body, "").replace("Abstract:", "");
    let body = body.trim().to_string();
    Ok(Some(body).filter(|b| !b.is_empty()))
}

fn citation_abstract(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(ctx.meta_values("citation_abstract")?.into_iter().next())
}
