use std::time::Duration;

use scraper::ElementRef;

use super::{text, ExtractError, FieldStrategies, PageContext, SiteSpec};
use crate::fetch::LoadStrategy;

const BASE_URL: &str = "https://openreview.net/forum";

fn page_url(id: &str) -> String {
    format!("{}?id={}", BASE_URL, id)
}

/// The forum is rendered client-side; wait for the forum (or error) container.
pub static SITE: SiteSpec = SiteSpec {
    name: "openreview",
    load: LoadStrategy::ContentLoaded {
        selector: "div.forum-container, div.error-container",
        timeout: Duration::from_secs(20),
    },
    page_url,
    fields: FieldStrategies {
        date: &[forum_meta_date, labelled_date],
        authors: &[forum_author_links, labelled_authors],
        abstract_text: &[note_content_abstract, labelled_abstract],
    },
};

/// The element right after the innermost `div` whose own text contains `label`.
fn labelled_block<'a>(ctx: &'a PageContext<'_>, label: &str) -> Result<Option<ElementRef<'a>>, ExtractError> {
    for el in ctx.all("div")? {
        if text::own_text(&el).contains(label) {
            if let Some(next) = text::next_sibling_element(&el, "div") {
                return Ok(Some(next));
            }
        }
    }
    Ok(None)
}

fn forum_meta_date(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(ctx.text_of(".forum-meta .date")?.and_then(|t| text::first_year(&t)))
}

fn labelled_date(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(labelled_block(ctx, "Date:")?.and_then(|el| text::first_year(&text::element_text(&el))))
}

fn forum_author_links(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(Some(ctx.link_texts(".forum-authors a")?).filter(|a| !a.is_empty()))
}

fn labelled_authors(ctx: &PageContext<'_>) -> Result<Option<Vec<String>>, ExtractError> {
    Ok(labelled_block(ctx, "Authors:")?
        .map(|el| text::clean_names(text::element_text(&el).split(',')))
        .filter(|a| !a.is_empty()))
}

/// `<strong class="note-content-field">Abstract:</strong>` next to its
/// `.note-content-value` inside the same parent.
fn note_content_abstract(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    let value_sel = super::selector(".note-content-value")?;
    for field in ctx.all(".note-content-field")? {
        if !text::element_text(&field).starts_with("Abstract") {
            continue;
        }
        let Some(parent) = field.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if let Some(value) = parent.select(&value_sel).next() {
            let abstract_text = text::element_text(&value);
            if !abstract_text.is_empty() {
                return Ok(Some(abstract_text));
            }
        }
    }
    Ok(None)
}

fn labelled_abstract(ctx: &PageContext<'_>) -> Result<Option<String>, ExtractError> {
    Ok(labelled_block(ctx, "Abstract:")?
        .map(|el| text::element_text(&el))
        .filter(|t| !t.is_empty()))
}
