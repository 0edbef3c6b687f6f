use std::path::Path;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::fetch::SessionShutdown;
use crate::record::{self, PaperRecord};
use crate::update::PaperUpdater;

/// Counts for one pass over the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub updated: usize,
    pub skipped_complete: usize,
    /// False when the output file could not be written.
    pub written: bool,
}

/// Load `input`, update each record in order, write the whole collection to
/// `output`. The session is shut down whatever the outcome.
///
/// Only a failed load is an error; a failed write is logged and reported
/// through [`BatchSummary::written`].
pub async fn run_batch(
    input: &Path,
    output: &Path,
    updater: &PaperUpdater,
    session: &dyn SessionShutdown,
) -> anyhow::Result<BatchSummary> {
    let result = process(input, output, updater).await;
    session.shutdown().await;
    result
}

async fn process(input: &Path, output: &Path, updater: &PaperUpdater) -> anyhow::Result<BatchSummary> {
    let papers = record::load_collection(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let mut summary = BatchSummary {
        total: papers.len(),
        ..BatchSummary::default()
    };
    tracing::info!("Loaded {} papers from {}", summary.total, input.display());

    let pb = ProgressBar::new(papers.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.set_message("Updating papers");

    let mut updated_papers: Vec<PaperRecord> = Vec::with_capacity(papers.len());
    for paper in papers {
        pb.set_message(paper.id());
        if paper.is_complete() {
            summary.skipped_complete += 1;
            updated_papers.push(paper);
            pb.inc(1);
            continue;
        }

        let before = paper.clone();
        let after = updater.update_paper_info(paper).await;
        if after != before {
            summary.updated += 1;
        }
        updated_papers.push(after);
        pb.inc(1);
    }
    pb.finish_and_clear();

    if let Err(e) = record::save_collection(output, &updated_papers) {
        tracing::error!("Failed to write {}: {}", output.display(), e);
        return Ok(summary);
    }
    summary.written = true;

    tracing::info!(
        total = summary.total,
        updated = summary.updated,
        skipped_complete = summary.skipped_complete,
        "Wrote {}",
        output.display()
    );
    Ok(summary)
}
