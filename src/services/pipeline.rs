use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::configuration::SearchSettings;
use crate::dal::checkpoint_store::{CheckpointStore, StoreError};
use crate::domain::posting::{Posting, ScoredPosting};
use crate::selectors;
use crate::services::feed::{converge_feed, go_to_next_page, has_next_page, EXPECTED_PAGE_SIZE};
use crate::services::matcher::MatchOracle;
use crate::services::probe::{Locator, Lookup, PageProbe, ProbeError, DEFAULT_TIMEOUT};

/// Settle after clicking a card so the detail pane can load.
const DETAIL_SETTLE: Duration = Duration::from_secs(2);
/// Courtesy delay between successful oracle calls.
const SCORE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct RunStats {
    pub processed: usize,
    pub failed: usize,
    pub pages: usize,
}

#[derive(Debug, Error)]
enum ItemError {
    #[error("missing required {0}")]
    Missing(&'static str),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

enum ItemOutcome {
    Scored,
    ScoreFailed,
    SkippedDuplicate,
}

/// Per-item ingest loop: extract structured fields from the detail view,
/// assign the content identity, checkpoint the raw store, score, checkpoint
/// the scored store. Each step is isolated so a single faulty item can
/// never abort the run; only durability faults propagate.
pub struct IngestScorePipeline<'a, P: PageProbe, O: MatchOracle> {
    probe: &'a P,
    oracle: &'a O,
    settings: &'a SearchSettings,
    checkpoint: CheckpointStore,
}

impl<'a, P: PageProbe, O: MatchOracle> IngestScorePipeline<'a, P, O> {
    pub fn new(
        probe: &'a P,
        oracle: &'a O,
        settings: &'a SearchSettings,
        checkpoint: CheckpointStore,
    ) -> Self {
        IngestScorePipeline {
            probe,
            oracle,
            settings,
            checkpoint,
        }
    }

    /// Drive the feed page by page until exhaustion, consuming every item.
    /// Returns the run statistics together with the checkpoint store so the
    /// caller can summarize what was written.
    pub async fn run(mut self) -> Result<(RunStats, CheckpointStore), StoreError> {
        let mut stats = RunStats::default();

        let total_target = self.read_total_count().await;
        match total_target {
            Some(total) => log::info!("Total jobs to process: {}", total),
            None => log::warn!(
                "Could not determine total number of jobs. Will process all available jobs."
            ),
        }
        log::info!(
            "Raw postings will be saved to: {}",
            self.checkpoint.raw_path().display()
        );
        log::info!(
            "Scored postings will be saved to: {}",
            self.checkpoint.scored_path().display()
        );

        let mut page_number = 1;
        'pages: loop {
            log::info!("Processing page {}...", page_number);

            let container = match self
                .probe
                .wait_present(&selectors::jobs_container(), DEFAULT_TIMEOUT)
                .await
            {
                Ok(Lookup::Found(container)) => container,
                Ok(Lookup::TimedOut) => {
                    log::error!("Could not find the jobs container");
                    break;
                }
                Err(e) => {
                    log::error!("Probe fault while locating the jobs container: {}", e);
                    break;
                }
            };

            let count =
                match converge_feed(self.probe, &container, &selectors::job_cards()).await {
                    Ok(count) => count,
                    Err(e) => {
                        log::error!("Probe fault while loading job cards: {}", e);
                        break;
                    }
                };

            // Defensive termination: a broken render must not loop forever.
            if count == 0 {
                log::info!("No job cards found on current page. Ending processing.");
                break;
            }
            stats.pages += 1;

            // Live re-query: elements may have been replaced while scrolling.
            let cards = match self.probe.find_all(&selectors::job_cards()).await {
                Ok(cards) => cards,
                Err(e) => {
                    log::error!("Probe fault while listing job cards: {}", e);
                    break;
                }
            };

            for card in &cards {
                match self.process_card(card).await {
                    Ok(ItemOutcome::Scored) | Ok(ItemOutcome::SkippedDuplicate) => {
                        stats.processed += 1;
                        match total_target {
                            Some(total) => {
                                log::info!("Processed {}/{} jobs", stats.processed, total)
                            }
                            None => log::info!("Processed {} jobs", stats.processed),
                        }
                    }
                    Ok(ItemOutcome::ScoreFailed) => stats.failed += 1,
                    Err(ItemError::Store(e)) => return Err(e),
                    Err(e) => {
                        stats.failed += 1;
                        log::warn!("Skipping job card: {}", e);
                    }
                }

                if let Some(total) = total_target {
                    if stats.processed >= total {
                        log::info!("Reached the reported result total; stopping");
                        break 'pages;
                    }
                }
            }

            let has_next = match has_next_page(self.probe).await {
                Ok(has_next) => has_next,
                Err(e) => {
                    log::error!("Error checking for next page: {}", e);
                    false
                }
            };

            if has_next && count != EXPECTED_PAGE_SIZE {
                log::warn!(
                    "Expected {} cards on a page with a next button, but found {} cards",
                    EXPECTED_PAGE_SIZE,
                    count
                );
            }

            if !has_next {
                break;
            }
            match go_to_next_page(self.probe).await {
                Ok(true) => {}
                Ok(false) => {
                    log::error!("Failed to navigate to next page");
                    break;
                }
                Err(e) => {
                    log::error!("Probe fault while navigating to next page: {}", e);
                    break;
                }
            }
            page_number += 1;
        }

        log::info!("Total jobs processed: {}", stats.processed);
        log::info!("Failed jobs: {}", stats.failed);
        log::info!("Raw postings saved to: {}", self.checkpoint.raw_path().display());
        log::info!(
            "Scored postings saved to: {}",
            self.checkpoint.scored_path().display()
        );

        Ok((stats, self.checkpoint))
    }

    async fn process_card(&mut self, card: &P::Element) -> Result<ItemOutcome, ItemError> {
        self.probe.scroll_into_view(card).await?;
        self.probe.click(card).await?;
        self.probe.settle(DETAIL_SETTLE).await;

        // A posting is only ever created from complete data; identity is
        // never derived from partial fields.
        let (company_name, company_url) = self
            .extract_link(&selectors::company_link())
            .await?
            .ok_or(ItemError::Missing("company information"))?;
        let (title, url) = self
            .extract_link(&selectors::job_title_link())
            .await?
            .ok_or(ItemError::Missing("job title"))?;
        let description = self
            .extract_text(&selectors::job_description())
            .await?
            .ok_or(ItemError::Missing("job description"))?;

        let posting = Posting::new(company_name, company_url, title, url, description);
        let id = posting.identity();

        if self.checkpoint.contains_raw(&id) && !self.settings.rescore_duplicates {
            log::info!("Duplicate posting {}; skipping re-score", &id[..12]);
            return Ok(ItemOutcome::SkippedDuplicate);
        }

        self.checkpoint.record_posting(&id, posting.clone())?;

        log::info!("Scoring job: {} at {}", posting.title, posting.company_name);
        match self.oracle.score(&posting.description).await {
            Ok(score) => {
                self.checkpoint
                    .record_scored(&id, ScoredPosting::new(posting, score))?;
                log::info!("Score: {}/10", score);
                self.probe.settle(SCORE_DELAY).await;
                Ok(ItemOutcome::Scored)
            }
            Err(e) => {
                // The item stays in the raw store unscored; no in-run retry.
                log::error!("Error scoring job {}: {}", &id[..12], e);
                Ok(ItemOutcome::ScoreFailed)
            }
        }
    }

    async fn extract_link(
        &self,
        locator: &Locator,
    ) -> Result<Option<(String, String)>, ProbeError> {
        match self.probe.wait_present(locator, DEFAULT_TIMEOUT).await? {
            Lookup::Found(element) => {
                let text = self.probe.read_text(&element).await?.trim().to_string();
                let href = self.probe.read_attribute(&element, "href").await?;
                Ok(href.filter(|_| !text.is_empty()).map(|href| (text, href)))
            }
            Lookup::TimedOut => Ok(None),
        }
    }

    async fn extract_text(&self, locator: &Locator) -> Result<Option<String>, ProbeError> {
        match self.probe.wait_present(locator, DEFAULT_TIMEOUT).await? {
            Lookup::Found(element) => Ok(Some(self.probe.read_text(&element).await?)),
            Lookup::TimedOut => Ok(None),
        }
    }

    async fn read_total_count(&self) -> Option<usize> {
        let element = self
            .probe
            .wait_present(&selectors::results_count(), DEFAULT_TIMEOUT)
            .await
            .ok()?
            .found()?;
        let text = self.probe.read_text(&element).await.ok()?;
        parse_results_count(&text)
    }
}

/// Parse the total out of a results subtitle like "1,229 results".
pub fn parse_results_count(text: &str) -> Option<usize> {
    text.split_whitespace().next()?.replace(',', "").parse().ok()
}

/// Resumption mode: reopen the latest raw checkpoint and score only the
/// postings that never made it into the scored store.
pub async fn rescore_latest<O: MatchOracle>(
    oracle: &O,
    data_dir: &Path,
) -> Result<RunStats, StoreError> {
    let Some(mut store) = CheckpointStore::open_latest(data_dir)? else {
        log::warn!("No job posting files found under {}", data_dir.display());
        return Ok(RunStats::default());
    };

    log::info!("Processing jobs from: {}", store.raw_path().display());
    let mut stats = RunStats::default();

    for id in store.unscored_ids() {
        let posting = store.raw()[&id].clone();
        log::info!("Scoring job: {} at {}", posting.title, posting.company_name);

        match oracle.score(&posting.description).await {
            Ok(score) => {
                store.record_scored(&id, ScoredPosting::new(posting, score))?;
                stats.processed += 1;
                log::info!("Score: {}/10", score);
                tokio::time::sleep(SCORE_DELAY).await;
            }
            Err(e) => {
                stats.failed += 1;
                log::error!("Error scoring job {}: {}", &id[..12], e);
            }
        }
    }

    log::info!(
        "Finished scoring jobs. Results saved to {}",
        store.scored_path().display()
    );
    Ok(stats)
}
