use std::time::Duration;

use thirtyfour::error::WebDriverError;
use thirtyfour::Key;
use thiserror::Error;

use crate::configuration::{DatePostedFilter, SearchSettings};
use crate::selectors;
use crate::services::droid::{Droid, WebDriverProbe};
use crate::services::probe::{Locator, Lookup, PageProbe, ProbeError, DEFAULT_TIMEOUT};

const INPUT_SETTLE: Duration = Duration::from_secs(1);
const RESULTS_SETTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("webdriver error: {0}")]
    Driver(#[from] WebDriverError),
    #[error("{0} not found on the jobs page")]
    MissingElement(&'static str),
    #[error("no job cards appeared after the search")]
    NoResults,
}

/// Navigate to the jobs page and run the configured search, optionally
/// applying the date-posted filter. A failing filter is non-fatal; missing
/// search inputs or an empty result feed are.
pub async fn open_job_search(
    droid: &Droid,
    probe: &WebDriverProbe,
    settings: &SearchSettings,
) -> Result<(), SearchError> {
    droid.driver.goto(selectors::JOBS_URL).await?;

    let query = settings.search_query();
    let search_input = probe
        .wait_present(&selectors::search_input(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(SearchError::MissingElement("search input"))?;
    search_input.clear().await?;
    search_input.send_keys(&query).await?;

    let location = settings
        .locations
        .first()
        .map(String::as_str)
        .unwrap_or("Worldwide");
    log::info!("Using location: {}", location);

    let location_input = probe
        .wait_present(&selectors::location_input(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(SearchError::MissingElement("location input"))?;
    // Let the default value populate before replacing it, and let the
    // suggestion list appear before committing.
    probe.settle(INPUT_SETTLE).await;
    location_input.clear().await?;
    location_input.send_keys(location).await?;
    probe.settle(INPUT_SETTLE).await;
    location_input.send_keys(Key::Enter + "").await?;

    if let Some(filter) = settings.date_posted_filter {
        match apply_date_filter(probe, filter).await {
            Ok(()) => {}
            Err(e) => log::warn!(
                "Failed to apply date filter, continuing with unfiltered results: {}",
                e
            ),
        }
    }

    probe.settle(RESULTS_SETTLE).await;

    match probe
        .wait_present(&selectors::job_cards(), DEFAULT_TIMEOUT)
        .await?
    {
        Lookup::Found(_) => {
            log::info!("Successfully found job listings");
            Ok(())
        }
        Lookup::TimedOut => Err(SearchError::NoResults),
    }
}

async fn apply_date_filter(
    probe: &WebDriverProbe,
    filter: DatePostedFilter,
) -> Result<(), SearchError> {
    let dropdown = probe
        .wait_clickable(&selectors::date_posted_button(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(SearchError::MissingElement("date filter button"))?;
    probe.scroll_into_view(&dropdown).await?;
    dropdown.click().await?;
    probe.settle(INPUT_SETTLE).await;

    // The radio input itself is not clickable; its label is.
    let radio = probe
        .wait_present(&Locator::xpath(filter.option_xpath()), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(SearchError::MissingElement("date filter option"))?;
    let radio_id = radio
        .attr("id")
        .await?
        .ok_or(SearchError::MissingElement("date filter option id"))?;
    let label = probe
        .wait_clickable(&selectors::filter_label_for(&radio_id), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(SearchError::MissingElement("date filter label"))?;
    probe.scroll_into_view(&label).await?;
    label.click().await?;
    probe.settle(INPUT_SETTLE).await;

    let apply_button = probe
        .wait_clickable(&selectors::apply_filter_button(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(SearchError::MissingElement("apply filter button"))?;
    probe.scroll_into_view(&apply_button).await?;
    apply_button.click().await?;

    log::info!("Applied date filter: {:?}", filter);
    Ok(())
}
