use std::time::Duration;

use thirtyfour::error::WebDriverError;
use thirtyfour::Key;
use thiserror::Error;

use crate::configuration::SearchSettings;
use crate::dal::checkpoint_store::CheckpointStore;
use crate::domain::posting::ScoredPosting;
use crate::selectors;
use crate::services::droid::{Droid, WebDriverProbe};
use crate::services::probe::{PageProbe, ProbeError, DEFAULT_TIMEOUT};

/// Scores at or above this are worth reaching out for.
pub const OUTREACH_SCORE_THRESHOLD: u8 = 8;

const STEP_SETTLE: Duration = Duration::from_secs(1);
const NAVIGATION_SETTLE: Duration = Duration::from_secs(2);
/// Courtesy delay between connection requests.
const CONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum OutreachError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("webdriver error: {0}")]
    Driver(#[from] WebDriverError),
    #[error("{0} not found during outreach")]
    MissingElement(&'static str),
}

#[derive(Debug, Default)]
pub struct OutreachStats {
    pub postings: usize,
    pub contacted: usize,
    pub failed: usize,
}

/// Someone surfaced by the people search, identified by their profile URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub name: String,
    pub profile_url: String,
}

/// Scored postings worth contacting people about, in stable key order.
pub fn qualifying_postings(store: &CheckpointStore) -> Vec<&ScoredPosting> {
    store
        .scored()
        .values()
        .filter(|scored| scored.match_score >= OUTREACH_SCORE_THRESHOLD)
        .collect()
}

/// Instantiate the configured connection-note template for one recipient.
/// Supported placeholders: `{name}`, `{company_name}` and `{job_title}`.
pub fn render_connection_message(
    template: &str,
    person_name: &str,
    scored: &ScoredPosting,
) -> String {
    template
        .replace("{name}", person_name)
        .replace("{company_name}", &scored.posting.company_name)
        .replace("{job_title}", &scored.posting.title)
}

/// For every qualifying posting, search people at the posting's company
/// holding its role and send each a connection request with the templated
/// note. A failing posting or recipient is logged and skipped; only driver
/// faults during navigation abort the run.
pub async fn run_outreach(
    droid: &Droid,
    probe: &WebDriverProbe,
    settings: &SearchSettings,
    store: &CheckpointStore,
) -> Result<OutreachStats, OutreachError> {
    let mut stats = OutreachStats::default();

    let postings: Vec<ScoredPosting> = qualifying_postings(store).into_iter().cloned().collect();
    log::info!(
        "Found {} postings scoring at least {}/10",
        postings.len(),
        OUTREACH_SCORE_THRESHOLD
    );

    for scored in &postings {
        stats.postings += 1;
        log::info!(
            "Outreach for: {} at {} ({}/10)",
            scored.posting.title,
            scored.posting.company_name,
            scored.match_score
        );

        let people = match find_people(droid, probe, scored).await {
            Ok(people) => people,
            Err(e) => {
                log::error!(
                    "People search failed for {}: {}",
                    scored.posting.company_name,
                    e
                );
                continue;
            }
        };
        if people.is_empty() {
            log::warn!("No people found for job: {}", scored.posting.title);
            continue;
        }

        for person in &people {
            let message =
                render_connection_message(&settings.custom_message, &person.name, scored);
            match send_connection_request(droid, probe, person, &message).await {
                Ok(()) => {
                    stats.contacted += 1;
                    log::info!("Sent connection request to {}", person.name);
                }
                Err(e) => {
                    stats.failed += 1;
                    log::error!("Failed to send connection request to {}: {}", person.name, e);
                }
            }
            probe.settle(CONNECT_DELAY).await;
        }
    }

    Ok(stats)
}

/// Run the people search for one posting: keywords are the job title, the
/// current-company filter is the posting's company.
async fn find_people(
    droid: &Droid,
    probe: &WebDriverProbe,
    scored: &ScoredPosting,
) -> Result<Vec<Person>, OutreachError> {
    droid.driver.goto(selectors::PEOPLE_SEARCH_URL).await?;
    probe.settle(NAVIGATION_SETTLE).await;

    let keyword_input = probe
        .wait_present(&selectors::people_keyword_input(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("keyword input"))?;
    keyword_input.clear().await?;
    keyword_input.send_keys(&scored.posting.title).await?;
    probe.settle(STEP_SETTLE).await;
    keyword_input.send_keys(Key::Enter + "").await?;
    probe.settle(NAVIGATION_SETTLE).await;

    let filter_button = probe
        .wait_clickable(&selectors::company_filter_button(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("company filter button"))?;
    filter_button.click().await?;
    probe.settle(STEP_SETTLE).await;

    let company_input = probe
        .wait_present(&selectors::company_filter_input(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("company input"))?;
    company_input.clear().await?;
    company_input.send_keys(&scored.posting.company_name).await?;
    // Suggestions take a moment to populate.
    probe.settle(NAVIGATION_SETTLE).await;

    let suggestion = probe
        .wait_clickable(&selectors::company_filter_suggestion(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("company suggestion"))?;
    suggestion.click().await?;
    probe.settle(STEP_SETTLE).await;

    let apply_button = probe
        .wait_clickable(&selectors::apply_filter_button(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("apply filter button"))?;
    apply_button.click().await?;
    probe.settle(NAVIGATION_SETTLE).await;

    collect_people(probe).await
}

/// Read name and profile URL from each result link. Links missing either
/// field are skipped, not errors.
async fn collect_people(probe: &WebDriverProbe) -> Result<Vec<Person>, OutreachError> {
    let links = probe.find_all(&selectors::people_result_links()).await?;

    let mut people = Vec::new();
    for link in &links {
        let name = probe.read_text(link).await?.trim().to_string();
        let href = probe.read_attribute(link, "href").await?;
        if let Some(profile_url) = href.filter(|_| !name.is_empty()) {
            people.push(Person { name, profile_url });
        }
    }

    Ok(people)
}

async fn send_connection_request(
    droid: &Droid,
    probe: &WebDriverProbe,
    person: &Person,
    message: &str,
) -> Result<(), OutreachError> {
    droid.driver.goto(&person.profile_url).await?;
    probe.settle(NAVIGATION_SETTLE).await;

    let connect_button = probe
        .wait_clickable(&selectors::connect_button(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("connect button"))?;
    connect_button.click().await?;
    probe.settle(STEP_SETTLE).await;

    let add_note_button = probe
        .wait_clickable(&selectors::add_note_button(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("add note button"))?;
    add_note_button.click().await?;
    probe.settle(STEP_SETTLE).await;

    let message_input = probe
        .wait_present(&selectors::connection_message_input(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("message input"))?;
    message_input.send_keys(message).await?;
    probe.settle(STEP_SETTLE).await;

    let send_button = probe
        .wait_clickable(&selectors::send_invitation_button(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .ok_or(OutreachError::MissingElement("send button"))?;
    send_button.click().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{qualifying_postings, render_connection_message, OUTREACH_SCORE_THRESHOLD};
    use crate::dal::checkpoint_store::CheckpointStore;
    use crate::domain::posting::{Posting, ScoredPosting};

    fn scored(n: usize, score: u8) -> ScoredPosting {
        ScoredPosting::new(
            Posting::new(
                format!("Company {}", n),
                format!("https://example.com/company/{}", n),
                format!("Role {}", n),
                format!("https://example.com/jobs/{}", n),
                format!("Description for role {}", n),
            ),
            score,
        )
    }

    #[test]
    fn placeholders_are_substituted() {
        let message = render_connection_message(
            "Hi {name}! I just applied for the {job_title} role at {company_name}.",
            "Alex",
            &scored(0, 9),
        );
        assert_eq!(
            message,
            "Hi Alex! I just applied for the Role 0 role at Company 0."
        );
    }

    #[test]
    fn template_without_placeholders_passes_through() {
        let message =
            render_connection_message("Hello there.", "Alex", &scored(0, OUTREACH_SCORE_THRESHOLD));
        assert_eq!(message, "Hello there.");
    }

    #[test]
    fn only_postings_at_or_above_the_threshold_qualify() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CheckpointStore::create(dir.path(), "20260829_120000").unwrap();

        for (n, score) in [(0, 9), (1, 7), (2, 8), (3, 0)] {
            let s = scored(n, score);
            let id = s.posting.identity();
            store.record_posting(&id, s.posting.clone()).unwrap();
            store.record_scored(&id, s).unwrap();
        }

        let qualifying = qualifying_postings(&store);
        assert_eq!(qualifying.len(), 2);
        assert!(qualifying
            .iter()
            .all(|s| s.match_score >= OUTREACH_SCORE_THRESHOLD));
    }
}
