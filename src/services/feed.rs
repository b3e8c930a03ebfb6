use std::time::Duration;

use crate::selectors;
use crate::services::probe::{Locator, Lookup, PageProbe, ProbeError, POLL_INTERVAL};

/// Hard cap on scroll iterations so pathological rendering can never spin
/// the crawl forever.
pub const MAX_SCROLL_ATTEMPTS: usize = 50;
/// Fraction of the viewport re-shown after each scroll step so cards that
/// straddle the visible edge are not missed by the count check.
const SCROLL_OVERLAP_RATIO: f64 = 0.20;
/// Tolerance when testing whether the container is scrolled to the bottom.
const BOTTOM_EPSILON: i64 = 5;
/// How long to wait for the first card of a new batch after a scroll.
const NEW_BATCH_TIMEOUT: Duration = Duration::from_secs(2);
/// Quiescence interval: a batch counts as fully landed once one interval
/// passes with no count increase.
const QUIESCENCE_INTERVAL: Duration = Duration::from_secs(2);
/// Settle after clicking through to the next page.
const PAGE_SETTLE: Duration = Duration::from_secs(2);
/// Short probe for the next-page control; absence here is the expected
/// terminal condition, so there is no point waiting the full default.
const NEXT_PAGE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Page size the feed is expected to show on every page that has a next
/// page. A mismatch signals likely mid-scroll item loss.
pub const EXPECTED_PAGE_SIZE: usize = 25;

/// Scroll `container` until no further items are appended, and return the
/// final item count.
///
/// Items render asynchronously in variable-size batches, so "no new item
/// within the poll budget" only means exhaustion once the container is
/// also scrolled to the bottom. Hitting the iteration cap is a soft
/// failure: whatever loaded is treated as final.
///
/// The scroll position is reset to the top before returning, and callers
/// must re-query the live elements afterwards since cards may have been
/// replaced while scrolling.
pub async fn converge_feed<P: PageProbe>(
    probe: &P,
    container: &P::Element,
    item_locator: &Locator,
) -> Result<usize, ProbeError> {
    let mut last_count = probe.find_all(item_locator).await?.len();
    log::info!("Initial number of job cards: {}", last_count);

    let mut exhausted = false;

    for _ in 0..MAX_SCROLL_ATTEMPTS {
        let metrics = probe.scroll_metrics(container).await?;
        let overlap = (metrics.client_height as f64 * SCROLL_OVERLAP_RATIO) as i64;
        let step = metrics.client_height - overlap;
        let target = (metrics.top + step).min(metrics.height);
        probe.scroll_to(container, target).await?;

        match poll_for_growth(probe, item_locator, last_count).await? {
            Some(count) => {
                last_count = count;
                // A batch started landing; keep waiting until one full
                // interval passes with no increase.
                loop {
                    probe.settle(QUIESCENCE_INTERVAL).await;
                    let current = probe.find_all(item_locator).await?.len();
                    if current > last_count {
                        last_count = current;
                        continue;
                    }
                    break;
                }
                log::info!("Loaded batch; total cards now: {}", last_count);
            }
            None => {
                let metrics = probe.scroll_metrics(container).await?;
                if metrics.top + metrics.client_height >= metrics.height - BOTTOM_EPSILON {
                    log::info!("No additional cards detected; bottom reached");
                    exhausted = true;
                    break;
                }
                // Not at the bottom yet, the next stretch simply has not
                // rendered. Scroll further.
            }
        }
    }

    if !exhausted {
        log::warn!(
            "Scroll attempt cap reached with {} cards loaded; treating page as final",
            last_count
        );
    }

    probe.scroll_to(container, 0).await?;
    probe.settle(Duration::from_secs(1)).await;

    Ok(probe.find_all(item_locator).await?.len())
}

async fn poll_for_growth<P: PageProbe>(
    probe: &P,
    item_locator: &Locator,
    last_count: usize,
) -> Result<Option<usize>, ProbeError> {
    let attempts = (NEW_BATCH_TIMEOUT.as_millis() / POLL_INTERVAL.as_millis()).max(1);

    for _ in 0..attempts {
        let count = probe.find_all(item_locator).await?.len();
        if count > last_count {
            return Ok(Some(count));
        }
        probe.settle(POLL_INTERVAL).await;
    }

    Ok(None)
}

/// True only if the next-page control is both present and enabled. A
/// timed-out lookup means the last page, not a fault.
pub async fn has_next_page<P: PageProbe>(probe: &P) -> Result<bool, ProbeError> {
    match probe
        .wait_present(&selectors::next_page_button(), NEXT_PAGE_PROBE_TIMEOUT)
        .await?
    {
        Lookup::Found(button) => probe.is_enabled(&button).await,
        Lookup::TimedOut => {
            log::info!("Reached last page of results");
            Ok(false)
        }
    }
}

/// Click the next-page control and wait a settle interval. Returns whether
/// the control was found and clicked.
pub async fn go_to_next_page<P: PageProbe>(probe: &P) -> Result<bool, ProbeError> {
    match probe
        .wait_clickable(&selectors::next_page_button(), NEXT_PAGE_PROBE_TIMEOUT)
        .await?
    {
        Lookup::Found(button) => {
            probe.scroll_into_view(&button).await?;
            probe.click(&button).await?;
            probe.settle(PAGE_SETTLE).await;
            Ok(true)
        }
        Lookup::TimedOut => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::{converge_feed, go_to_next_page, has_next_page};
    use crate::selectors;
    use crate::services::probe::fake::{FakeCard, FakePage, FakeProbe};
    use crate::services::probe::PageProbe;

    fn cards(n: usize) -> Vec<FakeCard> {
        (0..n).map(FakeCard::valid).collect()
    }

    async fn container(probe: &FakeProbe) -> <FakeProbe as PageProbe>::Element {
        probe
            .wait_present(
                &selectors::jobs_container(),
                std::time::Duration::from_secs(1),
            )
            .await
            .unwrap()
            .found()
            .unwrap()
    }

    #[tokio::test]
    async fn converges_once_all_batches_have_landed() {
        let probe = FakeProbe::new(vec![FakePage {
            cards: cards(25),
            initially_loaded: 5,
            batches: VecDeque::from([10, 10]),
            stream_batches: VecDeque::new(),
            content_height: 2000,
        }]);

        let container = container(&probe).await;
        let count = converge_feed(&probe, &container, &selectors::job_cards())
            .await
            .unwrap();

        assert_eq!(count, 25);
    }

    #[tokio::test]
    async fn container_with_no_scroll_room_converges_immediately() {
        let probe = FakeProbe::new(vec![FakePage::fully_loaded(cards(3))]);

        let container = container(&probe).await;
        let count = converge_feed(&probe, &container, &selectors::job_cards())
            .await
            .unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn quiescence_wait_absorbs_a_batch_still_streaming_in() {
        // One card arrives on scroll, the rest of the batch trickles in
        // while the quiescence interval elapses.
        let probe = FakeProbe::new(vec![FakePage {
            cards: cards(12),
            initially_loaded: 4,
            batches: VecDeque::from([1]),
            stream_batches: VecDeque::from([3, 4]),
            content_height: 1200,
        }]);

        let container = container(&probe).await;
        let count = converge_feed(&probe, &container, &selectors::job_cards())
            .await
            .unwrap();

        assert_eq!(count, 12);
    }

    #[tokio::test]
    async fn iteration_cap_is_a_soft_failure_with_partial_data() {
        // A pathological container that keeps growing one card per scroll
        // and never reaches its bottom.
        let probe = FakeProbe::new(vec![FakePage {
            cards: cards(200),
            initially_loaded: 1,
            batches: VecDeque::from(vec![1; 200]),
            stream_batches: VecDeque::new(),
            content_height: 1_000_000,
        }]);

        let container = container(&probe).await;
        let count = converge_feed(&probe, &container, &selectors::job_cards())
            .await
            .unwrap();

        assert_eq!(count, 1 + super::MAX_SCROLL_ATTEMPTS);
    }

    #[tokio::test]
    async fn next_page_control_state_drives_traversal() {
        let probe = FakeProbe::new(vec![
            FakePage::fully_loaded(cards(25)),
            FakePage::fully_loaded(cards(10)),
        ]);

        assert!(has_next_page(&probe).await.unwrap());
        assert!(go_to_next_page(&probe).await.unwrap());
        // Last page: control present but disabled.
        assert!(!has_next_page(&probe).await.unwrap());
        assert_eq!(probe.go_next_clicks(), 1);
    }
}
