use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Interval between lookup attempts inside a bounded wait. Waits are
/// attempt-counted (timeout / interval) rather than wall-clock so fakes
/// with no-op settles stay deterministic.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default bounded-wait budget for element lookups.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    Id(String),
    XPath(String),
}

impl Locator {
    pub fn id(s: impl Into<String>) -> Self {
        Locator::Id(s.into())
    }

    pub fn xpath(s: impl Into<String>) -> Self {
        Locator::XPath(s.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(s) => write!(f, "id={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

/// Outcome of a bounded wait. A timeout is expected data, not an error;
/// the caller decides what absence means.
#[derive(Debug)]
pub enum Lookup<E> {
    Found(E),
    TimedOut,
}

impl<E> Lookup<E> {
    pub fn found(self) -> Option<E> {
        match self {
            Lookup::Found(element) => Some(element),
            Lookup::TimedOut => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("webdriver error: {0}")]
    Driver(#[from] thirtyfour::error::WebDriverError),
    #[error("script returned unexpected value: {0}")]
    Script(String),
}

/// Scroll state of a container: scroll offset, full content height and
/// visible viewport height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub top: i64,
    pub height: i64,
    pub client_height: i64,
}

/// Capability interface over the page-automation driver. Every wait blocks
/// the (single) caller until success or a finite timeout; none of them can
/// hang forever.
#[async_trait]
pub trait PageProbe: Send + Sync {
    type Element: Clone + Send + Sync;

    async fn wait_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Lookup<Self::Element>, ProbeError>;

    async fn wait_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Lookup<Self::Element>, ProbeError>;

    async fn wait_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Lookup<Self::Element>, ProbeError>;

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>, ProbeError>;

    async fn click(&self, element: &Self::Element) -> Result<(), ProbeError>;

    async fn read_text(&self, element: &Self::Element) -> Result<String, ProbeError>;

    async fn read_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, ProbeError>;

    async fn is_enabled(&self, element: &Self::Element) -> Result<bool, ProbeError>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<(), ProbeError>;

    /// Scroll a container to an absolute offset.
    async fn scroll_to(&self, container: &Self::Element, y: i64) -> Result<(), ProbeError>;

    async fn scroll_metrics(&self, container: &Self::Element)
        -> Result<ScrollMetrics, ProbeError>;

    /// Fixed settle sleep. Fakes may shorten or skip it.
    async fn settle(&self, duration: Duration);
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory feed used by the convergence, traversal and
    //! pipeline tests. Item batches "render" when the container scrolls
    //! forward (`batches`) or while a settle elapses (`stream_batches`).

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{Locator, Lookup, PageProbe, ProbeError, ScrollMetrics};
    use crate::selectors;

    pub const FAKE_CLIENT_HEIGHT: i64 = 600;

    #[derive(Debug, Clone, PartialEq)]
    pub enum FakeElement {
        Container,
        Card(usize),
        NextButton,
        CompanyLink(usize),
        TitleLink(usize),
        Description(usize),
        ResultsCount,
    }

    #[derive(Debug, Clone, Default)]
    pub struct FakeCard {
        pub company_name: Option<String>,
        pub company_url: Option<String>,
        pub title: Option<String>,
        pub url: Option<String>,
        pub description: Option<String>,
    }

    impl FakeCard {
        pub fn valid(n: usize) -> Self {
            FakeCard {
                company_name: Some(format!("Company {}", n)),
                company_url: Some(format!("https://example.com/company/{}", n)),
                title: Some(format!("Role {}", n)),
                url: Some(format!("https://example.com/jobs/{}", n)),
                description: Some(format!("Description for role {}", n)),
            }
        }

        pub fn missing_description(n: usize) -> Self {
            FakeCard {
                description: None,
                ..FakeCard::valid(n)
            }
        }
    }

    pub struct FakePage {
        pub cards: Vec<FakeCard>,
        pub initially_loaded: usize,
        pub batches: VecDeque<usize>,
        pub stream_batches: VecDeque<usize>,
        pub content_height: i64,
    }

    impl FakePage {
        /// A page whose items are all visible from the start with no
        /// scroll room below the viewport.
        pub fn fully_loaded(cards: Vec<FakeCard>) -> Self {
            let initially_loaded = cards.len();
            FakePage {
                cards,
                initially_loaded,
                batches: VecDeque::new(),
                stream_batches: VecDeque::new(),
                content_height: 500,
            }
        }
    }

    struct FakeState {
        pages: Vec<FakePage>,
        current_page: usize,
        loaded: usize,
        scroll_top: i64,
        selected_card: Option<usize>,
        results_count_text: Option<String>,
        go_next_clicks: usize,
    }

    pub struct FakeProbe {
        state: Mutex<FakeState>,
    }

    impl FakeProbe {
        pub fn new(pages: Vec<FakePage>) -> Self {
            let loaded = pages.first().map(|p| p.initially_loaded).unwrap_or(0);
            FakeProbe {
                state: Mutex::new(FakeState {
                    pages,
                    current_page: 0,
                    loaded,
                    scroll_top: 0,
                    selected_card: None,
                    results_count_text: None,
                    go_next_clicks: 0,
                }),
            }
        }

        pub fn with_results_count(self, text: &str) -> Self {
            self.state.lock().unwrap().results_count_text = Some(text.to_string());
            self
        }

        pub fn go_next_clicks(&self) -> usize {
            self.state.lock().unwrap().go_next_clicks
        }
    }

    impl FakeState {
        fn page(&self) -> &FakePage {
            &self.pages[self.current_page]
        }

        fn card(&self, index: usize) -> &FakeCard {
            &self.pages[self.current_page].cards[index]
        }

        fn has_more_pages(&self) -> bool {
            self.current_page + 1 < self.pages.len()
        }

        fn release_scroll_batch(&mut self) {
            if let Some(batch) = self.pages[self.current_page].batches.pop_front() {
                let total = self.pages[self.current_page].cards.len();
                self.loaded = (self.loaded + batch).min(total);
            }
        }

        fn release_stream_batch(&mut self) {
            if let Some(batch) = self.pages[self.current_page].stream_batches.pop_front() {
                let total = self.pages[self.current_page].cards.len();
                self.loaded = (self.loaded + batch).min(total);
            }
        }

        fn lookup(&self, locator: &Locator) -> Lookup<FakeElement> {
            let Locator::XPath(xpath) = locator else {
                return Lookup::TimedOut;
            };

            match xpath.as_str() {
                selectors::JOBS_CONTAINER => Lookup::Found(FakeElement::Container),
                selectors::NEXT_PAGE_BUTTON => Lookup::Found(FakeElement::NextButton),
                selectors::RESULTS_COUNT => match self.results_count_text {
                    Some(_) => Lookup::Found(FakeElement::ResultsCount),
                    None => Lookup::TimedOut,
                },
                selectors::COMPANY_LINK => match self.selected_card {
                    Some(i) if self.card(i).company_name.is_some() => {
                        Lookup::Found(FakeElement::CompanyLink(i))
                    }
                    _ => Lookup::TimedOut,
                },
                selectors::JOB_TITLE_LINK => match self.selected_card {
                    Some(i) if self.card(i).title.is_some() => {
                        Lookup::Found(FakeElement::TitleLink(i))
                    }
                    _ => Lookup::TimedOut,
                },
                selectors::JOB_DESCRIPTION => match self.selected_card {
                    Some(i) if self.card(i).description.is_some() => {
                        Lookup::Found(FakeElement::Description(i))
                    }
                    _ => Lookup::TimedOut,
                },
                _ => Lookup::TimedOut,
            }
        }
    }

    #[async_trait]
    impl PageProbe for FakeProbe {
        type Element = FakeElement;

        async fn wait_present(
            &self,
            locator: &Locator,
            _timeout: Duration,
        ) -> Result<Lookup<FakeElement>, ProbeError> {
            Ok(self.state.lock().unwrap().lookup(locator))
        }

        async fn wait_visible(
            &self,
            locator: &Locator,
            timeout: Duration,
        ) -> Result<Lookup<FakeElement>, ProbeError> {
            self.wait_present(locator, timeout).await
        }

        async fn wait_clickable(
            &self,
            locator: &Locator,
            timeout: Duration,
        ) -> Result<Lookup<FakeElement>, ProbeError> {
            self.wait_present(locator, timeout).await
        }

        async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, ProbeError> {
            let state = self.state.lock().unwrap();
            if *locator == Locator::xpath(selectors::JOB_CARDS) {
                Ok((0..state.loaded).map(FakeElement::Card).collect())
            } else {
                Ok(vec![])
            }
        }

        async fn click(&self, element: &FakeElement) -> Result<(), ProbeError> {
            let mut state = self.state.lock().unwrap();
            match element {
                FakeElement::Card(i) => state.selected_card = Some(*i),
                FakeElement::NextButton => {
                    if state.has_more_pages() {
                        state.current_page += 1;
                        state.loaded = state.page().initially_loaded;
                        state.scroll_top = 0;
                        state.selected_card = None;
                        state.go_next_clicks += 1;
                    }
                }
                _ => {}
            }
            Ok(())
        }

        async fn read_text(&self, element: &FakeElement) -> Result<String, ProbeError> {
            let state = self.state.lock().unwrap();
            let text = match element {
                FakeElement::CompanyLink(i) => state.card(*i).company_name.clone(),
                FakeElement::TitleLink(i) => state.card(*i).title.clone(),
                FakeElement::Description(i) => state.card(*i).description.clone(),
                FakeElement::ResultsCount => state.results_count_text.clone(),
                _ => None,
            };
            text.ok_or_else(|| ProbeError::Script("no text for element".to_string()))
        }

        async fn read_attribute(
            &self,
            element: &FakeElement,
            name: &str,
        ) -> Result<Option<String>, ProbeError> {
            let state = self.state.lock().unwrap();
            if name != "href" {
                return Ok(None);
            }
            Ok(match element {
                FakeElement::CompanyLink(i) => state.card(*i).company_url.clone(),
                FakeElement::TitleLink(i) => state.card(*i).url.clone(),
                _ => None,
            })
        }

        async fn is_enabled(&self, element: &FakeElement) -> Result<bool, ProbeError> {
            let state = self.state.lock().unwrap();
            Ok(match element {
                FakeElement::NextButton => state.has_more_pages(),
                _ => true,
            })
        }

        async fn scroll_into_view(&self, _element: &FakeElement) -> Result<(), ProbeError> {
            Ok(())
        }

        async fn scroll_to(&self, container: &FakeElement, y: i64) -> Result<(), ProbeError> {
            let mut state = self.state.lock().unwrap();
            if *container == FakeElement::Container {
                let max_top = (state.page().content_height - FAKE_CLIENT_HEIGHT).max(0);
                let clamped = y.clamp(0, max_top);
                if clamped > state.scroll_top {
                    state.release_scroll_batch();
                }
                state.scroll_top = clamped;
            }
            Ok(())
        }

        async fn scroll_metrics(
            &self,
            _container: &FakeElement,
        ) -> Result<ScrollMetrics, ProbeError> {
            let state = self.state.lock().unwrap();
            Ok(ScrollMetrics {
                top: state.scroll_top,
                height: state.page().content_height,
                client_height: FAKE_CLIENT_HEIGHT,
            })
        }

        async fn settle(&self, _duration: Duration) {
            self.state.lock().unwrap().release_stream_batch();
        }
    }
}
