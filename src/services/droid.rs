use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::error::WebDriverError;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver, WebElement};

use crate::domain::session::SessionCookie;
use crate::services::probe::{
    Locator, Lookup, PageProbe, ProbeError, ScrollMetrics, POLL_INTERVAL,
};

const SCROLL_METRICS_SCRIPT: &str = "return [Math.round(arguments[0].scrollTop), Math.round(arguments[0].scrollHeight), Math.round(arguments[0].clientHeight)];";
const SCROLL_TO_SCRIPT: &str = "arguments[0].scrollTo(0, arguments[1]);";

/// Owner of the one browser session. Acquired once at startup, released on
/// every exit path by the caller.
pub struct Droid {
    pub driver: WebDriver,
}

impl Droid {
    pub async fn new(webdriver_url: &str, headless: bool) -> Result<Self, WebDriverError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        // Keep rendering and JS timers alive while the window is hidden,
        // otherwise lazy batches stop arriving mid-scroll.
        caps.add_arg("--disable-background-timer-throttling")?;
        caps.add_arg("--disable-backgrounding-occluded-windows")?;
        caps.add_arg("--disable-renderer-backgrounding")?;
        if headless {
            caps.add_arg("--headless=new")?;
        }

        let driver = WebDriver::new(webdriver_url, caps).await?;
        driver.maximize_window().await?;

        Ok(Droid { driver })
    }

    pub fn probe(&self) -> WebDriverProbe {
        WebDriverProbe::new(self.driver.clone())
    }

    pub async fn capture_cookies(&self) -> Result<Vec<SessionCookie>, WebDriverError> {
        let cookies = self.driver.get_all_cookies().await?;
        Ok(cookies.into_iter().map(SessionCookie::from).collect())
    }

    pub async fn quit(self) -> Result<(), WebDriverError> {
        self.driver.quit().await
    }
}

enum ReadyState {
    Present,
    Visible,
    Clickable,
}

/// `PageProbe` backed by a live WebDriver session.
pub struct WebDriverProbe {
    driver: WebDriver,
}

impl WebDriverProbe {
    pub fn new(driver: WebDriver) -> Self {
        WebDriverProbe { driver }
    }

    fn by(locator: &Locator) -> By {
        match locator {
            Locator::Id(id) => By::Id(id.as_str()),
            Locator::XPath(xpath) => By::XPath(xpath.as_str()),
        }
    }

    async fn wait_until_ready(
        &self,
        locator: &Locator,
        timeout: Duration,
        state: ReadyState,
    ) -> Result<Lookup<WebElement>, ProbeError> {
        let attempts = (timeout.as_millis() / POLL_INTERVAL.as_millis()).max(1);

        for _ in 0..attempts {
            if let Ok(element) = self.driver.find(Self::by(locator)).await {
                let ready = match state {
                    ReadyState::Present => true,
                    ReadyState::Visible => element.is_displayed().await.unwrap_or(false),
                    ReadyState::Clickable => element.is_clickable().await.unwrap_or(false),
                };
                if ready {
                    return Ok(Lookup::Found(element));
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        log::debug!("Timed out waiting for element: {}", locator);
        Ok(Lookup::TimedOut)
    }
}

#[async_trait]
impl PageProbe for WebDriverProbe {
    type Element = WebElement;

    async fn wait_present(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Lookup<WebElement>, ProbeError> {
        self.wait_until_ready(locator, timeout, ReadyState::Present)
            .await
    }

    async fn wait_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Lookup<WebElement>, ProbeError> {
        self.wait_until_ready(locator, timeout, ReadyState::Visible)
            .await
    }

    async fn wait_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Lookup<WebElement>, ProbeError> {
        self.wait_until_ready(locator, timeout, ReadyState::Clickable)
            .await
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<WebElement>, ProbeError> {
        Ok(self.driver.find_all(Self::by(locator)).await?)
    }

    async fn click(&self, element: &WebElement) -> Result<(), ProbeError> {
        Ok(element.click().await?)
    }

    async fn read_text(&self, element: &WebElement) -> Result<String, ProbeError> {
        Ok(element.text().await?)
    }

    async fn read_attribute(
        &self,
        element: &WebElement,
        name: &str,
    ) -> Result<Option<String>, ProbeError> {
        Ok(element.attr(name).await?)
    }

    async fn is_enabled(&self, element: &WebElement) -> Result<bool, ProbeError> {
        Ok(element.is_enabled().await?)
    }

    async fn scroll_into_view(&self, element: &WebElement) -> Result<(), ProbeError> {
        Ok(element.scroll_into_view().await?)
    }

    async fn scroll_to(&self, container: &WebElement, y: i64) -> Result<(), ProbeError> {
        self.driver
            .execute(
                SCROLL_TO_SCRIPT,
                vec![container.to_json()?, serde_json::json!(y)],
            )
            .await?;
        Ok(())
    }

    async fn scroll_metrics(&self, container: &WebElement) -> Result<ScrollMetrics, ProbeError> {
        let ret = self
            .driver
            .execute(SCROLL_METRICS_SCRIPT, vec![container.to_json()?])
            .await?;
        let values: Vec<i64> = ret.convert()?;

        match values[..] {
            [top, height, client_height] => Ok(ScrollMetrics {
                top,
                height,
                client_height,
            }),
            _ => Err(ProbeError::Script(format!(
                "expected [top, height, clientHeight], got {:?}",
                values
            ))),
        }
    }

    async fn settle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
