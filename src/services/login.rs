use std::time::Duration;

use thirtyfour::error::WebDriverError;
use thiserror::Error;

use crate::configuration::CredentialSettings;
use crate::dal::session_store::SessionStore;
use crate::selectors;
use crate::services::droid::{Droid, WebDriverProbe};
use crate::services::probe::{Lookup, PageProbe, ProbeError, DEFAULT_TIMEOUT};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);
const NAVIGATION_SETTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("webdriver error: {0}")]
    Driver(#[from] WebDriverError),
    #[error("{0} not found during login")]
    MissingElement(&'static str),
    #[error("feed did not load after submitting credentials")]
    NotAuthenticated,
}

/// Get the browser into an authenticated state: first by replaying saved
/// session cookies, falling back to interactive login. Failure here is a
/// hard stop for the run.
pub async fn establish_session(
    droid: &Droid,
    probe: &WebDriverProbe,
    credentials: &CredentialSettings,
    session_store: &SessionStore,
) -> Result<(), LoginError> {
    if let Some(cookies) = session_store.load() {
        if restore_session(droid, probe, cookies).await? {
            log::info!("Restored session from saved cookies");
            return Ok(());
        }
        log::info!("Saved session was rejected by the site; falling back to interactive login");
    }

    login(droid, probe, credentials).await?;
    log::info!("Successfully logged in");
    Ok(())
}

async fn restore_session(
    droid: &Droid,
    probe: &WebDriverProbe,
    cookies: Vec<crate::domain::session::SessionCookie>,
) -> Result<bool, LoginError> {
    // Cookies can only be attached once we are on the right domain.
    droid.driver.goto(selectors::HOME_URL).await?;
    probe.settle(NAVIGATION_SETTLE).await;

    for cookie in cookies {
        if let Err(e) = droid.driver.add_cookie(cookie.into_cookie()).await {
            log::warn!("Failed to add cookie: {}", e);
        }
    }

    droid.driver.refresh().await?;
    probe.settle(NAVIGATION_SETTLE).await;

    let restored = probe
        .wait_present(&selectors::feed_marker(), DEFAULT_TIMEOUT)
        .await?
        .found()
        .is_some();
    Ok(restored)
}

async fn login(
    droid: &Droid,
    probe: &WebDriverProbe,
    credentials: &CredentialSettings,
) -> Result<(), LoginError> {
    droid.driver.goto(selectors::LOGIN_URL).await?;

    let email_field = probe
        .wait_present(&selectors::email_field(), LOGIN_TIMEOUT)
        .await?
        .found()
        .ok_or(LoginError::MissingElement("email field"))?;
    email_field.send_keys(&credentials.email).await?;

    let password_field = probe
        .wait_present(&selectors::password_field(), LOGIN_TIMEOUT)
        .await?
        .found()
        .ok_or(LoginError::MissingElement("password field"))?;
    password_field.send_keys(&credentials.password).await?;

    let submit_button = probe
        .wait_clickable(&selectors::submit_button(), LOGIN_TIMEOUT)
        .await?
        .found()
        .ok_or(LoginError::MissingElement("submit button"))?;
    submit_button.click().await?;

    // The feed marker appearing is what counts as a successful login.
    match probe
        .wait_present(&selectors::feed_marker(), LOGIN_TIMEOUT)
        .await?
    {
        Lookup::Found(_) => Ok(()),
        Lookup::TimedOut => Err(LoginError::NotAuthenticated),
    }
}
