use anyhow::Context;
use chrono::Utc;
use env_logger::Env;
use pursuit::{
    configuration::{get_configuration, Configuration, SearchSettings},
    dal::{checkpoint_store::CheckpointStore, session_store::SessionStore},
    services::{
        establish_session, open_job_search, qualifying_postings, rescore_latest, run_outreach,
        Droid, IngestScorePipeline, JobMatcher, OUTREACH_SCORE_THRESHOLD,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    match std::env::args().nth(1).as_deref() {
        Some("rescore") => run_rescore(configuration).await,
        Some("outreach") => run_outreach_mode(configuration).await,
        _ => run_crawl(configuration).await,
    }
}

async fn run_crawl(configuration: Configuration) -> anyhow::Result<()> {
    let settings = SearchSettings::load(&configuration.storage.settings_file)
        .context("Invalid settings file")?;
    let matcher = build_matcher(&configuration, &settings);
    let session_store = SessionStore::new(&configuration.storage.session_file);

    let run_timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let checkpoint = CheckpointStore::create(&configuration.storage.data_dir, &run_timestamp)?;

    // Browser acquisition failure is a hard stop; nothing has been written
    // beyond the (empty) checkpoint files.
    let droid = Droid::new(
        &configuration.application.webdriver_url,
        configuration.application.headless,
    )
    .await
    .context("Failed to start browser session")?;

    // The stores flush after every item, so an interrupt loses at most the
    // item in flight; the browser is released on every exit path below.
    let outcome = tokio::select! {
        outcome = crawl_session(
            &droid,
            &configuration,
            &settings,
            &matcher,
            &session_store,
            checkpoint,
        ) => outcome,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted; shutting down");
            Ok(())
        }
    };

    if let Err(e) = droid.quit().await {
        log::error!("Error while closing browser: {}", e);
    }

    outcome
}

async fn crawl_session(
    droid: &Droid,
    configuration: &Configuration,
    settings: &SearchSettings,
    matcher: &JobMatcher,
    session_store: &SessionStore,
    checkpoint: CheckpointStore,
) -> anyhow::Result<()> {
    let probe = droid.probe();

    establish_session(droid, &probe, &configuration.credentials, session_store)
        .await
        .context("Authentication failed")?;

    open_job_search(droid, &probe, settings)
        .await
        .context("Job search setup failed")?;

    let pipeline = IngestScorePipeline::new(&probe, matcher, settings, checkpoint);
    let (stats, store) = pipeline.run().await?;

    log::info!(
        "Run complete: {} pages, {} jobs processed, {} failed",
        stats.pages,
        stats.processed,
        stats.failed
    );
    let worth_contacting = qualifying_postings(&store).len();
    if worth_contacting > 0 {
        log::info!(
            "{} postings scored {}/10 or higher; run `pursuit outreach` to contact people there",
            worth_contacting,
            OUTREACH_SCORE_THRESHOLD
        );
    }

    match droid.capture_cookies().await {
        Ok(cookies) => {
            if let Err(e) = session_store.save(cookies) {
                log::warn!("Failed to save session cookies: {}", e);
            }
        }
        Err(e) => log::warn!("Failed to capture session cookies: {}", e),
    }

    Ok(())
}

async fn run_outreach_mode(configuration: Configuration) -> anyhow::Result<()> {
    let settings = SearchSettings::load(&configuration.storage.settings_file)
        .context("Invalid settings file")?;
    if settings.custom_message.is_empty() {
        anyhow::bail!("custom_message must be set in the settings file to run outreach");
    }

    let store = CheckpointStore::open_latest(&configuration.storage.data_dir)?
        .context("No scored job postings found; run a crawl first")?;
    let session_store = SessionStore::new(&configuration.storage.session_file);

    let droid = Droid::new(
        &configuration.application.webdriver_url,
        configuration.application.headless,
    )
    .await
    .context("Failed to start browser session")?;

    let outcome = tokio::select! {
        outcome = outreach_session(&droid, &configuration, &settings, &session_store, &store) => outcome,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted; shutting down");
            Ok(())
        }
    };

    if let Err(e) = droid.quit().await {
        log::error!("Error while closing browser: {}", e);
    }

    outcome
}

async fn outreach_session(
    droid: &Droid,
    configuration: &Configuration,
    settings: &SearchSettings,
    session_store: &SessionStore,
    store: &CheckpointStore,
) -> anyhow::Result<()> {
    let probe = droid.probe();

    establish_session(droid, &probe, &configuration.credentials, session_store)
        .await
        .context("Authentication failed")?;

    let stats = run_outreach(droid, &probe, settings, store).await?;
    log::info!(
        "Outreach complete: {} postings, {} connection requests sent, {} failed",
        stats.postings,
        stats.contacted,
        stats.failed
    );

    match droid.capture_cookies().await {
        Ok(cookies) => {
            if let Err(e) = session_store.save(cookies) {
                log::warn!("Failed to save session cookies: {}", e);
            }
        }
        Err(e) => log::warn!("Failed to capture session cookies: {}", e),
    }

    Ok(())
}

async fn run_rescore(configuration: Configuration) -> anyhow::Result<()> {
    let settings = SearchSettings::load(&configuration.storage.settings_file)
        .context("Invalid settings file")?;
    let matcher = build_matcher(&configuration, &settings);

    let stats = rescore_latest(&matcher, &configuration.storage.data_dir).await?;
    log::info!(
        "Rescore complete: {} jobs scored, {} failed",
        stats.processed,
        stats.failed
    );
    Ok(())
}

fn build_matcher(configuration: &Configuration, settings: &SearchSettings) -> JobMatcher {
    let resume_text = std::fs::read_to_string(&configuration.openai.resume_path)
        .unwrap_or_else(|_| {
            log::warn!(
                "Resume file {} not found; scoring without resume context",
                configuration.openai.resume_path.display()
            );
            String::new()
        });

    JobMatcher::new(
        configuration.openai.api_key.clone(),
        configuration.openai.model.clone(),
        resume_text,
        settings.my_needs.clone(),
    )
}
