//! Locators for the LinkedIn job feed. Everything site-specific lives here
//! so the crawl logic itself stays selector-free.

use crate::services::probe::Locator;

pub const LOGIN_URL: &str = "https://www.linkedin.com/login";
pub const JOBS_URL: &str = "https://www.linkedin.com/jobs/";
pub const HOME_URL: &str = "https://www.linkedin.com";
pub const PEOPLE_SEARCH_URL: &str = "https://www.linkedin.com/search/results/people/";

pub const EMAIL_FIELD_ID: &str = "username";
pub const PASSWORD_FIELD_ID: &str = "password";
pub const SUBMIT_BUTTON: &str = "//button[@type='submit']";
pub const FEED_MARKER: &str = "//a[contains(@href, '/feed/')]";

pub const SEARCH_INPUT: &str =
    "//input[contains(@aria-label, 'Search by title, skill, or company')]";
pub const LOCATION_INPUT: &str = "//input[contains(@aria-label, 'City, state, or zip code')]";
pub const JOB_CARDS: &str =
    "//div[contains(@class, 'job-card-list--underline-title-on-hover')]";
// The scroll sentinel sits directly inside the scrollable results list, so
// its parent is the container we drive.
pub const JOBS_CONTAINER: &str = "//div[@data-results-list-top-scroll-sentinel]/..";
pub const NEXT_PAGE_BUTTON: &str =
    "//button[contains(@class, 'jobs-search-pagination__button--next')]";
pub const RESULTS_COUNT: &str =
    "//div[contains(@class, 'jobs-search-results-list__subtitle')]";

pub const COMPANY_LINK: &str =
    "//div[contains(@class, 'job-details-jobs-unified-top-card__company-name')]//a";
pub const JOB_TITLE_LINK: &str =
    "//div[contains(@class, 'job-details-jobs-unified-top-card__job-title')]//a";
pub const JOB_DESCRIPTION: &str =
    "//div[contains(@class, 'jobs-description-content__text')]";

pub const DATE_POSTED_BUTTON: &str = "//button[contains(@aria-label, 'Date posted filter. Clicking this button displays all Date posted filter options.')]";
pub const APPLY_FILTER_BUTTON: &str = "//button[contains(@class, 'artdeco-button--primary') and contains(@aria-label, 'Apply current filter')]";

pub const PEOPLE_KEYWORD_INPUT: &str =
    "//input[contains(@class, 'search-global-typeahead__input')]";
pub const COMPANY_FILTER_BUTTON: &str =
    "//button[contains(@aria-label, 'Current company filter')]";
pub const COMPANY_FILTER_INPUT: &str = "//input[contains(@aria-label, 'Add a company')]";
pub const COMPANY_FILTER_SUGGESTION: &str =
    "//div[contains(@class, 'search-reusables__collection-values-container')]//label";
pub const PEOPLE_RESULT_LINKS: &str =
    "//ul[contains(@class, 'reusable-search__entity-result-list')]//a[contains(@href, '/in/')]";
pub const CONNECT_BUTTON: &str = "//main//button[contains(@aria-label, 'to connect')]";
pub const ADD_NOTE_BUTTON: &str = "//button[@aria-label='Add a note']";
pub const CONNECTION_MESSAGE_INPUT: &str = "//textarea[@name='message']";
pub const SEND_INVITATION_BUTTON: &str = "//button[@aria-label='Send invitation']";

pub fn email_field() -> Locator {
    Locator::id(EMAIL_FIELD_ID)
}

pub fn password_field() -> Locator {
    Locator::id(PASSWORD_FIELD_ID)
}

pub fn submit_button() -> Locator {
    Locator::xpath(SUBMIT_BUTTON)
}

pub fn feed_marker() -> Locator {
    Locator::xpath(FEED_MARKER)
}

pub fn search_input() -> Locator {
    Locator::xpath(SEARCH_INPUT)
}

pub fn location_input() -> Locator {
    Locator::xpath(LOCATION_INPUT)
}

pub fn job_cards() -> Locator {
    Locator::xpath(JOB_CARDS)
}

pub fn jobs_container() -> Locator {
    Locator::xpath(JOBS_CONTAINER)
}

pub fn next_page_button() -> Locator {
    Locator::xpath(NEXT_PAGE_BUTTON)
}

pub fn results_count() -> Locator {
    Locator::xpath(RESULTS_COUNT)
}

pub fn company_link() -> Locator {
    Locator::xpath(COMPANY_LINK)
}

pub fn job_title_link() -> Locator {
    Locator::xpath(JOB_TITLE_LINK)
}

pub fn job_description() -> Locator {
    Locator::xpath(JOB_DESCRIPTION)
}

pub fn date_posted_button() -> Locator {
    Locator::xpath(DATE_POSTED_BUTTON)
}

pub fn apply_filter_button() -> Locator {
    Locator::xpath(APPLY_FILTER_BUTTON)
}

pub fn filter_label_for(radio_id: &str) -> Locator {
    Locator::xpath(format!("//label[@for='{}']", radio_id))
}

pub fn people_keyword_input() -> Locator {
    Locator::xpath(PEOPLE_KEYWORD_INPUT)
}

pub fn company_filter_button() -> Locator {
    Locator::xpath(COMPANY_FILTER_BUTTON)
}

pub fn company_filter_input() -> Locator {
    Locator::xpath(COMPANY_FILTER_INPUT)
}

pub fn company_filter_suggestion() -> Locator {
    Locator::xpath(COMPANY_FILTER_SUGGESTION)
}

pub fn people_result_links() -> Locator {
    Locator::xpath(PEOPLE_RESULT_LINKS)
}

pub fn connect_button() -> Locator {
    Locator::xpath(CONNECT_BUTTON)
}

pub fn add_note_button() -> Locator {
    Locator::xpath(ADD_NOTE_BUTTON)
}

pub fn connection_message_input() -> Locator {
    Locator::xpath(CONNECTION_MESSAGE_INPUT)
}

pub fn send_invitation_button() -> Locator {
    Locator::xpath(SEND_INVITATION_BUTTON)
}
