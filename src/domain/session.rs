use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thirtyfour::Cookie;

/// Single-slot credential bundle persisted between runs. Only reusable
/// while `saved_at` is inside the freshness window enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub saved_at: DateTime<Utc>,
    pub cookies: Vec<SessionCookie>,
}

/// Mirror of the WebDriver cookie shape, owned by us so the on-disk format
/// does not depend on the driver crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: Option<bool>,
    pub expiry: Option<i64>,
}

impl From<Cookie> for SessionCookie {
    fn from(cookie: Cookie) -> Self {
        SessionCookie {
            name: cookie.name,
            value: cookie.value,
            domain: cookie.domain,
            path: cookie.path,
            secure: cookie.secure,
            expiry: cookie.expiry,
        }
    }
}

impl SessionCookie {
    pub fn into_cookie(self) -> Cookie {
        let mut cookie = Cookie::new(self.name, self.value);
        cookie.domain = self.domain;
        cookie.path = self.path;
        cookie.secure = self.secure;
        cookie.expiry = self.expiry;
        cookie
    }
}
