//! Provider session material: cookie jar plus crumb token.

use crate::UtcDateTime;

/// Ordered set of `name=value` cookies.
///
/// Inserting a name that is already present replaces its value in place, so
/// the header keeps the order in which cookies were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn extend<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in pairs {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value for a `Cookie` request header.
    pub fn header_value(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Cookie jar and crumb that authorize quote requests for one run.
///
/// A session is ready once it carries a crumb; [`Session::invalidate`]
/// clears both halves so the next use triggers a fresh negotiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookies: CookieJar,
    crumb: Option<String>,
    valid_since: Option<UtcDateTime>,
}

impl Session {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn established(cookies: CookieJar, crumb: impl Into<String>) -> Self {
        Self {
            cookies,
            crumb: Some(crumb.into()),
            valid_since: Some(UtcDateTime::now()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.crumb.as_deref().is_some_and(|crumb| !crumb.is_empty())
    }

    pub fn invalidate(&mut self) {
        self.cookies = CookieJar::new();
        self.crumb = None;
        self.valid_since = None;
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn cookie_header(&self) -> String {
        self.cookies.header_value()
    }

    pub fn crumb(&self) -> Option<&str> {
        self.crumb.as_deref()
    }

    pub fn valid_since(&self) -> Option<UtcDateTime> {
        self.valid_since
    }
}
