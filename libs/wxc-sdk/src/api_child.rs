use crate::session::RestSession;

/// Shared part of every endpoint group: the session and the group's path
/// below the base URL.
#[derive(Clone, Debug)]
pub struct ApiChild {
    session: RestSession,
    base: &'static str,
}

impl ApiChild {
    #[must_use]
    pub fn new(session: RestSession, base: &'static str) -> Self {
        Self { session, base }
    }

    /// URL of `path` inside this group, or of the group itself.
    #[must_use]
    pub fn ep(&self, path: Option<&str>) -> String {
        match path {
            Some(path) => self
                .session
                .ep(&format!("{}/{}", self.base, path.trim_start_matches('/'))),
            None => self.session.ep(self.base),
        }
    }

    #[must_use]
    pub fn session(&self) -> &RestSession {
        &self.session
    }
}
