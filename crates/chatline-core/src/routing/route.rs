use std::fmt;

/// Views the client can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Chat view at `/`
    Chat,
    /// Login view at `/login`
    Login,
    /// Session history at `/history`
    History,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Chat, Route::Login, Route::History];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Chat => "/",
            Route::Login => "/login",
            Route::History => "/history",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Chat => "chat",
            Route::Login => "login",
            Route::History => "history",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Resolves a navigation target. Query strings and fragments are ignored,
    /// as is a trailing slash.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL
            .into_iter()
            .find(|route| route.path() == normalized)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
