use deckhand_config::{LOGIN_PATH, ROOT_PATH};

/// Navigation targets emitted by workflows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Containers,
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Containers => ROOT_PATH,
            Route::Login => LOGIN_PATH,
        }
    }

    /// The route served at `path`, ignoring a trailing slash.
    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = match path.trim_end_matches('/') {
            "" => ROOT_PATH,
            other => other,
        };
        [Route::Containers, Route::Login]
            .into_iter()
            .find(|route| route.path() == trimmed)
    }
}
