// Site route table
// The seven pages of the studio site and their hash-router paths

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Portfolio,
    About,
    Services,
    Industries,
    Blog,
    Contact,
}

impl Page {
    /// Navigation order used by the header and the mobile menu
    pub const ALL: [Page; 7] = [
        Page::Home,
        Page::Portfolio,
        Page::About,
        Page::Services,
        Page::Industries,
        Page::Blog,
        Page::Contact,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Portfolio => "/portfolio",
            Page::About => "/about",
            Page::Services => "/services",
            Page::Industries => "/industries",
            Page::Blog => "/blog",
            Page::Contact => "/contact",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Portfolio => "Portfolio",
            Page::About => "About",
            Page::Services => "Services",
            Page::Industries => "Industries",
            Page::Blog => "Blog",
            Page::Contact => "Contact",
        }
    }

    /// Resolve a location to a page.
    ///
    /// Accepts plain paths (`/blog`) and hash locations (`#/blog`), ignores a
    /// trailing slash, a query string and letter case. Unknown paths give `None`.
    pub fn from_path(location: &str) -> Option<Page> {
        let path = location.trim();
        let path = path.strip_prefix('#').unwrap_or(path);
        let path = path.split(['?', '#']).next().unwrap_or("");
        let path = path.trim_end_matches('/');
        let path = if path.is_empty() { "/" } else { path };

        Page::ALL
            .into_iter()
            .find(|page| page.path().eq_ignore_ascii_case(path))
    }

    /// Whether a nav link for `self` should be highlighted at `location`
    pub fn is_active(&self, location: &str) -> bool {
        Page::from_path(location) == Some(*self)
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}
