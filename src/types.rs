use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Hash, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ShowId(pub u64);

impl std::fmt::Display for ShowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// TMDB listing the main screen pages through.
#[derive(
    strum::EnumCount,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Clone,
    Copy,
    Default,
    Debug,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShowList {
    #[default]
    Popular,
    TopRated,
    OnTheAir,
    AiringToday,
}

impl ShowList {
    // Path segment under /tv/ in the TMDB v3 API
    pub fn api_value(&self) -> &'static str {
        match self {
            ShowList::Popular => "popular",
            ShowList::TopRated => "top_rated",
            ShowList::OnTheAir => "on_the_air",
            ShowList::AiringToday => "airing_today",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ShowList::Popular => "Popular",
            ShowList::TopRated => "Top rated",
            ShowList::OnTheAir => "On the air",
            ShowList::AiringToday => "Airing today",
        }
    }
}
