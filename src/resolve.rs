//! Name resolution from upstream result feeds to roster tokens.

use hashbrown::HashMap;

use crate::{
    results::RaceResult,
    types::{DriverId, RaceId},
};

/// A feed name that could not be mapped to the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    /// The name as the feed delivered it.
    pub name: String,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown driver name: {}", self.name)
    }
}

impl std::error::Error for ResolveError {}

/// Read-only lookup from a free-form feed name to a canonical roster token.
///
/// Injected wherever feed data enters the pool; implementations hold their
/// own data and never mutate shared state.
pub trait DriverResolver {
    /// Resolves one feed name to its canonical token.
    fn resolve(&self, name: &str) -> Result<DriverId, ResolveError>;
}

/// Fixed seasonal roster with layered lookup: manual aliases first, then an
/// exact roster match, then a whitespace/case-normalized match.
#[derive(Debug, Clone, Default)]
pub struct SeasonRoster {
    canonical: Vec<DriverId>,
    aliases: HashMap<String, DriverId>,
}

impl SeasonRoster {
    /// Builds a roster from canonical tokens.
    pub fn new<I, S>(canonical: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<DriverId>,
    {
        Self {
            canonical: canonical.into_iter().map(Into::into).collect(),
            aliases: HashMap::new(),
        }
    }

    /// Adds a manual alias that resolves ahead of roster matching.
    pub fn with_alias(mut self, alias: impl AsRef<str>, canonical: impl Into<DriverId>) -> Self {
        self.aliases.insert(normalize(alias.as_ref()), canonical.into());
        self
    }

    /// Canonical tokens in roster order.
    pub fn tokens(&self) -> &[DriverId] {
        &self.canonical
    }
}

impl DriverResolver for SeasonRoster {
    fn resolve(&self, name: &str) -> Result<DriverId, ResolveError> {
        let normalized = normalize(name);
        if let Some(id) = self.aliases.get(&normalized) {
            return Ok(id.clone());
        }
        if let Some(id) = self.canonical.iter().find(|id| id.as_str() == name) {
            return Ok(id.clone());
        }
        if let Some(id) = self.canonical.iter().find(|id| normalize(id) == normalized) {
            return Ok(id.clone());
        }
        Err(ResolveError {
            name: name.to_string(),
        })
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Top-three finishing names as the upstream feed delivers them for one
/// round. The pool never fetches this itself; an adapter hands it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRace {
    /// Season round the names belong to.
    pub race_id: RaceId,
    /// Main-race top three, finishing order.
    pub podium: [String; 3],
    /// Sprint top three, present only when a sprint was run.
    pub sprint_podium: Option<[String; 3]>,
    /// True when the round pays double points.
    pub double_points: bool,
}

/// Maps a feed record into an official [`RaceResult`] through `resolver`.
pub fn resolve_feed(
    feed: &FeedRace,
    resolver: &impl DriverResolver,
) -> Result<RaceResult, ResolveError> {
    let podium = resolve_three(&feed.podium, resolver)?;
    let sprint_podium = feed
        .sprint_podium
        .as_ref()
        .map(|names| resolve_three(names, resolver))
        .transpose()?;

    Ok(RaceResult {
        race_id: feed.race_id,
        podium: Some(podium),
        sprint_podium,
        double_points: feed.double_points,
        cancelled_main: false,
        cancelled_sprint: false,
    })
}

fn resolve_three(
    names: &[String; 3],
    resolver: &impl DriverResolver,
) -> Result<[DriverId; 3], ResolveError> {
    Ok([
        resolver.resolve(&names[0])?,
        resolver.resolve(&names[1])?,
        resolver.resolve(&names[2])?,
    ])
}
