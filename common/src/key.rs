//! Addressing of one cache file: (symbol, trading date, feed)

use crate::{Feed, Symbol, SymbolError};
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

/// Key of a single cache file. Deterministically maps to
/// `<root>/<exchange>/<symbol>/<yyyy-mm-dd>_<feed>.dat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Instrument identity.
    pub symbol: Symbol,
    /// Trading date.
    pub date: NaiveDate,
    /// Record stream category.
    pub feed: Feed,
}

impl CacheKey {
    /// Key with the feed left unassigned.
    #[must_use]
    pub const fn new(symbol: Symbol, date: NaiveDate) -> Self {
        Self {
            symbol,
            date,
            feed: Feed::Unknown,
        }
    }

    /// Copy with a different feed; addresses "same day, different stream"
    /// without re-parsing anything.
    #[must_use]
    pub const fn with_feed(self, feed: Feed) -> Self {
        Self { feed, ..self }
    }

    /// Copy shifted by whole days; addresses "yesterday's file".
    #[must_use]
    pub fn shift_date(self, days: i64) -> Self {
        let date = self
            .date
            .checked_add_signed(chrono::TimeDelta::days(days))
            .unwrap_or(self.date);
        Self { date, ..self }
    }

    /// Resolve the file path under `root`.
    ///
    /// # Errors
    /// Fails when the feed is still [`Feed::Unknown`].
    pub fn file_path(&self, root: &Path) -> Result<PathBuf, SymbolError> {
        if self.feed == Feed::Unknown {
            return Err(SymbolError::UnknownFeed);
        }
        let mut path = root.join(self.symbol.exchange().to_string());
        path.push(self.symbol.to_string());
        path.push(format!(
            "{}_{}.dat",
            self.date.format("%Y-%m-%d"),
            self.feed.as_str()
        ));
        Ok(path)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {}", self.symbol, self.date, self.feed)
    }
}
