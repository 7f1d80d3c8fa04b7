//! Level and category filtering applied before records are batched

use super::error::{Result, TargetError};
use super::log_level::LogLevel;
use super::raw_record::RawRecord;
use std::fmt;
use std::str::FromStr;

/// Order-preserving predicate over incoming records
pub trait RecordFilter: Send + Sync {
    fn filter(&self, records: Vec<RawRecord>) -> Result<Vec<RawRecord>>;
}

/// Category name, or a prefix when it ends with `*`
///
/// `app.db` matches only `app.db`; `app.*` matches `app.db`, `app.http` and
/// `app.`; `*` alone matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPattern {
    raw: String,
    prefix: Option<String>,
}

impl CategoryPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(TargetError::config("CategoryPattern", "pattern is empty"));
        }

        let (body, wildcard) = match pattern.strip_suffix('*') {
            Some(body) => (body, true),
            None => (pattern, false),
        };
        if body.contains('*') {
            return Err(TargetError::config(
                "CategoryPattern",
                format!("'{}': '*' is only allowed at the end", pattern),
            ));
        }

        Ok(Self {
            raw: pattern.to_string(),
            prefix: wildcard.then(|| body.to_string()),
        })
    }

    pub fn matches(&self, category: &str) -> bool {
        match &self.prefix {
            Some(prefix) => category.starts_with(prefix.as_str()),
            None => category == self.raw,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for CategoryPattern {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CategoryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Default filter: allowed levels, allowed categories, excluded categories
///
/// Empty `levels` or `categories` admit everything.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    levels: Vec<LogLevel>,
    categories: Vec<CategoryPattern>,
    except: Vec<CategoryPattern>,
}

impl MessageFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit only the listed levels
    #[must_use]
    pub fn with_levels<I: IntoIterator<Item = LogLevel>>(mut self, levels: I) -> Self {
        self.levels = levels.into_iter().collect();
        self
    }

    /// Admit `level` and everything more severe
    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.levels = LogLevel::ALL.into_iter().filter(|l| *l >= level).collect();
        self
    }

    /// Admit only categories matching one of the patterns
    pub fn with_categories<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.categories = parse_patterns(patterns)?;
        Ok(self)
    }

    /// Drop categories matching one of the patterns
    pub fn with_except<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.except = parse_patterns(patterns)?;
        Ok(self)
    }

    pub fn accepts(&self, record: &RawRecord) -> bool {
        if !self.levels.is_empty() && !self.levels.contains(&record.level) {
            return false;
        }

        let category = record.category.as_str();
        let included =
            self.categories.is_empty() || self.categories.iter().any(|p| p.matches(category));

        included && !self.except.iter().any(|p| p.matches(category))
    }
}

fn parse_patterns<I, S>(patterns: I) -> Result<Vec<CategoryPattern>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| CategoryPattern::parse(p.as_ref()))
        .collect()
}

impl RecordFilter for MessageFilter {
    fn filter(&self, records: Vec<RawRecord>) -> Result<Vec<RawRecord>> {
        Ok(records.into_iter().filter(|r| self.accepts(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: LogLevel, category: &str) -> RawRecord {
        RawRecord::new("msg", level, category, 0)
    }

    fn categories(records: &[RawRecord]) -> Vec<&str> {
        records.iter().map(|r| r.category.as_str()).collect()
    }

    #[test]
    fn test_pattern_parsing() {
        assert!(CategoryPattern::parse("").is_err());
        assert!(CategoryPattern::parse("app*db").is_err());
        assert!(CategoryPattern::parse("**").is_err());
        assert!(CategoryPattern::parse("app.*").is_ok());
        assert!(CategoryPattern::parse("*").is_ok());
    }

    #[test]
    fn test_pattern_matching() {
        let exact: CategoryPattern = "app.db".parse().unwrap();
        assert!(exact.matches("app.db"));
        assert!(!exact.matches("app.db.query"));

        let prefix: CategoryPattern = "app.*".parse().unwrap();
        assert!(prefix.matches("app.db"));
        assert!(!prefix.matches("application"));

        let all: CategoryPattern = "*".parse().unwrap();
        assert!(all.matches("anything"));
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = MessageFilter::new();
        let records = vec![record(LogLevel::Trace, "a"), record(LogLevel::Fatal, "b")];
        assert_eq!(filter.filter(records).unwrap().len(), 2);
    }

    #[test]
    fn test_level_filtering() {
        let filter = MessageFilter::new().with_levels([LogLevel::Error, LogLevel::Info]);
        let records = vec![
            record(LogLevel::Info, "keep1"),
            record(LogLevel::Debug, "drop"),
            record(LogLevel::Error, "keep2"),
        ];
        assert_eq!(categories(&filter.filter(records).unwrap()), vec!["keep1", "keep2"]);
    }

    #[test]
    fn test_min_level() {
        let filter = MessageFilter::new().with_min_level(LogLevel::Warn);
        assert!(filter.accepts(&record(LogLevel::Fatal, "x")));
        assert!(filter.accepts(&record(LogLevel::Warn, "x")));
        assert!(!filter.accepts(&record(LogLevel::Info, "x")));
    }

    #[test]
    fn test_categories_and_except() {
        let filter = MessageFilter::new()
            .with_categories(["app.*", "audit"])
            .unwrap()
            .with_except(["app.health*"])
            .unwrap();

        let records = vec![
            record(LogLevel::Info, "app.db"),
            record(LogLevel::Info, "app.health.ping"),
            record(LogLevel::Info, "audit"),
            record(LogLevel::Info, "vendor.lib"),
            record(LogLevel::Info, "app.http"),
        ];
        assert_eq!(
            categories(&filter.filter(records).unwrap()),
            vec!["app.db", "audit", "app.http"]
        );
    }

    #[test]
    fn test_malformed_patterns_fail_at_configuration() {
        let result = MessageFilter::new().with_except(["ok", "bad*pattern"]);
        assert!(matches!(result, Err(TargetError::InvalidConfiguration { .. })));
    }
}
