use crate::preferences::Preferences;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Emissions-reporting category of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "Scope 1", alias = "Scope1")]
    Scope1,
    #[serde(rename = "Scope 2", alias = "Scope2")]
    Scope2,
    #[serde(rename = "Scope 3", alias = "Scope3")]
    Scope3,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Scope1, Scope::Scope2, Scope::Scope3];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Scope1 => "Scope 1",
            Scope::Scope2 => "Scope 2",
            Scope::Scope3 => "Scope 3",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope: {0:?}")]
pub struct ParseScopeError(pub String);

impl FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Scope 1" | "Scope1" => Ok(Scope::Scope1),
            "Scope 2" | "Scope2" => Ok(Scope::Scope2),
            "Scope 3" | "Scope3" => Ok(Scope::Scope3),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

/// Either every scope or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScopeFilter {
    #[default]
    All,
    Only(Scope),
}

impl ScopeFilter {
    pub fn matches(self, scope: Scope) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Only(only) => only == scope,
        }
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeFilter::All => f.write_str("All"),
            ScopeFilter::Only(scope) => scope.fmt(f),
        }
    }
}

impl FromStr for ScopeFilter {
    type Err = ParseScopeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim() == "All" {
            return Ok(ScopeFilter::All);
        }
        value.parse().map(ScopeFilter::Only)
    }
}

impl TryFrom<String> for ScopeFilter {
    type Error = ParseScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScopeFilter> for String {
    fn from(filter: ScopeFilter) -> Self {
        filter.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionEntry {
    pub id: u64,
    pub description: String,
    pub scope: Scope,
    /// kg CO2-equivalent.
    pub emission: f64,
    #[serde(with = "date_format")]
    pub date: NaiveDate,
}

/// A candidate entry as handed to the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub description: String,
    pub scope: Scope,
    pub emission: Option<f64>,
    pub date: Option<NaiveDate>,
}

impl EntryDraft {
    /// Evaluates every required field; never stops at the first failure.
    pub fn validate_at(&self, today: NaiveDate) -> FieldErrors {
        FieldErrors {
            description: self.description.trim().is_empty(),
            emission: !matches!(self.emission, Some(value) if value.is_finite() && value >= 0.0),
            date: !matches!(self.date, Some(date) if date <= today),
        }
    }
}

/// Per-field error flags shown next to the form inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FieldErrors {
    pub description: bool,
    pub emission: bool,
    pub date: bool,
}

impl FieldErrors {
    pub fn any(&self) -> bool {
        self.description || self.emission || self.date
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = [
            (self.description, "description"),
            (self.emission, "emission"),
            (self.date, "date"),
        ]
        .into_iter()
        .filter_map(|(flagged, name)| flagged.then_some(name))
        .collect();
        f.write_str(&fields.join(", "))
    }
}

/// Lenient amount parsing for text typed into an input box.
pub fn parse_emission(input: &str) -> Option<f64> {
    let value: f64 = input.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, which is read in local time.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|stamp| stamp.with_timezone(&Local).date_naive())
}

pub mod date_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%d"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {raw}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn into_text(self) -> String {
        match self {
            AmountInput::Number(value) => value.to_string(),
            AmountInput::Text(text) => text,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryRequest {
    pub description: Option<String>,
    pub scope: Option<Scope>,
    pub emission: Option<AmountInput>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub scope: Option<ScopeFilter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub bar_scope: Option<ScopeFilter>,
    pub is_stacked: Option<bool>,
    pub table_filter_scope: Option<ScopeFilter>,
    pub entries_per_page: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    pub month: String,
    #[serde(rename = "Scope 1")]
    pub scope1: f64,
    #[serde(rename = "Scope 2")]
    pub scope2: f64,
    #[serde(rename = "Scope 3")]
    pub scope3: f64,
    pub total: f64,
}

impl MonthlyBucket {
    pub fn scope_total(&self, scope: Scope) -> f64 {
        match scope {
            Scope::Scope1 => self.scope1,
            Scope::Scope2 => self.scope2,
            Scope::Scope3 => self.scope3,
        }
    }

    pub(crate) fn add(&mut self, scope: Scope, emission: f64) {
        match scope {
            Scope::Scope1 => self.scope1 += emission,
            Scope::Scope2 => self.scope2 += emission,
            Scope::Scope3 => self.scope3 += emission,
        }
        self.total += emission;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPage {
    pub entries: Vec<EmissionEntry>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub all_time: f64,
    pub current_month: f64,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub scope: ScopeFilter,
    pub stacked: bool,
    pub months: Vec<MonthlyBucket>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub preferences: Preferences,
    pub notice: Option<String>,
    /// Table page to show after the change.
    pub page: usize,
}
