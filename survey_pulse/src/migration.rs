//! Migration of respondents between their first and their latest answer.
//!
//! The analysis is recomputed from the full set of records each time; nothing
//! is cached. Migrations borrow the records they compare.

use log::{debug, info};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::dates::parse_day_month_year;
use crate::model::SurveyRecord;
use crate::scales::Status;
use crate::schema::SurveyError;

/// Direction of the score between the two endpoints.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Trend {
    Improved,
    Declined,
    Stable,
}

impl Trend {
    pub fn from_delta(delta: f64) -> Trend {
        if delta > 0.0 {
            Trend::Improved
        } else if delta < 0.0 {
            Trend::Declined
        } else {
            Trend::Stable
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trend::Improved => "improved",
            Trend::Declined => "declined",
            Trend::Stable => "stable",
        }
    }
}

impl Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Movement on the status ladder.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum StatusShift {
    Up,
    Down,
    Unchanged,
}

/// A respondent seen in at least two answers, both endpoints scored.
#[derive(PartialEq, Debug, Clone)]
pub struct Migration<'a> {
    pub respondent_id: String,
    /// Name and unit as of the latest answer.
    pub name: String,
    pub unit: String,
    pub oldest: &'a SurveyRecord,
    pub newest: &'a SurveyRecord,
    pub trend: Trend,
    /// Latest score minus first score.
    pub score_delta: f64,
}

impl<'a> Migration<'a> {
    pub fn recovered_detractor(&self) -> bool {
        self.oldest.status == Status::Detractor && self.newest.status != Status::Detractor
    }

    pub fn lost_promoter(&self) -> bool {
        self.oldest.status == Status::Promoter && self.newest.status != Status::Promoter
    }

    pub fn retained_neutral(&self) -> bool {
        self.oldest.status == Status::Neutral && self.newest.status == Status::Neutral
    }

    pub fn status_shift(&self) -> StatusShift {
        match self.newest.status.rank().cmp(&self.oldest.status.rank()) {
            Ordering::Greater => StatusShift::Up,
            Ordering::Less => StatusShift::Down,
            Ordering::Equal => StatusShift::Unchanged,
        }
    }

    /// "Mantido" when the status did not change, otherwise "Old ➝ New".
    pub fn transition_label(&self) -> String {
        if self.oldest.status == self.newest.status {
            "Mantido".to_string()
        } else {
            format!("{} ➝ {}", self.oldest.status, self.newest.status)
        }
    }

    pub fn matches(&self, category: MigrationCategory) -> bool {
        match category {
            MigrationCategory::All => true,
            MigrationCategory::Improved => self.trend == Trend::Improved,
            MigrationCategory::Stable => self.trend == Trend::Stable,
            MigrationCategory::Declined => self.trend == Trend::Declined,
            MigrationCategory::RecoveredDetractor => self.recovered_detractor(),
            MigrationCategory::LostPromoter => self.lost_promoter(),
            MigrationCategory::RetainedNeutral => self.retained_neutral(),
        }
    }
}

/// Aggregate counts, always over the unfiltered migrations.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MigrationCounts {
    pub recovered_detractors: usize,
    pub lost_promoters: usize,
    pub retained_neutrals: usize,
    pub improved: usize,
    pub declined: usize,
    pub stable: usize,
    /// Number of comparable pairs.
    pub total: usize,
}

impl MigrationCounts {
    fn count(&mut self, m: &Migration) {
        self.total += 1;
        match m.trend {
            Trend::Improved => self.improved += 1,
            Trend::Declined => self.declined += 1,
            Trend::Stable => self.stable += 1,
        }
        if m.recovered_detractor() {
            self.recovered_detractors += 1;
        }
        if m.lost_promoter() {
            self.lost_promoters += 1;
        }
        if m.retained_neutral() {
            self.retained_neutrals += 1;
        }
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct MigrationReport<'a> {
    /// Sorted by decreasing absolute score change.
    pub migrations: Vec<Migration<'a>>,
    pub counts: MigrationCounts,
}

impl<'a> MigrationReport<'a> {
    /// Selects migrations by category and by a case-insensitive search on
    /// the name and the unit. The order is preserved.
    pub fn filter(&self, category: MigrationCategory, search: &str) -> Vec<&Migration<'a>> {
        let needle = search.to_lowercase();
        self.migrations
            .iter()
            .filter(|m| m.matches(category))
            .filter(|m| {
                needle.is_empty()
                    || m.name.to_lowercase().contains(&needle)
                    || m.unit.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// Compares, for every respondent identifier, the first and the latest
/// answer.
///
/// Records without identifier are ignored. Respondents with a single answer,
/// or whose first or latest answer has no score, produce no migration.
/// Answers are ordered by response date, undated ones first.
///
/// ```
/// use survey_pulse::{compute_migrations, Status, SurveyRecord, Trend};
///
/// fn answer(score: f64, status: Status, date: &str) -> SurveyRecord {
///     SurveyRecord {
///         respondent_id: "R1".to_string(),
///         respondent_name: "Ana".to_string(),
///         score,
///         status,
///         justification: String::new(),
///         response_date: date.to_string(),
///         unit_id: "U1".to_string(),
///         unit_name: "Centro".to_string(),
///         unit_cnpj: String::new(),
///         unit_zone: String::new(),
///     }
/// }
///
/// let records = vec![
///     answer(9.0, Status::Promoter, "01/03/2024"),
///     answer(3.0, Status::Detractor, "01/01/2024"),
/// ];
/// let report = compute_migrations(&records);
/// let m = &report.migrations[0];
/// assert_eq!(m.trend, Trend::Improved);
/// assert_eq!(m.score_delta, 6.0);
/// assert!(m.recovered_detractor());
/// assert_eq!(report.counts.recovered_detractors, 1);
/// ```
pub fn compute_migrations<'a, I>(records: I) -> MigrationReport<'a>
where
    I: IntoIterator<Item = &'a SurveyRecord>,
{
    // Respondents in order of first appearance.
    let mut groups: Vec<(&'a str, Vec<&'a SurveyRecord>)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for r in records {
        if r.respondent_id.is_empty() {
            continue;
        }
        let id = r.respondent_id.as_str();
        let pos = *index.entry(id).or_insert_with(|| {
            groups.push((id, Vec::new()));
            groups.len() - 1
        });
        groups[pos].1.push(r);
    }

    let mut report = MigrationReport::default();
    for (id, mut answers) in groups {
        if answers.len() < 2 {
            continue;
        }
        answers.sort_by_key(|r| parse_day_month_year(&r.response_date));
        let (oldest, newest) = match (answers.first(), answers.last()) {
            (Some(o), Some(n)) => (*o, *n),
            _ => continue,
        };
        let (first, latest) = match (oldest.score(), newest.score()) {
            (Some(f), Some(l)) => (f, l),
            _ => {
                debug!("compute_migrations: {:?}: endpoint without score", id);
                continue;
            }
        };
        let score_delta = latest - first;
        let migration = Migration {
            respondent_id: id.to_string(),
            name: newest.respondent_name.clone(),
            unit: newest.unit_name.clone(),
            oldest,
            newest,
            trend: Trend::from_delta(score_delta),
            score_delta,
        };
        report.counts.count(&migration);
        report.migrations.push(migration);
    }

    report.migrations.sort_by(|a, b| {
        b.score_delta
            .abs()
            .partial_cmp(&a.score_delta.abs())
            .unwrap_or(Ordering::Equal)
    });
    info!(
        "compute_migrations: comparisons: {} improved: {} declined: {} stable: {}",
        report.counts.total, report.counts.improved, report.counts.declined, report.counts.stable
    );
    report
}

/// The categories a migration list can be narrowed to.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MigrationCategory {
    All,
    Improved,
    Stable,
    Declined,
    RecoveredDetractor,
    LostPromoter,
    RetainedNeutral,
}

impl MigrationCategory {
    pub fn name(&self) -> &'static str {
        match self {
            MigrationCategory::All => "all",
            MigrationCategory::Improved => "improved",
            MigrationCategory::Stable => "stable",
            MigrationCategory::Declined => "declined",
            MigrationCategory::RecoveredDetractor => "recovered_detractor",
            MigrationCategory::LostPromoter => "lost_promoter",
            MigrationCategory::RetainedNeutral => "retained_neutral",
        }
    }
}

impl Default for MigrationCategory {
    fn default() -> Self {
        MigrationCategory::All
    }
}

impl Display for MigrationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MigrationCategory {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "all" => Ok(MigrationCategory::All),
            "improved" => Ok(MigrationCategory::Improved),
            "stable" => Ok(MigrationCategory::Stable),
            "declined" => Ok(MigrationCategory::Declined),
            "recovered_detractor" => Ok(MigrationCategory::RecoveredDetractor),
            "lost_promoter" => Ok(MigrationCategory::LostPromoter),
            "retained_neutral" => Ok(MigrationCategory::RetainedNeutral),
            _ => Err(SurveyError::UnknownMigrationCategory(s.to_string())),
        }
    }
}
