// ********* Cross-cycle history **********
//
// The history is the only stateful structure of the crate. It is owned by
// the caller and mutated through `&mut self`, so folds of new cycles are
// serialized by construction.

use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

use crate::dates::{parse_day_month_year, short_period_label};
use crate::model::{percentage, CycleParse, CycleStatistics, SurveyRecord};

/// One cycle with its responses.
#[derive(PartialEq, Debug, Clone)]
pub struct CycleSnapshot {
    pub stats: CycleStatistics,
    pub records: Vec<SurveyRecord>,
}

impl CycleSnapshot {
    pub fn id(&self) -> &str {
        &self.stats.id
    }
}

/// What happened to a cycle offered to the history.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AddOutcome {
    Added,
    /// A cycle with the same identifier was already there and was kept.
    Duplicate,
}

/// The collection of loaded cycles, in chronological order, with the set of
/// the visible ones.
#[derive(Debug, Clone, Default)]
pub struct CycleHistory {
    cycles: Vec<CycleSnapshot>,
    visible: HashSet<String>,
}

impl CycleHistory {
    pub fn new() -> CycleHistory {
        CycleHistory::default()
    }

    /// Folds a cycle into the history.
    ///
    /// The first copy of an identifier is kept; a later one is dropped. In
    /// both cases the identifier becomes visible. The collection is sorted by
    /// start date, undated cycles first, and cycles with the same date keep
    /// their insertion order.
    ///
    /// ```
    /// use survey_pulse::{AddOutcome, CycleHistory, CycleStatistics};
    ///
    /// fn cycle(id: &str, title: &str, start: &str) -> CycleStatistics {
    ///     CycleStatistics {
    ///         id: id.to_string(),
    ///         title: title.to_string(),
    ///         score: 0.0,
    ///         zone: String::new(),
    ///         total_invited: 0,
    ///         total_responded: 0,
    ///         count_promoters: 0,
    ///         count_neutrals: 0,
    ///         count_detractors: 0,
    ///         start_date: start.to_string(),
    ///         end_date: String::new(),
    ///         total_units_invited: 0,
    ///         total_units_responded: 0,
    ///     }
    /// }
    ///
    /// let mut history = CycleHistory::new();
    /// history.add_cycle(cycle("C3", "March", "01/03/2024"), vec![]);
    /// history.add_cycle(cycle("C1", "January", "01/01/2024"), vec![]);
    /// let outcome = history.add_cycle(cycle("C1", "Again", "01/01/2024"), vec![]);
    /// assert_eq!(outcome, AddOutcome::Duplicate);
    ///
    /// let titles: Vec<&str> = history.cycles().iter().map(|c| c.stats.title.as_str()).collect();
    /// assert_eq!(titles, vec!["January", "March"]);
    /// ```
    pub fn add_cycle(&mut self, stats: CycleStatistics, records: Vec<SurveyRecord>) -> AddOutcome {
        self.visible.insert(stats.id.clone());
        if self.cycles.iter().any(|c| c.stats.id == stats.id) {
            warn!(
                "add_cycle: cycle {:?} is already loaded, keeping the first copy",
                stats.id
            );
            return AddOutcome::Duplicate;
        }
        debug!(
            "add_cycle: adding cycle {:?} with {} records",
            stats.id,
            records.len()
        );
        self.cycles.push(CycleSnapshot { stats, records });
        self.cycles
            .sort_by_key(|c| parse_day_month_year(&c.stats.start_date));
        AddOutcome::Added
    }

    /// Folds the result of a parse. A parse without statistics holds no
    /// cycle: its records are dropped and None is returned.
    pub fn add_parsed(&mut self, parsed: CycleParse) -> Option<AddOutcome> {
        match parsed.stats {
            Some(stats) => Some(self.add_cycle(stats, parsed.records)),
            None => {
                info!(
                    "add_parsed: no cycle statistics, dropping {} records",
                    parsed.records.len()
                );
                None
            }
        }
    }

    /// Flips the visibility of a cycle identifier and returns the new state.
    pub fn toggle_visibility(&mut self, id: &str) -> bool {
        if self.visible.remove(id) {
            false
        } else {
            self.visible.insert(id.to_string());
            true
        }
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) {
        if visible {
            self.visible.insert(id.to_string());
        } else {
            self.visible.remove(id);
        }
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.contains(id)
    }

    /// All the loaded cycles, visible or not, in chronological order.
    pub fn cycles(&self) -> &[CycleSnapshot] {
        &self.cycles
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn visible_cycles(&self) -> Vec<&CycleSnapshot> {
        self.cycles
            .iter()
            .filter(|c| self.visible.contains(&c.stats.id))
            .collect()
    }

    /// The union of the responses of the visible cycles.
    pub fn visible_records(&self) -> Vec<&SurveyRecord> {
        self.visible_cycles()
            .into_iter()
            .flat_map(|c| c.records.iter())
            .collect()
    }

    /// The latest visible cycle.
    pub fn active_cycle(&self) -> Option<&CycleSnapshot> {
        self.visible_cycles().last().copied()
    }

    /// One point per visible cycle, in chronological order.
    pub fn trend_points(&self) -> Vec<TrendPoint> {
        self.visible_cycles()
            .into_iter()
            .map(|c| TrendPoint::from_stats(&c.stats))
            .collect()
    }
}

/// The headline figures of a cycle on a time axis.
#[derive(PartialEq, Debug, Clone)]
pub struct TrendPoint {
    pub id: String,
    pub title: String,
    /// "MM/YY" of the start date, "N/A" when there is none.
    pub period: String,
    pub score: f64,
    pub total_invited: i64,
    pub total_responded: i64,
    pub units_invited: usize,
    pub units_responded: usize,
    pub response_rate: f64,
    pub unit_response_rate: f64,
}

impl TrendPoint {
    fn from_stats(stats: &CycleStatistics) -> TrendPoint {
        TrendPoint {
            id: stats.id.clone(),
            title: stats.title.clone(),
            period: short_period_label(&stats.start_date).unwrap_or_else(|| "N/A".to_string()),
            score: stats.score,
            total_invited: stats.total_invited,
            total_responded: stats.total_responded,
            units_invited: stats.total_units_invited,
            units_responded: stats.total_units_responded,
            response_rate: percentage(stats.total_responded as f64, stats.total_invited as f64),
            unit_response_rate: percentage(
                stats.total_units_responded as f64,
                stats.total_units_invited as f64,
            ),
        }
    }
}

// ---- Entity history ----

/// How responses are grouped for an entity history.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum EntityKind {
    /// By unit name.
    Unit,
    /// By respondent name.
    Person,
}

impl EntityKind {
    fn key<'a>(&self, record: &'a SurveyRecord) -> &'a str {
        match self {
            EntityKind::Unit => &record.unit_name,
            EntityKind::Person => &record.respondent_name,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EntityCount {
    pub name: String,
    pub count: usize,
}

/// The distinct non-empty names of an entity kind, sorted, with their number
/// of responses.
pub fn entity_names<'a, I>(records: I, kind: EntityKind) -> Vec<EntityCount>
where
    I: IntoIterator<Item = &'a SurveyRecord>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        let name = kind.key(r);
        if !name.is_empty() {
            *counts.entry(name).or_insert(0) += 1;
        }
    }
    let mut names: Vec<EntityCount> = counts
        .into_iter()
        .map(|(name, count)| EntityCount {
            name: name.to_string(),
            count,
        })
        .collect();
    names.sort_by(|a, b| a.name.cmp(&b.name));
    names
}

/// All the responses of one unit or person.
#[derive(PartialEq, Debug, Clone)]
pub struct EntityHistory<'a> {
    pub name: String,
    /// Sorted by response date, undated responses first.
    pub records: Vec<&'a SurveyRecord>,
    /// Responses carrying a score.
    pub scored: usize,
    /// Mean of the present scores, None when there is none.
    pub avg_score: Option<f64>,
    /// Distinct respondent names in order of appearance.
    pub respondents: Vec<String>,
}

impl<'a> EntityHistory<'a> {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn latest(&self) -> Option<&'a SurveyRecord> {
        self.records.last().copied()
    }
}

/// The history of one entity. None when no response matches the name.
pub fn entity_history<'a, I>(records: I, kind: EntityKind, name: &str) -> Option<EntityHistory<'a>>
where
    I: IntoIterator<Item = &'a SurveyRecord>,
{
    let mut selected: Vec<&SurveyRecord> = records
        .into_iter()
        .filter(|r| kind.key(r) == name)
        .collect();
    if selected.is_empty() {
        return None;
    }
    selected.sort_by_key(|r| parse_day_month_year(&r.response_date));

    let scores: Vec<f64> = selected.iter().filter_map(|r| r.score()).collect();
    let avg_score = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    let mut respondents: Vec<String> = Vec::new();
    for r in selected.iter() {
        if !respondents.contains(&r.respondent_name) {
            respondents.push(r.respondent_name.clone());
        }
    }

    Some(EntityHistory {
        name: name.to_string(),
        scored: scores.len(),
        avg_score,
        respondents,
        records: selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scales::Status;

    fn stats(id: &str, title: &str, start: &str) -> CycleStatistics {
        CycleStatistics {
            id: id.to_string(),
            title: title.to_string(),
            score: 50.0,
            zone: String::new(),
            total_invited: 100,
            total_responded: 25,
            count_promoters: 10,
            count_neutrals: 10,
            count_detractors: 5,
            start_date: start.to_string(),
            end_date: String::new(),
            total_units_invited: 8,
            total_units_responded: 2,
        }
    }

    fn record(name: &str, unit: &str, score: f64, date: &str) -> SurveyRecord {
        SurveyRecord {
            respondent_id: format!("id-{}", name),
            respondent_name: name.to_string(),
            score,
            status: Status::Neutral,
            justification: String::new(),
            response_date: date.to_string(),
            unit_id: String::new(),
            unit_name: unit.to_string(),
            unit_cnpj: String::new(),
            unit_zone: String::new(),
        }
    }

    fn ids(history: &CycleHistory) -> Vec<&str> {
        history.cycles().iter().map(|c| c.id()).collect()
    }

    #[test]
    fn dedupe_and_sort() {
        let mut history = CycleHistory::new();
        assert_eq!(
            history.add_cycle(stats("C1", "Original", "01/01/2024"), vec![]),
            AddOutcome::Added
        );
        assert_eq!(
            history.add_cycle(stats("C3", "Março", "01/03/2024"), vec![]),
            AddOutcome::Added
        );
        assert_eq!(
            history.add_cycle(stats("C1", "Outro título", "01/01/2024"), vec![]),
            AddOutcome::Duplicate
        );
        assert_eq!(history.len(), 2);
        assert_eq!(ids(&history), vec!["C1", "C3"]);
        assert_eq!(history.cycles()[0].stats.title, "Original");
    }

    #[test]
    fn sorted_by_start_date_with_undated_first() {
        let mut history = CycleHistory::new();
        history.add_cycle(stats("C2", "", "15/02/2024"), vec![]);
        history.add_cycle(stats("C0", "", ""), vec![]);
        history.add_cycle(stats("C1", "", "01/12/2023"), vec![]);
        history.add_cycle(stats("C2b", "", "15/02/2024"), vec![]);
        assert_eq!(ids(&history), vec!["C0", "C1", "C2", "C2b"]);
    }

    #[test]
    fn visibility() {
        let mut history = CycleHistory::new();
        history.add_cycle(stats("C1", "", "01/01/2024"), vec![record("Ana", "U", 9.0, "")]);
        history.add_cycle(
            stats("C2", "", "01/02/2024"),
            vec![record("Ana", "U", 7.0, ""), record("Bia", "U", 3.0, "")],
        );
        assert!(history.is_visible("C1"));
        assert_eq!(history.visible_records().len(), 3);
        assert_eq!(history.active_cycle().map(|c| c.id()), Some("C2"));

        assert!(!history.toggle_visibility("C2"));
        assert_eq!(history.visible_cycles().len(), 1);
        assert_eq!(history.visible_records().len(), 1);
        assert_eq!(history.active_cycle().map(|c| c.id()), Some("C1"));
        // Hidden cycles stay loaded.
        assert_eq!(history.len(), 2);

        assert!(history.toggle_visibility("C2"));
        assert_eq!(history.visible_cycles().len(), 2);

        history.set_visible("C1", false);
        history.set_visible("C2", false);
        assert!(history.active_cycle().is_none());
        assert!(history.trend_points().is_empty());
    }

    #[test]
    fn duplicate_makes_the_identifier_visible_again() {
        let mut history = CycleHistory::new();
        history.add_cycle(stats("C1", "", "01/01/2024"), vec![]);
        history.toggle_visibility("C1");
        assert!(!history.is_visible("C1"));
        history.add_cycle(stats("C1", "", "01/01/2024"), vec![]);
        assert!(history.is_visible("C1"));
    }

    #[test]
    fn parse_without_stats_is_not_added() {
        let mut history = CycleHistory::new();
        let parsed = CycleParse {
            stats: None,
            records: vec![record("Ana", "U", 9.0, "")],
            report: Default::default(),
            header_error: None,
        };
        assert_eq!(history.add_parsed(parsed), None);
        assert!(history.is_empty());
    }

    #[test]
    fn trend_points() {
        let mut history = CycleHistory::new();
        history.add_cycle(stats("C1", "Jan", "01/01/2024"), vec![]);
        let mut no_invites = stats("C0", "Dez", "");
        no_invites.total_invited = 0;
        no_invites.total_units_invited = 0;
        history.add_cycle(no_invites, vec![]);
        let points = history.trend_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].period, "N/A");
        assert_eq!(points[0].response_rate, 0.0);
        assert_eq!(points[1].period, "01/24");
        assert_eq!(points[1].response_rate, 25.0);
        assert_eq!(points[1].unit_response_rate, 25.0);
    }

    #[test]
    fn entity_names_and_history() {
        let records = vec![
            record("Ana", "Loja Sul", 9.0, "10/03/2024 10:00"),
            record("Bia", "Loja Sul", f64::NAN, "01/02/2024"),
            record("Ana", "Loja Sul", 5.0, "01/01/2024"),
            record("Caio", "", 7.0, "01/01/2024"),
        ];
        let units = entity_names(&records, EntityKind::Unit);
        assert_eq!(
            units,
            vec![EntityCount {
                name: "Loja Sul".to_string(),
                count: 3
            }]
        );
        let people: Vec<String> = entity_names(&records, EntityKind::Person)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(people, vec!["Ana", "Bia", "Caio"]);

        let h = entity_history(&records, EntityKind::Unit, "Loja Sul").unwrap();
        assert_eq!(h.total(), 3);
        assert_eq!(h.scored, 2);
        assert_eq!(h.avg_score, Some(7.0));
        assert_eq!(h.records[0].response_date, "01/01/2024");
        assert_eq!(h.latest().map(|r| r.score), Some(9.0));
        assert_eq!(h.respondents, vec!["Ana", "Bia"]);

        let bia = entity_history(&records, EntityKind::Person, "Bia").unwrap();
        assert_eq!(bia.avg_score, None);
        assert!(entity_history(&records, EntityKind::Person, "Zé").is_none());
    }
}
