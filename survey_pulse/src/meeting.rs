// Parser and statistics for the meeting evaluation exports.

use log::{debug, info};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::*;
use crate::scales::AgreementLevel;
use crate::schema::{meeting_columns as mc, ParseReport, Row, RowOutcome, MEETING_SCHEMA};
use crate::tokenizer::data_rows;

/// Parses a meeting evaluation export.
///
/// The statistics are always computed, over an empty set if need be: unlike
/// the implementation parser there is no absent state.
pub fn parse_meeting_survey(text: &str) -> MeetingParse {
    let mut report = ParseReport::default();
    let mut records = Vec::new();
    for (lineno, fields) in data_rows(text) {
        let outcome: RowOutcome<MeetingRecord> = MEETING_SCHEMA
            .row(lineno, &fields)
            .map(|row| read_meeting(&row))
            .into();
        if let RowOutcome::Skipped(reason) = &outcome {
            debug!("parse_meeting_survey: skipping: {}", reason);
        }
        if let Some(record) = report.record(outcome) {
            records.push(record);
        }
    }
    let stats = meeting_stats(&records);
    info!(
        "parse_meeting_survey: meetings: {} skipped: {} top consultant: {:?}",
        stats.total_meetings,
        report.skipped_count(),
        stats.top_consultant
    );
    MeetingParse {
        records,
        stats,
        report,
    }
}

fn read_meeting(row: &Row) -> MeetingRecord {
    let level = |c| AgreementLevel::classify(&row.text(c)).score();
    MeetingRecord {
        timestamp: row.text(mc::TIMESTAMP),
        consultant: row.text(mc::CONSULTANT),
        csat: row.int(mc::CSAT),
        relevance: level(mc::RELEVANCE),
        depth: level(mc::DEPTH),
        expectations: level(mc::EXPECTATIONS),
        knowledge: level(mc::KNOWLEDGE),
        clarity: level(mc::CLARITY),
        efficacy: level(mc::EFFICACY),
        comment: row.text(mc::COMMENT),
    }
}

fn mean(sum: f64, count: usize) -> f64 {
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

/// Sorts by decreasing score, keeping the order of equal scores.
fn rank_descending<T>(items: &mut [T], score: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
}

/// Computes the statistics over any set of meetings.
///
/// The consultant ranking ignores the meetings without a consultant, but
/// these still count in the overall and per-criterion means.
pub fn meeting_stats(records: &[MeetingRecord]) -> MeetingStatistics {
    let total = records.len();
    // Summed as floats: an over-long satisfaction reads as i64::MAX.
    let csat_sum: f64 = records.iter().map(|r| r.csat as f64).sum();

    // Consultants in order of first appearance.
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for r in records.iter().filter(|r| !r.consultant.is_empty()) {
        let entry = sums.entry(r.consultant.as_str()).or_insert_with(|| {
            order.push(r.consultant.clone());
            (0.0, 0)
        });
        entry.0 += r.csat as f64;
        entry.1 += 1;
    }
    let mut consultant_scores: Vec<ConsultantScore> = order
        .into_iter()
        .map(|name| {
            let (sum, count) = sums[name.as_str()];
            ConsultantScore {
                score: mean(sum, count),
                name,
                count,
            }
        })
        .collect();
    rank_descending(&mut consultant_scores, |c| c.score);

    let top_consultant = consultant_scores
        .first()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "N/A".to_string());

    let criteria_scores = Criterion::ALL
        .iter()
        .map(|c| {
            let sum: u32 = records.iter().map(|r| r.criterion(*c)).sum();
            CriterionScore {
                criterion: *c,
                score: mean(sum as f64, total),
            }
        })
        .collect();

    MeetingStatistics {
        total_meetings: total,
        avg_csat: mean(csat_sum, total),
        top_consultant,
        consultant_scores,
        criteria_scores,
    }
}

/// Selection of meetings by consultant and overall satisfaction.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MeetingFilter {
    /// Exact consultant name. None selects all.
    pub consultant: Option<String>,
    /// Exact satisfaction value. None selects all.
    pub csat: Option<u32>,
}

impl MeetingFilter {
    pub fn matches(&self, record: &MeetingRecord) -> bool {
        let consultant_ok = match &self.consultant {
            Some(name) => &record.consultant == name,
            None => true,
        };
        let csat_ok = match self.csat {
            Some(value) => record.csat == value as i64,
            None => true,
        };
        consultant_ok && csat_ok
    }

    pub fn apply<'a>(&self, records: &'a [MeetingRecord]) -> Vec<&'a MeetingRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// The distinct consultant names of a set of meetings, sorted.
pub fn consultant_names(records: &[MeetingRecord]) -> Vec<String> {
    let mut names: Vec<String> = records.iter().map(|r| r.consultant.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// One line of the consultant comparison table.
#[derive(PartialEq, Debug, Clone)]
pub struct ConsultantRow {
    pub name: String,
    pub count: usize,
    pub avg_csat: f64,
    /// Mean over the meetings of their technical score.
    pub avg_technical: f64,
}

/// Per consultant volume, satisfaction and technical score, ranked by
/// satisfaction.
///
/// Meetings without a consultant form their own line with an empty name.
pub fn consultant_matrix<'a, I>(records: I) -> Vec<ConsultantRow>
where
    I: IntoIterator<Item = &'a MeetingRecord>,
{
    let mut rows: Vec<ConsultantRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for r in records {
        let pos = *index.entry(r.consultant.clone()).or_insert_with(|| {
            rows.push(ConsultantRow {
                name: r.consultant.clone(),
                count: 0,
                avg_csat: 0.0,
                avg_technical: 0.0,
            });
            rows.len() - 1
        });
        // Sums for now, divided below.
        let row = &mut rows[pos];
        row.count += 1;
        row.avg_csat += r.csat as f64;
        row.avg_technical += r.technical_score();
    }
    for row in rows.iter_mut() {
        row.avg_csat = mean(row.avg_csat, row.count);
        row.avg_technical = mean(row.avg_technical, row.count);
    }
    rank_descending(&mut rows, |r| r.avg_csat);
    rows
}

/// The consultant with the most meetings in the table. On ties, the one
/// ranked last by satisfaction wins.
pub fn top_consultant_by_volume(matrix: &[ConsultantRow]) -> Option<&ConsultantRow> {
    matrix
        .iter()
        .reduce(|best, current| if best.count > current.count { best } else { current })
}
