// Parser and statistics for the implementation (onboarding) evaluation
// exports.

use log::{debug, info};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::*;
use crate::scales::EaseLevel;
use crate::schema::{
    implementation_columns as ic, Column, ParseReport, Row, RowOutcome, IMPLEMENTATION_SCHEMA,
};
use crate::tokenizer::data_rows;

/// Where the answers of one sub-domain sit in a row.
struct SubDomainColumns {
    partner: Option<Column>,
    satisfaction: Column,
    ease: Column,
    comment: Column,
}

fn sub_domain_columns(domain: SubDomain) -> SubDomainColumns {
    let (partner, satisfaction, ease, comment) = match domain {
        SubDomain::Training => (
            Some(ic::TRAINER),
            ic::TRAINING_SAT,
            ic::TRAINING_EASE,
            ic::TRAINING_COMMENT,
        ),
        SubDomain::Team => (None, ic::TEAM_SAT, ic::TEAM_EASE, ic::TEAM_COMMENT),
        SubDomain::Architect => (
            None,
            ic::ARCHITECT_SAT,
            ic::ARCHITECT_EASE,
            ic::ARCHITECT_COMMENT,
        ),
        SubDomain::Machines => (
            Some(ic::MACHINE_SUPPLIER),
            ic::MACHINE_SAT,
            ic::MACHINE_EASE,
            ic::MACHINE_COMMENT,
        ),
        SubDomain::Vendpago => (
            None,
            ic::VENDPAGO_SAT,
            ic::VENDPAGO_EASE,
            ic::VENDPAGO_COMMENT,
        ),
        SubDomain::Sults => (None, ic::SULTS_SAT, ic::SULTS_EASE, ic::SULTS_COMMENT),
        SubDomain::Stone => (None, ic::STONE_SAT, ic::STONE_EASE, ic::STONE_COMMENT),
        SubDomain::Technician => (
            Some(ic::TECHNICIAN),
            ic::TECHNICIAN_SAT,
            ic::TECHNICIAN_EASE,
            ic::TECHNICIAN_COMMENT,
        ),
    };
    SubDomainColumns {
        partner,
        satisfaction,
        ease,
        comment,
    }
}

fn read_answer(row: &Row, domain: SubDomain) -> SubDomainAnswer {
    let cols = sub_domain_columns(domain);
    let ease_text = row.text(cols.ease);
    SubDomainAnswer {
        partner: cols.partner.map(|c| row.text(c)),
        satisfaction: row.int(cols.satisfaction),
        ease: EaseLevel::classify(&ease_text),
        ease_text,
        comment: row.text(cols.comment),
    }
}

fn read_implementation(row: &Row) -> ImplementationRecord {
    ImplementationRecord {
        timestamp: row.text(ic::TIMESTAMP),
        name: row.text(ic::NAME),
        unit: row.text(ic::UNIT),
        general_satisfaction: row.int(ic::GENERAL_SAT),
        training: read_answer(row, SubDomain::Training),
        team: read_answer(row, SubDomain::Team),
        architect: read_answer(row, SubDomain::Architect),
        machines: read_answer(row, SubDomain::Machines),
        vendpago: read_answer(row, SubDomain::Vendpago),
        sults: read_answer(row, SubDomain::Sults),
        stone: read_answer(row, SubDomain::Stone),
        technician: read_answer(row, SubDomain::Technician),
    }
}

/// Parses an implementation export.
///
/// Rows of 25 to 30 fields are accepted: the missing trailing columns
/// (stone comment, technician) read as empty.
///
/// ```
/// use survey_pulse::{parse_implementation_survey, SubDomain};
///
/// let mut row = vec![""; 25];
/// row[1] = "Ana";
/// row[14] = "Acme";
/// row[15] = "4";
/// let text = format!("header\n{}", row.join(","));
///
/// let parsed = parse_implementation_survey(&text);
/// let stats = parsed.stats.unwrap();
/// assert_eq!(stats.average(SubDomain::Machines), 4.0);
/// assert_eq!(stats.supplier("Acme").unwrap().count, 1);
///
/// assert!(parse_implementation_survey("header").stats.is_none());
/// ```
pub fn parse_implementation_survey(text: &str) -> ImplementationParse {
    let mut report = ParseReport::default();
    let mut records = Vec::new();
    for (lineno, fields) in data_rows(text) {
        let outcome: RowOutcome<ImplementationRecord> = IMPLEMENTATION_SCHEMA
            .row(lineno, &fields)
            .map(|row| read_implementation(&row))
            .into();
        if let RowOutcome::Skipped(reason) = &outcome {
            debug!("parse_implementation_survey: skipping: {}", reason);
        }
        if let Some(record) = report.record(outcome) {
            records.push(record);
        }
    }
    let stats = implementation_stats(&records);
    info!(
        "parse_implementation_survey: records: {} skipped: {} general: {:?}",
        records.len(),
        report.skipped_count(),
        stats.as_ref().map(|s| s.avg_general)
    );
    ImplementationParse {
        records,
        stats,
        report,
    }
}

/// Mean of the positive values. Zero marks a question that was not answered.
fn answered_mean(values: impl Iterator<Item = i64>) -> f64 {
    let (sum, count) = values
        .filter(|v| *v > 0)
        .fold((0.0f64, 0usize), |(s, c), v| (s + v as f64, c + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

fn rank_partners(sums: Vec<(String, f64, usize)>) -> Vec<PartnerScore> {
    let mut scores: Vec<PartnerScore> = sums
        .into_iter()
        .map(|(name, sum, count)| PartnerScore {
            name,
            avg: sum / count as f64,
            count,
        })
        .collect();
    scores.sort_by(|a, b| b.avg.partial_cmp(&a.avg).unwrap_or(Ordering::Equal));
    scores
}

/// Sums and counts per non-empty partner name, in order of first appearance.
fn partner_sums<'a>(
    answers: impl Iterator<Item = &'a SubDomainAnswer>,
) -> Vec<(String, f64, usize)> {
    let mut sums: Vec<(String, f64, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for answer in answers {
        let name = match answer.partner.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        let pos = *index.entry(name).or_insert_with(|| {
            sums.push((name.to_string(), 0.0, 0));
            sums.len() - 1
        });
        sums[pos].1 += answer.satisfaction as f64;
        sums[pos].2 += 1;
    }
    sums
}

/// Computes the statistics over any set of records. None when the set is
/// empty.
///
/// All the means skip the unanswered (zero) values, except the supplier
/// leaderboard which counts every record naming a supplier.
pub fn implementation_stats(records: &[ImplementationRecord]) -> Option<ImplementationStatistics> {
    if records.is_empty() {
        return None;
    }
    let averages = SubDomain::ALL
        .iter()
        .map(|d| SubDomainAverage {
            domain: *d,
            avg: answered_mean(records.iter().map(|r| r.answer(*d).satisfaction)),
        })
        .collect();
    let machine_suppliers = rank_partners(partner_sums(records.iter().map(|r| &r.machines)));
    Some(ImplementationStatistics {
        total_records: records.len(),
        avg_general: answered_mean(records.iter().map(|r| r.general_satisfaction)),
        averages,
        machine_suppliers,
    })
}

/// The records whose respondent name contains the search text, ignoring
/// case. An empty search selects everything.
pub fn filter_by_name<'a>(
    records: &'a [ImplementationRecord],
    search: &str,
) -> Vec<&'a ImplementationRecord> {
    let needle = search.to_lowercase();
    records
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&needle))
        .collect()
}

/// Detailed view of one sub-domain, over the records that answered it.
#[derive(PartialEq, Debug, Clone)]
pub struct SubDomainBreakdown {
    pub domain: SubDomain,
    /// Records with a satisfaction above zero.
    pub answered: usize,
    pub avg: f64,
    /// Number of answers for each satisfaction value, from 1 to 5.
    pub satisfaction_counts: [usize; 5],
    /// Number of answers for each level of [EaseLevel::SCALE].
    pub ease_counts: [usize; 5],
    /// Ease answers that are not on the scale.
    pub ease_other: usize,
    /// Responsible parties ranked by mean satisfaction. Empty for the
    /// sub-domains without one.
    pub partners: Vec<PartnerScore>,
}

pub fn subdomain_breakdown<'a, I>(records: I, domain: SubDomain) -> SubDomainBreakdown
where
    I: IntoIterator<Item = &'a ImplementationRecord>,
{
    let answers: Vec<&SubDomainAnswer> = records
        .into_iter()
        .map(|r| r.answer(domain))
        .filter(|a| a.is_answered())
        .collect();

    let mut satisfaction_counts = [0usize; 5];
    let mut ease_counts = [0usize; 5];
    let mut ease_other = 0;
    for a in answers.iter() {
        if (1..=5).contains(&a.satisfaction) {
            satisfaction_counts[(a.satisfaction - 1) as usize] += 1;
        }
        match EaseLevel::SCALE.iter().position(|l| *l == a.ease) {
            Some(pos) => ease_counts[pos] += 1,
            None if a.ease == EaseLevel::Other => ease_other += 1,
            None => {}
        }
    }

    let partners = if domain.has_partner() {
        rank_partners(partner_sums(answers.iter().copied()))
    } else {
        Vec::new()
    };

    SubDomainBreakdown {
        domain,
        answered: answers.len(),
        avg: answered_mean(answers.iter().map(|a| a.satisfaction)),
        satisfaction_counts,
        ease_counts,
        ease_other,
        partners,
    }
}
