// ********* Records and statistics **********
//
// All these structures are built fresh by each parse call and are never
// mutated afterwards.

use std::fmt::Display;
use std::str::FromStr;

use crate::scales::{CycleZone, EaseLevel, Status};
use crate::schema::{ParseReport, SkipReason, SurveyError};

// ---- Satisfaction score cycles ----

/// Cycle-level figures of one survey wave, as embedded in the export.
#[derive(PartialEq, Debug, Clone)]
pub struct CycleStatistics {
    /// Stable key of the cycle.
    pub id: String,
    pub title: String,
    /// Headline score in [-100, 100]. NaN when unreadable.
    pub score: f64,
    /// The zone label supplied by the export.
    pub zone: String,
    pub total_invited: i64,
    pub total_responded: i64,
    pub count_promoters: i64,
    pub count_neutrals: i64,
    pub count_detractors: i64,
    pub start_date: String,
    pub end_date: String,
    /// Distinct units seen in the file.
    pub total_units_invited: usize,
    /// Distinct units with at least one score.
    pub total_units_responded: usize,
}

impl CycleStatistics {
    /// The zone computed from the score, regardless of the supplied label.
    pub fn derived_zone(&self) -> CycleZone {
        CycleZone::from_score(self.score)
    }

    /// Percentage of invited respondents who answered.
    pub fn response_rate(&self) -> f64 {
        percentage(self.total_responded as f64, self.total_invited as f64)
    }

    /// Percentage of invited units with at least one answer.
    pub fn unit_response_rate(&self) -> f64 {
        percentage(
            self.total_units_responded as f64,
            self.total_units_invited as f64,
        )
    }

    /// The status counts are supplied independently from the response total
    /// and may disagree with it.
    pub fn counts_are_consistent(&self) -> bool {
        let sum = self
            .count_promoters
            .checked_add(self.count_neutrals)
            .and_then(|s| s.checked_add(self.count_detractors));
        sum == Some(self.total_responded)
    }
}

pub(crate) fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// One response of a cycle.
#[derive(PartialEq, Debug, Clone)]
pub struct SurveyRecord {
    pub respondent_id: String,
    pub respondent_name: String,
    /// Score in [0, 10], or NaN when the respondent gave no score.
    pub score: f64,
    pub status: Status,
    pub justification: String,
    pub response_date: String,
    pub unit_id: String,
    pub unit_name: String,
    pub unit_cnpj: String,
    pub unit_zone: String,
}

impl SurveyRecord {
    pub fn has_score(&self) -> bool {
        !self.score.is_nan()
    }

    /// The score, if one was given.
    pub fn score(&self) -> Option<f64> {
        if self.has_score() {
            Some(self.score)
        } else {
            None
        }
    }
}

/// Result of parsing a cycle export.
///
/// When `stats` is None the whole file must be treated as holding no cycle,
/// even if some records were read.
#[derive(PartialEq, Debug, Clone)]
pub struct CycleParse {
    pub stats: Option<CycleStatistics>,
    pub records: Vec<SurveyRecord>,
    pub report: ParseReport,
    /// Why the cycle-level fields could not be read, when `stats` is None
    /// although the file has data rows.
    pub header_error: Option<SkipReason>,
}

// ---- Meetings ----

/// The six evaluation criteria of a meeting.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Criterion {
    Relevance,
    Depth,
    Expectations,
    Knowledge,
    Clarity,
    Efficacy,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Criterion::Relevance,
        Criterion::Depth,
        Criterion::Expectations,
        Criterion::Knowledge,
        Criterion::Clarity,
        Criterion::Efficacy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Relevance => "Relevância",
            Criterion::Depth => "Profundidade",
            Criterion::Expectations => "Expectativa",
            Criterion::Knowledge => "Conhecimento",
            Criterion::Clarity => "Clareza",
            Criterion::Efficacy => "Eficácia",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MeetingRecord {
    pub timestamp: String,
    pub consultant: String,
    /// Overall satisfaction, 1-5 (0 when unreadable).
    pub csat: i64,
    /// Criteria scores on the 1-5 agreement scale, 0 when unrated.
    pub relevance: u32,
    pub depth: u32,
    pub expectations: u32,
    pub knowledge: u32,
    pub clarity: u32,
    pub efficacy: u32,
    pub comment: String,
}

impl MeetingRecord {
    pub fn criterion(&self, c: Criterion) -> u32 {
        match c {
            Criterion::Relevance => self.relevance,
            Criterion::Depth => self.depth,
            Criterion::Expectations => self.expectations,
            Criterion::Knowledge => self.knowledge,
            Criterion::Clarity => self.clarity,
            Criterion::Efficacy => self.efficacy,
        }
    }

    /// Mean of the six criteria, unrated ones counting as 0.
    pub fn technical_score(&self) -> f64 {
        let sum: u32 = Criterion::ALL.iter().map(|c| self.criterion(*c)).sum();
        sum as f64 / Criterion::ALL.len() as f64
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct ConsultantScore {
    pub name: String,
    pub score: f64,
    pub count: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CriterionScore {
    pub criterion: Criterion,
    pub score: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct MeetingStatistics {
    pub total_meetings: usize,
    pub avg_csat: f64,
    /// First consultant of the ranking by mean, "N/A" when there is none.
    pub top_consultant: String,
    /// Ranked by mean satisfaction, highest first.
    pub consultant_scores: Vec<ConsultantScore>,
    /// One entry per criterion, in the order of [Criterion::ALL].
    pub criteria_scores: Vec<CriterionScore>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct MeetingParse {
    pub records: Vec<MeetingRecord>,
    pub stats: MeetingStatistics,
    pub report: ParseReport,
}

// ---- Implementation ----

/// The eight steps of an implementation that are evaluated separately.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum SubDomain {
    Training,
    Team,
    Architect,
    Machines,
    Vendpago,
    Sults,
    Stone,
    Technician,
}

impl SubDomain {
    pub const ALL: [SubDomain; 8] = [
        SubDomain::Training,
        SubDomain::Team,
        SubDomain::Architect,
        SubDomain::Machines,
        SubDomain::Vendpago,
        SubDomain::Sults,
        SubDomain::Stone,
        SubDomain::Technician,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SubDomain::Training => "Treinamento",
            SubDomain::Team => "Equipe L&P",
            SubDomain::Architect => "Arquiteto",
            SubDomain::Machines => "Máquinas",
            SubDomain::Vendpago => "VendPago",
            SubDomain::Sults => "SULTS",
            SubDomain::Stone => "Stone",
            SubDomain::Technician => "Técnico",
        }
    }

    /// Whether the answers name a responsible party (trainer, supplier, technician).
    pub fn has_partner(&self) -> bool {
        matches!(
            self,
            SubDomain::Training | SubDomain::Machines | SubDomain::Technician
        )
    }
}

impl Display for SubDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for SubDomain {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "training" => Ok(SubDomain::Training),
            "team" => Ok(SubDomain::Team),
            "architect" => Ok(SubDomain::Architect),
            "machines" => Ok(SubDomain::Machines),
            "vendpago" => Ok(SubDomain::Vendpago),
            "sults" => Ok(SubDomain::Sults),
            "stone" => Ok(SubDomain::Stone),
            "technician" => Ok(SubDomain::Technician),
            _ => Err(SurveyError::UnknownSubDomain(s.to_string())),
        }
    }
}

/// The answers of one respondent for one sub-domain.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SubDomainAnswer {
    /// Trainer, machine supplier or technician. None for the sub-domains
    /// without a responsible party.
    pub partner: Option<String>,
    /// 0 when not answered.
    pub satisfaction: i64,
    pub ease: EaseLevel,
    /// The ease answer as written.
    pub ease_text: String,
    pub comment: String,
}

impl SubDomainAnswer {
    pub fn is_answered(&self) -> bool {
        self.satisfaction > 0
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ImplementationRecord {
    pub timestamp: String,
    pub name: String,
    pub unit: String,
    /// 0 when not answered.
    pub general_satisfaction: i64,
    pub training: SubDomainAnswer,
    pub team: SubDomainAnswer,
    pub architect: SubDomainAnswer,
    pub machines: SubDomainAnswer,
    pub vendpago: SubDomainAnswer,
    pub sults: SubDomainAnswer,
    pub stone: SubDomainAnswer,
    pub technician: SubDomainAnswer,
}

impl ImplementationRecord {
    pub fn answer(&self, domain: SubDomain) -> &SubDomainAnswer {
        match domain {
            SubDomain::Training => &self.training,
            SubDomain::Team => &self.team,
            SubDomain::Architect => &self.architect,
            SubDomain::Machines => &self.machines,
            SubDomain::Vendpago => &self.vendpago,
            SubDomain::Sults => &self.sults,
            SubDomain::Stone => &self.stone,
            SubDomain::Technician => &self.technician,
        }
    }
}

/// Mean satisfaction and number of answers attributed to one partner.
#[derive(PartialEq, Debug, Clone)]
pub struct PartnerScore {
    pub name: String,
    pub avg: f64,
    pub count: usize,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SubDomainAverage {
    pub domain: SubDomain,
    /// Mean over the answered records only.
    pub avg: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ImplementationStatistics {
    pub total_records: usize,
    /// Mean general satisfaction over the answered records.
    pub avg_general: f64,
    /// One entry per sub-domain, in the order of [SubDomain::ALL].
    pub averages: Vec<SubDomainAverage>,
    /// Machine suppliers ranked by mean satisfaction, highest first.
    pub machine_suppliers: Vec<PartnerScore>,
}

impl ImplementationStatistics {
    pub fn average(&self, domain: SubDomain) -> f64 {
        self.averages
            .iter()
            .find(|a| a.domain == domain)
            .map(|a| a.avg)
            .unwrap_or(0.0)
    }

    pub fn supplier(&self, name: &str) -> Option<&PartnerScore> {
        self.machine_suppliers.iter().find(|p| p.name == name)
    }
}

/// Result of parsing an implementation export.
///
/// `stats` is None, and not a zero-valued structure, when no record was read.
#[derive(PartialEq, Debug, Clone)]
pub struct ImplementationParse {
    pub records: Vec<ImplementationRecord>,
    pub stats: Option<ImplementationStatistics>,
    pub report: ParseReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> CycleStatistics {
        CycleStatistics {
            id: "C1".to_string(),
            title: "Ciclo 1".to_string(),
            score: 62.5,
            zone: "Qualidade".to_string(),
            total_invited: 200,
            total_responded: 50,
            count_promoters: 30,
            count_neutrals: 10,
            count_detractors: 9,
            start_date: "01/01/2024".to_string(),
            end_date: "31/01/2024".to_string(),
            total_units_invited: 4,
            total_units_responded: 3,
        }
    }

    #[test]
    fn cycle_rates_and_zone() {
        let s = stats();
        assert_eq!(s.response_rate(), 25.0);
        assert_eq!(s.unit_response_rate(), 75.0);
        assert_eq!(s.derived_zone(), CycleZone::Quality);
        // 30 + 10 + 9 != 50, tolerated.
        assert!(!s.counts_are_consistent());
    }

    #[test]
    fn rates_without_invitations() {
        let mut s = stats();
        s.total_invited = 0;
        s.total_units_invited = 0;
        assert_eq!(s.response_rate(), 0.0);
        assert_eq!(s.unit_response_rate(), 0.0);
    }

    #[test]
    fn meeting_technical_score() {
        let r = MeetingRecord {
            timestamp: String::new(),
            consultant: "Ana".to_string(),
            csat: 5,
            relevance: 5,
            depth: 4,
            expectations: 3,
            knowledge: 0,
            clarity: 5,
            efficacy: 1,
            comment: String::new(),
        };
        assert_eq!(r.technical_score(), 3.0);
        assert_eq!(r.criterion(Criterion::Depth), 4);
    }

    #[test]
    fn sub_domain_names() {
        assert_eq!("Machines".parse::<SubDomain>(), Ok(SubDomain::Machines));
        assert!("kitchen".parse::<SubDomain>().is_err());
        assert!(SubDomain::Technician.has_partner());
        assert!(!SubDomain::Stone.has_partner());
        assert_eq!(SubDomain::Team.to_string(), "Equipe L&P");
    }

    #[test]
    fn huge_status_counts_are_inconsistent_without_overflow() {
        let mut s = stats();
        s.count_neutrals = i64::MAX;
        s.count_detractors = i64::MAX;
        assert!(!s.counts_are_consistent());

        s.count_promoters = 20;
        s.count_neutrals = 21;
        s.count_detractors = 9;
        assert!(s.counts_are_consistent());
    }
}
