//! Column layouts of the three survey exports.
//!
//! The exports are positional: a field is only known by its column index.
//! Each layout is described once here as a list of named columns, and the
//! parsers read the rows through these descriptors instead of raw indexes.

use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

use crate::tokenizer::{clean, int_or_zero};

/// A named position in a row.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Column {
    pub name: &'static str,
    pub index: usize,
}

impl Column {
    pub const fn new(name: &'static str, index: usize) -> Column {
        Column { name, index }
    }
}

/// The three kinds of exports understood by the parsers.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SurveyKind {
    /// Satisfaction score (NPS) cycle.
    Cycle,
    Meeting,
    Implementation,
}

impl SurveyKind {
    pub fn schema(&self) -> &'static RowSchema {
        match self {
            SurveyKind::Cycle => &CYCLE_SCHEMA,
            SurveyKind::Meeting => &MEETING_SCHEMA,
            SurveyKind::Implementation => &IMPLEMENTATION_SCHEMA,
        }
    }
}

impl FromStr for SurveyKind {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cycle" | "nps" => Ok(SurveyKind::Cycle),
            "meeting" | "meetings" => Ok(SurveyKind::Meeting),
            "implementation" | "onboarding" => Ok(SurveyKind::Implementation),
            _ => Err(SurveyError::UnknownSurveyKind(s.to_string())),
        }
    }
}

impl Display for SurveyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SurveyKind::Cycle => "cycle",
            SurveyKind::Meeting => "meeting",
            SurveyKind::Implementation => "implementation",
        };
        write!(f, "{}", name)
    }
}

/// The layout of one kind of export.
#[derive(Eq, PartialEq, Debug)]
pub struct RowSchema {
    pub kind: SurveyKind,
    /// Rows with fewer fields are dropped.
    pub min_fields: usize,
    pub columns: &'static [Column],
}

impl RowSchema {
    pub fn column(&self, name: &str) -> Option<Column> {
        self.columns.iter().find(|c| c.name == name).cloned()
    }

    /// Wraps a tokenized row, checking the minimum number of fields.
    pub fn row<'a>(&self, lineno: usize, fields: &'a [String]) -> Result<Row<'a>, SkipReason> {
        if fields.len() < self.min_fields {
            return Err(SkipReason::TooFewFields {
                lineno,
                found: fields.len(),
                expected: self.min_fields,
            });
        }
        Ok(Row { lineno, fields })
    }
}

/// A tokenized data row that passed the length check.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Row<'a> {
    pub lineno: usize,
    fields: &'a [String],
}

impl<'a> Row<'a> {
    /// The cleaned text of the column, empty when the row is too short for it.
    pub fn text(&self, column: Column) -> String {
        self.fields
            .get(column.index)
            .map(|s| clean(s))
            .unwrap_or_default()
    }

    /// The column read as an integer, 0 when unreadable.
    pub fn int(&self, column: Column) -> i64 {
        int_or_zero(&self.text(column))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub mod cycle_columns {
    use super::Column;

    pub const CYCLE_ID: Column = Column::new("npsId", 0);
    pub const TITLE: Column = Column::new("title", 1);
    pub const SCORE: Column = Column::new("score", 2);
    pub const ZONE: Column = Column::new("zone", 3);
    pub const TOTAL_INVITED: Column = Column::new("totalInvited", 4);
    pub const TOTAL_RESPONDED: Column = Column::new("totalResponded", 5);
    pub const COUNT_DETRACTORS: Column = Column::new("countDetractors", 6);
    pub const COUNT_NEUTRALS: Column = Column::new("countNeutrals", 7);
    pub const COUNT_PROMOTERS: Column = Column::new("countPromoters", 8);
    pub const START_DATE: Column = Column::new("startDate", 9);
    pub const END_DATE: Column = Column::new("endDate", 10);
    pub const RESPONDENT_ID: Column = Column::new("respondentId", 12);
    pub const RESPONDENT_NAME: Column = Column::new("respondentName", 13);
    pub const INDIVIDUAL_SCORE: Column = Column::new("individualScore", 14);
    pub const STATUS: Column = Column::new("status", 15);
    pub const JUSTIFICATION: Column = Column::new("justification", 16);
    pub const RESPONSE_DATE: Column = Column::new("responseDate", 17);
    pub const UNIT_ID: Column = Column::new("unitId", 18);
    pub const UNIT_NAME: Column = Column::new("unitName", 19);
    pub const UNIT_CNPJ: Column = Column::new("unitCnpj", 21);
    pub const UNIT_ZONE: Column = Column::new("unitZone", 23);
}

pub mod meeting_columns {
    use super::Column;

    pub const TIMESTAMP: Column = Column::new("timestamp", 0);
    pub const CONSULTANT: Column = Column::new("consultant", 1);
    pub const CSAT: Column = Column::new("csat", 2);
    pub const RELEVANCE: Column = Column::new("relevance", 3);
    pub const DEPTH: Column = Column::new("depth", 4);
    pub const EXPECTATIONS: Column = Column::new("expectations", 5);
    pub const KNOWLEDGE: Column = Column::new("knowledge", 6);
    pub const CLARITY: Column = Column::new("clarity", 7);
    pub const EFFICACY: Column = Column::new("efficacy", 8);
    pub const COMMENT: Column = Column::new("comment", 9);
}

pub mod implementation_columns {
    use super::Column;

    pub const TIMESTAMP: Column = Column::new("timestamp", 0);
    pub const NAME: Column = Column::new("name", 1);
    pub const UNIT: Column = Column::new("unit", 2);
    pub const GENERAL_SAT: Column = Column::new("generalSat", 3);

    pub const TRAINER: Column = Column::new("trainer", 4);
    pub const TRAINING_SAT: Column = Column::new("trainingSat", 5);
    pub const TRAINING_EASE: Column = Column::new("trainingEase", 6);
    pub const TRAINING_COMMENT: Column = Column::new("trainingComment", 7);

    pub const TEAM_SAT: Column = Column::new("teamSat", 8);
    pub const TEAM_EASE: Column = Column::new("teamEase", 9);
    pub const TEAM_COMMENT: Column = Column::new("teamComment", 10);

    pub const ARCHITECT_SAT: Column = Column::new("architectSat", 11);
    pub const ARCHITECT_EASE: Column = Column::new("architectEase", 12);
    pub const ARCHITECT_COMMENT: Column = Column::new("architectComment", 13);

    pub const MACHINE_SUPPLIER: Column = Column::new("machineSupplier", 14);
    pub const MACHINE_SAT: Column = Column::new("machineSat", 15);
    pub const MACHINE_EASE: Column = Column::new("machineEase", 16);
    pub const MACHINE_COMMENT: Column = Column::new("machineComment", 17);

    pub const VENDPAGO_SAT: Column = Column::new("vendpagoSat", 18);
    pub const VENDPAGO_EASE: Column = Column::new("vendpagoEase", 19);
    pub const VENDPAGO_COMMENT: Column = Column::new("vendpagoComment", 20);

    pub const SULTS_SAT: Column = Column::new("sultsSat", 21);
    pub const SULTS_EASE: Column = Column::new("sultsEase", 22);
    pub const SULTS_COMMENT: Column = Column::new("sultsComment", 23);

    pub const STONE_SAT: Column = Column::new("stoneSat", 24);
    pub const STONE_EASE: Column = Column::new("stoneEase", 25);
    pub const STONE_COMMENT: Column = Column::new("stoneComment", 26);

    pub const TECHNICIAN: Column = Column::new("technician", 27);
    pub const TECHNICIAN_SAT: Column = Column::new("technicianSat", 28);
    pub const TECHNICIAN_EASE: Column = Column::new("technicianEase", 29);
    pub const TECHNICIAN_COMMENT: Column = Column::new("technicianComment", 30);
}

use cycle_columns as cc;
use implementation_columns as ic;
use meeting_columns as mc;

pub static CYCLE_SCHEMA: RowSchema = RowSchema {
    kind: SurveyKind::Cycle,
    min_fields: 20,
    columns: &[
        cc::CYCLE_ID,
        cc::TITLE,
        cc::SCORE,
        cc::ZONE,
        cc::TOTAL_INVITED,
        cc::TOTAL_RESPONDED,
        cc::COUNT_DETRACTORS,
        cc::COUNT_NEUTRALS,
        cc::COUNT_PROMOTERS,
        cc::START_DATE,
        cc::END_DATE,
        cc::RESPONDENT_ID,
        cc::RESPONDENT_NAME,
        cc::INDIVIDUAL_SCORE,
        cc::STATUS,
        cc::JUSTIFICATION,
        cc::RESPONSE_DATE,
        cc::UNIT_ID,
        cc::UNIT_NAME,
        cc::UNIT_CNPJ,
        cc::UNIT_ZONE,
    ],
};

pub static MEETING_SCHEMA: RowSchema = RowSchema {
    kind: SurveyKind::Meeting,
    min_fields: 10,
    columns: &[
        mc::TIMESTAMP,
        mc::CONSULTANT,
        mc::CSAT,
        mc::RELEVANCE,
        mc::DEPTH,
        mc::EXPECTATIONS,
        mc::KNOWLEDGE,
        mc::CLARITY,
        mc::EFFICACY,
        mc::COMMENT,
    ],
};

pub static IMPLEMENTATION_SCHEMA: RowSchema = RowSchema {
    kind: SurveyKind::Implementation,
    min_fields: 25,
    columns: &[
        ic::TIMESTAMP,
        ic::NAME,
        ic::UNIT,
        ic::GENERAL_SAT,
        ic::TRAINER,
        ic::TRAINING_SAT,
        ic::TRAINING_EASE,
        ic::TRAINING_COMMENT,
        ic::TEAM_SAT,
        ic::TEAM_EASE,
        ic::TEAM_COMMENT,
        ic::ARCHITECT_SAT,
        ic::ARCHITECT_EASE,
        ic::ARCHITECT_COMMENT,
        ic::MACHINE_SUPPLIER,
        ic::MACHINE_SAT,
        ic::MACHINE_EASE,
        ic::MACHINE_COMMENT,
        ic::VENDPAGO_SAT,
        ic::VENDPAGO_EASE,
        ic::VENDPAGO_COMMENT,
        ic::SULTS_SAT,
        ic::SULTS_EASE,
        ic::SULTS_COMMENT,
        ic::STONE_SAT,
        ic::STONE_EASE,
        ic::STONE_COMMENT,
        ic::TECHNICIAN,
        ic::TECHNICIAN_SAT,
        ic::TECHNICIAN_EASE,
        ic::TECHNICIAN_COMMENT,
    ],
};

// ******** Row outcomes *********

/// Why a data row did not produce a record.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SkipReason {
    TooFewFields {
        lineno: usize,
        found: usize,
        expected: usize,
    },
    /// Neither the respondent nor the unit is named.
    NoIdentity { lineno: usize },
    /// The cycle-level fields of the first data row could not be read.
    MalformedCycleHeader { lineno: usize, reason: String },
}

impl SkipReason {
    pub fn lineno(&self) -> usize {
        match self {
            SkipReason::TooFewFields { lineno, .. } => *lineno,
            SkipReason::NoIdentity { lineno } => *lineno,
            SkipReason::MalformedCycleHeader { lineno, .. } => *lineno,
        }
    }
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooFewFields {
                lineno,
                found,
                expected,
            } => write!(
                f,
                "line {}: {} fields found, at least {} expected",
                lineno, found, expected
            ),
            SkipReason::NoIdentity { lineno } => {
                write!(f, "line {}: no respondent or unit name", lineno)
            }
            SkipReason::MalformedCycleHeader { lineno, reason } => {
                write!(f, "line {}: malformed cycle header: {}", lineno, reason)
            }
        }
    }
}

/// The outcome of reading one data row.
#[derive(PartialEq, Debug, Clone)]
pub enum RowOutcome<T> {
    Parsed(T),
    Skipped(SkipReason),
}

impl<T> From<Result<T, SkipReason>> for RowOutcome<T> {
    fn from(r: Result<T, SkipReason>) -> Self {
        match r {
            Ok(x) => RowOutcome::Parsed(x),
            Err(reason) => RowOutcome::Skipped(reason),
        }
    }
}

/// Diagnostics of one parse call.
///
/// Skipped rows never fail a parse; this report is the only place where they
/// are visible.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ParseReport {
    /// Non-blank data rows seen (the header is not counted).
    pub rows_read: usize,
    pub rows_parsed: usize,
    pub skipped: Vec<SkipReason>,
}

impl ParseReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Accounts for one row and returns its record, if any.
    pub fn record<T>(&mut self, outcome: RowOutcome<T>) -> Option<T> {
        self.rows_read += 1;
        match outcome {
            RowOutcome::Parsed(x) => {
                self.rows_parsed += 1;
                Some(x)
            }
            RowOutcome::Skipped(reason) => {
                self.skipped.push(reason);
                None
            }
        }
    }
}

// ******** Errors *********

/// Errors of the few library operations that can fail.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SurveyError {
    UnknownSurveyKind(String),
    UnknownMigrationCategory(String),
    UnknownSubDomain(String),
}

impl Error for SurveyError {}

impl Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::UnknownSurveyKind(s) => write!(f, "unknown survey kind: {:?}", s),
            SurveyError::UnknownMigrationCategory(s) => {
                write!(f, "unknown migration category: {:?}", s)
            }
            SurveyError::UnknownSubDomain(s) => write!(f, "unknown sub-domain: {:?}", s),
        }
    }
}
