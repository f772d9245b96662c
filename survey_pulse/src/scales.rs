// ********* Classification scales **********
//
// Every free-text label of the exports is mapped to a closed enumeration by a
// single classifier per scale. The matching is always case-insensitive and by
// substring, so the order of the checks matters when phrases overlap.

use std::fmt::Display;

/// Three-way satisfaction classification of a respondent.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Status {
    Detractor,
    Neutral,
    Promoter,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Promoter, Status::Neutral, Status::Detractor];

    /// Classifies the status label supplied by the export.
    ///
    /// Anything that mentions neither "promotor" nor "detrator" is neutral,
    /// including the empty label.
    pub fn classify(label: &str) -> Status {
        let lower = label.to_lowercase();
        if lower.contains("promotor") {
            Status::Promoter
        } else if lower.contains("detrator") {
            Status::Detractor
        } else {
            Status::Neutral
        }
    }

    /// The label used by the exports.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Promoter => "Promotor",
            Status::Neutral => "Neutro",
            Status::Detractor => "Detrator",
        }
    }

    /// Position on the satisfaction ladder, used to tell upgrades from downgrades.
    pub fn rank(&self) -> u8 {
        match self {
            Status::Detractor => 0,
            Status::Neutral => 1,
            Status::Promoter => 2,
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Five-point agreement scale of the meeting survey.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum AgreementLevel {
    StronglyAgree,
    Agree,
    Neutral,
    Disagree,
    StronglyDisagree,
    /// The answer is missing or is not one of the five phrases.
    Unrated,
}

impl AgreementLevel {
    pub fn classify(answer: &str) -> AgreementLevel {
        let lower = answer.to_lowercase();
        // "concordo totalmente" contains "concordo": it must be checked first.
        if lower.contains("concordo totalmente") {
            AgreementLevel::StronglyAgree
        } else if lower.contains("concordo") && !lower.contains("totalmente") {
            AgreementLevel::Agree
        } else if lower.contains("neutro") {
            AgreementLevel::Neutral
        } else if lower.contains("discordo") && !lower.contains("totalmente") {
            AgreementLevel::Disagree
        } else if lower.contains("discordo totalmente") {
            AgreementLevel::StronglyDisagree
        } else {
            AgreementLevel::Unrated
        }
    }

    /// The value on the 1-5 scale, 0 when unrated.
    pub fn score(&self) -> u32 {
        match self {
            AgreementLevel::StronglyAgree => 5,
            AgreementLevel::Agree => 4,
            AgreementLevel::Neutral => 3,
            AgreementLevel::Disagree => 2,
            AgreementLevel::StronglyDisagree => 1,
            AgreementLevel::Unrated => 0,
        }
    }
}

/// Perceived effort of one step of the implementation.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum EaseLevel {
    VeryHard,
    Hard,
    Neutral,
    Easy,
    VeryEasy,
    /// Some text that is not on the scale.
    Other,
    NotAnswered,
}

impl EaseLevel {
    /// The levels of the scale, from the hardest to the easiest.
    pub const SCALE: [EaseLevel; 5] = [
        EaseLevel::VeryHard,
        EaseLevel::Hard,
        EaseLevel::Neutral,
        EaseLevel::Easy,
        EaseLevel::VeryEasy,
    ];

    pub fn classify(answer: &str) -> EaseLevel {
        let lower = answer.trim().to_lowercase();
        if lower.is_empty() {
            return EaseLevel::NotAnswered;
        }
        // The "muito" phrases contain their plain counterparts.
        if lower.contains("muito difícil") || lower.contains("muito dificil") {
            EaseLevel::VeryHard
        } else if lower.contains("muito fácil") || lower.contains("muito facil") {
            EaseLevel::VeryEasy
        } else if lower.contains("difícil") || lower.contains("dificil") {
            EaseLevel::Hard
        } else if lower.contains("fácil") || lower.contains("facil") {
            EaseLevel::Easy
        } else if lower.contains("neutro") {
            EaseLevel::Neutral
        } else {
            EaseLevel::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EaseLevel::VeryHard => "Muito difícil",
            EaseLevel::Hard => "Difícil",
            EaseLevel::Neutral => "Neutro",
            EaseLevel::Easy => "Fácil",
            EaseLevel::VeryEasy => "Muito fácil",
            EaseLevel::Other => "Outros",
            EaseLevel::NotAnswered => "",
        }
    }
}

/// Qualitative zone of a cycle, derived from its headline score.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CycleZone {
    Excellence,
    Quality,
    Improvement,
    Critical,
}

impl CycleZone {
    /// Scores at or above 75 are excellent, 50 quality, 0 need improvement.
    /// A missing score (NaN) is critical.
    pub fn from_score(score: f64) -> CycleZone {
        if score >= 75.0 {
            CycleZone::Excellence
        } else if score >= 50.0 {
            CycleZone::Quality
        } else if score >= 0.0 {
            CycleZone::Improvement
        } else {
            CycleZone::Critical
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CycleZone::Excellence => "Zona de Excelência",
            CycleZone::Quality => "Zona de Qualidade",
            CycleZone::Improvement => "Zona de Aperfeiçoamento",
            CycleZone::Critical => "Zona Crítica",
        }
    }
}

impl Display for CycleZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
