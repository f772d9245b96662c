// Selection of individual responses, for the feedback list.

use crate::model::SurveyRecord;
use crate::scales::Status;

/// Selection on the individual score of a response.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum ScoreFilter {
    #[default]
    Any,
    /// Responses without a score.
    NoScore,
    Exactly(u8),
}

impl ScoreFilter {
    pub fn matches(&self, record: &SurveyRecord) -> bool {
        match self {
            ScoreFilter::Any => true,
            ScoreFilter::NoScore => !record.has_score(),
            ScoreFilter::Exactly(value) => record.score() == Some(*value as f64),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FeedbackFilter {
    /// None selects every status.
    pub status: Option<Status>,
    pub score: ScoreFilter,
    /// Case-insensitive text searched in the respondent name, the unit name
    /// and the justification.
    pub search: String,
}

impl FeedbackFilter {
    pub fn matches(&self, record: &SurveyRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if !self.score.matches(record) {
            return false;
        }
        let needle = self.search.to_lowercase();
        needle.is_empty()
            || record.respondent_name.to_lowercase().contains(&needle)
            || record.unit_name.to_lowercase().contains(&needle)
            || record.justification.to_lowercase().contains(&needle)
    }

    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a SurveyRecord>
    where
        I: IntoIterator<Item = &'a SurveyRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
