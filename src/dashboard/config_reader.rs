use crate::dashboard::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use survey_pulse::{MigrationCategory, SurveyKind};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "dashboardName")]
    pub dashboard_name: Option<String>,
    /// A file path, or "stdout".
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub kind: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// Only meaningful for cycles.
    #[serde(default)]
    pub hidden: bool,
}

impl FileSource {
    pub fn survey_kind(&self) -> DashboardResult<SurveyKind> {
        self.kind.parse::<SurveyKind>().context(UnknownKindSnafu {
            path: self.file_path.clone(),
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ComparisonSettings {
    pub filter: Option<String>,
    pub search: Option<String>,
}

impl ComparisonSettings {
    pub fn category(&self) -> DashboardResult<MigrationCategory> {
        match &self.filter {
            None => Ok(MigrationCategory::All),
            Some(s) if s.trim().is_empty() => Ok(MigrationCategory::All),
            Some(s) => s.parse::<MigrationCategory>().context(InvalidFilterSnafu {}),
        }
    }

    pub fn search_text(&self) -> String {
        self.search.clone().unwrap_or_default()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    pub sources: Vec<FileSource>,
    #[serde(default)]
    pub comparison: ComparisonSettings,
}

pub fn read_config(path: &str) -> DashboardResult<DashboardConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DashboardConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> DashboardResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
