use clap::Parser;

/// This is a dashboard for satisfaction, meeting and implementation survey exports.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the dashboard: the survey sources, the output and
    /// the comparison settings. See the manual of survey_pulse for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, pulsedash will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A single survey export (CSV text or Excel workbook) to analyze. Setting this
    /// option overrides the sources of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default cycle) The kind of the input: cycle (or nps), meeting, implementation.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: the first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (default all) The category of the migrations to list: all, improved, stable, declined,
    /// recovered_detractor, lost_promoter, retained_neutral.
    #[clap(long, value_parser)]
    pub filter: Option<String>,

    /// (text or empty) Only list the migrations whose respondent or unit contains this text.
    #[clap(long, value_parser)]
    pub search: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
