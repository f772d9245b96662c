mod config_reader;
mod io_common;
mod io_excel;

use log::{debug, info, warn};
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use survey_pulse::*;
use text_diff::print_diff;

use crate::args::Args;
use crate::dashboard::config_reader::*;
use crate::dashboard::io_common::*;

#[derive(Debug, Snafu)]
pub enum DashboardError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} has no worksheet named {name:?}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Error reading file {path}"))]
    ReadingInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid survey kind for source {path}"))]
    UnknownKind { source: SurveyError, path: String },
    #[snafu(display("Invalid comparison filter"))]
    InvalidFilter { source: SurveyError },
    #[snafu(display("The configuration {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("No survey source: pass --input or a configuration with sources"))]
    MissingInput {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashboardResult<T> = Result<T, DashboardError>;

/// What became of one source file.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub file_name: String,
    pub kind: SurveyKind,
    pub report: ParseReport,
    pub header_error: Option<SkipReason>,
    /// For cycles only.
    pub cycle_id: Option<String>,
    pub outcome: Option<AddOutcome>,
}

/// Everything read from the sources of a dashboard.
#[derive(Debug, Default)]
pub struct LoadedSurveys {
    pub history: CycleHistory,
    pub meetings: Vec<MeetingRecord>,
    pub implementations: Vec<ImplementationRecord>,
    pub sources: Vec<SourceSummary>,
}

impl LoadedSurveys {
    pub fn ingest(&mut self, kind: SurveyKind, file_name: &str, text: &str, hidden: bool) {
        let mut summary = SourceSummary {
            file_name: file_name.to_string(),
            kind,
            report: ParseReport::default(),
            header_error: None,
            cycle_id: None,
            outcome: None,
        };
        match kind {
            SurveyKind::Cycle => {
                let parsed = parse_cycle_survey(text);
                summary.report = parsed.report.clone();
                summary.header_error = parsed.header_error.clone();
                summary.cycle_id = parsed.stats.as_ref().map(|s| s.id.clone());
                summary.outcome = self.history.add_parsed(parsed);
                match (&summary.outcome, &summary.cycle_id) {
                    (Some(AddOutcome::Added), Some(id)) => {
                        if hidden {
                            self.history.set_visible(id, false);
                        }
                    }
                    (Some(AddOutcome::Duplicate), Some(id)) => {
                        warn!(
                            "ingest: cycle {:?} of {} was already loaded, keeping the first copy",
                            id, file_name
                        );
                    }
                    _ => {
                        warn!("ingest: no cycle could be read from {}", file_name);
                    }
                }
            }
            SurveyKind::Meeting => {
                let mut parsed = parse_meeting_survey(text);
                summary.report = parsed.report;
                self.meetings.append(&mut parsed.records);
            }
            SurveyKind::Implementation => {
                let mut parsed = parse_implementation_survey(text);
                summary.report = parsed.report;
                self.implementations.append(&mut parsed.records);
            }
        }
        info!(
            "ingest: {} ({}): {} rows read, {} parsed, {} skipped",
            file_name,
            kind,
            summary.report.rows_read,
            summary.report.rows_parsed,
            summary.report.skipped_count()
        );
        self.sources.push(summary);
    }
}

fn load_sources(root: &Path, sources: &[FileSource]) -> DashboardResult<LoadedSurveys> {
    let mut loaded = LoadedSurveys::default();
    for source in sources {
        let kind = source.survey_kind()?;
        let path = resolve_path(root, &source.file_path);
        debug!("load_sources: {:?} as {}", path, kind);
        let text = read_input_text(&path, source.excel_worksheet_name.as_deref())?;
        loaded.ingest(
            kind,
            &simplify_file_name(&source.file_path),
            &text,
            source.hidden,
        );
    }
    Ok(loaded)
}

fn source_to_json(s: &SourceSummary) -> JSValue {
    json!({
        "fileName": s.file_name,
        "kind": s.kind.to_string(),
        "rowsRead": s.report.rows_read,
        "rowsParsed": s.report.rows_parsed,
        "skipped": s.report.skipped.iter().map(|r| r.to_string()).collect::<Vec<String>>(),
        "headerError": s.header_error.as_ref().map(|r| r.to_string()),
        "cycleId": s.cycle_id,
        "duplicate": s.outcome == Some(AddOutcome::Duplicate),
    })
}

fn cycle_to_json(c: &CycleSnapshot, visible: bool) -> JSValue {
    let s = &c.stats;
    json!({
        "id": s.id,
        "title": s.title,
        "period": short_period_label(&s.start_date),
        "score": s.score,
        "zone": s.zone,
        "derivedZone": s.derived_zone().label(),
        "startDate": s.start_date,
        "endDate": s.end_date,
        "totalInvited": s.total_invited,
        "totalResponded": s.total_responded,
        "countPromoters": s.count_promoters,
        "countNeutrals": s.count_neutrals,
        "countDetractors": s.count_detractors,
        "countsConsistent": s.counts_are_consistent(),
        "unitsInvited": s.total_units_invited,
        "unitsResponded": s.total_units_responded,
        "responses": c.records.len(),
        "visible": visible,
    })
}

fn trend_to_json(p: &TrendPoint) -> JSValue {
    json!({
        "id": p.id,
        "title": p.title,
        "period": p.period,
        "score": p.score,
        "totalInvited": p.total_invited,
        "totalResponded": p.total_responded,
        "unitsInvited": p.units_invited,
        "unitsResponded": p.units_responded,
        "responseRate": p.response_rate,
        "unitResponseRate": p.unit_response_rate,
    })
}

fn migration_to_json(m: &Migration) -> JSValue {
    json!({
        "respondentId": m.respondent_id,
        "name": m.name,
        "unit": m.unit,
        "oldScore": m.oldest.score(),
        "newScore": m.newest.score(),
        "oldStatus": m.oldest.status.label(),
        "newStatus": m.newest.status.label(),
        "oldDate": m.oldest.response_date,
        "newDate": m.newest.response_date,
        "scoreDelta": m.score_delta,
        "trend": m.trend.name(),
        "transition": m.transition_label(),
    })
}

fn migrations_to_json(report: &MigrationReport, category: MigrationCategory, search: &str) -> JSValue {
    let c = &report.counts;
    let selected = report.filter(category, search);
    json!({
        "counts": {
            "total": c.total,
            "improved": c.improved,
            "stable": c.stable,
            "declined": c.declined,
            "recoveredDetractors": c.recovered_detractors,
            "lostPromoters": c.lost_promoters,
            "retainedNeutrals": c.retained_neutrals,
        },
        "filter": category.name(),
        "search": search,
        "items": selected.iter().map(|m| migration_to_json(m)).collect::<Vec<JSValue>>(),
    })
}

fn meetings_to_json(records: &[MeetingRecord]) -> JSValue {
    if records.is_empty() {
        return JSValue::Null;
    }
    let stats = meeting_stats(records);
    let matrix = consultant_matrix(records.iter());
    json!({
        "totalMeetings": stats.total_meetings,
        "avgCsat": stats.avg_csat,
        "topConsultant": stats.top_consultant,
        "topByVolume": top_consultant_by_volume(&matrix).map(|r| r.name.clone()),
        "ranking": stats.consultant_scores.iter().map(|c| json!({
            "name": c.name,
            "score": c.score,
            "count": c.count,
        })).collect::<Vec<JSValue>>(),
        "criteria": stats.criteria_scores.iter().map(|c| json!({
            "criterion": c.criterion.label(),
            "score": c.score,
        })).collect::<Vec<JSValue>>(),
        "consultants": matrix.iter().map(|r| json!({
            "name": r.name,
            "count": r.count,
            "avgCsat": r.avg_csat,
            "avgTechnical": r.avg_technical,
        })).collect::<Vec<JSValue>>(),
    })
}

fn partners_to_json(partners: &[PartnerScore]) -> Vec<JSValue> {
    partners
        .iter()
        .map(|p| json!({ "name": p.name, "avg": p.avg, "count": p.count }))
        .collect()
}

fn implementation_to_json(records: &[ImplementationRecord]) -> JSValue {
    let stats = match implementation_stats(records) {
        Some(stats) => stats,
        None => return JSValue::Null,
    };
    let breakdown: Vec<JSValue> = SubDomain::ALL
        .iter()
        .map(|d| {
            let b = subdomain_breakdown(records.iter(), *d);
            json!({
                "domain": b.domain.label(),
                "answered": b.answered,
                "avg": b.avg,
                "satisfactionCounts": b.satisfaction_counts.to_vec(),
                "easeCounts": b.ease_counts.to_vec(),
                "easeOther": b.ease_other,
                "partners": partners_to_json(&b.partners),
            })
        })
        .collect();
    json!({
        "totalRecords": stats.total_records,
        "avgGeneral": stats.avg_general,
        "averages": stats.averages.iter().map(|a| json!({
            "domain": a.domain.label(),
            "avg": a.avg,
        })).collect::<Vec<JSValue>>(),
        "machineSuppliers": partners_to_json(&stats.machine_suppliers),
        "breakdown": breakdown,
    })
}

/// The summary of a dashboard, in the layout written to the output.
pub fn build_summary(
    dashboard_name: Option<&str>,
    loaded: &LoadedSurveys,
    category: MigrationCategory,
    search: &str,
) -> JSValue {
    let history = &loaded.history;
    let records = history.visible_records();
    let report = compute_migrations(records.iter().copied());
    let units: Vec<JSValue> = entity_names(records.iter().copied(), EntityKind::Unit)
        .iter()
        .map(|e| json!({ "name": e.name, "count": e.count }))
        .collect();
    json!({
        "config": { "dashboardName": dashboard_name },
        "sources": loaded.sources.iter().map(source_to_json).collect::<Vec<JSValue>>(),
        "cycles": history
            .cycles()
            .iter()
            .map(|c| cycle_to_json(c, history.is_visible(c.id())))
            .collect::<Vec<JSValue>>(),
        "activeCycle": history.active_cycle().map(|c| c.id()),
        "trend": history.trend_points().iter().map(trend_to_json).collect::<Vec<JSValue>>(),
        "units": units,
        "migrations": migrations_to_json(&report, category, search),
        "meetings": meetings_to_json(&loaded.meetings),
        "implementation": implementation_to_json(&loaded.implementations),
    })
}

fn write_summary(pretty: &str, output_path: Option<&Path>) -> DashboardResult<()> {
    match output_path {
        Some(p) if p.as_os_str() != "stdout" => {
            info!("write_summary: writing to {:?}", p);
            fs::write(p, pretty).context(WritingOutputSnafu {
                path: p.display().to_string(),
            })
        }
        _ => {
            println!("{}", pretty);
            Ok(())
        }
    }
}

fn check_summary(pretty: &str, reference_path: &str) -> DashboardResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_ref != pretty {
        warn!("Found differences with the reference summary");
        print_diff(pretty_ref.as_str(), pretty, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("check_summary: the summary matches {}", reference_path);
    Ok(())
}

pub fn run_dashboard(args: &Args) -> DashboardResult<()> {
    let (mut config, mut root): (DashboardConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {
                    path: config_path.clone(),
                })?
                .to_path_buf();
            (config, root)
        }
        None => (DashboardConfig::default(), PathBuf::new()),
    };

    // Command line settings take precedence over the configuration.
    if let Some(input) = &args.input {
        config.sources = vec![FileSource {
            kind: args.input_type.clone().unwrap_or_else(|| "cycle".to_string()),
            file_path: input.clone(),
            excel_worksheet_name: args.excel_worksheet_name.clone(),
            hidden: false,
        }];
        root = PathBuf::new();
    }
    if args.filter.is_some() {
        config.comparison.filter = args.filter.clone();
    }
    if args.search.is_some() {
        config.comparison.search = args.search.clone();
    }
    info!("config: {:?}", config);

    ensure!(!config.sources.is_empty(), MissingInputSnafu {});
    let category = config.comparison.category()?;

    let loaded = load_sources(&root, &config.sources)?;
    let summary = build_summary(
        config.output_settings.dashboard_name.as_deref(),
        &loaded,
        category,
        &config.comparison.search_text(),
    );
    let pretty = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;

    let output_path: Option<PathBuf> = match (&args.out, &config.output_settings.output_path) {
        (Some(out), _) => Some(PathBuf::from(out)),
        (None, Some(p)) if p == "stdout" => Some(PathBuf::from(p)),
        (None, Some(p)) => Some(resolve_path(&root, p)),
        (None, None) => None,
    };
    write_summary(&pretty, output_path.as_deref())?;

    if let Some(reference_path) = &args.reference {
        check_summary(&pretty, reference_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const CYCLE_HEADER: &str = "ID,Titulo,NPS,Zona,Convidados,Respondentes,Detratores,Neutros,Promotores,Inicio,Fim,X,RID,Nome,Nota,Status,Justificativa,Data,UID,Unidade";

    fn cycle_text(cycle: &str, start: &str, rows: &[(&str, &str, &str, &str)]) -> String {
        let mut lines = vec![CYCLE_HEADER.to_string()];
        for (id, name, score, status) in rows {
            lines.push(format!(
                "{},Ciclo {},50,Zona de Qualidade,10,4,1,1,2,{},,,{},{},{},{},,{},U-{},Loja {}",
                cycle, cycle, start, id, name, score, status, start, name, name
            ));
        }
        lines.join("\n")
    }

    fn sample_loaded() -> LoadedSurveys {
        let mut loaded = LoadedSurveys::default();
        loaded.ingest(
            SurveyKind::Cycle,
            "mar.csv",
            &cycle_text(
                "C3",
                "01/03/2024",
                &[("R1", "Ana", "9", "Promotor"), ("R2", "Bia", "6", "Detrator")],
            ),
            false,
        );
        loaded.ingest(
            SurveyKind::Cycle,
            "jan.csv",
            &cycle_text(
                "C1",
                "01/01/2024",
                &[("R1", "Ana", "3", "Detrator"), ("R2", "Bia", "10", "Promotor")],
            ),
            false,
        );
        loaded
    }

    #[test]
    fn ingest_cycles() {
        init();
        let mut loaded = sample_loaded();
        loaded.ingest(
            SurveyKind::Cycle,
            "jan_copy.csv",
            &cycle_text("C1", "01/01/2024", &[("R9", "Zoe", "1", "Detrator")]),
            true,
        );
        loaded.ingest(SurveyKind::Cycle, "empty.csv", CYCLE_HEADER, false);

        assert_eq!(loaded.history.len(), 2);
        assert_eq!(loaded.sources.len(), 4);
        assert_eq!(loaded.sources[2].outcome, Some(AddOutcome::Duplicate));
        // The hidden flag of a duplicate does not touch the first copy.
        assert!(loaded.history.is_visible("C1"));
        assert_eq!(loaded.sources[3].outcome, None);
        assert_eq!(loaded.sources[3].report.rows_read, 0);
    }

    #[test]
    fn hidden_cycle() {
        init();
        let mut loaded = sample_loaded();
        loaded.ingest(
            SurveyKind::Cycle,
            "feb.csv",
            &cycle_text("C2", "01/02/2024", &[("R1", "Ana", "5", "Detrator")]),
            true,
        );
        assert_eq!(loaded.history.len(), 3);
        assert!(!loaded.history.is_visible("C2"));

        let summary = build_summary(None, &loaded, MigrationCategory::All, "");
        let trend = summary["trend"].as_array().unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(summary["cycles"][1]["id"], "C2");
        assert_eq!(summary["cycles"][1]["visible"], false);
    }

    #[test]
    fn summary_layout() {
        init();
        let loaded = sample_loaded();
        let summary = build_summary(Some("Pesquisa"), &loaded, MigrationCategory::All, "");
        assert_eq!(summary["config"]["dashboardName"], "Pesquisa");
        assert_eq!(summary["activeCycle"], "C3");
        assert_eq!(summary["cycles"][0]["id"], "C1");
        assert_eq!(summary["cycles"][0]["period"], "01/24");
        assert_eq!(summary["migrations"]["counts"]["total"], 2);
        assert_eq!(summary["migrations"]["counts"]["recoveredDetractors"], 1);
        assert_eq!(summary["migrations"]["counts"]["lostPromoters"], 1);
        assert_eq!(summary["migrations"]["items"][0]["transition"], "Detrator ➝ Promotor");
        assert_eq!(summary["units"].as_array().unwrap().len(), 2);
        assert_eq!(summary["meetings"], JSValue::Null);
        assert_eq!(summary["implementation"], JSValue::Null);

        let declined = build_summary(None, &loaded, MigrationCategory::Declined, "");
        let items = declined["migrations"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Bia");
        assert_eq!(items[0]["scoreDelta"], -4.0);
        // The counts do not depend on the selection.
        assert_eq!(declined["migrations"]["counts"]["total"], 2);
    }

    #[test]
    fn meeting_summary() {
        init();
        let text = "Carimbo,Consultor,CSAT,C1,C2,C3,C4,C5,C6,Comentario\n\
            01/03/2024,Rita,5,Concordo totalmente,Concordo,Neutro,Concordo,Concordo,Concordo,ok\n\
            02/03/2024,Rita,3,Concordo,Concordo,Concordo,Concordo,Concordo,Concordo,\n\
            03/03/2024,Davi,4,Discordo,Concordo,Concordo,Concordo,Concordo,Concordo,";
        let mut loaded = LoadedSurveys::default();
        loaded.ingest(SurveyKind::Meeting, "reunioes.csv", text, false);
        let summary = build_summary(None, &loaded, MigrationCategory::All, "");
        let meetings = &summary["meetings"];
        assert_eq!(meetings["totalMeetings"], 3);
        assert_eq!(meetings["avgCsat"], 4.0);
        assert_eq!(meetings["topByVolume"], "Rita");
        assert_eq!(meetings["criteria"].as_array().unwrap().len(), 6);
        assert_eq!(summary["sources"][0]["rowsParsed"], 3);
        assert_eq!(summary["cycles"].as_array().unwrap().len(), 0);
        assert_eq!(summary["activeCycle"], JSValue::Null);
    }

    #[test]
    fn run_with_files() {
        init();
        let dir = std::env::temp_dir().join(format!("pulsedash_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("jan.csv"),
            cycle_text("C1", "01/01/2024", &[("R1", "Ana", "3", "Detrator")]),
        )
        .unwrap();
        fs::write(
            dir.join("mar.csv"),
            cycle_text("C3", "01/03/2024", &[("R1", "Ana", "9", "Promotor")]),
        )
        .unwrap();
        let config = r#"{
            "outputSettings": { "dashboardName": "Teste", "outputPath": "summary.json" },
            "sources": [
                { "kind": "cycle", "filePath": "jan.csv" },
                { "kind": "nps", "filePath": "mar.csv" }
            ],
            "comparison": { "filter": "recovered_detractor" }
        }"#;
        let config_path = dir.join("config.json");
        fs::write(&config_path, config).unwrap();

        let args = Args {
            config: Some(config_path.display().to_string()),
            reference: None,
            out: None,
            input: None,
            input_type: None,
            excel_worksheet_name: None,
            filter: None,
            search: None,
            verbose: false,
        };
        run_dashboard(&args).unwrap();
        let summary_path = dir.join("summary.json").display().to_string();
        let summary = read_summary(&summary_path).unwrap();
        assert_eq!(summary["config"]["dashboardName"], "Teste");
        assert_eq!(summary["migrations"]["filter"], "recovered_detractor");
        assert_eq!(summary["migrations"]["items"][0]["name"], "Ana");

        // The written summary is its own reference.
        let checked = Args {
            reference: Some(summary_path.clone()),
            ..args.clone()
        };
        run_dashboard(&checked).unwrap();

        // A different selection no longer matches it.
        let other = Args {
            reference: Some(summary_path),
            out: Some(dir.join("other.json").display().to_string()),
            filter: Some("declined".to_string()),
            ..args
        };
        assert!(matches!(
            run_dashboard(&other),
            Err(DashboardError::Whatever { .. })
        ));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_input() {
        let args = Args {
            config: None,
            reference: None,
            out: None,
            input: None,
            input_type: None,
            excel_worksheet_name: None,
            filter: None,
            search: None,
            verbose: false,
        };
        assert!(matches!(
            run_dashboard(&args),
            Err(DashboardError::MissingInput {})
        ));
    }
}
