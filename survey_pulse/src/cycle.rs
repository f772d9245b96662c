// Parser for the satisfaction score (NPS) cycle exports.
//
// Every data row of such an export repeats the cycle-level figures (columns
// 0 to 10) next to the fields of one individual response.

use log::{debug, info, warn};
use std::collections::HashSet;

use crate::model::*;
use crate::scales::Status;
use crate::schema::{cycle_columns as cc, Row, RowOutcome, SkipReason, CYCLE_SCHEMA};
use crate::tokenizer::{data_rows, parse_decimal, parse_int_prefix};

/// Parses a cycle export.
///
/// The cycle statistics are read from the first data row only; later rows
/// only contribute responses. The unit counts of the statistics are derived
/// from the responses: a unit is invited as soon as it appears in a row, and
/// has responded when at least one of its rows carries a score.
///
/// Rows that cannot be read are skipped and listed in the report. When the
/// cycle-level fields of the first row are malformed, `stats` is None and the
/// caller should treat the file as holding no cycle.
///
/// ```
/// use survey_pulse::parse_cycle_survey;
///
/// let mut row = vec![""; 20];
/// row[0] = "C1";
/// row[2] = "55,5";
/// row[13] = "Maria";
/// row[14] = "9";
/// row[15] = "Promotor";
/// row[18] = "U1";
/// let text = format!("header\n{}", row.join(","));
///
/// let parsed = parse_cycle_survey(&text);
/// let stats = parsed.stats.unwrap();
/// assert_eq!(stats.score, 55.5);
/// assert_eq!(stats.total_units_responded, 1);
/// assert_eq!(parsed.records.len(), 1);
/// ```
pub fn parse_cycle_survey(text: &str) -> CycleParse {
    let mut parsed = CycleParse {
        stats: None,
        records: Vec::new(),
        report: Default::default(),
        header_error: None,
    };
    let mut units_invited: HashSet<String> = HashSet::new();
    let mut units_responded: HashSet<String> = HashSet::new();
    let mut header_read = false;

    for (lineno, fields) in data_rows(text) {
        let row = match CYCLE_SCHEMA.row(lineno, &fields) {
            Ok(row) => row,
            Err(reason) => {
                debug!("parse_cycle_survey: skipping: {}", reason);
                parsed.report.record::<SurveyRecord>(RowOutcome::Skipped(reason));
                continue;
            }
        };

        // Only the first row that passes the length check is considered for
        // the cycle-level fields.
        if !header_read {
            header_read = true;
            match read_cycle_statistics(&row) {
                Ok(stats) => {
                    debug!("parse_cycle_survey: cycle {:?}", stats.id);
                    parsed.stats = Some(stats);
                }
                Err(reason) => {
                    warn!("parse_cycle_survey: no cycle statistics: {}", reason);
                    parsed.header_error = Some(reason);
                }
            }
        }

        let outcome = read_response(&row, &mut units_invited, &mut units_responded);
        if let RowOutcome::Skipped(reason) = &outcome {
            warn!("parse_cycle_survey: skipping: {}", reason);
        }
        if let Some(record) = parsed.report.record(outcome) {
            parsed.records.push(record);
        }
    }

    if let Some(stats) = parsed.stats.as_mut() {
        stats.total_units_invited = units_invited.len();
        stats.total_units_responded = units_responded.len();
    }

    info!(
        "parse_cycle_survey: cycle: {:?} records: {} skipped: {} units invited: {} units responded: {}",
        parsed.stats.as_ref().map(|s| s.id.as_str()),
        parsed.records.len(),
        parsed.report.skipped_count(),
        units_invited.len(),
        units_responded.len()
    );
    parsed
}

fn read_cycle_statistics(row: &Row) -> Result<CycleStatistics, SkipReason> {
    let id = row.text(cc::CYCLE_ID);
    if id.is_empty() {
        return Err(SkipReason::MalformedCycleHeader {
            lineno: row.lineno,
            reason: "empty cycle identifier".to_string(),
        });
    }
    Ok(CycleStatistics {
        id,
        title: row.text(cc::TITLE),
        score: parse_decimal(&row.text(cc::SCORE)),
        zone: row.text(cc::ZONE),
        total_invited: row.int(cc::TOTAL_INVITED),
        total_responded: row.int(cc::TOTAL_RESPONDED),
        count_detractors: row.int(cc::COUNT_DETRACTORS),
        count_neutrals: row.int(cc::COUNT_NEUTRALS),
        count_promoters: row.int(cc::COUNT_PROMOTERS),
        start_date: row.text(cc::START_DATE),
        end_date: row.text(cc::END_DATE),
        // Filled once all the rows are read.
        total_units_invited: 0,
        total_units_responded: 0,
    })
}

fn read_response(
    row: &Row,
    units_invited: &mut HashSet<String>,
    units_responded: &mut HashSet<String>,
) -> RowOutcome<SurveyRecord> {
    let score_text = row.text(cc::INDIVIDUAL_SCORE);
    let unit_id = row.text(cc::UNIT_ID);

    // The unit is invited even when the row does not become a record.
    if !unit_id.is_empty() {
        units_invited.insert(unit_id.clone());
    }

    let score = if score_text.is_empty() {
        f64::NAN
    } else {
        if !unit_id.is_empty() {
            units_responded.insert(unit_id.clone());
        }
        parse_int_prefix(&score_text)
            .map(|x| x as f64)
            .unwrap_or(f64::NAN)
    };

    let respondent_name = row.text(cc::RESPONDENT_NAME);
    let unit_name = row.text(cc::UNIT_NAME);
    if respondent_name.is_empty() && unit_name.is_empty() {
        return RowOutcome::Skipped(SkipReason::NoIdentity { lineno: row.lineno });
    }

    RowOutcome::Parsed(SurveyRecord {
        respondent_id: row.text(cc::RESPONDENT_ID),
        respondent_name,
        score,
        status: Status::classify(&row.text(cc::STATUS)),
        justification: row.text(cc::JUSTIFICATION),
        response_date: row.text(cc::RESPONSE_DATE),
        unit_id,
        unit_name,
        unit_cnpj: row.text(cc::UNIT_CNPJ),
        unit_zone: row.text(cc::UNIT_ZONE),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const HEADER: &str = "ID NPS,Título,NPS,Zona,Convidados,Respondentes,Detratores,Neutros,Promotores,Início,Fim,Pergunta,ID Respondente,Respondente,Nota,Status,Justificativa,Data Resposta,ID Unidade,Unidade,Razão Social,CNPJ,Cidade,Regional";

    /// A response row of 24 fields; the cycle-level fields describe cycle `cycle_id`.
    pub(crate) fn response_row(
        cycle_id: &str,
        start_date: &str,
        respondent: (&str, &str),
        score: &str,
        status: &str,
        unit: (&str, &str),
        response_date: &str,
    ) -> String {
        let mut fields: Vec<String> = vec![String::new(); 24];
        fields[0] = cycle_id.to_string();
        fields[1] = format!("Ciclo {}", cycle_id);
        fields[2] = "\"45,5\"".to_string();
        fields[3] = "Zona de Aperfeiçoamento".to_string();
        fields[4] = "120".to_string();
        fields[5] = "40".to_string();
        fields[6] = "10".to_string();
        fields[7] = "8".to_string();
        fields[8] = "22".to_string();
        fields[9] = start_date.to_string();
        fields[10] = "28/02/2024".to_string();
        fields[11] = "Recomendaria?".to_string();
        fields[12] = respondent.0.to_string();
        fields[13] = respondent.1.to_string();
        fields[14] = score.to_string();
        fields[15] = status.to_string();
        fields[16] = "\"Bom, mas pode melhorar\"".to_string();
        fields[17] = response_date.to_string();
        fields[18] = unit.0.to_string();
        fields[19] = unit.1.to_string();
        fields[21] = "12.345.678/0001-90".to_string();
        fields[23] = "Sul".to_string();
        fields.join(",")
    }

    fn export(rows: &[String]) -> String {
        let mut lines = vec![HEADER.to_string()];
        lines.extend(rows.iter().cloned());
        lines.join("\n")
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn end_to_end_three_rows() {
        init();
        let text = export(&[
            response_row("C1", "01/02/2024", ("R1", "Ana"), "9", "Promotor", ("U1", "Centro"), "02/02/2024 10:00"),
            response_row("C1", "01/02/2024", ("R2", "Bia"), "", "", ("U1", "Centro"), "03/02/2024 10:00"),
            response_row("C1", "01/02/2024", ("R3", "Caio"), "2", "Detrator", ("U2", "Norte"), "04/02/2024 10:00"),
        ]);
        let parsed = parse_cycle_survey(&text);
        let stats = parsed.stats.clone().unwrap();
        assert_eq!(stats.id, "C1");
        assert_eq!(stats.title, "Ciclo C1");
        assert_eq!(stats.score, 45.5);
        assert_eq!(stats.total_invited, 120);
        assert_eq!(stats.total_responded, 40);
        // Supplied by the export, not recomputed from the rows.
        assert_eq!(stats.count_promoters, 22);
        assert_eq!(stats.count_neutrals, 8);
        assert_eq!(stats.count_detractors, 10);
        assert_eq!(stats.start_date, "01/02/2024");
        assert_eq!(stats.end_date, "28/02/2024");
        assert_eq!(stats.total_units_invited, 2);
        // Both units have at least one scored row.
        assert_eq!(stats.total_units_responded, 2);

        assert_eq!(parsed.records.len(), 3);
        let scores: Vec<Option<f64>> = parsed.records.iter().map(|r| r.score()).collect();
        assert_eq!(scores, vec![Some(9.0), None, Some(2.0)]);
        let statuses: Vec<Status> = parsed.records.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![Status::Promoter, Status::Neutral, Status::Detractor]
        );

        let first = &parsed.records[0];
        assert_eq!(first.respondent_id, "R1");
        assert_eq!(first.justification, "Bom, mas pode melhorar");
        assert_eq!(first.unit_cnpj, "12.345.678/0001-90");
        assert_eq!(first.unit_zone, "Sul");
        assert_eq!(first.response_date, "02/02/2024 10:00");
        assert_eq!(parsed.report.rows_read, 3);
        assert_eq!(parsed.report.skipped_count(), 0);
    }

    #[test]
    fn row_length_gate() {
        let nineteen = vec!["x"; 19].join(",");
        let parsed = parse_cycle_survey(&format!("{}\n{}", HEADER, nineteen));
        assert!(parsed.stats.is_none());
        assert!(parsed.records.is_empty());
        assert_eq!(
            parsed.report.skipped,
            vec![SkipReason::TooFewFields {
                lineno: 2,
                found: 19,
                expected: 20
            }]
        );

        let twenty = vec!["x"; 20].join(",");
        let parsed = parse_cycle_survey(&format!("{}\n{}", HEADER, twenty));
        assert!(parsed.stats.is_some());
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn empty_score_is_the_no_score_sentinel() {
        let text = export(&[response_row(
            "C1", "01/01/2024", ("R1", "Ana"), "", "Promotor", ("U9", "Oeste"), "",
        )]);
        let parsed = parse_cycle_survey(&text);
        assert!(parsed.records[0].score.is_nan());
        assert!(!parsed.records[0].has_score());
        let stats = parsed.stats.unwrap();
        assert_eq!(stats.total_units_invited, 1);
        assert_eq!(stats.total_units_responded, 0);
    }

    #[test]
    fn unit_counting() {
        let text = export(&[
            response_row("C1", "", ("R1", "Ana"), "10", "Promotor", ("A", "Loja A"), ""),
            response_row("C1", "", ("R2", "Bia"), "6", "Detrator", ("A", "Loja A"), ""),
            response_row("C1", "", ("R3", "Caio"), "", "", ("A", "Loja A"), ""),
            response_row("C1", "", ("R4", "Davi"), "", "", ("B", "Loja B"), ""),
            response_row("C1", "", ("R5", "Eva"), "", "", ("B", "Loja B"), ""),
        ]);
        let stats = parse_cycle_survey(&text).stats.unwrap();
        assert_eq!(stats.total_units_invited, 2);
        assert_eq!(stats.total_units_responded, 1);
    }

    #[test]
    fn status_defaults_to_neutral() {
        let text = export(&[
            response_row("C1", "", ("R1", "Ana"), "8", "", ("A", "Loja A"), ""),
            response_row("C1", "", ("R2", "Bia"), "8", "Passivo", ("A", "Loja A"), ""),
            response_row("C1", "", ("R3", "Caio"), "10", "PROMOTOR", ("A", "Loja A"), ""),
        ]);
        let parsed = parse_cycle_survey(&text);
        let statuses: Vec<Status> = parsed.records.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![Status::Neutral, Status::Neutral, Status::Promoter]
        );
    }

    #[test]
    fn rows_without_names_still_count_their_unit() {
        let text = export(&[
            response_row("C1", "", ("R1", ""), "9", "Promotor", ("A", ""), ""),
            response_row("C1", "", ("R2", ""), "9", "Promotor", ("B", "Loja B"), ""),
        ]);
        let parsed = parse_cycle_survey(&text);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(
            parsed.report.skipped,
            vec![SkipReason::NoIdentity { lineno: 2 }]
        );
        let stats = parsed.stats.unwrap();
        assert_eq!(stats.total_units_invited, 2);
        assert_eq!(stats.total_units_responded, 2);
    }

    #[test]
    fn cycle_fields_come_from_the_first_row_only() {
        let mut second = response_row("C1", "01/01/2024", ("R2", "Bia"), "5", "", ("A", "Loja A"), "");
        second = second.replacen("C1", "C2", 1);
        let text = export(&[
            response_row("C1", "01/01/2024", ("R1", "Ana"), "9", "", ("A", "Loja A"), ""),
            second,
        ]);
        let parsed = parse_cycle_survey(&text);
        assert_eq!(parsed.stats.unwrap().id, "C1");
        assert_eq!(parsed.records.len(), 2);
    }

    #[test]
    fn malformed_cycle_header_leaves_records_without_stats() {
        let text = export(&[
            response_row("", "", ("R1", "Ana"), "9", "", ("A", "Loja A"), ""),
            response_row("C1", "", ("R2", "Bia"), "5", "", ("A", "Loja A"), ""),
        ]);
        let parsed = parse_cycle_survey(&text);
        assert!(parsed.stats.is_none());
        assert_eq!(parsed.records.len(), 2);
        assert!(matches!(
            parsed.header_error,
            Some(SkipReason::MalformedCycleHeader { lineno: 2, .. })
        ));
    }

    #[test]
    fn non_numeric_score_is_no_score_but_counts_as_answered() {
        let text = export(&[response_row(
            "C1", "", ("R1", "Ana"), "sem nota", "", ("A", "Loja A"), "",
        )]);
        let parsed = parse_cycle_survey(&text);
        assert!(parsed.records[0].score.is_nan());
        assert_eq!(parsed.stats.unwrap().total_units_responded, 1);
    }

    #[test]
    fn parsing_is_repeatable() {
        let text = export(&[
            response_row("C1", "01/02/2024", ("R1", "Ana"), "9", "Promotor", ("U1", "Centro"), ""),
            response_row("C1", "01/02/2024", ("R2", "Bia"), "", "", ("U1", "Centro"), ""),
        ]);
        let a = parse_cycle_survey(&text);
        let b = parse_cycle_survey(&text);
        // NaN scores defeat PartialEq: compare the debug renderings.
        assert_eq!(format!("{:?}", a), format!("{:?}", b));
    }

    #[test]
    fn empty_input() {
        let parsed = parse_cycle_survey("");
        assert!(parsed.stats.is_none());
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.report.rows_read, 0);
        let parsed = parse_cycle_survey(HEADER);
        assert!(parsed.stats.is_none());
        assert_eq!(parsed.report.rows_read, 0);
    }
}
