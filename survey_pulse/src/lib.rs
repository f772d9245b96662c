/*!
Parsing and analysis of satisfaction survey exports.

Three kinds of exports are understood: satisfaction score (NPS) cycles,
meeting evaluations and implementation evaluations. Each parse function
takes the full text of an export and returns typed records, statistics and
a [ParseReport] of the rows that were left out.

Cycles can then be folded into a [CycleHistory], which orders them and
tracks which ones are visible, and the responses of the visible cycles can
be compared with [compute_migrations].

```
use survey_pulse::{compute_migrations, parse_cycle_survey, CycleHistory};

let text = "header\n\
C1,Ciclo 1,40,,10,2,1,0,1,01/01/2024,31/01/2024,,R1,Ana,3,Detrator,,05/01/2024,U1,Centro";
let mut history = CycleHistory::new();
history.add_parsed(parse_cycle_survey(text));
let records = history.visible_records();
let report = compute_migrations(records.iter().copied());
assert_eq!(report.counts.total, 0);
```

See the [manual] for the input formats.
*/

mod cycle;
mod dates;
mod feedback;
mod history;
mod implementation;
pub mod manual;
mod meeting;
mod migration;
mod model;
mod scales;
mod schema;
mod tokenizer;

pub use crate::cycle::parse_cycle_survey;
pub use crate::dates::{parse_day_month_year, short_period_label};
pub use crate::feedback::*;
pub use crate::history::*;
pub use crate::implementation::*;
pub use crate::meeting::*;
pub use crate::migration::*;
pub use crate::model::*;
pub use crate::scales::*;
pub use crate::schema::*;
pub use crate::tokenizer::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn cycle_row(cycle: &str, start: &str, id: &str, name: &str, score: &str, status: &str, date: &str) -> String {
        format!(
            "{},Ciclo {},50,Zona de Qualidade,10,4,1,1,2,{},,,{},{},{},{},,{},U-{},Loja {}",
            cycle, cycle, start, id, name, score, status, date, name, name
        )
    }

    fn cycle_text(cycle: &str, start: &str, rows: &[(&str, &str, &str, &str)]) -> String {
        let mut lines = vec!["header".to_string()];
        for (id, name, score, status) in rows {
            lines.push(cycle_row(cycle, start, id, name, score, status, start));
        }
        lines.join("\n")
    }

    #[test]
    fn cycles_to_migrations() {
        init();
        let january = cycle_text(
            "C1",
            "01/01/2024",
            &[
                ("R1", "Ana", "3", "Detrator"),
                ("R2", "Bia", "10", "Promotor"),
                ("R3", "Caio", "", ""),
            ],
        );
        let march = cycle_text(
            "C3",
            "01/03/2024",
            &[
                ("R1", "Ana", "9", "Promotor"),
                ("R2", "Bia", "6", "Detrator"),
                ("R3", "Caio", "8", "Neutro"),
            ],
        );

        let mut history = CycleHistory::new();
        // Loaded out of order on purpose.
        assert_eq!(
            history.add_parsed(parse_cycle_survey(&march)),
            Some(AddOutcome::Added)
        );
        assert_eq!(
            history.add_parsed(parse_cycle_survey(&january)),
            Some(AddOutcome::Added)
        );
        let ids: Vec<&str> = history.cycles().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["C1", "C3"]);
        assert_eq!(history.active_cycle().map(|c| c.id()), Some("C3"));

        let january_stats = &history.cycles()[0].stats;
        assert_eq!(january_stats.total_units_invited, 3);
        assert_eq!(january_stats.total_units_responded, 2);

        let records = history.visible_records();
        let report = compute_migrations(records.iter().copied());
        // Caio has no score in January.
        assert_eq!(report.counts.total, 2);
        assert_eq!(report.counts.recovered_detractors, 1);
        assert_eq!(report.counts.lost_promoters, 1);
        assert_eq!(report.migrations[0].respondent_id, "R1");
        assert_eq!(
            report
                .filter(MigrationCategory::Declined, "")
                .iter()
                .map(|m| m.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Bia"]
        );

        // Hiding a cycle removes it from the comparison.
        history.toggle_visibility("C1");
        let records = history.visible_records();
        assert_eq!(compute_migrations(records.iter().copied()).counts.total, 0);
    }
}
