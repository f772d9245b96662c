use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use survey_pulse::quote_field;

use crate::dashboard::*;

/// Reads a worksheet (the first one when no name is given) and turns it into
/// the comma separated text the parsers expect.
pub fn read_excel_text(path: &str, worksheet: Option<&str>) -> DashboardResult<String> {
    let wrange = get_range(path, worksheet)?;
    info!(
        "read_excel_text: path: {:?} rows: {}",
        path,
        wrange.height()
    );
    Ok(range_to_text(&wrange))
}

fn get_range(path: &str, worksheet: Option<&str>) -> DashboardResult<Range<DataType>> {
    debug!("get_range: path: {:?} worksheet: {:?}", path, worksheet);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    if let Some(worksheet_name) = worksheet {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    }
}

pub fn range_to_text(wrange: &Range<DataType>) -> String {
    let lines: Vec<String> = wrange
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| quote_field(&cell_text(cell)))
                .collect::<Vec<String>>()
                .join(",")
        })
        .collect();
    lines.join("\n")
}

/// The text of one cell, as it would appear in a CSV export of the sheet.
pub fn cell_text(cell: &DataType) -> String {
    match cell {
        // Line breaks inside a cell would split the row.
        DataType::String(s) => s.replace("\r\n", " ").replace(['\n', '\r'], " "),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) => float_text(*f),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(serial) => excel_date_text(*serial).unwrap_or_else(|| float_text(*serial)),
        DataType::Error(e) => {
            debug!("cell_text: error cell: {:?}", e);
            String::new()
        }
        _ => String::new(),
    }
}

fn float_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// 31/12/9999, the last date a workbook can hold.
const MAX_SERIAL: f64 = 2_958_465.0;

fn excel_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(0.0..=MAX_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86400.0).round() as i64;
    base.checked_add_signed(Duration::seconds(seconds))
}

/// Serial dates are written `DD/MM/YYYY`, with the time only when there is one.
pub fn excel_date_text(serial: f64) -> Option<String> {
    let dt = excel_datetime(serial)?;
    if dt.num_seconds_from_midnight() == 0 {
        Some(dt.format("%d/%m/%Y").to_string())
    } else {
        Some(dt.format("%d/%m/%Y %H:%M:%S").to_string())
    }
}
