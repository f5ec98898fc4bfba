//! Batch report workbook.
//!
//! Three sheets: `Overview` (summary rows plus a pie chart of positives vs
//! negatives), `Results` and `Failed`.

use crate::error::Result;
use crate::triage::io::IOUtils;
use crate::triage::validator::BatchReport;
use chrono::Local;
use rust_xlsxwriter::{Chart, ChartType, Workbook, Worksheet};
use std::path::{Path, PathBuf};
use tracing::info;

pub const OVERVIEW_SHEET: &str = "Overview";
pub const RESULTS_SHEET: &str = "Results";
pub const FAILED_SHEET: &str = "Failed";

pub const RESULTS_HEADER: [&str; 3] = ["File Path", "Detected", "Result"];
pub const FAILED_HEADER: [&str; 2] = ["File Path", "Error Message"];

const XLSX_EXT: &str = "xlsx";

/// `<YYYYmmdd_HHMMSS>.xlsx` for the current local time.
pub fn default_file_name() -> String {
    format!("{}.{}", Local::now().format("%Y%m%d_%H%M%S"), XLSX_EXT)
}

fn write_header(sheet: &mut Worksheet, header: &[&str]) -> Result<()> {
    for (col, title) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *title)?;
    }
    Ok(())
}

fn overview_sheet(report: &BatchReport) -> Result<Worksheet> {
    let s = &report.summary;
    let mut sheet = Worksheet::new();
    sheet.set_name(OVERVIEW_SHEET)?;
    write_header(&mut sheet, &["Category", "Content"])?;

    sheet.write_string(1, 0, "Disk")?;
    sheet.write_string(1, 1, &s.disk)?;
    sheet.write_string(2, 0, "Mode")?;
    sheet.write_string(2, 1, &s.mode)?;
    for (row, (key, value)) in [
        ("Total", s.total as f64),
        ("Positive", s.positive as f64),
        ("Negative", s.negative as f64),
        ("Rate", s.rate as f64),
    ]
    .into_iter()
    .enumerate()
    {
        let row = row as u32 + 3;
        sheet.write_string(row, 0, key)?;
        sheet.write_number(row, 1, value)?;
    }

    // Positive and Negative sit on rows 4 and 5.
    let mut chart = Chart::new(ChartType::Pie);
    chart.title().set_name("Positive / Negative");
    chart
        .add_series()
        .set_categories((OVERVIEW_SHEET, 4, 0, 5, 0))
        .set_values((OVERVIEW_SHEET, 4, 1, 5, 1));
    sheet.insert_chart(4, 4, &chart)?;

    sheet.autofit();
    Ok(sheet)
}

fn results_sheet(report: &BatchReport) -> Result<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(RESULTS_SHEET)?;
    write_header(&mut sheet, &RESULTS_HEADER)?;
    for (i, r) in report.results.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, r.path.display().to_string())?;
        if let Some(detected) = &r.detected {
            sheet.write_string(row, 1, detected)?;
        }
        sheet.write_string(row, 2, r.status.as_str())?;
    }
    sheet.autofit();
    Ok(sheet)
}

fn failed_sheet(report: &BatchReport) -> Result<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(FAILED_SHEET)?;
    write_header(&mut sheet, &FAILED_HEADER)?;
    for (i, f) in report.failures.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, f.path.display().to_string())?;
        sheet.write_string(row, 1, &f.reason)?;
    }
    sheet.autofit();
    Ok(sheet)
}

/// Write `report` to `path`, creating parent directories.
pub fn write_workbook<P: AsRef<Path>>(report: &BatchReport, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        IOUtils::ensure_dir(parent)?;
    }

    let mut workbook = Workbook::new();
    workbook.push_worksheet(overview_sheet(report)?);
    workbook.push_worksheet(results_sheet(report)?);
    workbook.push_worksheet(failed_sheet(report)?);
    workbook.save(path)?;

    info!("Saved report to {:?}", path);
    Ok(())
}

/// Write `report` under `output_dir` with a timestamped name.
pub fn save_report<P: AsRef<Path>>(report: &BatchReport, output_dir: P) -> Result<PathBuf> {
    let path = output_dir.as_ref().join(default_file_name());
    write_workbook(report, &path)?;
    Ok(path)
}
