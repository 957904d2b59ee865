//! CSV export of convergence study results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::model::{Curve, Dispatch};

/// Column header for the flow report.
const HEADER: &str = "point,demand,local_price,foreign_price,interconnect_flow,shortfall";

/// One row of the per-point flow report.
#[derive(Debug, Clone)]
pub struct FlowRow {
    /// Point index.
    pub point: usize,
    /// Local raw demand.
    pub demand: f64,
    /// Local market price.
    pub local_price: f64,
    /// Foreign market price.
    pub foreign_price: f64,
    /// Interconnect flow: negative import, positive export.
    pub flow: f64,
    /// Unserved demand, zero when fully dispatched.
    pub shortfall: f64,
}

/// Collects the per-point report rows from a completed study.
pub fn flow_rows(local: &Dispatch, foreign: &Dispatch, flow: &Curve) -> Vec<FlowRow> {
    (0..local.points())
        .map(|point| FlowRow {
            point,
            demand: local.demand_at(point),
            local_price: local.price_at(point),
            foreign_price: foreign.price_at(point),
            flow: flow.get(point),
            shortfall: local
                .shortfalls()
                .iter()
                .find(|shortfall| shortfall.point == point)
                .map_or(0.0, |shortfall| shortfall.missing),
        })
        .collect()
}

/// Exports the flow report to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(rows: &[FlowRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(rows, buf)
}

/// Writes the flow report as CSV to any writer. Produces deterministic
/// output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(rows: &[FlowRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for row in rows {
        wtr.write_record(&[
            row.point.to_string(),
            format!("{:.4}", row.demand),
            format!("{:.4}", row.local_price),
            format!("{:.4}", row.foreign_price),
            format!("{:.4}", row.flow),
            format!("{:.4}", row.shortfall),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_row(point: usize) -> FlowRow {
        FlowRow {
            point,
            demand: 100.0,
            local_price: 23.5,
            foreign_price: 40.0,
            flow: 12.0,
            shortfall: 0.0,
        }
    }

    #[test]
    fn header_matches_schema() {
        let rows = vec![make_row(0)];
        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.lines().next(), Some(HEADER));
    }

    #[test]
    fn row_count_matches_point_count() {
        let rows: Vec<FlowRow> = (0..24).map(make_row).collect();
        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        // 1 header + 24 data rows
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn deterministic_output() {
        let rows: Vec<FlowRow> = (0..5).map(make_row).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&rows, &mut buf1).unwrap();
        write_csv(&rows, &mut buf2).unwrap();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn round_trip_parseable() {
        let rows: Vec<FlowRow> = (0..3).map(make_row).collect();
        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).unwrap();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let mut count = 0;
        for record in rdr.records() {
            let record = record.unwrap();
            assert_eq!(record.len(), 6);
            for i in 1..6 {
                let value: Result<f64, _> = record[i].parse();
                assert!(value.is_ok(), "column {i} should parse as f64");
            }
            count += 1;
        }
        assert_eq!(count, 3);
    }
}
