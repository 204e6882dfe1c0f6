use std::fs;
use std::path::PathBuf;

use devcalc_core::report::{EstimationReport, ReportEmitter, CASH_FLOW_COLUMNS};
use devcalc_core::{DevCalcError, DevCalcResult};

use super::chart::{BarChart, Series};

/// Writes the report sheets as CSV and the two charts as text into `dir`,
/// replacing any files left by an earlier run.
///
/// Every artifact is rendered in memory and staged under a temporary name
/// first; the final files are only replaced once all four are staged.
pub struct FileReportEmitter {
    dir: PathBuf,
}

/// One rendered file: final name and contents.
type Artifact = (&'static str, Vec<u8>);

impl FileReportEmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn staging_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!(".{name}.tmp"))
    }

    fn stage(&self, artifacts: &[Artifact]) -> DevCalcResult<()> {
        for (i, (name, bytes)) in artifacts.iter().enumerate() {
            if let Err(e) = fs::write(self.staging_path(name), bytes) {
                for (staged, _) in &artifacts[..i] {
                    let _ = fs::remove_file(self.staging_path(staged));
                }
                return Err(io_error(e));
            }
        }
        Ok(())
    }

    fn commit(&self, artifacts: &[Artifact]) -> DevCalcResult<()> {
        for (name, _) in artifacts {
            fs::rename(self.staging_path(name), self.dir.join(name)).map_err(io_error)?;
        }
        Ok(())
    }
}

impl ReportEmitter for FileReportEmitter {
    fn emit(&self, report: &EstimationReport) -> DevCalcResult<()> {
        let artifacts: Vec<Artifact> = vec![
            ("inputs.csv", render_inputs(report)?),
            ("cash_flow.csv", render_cash_flow(report)?),
            ("sales.txt", render_sales_chart(report).into_bytes()),
            ("cash_flow.txt", render_cash_flow_chart(report).into_bytes()),
        ];

        fs::create_dir_all(&self.dir).map_err(io_error)?;
        self.stage(&artifacts)?;
        self.commit(&artifacts)?;
        log::debug!("report files written to {}", self.dir.display());
        Ok(())
    }
}

fn render_inputs(report: &EstimationReport) -> DevCalcResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["parameter", "value"]).map_err(csv_error)?;
    for (key, value) in &report.inputs {
        wtr.write_record([key, value]).map_err(csv_error)?;
    }
    finish(wtr)
}

fn render_cash_flow(report: &EstimationReport) -> DevCalcResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CASH_FLOW_COLUMNS).map_err(csv_error)?;
    for row in &report.cash_flow {
        wtr.write_record(row).map_err(csv_error)?;
    }
    finish(wtr)
}

fn render_sales_chart(report: &EstimationReport) -> String {
    BarChart {
        title: "Quarterly sales, m²".into(),
        series: vec![Series { name: "sales", glyph: '#' }],
        rows: report
            .absorption
            .iter()
            .map(|(q, area)| (format!("Q{q}"), vec![*area]))
            .collect(),
        annotation: format!(
            "start price = {}\nphase size = {} m²",
            report.start_price.round_dp(0),
            report.phase_apartment_area.round_dp(0)
        ),
    }
    .render()
}

fn render_cash_flow_chart(report: &EstimationReport) -> String {
    BarChart {
        title: "Cumulative cash flow".into(),
        series: vec![
            Series { name: "CF", glyph: '#' },
            Series { name: "DCF", glyph: '=' },
        ],
        rows: report
            .cumulative
            .iter()
            .map(|(q, cf, dcf)| (format!("Q{q}"), vec![*cf, *dcf]))
            .collect(),
        annotation: report.metrics_summary(),
    }
    .render()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> DevCalcResult<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| DevCalcError::ReportOutput(e.to_string()))
}

fn csv_error(e: csv::Error) -> DevCalcError {
    DevCalcError::ReportOutput(e.to_string())
}

fn io_error(e: std::io::Error) -> DevCalcError {
    DevCalcError::ReportOutput(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcalc_core::{estimate_project, EstimationInput, MarketAssumptions, ProjectParameters};
    use rust_decimal_macros::dec;

    fn sample_report() -> EstimationReport {
        let input = EstimationInput {
            parameters: ProjectParameters {
                floor_area: dec!(10000),
                apartment_area: dec!(7000),
                construction_costs: dec!(60000),
                construction_period: 10,
                start_price: dec!(105000),
                completion_premium: dec!(1.3),
                inflation_annual: dec!(1.05),
                discount_rate_annual: dec!(1.06),
            },
            assumptions: MarketAssumptions::default(),
        };
        let output = estimate_project(&input).unwrap();
        EstimationReport::from_output(&output.result)
    }

    #[test]
    fn test_emit_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        FileReportEmitter::new(dir.path()).emit(&report).unwrap();

        for name in ["inputs.csv", "cash_flow.csv", "sales.txt", "cash_flow.txt"] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }

        let cash_flow = fs::read_to_string(dir.path().join("cash_flow.csv")).unwrap();
        let lines: Vec<&str> = cash_flow.lines().collect();
        assert_eq!(lines[0], CASH_FLOW_COLUMNS.join(","));
        assert_eq!(lines.len(), report.cash_flow.len() + 1);

        let chart = fs::read_to_string(dir.path().join("cash_flow.txt")).unwrap();
        assert!(chart.contains("NPV = "));
        assert!(chart.contains("IRR = "));
    }

    #[test]
    fn test_emit_overwrites_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.csv");
        fs::write(&path, "stale\nstale\nstale\n".repeat(100)).unwrap();

        let report = sample_report();
        FileReportEmitter::new(dir.path()).emit(&report).unwrap();

        let inputs = fs::read_to_string(&path).unwrap();
        assert!(!inputs.contains("stale"));
        assert_eq!(inputs.lines().count(), report.inputs.len() + 1);
    }

    #[test]
    fn test_emit_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("run1");
        FileReportEmitter::new(&nested).emit(&sample_report()).unwrap();
        assert!(nested.join("sales.txt").exists());
    }

    #[test]
    fn test_unwritable_target_is_report_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let err = FileReportEmitter::new(&blocker).emit(&sample_report()).unwrap_err();
        assert!(matches!(err, DevCalcError::ReportOutput(_)));
    }

    #[test]
    fn test_failed_write_leaves_previous_report_intact() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = FileReportEmitter::new(dir.path());
        for name in ["inputs.csv", "cash_flow.csv", "sales.txt"] {
            fs::write(dir.path().join(name), "previous run").unwrap();
        }
        // A directory squatting on the last staging name makes staging fail
        fs::create_dir(emitter.staging_path("cash_flow.txt")).unwrap();

        let err = emitter.emit(&sample_report()).unwrap_err();
        assert!(matches!(err, DevCalcError::ReportOutput(_)));

        for name in ["inputs.csv", "cash_flow.csv", "sales.txt"] {
            let content = fs::read_to_string(dir.path().join(name)).unwrap();
            assert_eq!(content, "previous run", "{name} was replaced");
            assert!(!emitter.staging_path(name).exists(), "{name} staging file left behind");
        }
        assert!(!dir.path().join("cash_flow.txt").exists());
    }
}
