//! iperf CSV report handling
//!
//! `iperf -y c` prints one comma separated line per report. The ninth field is
//! the measured rate in bits per second.

/// Fields a complete client report has
pub const MIN_REPORT_FIELDS: usize = 9;

/// Outcome of reading one client report
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Throughput in Mb/s
    Throughput(f64),
    /// Fewer fields than a complete report
    Short { fields: usize },
    /// Enough fields but the rate is not a number
    Unparsable(String),
}

pub fn parse_report(output: &str) -> Report {
    let fields: Vec<&str> = output.split(',').collect();
    if fields.len() < MIN_REPORT_FIELDS {
        return Report::Short {
            fields: fields.len(),
        };
    }
    let rate = fields[MIN_REPORT_FIELDS - 1].trim();
    match rate.parse::<f64>() {
        Ok(bits) => Report::Throughput(bits / 1_000_000.0),
        Err(_) => Report::Unparsable(rate.to_string()),
    }
}

/// Shortest decimal form, keeping `.0` on whole numbers (94.0, 9.4375).
/// Rust never switches to exponent notation, so tiny rates print as
/// `0.00001` where a Python float would show `1e-05`.
pub fn format_mbps(mbps: f64) -> String {
    if mbps.is_finite() && mbps.fract() == 0.0 && mbps.abs() < 1e16 {
        format!("{:.1}", mbps)
    } else {
        format!("{}", mbps)
    }
}

/// Lines to print for one client's output. `source` names the sending host
/// when a test runs more than one client; `test` is the console command that
/// reruns it.
pub fn result_lines(test: &str, source: Option<&str>, output: &str) -> Vec<String> {
    let from = source.map(|s| format!(" from {}", s)).unwrap_or_default();
    match parse_report(output) {
        Report::Throughput(mbps) => {
            vec![format!("*** Results Throughput{}={}Mb/s", from, format_mbps(mbps))]
        }
        Report::Short { fields } => failure_lines(
            test,
            &format!("length of reply only had {} field(s)", fields),
        ),
        Report::Unparsable(rate) => {
            failure_lines(test, &format!("rate field {:?} is not a number", rate))
        }
    }
}

fn failure_lines(test: &str, what: &str) -> Vec<String> {
    vec![
        format!("*** Test Failed Error, {}", what),
        "***      note that these tests might fail due to the fact the network is being overloaded"
            .to_string(),
        format!(
            "***      you can run it again later from the command line as {}.",
            test
        ),
    ]
}
