use std::io;

use failure;

use history;

use itertools::Itertools;

/// A flat record that can be written as one CSV row.
pub trait Record {
    fn fields() -> &'static [&'static str];
    fn values(&self) -> Vec<String>;
}

impl Record for history::Point {
    fn fields() -> &'static [&'static str] {
        &["timestamp", "temperature", "humidity"]
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.timestamp.to_rfc3339(),
            self.temperature.to_string(),
            self.humidity.to_string(),
        ]
    }
}

/// Renders records as CSV: a bare header row, then one row per record with every value quoted.
pub fn to_csv<A>(records: &[A]) -> Result<String, failure::Error>
where
    A: Record,
{
    if records.is_empty() {
        return Err(failure::err_msg("No data to export"));
    }

    let header = A::fields().iter().join(",");
    let rows = records
        .iter()
        .map(|record| record.values().iter().map(|v| quote(v)).join(","))
        .join("\n");

    Ok(format!("{}\n{}", header, rows))
}

/// Writes the CSV rendering of `records` to `out`.
///
/// A reader that hangs up early, like `iotmon history | head`, ends the export without an error.
pub fn write_csv<A, W>(records: &[A], mut out: W) -> Result<(), failure::Error>
where
    A: Record,
    W: io::Write,
{
    let csv = to_csv(records)?;
    match write_lines(&csv, &mut out) {
        Err(ref e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => Ok(result?),
    }
}

fn write_lines<W>(text: &str, out: &mut W) -> io::Result<()>
where
    W: io::Write,
{
    out.write_all(text.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
