use std::io::BufRead;
use std::ops::AddAssign;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::line::{LineValue, Pair, parse_line};
use crate::domain::entities::record::{MetricValue, RecordHeader};
use crate::domain::ports::store::{RecordWriter, StoreError};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to read metric stream: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counters of one import pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub records_inserted: usize,
    pub metrics_inserted: usize,
    pub pairs_skipped: usize,
    pub objects_skipped: usize,
}

impl AddAssign for ImportSummary {
    fn add_assign(&mut self, other: Self) {
        self.records_inserted += other.records_inserted;
        self.metrics_inserted += other.metrics_inserted;
        self.pairs_skipped += other.pairs_skipped;
        self.objects_skipped += other.objects_skipped;
    }
}

#[derive(Debug, Clone, Copy)]
enum HeaderKey {
    Timestamp,
    Type,
    Hostname,
}

impl HeaderKey {
    fn parse(key: &str) -> Option<Self> {
        if key.eq_ignore_ascii_case("timestamp") {
            Some(Self::Timestamp)
        } else if key.eq_ignore_ascii_case("type") {
            Some(Self::Type)
        } else if key.eq_ignore_ascii_case("hostname") {
            Some(Self::Hostname)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
struct PendingHeader {
    time: Option<f64>,
    record_type: Option<String>,
    host: Option<String>,
}

impl PendingHeader {
    /// Stores a header value; returns `false` when the value is unusable.
    fn set(&mut self, key: HeaderKey, value: &LineValue) -> bool {
        match (key, value) {
            (HeaderKey::Timestamp, LineValue::Literal(text)) => {
                match text.trim().parse::<f64>() {
                    Ok(time) if time.is_finite() => {
                        self.time = Some(time);
                        true
                    }
                    _ => false,
                }
            }
            (HeaderKey::Type, LineValue::Literal(text)) => {
                self.record_type = Some(text.clone());
                true
            }
            (HeaderKey::Type, LineValue::Null) => {
                self.record_type = None;
                true
            }
            (HeaderKey::Hostname, LineValue::Literal(text)) => {
                self.host = Some(text.clone());
                true
            }
            (HeaderKey::Timestamp | HeaderKey::Hostname, LineValue::Null) => false,
        }
    }

    fn complete(&self) -> Option<RecordHeader> {
        Some(RecordHeader {
            time: self.time?,
            record_type: self.record_type.clone(),
            host: self.host.clone()?,
        })
    }
}

#[derive(Debug)]
enum ObjectState {
    Pending(PendingHeader),
    Written(i64),
    Skipped,
}

impl Default for ObjectState {
    fn default() -> Self {
        Self::Pending(PendingHeader::default())
    }
}

struct Pipeline<'w, W: RecordWriter> {
    writer: &'w mut W,
    state: ObjectState,
    summary: ImportSummary,
}

impl<'w, W: RecordWriter> Pipeline<'w, W> {
    fn new(writer: &'w mut W) -> Self {
        Self {
            writer,
            state: ObjectState::default(),
            summary: ImportSummary::default(),
        }
    }

    fn feed_line(&mut self, line: &str) -> Result<(), StoreError> {
        match parse_line(line) {
            Some(pair) => {
                self.feed_pair(&pair);
                Ok(())
            }
            None => self.close_object(),
        }
    }

    fn feed_pair(&mut self, pair: &Pair) {
        let header_key = HeaderKey::parse(&pair.key);
        match self.state {
            ObjectState::Skipped => self.summary.pairs_skipped += 1,
            ObjectState::Written(id) => {
                if header_key.is_some() {
                    self.skip_pair(pair, "header key after the record was written");
                } else {
                    self.insert_metric(id, pair);
                }
            }
            ObjectState::Pending(ref mut header) => {
                if let Some(key) = header_key {
                    if !header.set(key, &pair.value) {
                        self.skip_pair(pair, "unusable header value");
                    }
                    return;
                }
                match header.complete() {
                    Some(header) => self.write_record(&header, pair),
                    None => self.skip_pair(pair, "record header is incomplete"),
                }
            }
        }
    }

    fn write_record(&mut self, header: &RecordHeader, pair: &Pair) {
        match self.writer.insert_record(header) {
            Ok(id) => {
                self.summary.records_inserted += 1;
                self.state = ObjectState::Written(id);
                self.insert_metric(id, pair);
            }
            Err(e) => {
                warn!(
                    time = header.time,
                    host = %header.host,
                    "skipping object: {e}"
                );
                self.summary.pairs_skipped += 1;
                self.state = ObjectState::Skipped;
            }
        }
    }

    fn insert_metric(&mut self, record_id: i64, pair: &Pair) {
        let LineValue::Literal(literal) = &pair.value else {
            self.skip_pair(pair, "null value");
            return;
        };
        let value = MetricValue::from_literal(literal);
        match self.writer.insert_metric(record_id, &pair.key, &value) {
            Ok(()) => self.summary.metrics_inserted += 1,
            Err(e) => {
                warn!(key = %pair.key, record_id, "skipping metric: {e}");
                self.summary.pairs_skipped += 1;
            }
        }
    }

    fn skip_pair(&mut self, pair: &Pair, reason: &str) {
        debug!(key = %pair.key, reason, "skipping pair");
        self.summary.pairs_skipped += 1;
    }

    fn close_object(&mut self) -> Result<(), StoreError> {
        if matches!(std::mem::take(&mut self.state), ObjectState::Skipped) {
            self.summary.objects_skipped += 1;
        }
        self.writer.commit()
    }

    fn finish(mut self) -> Result<ImportSummary, StoreError> {
        self.close_object()?;
        Ok(self.summary)
    }
}

/// Import every object of a metric stream through `writer`.
///
/// Malformed pairs, colliding records and rejected metrics are skipped and
/// counted. A line that is not valid UTF-8 closes the current object like any
/// other malformed line. Only read errors and failed commits end the import.
///
/// # Errors
///
/// Returns `ImportError::Io` if the stream cannot be read and
/// `ImportError::Store` if committing an object fails.
pub fn import_reader<R: BufRead, W: RecordWriter>(
    mut reader: R,
    writer: &mut W,
) -> Result<ImportSummary, ImportError> {
    let mut pipeline = Pipeline::new(writer);
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(line) => pipeline.feed_line(line)?,
            Err(e) => {
                debug!(line = line_no, "undecodable line closes the object: {e}");
                pipeline.close_object()?;
            }
        }
    }
    Ok(pipeline.finish()?)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingWriter {
        records: Vec<RecordHeader>,
        metrics: Vec<(i64, String, MetricValue)>,
        commits: usize,
        reject_metric: Option<String>,
    }

    impl RecordWriter for RecordingWriter {
        fn insert_record(&mut self, header: &RecordHeader) -> Result<i64, StoreError> {
            let duplicate = self.records.iter().any(|r| {
                r.time.to_bits() == header.time.to_bits()
                    && r.record_type == header.record_type
                    && r.host == header.host
            });
            if duplicate {
                return Err(StoreError::WriteFailed("UNIQUE constraint failed".into()));
            }
            self.records.push(header.clone());
            Ok(i64::try_from(self.records.len()).expect("id"))
        }

        fn insert_metric(
            &mut self,
            record_id: i64,
            name: &str,
            value: &MetricValue,
        ) -> Result<(), StoreError> {
            if self.reject_metric.as_deref() == Some(name) {
                return Err(StoreError::WriteFailed("rejected".into()));
            }
            self.metrics.push((record_id, name.to_string(), value.clone()));
            Ok(())
        }

        fn commit(&mut self) -> Result<(), StoreError> {
            self.commits += 1;
            Ok(())
        }
    }

    fn import(text: &str, writer: &mut RecordingWriter) -> ImportSummary {
        import_reader(text.as_bytes(), writer).expect("import")
    }

    const TWO_OBJECTS: &str = r#"{
  "timestamp": 10.0,
  "type": "ProgramRuntime",
  "hostname": "10.0.0.1",
  "GlobalRank": 0,
  "ProgramDuration": 100,
},
{
  "TIMESTAMP": 11.0,
  "Type": null,
  "HostName": "10.0.0.2",
  "Label": "warm-up",
}
"#;

    #[test]
    fn imports_every_object() {
        let mut writer = RecordingWriter::default();
        let summary = import(TWO_OBJECTS, &mut writer);
        assert_eq!(summary.records_inserted, 2);
        assert_eq!(summary.metrics_inserted, 3);
        assert_eq!(summary.pairs_skipped, 0);
        assert_eq!(writer.records[1].record_type, None);
        assert_eq!(writer.records[1].host, "10.0.0.2");
        assert_eq!(
            writer.metrics[2],
            (2, "Label".to_string(), MetricValue::Text("warm-up".into()))
        );
    }

    #[test]
    fn numbers_and_text_are_kept_apart() {
        let mut writer = RecordingWriter::default();
        import(
            "timestamp: 1\nhostname: h\na: 2.5\nb: \"3\"\nc: \"x\"\nd: 1e400\n",
            &mut writer,
        );
        let values: Vec<&MetricValue> = writer.metrics.iter().map(|(_, _, v)| v).collect();
        assert_eq!(values[0], &MetricValue::Numeric(2.5));
        assert_eq!(values[1], &MetricValue::Numeric(3.0));
        assert_eq!(values[2], &MetricValue::Text("x".into()));
        assert_eq!(values[3], &MetricValue::Text("1e400".into()));
    }

    #[test]
    fn keys_before_complete_header_are_skipped() {
        let mut writer = RecordingWriter::default();
        let summary = import(
            "timestamp: 1\nearly: 5\nhostname: h\nlate: 6\n",
            &mut writer,
        );
        assert_eq!(summary.pairs_skipped, 1);
        assert_eq!(writer.metrics.len(), 1);
        assert_eq!(writer.metrics[0].1, "late");
    }

    #[test]
    fn null_values_are_skipped() {
        let mut writer = RecordingWriter::default();
        let summary = import("timestamp: 1\nhostname: h\na: null\nb: 1\n", &mut writer);
        assert_eq!(summary.metrics_inserted, 1);
        assert_eq!(summary.pairs_skipped, 1);
    }

    #[test]
    fn colliding_record_skips_the_rest_of_its_object() {
        let mut writer = RecordingWriter::default();
        let text = "timestamp: 1\nhostname: h\na: 1\n}\n{\ntimestamp: 1\nhostname: h\na: 2\nb: 3\n}\n{\ntimestamp: 2\nhostname: h\na: 4\n";
        let summary = import(text, &mut writer);
        assert_eq!(summary.records_inserted, 2);
        assert_eq!(summary.metrics_inserted, 2);
        assert_eq!(summary.objects_skipped, 1);
        assert_eq!(summary.pairs_skipped, 2);
    }

    #[test]
    fn metric_failures_are_local() {
        let mut writer = RecordingWriter {
            reject_metric: Some("bad".into()),
            ..RecordingWriter::default()
        };
        let summary = import("timestamp: 1\nhostname: h\nbad: 1\ngood: 2\n", &mut writer);
        assert_eq!(summary.metrics_inserted, 1);
        assert_eq!(summary.pairs_skipped, 1);
        assert_eq!(summary.records_inserted, 1);
    }

    #[test]
    fn header_keys_after_write_are_ignored() {
        let mut writer = RecordingWriter::default();
        let summary = import("timestamp: 1\nhostname: h\na: 1\nhostname: other\n", &mut writer);
        assert_eq!(summary.pairs_skipped, 1);
        assert_eq!(writer.records[0].host, "h");
    }

    #[test]
    fn object_without_host_writes_nothing() {
        let mut writer = RecordingWriter::default();
        let summary = import("timestamp: 1\na: 1\n}\n", &mut writer);
        assert_eq!(summary.records_inserted, 0);
        assert_eq!(summary.pairs_skipped, 1);
    }

    #[test]
    fn undecodable_line_only_ends_its_object() {
        let mut writer = RecordingWriter::default();
        let mut stream = b"timestamp: 1\nhostname: h\na: 1\n".to_vec();
        stream.extend_from_slice(b"note: \"\xff\xfe\"\n");
        stream.extend_from_slice(b"timestamp: 2\r\nhostname: h\r\nb: 2\r\n");

        let summary = import_reader(stream.as_slice(), &mut writer).expect("import");
        assert_eq!(summary.records_inserted, 2);
        assert_eq!(summary.metrics_inserted, 2);
        let names: Vec<&str> = writer.metrics.iter().map(|(_, n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(writer.records[1].time.to_bits(), 2.0_f64.to_bits());
    }

    #[test]
    fn garbage_line_splits_an_object() {
        let mut writer = RecordingWriter::default();
        let text = "timestamp: 1\nthis is not a pair\nhostname: h\norphan: 1\n}\n{\ntimestamp: 2\nhostname: h\nkept: 2\n}\n";
        let summary = import(text, &mut writer);
        // The first half has no host and the second half no timestamp.
        assert_eq!(summary.records_inserted, 1);
        assert_eq!(summary.pairs_skipped, 1);
        assert_eq!(writer.metrics.len(), 1);
        assert_eq!(writer.metrics[0].1, "kept");
        assert_eq!(writer.records[0].time.to_bits(), 2.0_f64.to_bits());
    }

    #[test]
    fn every_boundary_commits() {
        let mut writer = RecordingWriter::default();
        import(TWO_OBJECTS, &mut writer);
        assert!(writer.commits >= 2);
    }

    #[test]
    fn summaries_add_up() {
        let mut total = ImportSummary {
            records_inserted: 1,
            metrics_inserted: 2,
            pairs_skipped: 3,
            objects_skipped: 4,
        };
        total += total;
        assert_eq!(total.metrics_inserted, 4);
        assert_eq!(total.objects_skipped, 8);
    }
}
