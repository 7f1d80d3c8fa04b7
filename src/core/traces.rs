//! Trace rendering

use super::raw_record::RawRecord;

/// Render a record's call sites, then its error trace, one string per line
///
/// Frame lines read `in {file}:{line}` and keep their order. Error trace
/// lines always follow them.
pub fn format_traces(record: &RawRecord) -> Vec<String> {
    let mut traces: Vec<String> = record.frames.iter().map(ToString::to_string).collect();

    if let Some(err) = record.payload.as_error() {
        traces.extend(err.trace_lines().map(str::to_string));
    }

    traces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;
    use crate::core::payload::{ErrorPayload, Payload};

    #[test]
    fn test_no_traces() {
        let record = RawRecord::new("plain", LogLevel::Info, "app", 0);
        assert!(format_traces(&record).is_empty());
    }

    #[test]
    fn test_frames_then_error_trace() {
        let err = ErrorPayload::new("boom", "#0 db.rs(12): query()\n#1 {main}");
        let record = RawRecord::new(Payload::Error(err), LogLevel::Error, "db", 0)
            .with_frame("src/handler.rs", 40)
            .with_frame("src/main.rs", 7);

        assert_eq!(
            format_traces(&record),
            vec![
                "in src/handler.rs:40",
                "in src/main.rs:7",
                "#0 db.rs(12): query()",
                "#1 {main}",
            ]
        );
    }

    #[test]
    fn test_error_without_trace() {
        let record = RawRecord::new(Payload::Error(ErrorPayload::new("boom", "")), LogLevel::Error, "db", 0)
            .with_frame("src/a.rs", 1);
        assert_eq!(format_traces(&record), vec!["in src/a.rs:1"]);
    }
}
