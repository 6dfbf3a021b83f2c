use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::error::{MonitorError, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogMatch {
    pub line_number: u64,
    pub line: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogReport {
    pub path: PathBuf,
    pub total_lines: u64,
    pub matched_lines: u64,
    /// Percentage of lines matching, 0 for an empty file.
    pub error_rate: f64,
    /// Marker -> number of lines containing it. Zero counts are omitted.
    pub pattern_counts: BTreeMap<String, u64>,
    pub first_matches: Vec<LogMatch>,
}

#[derive(Debug)]
enum Matcher {
    Substring(String),
    Regex(Regex),
    AnyMarker,
}

/// Streams a log file and counts lines that match a pattern or any severity marker.
#[derive(Debug)]
pub struct LogAnalyzer {
    markers: Vec<String>,
    matcher: Matcher,
    max_matches: usize,
}

impl LogAnalyzer {
    /// `pattern` is a case-insensitive substring, or a regex when `regex` is set.
    /// Without a pattern a line matches when it contains any marker.
    pub fn new(
        markers: &[String],
        pattern: Option<&str>,
        regex: bool,
        max_matches: usize,
    ) -> Result<Self> {
        let matcher = match pattern {
            None => Matcher::AnyMarker,
            Some(p) if regex => Matcher::Regex(
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| MonitorError::InvalidArgument(format!("invalid pattern: {e}")))?,
            ),
            Some(p) if p.is_empty() => {
                return Err(MonitorError::InvalidArgument(
                    "pattern must not be empty".to_string(),
                ));
            }
            Some(p) => Matcher::Substring(p.to_lowercase()),
        };

        Ok(LogAnalyzer {
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
            matcher,
            max_matches,
        })
    }

    pub fn analyze(&self, path: &Path) -> Result<LogReport> {
        let _span = tracing::debug_span!("log.analyze", path = %path.display()).entered();

        if !path.exists() {
            return Err(MonitorError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| MonitorError::from_io(path, e))?;
        let mut report = self
            .scan(BufReader::new(file))
            .map_err(|e| MonitorError::from_io(path, e))?;
        report.path = path.to_path_buf();
        Ok(report)
    }

    /// Scans any buffered reader. Invalid UTF-8 is replaced rather than rejected.
    pub fn scan<R: BufRead>(&self, mut reader: R) -> std::io::Result<LogReport> {
        let mut total_lines = 0u64;
        let mut matched_lines = 0u64;
        let mut pattern_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut first_matches = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            total_lines += 1;

            let line = String::from_utf8_lossy(strip_line_ending(&buf));
            let lowered = line.to_lowercase();

            let mut any_marker = false;
            for marker in &self.markers {
                if lowered.contains(marker.as_str()) {
                    any_marker = true;
                    *pattern_counts.entry(marker.clone()).or_default() += 1;
                }
            }

            let matched = match &self.matcher {
                Matcher::Substring(needle) => lowered.contains(needle.as_str()),
                Matcher::Regex(re) => re.is_match(&line),
                Matcher::AnyMarker => any_marker,
            };
            if matched {
                matched_lines += 1;
                if first_matches.len() < self.max_matches {
                    first_matches.push(LogMatch {
                        line_number: total_lines,
                        line: line.trim().to_string(),
                    });
                }
            }
        }

        let error_rate = if total_lines == 0 {
            0.0
        } else {
            matched_lines as f64 / total_lines as f64 * 100.0
        };

        Ok(LogReport {
            path: PathBuf::new(),
            total_lines,
            matched_lines,
            error_rate,
            pattern_counts,
            first_matches,
        })
    }
}

fn strip_line_ending(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;

    fn markers() -> Vec<String> {
        ["error", "exception", "critical"].map(String::from).to_vec()
    }

    #[test]
    fn empty_input_has_zero_rate() {
        let analyzer = LogAnalyzer::new(&markers(), Some("error"), false, 5).unwrap();
        let report = analyzer.scan(Cursor::new("")).unwrap();
        assert_eq!(report.total_lines, 0);
        assert_eq!(report.matched_lines, 0);
        assert_eq!(report.error_rate, 0.0);
        assert!(report.pattern_counts.is_empty());
    }

    #[test]
    fn thousand_lines_with_five_errors() {
        let mut log = String::new();
        for i in 1..=1000 {
            if i % 200 == 0 {
                log.push_str(&format!("2024-01-01 ERROR request {i} failed\n"));
            } else {
                log.push_str(&format!("2024-01-01 INFO request {i} ok\n"));
            }
        }
        let analyzer = LogAnalyzer::new(&markers(), Some("error"), false, 5).unwrap();
        let report = analyzer.scan(Cursor::new(log)).unwrap();
        assert_eq!(report.total_lines, 1000);
        assert_eq!(report.matched_lines, 5);
        assert!((report.error_rate - 0.5).abs() < 1e-9);
        assert_eq!(report.pattern_counts.get("error"), Some(&5));
    }

    #[test]
    fn markers_are_counted_independently_of_pattern() {
        let log = "boot ok\nCritical: disk\nException in thread\nuser timeout\nerror + exception\n";
        let analyzer = LogAnalyzer::new(&markers(), Some("timeout"), false, 5).unwrap();
        let report = analyzer.scan(Cursor::new(log)).unwrap();
        assert_eq!(report.matched_lines, 1);
        assert_eq!(report.first_matches[0].line_number, 4);
        assert_eq!(report.pattern_counts.get("critical"), Some(&1));
        assert_eq!(report.pattern_counts.get("exception"), Some(&2));
        assert_eq!(report.pattern_counts.get("error"), Some(&1));
    }

    #[test]
    fn no_pattern_matches_any_marker() {
        let log = "fine\nan ERROR\nfine\na critical thing\n";
        let analyzer = LogAnalyzer::new(&markers(), None, false, 5).unwrap();
        let report = analyzer.scan(Cursor::new(log)).unwrap();
        assert_eq!(report.matched_lines, 2);
        let numbers: Vec<u64> = report.first_matches.iter().map(|m| m.line_number).collect();
        assert_eq!(numbers, vec![2, 4]);
    }

    #[test]
    fn first_matches_are_capped_in_file_order() {
        let log = (1..=10).map(|i| format!("error {i}\n")).collect::<String>();
        let analyzer = LogAnalyzer::new(&markers(), Some("ERROR"), false, 3).unwrap();
        let report = analyzer.scan(Cursor::new(log)).unwrap();
        assert_eq!(report.matched_lines, 10);
        assert_eq!(report.first_matches.len(), 3);
        assert_eq!(report.first_matches[2].line, "error 3");
    }

    #[test]
    fn regex_pattern_is_case_insensitive() {
        let log = "GET /a 200\nGET /b 503\nPOST /c 500\n";
        let analyzer = LogAnalyzer::new(&markers(), Some(r"\s5\d\d$"), true, 5).unwrap();
        let report = analyzer.scan(Cursor::new(log)).unwrap();
        assert_eq!(report.matched_lines, 2);
        assert!(LogAnalyzer::new(&markers(), Some("[bad"), true, 5).is_err());
    }

    #[test]
    fn invalid_utf8_is_tolerated() {
        let bytes: &[u8] = b"ok\n\xff\xfe error here\n";
        let analyzer = LogAnalyzer::new(&markers(), Some("error"), false, 5).unwrap();
        let report = analyzer.scan(Cursor::new(bytes)).unwrap();
        assert_eq!(report.total_lines, 2);
        assert_eq!(report.matched_lines, 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let analyzer = LogAnalyzer::new(&markers(), None, false, 5).unwrap();
        let err = analyzer.analyze(Path::new("/no/such/app.log")).unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(_)));
    }

    struct FailingReader {
        served: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.served {
                return Err(std::io::Error::other("device went away"));
            }
            self.served = true;
            let chunk = b"error one\n";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn read_failure_mid_scan_discards_results() {
        let analyzer = LogAnalyzer::new(&markers(), None, false, 5).unwrap();
        let reader = BufReader::new(FailingReader { served: false });
        assert!(analyzer.scan(reader).is_err());
    }
}
