//! JSON-lines frame records

use std::time::Duration;

use dms::{LandmarkFrame, Point2D, Timestamp};
use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Eye landmarks of the detected subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectLandmarks {
    pub left_eye: Vec<Point2D>,
    pub right_eye: Vec<Point2D>,
}

/// One recorded tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Milliseconds since the recording started
    pub timestamp_ms: u64,
    /// `null` when no face was found
    #[serde(default)]
    pub subject: Option<SubjectLandmarks>,
}

impl FrameRecord {
    pub fn timestamp(&self) -> Timestamp {
        Duration::from_millis(self.timestamp_ms)
    }

    pub fn into_frame(self) -> LandmarkFrame {
        match self.subject {
            Some(subject) => LandmarkFrame::Present {
                left: subject.left_eye,
                right: subject.right_eye,
            },
            None => LandmarkFrame::Absent,
        }
    }
}

/// Parse one line of a recording
pub fn parse_record(line: &str, line_no: usize) -> Result<FrameRecord, MonitorError> {
    serde_json::from_str(line).map_err(|source| MonitorError::Parse {
        line: line_no,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_present_subject() {
        let line = r#"{"timestamp_ms": 40, "subject": {
            "left_eye": [{"x":0,"y":0},{"x":1,"y":1},{"x":2,"y":1},{"x":3,"y":0},{"x":2,"y":-1},{"x":1,"y":-1}],
            "right_eye": [{"x":5,"y":0},{"x":6,"y":1},{"x":7,"y":1},{"x":8,"y":0},{"x":7,"y":-1},{"x":6,"y":-1}]
        }}"#;

        let record = parse_record(line, 1).unwrap();
        assert_eq!(record.timestamp(), Duration::from_millis(40));

        match record.into_frame() {
            LandmarkFrame::Present { left, right } => {
                assert_eq!(left.len(), 6);
                assert_eq!(right[3], Point2D::new(8.0, 0.0));
            }
            LandmarkFrame::Absent => panic!("expected a subject"),
        }
    }

    #[test]
    fn test_parse_absent_subject() {
        let record = parse_record(r#"{"timestamp_ms": 0, "subject": null}"#, 1).unwrap();
        assert_eq!(record.into_frame(), LandmarkFrame::Absent);

        let record = parse_record(r#"{"timestamp_ms": 0}"#, 2).unwrap();
        assert_eq!(record.subject, None);
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = parse_record("not json", 7).unwrap_err();
        assert!(matches!(err, MonitorError::Parse { line: 7, .. }));
        assert!(err.to_string().starts_with("Line 7"));
    }
}
