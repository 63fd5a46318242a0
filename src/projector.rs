// src/projector.rs - Emit the selected columns of one line

use crate::error::{LineError, TimeError};
use crate::header::{FieldLayout, HeaderState, OutputIndex};
use crate::timestamp::TimeConversion;

/// A projected line, newline included, plus any timestamp conversions
/// that failed along the way (those fields were left empty).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLine {
    pub bytes: Vec<u8>,
    pub warnings: Vec<TimeError>,
}

pub struct RowProjector<'a> {
    state: &'a HeaderState,
    layout: &'a FieldLayout,
    time: Option<&'a TimeConversion>,
    /// Output slot holding the time column, if it is being converted
    time_slot: Option<usize>,
}

impl<'a> RowProjector<'a> {
    pub fn new(
        state: &'a HeaderState,
        time: Option<&'a TimeConversion>,
    ) -> Result<Self, LineError> {
        let layout = state.layout.as_ref().ok_or(LineError::NoFieldsHeader)?;

        let time_slot = match (time, state.time_column) {
            (Some(_), Some(column)) => layout
                .output_indexes
                .iter()
                .position(|index| *index == OutputIndex::Field(column)),
            _ => None,
        };

        Ok(RowProjector {
            state,
            layout,
            time,
            time_slot,
        })
    }

    pub fn project_data(&self, line: &[u8]) -> Result<ProjectedLine, LineError> {
        let fields = split_leading(line, self.state.separators.input, self.layout.index_range)?;
        let separator = self.state.separators.output;

        let mut bytes = Vec::with_capacity(line.len() + 1);
        let mut warnings = Vec::new();

        for (slot, index) in self.layout.output_indexes.iter().enumerate() {
            if slot > 0 {
                bytes.push(separator);
            }
            let OutputIndex::Field(pos) = *index else {
                continue;
            };
            let value = fields[pos];

            match self.time {
                Some(conversion)
                    if self.time_slot == Some(slot) && !self.state.is_null_marker(value) =>
                {
                    match convert_time(conversion, value) {
                        Ok(converted) => bytes.extend_from_slice(converted.as_bytes()),
                        Err(e) => warnings.push(e),
                    }
                }
                _ => bytes.extend_from_slice(value),
            }
        }
        bytes.push(b'\n');

        Ok(ProjectedLine { bytes, warnings })
    }

    /// Project a `#fields` or `#types` line. The marker is always kept.
    /// With `rewrite_time_type`, the converted column's `time` label
    /// becomes `string`.
    pub fn project_header(&self, line: &[u8], rewrite_time_type: bool) -> Result<Vec<u8>, LineError> {
        let fields = split_leading(
            line,
            self.state.separators.input,
            self.layout.index_range + 1,
        )?;
        let (marker, row) = fields
            .split_first()
            .ok_or(LineError::TooFewFields {
                expected: 1,
                found: 0,
            })?;
        let separator = self.state.separators.output;

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(marker);

        for (slot, index) in self.layout.output_indexes.iter().enumerate() {
            bytes.push(separator);
            let OutputIndex::Field(pos) = *index else {
                continue;
            };
            let value = row[pos];
            if rewrite_time_type && self.time_slot == Some(slot) && value == b"time" {
                bytes.extend_from_slice(b"string");
            } else {
                bytes.extend_from_slice(value);
            }
        }
        bytes.push(b'\n');

        Ok(bytes)
    }
}

fn convert_time(conversion: &TimeConversion, value: &[u8]) -> Result<String, TimeError> {
    let text = std::str::from_utf8(value)
        .map_err(|_| TimeError::NotNumeric(String::from_utf8_lossy(value).into_owned()))?;
    conversion.convert(text)
}

/// Split off exactly `count` leading fields. Whatever follows stays
/// unsplit and is never looked at.
fn split_leading(line: &[u8], separator: u8, count: usize) -> Result<Vec<&[u8]>, LineError> {
    let fields: Vec<&[u8]> = line
        .splitn(count + 1, |&b| b == separator)
        .take(count)
        .collect();
    if fields.len() < count {
        return Err(LineError::TooFewFields {
            expected: count,
            found: fields.len(),
        });
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::ColumnSelector;
    use crate::timestamp::TimeZoneMode;

    const FIELDS: &[u8] = b"#fields\ta\tb\tc";
    const TYPES: &[u8] = b"#types\tstring\tstring\ttime";

    fn state(columns: &[&str]) -> HeaderState {
        let selector = ColumnSelector::new(columns.iter().map(|c| c.to_string()).collect());
        HeaderState::new(None)
            .with_fields(FIELDS, &selector, 100)
            .unwrap()
            .with_types(TYPES)
            .unwrap()
    }

    fn utc() -> TimeConversion {
        TimeConversion::new("%Y-%m-%dT%H:%M:%S", TimeZoneMode::Utc).unwrap()
    }

    #[test]
    fn test_select_all_reproduces_line() {
        let state = state(&[]);
        let projector = RowProjector::new(&state, None).unwrap();
        let projected = projector.project_data(b"X\tY\t5").unwrap();
        assert_eq!(projected.bytes, b"X\tY\t5\n");
        assert!(projected.warnings.is_empty());
    }

    #[test]
    fn test_non_utf8_bytes_pass_through() {
        let state = state(&["b", "a"]);
        let projector = RowProjector::new(&state, None).unwrap();
        let projected = projector.project_data(b"caf\xe9\t\xff\xfe\t5").unwrap();
        assert_eq!(projected.bytes, b"\xff\xfe\tcaf\xe9\n");
    }

    #[test]
    fn test_reorder_and_convert() {
        let state = state(&["c", "a"]);
        let time = utc();
        let projector = RowProjector::new(&state, Some(&time)).unwrap();

        assert_eq!(
            projector.project_data(b"X\tY\t5").unwrap().bytes,
            b"1970-01-01T00:00:05\tX\n"
        );
        assert_eq!(
            projector.project_header(FIELDS, false).unwrap(),
            b"#fields\tc\ta\n"
        );
        assert_eq!(
            projector.project_header(TYPES, true).unwrap(),
            b"#types\tstring\tstring\n"
        );
    }

    #[test]
    fn test_absent_column_keeps_alignment() {
        let state = state(&["a", "zz", "b"]);
        let projector = RowProjector::new(&state, None).unwrap();
        assert_eq!(projector.project_data(b"X\tY\tZ").unwrap().bytes, b"X\t\tY\n");
        assert_eq!(
            projector.project_header(FIELDS, false).unwrap(),
            b"#fields\ta\t\tb\n"
        );
    }

    #[test]
    fn test_trailing_fields_are_not_split() {
        let state = state(&["a"]);
        let projector = RowProjector::new(&state, None).unwrap();
        // only one field is needed, so a short line is still fine
        assert_eq!(projector.project_data(b"X").unwrap().bytes, b"X\n");
    }

    #[test]
    fn test_too_few_fields() {
        let state = state(&["c"]);
        let projector = RowProjector::new(&state, None).unwrap();
        assert_eq!(
            projector.project_data(b"X\tY"),
            Err(LineError::TooFewFields {
                expected: 3,
                found: 2
            })
        );
        assert!(projector.project_header(b"#types\tstring", false).is_err());
    }

    #[test]
    fn test_unparseable_time_is_left_empty() {
        let state = state(&["a", "c"]);
        let time = utc();
        let projector = RowProjector::new(&state, Some(&time)).unwrap();
        let projected = projector.project_data(b"X\tY\tsoon").unwrap();
        assert_eq!(projected.bytes, b"X\t\n");
        assert_eq!(
            projected.warnings,
            vec![TimeError::NotNumeric("soon".to_string())]
        );

        let projected = projector.project_data(b"X\tY\t1\xff").unwrap();
        assert_eq!(projected.bytes, b"X\t\n");
        assert_eq!(projected.warnings.len(), 1);
    }

    #[test]
    fn test_unset_time_passes_through() {
        let state = state(&["c"]);
        let time = utc();
        let projector = RowProjector::new(&state, Some(&time)).unwrap();
        let projected = projector.project_data(b"X\tY\t-").unwrap();
        assert_eq!(projected.bytes, b"-\n");
        assert!(projected.warnings.is_empty());
    }

    #[test]
    fn test_no_conversion_without_time_option() {
        let state = state(&["c"]);
        let projector = RowProjector::new(&state, None).unwrap();
        assert_eq!(projector.project_data(b"X\tY\t5").unwrap().bytes, b"5\n");
        assert_eq!(
            projector.project_header(TYPES, false).unwrap(),
            b"#types\ttime\n"
        );
    }

    #[test]
    fn test_only_first_occurrence_of_time_column_converted() {
        let state = state(&["c", "c"]);
        let time = utc();
        let projector = RowProjector::new(&state, Some(&time)).unwrap();
        assert_eq!(
            projector.project_data(b"X\tY\t0").unwrap().bytes,
            b"1970-01-01T00:00:00\t0\n"
        );
        assert_eq!(
            projector.project_header(TYPES, true).unwrap(),
            b"#types\tstring\ttime\n"
        );
    }

    #[test]
    fn test_output_separator() {
        let selector = ColumnSelector::new(vec!["b".into(), "a".into()]).with_output_separator(b',');
        let state = HeaderState::new(selector.output_separator)
            .with_fields(FIELDS, &selector, 100)
            .unwrap();
        let projector = RowProjector::new(&state, None).unwrap();
        assert_eq!(projector.project_data(b"X\tY\tZ").unwrap().bytes, b"Y,X\n");
        assert_eq!(
            projector.project_header(FIELDS, false).unwrap(),
            b"#fields,b,a\n"
        );
    }

    #[test]
    fn test_high_byte_separator() {
        let selector = ColumnSelector::new(vec!["b".into()]);
        let state = HeaderState::new(None)
            .with_separator(b"#separator \\xa6", None)
            .with_fields(b"#fields\xa6a\xa6b", &selector, 100)
            .unwrap();
        let projector = RowProjector::new(&state, None).unwrap();
        assert_eq!(projector.project_data(b"X\xa6Y").unwrap().bytes, b"Y\n");
    }

    #[test]
    fn test_requires_fields_header() {
        let state = HeaderState::new(None);
        assert!(matches!(
            RowProjector::new(&state, None),
            Err(LineError::NoFieldsHeader)
        ));
    }
}
