// src/header.rs - Interpretation of the self-describing Bro/Zeek header block
//
// Lines are raw bytes: Zeek logs are not guaranteed to be UTF-8 and the
// separator may be any single byte.

use crate::error::{CutError, LineError};
use crate::pipeline::config::ColumnSelector;

pub const SEPARATOR_MARKER: &[u8] = b"#separator ";
pub const FIELDS_MARKER: &[u8] = b"#fields";
pub const TYPES_MARKER: &[u8] = b"#types";
pub const UNSET_FIELD_MARKER: &[u8] = b"#unset_field";
pub const EMPTY_FIELD_MARKER: &[u8] = b"#empty_field";

pub const DEFAULT_SEPARATOR: u8 = b'\t';
pub const DEFAULT_UNSET_FIELD: &[u8] = b"-";
pub const DEFAULT_EMPTY_FIELD: &[u8] = b"(empty)";

/// The header lines that change interpretation state. Anything else
/// starting with `#` is opaque metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Separator,
    Fields,
    Types,
    UnsetField,
    EmptyField,
    Other,
}

impl HeaderKind {
    pub fn classify(line: &[u8], input_separator: u8) -> HeaderKind {
        if line.starts_with(SEPARATOR_MARKER) {
            return HeaderKind::Separator;
        }

        let marker = line
            .split(|&b| b == input_separator)
            .next()
            .unwrap_or(line);
        match marker {
            FIELDS_MARKER => HeaderKind::Fields,
            TYPES_MARKER => HeaderKind::Types,
            UNSET_FIELD_MARKER => HeaderKind::UnsetField,
            EMPTY_FIELD_MARKER => HeaderKind::EmptyField,
            _ => HeaderKind::Other,
        }
    }
}

/// Source position of one output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputIndex {
    /// 0-based position in the parsed row
    Field(usize),
    /// Requested column is not in the current header; emitted empty
    Absent,
}

impl OutputIndex {
    pub fn position(self) -> Option<usize> {
        match self {
            OutputIndex::Field(pos) => Some(pos),
            OutputIndex::Absent => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separators {
    pub input: u8,
    pub output: u8,
}

/// Output columns resolved against one `#fields` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub output_indexes: Vec<OutputIndex>,
    /// One past the highest referenced position; the number of leading
    /// fields a data line must be split into.
    pub index_range: usize,
}

impl FieldLayout {
    pub fn resolve(names: &[&[u8]], selector: &ColumnSelector) -> FieldLayout {
        let output_indexes: Vec<OutputIndex> = if selector.selects_all() {
            (0..names.len()).map(OutputIndex::Field).collect()
        } else if !selector.negate {
            selector
                .columns
                .iter()
                .map(|column| {
                    names
                        .iter()
                        .position(|name| *name == column.as_bytes())
                        .map_or(OutputIndex::Absent, OutputIndex::Field)
                })
                .collect()
        } else {
            names
                .iter()
                .enumerate()
                .filter(|(_, name)| !selector.columns.iter().any(|c| c.as_bytes() == **name))
                .map(|(pos, _)| OutputIndex::Field(pos))
                .collect()
        };

        let index_range = output_indexes
            .iter()
            .filter_map(|index| index.position())
            .max()
            .map_or(0, |max| max + 1);

        FieldLayout {
            output_indexes,
            index_range,
        }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.output_indexes.contains(&OutputIndex::Field(position))
    }
}

/// Everything the most recent header lines established. Never mutated in
/// place: each recognised header line yields a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderState {
    pub separators: Separators,
    /// `None` until the first `#fields` line
    pub layout: Option<FieldLayout>,
    /// Row position of the `time` column to convert
    pub time_column: Option<usize>,
    pub unset_field: Vec<u8>,
    pub empty_field: Vec<u8>,
}

impl HeaderState {
    pub fn new(output_override: Option<u8>) -> Self {
        HeaderState {
            separators: Separators {
                input: DEFAULT_SEPARATOR,
                output: output_override.unwrap_or(DEFAULT_SEPARATOR),
            },
            layout: None,
            time_column: None,
            unset_field: DEFAULT_UNSET_FIELD.to_vec(),
            empty_field: DEFAULT_EMPTY_FIELD.to_vec(),
        }
    }

    /// Apply a `#separator ` line. The output separator follows the input
    /// one unless the user overrode it.
    pub fn with_separator(&self, line: &[u8], output_override: Option<u8>) -> HeaderState {
        let raw = line.strip_prefix(SEPARATOR_MARKER).unwrap_or(line);
        let input = decode_separator(raw).unwrap_or(self.separators.input);
        HeaderState {
            separators: Separators {
                input,
                output: output_override.unwrap_or(input),
            },
            ..self.clone()
        }
    }

    /// Apply a `#fields` line, replacing the layout and forgetting any
    /// previously resolved time column.
    pub fn with_fields(
        &self,
        line: &[u8],
        selector: &ColumnSelector,
        max_columns: usize,
    ) -> Result<HeaderState, CutError> {
        let separator = self.separators.input;
        let names: Vec<&[u8]> = line.split(|&b| b == separator).skip(1).collect();
        if names.len() > max_columns {
            return Err(CutError::TooManyColumns {
                count: names.len(),
                max: max_columns,
            });
        }

        Ok(HeaderState {
            layout: Some(FieldLayout::resolve(&names, selector)),
            time_column: None,
            ..self.clone()
        })
    }

    /// Apply a `#types` line: find the first `time`-typed column that is
    /// also being output.
    pub fn with_types(&self, line: &[u8]) -> Result<HeaderState, LineError> {
        let layout = self.layout.as_ref().ok_or(LineError::NoFieldsHeader)?;
        let needed = layout.index_range + 1;
        let separator = self.separators.input;

        let types: Vec<&[u8]> = line
            .splitn(needed + 1, |&b| b == separator)
            .take(needed)
            .collect();
        if types.len() < needed {
            return Err(LineError::TooFewFields {
                expected: needed,
                found: types.len(),
            });
        }

        let time_column = types[1..]
            .iter()
            .enumerate()
            .find(|&(pos, ty)| *ty == b"time" && layout.contains(pos))
            .map(|(pos, _)| pos);

        Ok(HeaderState {
            time_column,
            ..self.clone()
        })
    }

    pub fn with_unset_field(&self, line: &[u8]) -> HeaderState {
        HeaderState {
            unset_field: self.marker_value(line).to_vec(),
            ..self.clone()
        }
    }

    pub fn with_empty_field(&self, line: &[u8]) -> HeaderState {
        HeaderState {
            empty_field: self.marker_value(line).to_vec(),
            ..self.clone()
        }
    }

    /// True for the values Zeek writes in place of an unset or empty field.
    pub fn is_null_marker(&self, value: &[u8]) -> bool {
        value == self.unset_field || value == self.empty_field
    }

    fn marker_value<'l>(&self, line: &'l [u8]) -> &'l [u8] {
        let separator = self.separators.input;
        line.iter()
            .position(|&b| b == separator)
            .map_or(&[][..], |at| &line[at + 1..])
    }
}

/// Decode a `#separator` value: either `\xHH` or a literal byte.
/// A malformed escape falls back to its first raw byte.
pub fn decode_separator(raw: &[u8]) -> Option<u8> {
    if let Some(hex) = raw.strip_prefix(b"\\x") {
        if hex.len() == 2 && hex.iter().all(u8::is_ascii_hexdigit) {
            let digits = std::str::from_utf8(hex).ok()?;
            return u8::from_str_radix(digits, 16).ok();
        }
    }
    raw.first().copied()
}
