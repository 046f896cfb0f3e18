use serde_json::{Map, Value};

/// Review record as produced by the scraper, before normalization.
///
/// `row` is the 1-based position in the input and identifies the record in
/// logs until it receives a `review_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    row: usize,
    fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(row: usize, fields: Map<String, Value>) -> Self {
        Self {
            row,
            fields,
        }
    }

    pub fn from_json(row: usize, value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(row, fields)),
            _ => None,
        }
    }

    pub fn from_csv(row: usize, headers: &csv::StringRecord, record: &csv::StringRecord) -> Self {
        let fields = headers.iter()
            .zip(record.iter())
            .map(|(header, value)| (header.trim().to_owned(), Value::String(value.to_owned())))
            .collect();

        Self::new(row, fields)
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// First present, non-blank value among `aliases`, with keys compared
    /// case-insensitively.
    pub fn field(&self, aliases: &[&str]) -> Option<&Value> {
        aliases.iter()
            .find_map(|alias| {
                self.fields.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(alias))
                    .map(|(_, value)| value)
                    .filter(|value| !is_blank(value))
            })
    }

    pub fn text_field(&self, aliases: &[&str]) -> Option<String> {
        self.field(aliases).map(value_to_string)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty() || s.trim().eq_ignore_ascii_case("nan"),
        _ => false,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
