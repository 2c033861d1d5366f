use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Flag carried by primary-key columns; stands in for "auto increment".
pub const PRIMARY_KEY_FLAG: &str = "primary_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Blob,
    Date,
    Time,
    Numeric,
    Other,
}

impl ColumnType {
    /// Maps a driver-reported type name onto a column type.
    ///
    /// Accepts the MySQL field-type names (`string`, `blob`, `int`, `real`,
    /// `date`, `time`, ...) as well as SQLite declared types, which are
    /// matched by affinity substrings.
    pub fn from_declared(s: &str) -> Self {
        let declared = s.trim().to_lowercase();
        match declared.as_str() {
            "string" | "var_string" | "char" | "varchar" | "text" => ColumnType::String,
            "blob" => ColumnType::Blob,
            "date" => ColumnType::Date,
            "time" => ColumnType::Time,
            "datetime" | "timestamp" => ColumnType::Date,
            "int" | "integer" | "real" | "float" | "double" | "decimal" | "numeric" | "year"
            | "bool" | "boolean" => ColumnType::Numeric,
            "" | "null" => ColumnType::Other,
            other => {
                if other.contains("int") {
                    ColumnType::Numeric
                } else if other.contains("char") || other.contains("clob") || other.contains("text") {
                    ColumnType::String
                } else if other.contains("blob") {
                    ColumnType::Blob
                } else if other.contains("datetime") || other.contains("timestamp") || other.starts_with("date") {
                    ColumnType::Date
                } else if other.starts_with("time") {
                    ColumnType::Time
                } else if other.contains("real")
                    || other.contains("floa")
                    || other.contains("doub")
                    || other.contains("dec")
                    || other.contains("num")
                {
                    ColumnType::Numeric
                } else {
                    ColumnType::Other
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Blob => "blob",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Numeric => "numeric",
            ColumnType::Other => "other",
        }
    }

    /// Literals of these types are wrapped in single quotes.
    pub fn has_quotes(&self) -> bool {
        matches!(
            self,
            ColumnType::String | ColumnType::Blob | ColumnType::Date | ColumnType::Time
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(OrderedFloat<f64>),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form used for string operations and literal rendering.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Numeric reading of the value, if it has one. Text counts when the
    /// whole (trimmed) string parses as a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(r.into_inner()),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Loose truthiness: null, zero, empty text and `"0"` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Integer(i) => *i != 0,
            Value::Real(r) => r.into_inner() != 0.0,
            Value::Text(s) => !(s.is_empty() || s == "0"),
            Value::Blob(b) => !b.is_empty(),
        }
    }

    /// Exact numeric reading: integers stay integers, NaN is kept.
    fn numeric(&self) -> Option<Number> {
        match self {
            Value::Integer(i) => Some(Number::Int(*i)),
            Value::Real(r) => Some(Number::Float(r.into_inner())),
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Number::Int)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|n| n.is_finite()).map(Number::Float))
            }
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Numeric ordering when both sides are numbers, lexical otherwise.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_text().cmp(&other.to_text()),
        }
    }

    /// Total order used for sorting: nulls, then numbers, then everything
    /// else by text. Agrees with [`Value::compare`] whenever both sides fall
    /// in the same group.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        let rank = |v: &Value, n: &Option<Number>| match (v, n) {
            (Value::Null, _) => 0,
            (_, Some(_)) => 1,
            _ => 2,
        };
        let (a, b) = (self.numeric(), other.numeric());
        rank(self, &a).cmp(&rank(other, &b)).then_with(|| match (a, b) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_text().cmp(&other.to_text()),
        })
    }

    /// Renders the value as a statement literal. Values are not escaped.
    pub fn to_literal(&self, quoted: bool) -> String {
        if quoted {
            format!("'{}'", self.to_text())
        } else if self.is_null() {
            "NULL".to_string()
        } else {
            self.to_text()
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(r) => serde_json::Value::from(r.into_inner()),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Blob(b) => serde_json::Value::String(hex::encode(b)),
        }
    }
}

/// Numeric cell reading. Ordered by real value, NaN above everything.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn cmp(&self, other: &Number) -> Ordering {
        match (*self, *other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(&b),
            (Number::Float(a), Number::Float(b)) => cmp_floats(a, b),
            (Number::Int(a), Number::Float(b)) => cmp_int_float(a, b),
            (Number::Float(a), Number::Int(b)) => cmp_int_float(b, a).reverse(),
        }
    }
}

fn cmp_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        // neither side is NaN here
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Exact comparison of an integer with a float, without rounding the integer.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() || f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    i.cmp(&(whole as i64)).then_with(|| cmp_floats(0.0, f - whole))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(OrderedFloat(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

/// One field: schema metadata, plus a value when it belongs to a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub flags: BTreeSet<String>,
    pub value: Option<Value>,
}

impl Column {
    /// Builds a column from driver metadata; `flags` is whitespace separated.
    pub fn new(name: &str, type_name: &str, flags: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: ColumnType::from_declared(type_name),
            flags: flags.split_whitespace().map(str::to_string).collect(),
            value: None,
        }
    }

    pub fn with_type(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            flags: BTreeSet::new(),
            value: None,
        }
    }

    pub fn with_flags(mut self, flags: &str) -> Self {
        self.flags.extend(flags.split_whitespace().map(str::to_string));
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn has_quotes(&self) -> bool {
        self.column_type.has_quotes()
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_primary_key(&self) -> bool {
        self.has_flag(PRIMARY_KEY_FLAG)
    }

    /// Copy of the column's metadata with no value attached.
    pub fn to_schema(&self) -> Column {
        Column {
            value: None,
            ..self.clone()
        }
    }

    /// Literal form of the current value, quoted according to the type.
    /// An absent value renders like null.
    pub fn literal(&self) -> String {
        self.value
            .as_ref()
            .unwrap_or(&Value::Null)
            .to_literal(self.has_quotes())
    }
}

/// Addresses a column either by position or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for ColumnKey<'_> {
    fn from(index: usize) -> Self {
        ColumnKey::Index(index)
    }
}

impl<'a> From<&'a str> for ColumnKey<'a> {
    fn from(name: &'a str) -> Self {
        ColumnKey::Name(name)
    }
}

impl<'a> From<&'a String> for ColumnKey<'a> {
    fn from(name: &'a String) -> Self {
        ColumnKey::Name(name.as_str())
    }
}
