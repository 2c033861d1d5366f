use crate::errors::{JaxpError, Result};
use crate::text;
use crate::types::{Column, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison applied by a [`Match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Distinct,
    Equal,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    StartsWith,
    EndsWith,
    Contains,
}

impl ComparisonOperator {
    /// Legacy numeric operator codes, 1001 (`Distinct`) through 1009 (`Contains`).
    pub fn from_code(code: u16) -> Result<Self> {
        let op = match code {
            1001 => ComparisonOperator::Distinct,
            1002 => ComparisonOperator::Equal,
            1003 => ComparisonOperator::LessThan,
            1004 => ComparisonOperator::GreaterThan,
            1005 => ComparisonOperator::LessOrEqual,
            1006 => ComparisonOperator::GreaterOrEqual,
            1007 => ComparisonOperator::StartsWith,
            1008 => ComparisonOperator::EndsWith,
            1009 => ComparisonOperator::Contains,
            other => return Err(JaxpError::invalid_operator(&other.to_string())),
        };
        Ok(op)
    }

    /// SQL symbol for the plain comparisons; `None` for the LIKE family.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            ComparisonOperator::Distinct => Some("!="),
            ComparisonOperator::Equal => Some("="),
            ComparisonOperator::LessThan => Some("<"),
            ComparisonOperator::GreaterThan => Some(">"),
            ComparisonOperator::LessOrEqual => Some("<="),
            ComparisonOperator::GreaterOrEqual => Some(">="),
            ComparisonOperator::StartsWith
            | ComparisonOperator::EndsWith
            | ComparisonOperator::Contains => None,
        }
    }

    pub fn is_pattern(&self) -> bool {
        self.symbol().is_none()
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonOperator::Distinct => ordering != Ordering::Equal,
            ComparisonOperator::Equal => ordering == Ordering::Equal,
            ComparisonOperator::LessThan => ordering == Ordering::Less,
            ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
            ComparisonOperator::LessOrEqual => ordering != Ordering::Greater,
            ComparisonOperator::GreaterOrEqual => ordering != Ordering::Less,
            ComparisonOperator::StartsWith
            | ComparisonOperator::EndsWith
            | ComparisonOperator::Contains => false,
        }
    }
}

impl FromStr for ComparisonOperator {
    type Err = JaxpError;

    fn from_str(s: &str) -> Result<Self> {
        let op = match s.trim().to_uppercase().as_str() {
            "!=" | "<>" | "DISTINCT" => ComparisonOperator::Distinct,
            "=" | "==" | "EQUAL" => ComparisonOperator::Equal,
            "<" | "LESS_THAN" => ComparisonOperator::LessThan,
            ">" | "GREATER_THAN" => ComparisonOperator::GreaterThan,
            "<=" | "LESS_OR_EQUAL" => ComparisonOperator::LessOrEqual,
            ">=" | "GREATER_OR_EQUAL" => ComparisonOperator::GreaterOrEqual,
            "STARTS_WITH" => ComparisonOperator::StartsWith,
            "ENDS_WITH" => ComparisonOperator::EndsWith,
            "CONTAINS" => ComparisonOperator::Contains,
            _ => return Err(JaxpError::invalid_operator(s)),
        };
        Ok(op)
    }
}

/// How the matches of a [`Conditions`] set are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolOperator {
    #[default]
    And,
    Or,
}

impl BoolOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOperator::And => "AND",
            BoolOperator::Or => "OR",
        }
    }
}

impl FromStr for BoolOperator {
    type Err = JaxpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AND" => Ok(BoolOperator::And),
            "OR" => Ok(BoolOperator::Or),
            other => Err(JaxpError::invalid_operator(other)),
        }
    }
}

/// A single comparison between a column and a literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    pub column: Column,
    pub value: Value,
    pub operator: ComparisonOperator,
}

impl Match {
    pub fn new(column: &Column, value: impl Into<Value>, operator: ComparisonOperator) -> Self {
        Self {
            column: column.to_schema(),
            value: value.into(),
            operator,
        }
    }

    /// Evaluates the match against one candidate cell. A missing cell is
    /// treated as null.
    pub fn match_against(&self, candidate: Option<&Value>) -> bool {
        let candidate = candidate.unwrap_or(&Value::Null);
        match self.operator {
            ComparisonOperator::Contains => {
                text::contains(&candidate.to_text(), &self.value.to_text(), false)
            }
            ComparisonOperator::StartsWith => {
                text::starts_with(&candidate.to_text(), &self.value.to_text(), false)
            }
            ComparisonOperator::EndsWith => {
                text::ends_with(&candidate.to_text(), &self.value.to_text(), false)
            }
            op => op.accepts(candidate.compare(&self.value)),
        }
    }

    /// Renders `<column> <op> <literal>`. The LIKE family only renders for
    /// quoted column types; other types get an empty operator.
    pub fn to_query_fragment(&self) -> String {
        let quoted = self.column.has_quotes();
        let value = self.value.to_text();
        let operand = match self.operator {
            ComparisonOperator::Contains if quoted => format!("LIKE '%{}%'", value),
            ComparisonOperator::StartsWith if quoted => format!("LIKE '{}%'", value),
            ComparisonOperator::EndsWith if quoted => format!("LIKE '%{}'", value),
            ComparisonOperator::Contains
            | ComparisonOperator::StartsWith
            | ComparisonOperator::EndsWith => String::new(),
            op => {
                let symbol = op.symbol().unwrap_or_default();
                format!("{} {}", symbol, self.value.to_literal(quoted))
            }
        };
        format!("{} {}", self.column.name, operand)
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_fragment())
    }
}

/// Ordered set of matches, joined by one boolean operator when rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    matches: Vec<Match>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_condition(
        &mut self,
        column: &Column,
        value: impl Into<Value>,
        operator: ComparisonOperator,
    ) -> &mut Self {
        self.matches.push(Match::new(column, value, operator));
        self
    }

    /// Removes the first equal match. Returns whether one was found.
    pub fn remove_condition(&mut self, target: &Match) -> bool {
        match self.matches.iter().position(|m| m == target) {
            Some(pos) => {
                self.matches.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Joins the rendered matches with `AND` or `OR`.
    pub fn to_query_fragment(&self, bool_op: &str) -> Result<String> {
        let op = bool_op.parse::<BoolOperator>()?;
        Ok(self.render(op))
    }

    pub fn render(&self, op: BoolOperator) -> String {
        let separator = format!(" {} ", op.as_str());
        self.matches
            .iter()
            .map(Match::to_query_fragment)
            .collect::<Vec<_>>()
            .join(&separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnType;

    fn title() -> Column {
        Column::with_type("title", ColumnType::String)
    }

    fn id() -> Column {
        Column::with_type("id", ColumnType::Numeric).with_flags("primary_key")
    }

    #[test]
    fn test_fragment_rendering() {
        let contains = Match::new(&title(), "Foo", ComparisonOperator::Contains);
        assert_eq!(contains.to_query_fragment(), "title LIKE '%Foo%'");

        let starts = Match::new(&title(), "Foo", ComparisonOperator::StartsWith);
        assert_eq!(starts.to_query_fragment(), "title LIKE 'Foo%'");

        let ends = Match::new(&title(), "Foo", ComparisonOperator::EndsWith);
        assert_eq!(ends.to_query_fragment(), "title LIKE '%Foo'");

        let greater = Match::new(&id(), 5, ComparisonOperator::GreaterThan);
        assert_eq!(greater.to_query_fragment(), "id > 5");

        let equal = Match::new(&id(), 5, ComparisonOperator::Equal);
        assert_eq!(equal.to_query_fragment(), "id = 5");

        let distinct = Match::new(&title(), "x", ComparisonOperator::Distinct);
        assert_eq!(distinct.to_string(), "title != 'x'");
    }

    #[test]
    fn test_like_on_unquoted_type_renders_empty_operator() {
        let m = Match::new(&id(), 5, ComparisonOperator::Contains);
        assert_eq!(m.to_query_fragment(), "id ");
    }

    #[test]
    fn test_match_against_text_operators_ignore_case() {
        let contains = Match::new(&title(), "am", ComparisonOperator::Contains);
        assert!(!contains.match_against(Some(&Value::from("Alpha"))));
        assert!(contains.match_against(Some(&Value::from("GAMMA"))));

        let starts = Match::new(&title(), "al", ComparisonOperator::StartsWith);
        assert!(starts.match_against(Some(&Value::from("Alpha"))));
        assert!(!starts.match_against(Some(&Value::from("Beta"))));

        let ends = Match::new(&title(), "TA", ComparisonOperator::EndsWith);
        assert!(ends.match_against(Some(&Value::from("Beta"))));
        assert!(!ends.match_against(None));
    }

    #[test]
    fn test_match_against_comparisons() {
        let gt = Match::new(&id(), 5, ComparisonOperator::GreaterThan);
        assert!(gt.match_against(Some(&Value::from(10))));
        // numeric, not lexical: "10" > 5
        assert!(gt.match_against(Some(&Value::from("10"))));
        assert!(!gt.match_against(Some(&Value::from(5))));

        let le = Match::new(&id(), 5, ComparisonOperator::LessOrEqual);
        assert!(le.match_against(Some(&Value::from(5))));
        assert!(!le.match_against(Some(&Value::from(6))));

        let eq = Match::new(&title(), "Beta", ComparisonOperator::Equal);
        assert!(eq.match_against(Some(&Value::from("Beta"))));
        assert!(!eq.match_against(Some(&Value::from("beta"))));

        let ne = Match::new(&title(), "Beta", ComparisonOperator::Distinct);
        assert!(ne.match_against(Some(&Value::from("Gamma"))));

        let ge = Match::new(&title(), "b", ComparisonOperator::GreaterOrEqual);
        assert!(ge.match_against(Some(&Value::from("c"))));
        assert!(!ge.match_against(Some(&Value::from("a"))));

        let lt = Match::new(&id(), 3, ComparisonOperator::LessThan);
        assert!(lt.match_against(Some(&Value::from(2.5))));
    }

    #[test]
    fn test_match_against_large_ids() {
        let eq = Match::new(&id(), 9007199254740993i64, ComparisonOperator::Equal);
        assert!(!eq.match_against(Some(&Value::from(9007199254740992i64))));
        assert!(eq.match_against(Some(&Value::from(9007199254740993i64))));

        let ne = Match::new(&id(), 9007199254740993i64, ComparisonOperator::Distinct);
        assert!(ne.match_against(Some(&Value::from("9007199254740992"))));
    }

    #[test]
    fn test_conditions_join() {
        let mut conditions = Conditions::new();
        conditions
            .add_condition(&id(), 2, ComparisonOperator::Equal)
            .add_condition(&title(), "Y", ComparisonOperator::Distinct);

        assert_eq!(
            conditions.to_query_fragment("AND").unwrap(),
            "id = 2 AND title != 'Y'"
        );
        assert_eq!(
            conditions.to_query_fragment("OR").unwrap(),
            "id = 2 OR title != 'Y'"
        );
        assert!(matches!(
            conditions.to_query_fragment("XOR"),
            Err(JaxpError::InvalidOperator(_))
        ));
        assert_eq!(Conditions::new().render(BoolOperator::And), "");
    }

    #[test]
    fn test_remove_condition() {
        let mut conditions = Conditions::new();
        conditions
            .add_condition(&id(), 1, ComparisonOperator::Equal)
            .add_condition(&id(), 2, ComparisonOperator::Equal)
            .add_condition(&id(), 1, ComparisonOperator::Equal);

        let target = Match::new(&id(), 1, ComparisonOperator::Equal);
        assert!(conditions.remove_condition(&target));
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions.render(BoolOperator::And), "id = 2 AND id = 1");

        let absent = Match::new(&id(), 9, ComparisonOperator::Equal);
        assert!(!conditions.remove_condition(&absent));
        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn test_operator_parsing() {
        assert_eq!("<>".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::Distinct);
        assert_eq!(">=".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::GreaterOrEqual);
        assert_eq!("contains".parse::<ComparisonOperator>().unwrap(), ComparisonOperator::Contains);
        assert!("~".parse::<ComparisonOperator>().is_err());

        assert_eq!(ComparisonOperator::from_code(1009).unwrap(), ComparisonOperator::Contains);
        assert_eq!(ComparisonOperator::from_code(1001).unwrap(), ComparisonOperator::Distinct);
        assert!(matches!(
            ComparisonOperator::from_code(1010),
            Err(JaxpError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_match_keeps_schema_only_column() {
        let valued = title().with_value("Alpha");
        let m = Match::new(&valued, "x", ComparisonOperator::Equal);
        assert!(m.column.value.is_none());
    }
}
