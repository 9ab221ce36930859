use std::fmt;
use std::sync::Arc;

use crate::collection::Record;
use crate::operator::Operator;
use crate::value::Value;

/// Record-level filter function: `(record, parsed request value) -> bool`.
pub type FilterFn = Arc<dyn Fn(&dyn Record, &Value) -> bool + Send + Sync>;

/// Boolean test over one record.
///
/// Missing fields read as `Value::Null`. `All(vec![])` matches everything,
/// `Any(vec![])` matches nothing.
#[derive(Clone)]
pub enum Predicate {
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Compare {
        field: String,
        op: Operator,
        value: Value,
    },
    Custom {
        name: String,
        func: FilterFn,
        value: Value,
    },
}

impl Predicate {
    pub fn always() -> Self {
        Predicate::All(Vec::new())
    }

    pub fn compare(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Conjunction; flattens nested `All`s.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::All(mut a), Predicate::All(b)) => {
                a.extend(b);
                Predicate::All(a)
            }
            (Predicate::All(mut a), p) => {
                a.push(p);
                Predicate::All(a)
            }
            (p, Predicate::All(mut b)) => {
                b.insert(0, p);
                Predicate::All(b)
            }
            (a, b) => Predicate::All(vec![a, b]),
        }
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::All(v) if v.is_empty())
    }

    pub fn matches(&self, record: &dyn Record) -> bool {
        match self {
            Predicate::All(parts) => parts.iter().all(|p| p.matches(record)),
            Predicate::Any(parts) => parts.iter().any(|p| p.matches(record)),
            Predicate::Compare { field, op, value } => {
                let actual = record.field(field).unwrap_or(Value::Null);
                op.apply(&actual, value)
            }
            Predicate::Custom { func, value, .. } => func(record, value),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All(parts) => f.debug_tuple("All").field(parts).finish(),
            Predicate::Any(parts) => f.debug_tuple("Any").field(parts).finish(),
            Predicate::Compare { field, op, value } => {
                write!(f, "{field} {op:?} {value}")
            }
            Predicate::Custom { name, value, .. } => write!(f, "{name}({value})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn widget(size: i64, color: &str) -> HashMap<String, Value> {
        HashMap::from([
            ("size".to_string(), Value::Int(size)),
            ("color".to_string(), Value::from(color)),
        ])
    }

    #[test]
    fn all_and_any() {
        let red = Predicate::compare("color", Operator::Eq, "red");
        let big = Predicate::compare("size", Operator::Ge, 5);

        let w = widget(6, "red");
        assert!(red.clone().and(big.clone()).matches(&w));
        assert!(!Predicate::Any(vec![]).matches(&w));
        assert!(Predicate::always().matches(&w));

        let small_red = widget(1, "red");
        assert!(!red.clone().and(big.clone()).matches(&small_red));
        assert!(Predicate::Any(vec![red, big]).matches(&small_red));
    }

    #[test]
    fn missing_field_reads_as_null() {
        let p = Predicate::compare("weight", Operator::Eq, Value::Null);
        assert!(p.matches(&widget(1, "red")));
    }

    #[test]
    fn and_flattens() {
        let p = Predicate::always()
            .and(Predicate::compare("size", Operator::Gt, 1))
            .and(Predicate::compare("size", Operator::Lt, 5));
        assert!(matches!(&p, Predicate::All(v) if v.len() == 2));
        assert!(p.matches(&widget(3, "blue")));
        assert_eq!(format!("{:?}", p), "All([size gt 1, size lt 5])");
    }

    #[test]
    fn custom_sees_whole_record() {
        let odd: FilterFn = Arc::new(|record, value| {
            let size = record.field("size").and_then(|v| v.as_i64()).unwrap_or(0);
            value.as_bool() == Some(size % 2 == 1)
        });
        let p = Predicate::Custom {
            name: "size_is_odd".into(),
            func: odd,
            value: Value::Bool(true),
        };
        assert!(p.matches(&widget(3, "blue")));
        assert!(!p.matches(&widget(6, "red")));
    }
}
