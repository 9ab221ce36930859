use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Two-argument comparison: `(record field value, parsed request value) -> bool`.
pub type CompareFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Filter operator. Built-in kinds cover the usual comparisons; anything
/// else goes through `Custom`.
///
/// Ordering comparisons never match when either side is null. `Eq`/`Ne`
/// treat null as an ordinary value, so `Eq(null, null)` holds.
#[derive(Clone)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Custom(CompareFn),
}

impl Operator {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Operator::Custom(Arc::new(f))
    }

    pub fn apply(&self, field: &Value, arg: &Value) -> bool {
        let ordered = !field.is_null() && !arg.is_null();
        match self {
            Operator::Eq => field == arg,
            Operator::Ne => field != arg,
            Operator::Gt => ordered && field > arg,
            Operator::Ge => ordered && field >= arg,
            Operator::Lt => ordered && field < arg,
            Operator::Le => ordered && field <= arg,
            Operator::Custom(f) => f(field, arg),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins() {
        let three = Value::Int(3);
        assert!(Operator::Eq.apply(&three, &Value::Int(3)));
        assert!(Operator::Ne.apply(&three, &Value::Int(4)));
        assert!(Operator::Ge.apply(&three, &Value::Int(3)));
        assert!(Operator::Gt.apply(&Value::Int(6), &three));
        assert!(!Operator::Lt.apply(&three, &three));
        assert!(Operator::Le.apply(&three, &three));
    }

    #[test]
    fn ordering_never_matches_null() {
        assert!(!Operator::Lt.apply(&Value::Null, &Value::Int(3)));
        assert!(!Operator::Ge.apply(&Value::Int(3), &Value::Null));
        assert!(Operator::Eq.apply(&Value::Null, &Value::Null));
    }

    #[test]
    fn custom_operator() {
        let divides = Operator::custom(|field, arg| match (field.as_i64(), arg.as_i64()) {
            (Some(size), Some(d)) if d != 0 => size % d == 0,
            _ => false,
        });
        assert!(divides.apply(&Value::Int(6), &Value::Int(2)));
        assert!(!divides.apply(&Value::Int(3), &Value::Int(2)));
        assert!(!divides.apply(&Value::Int(3), &Value::Int(0)));
        assert_eq!(format!("{:?}", divides), "custom");
    }
}
