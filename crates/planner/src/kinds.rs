//! Builtin predicate kinds and their lowering to boolean expressions.

use crate::query::ast::expr::{Attribute, BinaryOperator, Expr};
use crate::registry::{PredicateKind, SignatureRule};
use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use model::{PropertyType, Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl PeriodUnit {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "day" => Some(PeriodUnit::Day),
            "week" => Some(PeriodUnit::Week),
            "month" => Some(PeriodUnit::Month),
            "quarter" => Some(PeriodUnit::Quarter),
            "year" => Some(PeriodUnit::Year),
            _ => None,
        }
    }
}

/// The operator a predicate kind lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindOp {
    Eq,
    NotEq,
    In,
    Empty,
    BeginsWith,
    Contains,
    EndsWith,
    IsOn,
    IsOff,
    Between,
    Before,
    After,
    LessThan,
    GreaterThan,
    CurrentPeriod(PeriodUnit),
    Recent,
}

impl KindOp {
    /// Lower the operator against a resolved attribute and cast arguments.
    /// Argument count and types are guaranteed by the signature check.
    pub fn lower(&self, attr: Attribute, property_ty: &PropertyType, args: &[Value]) -> Expr {
        let attr = Expr::attribute(attr);
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);
        match self {
            KindOp::Eq => Expr::eq(attr, Expr::Value(arg(0))),
            KindOp::NotEq => Expr::binary(attr, BinaryOperator::NotEq, Expr::Value(arg(0))),
            KindOp::In => {
                let items = match arg(0) {
                    Value::List(items) => items,
                    other => vec![other],
                };
                Expr::binary(attr, BinaryOperator::In, Expr::List(items))
            }
            KindOp::Empty => Expr::or(
                Expr::eq(attr.clone(), Expr::Value(Value::Null)),
                Expr::eq(attr, Expr::Value(Value::String(String::new()))),
            ),
            KindOp::BeginsWith => like(attr, format!("{}%", escape_like(&arg(0)))),
            KindOp::Contains => like(attr, format!("%{}%", escape_like(&arg(0)))),
            KindOp::EndsWith => like(attr, format!("%{}", escape_like(&arg(0)))),
            KindOp::IsOn => Expr::eq(attr, Expr::Value(Value::Boolean(true))),
            KindOp::IsOff => Expr::or(
                Expr::eq(attr.clone(), Expr::Value(Value::Boolean(false))),
                Expr::eq(attr, Expr::Value(Value::Null)),
            ),
            KindOp::Between => between(attr, arg(0), arg(1)),
            KindOp::Before => Expr::binary(attr, BinaryOperator::Lt, Expr::Value(arg(0))),
            KindOp::After => Expr::binary(attr, BinaryOperator::Gt, Expr::Value(arg(0))),
            KindOp::LessThan => Expr::binary(attr, BinaryOperator::Lt, Expr::Value(arg(0))),
            KindOp::GreaterThan => Expr::binary(attr, BinaryOperator::Gt, Expr::Value(arg(0))),
            KindOp::CurrentPeriod(unit) => {
                let today = Utc::now().date_naive();
                let (start, stop) = period_bounds(*unit, today);
                let (start, stop) = bound_values(property_ty, start, stop);
                between(attr, start, stop)
            }
            KindOp::Recent => {
                let today = Utc::now().date_naive();
                let unit = arg(0)
                    .as_str()
                    .and_then(PeriodUnit::from_token)
                    .unwrap_or(PeriodUnit::Day);
                let (start, stop) = bound_values(property_ty, recent_start(unit, today), today);
                between(attr, start, stop)
            }
        }
    }
}

fn like(attr: Expr, pattern: String) -> Expr {
    Expr::binary(attr, BinaryOperator::Like, Expr::Value(Value::String(pattern)))
}

fn between(attr: Expr, start: Value, stop: Value) -> Expr {
    Expr::and(
        Expr::binary(attr.clone(), BinaryOperator::GtEq, Expr::Value(start)),
        Expr::binary(attr, BinaryOperator::LtEq, Expr::Value(stop)),
    )
}

fn escape_like(value: &Value) -> String {
    let needle = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    needle.replace('%', "\\%")
}

/// Inclusive calendar bounds of the period containing `today`. Weeks start
/// on Monday.
fn period_bounds(unit: PeriodUnit, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match unit {
        PeriodUnit::Day => (today, today),
        PeriodUnit::Week => {
            let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            (start, start + Duration::days(6))
        }
        PeriodUnit::Month => {
            let start = today.with_day(1).expect("first of month is valid");
            let stop = start
                .checked_add_months(Months::new(1))
                .map(|next| next - Duration::days(1))
                .unwrap_or(today);
            (start, stop)
        }
        PeriodUnit::Quarter => {
            let month = (today.month0() / 3) * 3 + 1;
            let start =
                NaiveDate::from_ymd_opt(today.year(), month, 1).expect("quarter start is valid");
            let stop = start
                .checked_add_months(Months::new(3))
                .map(|next| next - Duration::days(1))
                .unwrap_or(today);
            (start, stop)
        }
        PeriodUnit::Year => (
            NaiveDate::from_ymd_opt(today.year(), 1, 1).expect("year start is valid"),
            NaiveDate::from_ymd_opt(today.year(), 12, 31).expect("year end is valid"),
        ),
    }
}

fn recent_start(unit: PeriodUnit, today: NaiveDate) -> NaiveDate {
    match unit {
        PeriodUnit::Day => today - Duration::days(1),
        PeriodUnit::Week => today - Duration::days(7),
        PeriodUnit::Month => today.checked_sub_months(Months::new(1)).unwrap_or(today),
        PeriodUnit::Quarter => today.checked_sub_months(Months::new(3)).unwrap_or(today),
        PeriodUnit::Year => today.checked_sub_months(Months::new(12)).unwrap_or(today),
    }
}

/// Period bounds typed after the property: plain dates for date properties,
/// day-edge timestamps for time properties.
fn bound_values(property_ty: &PropertyType, start: NaiveDate, stop: NaiveDate) -> (Value, Value) {
    match property_ty.value_type() {
        ValueType::Time => (
            Value::Timestamp(
                start
                    .and_hms_opt(0, 0, 0)
                    .expect("midnight is valid")
                    .and_utc(),
            ),
            Value::Timestamp(
                stop.and_hms_opt(23, 59, 59)
                    .expect("end of day is valid")
                    .and_utc(),
            ),
        ),
        _ => (Value::Date(start), Value::Date(stop)),
    }
}

fn per_type(table: &[(ValueType, &[ValueType])]) -> SignatureRule {
    SignatureRule::PerType(
        table
            .iter()
            .map(|(ty, args)| (*ty, args.to_vec()))
            .collect(),
    )
}

/// The builtin kind set, ported operator by operator from the classic
/// filter vocabulary.
pub fn builtins() -> Vec<PredicateKind> {
    use ValueType::*;
    let mut kinds = vec![
        PredicateKind::new("eq", SignatureRule::Mirror, KindOp::Eq),
        // Not-equal keeps its per-row semantics across one-to-many joins: an
        // entity with one associated row matching the value and another not
        // matching is still excluded. Known limitation, kept as-is.
        PredicateKind::child_of("not_eq", "eq", per_type(&[]), KindOp::NotEq),
        PredicateKind::new("in", SignatureRule::ListArg, KindOp::In),
        PredicateKind::new("empty", per_type(&[(String, &[])]), KindOp::Empty),
        PredicateKind::new(
            "begins_with",
            per_type(&[(String, &[String])]),
            KindOp::BeginsWith,
        ),
        PredicateKind::new(
            "contains",
            per_type(&[(String, &[String])]),
            KindOp::Contains,
        ),
        PredicateKind::new(
            "ends_with",
            per_type(&[(String, &[String])]),
            KindOp::EndsWith,
        ),
        PredicateKind::new("is_on", per_type(&[(Boolean, &[])]), KindOp::IsOn),
        PredicateKind::new("is_off", per_type(&[(Boolean, &[])]), KindOp::IsOff),
        PredicateKind::new(
            "between",
            per_type(&[
                (Date, &[Date, Date]),
                (Time, &[Time, Time]),
                (Integer, &[Integer, Integer]),
                (Decimal, &[Decimal, Decimal]),
            ]),
            KindOp::Between,
        ),
        PredicateKind::new(
            "before",
            per_type(&[(Date, &[Date]), (Time, &[Time])]),
            KindOp::Before,
        ),
        PredicateKind::new(
            "after",
            per_type(&[(Date, &[Date]), (Time, &[Time])]),
            KindOp::After,
        ),
        PredicateKind::new(
            "less_than",
            per_type(&[(Integer, &[Integer]), (Decimal, &[Decimal]), (Float, &[Float])]),
            KindOp::LessThan,
        ),
        PredicateKind::new(
            "greater_than",
            per_type(&[(Integer, &[Integer]), (Decimal, &[Decimal]), (Float, &[Float])]),
            KindOp::GreaterThan,
        ),
        PredicateKind::new(
            "recent",
            per_type(&[(Date, &[Period]), (Time, &[Period])]),
            KindOp::Recent,
        ),
        // Parent of the today/this_* family; also usable directly, in which
        // case it behaves like today.
        PredicateKind::new(
            "current_period",
            per_type(&[(Date, &[]), (Time, &[])]),
            KindOp::CurrentPeriod(PeriodUnit::Day),
        ),
    ];
    for (name, unit) in [
        ("today", PeriodUnit::Day),
        ("this_week", PeriodUnit::Week),
        ("this_month", PeriodUnit::Month),
        ("this_quarter", PeriodUnit::Quarter),
        ("this_year", PeriodUnit::Year),
    ] {
        kinds.push(PredicateKind::child_of(
            name,
            "current_period",
            per_type(&[]),
            KindOp::CurrentPeriod(unit),
        ));
    }
    kinds
}
