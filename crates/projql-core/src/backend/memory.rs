//! In-memory reference backend.
//!
//! Records are kept per entity as [`Row`]s keyed by field name. Queries are
//! executed with nested-loop joins in node order, SQL-style three-valued
//! predicate evaluation, grouping, aggregation, DISTINCT, ordering and
//! offset/limit paging.

use std::cmp::Ordering;
use std::collections::HashMap;

use projql_proto::{AggregateFunction, JoinKind, OrderDirection, Value};
use tracing::debug;

use super::QueryBackend;
use crate::catalog::{Catalog, ScalarType};
use crate::criteria::{Comparison, CriteriaQuery, Expr, Order, Predicate};
use crate::error::{Error, Result};
use crate::row::Row;

/// One record bound per navigation node; `None` for an unmatched left join.
type Tuple<'r> = Vec<Option<&'r Row>>;

/// Executes criteria queries over records held in memory.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    catalog: Catalog,
    records: HashMap<String, Vec<Row>>,
}

impl MemoryBackend {
    /// Create a backend without records.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            records: HashMap::new(),
        }
    }

    /// Add a record of `entity`.
    ///
    /// Every column must be a field of the entity holding a value of the
    /// field's type; required fields must be present and non-null.
    pub fn insert(&mut self, entity: &str, record: Row) -> Result<()> {
        let def = self.catalog.entity(entity)?;
        for (name, value) in record.iter() {
            let field = def.get_field(name).ok_or_else(|| Error::UnknownAttribute {
                entity: entity.to_string(),
                attribute: name.to_string(),
            })?;
            let scalar = field.field_type.scalar_type();
            if value.is_null() {
                if !field.is_nullable() {
                    return Err(Error::Fixture(format!(
                        "{entity}.{name} is required but null"
                    )));
                }
            } else if !accepts(scalar, value) {
                return Err(Error::Fixture(format!(
                    "{entity}.{name} expects {scalar:?}, got {}",
                    value.type_name()
                )));
            }
        }
        if let Some(missing) = def
            .fields
            .iter()
            .find(|f| !f.is_nullable() && record.get(&f.name).is_none())
        {
            return Err(Error::Fixture(format!(
                "{entity}.{} is required but missing",
                missing.name
            )));
        }

        self.records
            .entry(def.name.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    /// Add several records of `entity`.
    pub fn with_records(
        mut self,
        entity: &str,
        records: impl IntoIterator<Item = Row>,
    ) -> Result<Self> {
        for record in records {
            self.insert(entity, record)?;
        }
        Ok(self)
    }

    /// Records of `entity`, in insertion order.
    pub fn records(&self, entity: &str) -> &[Row] {
        self.records.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    fn join_tuples<'r>(&'r self, query: &CriteriaQuery<'_>) -> Result<Vec<Tuple<'r>>> {
        let nodes = query.nodes();
        let width = nodes.len();
        let mut tuples: Vec<Tuple<'r>> = self
            .records(query.root_entity())
            .iter()
            .map(|record| {
                let mut tuple = vec![None; width];
                tuple[0] = Some(record);
                tuple
            })
            .collect();

        for (index, node) in nodes.iter().enumerate().skip(1) {
            let edge = node
                .edge
                .as_ref()
                .ok_or_else(|| Error::Execution(format!("node n{index} has no join edge")))?;
            let candidates = self.records(&node.entity);
            let mut joined = Vec::with_capacity(tuples.len());

            for tuple in tuples {
                let key = tuple[edge.parent.index()]
                    .and_then(|parent| parent.get(&edge.relation.from_field))
                    .filter(|key| !key.is_null());
                let mut matched = false;
                if let Some(key) = key {
                    for candidate in candidates {
                        let hit = candidate
                            .get(&edge.relation.to_field)
                            .is_some_and(|v| v.sql_eq(key));
                        if hit {
                            let mut extended = tuple.clone();
                            extended[index] = Some(candidate);
                            joined.push(extended);
                            matched = true;
                        }
                    }
                }
                if !matched && edge.kind == JoinKind::Left {
                    joined.push(tuple);
                }
            }
            tuples = joined;
        }
        Ok(tuples)
    }
}

impl QueryBackend for MemoryBackend {
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn execute(&self, query: &CriteriaQuery<'_>) -> Result<Vec<Row>> {
        let mut tuples = self.join_tuples(query)?;
        let joined = tuples.len();
        if let Some(predicate) = &query.predicate {
            let mut kept = Vec::with_capacity(tuples.len());
            for tuple in tuples {
                if test(predicate, &tuple)? == Some(true) {
                    kept.push(tuple);
                }
            }
            tuples = kept;
        }

        let grouped = query.is_aggregate() || !query.group_by.is_empty();
        let mut output = if grouped {
            project_groups(query, group(&query.group_by, tuples)?)?
        } else {
            tuples
                .iter()
                .map(|tuple| project(query, tuple))
                .collect::<Result<Vec<_>>>()?
        };

        if query.distinct {
            let mut unique: Vec<Output> = Vec::with_capacity(output.len());
            for candidate in output {
                if !unique.iter().any(|u| u.values == candidate.values) {
                    unique.push(candidate);
                }
            }
            output = unique;
        }

        if !query.orders.is_empty() {
            output.sort_by(|a, b| compare_keys(&a.keys, &b.keys, &query.orders));
        }

        let (skip, take) = match query.pagination {
            Some(p) if p.size > 0 => (p.first as usize, p.size as usize),
            Some(p) => (p.first as usize, usize::MAX),
            None => (0, usize::MAX),
        };

        let rows: Vec<Row> = output
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|out| {
                query
                    .selections
                    .iter()
                    .map(|s| s.alias.clone())
                    .zip(out.values)
                    .collect::<Row>()
            })
            .collect();
        debug!(
            entity = query.root_entity(),
            joined,
            returned = rows.len(),
            "executed query in memory"
        );
        Ok(rows)
    }
}

/// Selected values of one output row plus its sort keys.
struct Output {
    values: Vec<Value>,
    keys: Vec<Value>,
}

fn project(query: &CriteriaQuery<'_>, tuple: &[Option<&Row>]) -> Result<Output> {
    let values = query
        .selections
        .iter()
        .map(|s| eval(&s.expr, tuple))
        .collect::<Result<Vec<_>>>()?;
    let keys = query
        .orders
        .iter()
        .map(|o| eval(&o.expr, tuple))
        .collect::<Result<Vec<_>>>()?;
    Ok(Output { values, keys })
}

fn group<'r>(group_by: &[Expr], tuples: Vec<Tuple<'r>>) -> Result<Vec<Vec<Tuple<'r>>>> {
    if group_by.is_empty() {
        // a single group, even when no row matched
        return Ok(vec![tuples]);
    }
    let mut groups: Vec<(Vec<Value>, Vec<Tuple<'r>>)> = Vec::new();
    for tuple in tuples {
        let key = group_by
            .iter()
            .map(|expr| eval(expr, &tuple))
            .collect::<Result<Vec<_>>>()?;
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(tuple),
            None => groups.push((key, vec![tuple])),
        }
    }
    Ok(groups.into_iter().map(|(_, members)| members).collect())
}

fn project_groups(query: &CriteriaQuery<'_>, groups: Vec<Vec<Tuple<'_>>>) -> Result<Vec<Output>> {
    groups
        .iter()
        .map(|members| {
            let values = query
                .selections
                .iter()
                .map(|s| eval_group(&s.expr, members))
                .collect::<Result<Vec<_>>>()?;
            let keys = query
                .orders
                .iter()
                .map(|o| eval_group(&o.expr, members))
                .collect::<Result<Vec<_>>>()?;
            Ok(Output { values, keys })
        })
        .collect()
}

fn eval(expr: &Expr, tuple: &[Option<&Row>]) -> Result<Value> {
    match expr {
        Expr::Attribute { node, name } => Ok(tuple
            .get(node.index())
            .copied()
            .flatten()
            .and_then(|record| record.get(name))
            .cloned()
            .unwrap_or(Value::Null)),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Abs(inner) => abs(eval(inner, tuple)?),
        Expr::Aggregate { .. } => Err(Error::Execution(format!(
            "aggregate {expr} used outside of a group"
        ))),
    }
}

fn eval_group(expr: &Expr, members: &[Tuple<'_>]) -> Result<Value> {
    match expr {
        Expr::Aggregate { function, arg } => {
            let values = members
                .iter()
                .map(|tuple| eval(arg, tuple))
                .collect::<Result<Vec<_>>>()?;
            aggregate(*function, values)
        }
        Expr::Abs(inner) => abs(eval_group(inner, members)?),
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Attribute { .. } => match members.first() {
            Some(tuple) => eval(expr, tuple),
            None => Ok(Value::Null),
        },
    }
}

fn aggregate(function: AggregateFunction, values: Vec<Value>) -> Result<Value> {
    let values: Vec<Value> = values.into_iter().filter(|v| !v.is_null()).collect();
    match function {
        AggregateFunction::Count => Ok(Value::Int64(values.len() as i64)),
        AggregateFunction::Sum => sum(&values),
        AggregateFunction::Avg => {
            if values.is_empty() {
                return Ok(Value::Null);
            }
            let mut total = 0.0;
            for value in &values {
                total += value.as_f64().ok_or_else(|| not_numeric("AVG", value))?;
            }
            Ok(Value::Float64(total / values.len() as f64))
        }
        AggregateFunction::Min => extreme(values, Ordering::Less),
        AggregateFunction::Max => extreme(values, Ordering::Greater),
    }
}

fn sum(values: &[Value]) -> Result<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }
    let integral = values
        .iter()
        .all(|v| matches!(v, Value::Int32(_) | Value::Int64(_)));
    if integral {
        let mut total: i64 = 0;
        for value in values {
            let n = value.as_i64().ok_or_else(|| not_numeric("SUM", value))?;
            total = total
                .checked_add(n)
                .ok_or_else(|| Error::Execution("SUM overflowed i64".into()))?;
        }
        return Ok(Value::Int64(total));
    }
    let mut total = 0.0;
    for value in values {
        total += value.as_f64().ok_or_else(|| not_numeric("SUM", value))?;
    }
    Ok(Value::Float64(total))
}

fn extreme(values: Vec<Value>, wanted: Ordering) -> Result<Value> {
    let mut best: Option<Value> = None;
    for value in values {
        best = Some(match best {
            None => value,
            Some(current) => match value.compare(&current) {
                Some(ordering) if ordering == wanted => value,
                Some(_) => current,
                None => {
                    return Err(Error::Execution(format!(
                        "cannot compare {} with {}",
                        value.type_name(),
                        current.type_name()
                    )))
                }
            },
        });
    }
    Ok(best.unwrap_or(Value::Null))
}

fn abs(value: Value) -> Result<Value> {
    let overflow = || Error::Execution("ABS overflowed".into());
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int32(n) => n.checked_abs().map(Value::Int32).ok_or_else(overflow),
        Value::Int64(n) => n.checked_abs().map(Value::Int64).ok_or_else(overflow),
        Value::Float32(n) => Ok(Value::Float32(n.abs())),
        Value::Float64(n) => Ok(Value::Float64(n.abs())),
        other => Err(not_numeric("ABS", &other)),
    }
}

fn not_numeric(function: &str, value: &Value) -> Error {
    Error::Execution(format!(
        "{function} requires numeric values, got {}",
        value.type_name()
    ))
}

/// Evaluate a predicate; `None` is SQL UNKNOWN.
fn test(predicate: &Predicate, tuple: &[Option<&Row>]) -> Result<Option<bool>> {
    Ok(match predicate {
        Predicate::Compare { left, op, right } => {
            let left = eval(left, tuple)?;
            let right = eval(right, tuple)?;
            if left.is_null() || right.is_null() {
                None
            } else {
                Some(compare(&left, *op, &right))
            }
        }
        Predicate::Like { expr, pattern } => match eval(expr, tuple)? {
            Value::Null => None,
            Value::String(s) => Some(like_match(&s, pattern)),
            other => Some(like_match(&other.to_string(), pattern)),
        },
        Predicate::In { expr, values } => {
            let value = eval(expr, tuple)?;
            if value.is_null() {
                None
            } else if values.iter().any(|v| !v.is_null() && value.sql_eq(v)) {
                Some(true)
            } else if values.iter().any(Value::is_null) {
                None
            } else {
                Some(false)
            }
        }
        Predicate::Between { expr, low, high } => {
            let value = eval(expr, tuple)?;
            if value.is_null() {
                None
            } else {
                Some(compare(&value, Comparison::Ge, low) && compare(&value, Comparison::Le, high))
            }
        }
        Predicate::IsNull(expr) => Some(eval(expr, tuple)?.is_null()),
        Predicate::Not(inner) => test(inner, tuple)?.map(|b| !b),
        Predicate::And(items) => {
            let mut result = Some(true);
            for item in items {
                match test(item, tuple)? {
                    Some(false) => return Ok(Some(false)),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }
        Predicate::Or(items) => {
            let mut result = Some(false);
            for item in items {
                match test(item, tuple)? {
                    Some(true) => return Ok(Some(true)),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }
    })
}

fn compare(left: &Value, op: Comparison, right: &Value) -> bool {
    match op {
        Comparison::Eq => left.sql_eq(right),
        Comparison::Ne => !left.sql_eq(right),
        Comparison::Gt => left.compare(right).is_some_and(Ordering::is_gt),
        Comparison::Lt => left.compare(right).is_some_and(Ordering::is_lt),
        Comparison::Ge => left.compare(right).is_some_and(Ordering::is_ge),
        Comparison::Le => left.compare(right).is_some_and(Ordering::is_le),
    }
}

/// Nulls sort last in ascending order and first in descending order.
fn compare_keys(a: &[Value], b: &[Value], orders: &[Order]) -> Ordering {
    for (i, order) in orders.iter().enumerate() {
        let ordering = match (&a[i], &b[i]) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (x, y) => x.compare(y).unwrap_or(Ordering::Equal),
        };
        let ordering = match order.direction {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn accepts(scalar: ScalarType, value: &Value) -> bool {
    matches!(
        (scalar, value),
        (ScalarType::Bool, Value::Bool(_))
            | (ScalarType::Int32, Value::Int32(_))
            | (ScalarType::Int64, Value::Int32(_) | Value::Int64(_))
            | (ScalarType::Float32, Value::Float32(_))
            | (ScalarType::Float64, Value::Float32(_) | Value::Float64(_))
            | (ScalarType::String, Value::String(_))
            | (ScalarType::Bytes, Value::Bytes(_))
            | (ScalarType::Timestamp, Value::Timestamp(_))
            | (ScalarType::Uuid, Value::Uuid(_))
    )
}

/// Match `value` against a SQL LIKE pattern.
///
/// `%` matches any run of characters, `_` exactly one, and `\` makes the
/// next pattern character literal.
pub fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_from(&value, &pattern)
}

fn like_from(value: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some((&'%', rest)) => {
            let rest = &rest[rest.iter().take_while(|c| **c == '%').count()..];
            if rest.is_empty() {
                return true;
            }
            (0..=value.len()).any(|skip| like_from(&value[skip..], rest))
        }
        Some((&'_', rest)) => !value.is_empty() && like_from(&value[1..], rest),
        Some((&'\\', rest)) => match rest.split_first() {
            Some((literal, rest)) => value.first() == Some(literal) && like_from(&value[1..], rest),
            None => value.len() == 1 && value[0] == '\\',
        },
        Some((c, rest)) => value.first() == Some(c) && like_from(&value[1..], rest),
    }
}
