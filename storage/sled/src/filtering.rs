use std::cmp::Ordering;

use kvql_core::query::{Sort, SortOrder, StructuredQuery};
use kvql_core::row::Row;
use kvql_core::value::Value;

/// Evaluate a structured query against one row. A field the row lacks matches nothing but `must_not`.
pub fn matches(query: &StructuredQuery, row: &Row) -> bool {
    match query {
        StructuredQuery::MatchAll => true,
        StructuredQuery::Term { field, value } => row.get(field).is_some_and(|v| v.compare(value) == Some(Ordering::Equal)),
        StructuredQuery::Terms { field, values } => {
            row.get(field).is_some_and(|v| values.iter().any(|value| v.compare(value) == Some(Ordering::Equal)))
        }
        StructuredQuery::Range { field, from, to, include_lower, include_upper } => {
            let Some(v) = row.get(field) else { return false };
            let above = match from {
                None => true,
                Some(from) => match v.compare(from) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => *include_lower,
                    _ => false,
                },
            };
            let below = match to {
                None => true,
                Some(to) => match v.compare(to) {
                    Some(Ordering::Less) => true,
                    Some(Ordering::Equal) => *include_upper,
                    _ => false,
                },
            };
            above && below
        }
        StructuredQuery::Wildcard { field, pattern } => row.get(field).and_then(Value::as_str).is_some_and(|s| wildcard_match(pattern, s)),
        StructuredQuery::Exists { field } => row.get(field).is_some(),
        StructuredQuery::Bool(bool_query) => {
            bool_query.must.iter().all(|q| matches(q, row))
                && (bool_query.should.is_empty() || bool_query.should.iter().any(|q| matches(q, row)))
                && !bool_query.must_not.iter().any(|q| matches(q, row))
        }
    }
}

/// `*` matches any run of characters, `?` exactly one
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    // position of the last `*` and the text index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, tried)) => {
                    p = star + 1;
                    t = tried + 1;
                    backtrack = Some((star, tried + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| *c == '*')
}

/// Order rows by `sort`; rows missing a sort field go last. Ties keep their existing order.
pub fn sort_rows(rows: &mut [Row], sort: &[Sort]) {
    if sort.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for Sort { field, order } in sort {
            let ordering = match (a.get(field), b.get(field)) {
                (Some(x), Some(y)) => {
                    let ordering = x.compare(y).unwrap_or(Ordering::Equal);
                    match order {
                        SortOrder::Asc => ordering,
                        SortOrder::Desc => ordering.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
