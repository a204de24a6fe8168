use common::*;

use kvql_core::access::{AccessDescriptor, ConstraintKind, KeyConstraint};
use kvql_core::config::QueryConfig;
use kvql_core::error::{ExecutionError, PlanError};
use kvql_core::value::Value;

#[test]
fn test_point_lookups() -> anyhow::Result<()> {
    let session = events(QueryConfig::default())?;

    let plan = session.plan("SELECT * FROM events WHERE region = 'us' AND id = 3")?;
    assert!(matches!(plan.access, AccessDescriptor::PrimaryKeyGet { .. }));
    assert_eq!(keys(&session.fetch("SELECT * FROM events WHERE region = 'us' AND id = 3")?), vec![key("us", 3)]);
    assert!(session.fetch("SELECT * FROM events WHERE region = 'us' AND id = 7")?.is_empty());

    let rows = session.fetch("SELECT * FROM events WHERE region IN ('eu', 'us', 'sa') AND id IN (1, 4)")?;
    assert_eq!(keys(&rows), vec![key("eu", 1), key("eu", 4), key("us", 1), key("us", 4)]);

    // offset and count apply after the batch comes back
    let rows = session.fetch("SELECT * FROM events WHERE region IN ('eu', 'us') AND id = 2 LIMIT 1, 5")?;
    assert_eq!(keys(&rows), vec![key("us", 2)]);
    Ok(())
}

#[test]
fn test_in_list_duplicates_collapse() -> anyhow::Result<()> {
    let session = events(QueryConfig::default())?;

    let plan = session.plan("SELECT * FROM events WHERE region = 'us' AND id IN (1, 1)")?;
    assert!(matches!(plan.access, AccessDescriptor::PrimaryKeyGet { .. }), "got {:?}", plan.access);
    assert_eq!(keys(&session.fetch("SELECT * FROM events WHERE region = 'us' AND id IN (1, 1)")?), vec![key("us", 1)]);

    let rows = session.fetch("SELECT * FROM events WHERE region IN ('us', 'us') AND id IN (1, 1.0, 2)")?;
    assert_eq!(keys(&rows), vec![key("us", 1), key("us", 2)]);
    Ok(())
}

#[test]
fn test_exact_range() -> anyhow::Result<()> {
    let session = events(QueryConfig::new().with_max_rows_per_request(2))?;

    let plan = session.plan("SELECT * FROM events WHERE region = 'eu' AND id >= 1 AND id < 4")?;
    let AccessDescriptor::PrimaryKeyRange { residual, .. } = &plan.access else { panic!("expected a range, got {:?}", plan.access) };
    assert!(residual.is_empty());

    let rows = session.fetch("SELECT * FROM events WHERE region = 'eu' AND id >= 1 AND id < 4")?;
    assert_eq!(keys(&rows), vec![key("eu", 1), key("eu", 2), key("eu", 3)]);

    let rows = session.fetch("SELECT * FROM events WHERE region >= 'b' AND region < 'v'")?;
    assert_eq!(rows.len(), 10);
    assert!(keys(&rows).iter().all(|(region, _)| region != "ap"));
    Ok(())
}

#[test]
fn test_residual_filter() -> anyhow::Result<()> {
    let session = events(QueryConfig::new().with_max_rows_per_request(4))?;

    let plan = session.plan("SELECT * FROM events WHERE id >= 2 AND id < 4")?;
    let AccessDescriptor::PrimaryKeyRange { residual, .. } = &plan.access else { panic!("expected a range, got {:?}", plan.access) };
    assert_eq!(
        residual,
        &vec![
            KeyConstraint::new("id", ConstraintKind::GtEq(Value::Integer(2))),
            KeyConstraint::new("id", ConstraintKind::Lt(Value::Integer(4)))
        ]
    );

    let rows = session.fetch("SELECT * FROM events WHERE id >= 2 AND id < 4")?;
    assert_eq!(keys(&rows), vec![key("ap", 2), key("ap", 3), key("eu", 2), key("eu", 3), key("us", 2), key("us", 3)]);

    // the limit counts rows that passed the filter
    let rows = session.fetch("SELECT * FROM events WHERE id = 4 LIMIT 2")?;
    assert_eq!(keys(&rows), vec![key("ap", 4), key("eu", 4)]);
    Ok(())
}

#[test]
fn test_full_scan_without_index() -> anyhow::Result<()> {
    let session = events(QueryConfig::new().with_max_rows_per_request(4).with_max_select_rows(100))?;
    assert_eq!(session.fetch("SELECT * FROM events")?.len(), 15);
    assert_eq!(keys(&session.fetch("SELECT region, id FROM events LIMIT 2")?), vec![key("ap", 0), key("ap", 1)]);

    let projected = session.fetch("SELECT id FROM events WHERE region = 'us' AND id = 0")?;
    assert!(projected[0].attributes.is_empty());
    Ok(())
}

#[test]
fn test_rejected_statements() -> anyhow::Result<()> {
    let session = events(QueryConfig::default())?;

    let err = session.fetch("SELECT * FROM events WHERE kind = 'click'").unwrap_err();
    assert!(
        matches!(err.downcast_ref::<PlanError>(), Some(PlanError::NoSatisfyingIndex { fields, .. }) if fields == &vec!["kind".to_string()]),
        "{err}"
    );

    for sql in [
        "SELECT * FROM events ORDER BY id",
        "SELECT * FROM events WHERE region = 'us' OR id = 1",
        "SELECT * FROM events WHERE region = 'us' AND id > 1",
        "SELECT * FROM events WHERE region IN ('eu', 'us') AND id >= 1",
        "SELECT COUNT(*) FROM events GROUP BY region",
        "SELECT * FROM events LIMIT 9000, 2000",
    ] {
        let err = session.plan(sql).unwrap_err();
        assert!(matches!(err.downcast_ref::<PlanError>(), Some(PlanError::UnsupportedOperation(_))), "{sql}: {err}");
    }

    let err = session.fetch("SELECT * FROM events WHERE region = 'us' AND id >= 1 LIMIT 1, 2").unwrap_err();
    assert!(matches!(err.downcast_ref::<ExecutionError>(), Some(ExecutionError::UnsupportedOperation(_))), "{err}");

    let err = session.plan("SELECT * FROM missing").unwrap_err();
    assert!(matches!(err.downcast_ref::<PlanError>(), Some(PlanError::SchemaUnavailable { .. })), "{err}");
    Ok(())
}
