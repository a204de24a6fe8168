use common::*;

use kvql_core::config::QueryConfig;
use kvql_core::store::ReturnShape;

#[test]
fn test_delete_through_search_index() -> anyhow::Result<()> {
    let session = albums(QueryConfig::new().with_max_rows_per_request(3))?;

    let plan = session.plan("DELETE FROM albums WHERE year < 2005")?;
    assert_eq!(plan.return_shape, ReturnShape::PrimaryKeyOnly);
    assert_eq!(plan.limit, 1000);

    assert_eq!(session.execute("DELETE FROM albums WHERE year < 2005")?, 5);
    assert_eq!(session.fetch("SELECT * FROM albums LIMIT 100")?.len(), 15);
    assert_eq!(names(&session.fetch("SELECT * FROM albums ORDER BY year LIMIT 1")?), vec!["Album 05"]);
    Ok(())
}

#[test]
fn test_delete_respects_limit() -> anyhow::Result<()> {
    let session = albums(QueryConfig::new().with_max_delete_rows(2))?;
    assert_eq!(session.execute("DELETE FROM albums WHERE year >= 2010")?, 2);
    assert_eq!(session.execute("DELETE FROM albums WHERE year >= 2010 LIMIT 3")?, 3);
    assert_eq!(session.fetch("SELECT * FROM albums WHERE year >= 2010")?.len(), 5);
    Ok(())
}

#[test]
fn test_update_by_primary_key() -> anyhow::Result<()> {
    let session = events(QueryConfig::default())?;

    assert_eq!(session.execute("UPDATE events SET kind = 'view' WHERE region = 'eu' AND id >= 0 AND id < 2")?, 2);
    assert_eq!(session.execute("UPDATE events SET kind = 'scroll', weight = 3 WHERE region IN ('us', 'ap') AND id = 4")?, 2);

    let kinds = |sql: &str| -> anyhow::Result<Vec<String>> {
        Ok(session.fetch(sql)?.iter().filter_map(|row| row.get("kind")?.as_str().map(str::to_string)).collect())
    };
    assert_eq!(kinds("SELECT kind FROM events WHERE region = 'eu' AND id >= 0 AND id < 3")?, vec!["view", "view", "click"]);
    assert_eq!(kinds("SELECT * FROM events WHERE region = 'us' AND id = 4")?, vec!["scroll"]);

    let row = session.fetch("SELECT * FROM events WHERE region = 'ap' AND id = 4")?.remove(0);
    assert_eq!(row.get("weight"), Some(&kvql_core::value::Value::Integer(3)));
    Ok(())
}
