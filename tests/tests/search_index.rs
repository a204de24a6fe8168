use common::*;

use kvql_core::access::AccessDescriptor;
use kvql_core::config::QueryConfig;
use kvql_core::row::{PrimaryKey, Row};
use kvql_core::store::ReturnShape;

#[test]
fn test_ordered_window() -> anyhow::Result<()> {
    let session = albums(QueryConfig::default())?;

    assert_eq!(
        names(&session.fetch("SELECT * FROM albums WHERE year >= 2000 ORDER BY year LIMIT 5")?),
        vec!["Album 00", "Album 01", "Album 02", "Album 03", "Album 04"]
    );
    assert_eq!(names(&session.fetch("SELECT * FROM albums WHERE year >= 2000 ORDER BY year DESC LIMIT 3")?), vec!["Album 19", "Album 18", "Album 17"]);
    assert_eq!(
        names(&session.fetch("SELECT * FROM albums WHERE year >= 2005 AND year <= 2010 ORDER BY name")?),
        vec!["Album 05", "Album 06", "Album 07", "Album 08", "Album 09", "Album 10"]
    );
    assert_eq!(names(&session.fetch("SELECT * FROM albums WHERE year BETWEEN 2003 AND 2004 ORDER BY name DESC")?), vec!["Album 04", "Album 03"]);
    Ok(())
}

#[test]
fn test_pages_through_continuation_tokens() -> anyhow::Result<()> {
    let session = albums(QueryConfig::new().with_max_rows_per_request(2))?;

    // offset 1, count 7: four remote pages of at most two rows
    let rows = session.fetch("SELECT name FROM albums WHERE year >= 2000 ORDER BY name LIMIT 1, 7")?;
    assert_eq!(names(&rows), vec!["Album 01", "Album 02", "Album 03", "Album 04", "Album 05", "Album 06", "Album 07"]);
    assert!(rows.iter().all(|row| row.attributes.keys().collect::<Vec<_>>() == vec!["name"]));

    let rows = session.fetch("SELECT * FROM albums WHERE year >= 2015 ORDER BY year DESC LIMIT 10 OFFSET 2")?;
    assert_eq!(names(&rows), vec!["Album 17", "Album 16", "Album 15"]);
    Ok(())
}

#[test]
fn test_predicate_shapes() -> anyhow::Result<()> {
    let session = albums(QueryConfig::default())?;
    session.store.put_row("albums", &Row::new(PrimaryKey::default().with("id", 99)).with("name", "Untitled"))?;

    assert_eq!(names(&session.fetch("SELECT * FROM albums WHERE name LIKE 'Album 1%' ORDER BY name")?).len(), 10);
    assert_eq!(names(&session.fetch("SELECT * FROM albums WHERE year IN (2001, 2019) ORDER BY name")?), vec!["Album 01", "Album 19"]);
    assert_eq!(
        names(&session.fetch("SELECT * FROM albums WHERE name LIKE 'Album%' AND (year = 2001 OR NOT year >= 2002) ORDER BY name")?),
        vec!["Album 00", "Album 01"]
    );
    assert_eq!(names(&session.fetch("SELECT * FROM albums WHERE year IS NULL")?), vec!["Untitled"]);
    assert_eq!(session.fetch("SELECT * FROM albums WHERE year IS NOT NULL")?.len(), 20);
    assert_eq!(names(&session.fetch("SELECT * FROM albums WHERE 2018 < year ORDER BY year")?), vec!["Album 19"]);
    assert_eq!(session.fetch("SELECT * FROM albums WHERE year != 2005 AND name NOT LIKE 'Album 1%'")?.len(), 10);
    Ok(())
}

#[test]
fn test_default_select_limit() -> anyhow::Result<()> {
    let session = albums(QueryConfig::new().with_max_select_rows(4).with_max_rows_per_request(3))?;
    assert_eq!(session.fetch("SELECT * FROM albums")?.len(), 4);
    assert_eq!(session.fetch("SELECT * FROM albums LIMIT 6")?.len(), 6);
    assert_eq!(session.fetch("SELECT * FROM albums LIMIT 0")?.len(), 0);
    Ok(())
}

#[test]
fn test_plan_shape() -> anyhow::Result<()> {
    let session = albums(QueryConfig::default())?;

    let plan = session.plan("SELECT name, COUNT(*) AS n FROM albums WHERE year > 2010 GROUP BY name ORDER BY n")?;
    assert_eq!(plan.access, AccessDescriptor::SearchIndex { index_name: "by_year".into() });
    assert_eq!(plan.return_shape, ReturnShape::AllColumns);
    assert!(plan.sort.is_empty());

    let plan = session.plan("SELECT name FROM albums WHERE year > 2010")?;
    assert_eq!(plan.return_shape, ReturnShape::Columns(vec!["name".into()]));
    assert_eq!((plan.offset, plan.limit), (0, 100));
    Ok(())
}
