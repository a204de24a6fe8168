use common::*;

use kvql_core::config::QueryConfig;

#[test]
fn test_config_from_json() -> anyhow::Result<()> {
    let config: QueryConfig = serde_json::from_str(r#"{ "max_rows_per_request": 3, "max_select_rows": 7, "max_total_rows": 50 }"#)?;
    assert_eq!(config.max_delete_rows, 1000);

    let session = albums(config)?;
    assert_eq!(session.fetch("SELECT * FROM albums")?.len(), 7);
    assert_eq!(session.fetch("SELECT * FROM albums LIMIT 40, 10")?.len(), 0);
    assert!(session.plan("SELECT * FROM albums LIMIT 41, 10").is_err());
    Ok(())
}
