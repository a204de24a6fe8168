use kvql_core::row::{PrimaryKey, Row};
use kvql_storage_sled::SledStore;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // an unset or unparseable LOG_LEVEL falls back to INFO
    let level = std::env::var("LOG_LEVEL").ok().and_then(|level| level.parse().ok()).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).with_test_writer().init();
}

pub fn album(id: i64, name: &str, year: i64) -> Row { Row::new(PrimaryKey::default().with("id", id)).with("name", name).with("year", year) }

/// An `albums` table keyed by `id`, with a `by_year` index over name and year, holding Album 00 through Album 19
pub fn setup_albums() -> anyhow::Result<SledStore> {
    let store = SledStore::new_test()?;
    store.create_table("albums", &["id"])?;
    store.create_search_index("albums", "by_year", &["name", "year"])?;
    for id in 0..20 {
        store.put_row("albums", &album(id, &format!("Album {id:02}"), 2000 + id))?;
    }
    Ok(store)
}

/// An `events` table keyed by `(region, id)`
#[allow(unused)]
pub fn setup_events() -> anyhow::Result<SledStore> {
    let store = SledStore::new_test()?;
    store.create_table("events", &["region", "id"])?;
    for region in ["eu", "us"] {
        for id in 0..5 {
            store.put_row("events", &Row::new(PrimaryKey::default().with("region", region).with("id", id)).with("kind", "click"))?;
        }
    }
    Ok(store)
}

#[allow(unused)]
pub fn names(rows: &[Row]) -> Vec<String> { rows.iter().filter_map(|row| row.get("name").and_then(|v| v.as_str()).map(str::to_string)).collect() }

#[allow(unused)]
pub fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| match row.get("id") {
            Some(kvql_core::value::Value::Integer(id)) => Some(*id),
            _ => None,
        })
        .collect()
}
