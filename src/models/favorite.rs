//! Metric favorites
//!
//! A flat set of pinned metrics for quick-access listings.

use rusqlite::Connection;

use crate::db::DbResult;
use crate::models::metric::Metric;

pub struct MetricFavorite;

impl MetricFavorite {
    /// Pin a metric. Returns false if it was already pinned.
    pub fn add(conn: &Connection, metric_id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "INSERT OR IGNORE INTO metric_favorites (metric_id) VALUES (?1)",
            [metric_id],
        )?;
        Ok(rows > 0)
    }

    /// Unpin a metric. Returns false if it wasn't pinned.
    pub fn remove(conn: &Connection, metric_id: i64) -> DbResult<bool> {
        let rows = conn.execute(
            "DELETE FROM metric_favorites WHERE metric_id = ?1",
            [metric_id],
        )?;
        Ok(rows > 0)
    }

    /// Whether a metric is pinned
    pub fn contains(conn: &Connection, metric_id: i64) -> DbResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM metric_favorites WHERE metric_id = ?1",
            [metric_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List pinned metrics in pin order
    pub fn list(conn: &Connection) -> DbResult<Vec<Metric>> {
        let mut ids_stmt = conn
            .prepare("SELECT metric_id FROM metric_favorites ORDER BY created_at, id")?;
        let ids = ids_stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut metrics = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(metric) = Metric::get_by_id(conn, id)? {
                metrics.push(metric);
            }
        }
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_add_remove_favorite() {
        let conn = test_conn();
        let weight = Metric::get_by_symbol(&conn, "WEIGHT").unwrap().unwrap();

        assert!(MetricFavorite::add(&conn, weight.id).unwrap());
        assert!(!MetricFavorite::add(&conn, weight.id).unwrap());
        assert!(MetricFavorite::contains(&conn, weight.id).unwrap());

        let favorites = MetricFavorite::list(&conn).unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, weight.id);

        assert!(MetricFavorite::remove(&conn, weight.id).unwrap());
        assert!(!MetricFavorite::remove(&conn, weight.id).unwrap());
        assert!(!MetricFavorite::contains(&conn, weight.id).unwrap());
    }
}
