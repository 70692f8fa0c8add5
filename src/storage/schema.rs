//! Database schema definition

use rusqlite::Connection;

/// Creates all tables and indexes if they do not exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            config_hash TEXT NOT NULL,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id INTEGER NOT NULL REFERENCES runs(id),
            name TEXT NOT NULL,
            url TEXT NOT NULL UNIQUE,
            scraped_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subcategories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category_id INTEGER NOT NULL REFERENCES categories(id),
            name TEXT NOT NULL,
            url TEXT NOT NULL UNIQUE,
            scraped_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subcategory_id INTEGER NOT NULL REFERENCES subcategories(id),
            name TEXT NOT NULL,
            price_text TEXT,
            price_value REAL,
            brand TEXT,
            link TEXT,
            image TEXT,
            description TEXT NOT NULL DEFAULT '',
            price_per_kilo TEXT,
            discount TEXT,
            category_name TEXT NOT NULL,
            scraped_at TEXT NOT NULL,
            UNIQUE (subcategory_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_subcategories_category
            ON subcategories(category_id);
        CREATE INDEX IF NOT EXISTS idx_products_subcategory
            ON products(subcategory_id);
        CREATE INDEX IF NOT EXISTS idx_products_category_name
            ON products(category_name);
        ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initializes_and_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('runs', 'categories', 'subcategories', 'products')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 4);
    }
}
