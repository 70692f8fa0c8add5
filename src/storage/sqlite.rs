//! SQLite repository implementation

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::scraper::ProductRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Repository, RepositoryResult};
use crate::storage::{parse_price_value, RunRecord, RunStatus, StoredProduct};

/// SQLite-backed repository
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Opens or creates a database at the given path
    pub fn new(path: &Path) -> RepositoryResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for tests)
    pub fn new_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Repository for SqliteRepository {
    // ===== Run tracking =====

    fn create_run(&mut self, config_hash: &str) -> RepositoryResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(&mut self, run_id: i64, status: RunStatus) -> RepositoryResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    fn latest_run(&self) -> RepositoryResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status
             FROM runs ORDER BY id DESC LIMIT 1",
        )?;
        let run = stmt
            .query_row([], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                })
            })
            .optional()?;
        Ok(run)
    }

    // ===== Upserts =====

    fn upsert_category(&mut self, run_id: i64, name: &str, url: &str) -> RepositoryResult<i64> {
        let now = Utc::now().to_rfc3339();
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            self.conn.execute(
                "UPDATE categories SET name = ?1, run_id = ?2, scraped_at = ?3 WHERE id = ?4",
                params![name, run_id, now, id],
            )?;
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO categories (run_id, name, url, scraped_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, name, url, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn upsert_subcategory(
        &mut self,
        category_id: i64,
        name: &str,
        url: &str,
    ) -> RepositoryResult<i64> {
        let now = Utc::now().to_rfc3339();
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM subcategories WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            self.conn.execute(
                "UPDATE subcategories SET name = ?1, category_id = ?2, scraped_at = ?3
                 WHERE id = ?4",
                params![name, category_id, now, id],
            )?;
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO subcategories (category_id, name, url, scraped_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![category_id, name, url, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn upsert_products(
        &mut self,
        subcategory_id: i64,
        products: &[ProductRecord],
    ) -> RepositoryResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut written = 0;

        for product in products {
            let price_value = product.price.as_deref().and_then(parse_price_value);
            tx.execute(
                "INSERT INTO products (subcategory_id, name, price_text, price_value, brand,
                    link, image, description, price_per_kilo, discount, category_name, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT (subcategory_id, name) DO UPDATE SET
                    price_text = excluded.price_text,
                    price_value = excluded.price_value,
                    brand = excluded.brand,
                    link = excluded.link,
                    image = excluded.image,
                    description = excluded.description,
                    price_per_kilo = excluded.price_per_kilo,
                    discount = excluded.discount,
                    category_name = excluded.category_name,
                    scraped_at = excluded.scraped_at",
                params![
                    subcategory_id,
                    product.name,
                    product.price,
                    price_value,
                    product.brand,
                    product.link,
                    product.image,
                    product.description,
                    product.price_per_kilo,
                    product.discount,
                    product.category,
                    now,
                ],
            )?;
            written += 1;
        }

        tx.commit()?;
        Ok(written)
    }

    // ===== Queries =====

    fn products_for_subcategory(
        &self,
        subcategory_id: i64,
    ) -> RepositoryResult<Vec<StoredProduct>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subcategory_id, name, price_text, price_value, brand, link, image,
                    description, price_per_kilo, discount, category_name
             FROM products WHERE subcategory_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![subcategory_id], |row| {
            Ok(StoredProduct {
                id: row.get(0)?,
                subcategory_id: row.get(1)?,
                name: row.get(2)?,
                price_text: row.get(3)?,
                price_value: row.get(4)?,
                brand: row.get(5)?,
                link: row.get(6)?,
                image: row.get(7)?,
                description: row.get(8)?,
                price_per_kilo: row.get(9)?,
                discount: row.get(10)?,
                category_name: row.get(11)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn category_totals(&self) -> RepositoryResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category_name, COUNT(*) FROM products
             GROUP BY category_name ORDER BY category_name",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn count_categories(&self) -> RepositoryResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_subcategories(&self) -> RepositoryResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM subcategories", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_products(&self) -> RepositoryResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: Option<&str>) -> ProductRecord {
        ProductRecord {
            name: name.to_string(),
            price: price.map(str::to_string),
            brand: Some("Orchard Co".to_string()),
            link: None,
            image: None,
            description: "1 kg".to_string(),
            price_per_kilo: None,
            discount: None,
            category: "Fruit".to_string(),
        }
    }

    fn seeded_repo() -> (SqliteRepository, i64, i64) {
        let mut repo = SqliteRepository::new_in_memory().unwrap();
        let run_id = repo.create_run("hash").unwrap();
        let category_id = repo
            .upsert_category(run_id, "Fruit", "https://shop.example.com/fruit")
            .unwrap();
        let subcategory_id = repo
            .upsert_subcategory(category_id, "Citrus", "https://shop.example.com/fruit/citrus")
            .unwrap();
        (repo, category_id, subcategory_id)
    }

    #[test]
    fn test_run_lifecycle() {
        let mut repo = SqliteRepository::new_in_memory().unwrap();
        let run_id = repo.create_run("abc123").unwrap();

        let run = repo.latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());

        repo.complete_run(run_id, RunStatus::Completed).unwrap();
        let run = repo.latest_run().unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_category_upsert_is_idempotent_by_url() {
        let mut repo = SqliteRepository::new_in_memory().unwrap();
        let run_id = repo.create_run("hash").unwrap();

        let first = repo
            .upsert_category(run_id, "Fruit", "https://shop.example.com/fruit")
            .unwrap();
        let second = repo
            .upsert_category(run_id, "Fresh Fruit", "https://shop.example.com/fruit")
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.count_categories().unwrap(), 1);
    }

    #[test]
    fn test_product_upsert_updates_in_place() {
        let (mut repo, _, subcategory_id) = seeded_repo();

        repo.upsert_products(subcategory_id, &[product("Lemon", Some("1,99 €"))])
            .unwrap();
        repo.upsert_products(subcategory_id, &[product("Lemon", Some("2,49 €"))])
            .unwrap();

        assert_eq!(repo.count_products().unwrap(), 1);
        let stored = repo.products_for_subcategory(subcategory_id).unwrap();
        assert_eq!(stored[0].price_text.as_deref(), Some("2,49 €"));
        assert_eq!(stored[0].price_value, Some(2.49));
    }

    #[test]
    fn test_same_product_name_allowed_across_subcategories() {
        let (mut repo, category_id, citrus_id) = seeded_repo();
        let berries_id = repo
            .upsert_subcategory(
                category_id,
                "Berries",
                "https://shop.example.com/fruit/berries",
            )
            .unwrap();

        repo.upsert_products(citrus_id, &[product("Organic Mix", None)])
            .unwrap();
        repo.upsert_products(berries_id, &[product("Organic Mix", None)])
            .unwrap();

        assert_eq!(repo.count_products().unwrap(), 2);
    }

    #[test]
    fn test_category_totals() {
        let (mut repo, _, subcategory_id) = seeded_repo();
        repo.upsert_products(
            subcategory_id,
            &[product("Lemon", None), product("Lime", None)],
        )
        .unwrap();

        let totals = repo.category_totals().unwrap();
        assert_eq!(totals, vec![("Fruit".to_string(), 2)]);
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let (mut repo, _, subcategory_id) = seeded_repo();
        let written = repo.upsert_products(subcategory_id, &[]).unwrap();
        assert_eq!(written, 0);
        assert_eq!(repo.count_products().unwrap(), 0);
    }
}
