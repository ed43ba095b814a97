use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::app::ports::{
    CustomerRepository, OrderRepository, ProductRepository, ReportingRepository,
    RetentionRepository,
};
use crate::domain::{
    from_cents, from_millis, is_stale, to_cents, to_millis, Customer, CustomerFilter, CustomerId,
    NewCustomer, NewOrder, NewProduct, Order, OrderContact, OrderFilter, OrderId, Page, Product,
    ProductFilter, ProductId, LOW_STOCK_THRESHOLD,
};
use crate::error::{CrmError, Result};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS customers (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        email       TEXT NOT NULL UNIQUE,
        phone       TEXT,
        created_at  INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS products (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        name         TEXT NOT NULL,
        price_cents  INTEGER NOT NULL CHECK (price_cents > 0),
        stock        INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
        created_at   INTEGER NOT NULL,
        updated_at   INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS orders (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id         INTEGER NOT NULL REFERENCES customers(id) ON DELETE CASCADE,
        order_date          INTEGER NOT NULL,
        total_amount_cents  INTEGER NOT NULL DEFAULT 0,
        created_at          INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_orders_customer_date ON orders (customer_id, order_date);
    CREATE TABLE IF NOT EXISTS order_products (
        order_id    INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        product_id  INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        PRIMARY KEY (order_id, product_id)
    );
"#;

const CUSTOMER_COLUMNS: &str = "c.id, c.name, c.email, c.phone, c.created_at";
const PRODUCT_COLUMNS: &str = "p.id, p.name, p.price_cents, p.stock, p.created_at, p.updated_at";
const ORDER_COLUMNS: &str = "o.id, o.customer_id, o.order_date, o.total_amount_cents, o.created_at";

/// Millisecond timestamp column, rejecting values chrono cannot represent.
fn instant_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    from_millis(row.get(idx)?)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn customer_from_row(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        created_at: instant_at(row, 4)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        price: from_cents(row.get(2)?),
        stock: row.get(3)?,
        created_at: instant_at(row, 4)?,
        updated_at: instant_at(row, 5)?,
    })
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        order_date: instant_at(row, 2)?,
        total_amount: from_cents(row.get(3)?),
        created_at: instant_at(row, 4)?,
    })
}

/// Accumulates `AND`-joined predicates with their positional parameters.
#[derive(Default)]
struct WhereClause {
    predicates: Vec<&'static str>,
    values: Vec<Value>,
}

impl WhereClause {
    fn push(&mut self, predicate: &'static str, values: impl IntoIterator<Item = Value>) {
        self.predicates.push(predicate);
        self.values.extend(values);
    }

    fn text(&mut self, predicate: &'static str, value: &Option<String>) {
        if let Some(v) = value {
            self.push(predicate, [Value::Text(v.clone())]);
        }
    }

    fn integer(&mut self, predicate: &'static str, value: Option<i64>) {
        if let Some(v) = value {
            self.push(predicate, [Value::Integer(v)]);
        }
    }

    fn money(&mut self, predicate: &'static str, value: Option<Decimal>) -> Result<()> {
        if let Some(v) = value {
            self.push(predicate, [Value::Integer(to_cents(v)?)]);
        }
        Ok(())
    }

    fn instant(&mut self, predicate: &'static str, value: Option<DateTime<Utc>>) {
        self.integer(predicate, value.map(to_millis));
    }

    fn sql(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }
}

/// SQLite-backed store for customers, products and orders.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (creating if needed) the database file and bootstrap the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!(path = %path.display(), "Opened CRM database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CrmError::Storage("database connection lock poisoned".into()))
    }

    fn count(conn: &Connection, sql: &str, values: &[Value]) -> Result<u64> {
        let n: i64 = conn.query_row(sql, params_from_iter(values.iter()), |r| r.get(0))?;
        Ok(n as u64)
    }

    fn page_values(mut values: Vec<Value>, page: Page) -> Vec<Value> {
        values.push(Value::Integer(i64::try_from(page.limit).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(page.offset).unwrap_or(i64::MAX)));
        values
    }

    fn load_product(conn: &Connection, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1");
        Ok(conn
            .query_row(&sql, params![id], product_from_row)
            .optional()?)
    }
}

#[async_trait]
impl ReportingRepository for SqliteRepository {
    async fn count_customers(&self) -> Result<u64> {
        let conn = self.conn()?;
        Self::count(&conn, "SELECT COUNT(*) FROM customers", &[])
    }

    async fn count_orders(&self) -> Result<u64> {
        let conn = self.conn()?;
        Self::count(&conn, "SELECT COUNT(*) FROM orders", &[])
    }

    async fn sum_revenue(&self) -> Result<Decimal> {
        let conn = self.conn()?;
        let cents: i64 = conn.query_row(
            "SELECT COALESCE(SUM(total_amount_cents), 0) FROM orders",
            [],
            |r| r.get(0),
        )?;
        Ok(from_cents(cents))
    }
}

#[async_trait]
impl RetentionRepository for SqliteRepository {
    async fn find_stale_customers(&self, cutoff: DateTime<Utc>) -> Result<Vec<CustomerId>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, MAX(o.order_date)
             FROM customers c LEFT JOIN orders o ON o.customer_id = c.id
             GROUP BY c.id
             ORDER BY c.id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok((r.get::<_, CustomerId>(0)?, r.get::<_, Option<i64>>(1)?))
        })?;

        let mut stale = Vec::new();
        for row in rows {
            let (id, last_order) = row?;
            if is_stale(last_order.map(from_millis).transpose()?, cutoff) {
                stale.push(id);
            }
        }
        debug!(count = stale.len(), %cutoff, "Found stale customers");
        Ok(stale)
    }

    async fn delete_customers(&self, ids: &[CustomerId]) -> Result<u64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut deleted = 0u64;
        {
            let mut stmt = tx.prepare("DELETE FROM customers WHERE id = ?1")?;
            for id in ids {
                deleted += stmt.execute(params![id])? as u64;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }
}

#[async_trait]
impl CustomerRepository for SqliteRepository {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let customer = customer.validate()?;
        let conn = self.conn()?;

        let taken: Option<i64> = conn
            .query_row(
                "SELECT id FROM customers WHERE email = ?1",
                params![customer.email],
                |r| r.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(CrmError::Validation(format!(
                "email '{}' already exists",
                customer.email
            )));
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO customers (name, email, phone, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![customer.name, customer.email, customer.phone, to_millis(now)],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, email = %customer.email, "Created customer");

        Ok(Customer {
            id,
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            created_at: from_millis(to_millis(now))?,
        })
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers c WHERE c.id = ?1");
        Ok(conn
            .query_row(&sql, params![id], customer_from_row)
            .optional()?)
    }

    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: Page,
    ) -> Result<(Vec<Customer>, u64)> {
        let mut w = WhereClause::default();
        w.text("instr(lower(c.name), lower(?)) > 0", &filter.name_contains);
        w.text("instr(lower(c.email), lower(?)) > 0", &filter.email_contains);
        w.instant("c.created_at >= ?", filter.created_from);
        w.instant("c.created_at < ?", filter.created_before);
        w.text("instr(c.phone, ?) = 1", &filter.phone_prefix);

        let conn = self.conn()?;
        let total = Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM customers c{}", w.sql()),
            &w.values,
        )?;
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers c{} ORDER BY c.id LIMIT ? OFFSET ?",
            w.sql()
        );
        let values = Self::page_values(w.values, page);
        let mut stmt = conn.prepare(&sql)?;
        let customers = stmt
            .query_map(params_from_iter(values.iter()), customer_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((customers, total))
    }
}

#[async_trait]
impl ProductRepository for SqliteRepository {
    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let product = product.validate()?;
        let conn = self.conn()?;
        let now = to_millis(Utc::now());
        conn.execute(
            "INSERT INTO products (name, price_cents, stock, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![product.name, to_cents(product.price)?, product.stock, now],
        )?;
        let id = conn.last_insert_rowid();
        Self::load_product(&conn, id)?
            .ok_or_else(|| CrmError::Storage(format!("product {id} vanished after insert")))
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let conn = self.conn()?;
        Self::load_product(&conn, id)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        page: Page,
    ) -> Result<(Vec<Product>, u64)> {
        let mut w = WhereClause::default();
        w.text("instr(lower(p.name), lower(?)) > 0", &filter.name_contains);
        w.money("p.price_cents >= ?", filter.price_min)?;
        w.money("p.price_cents <= ?", filter.price_max)?;
        w.integer("p.stock >= ?", filter.stock_min);
        w.integer("p.stock <= ?", filter.stock_max);
        if filter.low_stock {
            w.integer("p.stock < ?", Some(LOW_STOCK_THRESHOLD));
        }

        let conn = self.conn()?;
        let total = Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM products p{}", w.sql()),
            &w.values,
        )?;
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p{} ORDER BY p.id LIMIT ? OFFSET ?",
            w.sql()
        );
        let values = Self::page_values(w.values, page);
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params_from_iter(values.iter()), product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((products, total))
    }

    async fn restock_below(&self, threshold: i64, amount: i64) -> Result<Vec<Product>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = to_millis(Utc::now());

        let ids = {
            let mut stmt = tx.prepare("SELECT id FROM products WHERE stock < ?1 ORDER BY id")?;
            let ids = stmt
                .query_map(params![threshold], |r| r.get::<_, ProductId>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };
        {
            let mut stmt = tx.prepare(
                "UPDATE products SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3",
            )?;
            for id in &ids {
                stmt.execute(params![amount, now, id])?;
            }
        }
        let mut updated = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = Self::load_product(&tx, id)? {
                updated.push(product);
            }
        }
        tx.commit()?;
        Ok(updated)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepository {
    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        let order = order.validate()?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let customer: Option<i64> = tx
            .query_row(
                "SELECT id FROM customers WHERE id = ?1",
                params![order.customer_id],
                |r| r.get(0),
            )
            .optional()?;
        if customer.is_none() {
            return Err(CrmError::NotFound(format!(
                "customer {}",
                order.customer_id
            )));
        }

        let mut total_cents = 0i64;
        for product_id in &order.product_ids {
            let price: Option<i64> = tx
                .query_row(
                    "SELECT price_cents FROM products WHERE id = ?1",
                    params![product_id],
                    |r| r.get(0),
                )
                .optional()?;
            let price =
                price.ok_or_else(|| CrmError::NotFound(format!("product {product_id}")))?;
            total_cents = total_cents
                .checked_add(price)
                .ok_or_else(|| CrmError::Validation("order total is out of range".into()))?;
        }

        let now = to_millis(Utc::now());
        let order_date = order.order_date.map(to_millis).unwrap_or(now);
        tx.execute(
            "INSERT INTO orders (customer_id, order_date, total_amount_cents, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![order.customer_id, order_date, total_cents, now],
        )?;
        let id = tx.last_insert_rowid();
        {
            let mut stmt =
                tx.prepare("INSERT INTO order_products (order_id, product_id) VALUES (?1, ?2)")?;
            for product_id in &order.product_ids {
                stmt.execute(params![id, product_id])?;
            }
        }
        tx.commit()?;
        debug!(id, customer_id = order.customer_id, total_cents, "Created order");

        Ok(Order {
            id,
            customer_id: order.customer_id,
            order_date: from_millis(order_date)?,
            total_amount: from_cents(total_cents),
            created_at: from_millis(now)?,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ?1");
        Ok(conn.query_row(&sql, params![id], order_from_row).optional()?)
    }

    async fn list_orders(&self, filter: &OrderFilter, page: Page) -> Result<(Vec<Order>, u64)> {
        let mut w = WhereClause::default();
        w.money("o.total_amount_cents >= ?", filter.total_min)?;
        w.money("o.total_amount_cents <= ?", filter.total_max)?;
        w.instant("o.order_date >= ?", filter.ordered_from);
        w.instant("o.order_date < ?", filter.ordered_before);
        w.text(
            "EXISTS (SELECT 1 FROM customers cu WHERE cu.id = o.customer_id
                     AND instr(lower(cu.name), lower(?)) > 0)",
            &filter.customer_name,
        );
        w.text(
            "EXISTS (SELECT 1 FROM order_products op JOIN products pr ON pr.id = op.product_id
                     WHERE op.order_id = o.id AND instr(lower(pr.name), lower(?)) > 0)",
            &filter.product_name,
        );
        w.integer(
            "EXISTS (SELECT 1 FROM order_products op
                     WHERE op.order_id = o.id AND op.product_id = ?)",
            filter.product_id,
        );

        let conn = self.conn()?;
        let total = Self::count(
            &conn,
            &format!("SELECT COUNT(*) FROM orders o{}", w.sql()),
            &w.values,
        )?;
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders o{} ORDER BY o.id LIMIT ? OFFSET ?",
            w.sql()
        );
        let values = Self::page_values(w.values, page);
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params_from_iter(values.iter()), order_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((orders, total))
    }

    async fn orders_for_customer(&self, id: CustomerId) -> Result<Vec<Order>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders o
             WHERE o.customer_id = ?1 ORDER BY o.order_date, o.id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(params![id], order_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(orders)
    }

    async fn products_for_order(&self, id: OrderId) -> Result<Vec<Product>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p
             JOIN order_products op ON op.product_id = p.id
             WHERE op.order_id = ?1 ORDER BY p.id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params![id], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }

    async fn order_contacts_since(&self, since: DateTime<Utc>) -> Result<Vec<OrderContact>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT o.id, c.email, o.order_date
             FROM orders o JOIN customers c ON c.id = o.customer_id
             WHERE o.order_date >= ?1
             ORDER BY o.order_date, o.id",
        )?;
        let contacts = stmt
            .query_map(params![to_millis(since)], |r| {
                Ok(OrderContact {
                    order_id: r.get(0)?,
                    customer_email: r.get(1)?,
                    order_date: instant_at(r, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
        }
    }

    fn product(name: &str, price: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Decimal::from_str(price).unwrap(),
            stock,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.create_customer(customer("Alice")).await.unwrap();
        let err = repo.create_customer(customer("Alice")).await.unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
    }

    #[tokio::test]
    async fn order_total_is_sum_of_product_prices() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = repo.create_customer(customer("Alice")).await.unwrap();
        let a = repo.create_product(product("Laptop", "999.99", 5)).await.unwrap();
        let b = repo.create_product(product("Mouse", "20.01", 5)).await.unwrap();

        let order = repo
            .create_order(NewOrder {
                customer_id: c.id,
                product_ids: vec![a.id, b.id],
                order_date: None,
            })
            .await
            .unwrap();
        assert_eq!(order.total_amount, Decimal::from_str("1020.00").unwrap());
        assert_eq!(repo.products_for_order(order.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn order_for_unknown_product_is_not_found() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = repo.create_customer(customer("Alice")).await.unwrap();
        let err = repo
            .create_order(NewOrder {
                customer_id: c.id,
                product_ids: vec![42],
                order_date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::NotFound(_)));
        assert_eq!(repo.count_orders().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_customer_cascades_to_orders() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = repo.create_customer(customer("Alice")).await.unwrap();
        let p = repo.create_product(product("Pen", "1.50", 5)).await.unwrap();
        repo.create_order(NewOrder {
            customer_id: c.id,
            product_ids: vec![p.id],
            order_date: None,
        })
        .await
        .unwrap();

        assert_eq!(repo.delete_customers(&[c.id, 9999]).await.unwrap(), 1);
        assert_eq!(repo.count_orders().await.unwrap(), 0);
        assert_eq!(repo.sum_revenue().await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn customer_filters_and_paging() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        for name in ["Alice", "Alicia", "Bob"] {
            repo.create_customer(customer(name)).await.unwrap();
        }
        repo.create_customer(NewCustomer {
            name: "Carol".into(),
            email: "carol@example.com".into(),
            phone: Some("+15550001111".into()),
        })
        .await
        .unwrap();

        let filter = CustomerFilter {
            name_contains: Some("ALI".into()),
            ..Default::default()
        };
        let (page, total) = repo.list_customers(&filter, Page::new(1, 10)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Alicia");

        let filter = CustomerFilter {
            phone_prefix: Some("+1".into()),
            ..Default::default()
        };
        let (page, total) = repo.list_customers(&filter, Page::new(0, 10)).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].name, "Carol");
    }

    #[tokio::test]
    async fn order_filters_match_customer_and_product() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let alice = repo.create_customer(customer("Alice")).await.unwrap();
        let bob = repo.create_customer(customer("Bob")).await.unwrap();
        let laptop = repo.create_product(product("Laptop", "1000", 5)).await.unwrap();
        let pen = repo.create_product(product("Pen", "2", 5)).await.unwrap();
        let old = Utc::now() - Duration::days(30);

        repo.create_order(NewOrder {
            customer_id: alice.id,
            product_ids: vec![laptop.id, pen.id],
            order_date: Some(old),
        })
        .await
        .unwrap();
        repo.create_order(NewOrder {
            customer_id: bob.id,
            product_ids: vec![pen.id],
            order_date: None,
        })
        .await
        .unwrap();

        let by_product = OrderFilter {
            product_name: Some("pen".into()),
            ..Default::default()
        };
        assert_eq!(repo.list_orders(&by_product, Page::new(0, 10)).await.unwrap().1, 2);

        let by_customer = OrderFilter {
            customer_name: Some("bob".into()),
            ..Default::default()
        };
        assert_eq!(repo.list_orders(&by_customer, Page::new(0, 10)).await.unwrap().1, 1);

        let expensive = OrderFilter {
            total_min: Some(Decimal::from(500)),
            ..Default::default()
        };
        let (orders, _) = repo.list_orders(&expensive, Page::new(0, 10)).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].customer_id, alice.id);

        let recent = repo
            .order_contacts_since(Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].customer_email, "bob@example.com");
    }

    #[tokio::test]
    async fn restock_only_touches_low_stock() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.create_product(product("Low", "1", 3)).await.unwrap();
        repo.create_product(product("Edge", "1", 10)).await.unwrap();

        let updated = repo.restock_below(10, 50).await.unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].name, "Low");
        assert_eq!(updated[0].stock, 53);

        let low = ProductFilter {
            low_stock: true,
            ..Default::default()
        };
        assert_eq!(repo.list_products(&low, Page::new(0, 10)).await.unwrap().1, 0);
    }

    #[tokio::test]
    async fn oversized_price_is_rejected_before_storage() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let err = repo
            .create_product(product("Yacht", "92233720368547758.07", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        let (_, total) = repo
            .list_products(&ProductFilter::default(), Page::new(0, 10))
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn order_total_overflow_is_a_validation_error() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = repo.create_customer(customer("Alice")).await.unwrap();
        let a = repo.create_product(product("Gold", "100", 1)).await.unwrap();
        let b = repo.create_product(product("Silver", "1", 1)).await.unwrap();
        // Rows written by an older build may carry prices past the current bound
        repo.conn()
            .unwrap()
            .execute(
                "UPDATE products SET price_cents = ?1 WHERE id = ?2",
                params![i64::MAX, a.id],
            )
            .unwrap();

        let err = repo
            .create_order(NewOrder {
                customer_id: c.id,
                product_ids: vec![a.id, b.id],
                order_date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
        assert_eq!(repo.count_orders().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn corrupt_order_date_fails_instead_of_marking_stale() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let c = repo.create_customer(customer("Alice")).await.unwrap();
        let p = repo.create_product(product("Pen", "1", 5)).await.unwrap();
        let order = repo
            .create_order(NewOrder {
                customer_id: c.id,
                product_ids: vec![p.id],
                order_date: None,
            })
            .await
            .unwrap();
        repo.conn()
            .unwrap()
            .execute(
                "UPDATE orders SET order_date = ?1 WHERE id = ?2",
                params![i64::MAX, order.id],
            )
            .unwrap();

        let err = repo.find_stale_customers(Utc::now()).await.unwrap_err();
        assert!(matches!(err, CrmError::Storage(_)));
        assert!(repo.get_order(order.id).await.is_err());
        assert!(repo.get_customer(c.id).await.unwrap().is_some());
    }
}
