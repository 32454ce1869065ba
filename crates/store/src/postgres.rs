use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{
    AddressId, CategoryId, CityId, CustomerId, OrderId, Page, PageRequest, ProductId, StateId,
};
use domain::{
    Address, Category, City, Customer, CustomerKind, Money, NewAddress, NewCategory, NewCustomer,
    NewProduct, Order, OrderItem, Payment, PaymentKind, PaymentMethod, PaymentState, Product,
    State,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{
        CategoryRepository, CustomerRepository, LocationRepository, OrderRepository,
        ProductRepository, Store, UnitOfWork,
    },
};

/// PostgreSQL-backed store. Each unit of work is one database transaction.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    type UnitOfWork = PostgresUnitOfWork;

    async fn begin(&self) -> Result<PostgresUnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnitOfWork { tx })
    }
}

/// Unit of work over an open PostgreSQL transaction. The transaction rolls
/// back when dropped uncommitted.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        tracing::debug!("transaction rolled back");
        Ok(())
    }
}

fn row_to_category(row: PgRow) -> Result<Category> {
    Ok(Category {
        id: CategoryId::new(row.try_get("id")?),
        name: row.try_get("name")?,
    })
}

fn row_to_address(row: &PgRow) -> Result<Address> {
    Ok(Address {
        id: AddressId::new(row.try_get("id")?),
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        street: row.try_get("street")?,
        number: row.try_get("number")?,
        complement: row.try_get("complement")?,
        district: row.try_get("district")?,
        postal_code: row.try_get("postal_code")?,
        city_id: CityId::new(row.try_get("city_id")?),
    })
}

fn row_to_payment(row: &PgRow) -> Result<Payment> {
    let state = PaymentState::from_code(row.try_get("state")?)?;
    let method = match PaymentKind::from_code(row.try_get("kind")?)? {
        PaymentKind::Card => PaymentMethod::Card {
            installments: row.try_get("installments")?,
        },
        PaymentKind::BankSlip => PaymentMethod::BankSlip {
            due_date: row.try_get("due_date")?,
            paid_date: row.try_get("paid_date")?,
        },
    };
    Ok(Payment::new(state, method))
}

fn row_to_item(row: &PgRow) -> Result<OrderItem> {
    let item = OrderItem::new(
        ProductId::new(row.try_get("product_id")?),
        row.try_get::<String, _>("product_name")?,
        row.try_get("quantity")?,
        Money::from_cents(row.try_get("unit_price_cents")?),
    );
    Ok(item.with_discount(Money::from_cents(row.try_get("discount_cents")?)))
}

/// Column values of a payment row: (installments, due date, paid date).
fn payment_columns(payment: &Payment) -> (Option<i32>, Option<NaiveDate>, Option<NaiveDate>) {
    match payment.method() {
        PaymentMethod::Card { installments } => (*installments, None, None),
        PaymentMethod::BankSlip {
            due_date,
            paid_date,
        } => (None, *due_date, *paid_date),
    }
}

impl PostgresUnitOfWork {
    async fn count(&mut self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let total: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *self.tx).await?;
        Ok(total as u64)
    }

    async fn load_products(&mut self, rows: Vec<PgRow>) -> Result<Vec<Product>> {
        let ids: Vec<i64> = rows
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<std::result::Result<_, sqlx::Error>>()?;

        let mut categories: HashMap<i64, Vec<CategoryId>> = HashMap::new();
        let links = sqlx::query(
            r#"
            SELECT product_id, category_id
            FROM product_category
            WHERE product_id = ANY($1)
            ORDER BY category_id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
        for link in links {
            categories
                .entry(link.try_get("product_id")?)
                .or_default()
                .push(CategoryId::new(link.try_get("category_id")?));
        }

        rows.into_iter()
            .map(|row| -> Result<Product> {
                let id: i64 = row.try_get("id")?;
                Ok(Product {
                    id: ProductId::new(id),
                    name: row.try_get("name")?,
                    price: Money::from_cents(row.try_get("price_cents")?),
                    category_ids: categories.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Attaches phones and addresses to customer rows, keeping row order.
    async fn load_customers(&mut self, rows: Vec<PgRow>) -> Result<Vec<Customer>> {
        let ids: Vec<i64> = rows
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<std::result::Result<_, sqlx::Error>>()?;

        let mut phones: HashMap<i64, Vec<String>> = HashMap::new();
        let phone_rows = sqlx::query(
            "SELECT customer_id, phone FROM customer_phone WHERE customer_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
        for row in phone_rows {
            phones
                .entry(row.try_get("customer_id")?)
                .or_default()
                .push(row.try_get("phone")?);
        }

        let mut addresses: HashMap<i64, Vec<Address>> = HashMap::new();
        let address_rows = sqlx::query(
            r#"
            SELECT id, customer_id, street, number, complement, district, postal_code, city_id
            FROM address
            WHERE customer_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
        for row in &address_rows {
            let address = row_to_address(row)?;
            addresses
                .entry(address.customer_id.as_i64())
                .or_default()
                .push(address);
        }

        rows.into_iter()
            .map(|row| -> Result<Customer> {
                let id: i64 = row.try_get("id")?;
                Ok(Customer {
                    id: CustomerId::new(id),
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    document: row.try_get("document")?,
                    kind: CustomerKind::from_code(row.try_get("kind")?)?,
                    phones: phones.remove(&id).unwrap_or_default().into_iter().collect(),
                    addresses: addresses.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Rebuilds order aggregates from header rows, keeping row order.
    async fn load_orders(&mut self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let ids: Vec<i64> = rows
            .iter()
            .map(|row| row.try_get("id"))
            .collect::<std::result::Result<_, sqlx::Error>>()?;

        let mut payments: HashMap<i64, Payment> = HashMap::new();
        let payment_rows = sqlx::query(
            r#"
            SELECT order_id, state, kind, installments, due_date, paid_date
            FROM payment
            WHERE order_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
        for row in &payment_rows {
            payments.insert(row.try_get("order_id")?, row_to_payment(row)?);
        }

        let mut items: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        let item_rows = sqlx::query(
            r#"
            SELECT oi.order_id, oi.product_id, p.name AS product_name, oi.quantity,
                   oi.unit_price_cents, oi.discount_cents
            FROM order_item oi
            JOIN product p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
        for row in &item_rows {
            items
                .entry(row.try_get("order_id")?)
                .or_default()
                .push(row_to_item(row)?);
        }

        rows.into_iter()
            .map(|row| -> Result<Order> {
                let id: i64 = row.try_get("id")?;
                Ok(Order::restore(
                    OrderId::new(id),
                    row.try_get("placed_at")?,
                    CustomerId::new(row.try_get("customer_id")?),
                    AddressId::new(row.try_get("delivery_address_id")?),
                    payments.remove(&id),
                    items.remove(&id).unwrap_or_default(),
                ))
            })
            .collect()
    }

    async fn upsert_payment(&mut self, order_id: OrderId, payment: &Payment) -> Result<()> {
        let (installments, due_date, paid_date) = payment_columns(payment);
        sqlx::query(
            r#"
            INSERT INTO payment (order_id, state, kind, installments, due_date, paid_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (order_id) DO UPDATE
            SET state = EXCLUDED.state,
                kind = EXCLUDED.kind,
                installments = EXCLUDED.installments,
                due_date = EXCLUDED.due_date,
                paid_date = EXCLUDED.paid_date
            "#,
        )
        .bind(order_id.as_i64())
        .bind(payment.state().code())
        .bind(payment.kind().code())
        .bind(installments)
        .bind(due_date)
        .bind(paid_date)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn upsert_item(&mut self, order_id: OrderId, item: &OrderItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_item (order_id, product_id, quantity, unit_price_cents, discount_cents)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (order_id, product_id) DO UPDATE
            SET quantity = EXCLUDED.quantity,
                unit_price_cents = EXCLUDED.unit_price_cents,
                discount_cents = EXCLUDED.discount_cents
            "#,
        )
        .bind(order_id.as_i64())
        .bind(item.product_id.as_i64())
        .bind(item.quantity)
        .bind(item.unit_price.cents())
        .bind(item.discount.cents())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for PostgresUnitOfWork {
    async fn insert_category(&mut self, category: &NewCategory) -> Result<Category> {
        let row = sqlx::query("INSERT INTO category (name) VALUES ($1) RETURNING id, name")
            .bind(&category.name)
            .fetch_one(&mut *self.tx)
            .await?;
        row_to_category(row)
    }

    async fn find_category(&mut self, id: CategoryId) -> Result<Option<Category>> {
        sqlx::query("SELECT id, name FROM category WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(row_to_category)
            .transpose()
    }

    async fn list_categories(&mut self, page: PageRequest) -> Result<Page<Category>> {
        let total = self.count("category").await?;
        let direction = page.sort_direction().as_sql();
        let sql =
            format!("SELECT id, name FROM category ORDER BY id {direction} LIMIT $1 OFFSET $2");
        let rows = sqlx::query(&sql)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&mut *self.tx)
            .await?;

        let content = rows
            .into_iter()
            .map(row_to_category)
            .collect::<Result<_>>()?;
        Ok(Page::new(content, page, total))
    }

    async fn update_category(&mut self, category: &Category) -> Result<()> {
        let result = sqlx::query("UPDATE category SET name = $2 WHERE id = $1")
            .bind(category.id.as_i64())
            .bind(&category.name)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::row_not_found("Category", category.id));
        }
        Ok(())
    }

    async fn delete_category(&mut self, id: CategoryId) -> Result<()> {
        let referenced: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM product_category WHERE category_id = $1)",
        )
        .bind(id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;
        if referenced {
            return Err(StoreError::Conflict(format!(
                "category {id} is referenced by products"
            )));
        }

        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::row_not_found("Category", id));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for PostgresUnitOfWork {
    async fn insert_product(&mut self, product: &NewProduct) -> Result<Product> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO product (name, price_cents) VALUES ($1, $2) RETURNING id")
                .bind(&product.name)
                .bind(product.price.cents())
                .fetch_one(&mut *self.tx)
                .await?;

        for category_id in &product.category_ids {
            sqlx::query("INSERT INTO product_category (product_id, category_id) VALUES ($1, $2)")
                .bind(id)
                .bind(category_id.as_i64())
                .execute(&mut *self.tx)
                .await?;
        }

        Ok(Product {
            id: ProductId::new(id),
            name: product.name.clone(),
            price: product.price,
            category_ids: product.category_ids.clone(),
        })
    }

    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.find_products(&[id]).await?.into_iter().next())
    }

    async fn find_products(&mut self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        let rows = sqlx::query(
            "SELECT id, name, price_cents FROM product WHERE id = ANY($1) ORDER BY id ASC",
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
        self.load_products(rows).await
    }
}

#[async_trait]
impl LocationRepository for PostgresUnitOfWork {
    async fn insert_state(&mut self, name: &str) -> Result<State> {
        let id: i64 = sqlx::query_scalar("INSERT INTO state (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(State {
            id: StateId::new(id),
            name: name.to_string(),
        })
    }

    async fn insert_city(&mut self, name: &str, state_id: StateId) -> Result<City> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO city (name, state_id) VALUES ($1, $2) RETURNING id")
                .bind(name)
                .bind(state_id.as_i64())
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(City {
            id: CityId::new(id),
            name: name.to_string(),
            state_id,
        })
    }

    async fn find_city(&mut self, id: CityId) -> Result<Option<City>> {
        let row = sqlx::query("SELECT id, name, state_id FROM city WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|row| -> Result<City> {
            Ok(City {
                id: CityId::new(row.try_get("id")?),
                name: row.try_get("name")?,
                state_id: StateId::new(row.try_get("state_id")?),
            })
        })
        .transpose()
    }
}

#[async_trait]
impl CustomerRepository for PostgresUnitOfWork {
    async fn insert_customer(&mut self, customer: &NewCustomer) -> Result<Customer> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO customer (name, email, document, kind)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.document)
        .bind(customer.kind.code())
        .fetch_one(&mut *self.tx)
        .await?;
        let id = CustomerId::new(id);

        for phone in &customer.phones {
            sqlx::query("INSERT INTO customer_phone (customer_id, phone) VALUES ($1, $2)")
                .bind(id.as_i64())
                .bind(phone)
                .execute(&mut *self.tx)
                .await?;
        }

        let address = self.insert_address(id, &customer.address).await?;

        Ok(Customer {
            id,
            name: customer.name.clone(),
            email: customer.email.clone(),
            document: customer.document.clone(),
            kind: customer.kind,
            phones: customer.phones.clone(),
            addresses: vec![address],
        })
    }

    async fn insert_address(
        &mut self,
        customer_id: CustomerId,
        address: &NewAddress,
    ) -> Result<Address> {
        let row = sqlx::query(
            r#"
            INSERT INTO address (customer_id, street, number, complement, district, postal_code, city_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, customer_id, street, number, complement, district, postal_code, city_id
            "#,
        )
        .bind(customer_id.as_i64())
        .bind(&address.street)
        .bind(&address.number)
        .bind(&address.complement)
        .bind(&address.district)
        .bind(&address.postal_code)
        .bind(address.city_id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;
        row_to_address(&row)
    }

    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>> {
        let rows = sqlx::query("SELECT id, name, email, document, kind FROM customer WHERE id = $1")
            .bind(id.as_i64())
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(self.load_customers(rows).await?.into_iter().next())
    }

    async fn list_customers(&mut self, page: PageRequest) -> Result<Page<Customer>> {
        let total = self.count("customer").await?;
        let direction = page.sort_direction().as_sql();
        let sql = format!(
            r#"
            SELECT id, name, email, document, kind
            FROM customer
            ORDER BY name {direction}, id {direction}
            LIMIT $1 OFFSET $2
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&mut *self.tx)
            .await?;

        let content = self.load_customers(rows).await?;
        Ok(Page::new(content, page, total))
    }

    async fn update_customer(&mut self, customer: &Customer) -> Result<()> {
        let result = sqlx::query("UPDATE customer SET name = $2, email = $3 WHERE id = $1")
            .bind(customer.id.as_i64())
            .bind(&customer.name)
            .bind(&customer.email)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::row_not_found("Customer", customer.id));
        }
        Ok(())
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<()> {
        let referenced: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM orders o
                WHERE o.customer_id = $1
                   OR o.delivery_address_id IN (SELECT a.id FROM address a WHERE a.customer_id = $1)
            )
            "#,
        )
        .bind(id.as_i64())
        .fetch_one(&mut *self.tx)
        .await?;
        if referenced {
            return Err(StoreError::Conflict(format!(
                "customer {id} is referenced by orders"
            )));
        }

        // Phones and addresses go with the customer (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::row_not_found("Customer", id));
        }
        Ok(())
    }

    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, street, number, complement, district, postal_code, city_id
            FROM address
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(row_to_address).transpose()
    }
}

#[async_trait]
impl OrderRepository for PostgresUnitOfWork {
    async fn insert_order(&mut self, order: &Order) -> Result<OrderId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (placed_at, customer_id, delivery_address_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(order.placed_at())
        .bind(order.customer_id().as_i64())
        .bind(order.delivery_address_id().as_i64())
        .fetch_one(&mut *self.tx)
        .await?;
        let id = OrderId::new(id);

        if let Some(payment) = order.payment() {
            self.upsert_payment(id, payment).await?;
        }
        for item in order.items() {
            self.upsert_item(id, item).await?;
        }

        Ok(id)
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>> {
        let rows = sqlx::query(
            "SELECT id, placed_at, customer_id, delivery_address_id FROM orders WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(self.load_orders(rows).await?.into_iter().next())
    }

    async fn find_order_for_update(&mut self, id: OrderId) -> Result<Option<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, placed_at, customer_id, delivery_address_id
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(self.load_orders(rows).await?.into_iter().next())
    }

    async fn list_orders(&mut self, page: PageRequest) -> Result<Page<Order>> {
        let total = self.count("orders").await?;
        let direction = page.sort_direction().as_sql();
        let sql = format!(
            r#"
            SELECT id, placed_at, customer_id, delivery_address_id
            FROM orders
            ORDER BY placed_at {direction}, id {direction}
            LIMIT $1 OFFSET $2
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&mut *self.tx)
            .await?;

        let content = self.load_orders(rows).await?;
        Ok(Page::new(content, page, total))
    }

    async fn update_order(&mut self, order: &Order) -> Result<()> {
        let id = order.id().ok_or(StoreError::Unpersisted("Order"))?;

        let result = sqlx::query(
            "UPDATE orders SET customer_id = $2, delivery_address_id = $3 WHERE id = $1",
        )
        .bind(id.as_i64())
        .bind(order.customer_id().as_i64())
        .bind(order.delivery_address_id().as_i64())
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::row_not_found("Order", id));
        }

        match order.payment() {
            Some(payment) => self.upsert_payment(id, payment).await?,
            None => {
                sqlx::query("DELETE FROM payment WHERE order_id = $1")
                    .bind(id.as_i64())
                    .execute(&mut *self.tx)
                    .await?;
            }
        }

        let kept: Vec<i64> = order.items().map(|item| item.product_id.as_i64()).collect();
        let removed = sqlx::query(
            "DELETE FROM order_item WHERE order_id = $1 AND NOT (product_id = ANY($2))",
        )
        .bind(id.as_i64())
        .bind(&kept)
        .execute(&mut *self.tx)
        .await?;
        tracing::debug!(order_id = %id, removed = removed.rows_affected(), "orphan items deleted");

        for item in order.items() {
            self.upsert_item(id, item).await?;
        }
        Ok(())
    }

    async fn delete_order(&mut self, id: OrderId) -> Result<()> {
        // Payment and items go with the order (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::row_not_found("Order", id));
        }
        Ok(())
    }
}
