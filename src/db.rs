use chrono::{Duration, NaiveDate};

use crate::{
    errors::AppError,
    structs::{ExpiringProduct, LowStockProduct, Product, Sale, User},
    AppState,
};

/// Days ahead of today within which stock is flagged as expiring.
pub const EXPIRY_WINDOW_DAYS: i64 = 15;

/// Quantities strictly below this are flagged for replenishment.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

pub async fn create_user(
    state: &AppState,
    pharmacy_name: &str,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (pharmacy_name, username, email, password) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(pharmacy_name)
    .bind(username)
    .bind(email)
    .bind(password)
    .fetch_one(&state.db_pool)
    .await?;
    log::info!("User {} created with id {}", username, id);
    Ok(id)
}

pub async fn username_exists(state: &AppState, username: &str) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(&state.db_pool)
        .await?;
    Ok(exists)
}

pub async fn email_exists(state: &AppState, email: &str) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(&state.db_pool)
        .await?;
    Ok(exists)
}

/// Exact match of both columns; the stored password is compared in the
/// clear. Returns the user id and pharmacy name on success.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Option<(i64, String)>, AppError> {
    let row = sqlx::query_as::<_, (i64, String)>(
        "SELECT id, pharmacy_name FROM users WHERE username = $1 AND password = $2",
    )
    .bind(username)
    .bind(password)
    .fetch_optional(&state.db_pool)
    .await?;
    Ok(row)
}

pub async fn user_by_id(state: &AppState, user_id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db_pool)
        .await?;
    Ok(user)
}

/// Duplicate names within a user are allowed; each call creates a new row.
pub async fn add_product(
    state: &AppState,
    user_id: i64,
    name: &str,
    expiry_date: NaiveDate,
    quantity: i64,
    amount: f64,
) -> Result<i64, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (user_id, name, expiry_date, quantity, amount) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(user_id)
    .bind(name)
    .bind(expiry_date)
    .bind(quantity)
    .bind(amount)
    .fetch_one(&state.db_pool)
    .await?;
    Ok(id)
}

/// Deletes every product with this exact name, regardless of owner.
/// Sales referencing a removed product keep their product_id; the invoice
/// view reports the gap. Returns the number of rows removed.
pub async fn remove_product_by_name(state: &AppState, name: &str) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE name = $1")
        .bind(name)
        .execute(&state.db_pool)
        .await?;
    log::info!("Removed {} product(s) named {:?}", result.rows_affected(), name);
    Ok(result.rows_affected())
}

/// Substring match on the product name, scoped to the owning user.
pub async fn search_products(
    state: &AppState,
    user_id: i64,
    name: &str,
) -> Result<Vec<Product>, AppError> {
    let pattern = format!("%{}%", name);
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE user_id = $1 AND name LIKE $2",
    )
    .bind(user_id)
    .bind(pattern)
    .fetch_all(&state.db_pool)
    .await?;
    Ok(products)
}

pub async fn list_products(state: &AppState, user_id: i64) -> Result<Vec<Product>, AppError> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&state.db_pool)
        .await?;
    Ok(products)
}

/// Resolves the first product with this exact name for the user. Sales
/// entry uses it to map the typed medicine name to a product id.
pub async fn product_id_by_name(
    state: &AppState,
    user_id: i64,
    name: &str,
) -> Result<Option<i64>, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM products WHERE user_id = $1 AND name = $2",
    )
    .bind(user_id)
    .bind(name)
    .fetch_optional(&state.db_pool)
    .await?;
    Ok(id)
}

/// Products whose expiry date falls within [today, today + threshold_days],
/// both ends inclusive.
pub async fn expiring_products(
    state: &AppState,
    user_id: i64,
    today: NaiveDate,
    threshold_days: i64,
) -> Result<Vec<ExpiringProduct>, AppError> {
    let until = today + Duration::days(threshold_days);
    let rows = sqlx::query_as::<_, ExpiringProduct>(
        "SELECT name, expiry_date FROM products WHERE user_id = $1 AND expiry_date BETWEEN $2 AND $3",
    )
    .bind(user_id)
    .bind(today)
    .bind(until)
    .fetch_all(&state.db_pool)
    .await?;
    Ok(rows)
}

/// Products with quantity strictly below the threshold.
pub async fn low_stock_products(
    state: &AppState,
    user_id: i64,
    threshold_qty: i64,
) -> Result<Vec<LowStockProduct>, AppError> {
    let rows = sqlx::query_as::<_, LowStockProduct>(
        "SELECT name, quantity FROM products WHERE user_id = $1 AND quantity < $2",
    )
    .bind(user_id)
    .bind(threshold_qty)
    .fetch_all(&state.db_pool)
    .await?;
    Ok(rows)
}

/// Subtracts the sold quantity from the product's stock. No floor check:
/// quantity goes negative when a sale oversells the stock.
pub async fn decrement_quantity<'e, E>(
    executor: E,
    product_id: i64,
    sold_qty: i64,
) -> Result<(), AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query("UPDATE products SET quantity = quantity - $1 WHERE id = $2")
        .bind(sold_qty)
        .bind(product_id)
        .execute(executor)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("product"));
    }
    Ok(())
}

/// Inserts the sale row and decrements the product's stock in a single
/// transaction: if either write fails nothing is committed, so the sales
/// history can never disagree with the inventory.
pub async fn record_sale(
    state: &AppState,
    customer_name: &str,
    mobile_number: &str,
    product_id: i64,
    quantity: i64,
    amount: f64,
    sale_date: NaiveDate,
) -> Result<i64, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let sale_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO sales (customer_name, mobile_number, product_id, prod_quantity, amount, sale_date) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(customer_name)
    .bind(mobile_number)
    .bind(product_id)
    .bind(quantity)
    .bind(amount)
    .bind(sale_date)
    .fetch_one(&mut *tx)
    .await?;

    decrement_quantity(&mut *tx, product_id, quantity).await?;

    tx.commit().await?;
    log::info!("Sale {} recorded for product {}", sale_id, product_id);
    Ok(sale_id)
}

pub async fn find_sale_by_id(state: &AppState, id: i64) -> Result<Option<Sale>, AppError> {
    let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?;
    Ok(sale)
}

pub async fn find_sales_by_date(state: &AppState, date: NaiveDate) -> Result<Vec<Sale>, AppError> {
    let sales = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE sale_date = $1")
        .bind(date)
        .fetch_all(&state.db_pool)
        .await?;
    Ok(sales)
}

/// Display lookup for invoices; `None` when the product has been removed.
pub async fn resolve_product_name(
    state: &AppState,
    product_id: i64,
) -> Result<Option<String>, AppError> {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.db_pool)
        .await?;
    Ok(name)
}
