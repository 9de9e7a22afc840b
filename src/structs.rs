use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub pharmacy_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub expiry_date: NaiveDate,
    pub quantity: i64,
    pub amount: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Sale {
    pub id: i64,
    pub customer_name: String,
    pub mobile_number: String,
    pub product_id: i64,
    pub prod_quantity: i64,
    pub amount: f64,
    pub sale_date: NaiveDate,
}

/// Alert row for stock expiring inside the warning window.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct ExpiringProduct {
    pub name: String,
    pub expiry_date: NaiveDate,
}

/// Alert row for stock below the replenishment threshold.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct LowStockProduct {
    pub name: String,
    pub quantity: i64,
}
