use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod schema {
    diesel::table! {
        users (id) {
            id -> Uuid,
            name -> Text,
            email -> Text,
            phone -> Text,
            password_hash -> Text,
            user_type -> Text,
            company_name -> Nullable<Text>,
            created_at -> Timestamptz,
        }
    }

    diesel::table! {
        vendor_products (product_id) {
            product_id -> Uuid,
            product_name -> Text,
            category -> Text,
            mrp -> Numeric,
            discount -> Numeric,
            image -> Nullable<Text>,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        product_stock (stock_id) {
            stock_id -> Uuid,
            product_id -> Uuid,
            quantity -> Int4,
            minimum_stock -> Int4,
            maximum_stock -> Int4,
            created_at -> Timestamptz,
            updated_at -> Timestamptz,
        }
    }

    diesel::table! {
        sales (sale_id) {
            sale_id -> Uuid,
            product_id -> Uuid,
            quantity -> Int4,
            sale_amount -> Numeric,
            sale_date -> Date,
            location -> Text,
            customer_age -> Int4,
            customer_gender -> Text,
            payment_type -> Text,
            sale_channel -> Text,
        }
    }

    diesel::joinable!(product_stock -> vendor_products (product_id));
    diesel::allow_tables_to_appear_in_same_query!(product_stock, vendor_products);
}

use self::schema::{product_stock, sales, users, vendor_products};

#[derive(Debug, Clone, Queryable, Insertable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub user_type: String,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable, Insertable, Selectable)]
#[diesel(table_name = vendor_products)]
pub struct VendorProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub category: String,
    pub mrp: BigDecimal,
    pub discount: BigDecimal,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Queryable, Insertable, Selectable)]
#[diesel(table_name = product_stock)]
pub struct StockRecord {
    pub stock_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub minimum_stock: i32,
    pub maximum_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sales rows are written by an external ingestion process and never mutated
/// here.
#[derive(Debug, Clone, Serialize, Queryable, Selectable)]
#[diesel(table_name = sales)]
pub struct Sale {
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub sale_amount: BigDecimal,
    pub sale_date: NaiveDate,
    pub location: String,
    pub customer_age: i32,
    pub customer_gender: String,
    pub payment_type: String,
    pub sale_channel: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub label: String,
    pub value: f64,
}

/// Chart-ready table; column names match the grouping that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTable {
    pub label_column: String,
    pub value_column: String,
    pub rows: Vec<ChartRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartTable>,
}
