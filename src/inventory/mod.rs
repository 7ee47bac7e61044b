use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::ServiceError;
use crate::shared::models::schema::{product_stock, vendor_products};
use crate::shared::models::StockRecord;
use crate::shared::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub minimum_stock: i32,
    pub maximum_stock: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, Queryable)]
pub struct StockView {
    pub stock_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub minimum_stock: i32,
    pub maximum_stock: i32,
}

pub fn validate_new_stock(req: &AddStockRequest) -> Result<(), ServiceError> {
    if req.quantity <= 0 {
        return Err(ServiceError::validation(
            "Please enter a valid quantity to add.",
        ));
    }
    if req.minimum_stock < 0 || req.maximum_stock < 0 {
        return Err(ServiceError::validation(
            "stock levels must be zero or greater",
        ));
    }
    Ok(())
}

pub fn configure_inventory_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/inventory/stock", get(list_stock).post(add_stock))
        .route("/api/inventory/stock/:id", put(update_stock))
}

/// POST /api/inventory/stock - add a stock row for a product
async fn add_stock(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddStockRequest>,
) -> Result<Json<StockRecord>, ServiceError> {
    validate_new_stock(&req)?;
    let mut conn = state.conn.get()?;

    let product: Option<Uuid> = vendor_products::table
        .filter(vendor_products::product_id.eq(req.product_id))
        .select(vendor_products::product_id)
        .first(&mut conn)
        .optional()?;
    if product.is_none() {
        return Err(ServiceError::not_found("product not found"));
    }

    let now = Utc::now();
    let record = StockRecord {
        stock_id: Uuid::new_v4(),
        product_id: req.product_id,
        quantity: req.quantity,
        minimum_stock: req.minimum_stock,
        maximum_stock: req.maximum_stock,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(product_stock::table)
        .values(&record)
        .execute(&mut conn)?;

    info!(
        "Added stock of {} for product {}",
        record.quantity, record.product_id
    );
    Ok(Json(record))
}

/// PUT /api/inventory/stock/:id - set a stock row's quantity
async fn update_stock(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStockRequest>,
) -> Result<Json<StockRecord>, ServiceError> {
    if req.quantity < 0 {
        return Err(ServiceError::validation(
            "stock quantity cannot be negative",
        ));
    }
    let mut conn = state.conn.get()?;

    let updated = diesel::update(product_stock::table.filter(product_stock::stock_id.eq(id)))
        .set((
            product_stock::quantity.eq(req.quantity),
            product_stock::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)?;
    if updated == 0 {
        return Err(ServiceError::not_found("stock record not found"));
    }

    let record: StockRecord = product_stock::table
        .filter(product_stock::stock_id.eq(id))
        .first(&mut conn)?;
    Ok(Json(record))
}

/// GET /api/inventory/stock - stock levels joined with product names
async fn list_stock(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StockView>>, ServiceError> {
    let mut conn = state.conn.get()?;
    let rows: Vec<StockView> = product_stock::table
        .inner_join(vendor_products::table)
        .select((
            product_stock::stock_id,
            vendor_products::product_name,
            product_stock::quantity,
            product_stock::minimum_stock,
            product_stock::maximum_stock,
        ))
        .order(vendor_products::product_name.asc())
        .load(&mut conn)?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;
    use crate::{assert_err, assert_ok};

    fn request(quantity: i32) -> AddStockRequest {
        AddStockRequest {
            product_id: Uuid::new_v4(),
            quantity,
            minimum_stock: 5,
            maximum_stock: 50,
        }
    }

    #[test]
    fn quantity_must_be_positive() {
        test_util::setup();
        assert_ok!(validate_new_stock(&request(1)));
        let err = assert_err!(validate_new_stock(&request(0)));
        assert_eq!(err.to_string(), "Please enter a valid quantity to add.");
        assert_err!(validate_new_stock(&request(-3)));
    }

    #[test]
    fn stock_levels_must_be_non_negative() {
        test_util::setup();
        let mut req = request(10);
        req.minimum_stock = -1;
        assert_err!(validate_new_stock(&req));
    }
}
