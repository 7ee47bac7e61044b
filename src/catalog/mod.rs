use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::info;
use serde::Deserialize;
use uuid::Uuid;

use crate::file::save_image;
use crate::shared::error::ServiceError;
use crate::shared::models::schema::vendor_products;
use crate::shared::models::VendorProduct;
use crate::shared::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub product_name: String,
    pub category: String,
    pub mrp: f64,
    pub discount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub mrp: Option<f64>,
    pub discount: Option<f64>,
}

#[derive(AsChangeset)]
#[diesel(table_name = vendor_products)]
struct ProductChanges {
    product_name: Option<String>,
    category: Option<String>,
    mrp: Option<BigDecimal>,
    discount: Option<BigDecimal>,
    updated_at: DateTime<Utc>,
}

fn bd(val: f64) -> BigDecimal {
    BigDecimal::from_str(&val.to_string()).unwrap_or_else(|_| BigDecimal::from(0))
}

pub fn validate_mrp(mrp: f64) -> Result<(), ServiceError> {
    if !mrp.is_finite() || mrp < 0.0 {
        return Err(ServiceError::validation("mrp must be zero or greater"));
    }
    Ok(())
}

pub fn validate_discount(discount: f64) -> Result<(), ServiceError> {
    if !discount.is_finite() || !(0.0..=100.0).contains(&discount) {
        return Err(ServiceError::validation(
            "discount must be a percentage between 0 and 100",
        ));
    }
    Ok(())
}

pub fn configure_catalog_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/catalog/products",
            get(list_products).post(create_product),
        )
        .route(
            "/api/catalog/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/catalog/products/:id/image", post(upload_product_image))
}

/// POST /api/catalog/products - add a vendor product
async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<VendorProduct>, ServiceError> {
    if req.product_name.trim().is_empty() || req.category.trim().is_empty() {
        return Err(ServiceError::validation(
            "product name and category are required",
        ));
    }
    validate_mrp(req.mrp)?;
    let discount = req.discount.unwrap_or(0.0);
    validate_discount(discount)?;

    let mut conn = state.conn.get()?;
    let now = Utc::now();
    let product = VendorProduct {
        product_id: Uuid::new_v4(),
        product_name: req.product_name.trim().to_string(),
        category: req.category.trim().to_string(),
        mrp: bd(req.mrp),
        discount: bd(discount),
        image: None,
        created_at: now,
        updated_at: now,
    };

    diesel::insert_into(vendor_products::table)
        .values(&product)
        .execute(&mut conn)?;

    info!("Added product {} ({})", product.product_name, product.product_id);
    Ok(Json(product))
}

/// GET /api/catalog/products - list the catalog
async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VendorProduct>>, ServiceError> {
    let mut conn = state.conn.get()?;
    let products: Vec<VendorProduct> = vendor_products::table
        .order(vendor_products::product_name.asc())
        .load(&mut conn)?;
    Ok(Json(products))
}

/// GET /api/catalog/products/:id
async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorProduct>, ServiceError> {
    let mut conn = state.conn.get()?;
    let product: Option<VendorProduct> = vendor_products::table
        .filter(vendor_products::product_id.eq(id))
        .first(&mut conn)
        .optional()?;
    let product = product.ok_or_else(|| ServiceError::not_found("product not found"))?;
    Ok(Json(product))
}

/// PUT /api/catalog/products/:id - update the provided fields
async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<VendorProduct>, ServiceError> {
    if let Some(name) = &req.product_name {
        if name.trim().is_empty() {
            return Err(ServiceError::validation("product name cannot be empty"));
        }
    }
    if let Some(mrp) = req.mrp {
        validate_mrp(mrp)?;
    }
    if let Some(discount) = req.discount {
        validate_discount(discount)?;
    }

    let changes = ProductChanges {
        product_name: req.product_name.map(|n| n.trim().to_string()),
        category: req.category.map(|c| c.trim().to_string()),
        mrp: req.mrp.map(bd),
        discount: req.discount.map(bd),
        updated_at: Utc::now(),
    };

    let mut conn = state.conn.get()?;
    let updated =
        diesel::update(vendor_products::table.filter(vendor_products::product_id.eq(id)))
            .set(&changes)
            .execute(&mut conn)?;
    if updated == 0 {
        return Err(ServiceError::not_found("product not found"));
    }

    let product: VendorProduct = vendor_products::table
        .filter(vendor_products::product_id.eq(id))
        .first(&mut conn)?;
    Ok(Json(product))
}

/// DELETE /api/catalog/products/:id
async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    let mut conn = state.conn.get()?;
    let deleted = diesel::delete(vendor_products::table.filter(vendor_products::product_id.eq(id)))
        .execute(&mut conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found("product not found"));
    }
    info!("Removed product {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/catalog/products/:id/image - multipart upload, stored under the
/// original filename and recorded on the product row
async fn upload_product_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<VendorProduct>, ServiceError> {
    let mut stored: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::validation(format!("invalid multipart payload: {e}")))?
    {
        let Some(file_name) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::validation(format!("failed to read upload: {e}")))?;
        stored = Some(save_image(&state.config.storage.image_dir, &file_name, &data)?);
    }
    let image_path = stored.ok_or_else(|| ServiceError::validation("no image file in upload"))?;

    let mut conn = state.conn.get()?;
    let updated =
        diesel::update(vendor_products::table.filter(vendor_products::product_id.eq(id)))
            .set((
                vendor_products::image.eq(&image_path),
                vendor_products::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
    if updated == 0 {
        return Err(ServiceError::not_found("product not found"));
    }

    let product: VendorProduct = vendor_products::table
        .filter(vendor_products::product_id.eq(id))
        .first(&mut conn)?;
    Ok(Json(product))
}
