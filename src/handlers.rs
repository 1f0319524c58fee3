use crate::{
    AppState,
    auth::{AdminUser, AuthUser},
    error::ApiError,
    models::{
        Category, CategoryInput, Content, ContentInput, Order, OrderInput, OrderStatusUpdate,
        Product, ProductFilter, ProductInput, Testimonial, TestimonialInput, UploadResponse,
    },
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

// --- Document Shaping Helpers ---

/// Deserializes a stored document into its typed record. A shape mismatch
/// here means the stored data is corrupt, which is a backend failure.
fn from_doc<T: DeserializeOwned>(doc: Value) -> Result<T, ApiError> {
    serde_json::from_value(doc).map_err(|e| ApiError::Internal(e.to_string()))
}

fn from_docs<T: DeserializeOwned>(docs: Vec<Value>) -> Result<Vec<T>, ApiError> {
    docs.into_iter().map(from_doc).collect()
}

fn to_doc<T: serde::Serialize>(record: &T) -> Result<Value, ApiError> {
    serde_json::to_value(record).map_err(|e| ApiError::Internal(e.to_string()))
}

// --- Category Handlers ---

/// list_categories
///
/// [Public Route] Lists all categories.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let docs = state.store.list("categories", None).await?;
    Ok(Json(from_docs(docs)?))
}

/// create_category
///
/// [Admin Route] Creates a category. The server stamps `id` and `created_at`;
/// neither is accepted as client input.
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Created", body = Category),
        (status = 401, description = "Missing/invalid token"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_category(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<CategoryInput>,
) -> Result<Json<Category>, ApiError> {
    payload.validate()?;
    let category = payload.into_record();
    state.store.insert("categories", &to_doc(&category)?).await?;
    Ok(Json(category))
}

/// update_category
///
/// [Admin Route] Full-document replace: the entire input payload is written
/// over the stored document, so fields omitted from the payload (an absent
/// `description`) do not survive the update. `id` and `created_at` are kept.
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryInput>,
) -> Result<Json<Category>, ApiError> {
    payload.validate()?;
    let patch = to_doc(&payload)?;
    match state.store.update_one("categories", "id", &id, &patch).await? {
        Some(doc) => Ok(Json(from_doc(doc)?)),
        None => Err(ApiError::NotFound("Category")),
    }
}

/// delete_category
///
/// [Admin Route] Deletion is immediate and irreversible; deleting a
/// nonexistent id is a 404, never a silent success.
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = String, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.store.delete_one("categories", "id", &id).await? {
        Ok(Json(json!({ "message": "Category deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Category"))
    }
}

// --- Product Handlers ---

/// list_products
///
/// [Public Route] Lists products, optionally filtered by exact `category_id`
/// equality. Without the filter, returns all products (capped at 1000 rows).
#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductFilter),
    responses((status = 200, description = "Products", body = [Product]))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let filter = filter
        .category_id
        .as_deref()
        .map(|category_id| ("category_id", category_id));
    let docs = state.store.list("products", filter).await?;
    Ok(Json(from_docs(docs)?))
}

/// get_product
///
/// [Public Route] Retrieves a single product by ID.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Found", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    match state.store.find_one("products", "id", &id).await? {
        Some(doc) => Ok(Json(from_doc(doc)?)),
        None => Err(ApiError::NotFound("Product")),
    }
}

/// create_product
///
/// [Admin Route] Creates a product. `category_id` is a soft reference —
/// it is not validated against existing categories.
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductInput,
    responses(
        (status = 200, description = "Created", body = Product),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_product(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    payload.validate()?;
    let product = payload.into_record();
    state.store.insert("products", &to_doc(&product)?).await?;
    Ok(Json(product))
}

/// update_product
///
/// [Admin Route] Full-document replace; the client must resend all fields.
/// Omitted optionals become null and defaulted fields (tags, stock) reset.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_product(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    payload.validate()?;
    let patch = to_doc(&payload)?;
    match state.store.update_one("products", "id", &id, &patch).await? {
        Some(doc) => Ok(Json(from_doc(doc)?)),
        None => Err(ApiError::NotFound("Product")),
    }
}

/// delete_product
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_product(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.store.delete_one("products", "id", &id).await? {
        Ok(Json(json!({ "message": "Product deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Product"))
    }
}

// --- Upload Handler ---

/// upload_file
///
/// [Admin Route] Accepts a multipart form with a `file` part, stores it under
/// a unique object key derived from the original extension, and returns the
/// public URL of the stored object.
#[utoipa::path(
    post,
    path = "/api/upload",
    responses(
        (status = 200, description = "Stored", body = UploadResponse),
        (status = 422, description = "No file part present")
    )
)]
pub async fn upload_file(
    _admin: AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.bin").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        // Unique, structured object key (e.g. 'uploads/UUID.ext').
        let extension = std::path::Path::new(&filename)
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("bin");
        let key = format!("uploads/{}.{}", Uuid::new_v4(), extension);

        let url = state
            .storage
            .put_object(&key, data.to_vec(), &content_type)
            .await
            .map_err(ApiError::Internal)?;

        return Ok(Json(UploadResponse { url, key }));
    }

    Err(ApiError::Validation(
        "multipart request must contain a 'file' part".to_string(),
    ))
}

// --- Order Handlers ---

/// list_orders
///
/// [Authenticated Route] Admins see every order; everyone else sees only the
/// rows whose `user_id` matches their resolved identity.
#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders", body = [Order]),
        (status = 401, description = "Missing/invalid token")
    )
)]
pub async fn list_orders(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let filter = if user.role == "admin" {
        None
    } else {
        Some(("user_id", user.id.as_str()))
    };
    let docs = state.store.list("orders", filter).await?;
    Ok(Json(from_docs(docs)?))
}

/// create_order
///
/// [Authenticated Route] `user_id` and `user_email` are stamped from the
/// verified identity; client-supplied values for those fields are ignored.
/// `total_amount` is stored as sent — it is not recomputed from `items`.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderInput,
    responses(
        (status = 200, description = "Created", body = Order),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_order(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<OrderInput>,
) -> Result<Json<Order>, ApiError> {
    payload.validate()?;
    let order = payload.into_record(user.id, user.email);
    state.store.insert("orders", &to_doc(&order)?).await?;
    Ok(Json(order))
}

/// update_order_status
///
/// [Admin Route] Patches only the status fields supplied as query parameters;
/// absent or empty fields are left untouched. Supplying neither is a no-op
/// that still returns the (unchanged) order.
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order ID"), OrderStatusUpdate),
    responses(
        (status = 200, description = "Updated", body = Order),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_order_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(update): Query<OrderStatusUpdate>,
) -> Result<Json<Order>, ApiError> {
    // An empty value ("?payment_status=") counts as absent.
    let mut fields = serde_json::Map::new();
    if let Some(payment_status) = update.payment_status.filter(|s| !s.is_empty()) {
        fields.insert("payment_status".to_string(), Value::String(payment_status));
    }
    if let Some(delivery_status) = update.delivery_status.filter(|s| !s.is_empty()) {
        fields.insert("delivery_status".to_string(), Value::String(delivery_status));
    }

    match state
        .store
        .update_one("orders", "id", &id, &Value::Object(fields))
        .await?
    {
        Some(doc) => Ok(Json(from_doc(doc)?)),
        None => Err(ApiError::NotFound("Order")),
    }
}

/// delete_order
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_order(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.store.delete_one("orders", "id", &id).await? {
        Ok(Json(json!({ "message": "Order deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Order"))
    }
}

// --- Testimonial Handlers ---

/// list_testimonials
#[utoipa::path(
    get,
    path = "/api/testimonials",
    responses((status = 200, description = "Testimonials", body = [Testimonial]))
)]
pub async fn list_testimonials(
    State(state): State<AppState>,
) -> Result<Json<Vec<Testimonial>>, ApiError> {
    let docs = state.store.list("testimonials", None).await?;
    Ok(Json(from_docs(docs)?))
}

/// create_testimonial
///
/// [Admin Route] A rating outside [1,5] is rejected with 422 before anything
/// reaches the store.
#[utoipa::path(
    post,
    path = "/api/testimonials",
    request_body = TestimonialInput,
    responses(
        (status = 200, description = "Created", body = Testimonial),
        (status = 422, description = "Rating out of range")
    )
)]
pub async fn create_testimonial(
    _admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<TestimonialInput>,
) -> Result<Json<Testimonial>, ApiError> {
    payload.validate()?;
    let testimonial = payload.into_record();
    state
        .store
        .insert("testimonials", &to_doc(&testimonial)?)
        .await?;
    Ok(Json(testimonial))
}

/// delete_testimonial
#[utoipa::path(
    delete,
    path = "/api/testimonials/{id}",
    params(("id" = String, Path, description = "Testimonial ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_testimonial(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.store.delete_one("testimonials", "id", &id).await? {
        Ok(Json(json!({ "message": "Testimonial deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Testimonial"))
    }
}

// --- Content Handlers ---

/// get_content
///
/// [Public Route] The one deliberate non-error absence case: an unknown page
/// responds 200 with an empty-content body instead of 404, so the frontend
/// can always render something.
#[utoipa::path(
    get,
    path = "/api/content/{page}",
    params(("page" = String, Path, description = "Page name")),
    responses((status = 200, description = "Page content", body = Content))
)]
pub async fn get_content(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.store.find_one("content", "page", &page).await? {
        Some(doc) => Ok(Json(doc)),
        None => Ok(Json(json!({ "page": page, "content": "" }))),
    }
}

/// update_content
///
/// [Admin Route] Upsert keyed by page name: writing an unknown page creates
/// it. Each write stamps a fresh `id` and `updated_at`.
#[utoipa::path(
    put,
    path = "/api/content/{page}",
    params(("page" = String, Path, description = "Page name")),
    request_body = ContentInput,
    responses((status = 200, description = "Upserted", body = Content))
)]
pub async fn update_content(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(page): Path<String>,
    Json(payload): Json<ContentInput>,
) -> Result<Json<Content>, ApiError> {
    let content = payload.into_record(page);
    state
        .store
        .upsert_one("content", "page", &content.page, &to_doc(&content)?)
        .await?;
    Ok(Json(content))
}
