use axum::{
    Form,
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    models::{CreateProductEntity, IMAGE_FILENAME_MAX_LEN, ProductWithImages, ensure_fits},
    repositories::ProductRepository,
    session::{Flash, Session},
    uploads::{self, ALLOWED_EXTENSIONS, ImageStore},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(dashboard))
        .routes(utoipa_axum::routes!(add_product_form, add_product))
        .routes(utoipa_axum::routes!(edit_product_form, edit_product))
        .routes(utoipa_axum::routes!(delete_product))
}

#[derive(Serialize, ToSchema)]
struct DashboardRes {
    pub products: Vec<ProductWithImages>,
    pub flashes: Vec<Flash>,
}

/// List all products for the admin.
#[utoipa::path(
    get,
    path = "/admin",
    tags = ["Admin"],
    responses(
        (status = 200, description = "List all products", body = StdResponse<DashboardRes, String>),
        (status = 303, description = "Not logged in, redirects to /login")
    )
)]
async fn dashboard(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    let products = state.products.list().await?;
    let flashes = session.data.take_flashes();
    let jar = session.save().await?;

    Ok((
        jar,
        StdResponse {
            data: Some(DashboardRes { products, flashes }),
            message: Some("Get products successfully"),
        },
    ))
}

#[derive(Serialize, ToSchema)]
struct AddProductFormRes {
    pub allowed_extensions: Vec<String>,
}

/// Describe what the create form accepts.
#[utoipa::path(
    get,
    path = "/admin/add",
    tags = ["Admin"],
    responses(
        (status = 200, description = "Create form contract", body = StdResponse<AddProductFormRes, String>)
    )
)]
async fn add_product_form() -> impl IntoResponse {
    StdResponse {
        data: Some(AddProductFormRes {
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }),
        message: Some("Upload images as repeated `images` fields"),
    }
}

struct UploadedImage {
    filename: String,
    bytes: Vec<u8>,
}

#[derive(ToSchema)]
struct CreateProductForm {
    name: String,
    description: String,
    price: f64,
    #[schema(value_type = Vec<String>)]
    images: Vec<UploadedImage>,
}

impl CreateProductForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut name = None;
        let mut description = None;
        let mut price = None;
        let mut images = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?
        {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "images" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|err| AppError::BadRequest(err.body_text()))?;
                    images.push(UploadedImage {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
                "name" | "description" | "price" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|err| AppError::BadRequest(err.body_text()))?;
                    match field_name.as_str() {
                        "name" => name = Some(value),
                        "description" => description = Some(value),
                        _ => price = Some(value),
                    }
                }
                _ => {}
            }
        }

        let missing = |field: &str| AppError::BadRequest(format!("Missing field `{}`", field));
        let price = price.ok_or_else(|| missing("price"))?;

        Ok(Self {
            name: name.ok_or_else(|| missing("name"))?,
            description: description.ok_or_else(|| missing("description"))?,
            price: price
                .trim()
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid price `{}`", price)))?,
            images,
        })
    }
}

/// Create a product and attach the uploaded images with allowed extensions.
#[utoipa::path(
    post,
    path = "/admin/add",
    tags = ["Admin"],
    request_body(content = CreateProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 303, description = "Product created, redirects to /admin"),
        (status = 400, description = "Missing, malformed or over-long field")
    )
)]
async fn add_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = CreateProductForm::from_multipart(multipart).await?;
    let product = CreateProductEntity {
        name: form.name,
        description: form.description,
        price: form.price,
    };

    let created = create_with_images(
        state.products.as_ref(),
        state.images.as_ref(),
        product,
        form.images,
    )
    .await?;

    info!(
        "Product #{} created with {} image(s)",
        created.product.id,
        created.images.len()
    );

    Ok(Redirect::to("/admin"))
}

/// Validates everything up front, writes the accepted images and inserts the
/// product. Files written by a failed attempt are removed again.
async fn create_with_images(
    products: &dyn ProductRepository,
    images: &dyn ImageStore,
    product: CreateProductEntity,
    files: Vec<UploadedImage>,
) -> Result<ProductWithImages, AppError> {
    product.validate()?;

    let mut accepted = Vec::new();
    for image in files {
        if !uploads::allowed_file(&image.filename) {
            debug!("Skipping upload {:?}: extension not allowed", image.filename);
            continue;
        }

        let filename = uploads::secure_filename(&image.filename);
        if filename.is_empty() {
            debug!("Skipping upload {:?}: nothing left after sanitizing", image.filename);
            continue;
        }

        ensure_fits("Image filename", &filename, IMAGE_FILENAME_MAX_LEN)?;
        accepted.push((filename, image.bytes));
    }

    let mut written = Vec::new();
    for (filename, bytes) in &accepted {
        if let Err(err) = images.save(filename, bytes).await {
            discard_images(images, &written).await;
            return Err(err.into());
        }
        written.push(filename.clone());
    }

    match products.create(product, written.clone()).await {
        Ok(created) => Ok(created),
        Err(err) => {
            discard_images(images, &written).await;
            Err(err.into())
        }
    }
}

async fn discard_images(images: &dyn ImageStore, filenames: &[String]) {
    for filename in filenames {
        if let Err(err) = images.remove(filename).await {
            warn!("Failed to remove orphaned upload {}: {:?}", filename, err);
        }
    }
}

/// Fetch a product for editing.
#[utoipa::path(
    get,
    path = "/admin/edit/{id}",
    tags = ["Admin"],
    params(
        ("id" = i32, Path, description = "Product ID to edit")
    ),
    responses(
        (status = 200, description = "Get product successfully", body = StdResponse<ProductWithImages, String>),
        (status = 404, description = "Product not found")
    )
)]
async fn edit_product_form(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.products.find(id).await?.ok_or(AppError::NotFound)?;

    Ok(StdResponse {
        data: Some(product),
        message: Some("Get product successfully"),
    })
}

/// Update a product's name, description and price. Images are left as they are.
#[utoipa::path(
    post,
    path = "/admin/edit/{id}",
    tags = ["Admin"],
    params(
        ("id" = i32, Path, description = "Product ID to update")
    ),
    request_body(content = CreateProductEntity, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Product updated, redirects to /admin"),
        (status = 400, description = "Over-long field"),
        (status = 404, description = "Product not found")
    )
)]
async fn edit_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Form(body): Form<CreateProductEntity>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let product = state
        .products
        .update(id, body)
        .await?
        .ok_or(AppError::NotFound)?;

    info!("Product #{} updated", product.id);
    Ok(Redirect::to("/admin"))
}

/// Delete a product together with its image rows.
#[utoipa::path(
    get,
    path = "/admin/delete_product/{id}",
    tags = ["Admin"],
    params(
        ("id" = i32, Path, description = "Product ID to delete")
    ),
    responses(
        (status = 303, description = "Product deleted, redirects to /admin"),
        (status = 404, description = "Product not found")
    )
)]
async fn delete_product(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.products.delete(id).await?.ok_or(AppError::NotFound)?;

    // Files stay in the upload folder.
    info!(
        "Product #{} deleted along with {} image row(s)",
        deleted.product.id,
        deleted.images.len()
    );

    session
        .data
        .flash("success", "Product and associated images deleted successfully.");
    let jar = session.save().await?;

    Ok((jar, Redirect::to("/admin")))
}
