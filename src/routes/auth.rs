use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    auth,
    middleware::{self, AdminUser},
    session::{Flash, Session},
};

/// Login is public; logout requires an authenticated session.
pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(logout))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::admin_authorization,
        ));

    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(login_page, login))
        .merge(protected)
}

#[derive(Serialize, ToSchema)]
struct LoginPageRes {
    pub flashes: Vec<Flash>,
}

/// Pending flash messages for the login screen.
#[utoipa::path(
    get,
    path = "/login",
    tags = ["Auth"],
    responses(
        (status = 200, description = "Login page state", body = StdResponse<LoginPageRes, String>)
    )
)]
async fn login_page(mut session: Session) -> Result<impl IntoResponse, AppError> {
    let flashes = session.data.take_flashes();
    let jar = session.save().await?;

    Ok((
        jar,
        StdResponse {
            data: Some(LoginPageRes { flashes }),
            message: Some("Please log in"),
        },
    ))
}

#[derive(Deserialize, ToSchema)]
struct LoginReq {
    username: String,
    password: String,
}

/// Authenticate the admin and start a session.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Auth"],
    request_body(content = LoginReq, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirects to /admin on success, back to /login otherwise")
    )
)]
async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(body): Form<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth::authenticate(state.users.as_ref(), &body.username, &body.password).await?;

    let target = match user {
        Some(user) => {
            info!("User {} logged in", user.username);
            session.renew();
            session.data.user_id = Some(user.id);
            session.data.flash("success", "Logged in successfully.");
            "/admin"
        }
        None => {
            info!("Rejected login attempt for {}", body.username);
            session.data.flash("danger", "Invalid username or password.");
            "/login"
        }
    };

    let jar = session.save().await?;
    Ok((jar, Redirect::to(target)))
}

/// End the authenticated session.
#[utoipa::path(
    get,
    path = "/logout",
    tags = ["Auth"],
    responses(
        (status = 303, description = "Redirects to /login")
    )
)]
async fn logout(
    Extension(admin): Extension<AdminUser>,
    mut session: Session,
) -> Result<impl IntoResponse, AppError> {
    session.data.user_id = None;
    session.data.flash("success", "You have been logged out.");
    let jar = session.save().await?;

    info!("User {} logged out", admin.username);
    Ok((jar, Redirect::to("/login")))
}
