use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{app_error::AppError, app_state::AppState, session::Session};

/// The logged-in admin, inserted as a request extension by [`admin_authorization`].
#[derive(Clone, Debug)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
}

/// Lets the request through only when the session belongs to an existing user;
/// everyone else is sent to `/login`.
pub async fn admin_authorization(
    State(state): State<AppState>,
    mut session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = match session.data.user_id {
        Some(id) => state.users.find(id).await?,
        None => None,
    };

    match user {
        Some(user) => {
            req.extensions_mut().insert(AdminUser {
                id: user.id,
                username: user.username,
            });
            Ok(next.run(req).await)
        }
        None => {
            session.data.user_id = None;
            session
                .data
                .flash("info", "Please log in to access this page.");
            let jar = session.save().await?;
            Ok((jar, Redirect::to("/login")).into_response())
        }
    }
}
