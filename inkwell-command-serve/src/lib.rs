mod api;

use std::{net::SocketAddr, time::Duration};

use axum::{
    error_handling::HandleErrorLayer,
    extract::Extension,
    http::StatusCode,
    routing::{get, post, put},
    BoxError, Json, Router, Server,
};
use inkwell_common::{Conf, Context as _, Report, ServiceError};
use inkwell_services::Services;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub async fn run(conf: &Conf) -> Result<(), Report> {
    let catalog = inkwell_services::init_catalog(conf).await?;

    let address: SocketAddr = conf
        .address()
        .parse()
        .with_context(|| format!("invalid listen address `{}`", conf.address()))?;

    tracing::info!("starting on `{}`", address);

    Server::bind(&address)
        .serve(app(Services::new(catalog)).into_make_service())
        .await?;

    Ok(())
}

pub fn app(services: Services) -> Router {
    Router::new()
        .route("/api/stories", get(api::list_stories).post(api::create_story))
        .route(
            "/api/stories/:id",
            get(api::get_story).put(api::update_story).delete(api::delete_story),
        )
        .route("/api/stories/:id/vote", post(api::vote_for_story))
        .route("/api/stories/:id/chapters", get(api::story_chapters))
        .route("/api/trending", get(api::trending_stories))
        .route("/api/recent", get(api::recent_stories))
        .route("/api/genres", get(api::genres))
        .route("/api/authors/:id/stories", get(api::author_stories))
        .route("/api/authors/:id/stats", get(api::author_stats))
        .route("/api/chapters", post(api::create_chapter))
        .route(
            "/api/chapters/:id",
            get(api::get_chapter).put(api::update_chapter).delete(api::delete_chapter),
        )
        .route("/api/chapters/:id/next", get(api::next_chapter))
        .route("/api/chapters/:id/previous", get(api::previous_chapter))
        .route("/api/chapters/:id/vote", post(api::vote_for_chapter))
        .route("/api/chapters/:id/view", post(api::view_chapter))
        .route("/api/me", get(api::current_user))
        .route("/api/users", get(api::list_users))
        .route("/api/users/:id", get(api::get_user).put(api::update_user))
        .route(
            "/api/users/:id/follow/:author_id",
            post(api::follow_author).delete(api::unfollow_author),
        )
        .route("/api/users/:id/lists", get(api::user_reading_lists))
        .route(
            "/api/users/:id/lists/containing/:story_id",
            get(api::lists_containing_story),
        )
        .route("/api/usernames/:username", get(api::get_user_by_username))
        .route("/api/user-search", get(api::search_users))
        .route("/api/popular-authors", get(api::popular_authors))
        .route("/api/lists", get(api::list_reading_lists).post(api::create_reading_list))
        .route(
            "/api/lists/:id",
            get(api::get_reading_list)
                .put(api::update_reading_list)
                .delete(api::delete_reading_list),
        )
        .route("/api/lists/:id/stories", get(api::reading_list_stories))
        .route(
            "/api/lists/:id/stories/:story_id",
            put(api::add_story_to_list)
                .get(api::is_story_in_list)
                .delete(api::remove_story_from_list),
        )
        .route("/api/reset", post(api::reset))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|error: BoxError| async move {
                    if error.is::<tower::timeout::error::Elapsed>() {
                        (StatusCode::REQUEST_TIMEOUT, String::new())
                    } else {
                        (StatusCode::SERVICE_UNAVAILABLE, String::new())
                    }
                }))
                .load_shed()
                .concurrency_limit(1024)
                .timeout(Duration::from_secs(10))
                .layer(Extension(services))
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
}

#[derive(Debug)]
pub struct Error(Report);

impl From<Report> for Error {
    fn from(err: Report) -> Self {
        Self(err)
    }
}

impl From<ServiceError> for Error {
    fn from(err: ServiceError) -> Self {
        Self(err.into())
    }
}

impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum_core::response::Response {
        #[derive(serde::Serialize)]
        struct Res {
            error: ResErr,
        }

        #[derive(serde::Serialize)]
        struct ResErr {
            code: u16,
            status: String,
        }

        let err = self.0;

        let status = match err.downcast_ref::<ServiceError>() {
            Some(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(ServiceError::DefaultList) => StatusCode::CONFLICT,
            Some(ServiceError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?err, "error handling request");

            "internal server error".to_string()
        } else {
            tracing::debug!(error = %err, "rejected request");

            err.to_string()
        };

        let body = Res {
            error: ResErr {
                code: status.as_u16(),
                status: message,
            },
        };

        (status, Json(body)).into_response()
    }
}
