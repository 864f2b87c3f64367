//! # pb-api
//!
//! The web routing and orchestration layer for PinBoard.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;

use actix_web::web;

pub use error::{ApiError, ApiResult};
pub use handlers::AppState;

/// Configures the board routes. Uploaded media (`/media`) is mounted by the
/// binary, next to these.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::board))
        .route("/pin/{id}", web::get().to(handlers::pin_detail))
        .route("/pin/{id}/like", web::post().to(handlers::toggle_like))
        .route("/pin/{id}/save", web::post().to(handlers::toggle_save))
        .route("/pin/{id}/comments", web::post().to(handlers::add_comment))
        .route("/search", web::post().to(handlers::search))
        .route("/filters/category/{cat}", web::post().to(handlers::filter_category))
        .route("/filters/quick/{name}", web::post().to(handlers::filter_quick))
        .route("/filters/clear", web::post().to(handlers::filter_clear))
        .service(
            web::resource("/upload")
                .route(web::get().to(handlers::upload_open))
                .route(web::post().to(handlers::upload_submit)),
        )
        .route("/upload/autofill", web::post().to(handlers::upload_autofill))
        .route("/upload/close", web::post().to(handlers::upload_close))
        .route("/login", web::post().to(handlers::login))
        .route("/logout", web::post().to(handlers::logout))
        .route("/lang/{code}", web::post().to(handlers::set_language))
        .route("/api/pins", web::get().to(handlers::api_pins))
        .route("/api/viewport", web::post().to(handlers::api_viewport));
}
