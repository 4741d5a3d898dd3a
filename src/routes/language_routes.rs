use axum::{Router, routing::post};
use crate::{AppState, controllers::language_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/language", post(language_controller::post_language))
}
