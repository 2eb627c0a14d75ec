use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/teams", team_routes(config))
        .nest("/upload", upload_routes(config))
        .nest("/auth/admin", auth_routes())
        .nest("/admin", admin_routes())
}

fn team_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let register = OpenApiRouter::new()
        .routes(routes!(handlers::registration::register))
        .layer(handlers::registration::registration_body_limit(
            config.upload.max_screenshot_bytes,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::team::check_email_exists))
        .routes(routes!(handlers::team::send_ppt_submission_otp))
        .routes(routes!(handlers::team::verify_ppt_submission_otp))
        .merge(register)
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let presentation = OpenApiRouter::new()
        .routes(routes!(handlers::upload::submit_ppt))
        .layer(handlers::upload::upload_body_limit(
            config.upload.max_presentation_bytes,
        ));
    let screenshot = OpenApiRouter::new()
        .routes(routes!(handlers::upload::upload_payment_screenshot))
        .layer(handlers::upload::upload_body_limit(
            config.upload.max_screenshot_bytes,
        ));

    OpenApiRouter::new()
        .routes(routes!(handlers::upload::check_ppt_status))
        .merge(presentation)
        .merge(screenshot)
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::dashboard))
        .routes(routes!(
            handlers::admin::get_team,
            handlers::admin::delete_team
        ))
        .routes(routes!(handlers::admin::download_ppt))
        .routes(routes!(handlers::admin::get_screenshot))
        .routes(routes!(handlers::admin::update_payment_status))
        .routes(routes!(handlers::admin::send_verification_mail))
        .routes(routes!(handlers::admin::list_submissions))
        .routes(routes!(handlers::admin::review_submission))
        .routes(routes!(handlers::admin::stats))
}
