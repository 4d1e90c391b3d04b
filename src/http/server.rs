use super::handlers;
use super::service::GameService;
use crate::Config;
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;

/// the HTTP surface (spec §4.8), mirroring the teacher's
/// `hosting::Server::run` shape exactly: a `web::Data` app state built
/// once, permissive CORS for the static frontend, request logging, and one
/// route per handler translating `Result<_, Error>` into the status codes
/// enumerated in spec §7 via `Error`'s `ResponseError` impl.
pub struct Server;

impl Server {
    pub async fn run(config: Config) -> std::io::Result<()> {
        let bind_addr = config.bind_addr.clone();
        let state = web::Data::new(GameService::new(config));
        log::info!("starting prefcraft server on {bind_addr}");

        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(state.clone())
                .route("/api/game/start", web::post().to(handlers::start_game))
                .route(
                    "/api/game/{id}/onboarding",
                    web::get().to(handlers::onboarding),
                )
                .route(
                    "/api/game/{id}/onboarding/submit",
                    web::post().to(handlers::submit_onboarding),
                )
                .route(
                    "/api/game/{id}/round/start",
                    web::post().to(handlers::start_round),
                )
                .route(
                    "/api/game/{id}/round/{n}/pick",
                    web::post().to(handlers::submit_pick),
                )
                .route("/api/game/{id}/status", web::get().to(handlers::status))
                .route("/api/game/{id}/summary", web::get().to(handlers::summary))
                .route(
                    "/api/game/leaderboard",
                    web::get().to(handlers::leaderboard),
                )
                .route(
                    "/api/game/player/{name}/history",
                    web::get().to(handlers::player_history),
                )
                .route("/api/debug/pbcf", web::get().to(handlers::debug_pbcf))
        })
        .workers(num_cpus::get())
        .bind(bind_addr)?
        .run()
        .await
    }
}
