//! prefcraft HTTP server binary.
//!
//! Runs the preference-duel game API: onboarding, rounds, scoring, and
//! post-game analytics over an in-process catalog and session store.

use prefcraft::http::Server;
use prefcraft::Config;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    prefcraft::init();
    let config = Config::from_env();
    Server::run(config).await
}
