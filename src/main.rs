#[macro_use]
extern crate rocket;

mod api;
mod app_state;
mod config;
mod defaults;
mod error;
mod image;
mod model_client;
mod segment;
mod types;

use std::sync::Arc;

use anyhow::Context;
use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use tracing_subscriber::EnvFilter;

use api::{generate_image, health, segment_story, GENERATE_IMAGE_PATH, SEGMENT_PATH};
use app_state::AppState;
use config::RelayConfig;
use model_client::HttpModelClient;

/// 挂好路由，但不管理状态；状态由调用方（fairing 或测试）提供
fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", routes![health, segment_story, generate_image])
        .mount("/", api::post_only_routes(&[SEGMENT_PATH, GENERATE_IMAGE_PATH]))
}

fn load_state(rocket: &Rocket<Build>) -> anyhow::Result<Arc<AppState>> {
    let config = RelayConfig::from_figment(rocket.figment()).context("loading relay config")?;
    let client = HttpModelClient::new().context("building HTTP client")?;

    tracing::info!(
        text_endpoint = %config.text_endpoint,
        image_endpoint = %config.image_endpoint,
        model = %config.text_model,
        timeout_secs = config.timeout_secs,
        "relay configured"
    );
    Ok(AppState::new(config, client))
}

#[launch]
fn rocket() -> _ {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .try_init();

    mount(rocket::build()).attach(AdHoc::try_on_ignite("Relay State", |rocket| async move {
        match load_state(&rocket) {
            Ok(state) => Ok(rocket.manage(state)),
            Err(e) => {
                tracing::error!(error = ?e, "failed to start relay");
                Err(rocket)
            }
        }
    }))
}
