mod config;
mod error;
mod services;
mod state;
mod store;

use crate::config::Config;
use crate::state::AppState;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use env_logger::Env;
use include_dir::{include_dir, Dir};
use log::{info, warn};
use mime_guess::from_path;
use std::fs;
use std::thread;
use std::time::Duration;

static UI_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/ui");

async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let path = req.path().trim_start_matches('/');
    let file_path = if path.is_empty() { "index.html" } else { path };

    match UI_DIR.get_file(file_path) {
        Some(file) => {
            let mime = from_path(file_path).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(file.contents().to_vec())
        }
        None => match UI_DIR.get_file("index.html") {
            Some(index) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(index.contents().to_vec()),
            None => HttpResponse::NotFound().body("Not Found"),
        },
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;
    fs::create_dir_all(&config.storage.upload_dir)?;

    let state = AppState::new(&config);
    state.store.init().map_err(std::io::Error::other)?;
    info!(
        "roster database at {}, photos under {}",
        state.store.path().display(),
        config.storage.upload_dir.display()
    );

    let host = config.server.host.clone();
    let port = config.server.port;
    let url = format!("http://{}:{}", host, port);

    if config.server.open_browser {
        let url_clone = url.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(500));
            if let Err(e) = webbrowser::open(&url_clone) {
                warn!("could not open browser: {}", e);
            }
        });
    }

    info!("Server running at {}", url);

    let storage = config.storage.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .service(services::servidores::configure_routes())
            .service(services::selection::configure_routes())
            .service(services::annex::configure_routes())
            .service(services::uploaded_photos(&storage))
            .default_service(web::route().to(serve_embedded))
    })
    .bind((host, port))?
    .run()
    .await
}
