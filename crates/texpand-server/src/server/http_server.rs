//! HTTP server implementation for the texpand control-plane API.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use warp::Filter;

use texpand_core::{Result, TexpandError};

use crate::api::{
    daemon_details_handler, delete_handler, get_abbreviation_handler, ignore_handler,
    list_handler, rename_handler, upsert_handler, DeleteRequest, GetRequest, IgnoreRequest,
    RenameRequest, SharedEngine, UpsertRequest,
};
use crate::server::utils::save_api_port;

fn with_engine(
    engine: SharedEngine,
) -> impl Filter<Extract = (SharedEngine,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&engine))
}

/// Start the HTTP API server on the specified port. Runs until a shutdown
/// signal arrives; all mutation routes go through the shared engine, so a
/// response means the edit is persisted and the listener set is current.
pub async fn start_api_server(engine: SharedEngine, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    // Save the port so the CLI and editor can find us later
    save_api_port(port)?;

    println!("texpand API server listening on http://localhost:{}", port);

    // CORS for the editor UI during development
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Content-Type"])
        .allow_methods(vec!["GET", "POST", "DELETE", "PUT"]);

    let list_route = warp::path!("api" / "abbreviations")
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .map(|engine: SharedEngine| warp::reply::json(&list_handler(&engine)));

    let get_route = warp::path!("api" / "abbreviation")
        .and(warp::get())
        .and(warp::query::<GetRequest>())
        .and(with_engine(engine.clone()))
        .map(|query: GetRequest, engine: SharedEngine| {
            warp::reply::json(&get_abbreviation_handler(&engine, &query.source))
        });

    let upsert_route = warp::path!("api" / "abbreviations")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_engine(engine.clone()))
        .map(|body: UpsertRequest, engine: SharedEngine| {
            warp::reply::json(&upsert_handler(&engine, body))
        });

    let rename_route = warp::path!("api" / "abbreviations")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_engine(engine.clone()))
        .map(|body: RenameRequest, engine: SharedEngine| {
            warp::reply::json(&rename_handler(&engine, body))
        });

    let delete_route = warp::path!("api" / "abbreviations")
        .and(warp::delete())
        .and(warp::query::<DeleteRequest>())
        .and(with_engine(engine.clone()))
        .map(|query: DeleteRequest, engine: SharedEngine| {
            warp::reply::json(&delete_handler(&engine, &query.source))
        });

    let ignore_route = warp::path!("api" / "abbreviations" / "ignore")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_engine(engine.clone()))
        .map(|body: IgnoreRequest, engine: SharedEngine| {
            warp::reply::json(&ignore_handler(&engine, body))
        });

    let daemon_details_route = warp::path!("api" / "daemon" / "details")
        .and(warp::get())
        .and(with_engine(engine.clone()))
        .map(move |engine: SharedEngine| {
            warp::reply::json(&daemon_details_handler(&engine, port))
        });

    let health_route = warp::path!("health").map(|| "texpand API is running");

    let routes = list_route
        .or(get_route)
        .or(upsert_route)
        .or(rename_route)
        .or(delete_route)
        .or(ignore_route)
        .or(daemon_details_route)
        .or(health_route)
        .with(cors);

    let server = warp::serve(routes).try_bind_with_graceful_shutdown(addr, async {
        tokio::signal::ctrl_c().await.ok();
        println!("Received shutdown signal, stopping API server...");
    });

    match server {
        Ok((addr, server)) => {
            println!("API server started successfully on {}", addr);
            server.await;
            Ok(())
        }
        Err(e) => Err(TexpandError::Other(format!(
            "Failed to bind to port {}: {}",
            port, e
        ))),
    }
}
