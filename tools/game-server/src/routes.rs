use std::convert::Infallible;

use serde::Serialize;
use shared::prelude::*;
use tracing::warn;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::store::{GameStore, StoreResult};

/// Every endpoint the client calls, plus `GET /health`.
///
/// Failures are always JSON of the form `{"message": "..."}`.
pub fn routes(
    store: GameStore,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // CORS headers for web clients
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"]);

    // GET /games
    let list = warp::path!("games")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(handle_list_games);

    // POST /games
    let create = warp::path!("games")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(handle_create_game);

    // GET /games/{id}
    let game = warp::path!("games" / GameId)
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(handle_game);

    // POST /games/{id}/players
    let join = warp::path!("games" / GameId / "players")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(handle_join_game);

    // PATCH /games/{id}/start/{player_id}
    let start = warp::path!("games" / GameId / "start" / PlayerId)
        .and(warp::patch())
        .and(with_store(store.clone()))
        .and_then(handle_start_game);

    // GET /players/{id}
    let player = warp::path!("players" / PlayerId)
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(handle_player);

    // GET /players/{id}/moves
    let moves = warp::path!("players" / PlayerId / "moves")
        .and(warp::get())
        .and(with_store(store.clone()))
        .and_then(handle_moves);

    // POST /players/{id}/moves
    let submit = warp::path!("players" / PlayerId / "moves")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_store(store.clone()))
        .and_then(handle_submit_move);

    // DELETE /players/{id}
    let leave = warp::path!("players" / PlayerId)
        .and(warp::delete())
        .and(with_store(store))
        .and_then(handle_leave_game);

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    list.or(create)
        .or(game)
        .or(join)
        .or(start)
        .or(player)
        .or(moves)
        .or(submit)
        .or(leave)
        .or(health)
        .with(cors)
        .recover(handle_rejection)
        .with(warp::log("game_server"))
}

fn with_store(store: GameStore) -> impl Filter<Extract = (GameStore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn message(status: StatusCode, message: impl Into<String>) -> Response {
    warp::reply::with_status(warp::reply::json(&Ack::with_message(message)), status).into_response()
}

fn respond<T: Serialize>(result: StoreResult<T>) -> Response {
    match result {
        Ok(body) => warp::reply::json(&body).into_response(),
        Err(e) => {
            warn!("❌ {} {}", e.status.as_u16(), e.message);
            message(e.status, e.message)
        }
    }
}

async fn handle_list_games(store: GameStore) -> Result<Response, Rejection> {
    Ok(respond(Ok(GameList { games: store.list() })))
}

async fn handle_create_game(
    req: CreateGameRequest,
    store: GameStore,
) -> Result<Response, Rejection> {
    Ok(respond(store.create(req).map(|game_id| CreateGameResponse { game_id })))
}

async fn handle_game(game_id: GameId, store: GameStore) -> Result<Response, Rejection> {
    Ok(respond(store.game(game_id)))
}

async fn handle_join_game(
    game_id: GameId,
    req: JoinGameRequest,
    store: GameStore,
) -> Result<Response, Rejection> {
    Ok(respond(
        store
            .join(game_id, &req.player_name)
            .map(|player_id| JoinGameResponse { player_id }),
    ))
}

async fn handle_start_game(
    game_id: GameId,
    player_id: PlayerId,
    store: GameStore,
) -> Result<Response, Rejection> {
    Ok(respond(
        store
            .start(game_id, player_id)
            .map(|()| Ack::with_message("Game started")),
    ))
}

async fn handle_player(player_id: PlayerId, store: GameStore) -> Result<Response, Rejection> {
    Ok(respond(store.player(player_id)))
}

async fn handle_moves(player_id: PlayerId, store: GameStore) -> Result<Response, Rejection> {
    Ok(respond(store.moves(player_id)))
}

async fn handle_submit_move(
    player_id: PlayerId,
    req: MoveRequest,
    store: GameStore,
) -> Result<Response, Rejection> {
    Ok(respond(
        store
            .submit_move(player_id, req)
            .map(|()| Ack::with_message("Move accepted")),
    ))
}

async fn handle_leave_game(player_id: PlayerId, store: GameStore) -> Result<Response, Rejection> {
    Ok(respond(
        store
            .leave(player_id)
            .map(|()| Ack::with_message("Player removed")),
    ))
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let reply = if err.is_not_found() {
        message(StatusCode::NOT_FOUND, "Not found")
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        message(StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        warn!("Unhandled rejection: {:?}", err);
        message(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
    };
    Ok(reply)
}
