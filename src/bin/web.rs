//! Single binary JSON API over the bracket service.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, BRACKET_LOCK_TIMEOUT_MS.

use actix_web::{
    delete, get, post,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use bracket_engine::{
    BracketError, BracketService, BracketType, MatchId, Player, RoundKey, ServerConfig, TeamId,
    TournamentId, TournamentSettings,
};
use serde::{Deserialize, Serialize};

type AppState = Data<BracketService>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct RegisterTeamBody {
    name: String,
    #[serde(default)]
    players: Vec<Player>,
}

#[derive(Deserialize)]
struct DeclareWinnerBody {
    winner: TeamId,
}

#[derive(Deserialize)]
struct NextMatchesQuery {
    limit: Option<usize>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and team id (e.g. /api/tournaments/{id}/teams/{team_id})
#[derive(Deserialize)]
struct TournamentTeamPath {
    id: TournamentId,
    team_id: TeamId,
}

/// Path segments: tournament id, bracket type and round
/// (e.g. /api/tournaments/{id}/rounds/losers/2)
#[derive(Deserialize)]
struct RoundPath {
    id: TournamentId,
    bracket_type: String,
    round: u32,
}

#[derive(Deserialize)]
struct MatchPath {
    match_id: MatchId,
}

#[derive(Serialize)]
struct ActiveRoundResponse {
    active_round: Option<RoundKey>,
}

#[derive(Serialize)]
struct RoundStateResponse {
    round: RoundKey,
    disabled: bool,
}

#[derive(Serialize)]
struct CleanupResponse {
    resolved: usize,
}

/// Map an engine error to a JSON error response.
fn error_response(e: BracketError) -> HttpResponse {
    use BracketError::*;
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentNotFound(_) | MatchNotFound(_) | TeamNotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        InvalidMatchState { .. }
        | AlreadyGenerated(_)
        | InvalidTournamentState { .. }
        | DuplicateTeamName(_) => HttpResponse::Conflict().json(body),
        Contention(_) => {
            log::warn!("{}", e);
            HttpResponse::ServiceUnavailable().json(body)
        }
        Structural { .. } | Poisoned => {
            log::error!("{}", e);
            HttpResponse::InternalServerError().json(body)
        }
        InsufficientTeams { .. }
        | MatchNotReady(_)
        | UnknownTeam { .. }
        | NotOrphaned(_)
        | InvalidTeam(_)
        | InvalidSettings(_)
        | TournamentFull { .. } => HttpResponse::BadRequest().json(body),
    }
}

fn respond<T: Serialize>(result: Result<T, BracketError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "bracket-engine",
    })
}

/// Create a tournament open for registration.
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<TournamentSettings>) -> HttpResponse {
    respond(state.create_tournament(body.into_inner()))
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.tournament(path.id))
}

#[get("/api/tournaments/{id}/teams")]
async fn api_list_teams(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.teams(path.id))
}

/// Register a team (tournament must be in registration).
#[post("/api/tournaments/{id}/teams")]
async fn api_register_team(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<RegisterTeamBody>,
) -> HttpResponse {
    let body = body.into_inner();
    respond(state.register_team(path.id, &body.name, body.players).await)
}

/// Remove a team (tournament must be in registration).
#[delete("/api/tournaments/{id}/teams/{team_id}")]
async fn api_remove_team(state: AppState, path: Path<TournamentTeamPath>) -> HttpResponse {
    match state.remove_team(path.id, path.team_id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(e),
    }
}

/// Generate brackets from the registered teams.
#[post("/api/tournaments/{id}/brackets")]
async fn api_generate_brackets(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.generate_brackets(path.id).await)
}

/// Bracket grouped for display, with per-round lock state.
#[get("/api/tournaments/{id}/brackets")]
async fn api_bracket_view(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.bracket_view(path.id))
}

/// Remove all matches and reopen registration.
#[post("/api/tournaments/{id}/brackets/reset")]
async fn api_reset_brackets(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.reset_brackets(path.id).await)
}

#[get("/api/tournaments/{id}/matches")]
async fn api_list_matches(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.list_matches(path.id))
}

#[get("/api/tournaments/{id}/active-round")]
async fn api_active_round(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(
        state
            .active_round(path.id)
            .map(|active_round| ActiveRoundResponse { active_round }),
    )
}

#[get("/api/tournaments/{id}/rounds/{bracket_type}/{round}")]
async fn api_round_state(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    let bracket_type: BracketType = match path.bracket_type.parse() {
        Ok(t) => t,
        Err(e) => return HttpResponse::BadRequest().json(serde_json::json!({ "error": e })),
    };
    let round = RoundKey {
        bracket_type,
        round_number: path.round,
    };
    respond(
        state
            .is_round_disabled(path.id, round)
            .map(|disabled| RoundStateResponse { round, disabled }),
    )
}

#[get("/api/tournaments/{id}/next-matches")]
async fn api_next_matches(
    state: AppState,
    path: Path<TournamentPath>,
    query: Query<NextMatchesQuery>,
) -> HttpResponse {
    respond(state.next_matches(path.id, query.limit))
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.standings(path.id))
}

/// Resolve every orphaned match in one pass.
#[post("/api/tournaments/{id}/cleanup")]
async fn api_cleanup(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    respond(
        state
            .cleanup_tournament(path.id)
            .await
            .map(|resolved| CleanupResponse { resolved }),
    )
}

#[post("/api/matches/{match_id}/winner")]
async fn api_declare_winner(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<DeclareWinnerBody>,
) -> HttpResponse {
    respond(state.declare_winner(path.match_id, body.winner).await)
}

#[post("/api/matches/{match_id}/advance")]
async fn api_manual_advance(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.manual_advance(path.match_id).await)
}

#[post("/api/matches/{match_id}/start")]
async fn api_start_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    respond(state.start_match(path.match_id).await)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!(
        "Starting server at http://{}:{} (lock timeout {:?})",
        bind.0,
        bind.1,
        config.engine.lock_timeout
    );

    let state = Data::new(BracketService::in_memory(config.engine));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_list_teams)
            .service(api_register_team)
            .service(api_remove_team)
            .service(api_generate_brackets)
            .service(api_bracket_view)
            .service(api_reset_brackets)
            .service(api_list_matches)
            .service(api_active_round)
            .service(api_round_state)
            .service(api_next_matches)
            .service(api_standings)
            .service(api_cleanup)
            .service(api_declare_winner)
            .service(api_manual_advance)
            .service(api_start_match)
    })
    .bind(bind)?
    .run()
    .await
}
