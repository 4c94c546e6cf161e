//! Request dispatch for the REST API
//!
//! `dispatch` is synchronous: it runs on a blocking thread next to the
//! database and never touches sockets, so handlers are tested directly.

use crate::response::{self, SESSION_COOKIE};
use crate::router::{Endpoint, RecordKind, RouteError, Router, RouterError};
use chrono::{DateTime, Duration, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response, StatusCode};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use slotqa_core::{
    compute_stats, BugUpdate, CategoryId, Catalog, Checklist, ChecklistStats, ChecklistStatus,
    FunctionalTestUpdate, Game, GameId, GameRename, ItemId, ItemUpdate, NewBug,
    NewFunctionalTest, NewGame, NewRegressionTest, NewUser, RegressionTestUpdate, User,
};
use slotqa_db::Store;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Shared state behind every request
pub struct AppState {
    pub store: Store,
    pub catalog: Catalog,
    pub router: Router,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(store: Store, catalog: Catalog, session_ttl: Duration) -> Result<Self, RouterError> {
        Ok(Self {
            store,
            catalog,
            router: Router::new()?,
            session_ttl,
        })
    }
}

/// A fully read HTTP request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Raw `Cookie` header
    pub cookie: Option<String>,
    pub body: Bytes,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            cookie: None,
            body: Bytes::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    fn session_token(&self) -> Option<&str> {
        self.cookie.as_deref().and_then(response::session_token)
    }

    fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        if self.body.is_empty() {
            return Err(ApiError::BadRequest("missing JSON body".to_string()));
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// `?status=` equality filter
    fn status_filter<S>(&self) -> Result<Option<S>, ApiError>
    where
        S: FromStr<Err = slotqa_core::Error>,
    {
        let Some(query) = self.query.as_deref() else {
            return Ok(None);
        };
        let value = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == "status")
            .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned());
        match value {
            Some(value) if !value.is_empty() => Ok(Some(value.parse()?)),
            _ => Ok(None),
        }
    }
}

/// Change to the session cookie carried by a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieChange {
    Set { token: String, max_age: i64 },
    Clear,
}

/// Handler output, converted to hyper at the edge
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<serde_json::Value>,
    pub cookie: Option<CookieChange>,
}

impl ApiResponse {
    fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_value(value)
            .map_err(|e| ApiError::Internal(format!("failed to encode response: {}", e)))?;
        Ok(Self {
            status,
            body: Some(body),
            cookie: None,
        })
    }

    fn ok<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        Self::json(StatusCode::OK, value)
    }

    fn created<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        Self::json(StatusCode::CREATED, value)
    }

    fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: None,
            cookie: None,
        }
    }

    fn error(err: &ApiError) -> Self {
        Self {
            status: err.status(),
            body: Some(serde_json::json!({ "error": err.to_string() })),
            cookie: None,
        }
    }

    fn with_cookie(mut self, cookie: CookieChange) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let response = match &self.body {
            Some(body) => response::json(self.status, body),
            None => {
                let mut response = response::no_content();
                *response.status_mut() = self.status;
                response
            }
        };
        match self.cookie {
            Some(CookieChange::Set { token, max_age }) => {
                response::with_session_cookie(response, Some((&token, max_age)))
            }
            Some(CookieChange::Clear) => response::with_session_cookie(response, None),
            None => response,
        }
    }
}

/// API errors and their HTTP status
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Conflict(String),
    /// The store failed; nothing was committed
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<slotqa_core::Error> for ApiError {
    fn from(err: slotqa_core::Error) -> Self {
        use slotqa_core::Error as E;
        match err {
            E::Validation(msg) => ApiError::BadRequest(msg),
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<slotqa_db::Error> for ApiError {
    fn from(err: slotqa_db::Error) -> Self {
        use slotqa_db::Error as E;
        match err {
            E::NotFound { .. } => ApiError::NotFound(err.to_string()),
            E::DuplicateKey(_) => ApiError::Conflict(err.to_string()),
            E::Unauthorized(msg) => ApiError::Unauthorized(msg),
            E::Core(e) => e.into(),
            E::CorruptRow(_) => ApiError::Internal(err.to_string()),
            E::Database(_) | E::Io(_) => ApiError::Unavailable(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("invalid JSON: {}", err))
    }
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::NotFound => ApiError::NotFound(err.to_string()),
            RouteError::MethodNotAllowed => ApiError::MethodNotAllowed,
        }
    }
}

type ApiResult = Result<ApiResponse, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionStatus {
    status: ChecklistStatus,
}

#[derive(Debug, Serialize)]
struct GameView {
    #[serde(flatten)]
    game: Game,
    stats: ChecklistStats,
}

#[derive(Debug, Serialize)]
struct GameDetail {
    #[serde(flatten)]
    game: Game,
    checklist: Checklist,
    stats: ChecklistStats,
}

#[derive(Debug, Serialize)]
struct ChecklistView {
    game_id: GameId,
    checklist: Checklist,
    stats: ChecklistStats,
}

impl ChecklistView {
    fn new(game_id: GameId, checklist: Checklist) -> Self {
        let stats = compute_stats(&checklist);
        Self {
            game_id,
            checklist,
            stats,
        }
    }
}

/// Handle one request
pub fn dispatch(state: &AppState, request: &ApiRequest) -> ApiResponse {
    let now = Utc::now();
    match handle(state, request, now) {
        Ok(response) => {
            debug!(method = %request.method, path = %request.path, status = %response.status, "handled request");
            response
        }
        Err(err) => {
            let status = err.status();
            if status.is_server_error() {
                warn!(method = %request.method, path = %request.path, error = %err, "request failed");
            } else {
                debug!(method = %request.method, path = %request.path, %status, error = %err, "request rejected");
            }
            ApiResponse::error(&err)
        }
    }
}

fn handle(state: &AppState, request: &ApiRequest, now: DateTime<Utc>) -> ApiResult {
    let matched = state.router.route(&request.method, &request.path)?;
    let caps = &matched.captures;

    // Signing in and out are the only routes open without a session
    let user = match matched.endpoint {
        Endpoint::Login => return login(state, request, now),
        Endpoint::Logout => return logout(state, request),
        _ => authenticate(state, request, now)?,
    };

    match matched.endpoint {
        Endpoint::Login => login(state, request, now),
        Endpoint::Logout => logout(state, request),
        Endpoint::Me => ApiResponse::ok(&user),

        Endpoint::ListPackages => ApiResponse::ok(&state.catalog.summaries()),
        Endpoint::GetPackage => ApiResponse::ok(state.catalog.require(&caps[0])?),

        Endpoint::ListUsers => {
            require_user_admin(&user)?;
            ApiResponse::ok(&state.store.users()?)
        }
        Endpoint::CreateUser => {
            require_user_admin(&user)?;
            let new: NewUser = request.json()?;
            let created = state.store.create_user(&new, now)?;
            ApiResponse::created(&created)
        }
        Endpoint::DeleteUser => {
            require_user_admin(&user)?;
            if caps[0] == user.username {
                return Err(ApiError::BadRequest(
                    "cannot delete your own account".to_string(),
                ));
            }
            state.store.delete_user(&caps[0])?;
            Ok(ApiResponse::no_content())
        }

        Endpoint::ListGames => {
            let views = state
                .store
                .games()?
                .into_iter()
                .map(|game| {
                    let stats = compute_stats(&state.store.checklist(game.id)?);
                    Ok(GameView { game, stats })
                })
                .collect::<Result<Vec<_>, ApiError>>()?;
            ApiResponse::ok(&views)
        }
        Endpoint::CreateGame => {
            let new: NewGame = request.json()?;
            let (game, checklist) = state.store.create_game(&state.catalog, &new, now)?;
            let stats = compute_stats(&checklist);
            ApiResponse::created(&GameDetail {
                game,
                checklist,
                stats,
            })
        }
        Endpoint::GetGame => {
            let game = state.store.game(game_id(&caps[0])?)?;
            let stats = compute_stats(&state.store.checklist(game.id)?);
            ApiResponse::ok(&GameView { game, stats })
        }
        Endpoint::RenameGame => {
            let rename: GameRename = request.json()?;
            let game = state.store.rename_game(game_id(&caps[0])?, &rename.name)?;
            let stats = compute_stats(&state.store.checklist(game.id)?);
            ApiResponse::ok(&GameView { game, stats })
        }
        Endpoint::DeleteGame => {
            require_delete(&user)?;
            state.store.delete_game(game_id(&caps[0])?)?;
            Ok(ApiResponse::no_content())
        }

        Endpoint::GetChecklist => {
            let id = game_id(&caps[0])?;
            ApiResponse::ok(&ChecklistView::new(id, state.store.checklist(id)?))
        }
        Endpoint::GetStats => {
            let id = game_id(&caps[0])?;
            ApiResponse::ok(&compute_stats(&state.store.checklist(id)?))
        }
        Endpoint::UpdateItem => {
            let id = game_id(&caps[0])?;
            let update: ItemUpdate = request.json()?;
            if update.is_empty() {
                return Err(ApiError::BadRequest("update has no fields".to_string()));
            }
            let category = CategoryId::new(caps[1].clone());
            let item = ItemId::new(caps[2].clone());
            let checklist = state
                .store
                .update_checklist_item(id, &category, &item, &update)?;
            info!(game = %id, %category, %item, user = %user.username, "checklist item updated");
            ApiResponse::ok(&ChecklistView::new(id, checklist))
        }
        Endpoint::UpdateSection => {
            let id = game_id(&caps[0])?;
            let body: SectionStatus = request.json()?;
            let category = CategoryId::new(caps[1].clone());
            let checklist = state
                .store
                .update_section_status(id, &category, body.status)?;
            info!(game = %id, %category, status = %body.status, user = %user.username, "checklist section updated");
            ApiResponse::ok(&ChecklistView::new(id, checklist))
        }

        Endpoint::ListRecords(kind) => list_records(state, request, kind, game_id(&caps[0])?),
        Endpoint::CreateRecord(kind) => {
            create_record(state, request, &user, kind, game_id(&caps[0])?, now)
        }
        Endpoint::GetRecord(kind) => get_record(state, kind, record_id(&caps[0])?),
        Endpoint::UpdateRecord(kind) => {
            update_record(state, request, kind, record_id(&caps[0])?, now)
        }
        Endpoint::DeleteRecord(kind) => {
            require_delete(&user)?;
            let id = record_id(&caps[0])?;
            match kind {
                RecordKind::Bug => state.store.delete_bug(id)?,
                RecordKind::FunctionalTest => state.store.delete_functional_test(id)?,
                RecordKind::RegressionTest => state.store.delete_regression_test(id)?,
            }
            Ok(ApiResponse::no_content())
        }
    }
}

fn login(state: &AppState, request: &ApiRequest, now: DateTime<Utc>) -> ApiResult {
    let credentials: Credentials = request.json()?;
    let user = state
        .store
        .verify_credentials(&credentials.username, &credentials.password)?;
    let session = state
        .store
        .create_session(&user.username, state.session_ttl, now)?;
    info!(username = %user.username, "signed in");
    Ok(ApiResponse::ok(&user)?.with_cookie(CookieChange::Set {
        token: session.token,
        max_age: state.session_ttl.num_seconds(),
    }))
}

fn logout(state: &AppState, request: &ApiRequest) -> ApiResult {
    if let Some(token) = request.session_token() {
        state.store.delete_session(token)?;
    }
    Ok(ApiResponse::no_content().with_cookie(CookieChange::Clear))
}

fn authenticate(state: &AppState, request: &ApiRequest, now: DateTime<Utc>) -> Result<User, ApiError> {
    let unauthorized = || ApiError::Unauthorized(format!("sign in required ({} cookie)", SESSION_COOKIE));
    let token = request.session_token().ok_or_else(unauthorized)?;
    let session = state.store.session(token, now)?.ok_or_else(unauthorized)?;
    match state.store.user(&session.username) {
        Ok(user) => Ok(user),
        Err(e) if e.is_not_found() => Err(unauthorized()),
        Err(e) => Err(e.into()),
    }
}

fn require_user_admin(user: &User) -> Result<(), ApiError> {
    if user.role.can_manage_users() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin role required".to_string()))
    }
}

fn require_delete(user: &User) -> Result<(), ApiError> {
    if user.role.can_delete() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin or lead role required".to_string()))
    }
}

fn game_id(raw: &str) -> Result<GameId, ApiError> {
    raw.parse()
        .map(GameId::new)
        .map_err(|_| ApiError::NotFound(format!("Game not found: {}", raw)))
}

fn record_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("Record not found: {}", raw)))
}

fn list_records(state: &AppState, request: &ApiRequest, kind: RecordKind, game: GameId) -> ApiResult {
    match kind {
        RecordKind::Bug => ApiResponse::ok(&state.store.bugs(game, request.status_filter()?)?),
        RecordKind::FunctionalTest => {
            ApiResponse::ok(&state.store.functional_tests(game, request.status_filter()?)?)
        }
        RecordKind::RegressionTest => {
            ApiResponse::ok(&state.store.regression_tests(game, request.status_filter()?)?)
        }
    }
}

fn create_record(
    state: &AppState,
    request: &ApiRequest,
    user: &User,
    kind: RecordKind,
    game: GameId,
    now: DateTime<Utc>,
) -> ApiResult {
    let author = &user.username;
    match kind {
        RecordKind::Bug => {
            let new: NewBug = request.json()?;
            ApiResponse::created(&state.store.create_bug(game, &new, author, now)?)
        }
        RecordKind::FunctionalTest => {
            let new: NewFunctionalTest = request.json()?;
            ApiResponse::created(&state.store.create_functional_test(game, &new, author, now)?)
        }
        RecordKind::RegressionTest => {
            let new: NewRegressionTest = request.json()?;
            ApiResponse::created(&state.store.create_regression_test(game, &new, author, now)?)
        }
    }
}

fn get_record(state: &AppState, kind: RecordKind, id: u64) -> ApiResult {
    match kind {
        RecordKind::Bug => ApiResponse::ok(&state.store.bug(id)?),
        RecordKind::FunctionalTest => ApiResponse::ok(&state.store.functional_test(id)?),
        RecordKind::RegressionTest => ApiResponse::ok(&state.store.regression_test(id)?),
    }
}

fn update_record(
    state: &AppState,
    request: &ApiRequest,
    kind: RecordKind,
    id: u64,
    now: DateTime<Utc>,
) -> ApiResult {
    match kind {
        RecordKind::Bug => {
            let update: BugUpdate = request.json()?;
            ApiResponse::ok(&state.store.update_bug(id, &update, now)?)
        }
        RecordKind::FunctionalTest => {
            let update: FunctionalTestUpdate = request.json()?;
            ApiResponse::ok(&state.store.update_functional_test(id, &update, now)?)
        }
        RecordKind::RegressionTest => {
            let update: RegressionTestUpdate = request.json()?;
            ApiResponse::ok(&state.store.update_regression_test(id, &update, now)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use slotqa_core::Role;

    fn state() -> AppState {
        let store = Store::in_memory().unwrap();
        store
            .ensure_admin("admin", "changeme123", Utc::now())
            .unwrap();
        AppState::new(store, Catalog::builtin().unwrap(), Duration::hours(1)).unwrap()
    }

    fn login_as(state: &AppState, username: &str, password: &str) -> String {
        let request = ApiRequest::new(Method::POST, "/api/auth/login")
            .with_body(json!({ "username": username, "password": password }).to_string());
        let response = dispatch(state, &request);
        assert_eq!(response.status, StatusCode::OK);
        match response.cookie {
            Some(CookieChange::Set { token, .. }) => format!("{}={}", SESSION_COOKIE, token),
            other => panic!("expected session cookie, got {:?}", other),
        }
    }

    fn call(state: &AppState, cookie: &str, method: Method, path: &str, body: Option<Value>) -> ApiResponse {
        let mut request = ApiRequest::new(method, path).with_cookie(cookie);
        if let Some(body) = body {
            request = request.with_body(body.to_string());
        }
        dispatch(state, &request)
    }

    fn create_game(state: &AppState, cookie: &str) -> u64 {
        let response = call(
            state,
            cookie,
            Method::POST,
            "/api/games",
            Some(json!({ "name": "Lucky Bells", "package_id": "package2" })),
        );
        assert_eq!(response.status, StatusCode::CREATED);
        response.body.unwrap()["id"].as_u64().unwrap()
    }

    fn add_user(state: &AppState, cookie: &str, username: &str, role: Role) {
        let response = call(
            state,
            cookie,
            Method::POST,
            "/api/users",
            Some(json!({ "username": username, "password": "password123", "role": role.as_str() })),
        );
        assert_eq!(response.status, StatusCode::CREATED);
    }

    #[test]
    fn test_requires_session() {
        let state = state();
        let response = dispatch(&state, &ApiRequest::new(Method::GET, "/api/games"));
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);

        let response = call(&state, "slotqa_session=bogus", Method::GET, "/api/games", None);
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bad_login() {
        let state = state();
        let request = ApiRequest::new(Method::POST, "/api/auth/login")
            .with_body(json!({ "username": "admin", "password": "wrongpass" }).to_string());
        assert_eq!(dispatch(&state, &request).status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_me_and_logout() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let me = call(&state, &cookie, Method::GET, "/api/auth/me", None);
        assert_eq!(me.body.unwrap()["role"], "admin");

        let out = call(&state, &cookie, Method::POST, "/api/auth/logout", None);
        assert_eq!(out.status, StatusCode::NO_CONTENT);
        assert_eq!(out.cookie, Some(CookieChange::Clear));
        let me = call(&state, &cookie, Method::GET, "/api/auth/me", None);
        assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_logout_without_session() {
        let state = state();
        let out = dispatch(&state, &ApiRequest::new(Method::POST, "/api/auth/logout"));
        assert_eq!(out.status, StatusCode::NO_CONTENT);
        assert_eq!(out.cookie, Some(CookieChange::Clear));

        let out = call(&state, "slotqa_session=bogus", Method::POST, "/api/auth/logout", None);
        assert_eq!(out.status, StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_corrupt_stored_row_is_server_error() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let id = GameId::new(create_game(&state, &cookie));

        let mut records = state.store.checklist(id).unwrap().flatten(id);
        records.truncate(1);
        records[0].status = "bogus".to_string();
        state.store.save_checklist_records(&records).unwrap();

        let path = format!("/api/games/{}/checklist", id.raw());
        let response = call(&state, &cookie, Method::GET, &path, None);
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

        // A bad request body is still the caller's fault
        let body = json!({ "name": "  ", "package_id": "package2" });
        let response = call(&state, &cookie, Method::POST, "/api/games", Some(body));
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_packages() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let list = call(&state, &cookie, Method::GET, "/api/packages", None);
        assert_eq!(list.body.unwrap().as_array().unwrap().len(), 4);

        let one = call(&state, &cookie, Method::GET, "/api/packages/package2", None);
        assert_eq!(one.body.unwrap()["paylines"], 20);

        let missing = call(&state, &cookie, Method::GET, "/api/packages/package9", None);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_create_game_returns_checklist() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let response = call(
            &state,
            &cookie,
            Method::POST,
            "/api/games",
            Some(json!({ "name": "Lucky Bells", "package_id": "package2" })),
        );
        assert_eq!(response.status, StatusCode::CREATED);
        let body = response.body.unwrap();
        assert_eq!(body["stats"]["total"], 42);
        assert_eq!(body["stats"]["overall_percent"], 0);
        assert_eq!(body["stats"]["per_status"]["unchecked"], 42);
        assert!(body["checklist"]["paytable"].is_array());
    }

    #[test]
    fn test_create_game_unknown_package() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let response = call(
            &state,
            &cookie,
            Method::POST,
            "/api/games",
            Some(json!({ "name": "Ghost", "package_id": "package9" })),
        );
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let games = call(&state, &cookie, Method::GET, "/api/games", None);
        assert!(games.body.unwrap().as_array().unwrap().is_empty());
    }

    #[test]
    fn test_rename_cannot_change_package() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let id = create_game(&state, &cookie);
        let path = format!("/api/games/{}", id);

        let response = call(
            &state,
            &cookie,
            Method::PATCH,
            &path,
            Some(json!({ "name": "Renamed", "package_id": "package1" })),
        );
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let response = call(&state, &cookie, Method::PATCH, &path, Some(json!({ "name": "Renamed" })));
        assert_eq!(response.status, StatusCode::OK);
        let body = response.body.unwrap();
        assert_eq!(body["name"], "Renamed");
        assert_eq!(body["package_id"], "package2");
    }

    #[test]
    fn test_update_item_resyncs() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let id = create_game(&state, &cookie);

        let response = call(
            &state,
            &cookie,
            Method::PATCH,
            &format!("/api/games/{}/checklist/paytable/paytable-01", id),
            Some(json!({ "status": "done", "evidence": "https://evidence.example/pt1" })),
        );
        assert_eq!(response.status, StatusCode::OK);
        let body = response.body.unwrap();
        assert_eq!(body["stats"]["per_category"]["paytable"]["done"], 1);
        assert_eq!(body["stats"]["overall_percent"], 2);
        assert_eq!(body["checklist"]["paytable"][0]["status"], "done");

        let stats = call(&state, &cookie, Method::GET, &format!("/api/games/{}/stats", id), None);
        assert_eq!(stats.body.unwrap()["done"], 1);
    }

    #[test]
    fn test_update_item_errors() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let id = create_game(&state, &cookie);

        let wrong_section = call(
            &state,
            &cookie,
            Method::PATCH,
            &format!("/api/games/{}/checklist/paytable/bonus-01", id),
            Some(json!({ "status": "done" })),
        );
        assert_eq!(wrong_section.status, StatusCode::NOT_FOUND);

        let bad_status = call(
            &state,
            &cookie,
            Method::PATCH,
            &format!("/api/games/{}/checklist/paytable/paytable-01", id),
            Some(json!({ "status": "finished" })),
        );
        assert_eq!(bad_status.status, StatusCode::BAD_REQUEST);

        let empty = call(
            &state,
            &cookie,
            Method::PATCH,
            &format!("/api/games/{}/checklist/paytable/paytable-01", id),
            Some(json!({})),
        );
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);

        let no_game = call(
            &state,
            &cookie,
            Method::PATCH,
            "/api/games/999/checklist/paytable/paytable-01",
            Some(json!({ "status": "done" })),
        );
        assert_eq!(no_game.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_section_status() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let id = create_game(&state, &cookie);
        let response = call(
            &state,
            &cookie,
            Method::PUT,
            &format!("/api/games/{}/checklist/compliance/status", id),
            Some(json!({ "status": "done" })),
        );
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.body.unwrap()["stats"]["per_category"]["compliance"]["percent"],
            100
        );
    }

    #[test]
    fn test_bug_crud_and_filter() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let id = create_game(&state, &cookie);
        let bugs = format!("/api/games/{}/bugs", id);

        let created = call(&state, &cookie, Method::POST, &bugs, Some(json!({ "title": "Wild misaligned" })));
        assert_eq!(created.status, StatusCode::CREATED);
        let body = created.body.unwrap();
        assert_eq!(body["severity"], "medium");
        assert_eq!(body["reporter"], "admin");
        let bug_id = body["id"].as_u64().unwrap();

        let updated = call(
            &state,
            &cookie,
            Method::PATCH,
            &format!("/api/bugs/{}", bug_id),
            Some(json!({ "status": "resolved" })),
        );
        assert_eq!(updated.body.unwrap()["status"], "resolved");

        let open = dispatch(
            &state,
            &ApiRequest::new(Method::GET, bugs.as_str())
                .with_cookie(cookie.as_str())
                .with_query("status=open"),
        );
        assert!(open.body.unwrap().as_array().unwrap().is_empty());

        let bad = dispatch(
            &state,
            &ApiRequest::new(Method::GET, bugs.as_str())
                .with_cookie(cookie.as_str())
                .with_query("status=sleeping"),
        );
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let deleted = call(&state, &cookie, Method::DELETE, &format!("/api/bugs/{}", bug_id), None);
        assert_eq!(deleted.status, StatusCode::NO_CONTENT);
        let gone = call(&state, &cookie, Method::GET, &format!("/api/bugs/{}", bug_id), None);
        assert_eq!(gone.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_regression_tests() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let id = create_game(&state, &cookie);
        let created = call(
            &state,
            &cookie,
            Method::POST,
            &format!("/api/games/{}/regression-tests", id),
            Some(json!({ "name": "Paytable values", "build_version": "1.2.0" })),
        );
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body.unwrap()["status"], "not-run");
    }

    #[test]
    fn test_tester_permissions() {
        let state = state();
        let admin = login_as(&state, "admin", "changeme123");
        add_user(&state, &admin, "tina", Role::Tester);
        let id = create_game(&state, &admin);

        let tester = login_as(&state, "tina", "password123");
        let users = call(&state, &tester, Method::GET, "/api/users", None);
        assert_eq!(users.status, StatusCode::FORBIDDEN);

        let delete = call(&state, &tester, Method::DELETE, &format!("/api/games/{}", id), None);
        assert_eq!(delete.status, StatusCode::FORBIDDEN);

        let edit = call(
            &state,
            &tester,
            Method::PATCH,
            &format!("/api/games/{}/checklist/reels/reels-01", id),
            Some(json!({ "status": "checking" })),
        );
        assert_eq!(edit.status, StatusCode::OK);
    }

    #[test]
    fn test_lead_can_delete_game() {
        let state = state();
        let admin = login_as(&state, "admin", "changeme123");
        add_user(&state, &admin, "lee", Role::Lead);
        let id = create_game(&state, &admin);

        let lead = login_as(&state, "lee", "password123");
        let delete = call(&state, &lead, Method::DELETE, &format!("/api/games/{}", id), None);
        assert_eq!(delete.status, StatusCode::NO_CONTENT);
        let get = call(&state, &lead, Method::GET, &format!("/api/games/{}", id), None);
        assert_eq!(get.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_user_management() {
        let state = state();
        let admin = login_as(&state, "admin", "changeme123");
        add_user(&state, &admin, "tina", Role::Tester);

        let duplicate = call(
            &state,
            &admin,
            Method::POST,
            "/api/users",
            Some(json!({ "username": "tina", "password": "password123", "role": "tester" })),
        );
        assert_eq!(duplicate.status, StatusCode::CONFLICT);

        let myself = call(&state, &admin, Method::DELETE, "/api/users/admin", None);
        assert_eq!(myself.status, StatusCode::BAD_REQUEST);

        let removed = call(&state, &admin, Method::DELETE, "/api/users/tina", None);
        assert_eq!(removed.status, StatusCode::NO_CONTENT);
        let users = call(&state, &admin, Method::GET, "/api/users", None);
        assert_eq!(users.body.unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_json_and_routes() {
        let state = state();
        let cookie = login_as(&state, "admin", "changeme123");
        let request = ApiRequest::new(Method::POST, "/api/games")
            .with_cookie(cookie.as_str())
            .with_body("{not json");
        assert_eq!(dispatch(&state, &request).status, StatusCode::BAD_REQUEST);

        let missing = call(&state, &cookie, Method::GET, "/api/nothing", None);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        let wrong = call(&state, &cookie, Method::PUT, "/api/games", None);
        assert_eq!(wrong.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_into_response_sets_cookie() {
        let response = ApiResponse::no_content()
            .with_cookie(CookieChange::Set {
                token: "abc".to_string(),
                max_age: 60,
            })
            .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().contains_key(hyper::header::SET_COOKIE));
    }
}
