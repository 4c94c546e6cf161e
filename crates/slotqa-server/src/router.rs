//! Request router with a regex route table

use hyper::Method;
use percent_encoding::percent_decode_str;
use regex::Regex;
use thiserror::Error;

/// Per-game record collections sharing one CRUD shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Bug,
    FunctionalTest,
    RegressionTest,
}

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [
        RecordKind::Bug,
        RecordKind::FunctionalTest,
        RecordKind::RegressionTest,
    ];

    /// URL segment
    pub fn segment(&self) -> &'static str {
        match self {
            RecordKind::Bug => "bugs",
            RecordKind::FunctionalTest => "functional-tests",
            RecordKind::RegressionTest => "regression-tests",
        }
    }
}

/// What a matched route does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ListPackages,
    GetPackage,
    Login,
    Logout,
    Me,
    ListUsers,
    CreateUser,
    DeleteUser,
    ListGames,
    CreateGame,
    GetGame,
    RenameGame,
    DeleteGame,
    GetChecklist,
    GetStats,
    UpdateItem,
    UpdateSection,
    ListRecords(RecordKind),
    CreateRecord(RecordKind),
    GetRecord(RecordKind),
    UpdateRecord(RecordKind),
    DeleteRecord(RecordKind),
}

struct Route {
    method: Method,
    pattern: Regex,
    endpoint: Endpoint,
}

/// Result of routing a request
#[derive(Debug, PartialEq)]
pub struct RouteMatch {
    pub endpoint: Endpoint,
    /// Percent-decoded capture groups, in pattern order
    pub captures: Vec<String>,
}

/// Router for matching requests to endpoints
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile the route table
    pub fn new() -> Result<Self, RouterError> {
        let mut table: Vec<(Method, String, Endpoint)> = vec![
            (Method::GET, r"^/api/packages$".into(), Endpoint::ListPackages),
            (Method::GET, r"^/api/packages/([^/]+)$".into(), Endpoint::GetPackage),
            (Method::POST, r"^/api/auth/login$".into(), Endpoint::Login),
            (Method::POST, r"^/api/auth/logout$".into(), Endpoint::Logout),
            (Method::GET, r"^/api/auth/me$".into(), Endpoint::Me),
            (Method::GET, r"^/api/users$".into(), Endpoint::ListUsers),
            (Method::POST, r"^/api/users$".into(), Endpoint::CreateUser),
            (Method::DELETE, r"^/api/users/([^/]+)$".into(), Endpoint::DeleteUser),
            (Method::GET, r"^/api/games$".into(), Endpoint::ListGames),
            (Method::POST, r"^/api/games$".into(), Endpoint::CreateGame),
            (Method::GET, r"^/api/games/(\d+)$".into(), Endpoint::GetGame),
            (Method::PATCH, r"^/api/games/(\d+)$".into(), Endpoint::RenameGame),
            (Method::DELETE, r"^/api/games/(\d+)$".into(), Endpoint::DeleteGame),
            (Method::GET, r"^/api/games/(\d+)/checklist$".into(), Endpoint::GetChecklist),
            (Method::GET, r"^/api/games/(\d+)/stats$".into(), Endpoint::GetStats),
            (
                Method::PUT,
                r"^/api/games/(\d+)/checklist/([^/]+)/status$".into(),
                Endpoint::UpdateSection,
            ),
            (
                Method::PATCH,
                r"^/api/games/(\d+)/checklist/([^/]+)/([^/]+)$".into(),
                Endpoint::UpdateItem,
            ),
        ];

        for kind in RecordKind::ALL {
            let collection = format!(r"^/api/games/(\d+)/{}$", kind.segment());
            let member = format!(r"^/api/{}/(\d+)$", kind.segment());
            table.push((Method::GET, collection.clone(), Endpoint::ListRecords(kind)));
            table.push((Method::POST, collection, Endpoint::CreateRecord(kind)));
            table.push((Method::GET, member.clone(), Endpoint::GetRecord(kind)));
            table.push((Method::PATCH, member.clone(), Endpoint::UpdateRecord(kind)));
            table.push((Method::DELETE, member, Endpoint::DeleteRecord(kind)));
        }

        let routes = table
            .into_iter()
            .map(|(method, pattern, endpoint)| {
                Ok(Route {
                    method,
                    pattern: Regex::new(&pattern)?,
                    endpoint,
                })
            })
            .collect::<Result<Vec<_>, RouterError>>()?;

        Ok(Self { routes })
    }

    /// Match a request to an endpoint
    pub fn route(&self, method: &Method, path: &str) -> Result<RouteMatch, RouteError> {
        let mut path_matched = false;
        for route in &self.routes {
            let Some(caps) = route.pattern.captures(path) else {
                continue;
            };
            if route.method != *method {
                path_matched = true;
                continue;
            }
            let captures = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| percent_decode_str(m.as_str()).decode_utf8_lossy().into_owned())
                .collect();
            return Ok(RouteMatch {
                endpoint: route.endpoint,
                captures,
            });
        }

        if path_matched {
            Err(RouteError::MethodNotAllowed)
        } else {
            Err(RouteError::NotFound)
        }
    }
}

/// Why a request matched no route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no such endpoint")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
}

/// Router error
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}
