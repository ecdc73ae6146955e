//! View layer: routing, permission gates and page assembly.
//!
//! # Responsibility
//! - Map a [`Request`] to a [`Response`] through the router.
//! - Redirect anonymous viewers away from login-only routes.
//! - Surface persistence failures as [`ViewError`] to the caller.
//!
//! # Invariants
//! - "Not found" targets redirect to the index page.
//! - Profile access is downgraded, never refused; update access is refused.

use crate::config::{settings, ExportedSettings, Settings};
use crate::repo::RepoError;
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::form_urlencoded;

pub mod request;
pub mod response;
pub mod route;
mod views;

pub use request::{parse_answer_set_form, FormData, Method, Request};
pub use response::{Page, PageContext, Response};
pub use route::Route;

pub const LOGIN_URL: &str = "/accounts/login/";
pub const INDEX_URL: &str = "/";

/// Failure that the view layer does not handle itself.
#[derive(Debug)]
pub enum ViewError {
    Repo(RepoError),
}

impl Display for ViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ViewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ViewError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ViewResult = Result<Response, ViewError>;

/// Request dispatcher bound to one migrated connection.
pub struct Mapper<'conn> {
    conn: &'conn Connection,
    settings: ExportedSettings,
}

impl<'conn> Mapper<'conn> {
    pub fn new(conn: &'conn Connection, settings: ExportedSettings) -> Self {
        Self { conn, settings }
    }

    /// Binds the process-wide settings, or the defaults before they are set.
    pub fn configured(conn: &'conn Connection) -> Self {
        Self::new(conn, settings().map(Settings::exported).unwrap_or_default())
    }

    pub fn handle(&self, request: &Request) -> ViewResult {
        let Some(route) = Route::resolve(&request.path) else {
            info!(
                "event=request module=web status=not_found method={:?}",
                request.method
            );
            return Ok(Response::NotFound);
        };

        let result = self.dispatch(route, request);
        match &result {
            Ok(response) => info!(
                "event=request module=web status=ok route={} method={:?} code={}",
                route.name(),
                request.method,
                response.status_code()
            ),
            Err(err) => error!(
                "event=request module=web status=error route={} method={:?} error={}",
                route.name(),
                request.method,
                err
            ),
        }
        result
    }

    fn dispatch(&self, route: Route, request: &Request) -> ViewResult {
        if request.method == Method::Post && !route.accepts_post() {
            return Ok(Response::MethodNotAllowed);
        }

        let viewer = match (&request.viewer, route.requires_login()) {
            (Some(viewer), _) => Some(viewer),
            (None, true) => return Ok(login_redirect(route, request)),
            (None, false) => None,
        };

        match (route, viewer) {
            (Route::Index, _) => Ok(self.render(response::INDEX_TEMPLATE, PageContext::Index {})),
            (Route::PersonList, Some(viewer)) => views::people::person_list(self, viewer),
            (Route::PersonCreate, Some(viewer)) => views::people::person_create(self, viewer, request),
            (Route::Profile(pk), Some(viewer)) => views::people::profile(self, viewer, pk),
            (Route::PersonUpdate(pk), Some(viewer)) => {
                views::people::person_update(self, viewer, pk, request)
            }
            (Route::ActivitySeriesList, _) => views::activities::series_list(self),
            (Route::ActivitySeriesDetail(pk), _) => views::activities::series_detail(self, pk),
            (Route::ActivityList, _) => views::activities::activity_list(self),
            (Route::ActivityDetail(pk), _) => views::activities::activity_detail(self, pk),
            (_, None) => Ok(login_redirect(route, request)),
        }
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }

    pub(crate) fn render(&self, template: &'static str, context: PageContext) -> Response {
        Response::Render(Page {
            template,
            context,
            settings: self.settings.clone(),
        })
    }
}

/// Redirect to the login page that returns to this route, query included.
fn login_redirect(route: Route, request: &Request) -> Response {
    let mut next = route.path();
    if !request.query.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(request.query.iter())
            .finish();
        next.push('?');
        next.push_str(&query);
    }
    let encoded = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", &next)
        .finish();
    Response::redirect(format!("{LOGIN_URL}?{encoded}"))
}
