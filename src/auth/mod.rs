//! Authentication gate: credential checks, registration and per-request
//! session restoration.

pub mod password;
pub mod session;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use once_cell::sync::Lazy;
use serde::Serialize;
use tower_cookies::{
    cookie::{time, SameSite},
    Cookie, Cookies,
};
use tracing::{debug, info};

use crate::{
    db::{self, Database},
    entity::user,
    error::{Error, Result},
    web::AppState,
};
use session::{SessionSettings, SESSION_COOKIE_NAME};

pub const MAX_USERNAME_LEN: usize = 80;

// Verified against when the username is unknown, so both failure paths pay for a hash.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| password::hash_password("menuboard-dummy-password").ok());

/// The authenticated user as seen by handlers and templates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

impl From<user::Model> for CurrentUser {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Looks a user up by primary key. Absence is not an error: the session is anonymous.
pub async fn load_user(db: &Database, user_id: i32) -> Result<Option<user::Model>> {
    Ok(db.get_user_by_id(user_id).await?)
}

pub async fn authenticate(db: &Database, username: &str, password: &str) -> Result<user::Model> {
    match db.get_user_by_username(username).await? {
        Some(user) if password::verify_password(password, &user.password_hash)? => {
            info!(user_id = user.id, "User logged in");
            Ok(user)
        }
        Some(_) => Err(Error::InvalidCredentials),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                password::verify_password(password, dummy)?;
            }
            Err(Error::InvalidCredentials)
        }
    }
}

pub async fn register(
    db: &Database,
    username: &str,
    password: &str,
    confirm_password: &str,
) -> Result<user::Model> {
    if username.is_empty() || password.is_empty() {
        return Err(Error::validation("Username and password are required."));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(Error::validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters."
        )));
    }
    if password != confirm_password {
        return Err(Error::validation("Passwords do not match."));
    }

    let password_hash = password::hash_password(password)?;
    match db.insert_user(username, &password_hash).await {
        Ok(user) => {
            info!(user_id = user.id, "Registered user");
            Ok(user)
        }
        Err(db::Error::UniqueViolation(_)) => {
            Err(Error::validation("This username is already taken."))
        }
        Err(err) => Err(err.into()),
    }
}

/// Issues a session token for `user` and stores it in the session cookie.
///
/// With `remember` the cookie outlives the browser session until the token expires.
pub fn start_session(
    cookies: &Cookies,
    user: &user::Model,
    settings: &SessionSettings,
    remember: bool,
) -> Result<()> {
    let token = session::create_session_token(user, settings)?;
    let mut cookie = Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if remember {
        let secs = i64::try_from(settings.ttl.as_secs()).unwrap_or(i64::MAX);
        cookie = cookie.max_age(time::Duration::seconds(secs));
    }
    cookies.add(cookie.build());
    Ok(())
}

pub fn end_session(cookies: &Cookies) {
    cookies.remove(Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build());
}

/// Session identity that may be absent. Never rejects for a missing or stale token.
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let Some(cookie) = cookies.get(SESSION_COOKIE_NAME) else {
            return Ok(MaybeUser(None));
        };
        let Some(user_id) = session::verify_session_token(cookie.value(), &state.session)
            .and_then(|claims| claims.user_id())
        else {
            return Ok(MaybeUser(None));
        };

        let user = load_user(&state.db, user_id)
            .await
            .map_err(IntoResponse::into_response)?;
        if user.is_none() {
            debug!(user_id, "Session refers to a missing user");
        }

        Ok(MaybeUser(user.map(CurrentUser::from)))
    }
}

/// Required session identity. Anonymous requests are redirected to `/login`.
#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(user),
            MaybeUser(None) => {
                debug!(path = %parts.uri.path(), "Anonymous request to guarded route");
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.apply_migrations().await.unwrap();
        db
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let db = memory_db().await;
        let user = register(&db, "ana", "s3cret", "s3cret").await.unwrap();

        assert_ne!(user.password_hash, "s3cret");
        let logged_in = authenticate(&db, "ana", "s3cret").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn mismatched_confirmation_persists_nothing() {
        let db = memory_db().await;

        let err = register(&db, "ana", "s3cret", "secret").await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(db.get_user_by_username("ana").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_validation_error() {
        let db = memory_db().await;
        register(&db, "ana", "first", "first").await.unwrap();

        let err = register(&db, "ana", "second", "second").await.unwrap_err();
        assert_eq!(err.to_string(), "This username is already taken.");
        // the original password still works
        authenticate(&db, "ana", "first").await.unwrap();
        assert!(authenticate(&db, "ana", "second").await.is_err());
    }

    #[tokio::test]
    async fn failures_do_not_reveal_whether_username_exists() {
        let db = memory_db().await;
        register(&db, "ana", "s3cret", "s3cret").await.unwrap();

        let wrong_password = authenticate(&db, "ana", "nope").await.unwrap_err();
        let unknown_user = authenticate(&db, "bob", "nope").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(unknown_user, Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn load_user_absent_is_not_an_error() {
        let db = memory_db().await;
        assert!(load_user(&db, 12345).await.unwrap().is_none());
    }
}
