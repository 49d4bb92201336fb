use std::convert::Infallible;

use warp::{reject::Rejection, Filter};

use crate::constants::SESSION_COOKIE;

use super::jwt::{verify_session, SessionData};

/// Requires a valid session cookie, rejecting with `CoreError::InvalidSession`
/// otherwise.
pub fn with_session(
    secret: String,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::cookie::<String>(SESSION_COOKIE).and_then(move |session: String| {
        let secret = secret.to_owned();
        async move { verify_session(&session, &secret).map_err(warp::reject::custom) }
    })
}

/// Resolves the caller if a valid session cookie is present. Missing, expired
/// or forged cookies yield an anonymous caller.
pub fn with_possible_session(
    secret: String,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Infallible> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE).map(move |session: Option<String>| {
        session.and_then(|token| match verify_session(&token, &secret) {
            Ok(data) => Some(data),
            Err(e) => {
                log::debug!("Ignoring session cookie: {e}");
                None
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::CoreError, jwt::issue_session, schema::User};
    use chrono::Duration;

    fn cookie() -> String {
        let user = User {
            id: 3,
            username: String::from("baker"),
        };
        let token = issue_session(&user, "secret", Duration::minutes(5)).unwrap();
        format!("{SESSION_COOKIE}={token}")
    }

    #[tokio::test]
    async fn session_cookie_resolves_the_caller() {
        let session = warp::test::request()
            .header("cookie", cookie())
            .filter(&with_session(String::from("secret")))
            .await
            .unwrap();

        assert_eq!(session.user_id, 3);
        assert_eq!(session.username, "baker");
    }

    #[tokio::test]
    async fn invalid_session_is_rejected_with_core_error() {
        let rejection = warp::test::request()
            .header("cookie", format!("{SESSION_COOKIE}=garbage"))
            .filter(&with_session(String::from("secret")))
            .await
            .unwrap_err();

        assert!(matches!(
            rejection.find::<CoreError>(),
            Some(CoreError::InvalidSession(_))
        ));
    }

    #[test]
    fn optional_session_composes_without_rejections() {
        fn infallible<F: Filter<Error = Infallible>>(filter: F) -> F {
            filter
        }

        let route = infallible(with_possible_session(String::from("secret")))
            .and(infallible(warp::any().map(|| ())));
        let _ = infallible(route);
    }

    #[tokio::test]
    async fn missing_cookie_means_anonymous() {
        let caller = warp::test::request()
            .filter(&with_possible_session(String::from("secret")))
            .await
            .unwrap();
        assert_eq!(caller, None);

        let caller = warp::test::request()
            .header("cookie", cookie())
            .filter(&with_possible_session(String::from("other secret")))
            .await
            .unwrap();
        assert_eq!(caller, None);

        let caller = warp::test::request()
            .header("cookie", cookie())
            .filter(&with_possible_session(String::from("secret")))
            .await
            .unwrap();
        assert_eq!(caller.map(|session| session.user_id), Some(3));
    }
}
