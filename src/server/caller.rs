use async_trait::async_trait;
use axum::extract::{FromRequest, RequestParts};
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::auth::{Role, User};
use crate::error::Error;

/// Set by the authenticating gateway in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[async_trait]
impl<B> FromRequest<B> for User
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        user_from_headers(req.headers())
    }
}

fn user_from_headers(headers: &HeaderMap) -> Result<User, Error> {
    let id: Uuid = header(headers, USER_ID_HEADER)?
        .trim()
        .parse()
        .map_err(|_| Error::unauthenticated_error())?;
    let role: Role = header(headers, USER_ROLE_HEADER)?.parse()?;

    Ok(User::new(id, role))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, Error> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(Error::unauthenticated_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_identity_headers() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("driver"));

        assert_eq!(user_from_headers(&headers).unwrap(), User::driver(id));
    }

    #[test]
    fn missing_or_bad_identity_is_unauthenticated() {
        let mut headers = HeaderMap::new();
        let err = user_from_headers(&headers).unwrap_err();
        assert_eq!(err, Error::unauthenticated_error());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("rider"));
        assert!(user_from_headers(&headers).is_err());

        headers.insert(
            USER_ID_HEADER,
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        );
        headers.insert(USER_ROLE_HEADER, HeaderValue::from_static("admin"));
        assert_eq!(
            user_from_headers(&headers).unwrap_err(),
            Error::unauthenticated_error()
        );
    }
}
