use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Subject claim carried by every admin token.
const ADMIN_SUBJECT: &str = "admin";

/// The shared admin password, as sent by the dashboard login form.
#[derive(Clone, Deserialize, Serialize)]
pub struct AdminCredentials {
    pub password: String,
}

/// Proof that the request comes from someone who knows the admin password.
/// Use as a request guard on admin-only routes.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminToken {
    #[serde(rename = "sub")]
    subject: String,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

impl AdminToken {
    pub fn new(config: &Config) -> Self {
        Self {
            subject: ADMIN_SUBJECT.to_string(),
            expire_at: Utc::now() + config.auth_ttl(),
        }
    }

    #[allow(clippy::missing_panics_doc)]
    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let token = jsonwebtoken::encode(
            &Header::default(),
            &self,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        let same_site = SameSite::from(config.cookie_same_site());
        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(same_site)
            .secure(same_site == SameSite::None)
            .finish()
    }

    /// Deserialize a token from a cookie, checking its signature and expiry.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data: TokenData<Self>| data.claims)?;
        if token.subject != ADMIN_SUBJECT {
            return Err(Error::Unauthorized("Not an admin token".to_string()));
        }
        Ok(token)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminToken {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) else {
            return Outcome::Failure((
                Status::Unauthorized,
                Error::Unauthorized("Admin login required".to_string()),
            ));
        };

        match Self::from_cookie(cookie, config) {
            Ok(token) => Outcome::Success(token),
            Err(e) => Outcome::Failure((Status::Unauthorized, e)),
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl AdminCredentials {
        pub fn example() -> Self {
            Self {
                password: "zetakappa".to_string(),
            }
        }

        pub fn wrong() -> Self {
            Self {
                password: "sigma".to_string(),
            }
        }
    }
}
