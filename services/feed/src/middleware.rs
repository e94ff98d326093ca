//! Authentication middleware for JWT token validation

use axum::{extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::jwt::{JwtService, TokenType};
use social::store::SocialStore;
use tracing::warn;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated identity
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Resolve the bearer access token to the identity it was issued for
pub fn authenticate(
    jwt: &JwtService,
    authorization: Option<&Authorization<Bearer>>,
) -> Result<AuthUser, ApiError> {
    let bearer = authorization.ok_or(ApiError::Unauthorized)?;

    let claims = jwt
        .validate_token(bearer.token(), TokenType::Access)
        .map_err(|e| {
            warn!("Rejected access token: {}", e);
            ApiError::Unauthorized
        })?;

    Ok(AuthUser { id: claims.sub })
}

/// Authentication middleware
pub async fn auth_middleware<S: SocialStore>(
    State(state): State<AppState<S>>,
    authorization: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state.jwt, authorization.as_ref().map(|header| &header.0))?;

    // Insert the user into the request extensions
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::jwt::{JwtConfig, JwtKeys};

    fn jwt() -> JwtService {
        JwtService::new(JwtConfig {
            keys: JwtKeys::Secret("middleware-test-secret".to_string()),
            access_token_expiry: 900,
        })
        .unwrap()
    }

    #[test]
    fn test_valid_access_token() {
        let jwt = jwt();
        let id = Uuid::new_v4();
        let token = jwt.generate_access_token(id).unwrap();
        let header = Authorization::bearer(&token).unwrap();

        let user = authenticate(&jwt, Some(&header)).unwrap();
        assert_eq!(user.id, id);
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            authenticate(&jwt(), None),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_other_token_types_are_rejected() {
        let jwt = jwt();
        let token = jwt.generate_activation_token(Uuid::new_v4()).unwrap();
        let header = Authorization::bearer(&token).unwrap();

        assert!(matches!(
            authenticate(&jwt, Some(&header)),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_garbage_token() {
        let header = Authorization::bearer("not.a.jwt").unwrap();
        assert!(matches!(
            authenticate(&jwt(), Some(&header)),
            Err(ApiError::Unauthorized)
        ));
    }
}
