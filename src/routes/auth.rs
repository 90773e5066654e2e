use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use axum_extra::{headers::Cookie, typed_header::TypedHeader};
use chrono::{Duration as ChronoDuration, Utc};
use diesel::{prelude::*, result::DatabaseErrorKind, PgConnection};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    models::{InviteCode, NewRefreshToken, NewUser, RefreshToken, User},
    schema::{invite_codes, refresh_tokens, users},
    state::AppState,
};

const REFRESH_COOKIE_NAME: &str = "refresh_token";
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_USERNAME_LENGTH: usize = 100;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct InviteRegisterRequest {
    pub username: String,
    pub password: String,
    pub invite_code: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    if !state.config.registration_enabled {
        return Err(AppError::forbidden("registration is disabled"));
    }

    let (username, password_hash) = validate_credentials(&payload.username, &payload.password)?;
    let mut conn = state.db()?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        username,
        password_hash,
        is_admin: false,
        is_active: true,
    };

    insert_user(&mut conn, &new_user)?;
    tracing::info!(username = %new_user.username, "registered new user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: new_user.id,
            username: new_user.username,
        }),
    ))
}

pub async fn register_with_invite_code(
    State(state): State<AppState>,
    Json(payload): Json<InviteRegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    if !state.config.invite_registration_enabled {
        return Err(AppError::forbidden("invite registration is disabled"));
    }

    let (username, password_hash) = validate_credentials(&payload.username, &payload.password)?;
    let code = payload.invite_code.trim().to_string();
    if code.is_empty() {
        return Err(AppError::bad_request("invite_code must not be empty"));
    }

    let mut conn = state.db()?;

    // User creation, redemption and the code->user link happen in one
    // transaction: a failure on any step must not leave a redeemed but
    // unlinked code behind. Two concurrent redemptions of the same code are
    // serialized by the unique constraint on invite_codes.user_id; the loser
    // surfaces the same conflict as a pre-checked redeemed code.
    let new_user = conn.transaction::<NewUser, AppError, _>(|conn| {
        let invite: InviteCode = invite_codes::table
            .filter(invite_codes::code.eq(&code))
            .first(conn)
            .optional()?
            .ok_or_else(AppError::not_found)?;

        if invite.redeemed {
            return Err(AppError::conflict("invitation code already redeemed"));
        }

        let new_user = NewUser {
            id: Uuid::new_v4(),
            username,
            password_hash,
            is_admin: false,
            is_active: true,
        };
        insert_user(conn, &new_user)?;

        let updated = diesel::update(
            invite_codes::table
                .find(invite.id)
                .filter(invite_codes::redeemed.eq(false)),
        )
        .set((
            invite_codes::redeemed.eq(true),
            invite_codes::user_id.eq(new_user.id),
            invite_codes::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::conflict("invitation code already redeemed")
            }
            other => AppError::from(other),
        })?;

        if updated == 0 {
            return Err(AppError::conflict("invitation code already redeemed"));
        }

        Ok(new_user)
    })?;

    tracing::info!(username = %new_user.username, "registered user via invite code");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: new_user.id,
            username: new_user.username,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let mut conn = state.db()?;

    // Unknown username and wrong password answer identically; a login
    // probe must not reveal whether an account exists.
    let user: User = users::table
        .filter(users::username.eq(&payload.username))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::unauthorized)?;

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        return Err(AppError::unauthorized());
    }

    if !user.is_active {
        return Err(AppError::forbidden("account is deactivated"));
    }

    let access_token = state
        .jwt
        .generate_token(user.id, &user.username, user.is_admin)
        .map_err(AppError::from)?;

    let now = Utc::now();
    let refresh_value = generate_refresh_token();
    let refresh_hash = hash_refresh_token(&refresh_value);
    let refresh_expires_at = now + ChronoDuration::days(state.config.refresh_token_expiry_days);

    let new_refresh = NewRefreshToken {
        id: Uuid::new_v4(),
        user_id: user.id,
        token_hash: refresh_hash,
        issued_at: now.naive_utc(),
        expires_at: refresh_expires_at.naive_utc(),
    };

    diesel::insert_into(refresh_tokens::table)
        .values(&new_refresh)
        .execute(&mut conn)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        build_refresh_cookie(&state, &refresh_value, refresh_expires_at),
    );

    Ok((
        headers,
        Json(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.jwt_expiry_minutes * 60,
        }),
    ))
}

pub async fn refresh(
    State(state): State<AppState>,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let cookies = jar.ok_or_else(AppError::unauthorized)?;
    let refresh_value = cookies
        .get(REFRESH_COOKIE_NAME)
        .ok_or_else(AppError::unauthorized)?;

    let hashed = hash_refresh_token(refresh_value);
    let mut conn = state.db()?;
    let now = Utc::now();
    let now_naive = now.naive_utc();

    let token = refresh_tokens::table
        .filter(refresh_tokens::token_hash.eq(&hashed))
        .filter(refresh_tokens::revoked_at.is_null())
        .filter(refresh_tokens::expires_at.gt(now_naive))
        .first::<RefreshToken>(&mut conn)
        .optional()?
        .ok_or_else(AppError::unauthorized)?;

    diesel::update(refresh_tokens::table.find(token.id))
        .set((
            refresh_tokens::revoked_at.eq(now_naive),
            refresh_tokens::updated_at.eq(now_naive),
        ))
        .execute(&mut conn)?;

    let user: User = users::table.find(token.user_id).first(&mut conn)?;
    if !user.is_active {
        return Err(AppError::forbidden("account is deactivated"));
    }

    let access_token = state
        .jwt
        .generate_token(user.id, &user.username, user.is_admin)
        .map_err(AppError::from)?;

    let new_refresh_value = generate_refresh_token();
    let new_refresh_hash = hash_refresh_token(&new_refresh_value);
    let new_refresh_expires = now + ChronoDuration::days(state.config.refresh_token_expiry_days);

    let new_refresh = NewRefreshToken {
        id: Uuid::new_v4(),
        user_id: user.id,
        token_hash: new_refresh_hash,
        issued_at: now_naive,
        expires_at: new_refresh_expires.naive_utc(),
    };

    diesel::insert_into(refresh_tokens::table)
        .values(&new_refresh)
        .execute(&mut conn)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        build_refresh_cookie(&state, &new_refresh_value, new_refresh_expires),
    );

    Ok((
        headers,
        Json(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.jwt_expiry_minutes * 60,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, StatusCode)> {
    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();
    let mut rows_affected = 0;

    if let Some(cookies) = jar {
        if let Some(value) = cookies.get(REFRESH_COOKIE_NAME) {
            let hashed = hash_refresh_token(value);
            rows_affected = diesel::update(
                refresh_tokens::table
                    .filter(refresh_tokens::token_hash.eq(hashed))
                    .filter(refresh_tokens::user_id.eq(user.user_id))
                    .filter(refresh_tokens::revoked_at.is_null()),
            )
            .set((
                refresh_tokens::revoked_at.eq(now),
                refresh_tokens::updated_at.eq(now),
            ))
            .execute(&mut conn)
            .unwrap_or(0);
        }
    }

    if rows_affected == 0 {
        let _ = diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::user_id.eq(user.user_id))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set((
            refresh_tokens::revoked_at.eq(now),
            refresh_tokens::updated_at.eq(now),
        ))
        .execute(&mut conn);
    }

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, build_clear_refresh_cookie(&state));
    Ok((headers, StatusCode::NO_CONTENT))
}

pub async fn me(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}

fn validate_credentials(username: &str, password: &str) -> AppResult<(String, String)> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::bad_request("username must not be empty"));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::bad_request(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    let password_hash =
        password::hash_password(password).map_err(|err| AppError::internal(err))?;
    Ok((username.to_string(), password_hash))
}

fn insert_user(conn: &mut PgConnection, new_user: &NewUser) -> AppResult<()> {
    // Pre-check for a friendly error; the unique constraint still decides
    // the race between two concurrent registrations.
    let taken: Option<Uuid> = users::table
        .filter(users::username.eq(&new_user.username))
        .select(users::id)
        .first(conn)
        .optional()?;
    if taken.is_some() {
        return Err(AppError::conflict("username already taken"));
    }

    diesel::insert_into(users::table)
        .values(new_user)
        .execute(conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::conflict("username already taken")
            }
            other => AppError::from(other),
        })?;
    Ok(())
}

fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn build_refresh_cookie(
    state: &AppState,
    token: &str,
    expires_at: chrono::DateTime<Utc>,
) -> HeaderValue {
    let max_age = ChronoDuration::days(state.config.refresh_token_expiry_days).num_seconds();

    let mut parts = vec![format!("{}={}", REFRESH_COOKIE_NAME, token)];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Strict".into());
    parts.push(format!("Max-Age={}", max_age));
    parts.push(format!("Expires={}", expires_at.to_rfc2822()));
    if state.config.refresh_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &state.config.refresh_cookie_domain {
        parts.push(format!("Domain={}", domain));
    }

    HeaderValue::from_str(&parts.join("; ")).expect("valid refresh cookie")
}

fn build_clear_refresh_cookie(state: &AppState) -> HeaderValue {
    let mut parts = vec![format!("{}=", REFRESH_COOKIE_NAME)];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Strict".into());
    parts.push("Max-Age=0".into());
    parts.push("Expires=Thu, 01 Jan 1970 00:00:00 GMT".into());
    if state.config.refresh_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &state.config.refresh_cookie_domain {
        parts.push(format!("Domain={}", domain));
    }

    HeaderValue::from_str(&parts.join("; ")).expect("valid refresh cookie")
}
