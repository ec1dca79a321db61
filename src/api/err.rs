//! API error handling.
//!
//! We define our own error to use for all resolvers. It has `From` impls to be
//! created from other common errors that occur (e.g. store errors). This module
//! also offers a couple macros to easily create an error.
//!
//! The error contains information that helps API clients show a good error
//! message. The `msg` is sent to the client verbatim, so it must not contain
//! any internal details. We have a very coarse "error kind", but also an
//! optional "key" that clients can use to pick a translated error message.

use juniper::{FieldError, IntoFieldError, ScalarValue, graphql_value};

use crate::prelude::*;


pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) msg: String,
    pub(crate) kind: ApiErrorKind,
    pub(crate) key: Option<&'static str>,
}

#[derive(Debug)]
pub(crate) enum ApiErrorKind {
    /// The arguments passed to an endpoint are invalid somehow.
    InvalidInput,

    /// A user with the given email address already exists.
    DuplicateUser,

    /// Login failed, either because the user does not exist or because the
    /// password is wrong. Deliberately not distinguishing the two.
    InvalidCredentials,

    /// Some server error out of control of the API user.
    InternalServerError,
}

impl ApiErrorKind {
    fn kind_str(&self) -> &str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::DuplicateUser => "DUPLICATE_USER",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(src: anyhow::Error) -> Self {
        // Logging the error here is not ideal but probably totally fine for
        // us. This is the last time we can get detailed information about it,
        // as the client only ever sees the generic message below.
        error!("Error when executing API request: {src:?}");

        Self {
            msg: "Internal server error".into(),
            kind: ApiErrorKind::InternalServerError,
            key: None,
        }
    }
}

impl<S: ScalarValue> IntoFieldError<S> for ApiError {
    fn into_field_error(self) -> FieldError<S> {
        let ext = if let Some(key) = self.key {
            graphql_value!({
                "kind": (self.kind.kind_str()),
                "key": key,
            })
        } else {
            graphql_value!({
                "kind": (self.kind.kind_str()),
            })
        };

        FieldError::new(self.msg, ext)
    }
}


// ===== Helper macros to easily create errors ==================================================

/// Creates an `ApiError` with a `format!` like syntax.
macro_rules! api_err {
    ($kind:ident, key = $key:literal, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::api::err::ApiError {
            msg: format!($fmt $(, $arg)*),
            kind: $crate::api::err::ApiErrorKind::$kind,
            key: Some($key),
        }
    };
    ($kind:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::api::err::ApiError {
            msg: format!($fmt $(, $arg)*),
            kind: $crate::api::err::ApiErrorKind::$kind,
            key: None,
        }
    };
}

macro_rules! invalid_input {
    ($($t:tt)+) => { $crate::api::err::api_err!(InvalidInput, $($t)*) };
}

macro_rules! duplicate_user {
    ($($t:tt)+) => { $crate::api::err::api_err!(DuplicateUser, $($t)*) };
}

macro_rules! invalid_credentials {
    ($($t:tt)+) => { $crate::api::err::api_err!(InvalidCredentials, $($t)*) };
}

macro_rules! internal_server_error {
    ($($t:tt)+) => { $crate::api::err::api_err!(InternalServerError, $($t)*) };
}

pub(crate) use api_err;
pub(crate) use invalid_input;
pub(crate) use duplicate_user;
pub(crate) use invalid_credentials;
pub(crate) use internal_server_error;
