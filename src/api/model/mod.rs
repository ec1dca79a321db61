//! This module and its children define most of the application logic of the
//! API.

pub(crate) mod user;
pub(crate) mod quiz;
pub(crate) mod question;
