//! The entities this application revolves around: users, quizzes and the
//! questions belonging to a quiz.
//!
//! These are plain data types. How they are stored and loaded is the job of
//! `crate::store`; how they are exposed in the API is the job of
//! `crate::api::model`.

mod key;

pub(crate) use self::key::Key;

#[cfg(test)]
pub(crate) use self::key::BASE64_DIGITS;


#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) key: Key,
    pub(crate) username: String,
    pub(crate) email: String,
    /// Bcrypt hash of the user's password. Never exposed through the API.
    pub(crate) password_hash: String,
}

#[derive(Debug, Clone)]
pub(crate) struct Quiz {
    pub(crate) key: Key,
    pub(crate) title: String,
    /// Unique human readable identifier, derived from the title. Immutable
    /// once set.
    pub(crate) slug: String,
    pub(crate) description: String,
    /// Reference to the owning user. Best-effort: the user might have been
    /// deleted in the meantime.
    pub(crate) user: Key,
}

#[derive(Debug, Clone)]
pub(crate) struct Question {
    pub(crate) key: Key,
    pub(crate) title: String,
    pub(crate) correct_answer: String,
    /// Display position within the quiz, as supplied by the caller. Not
    /// checked for contiguity or uniqueness.
    pub(crate) order: i32,
    pub(crate) quiz: Key,
}

/// Data for inserting a new user.
#[derive(Debug)]
pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
}

/// Data for inserting a new quiz.
#[derive(Debug)]
pub(crate) struct NewQuiz {
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) user: Key,
}

/// Data for inserting a new question. The quiz reference is added by the
/// store, as quiz and questions are inserted together.
#[derive(Debug)]
pub(crate) struct NewQuestion {
    pub(crate) title: String,
    pub(crate) correct_answer: String,
    pub(crate) order: i32,
}
