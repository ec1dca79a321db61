//! Entity storage.
//!
//! The API layer only talks to the [`Store`] trait, which offers find/insert
//! style operations per entity. The real implementation is backed by
//! Postgres ([`pg::PgStore`]); tests use a simple in-memory implementation.
//!
//! The store makes two atomicity guarantees that the rest of the code relies
//! on: quiz insertion fails with [`QuizCreation::SlugTaken`] instead of ever
//! storing a duplicate slug, and a quiz is inserted together with all of its
//! questions or not at all. Everything else is plain independent writes, in
//! particular there is no uniqueness constraint on user emails (that check
//! happens in the mutation layer).

use async_trait::async_trait;

use crate::{
    model::{Key, NewQuestion, NewQuiz, NewUser, Question, Quiz, User},
    prelude::*,
};

#[cfg(test)]
pub(crate) mod mem;
pub(crate) mod pg;


/// Outcome of [`Store::create_quiz`].
pub(crate) enum QuizCreation {
    /// The quiz and all its questions were written.
    Created(Quiz),

    /// A quiz with the candidate slug already exists; nothing was written.
    /// The caller should draw a new slug and retry.
    SlugTaken,
}

#[async_trait]
pub(crate) trait Store: Send + Sync {
    async fn user_by_key(&self, key: Key) -> Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn quiz_by_key(&self, key: Key) -> Result<Option<Quiz>>;
    async fn quiz_by_slug(&self, slug: &str) -> Result<Option<Quiz>>;
    async fn quizzes_by_user(&self, user: Key) -> Result<Vec<Quiz>>;

    /// Atomically inserts a quiz and its questions, unless the slug is
    /// already taken.
    async fn create_quiz(
        &self,
        quiz: NewQuiz,
        questions: Vec<NewQuestion>,
    ) -> Result<QuizCreation>;

    async fn question_by_key(&self, key: Key) -> Result<Option<Question>>;
    async fn questions_by_quiz(&self, quiz: Key) -> Result<Vec<Question>>;
}
