//! The Postgres backed store.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use futures::TryStreamExt;
use tokio_postgres::Row;

use crate::{
    db::util::dbargs,
    model::{Key, NewQuestion, NewQuiz, NewUser, Question, Quiz, User},
    prelude::*,
};
use super::{QuizCreation, Store};


pub(crate) struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub(crate) fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn user_by_key(&self, key: Key) -> Result<Option<User>> {
        let db = self.pool.get().await?;
        let row = db.query_opt(
            &format!("select {} from users where id = $1", User::COL_NAMES),
            &[&key],
        ).await?;

        Ok(row.map(User::from_row))
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = self.pool.get().await?;
        let row = db.query_opt(
            &format!("select {} from users where email = $1", User::COL_NAMES),
            &[&email],
        ).await?;

        Ok(row.map(User::from_row))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let db = self.pool.get().await?;
        let row = db.query_one(
            "insert into users (username, email, password_hash) \
                values ($1, $2, $3) \
                returning id",
            &[&user.username, &user.email, &user.password_hash],
        ).await?;

        Ok(User {
            key: row.get(0),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        })
    }

    async fn quiz_by_key(&self, key: Key) -> Result<Option<Quiz>> {
        let db = self.pool.get().await?;
        let row = db.query_opt(
            &format!("select {} from quizzes where id = $1", Quiz::COL_NAMES),
            &[&key],
        ).await?;

        Ok(row.map(Quiz::from_row))
    }

    async fn quiz_by_slug(&self, slug: &str) -> Result<Option<Quiz>> {
        let db = self.pool.get().await?;
        let row = db.query_opt(
            &format!("select {} from quizzes where slug = $1", Quiz::COL_NAMES),
            &[&slug],
        ).await?;

        Ok(row.map(Quiz::from_row))
    }

    async fn quizzes_by_user(&self, user: Key) -> Result<Vec<Quiz>> {
        let db = self.pool.get().await?;
        let quizzes = db.query_raw(
                &format!("select {} from quizzes where user_id = $1", Quiz::COL_NAMES),
                dbargs![&user],
            )
            .await?
            .map_ok(Quiz::from_row)
            .try_collect()
            .await?;

        Ok(quizzes)
    }

    async fn create_quiz(
        &self,
        quiz: NewQuiz,
        questions: Vec<NewQuestion>,
    ) -> Result<QuizCreation> {
        let mut db = self.pool.get().await?;
        let tx = db.transaction().await?;

        // The unique index on `slug` is what actually guarantees global slug
        // uniqueness. `on conflict do nothing` turns a lost race into a
        // regular outcome the caller can retry instead of an error.
        let row = tx.query_opt(
            "insert into quizzes (title, slug, description, user_id) \
                values ($1, $2, $3, $4) \
                on conflict (slug) do nothing \
                returning id",
            &[&quiz.title, &quiz.slug, &quiz.description, &quiz.user],
        ).await?;

        let Some(row) = row else {
            return Ok(QuizCreation::SlugTaken);
        };
        let key: Key = row.get(0);

        for question in &questions {
            tx.execute(
                "insert into questions (title, correct_answer, index, quiz_id) \
                    values ($1, $2, $3, $4)",
                &[&question.title, &question.correct_answer, &question.order, &key],
            ).await?;
        }

        tx.commit().await.context("failed to commit quiz creation")?;
        debug!("Created quiz '{}' with {} question(s)", quiz.slug, questions.len());

        Ok(QuizCreation::Created(Quiz {
            key,
            title: quiz.title,
            slug: quiz.slug,
            description: quiz.description,
            user: quiz.user,
        }))
    }

    async fn question_by_key(&self, key: Key) -> Result<Option<Question>> {
        let db = self.pool.get().await?;
        let row = db.query_opt(
            &format!("select {} from questions where id = $1", Question::COL_NAMES),
            &[&key],
        ).await?;

        Ok(row.map(Question::from_row))
    }

    async fn questions_by_quiz(&self, quiz: Key) -> Result<Vec<Question>> {
        let db = self.pool.get().await?;
        let questions = db.query_raw(
                &format!(
                    "select {} from questions where quiz_id = $1 order by index, id",
                    Question::COL_NAMES,
                ),
                dbargs![&quiz],
            )
            .await?
            .map_ok(Question::from_row)
            .try_collect()
            .await?;

        Ok(questions)
    }
}


impl User {
    const COL_NAMES: &'static str = "id, username, email, password_hash";

    fn from_row(row: Row) -> Self {
        Self {
            key: row.get(0),
            username: row.get(1),
            email: row.get(2),
            password_hash: row.get(3),
        }
    }
}

impl Quiz {
    const COL_NAMES: &'static str = "id, title, slug, description, user_id";

    fn from_row(row: Row) -> Self {
        Self {
            key: row.get(0),
            title: row.get(1),
            slug: row.get(2),
            description: row.get(3),
            user: row.get(4),
        }
    }
}

impl Question {
    const COL_NAMES: &'static str = "id, title, correct_answer, index, quiz_id";

    fn from_row(row: Row) -> Self {
        Self {
            key: row.get(0),
            title: row.get(1),
            correct_answer: row.get(2),
            order: row.get(3),
            quiz: row.get(4),
        }
    }
}
