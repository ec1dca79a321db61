//! A simple in-memory store used by unit tests.

use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    model::{Key, NewQuestion, NewQuiz, NewUser, Question, Quiz, User},
    prelude::*,
};
use super::{QuizCreation, Store};


pub(crate) struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_key: u64,
    users: BTreeMap<u64, User>,
    quizzes: BTreeMap<u64, Quiz>,
    questions: BTreeMap<u64, Question>,
}

impl Inner {
    fn next_key(&mut self) -> Key {
        self.next_key += 1;
        Key(self.next_key)
    }
}

impl MemStore {
    pub(crate) fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("in-memory store poisoned")
    }
}

#[async_trait]
impl Store for MemStore {
    async fn user_by_key(&self, key: Key) -> Result<Option<User>> {
        Ok(self.lock().users.get(&key.0).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.lock();
        let key = inner.next_key();
        let user = User {
            key,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        };
        inner.users.insert(key.0, user.clone());

        Ok(user)
    }

    async fn quiz_by_key(&self, key: Key) -> Result<Option<Quiz>> {
        Ok(self.lock().quizzes.get(&key.0).cloned())
    }

    async fn quiz_by_slug(&self, slug: &str) -> Result<Option<Quiz>> {
        Ok(self.lock().quizzes.values().find(|q| q.slug == slug).cloned())
    }

    async fn quizzes_by_user(&self, user: Key) -> Result<Vec<Quiz>> {
        Ok(self.lock().quizzes.values().filter(|q| q.user == user).cloned().collect())
    }

    async fn create_quiz(
        &self,
        quiz: NewQuiz,
        questions: Vec<NewQuestion>,
    ) -> Result<QuizCreation> {
        // A single critical section: slug check, quiz insert and question
        // inserts are atomic, like the SQL transaction in the Postgres store.
        let mut inner = self.lock();
        if inner.quizzes.values().any(|q| q.slug == quiz.slug) {
            return Ok(QuizCreation::SlugTaken);
        }

        let key = inner.next_key();
        let quiz = Quiz {
            key,
            title: quiz.title,
            slug: quiz.slug,
            description: quiz.description,
            user: quiz.user,
        };
        inner.quizzes.insert(key.0, quiz.clone());

        for question in questions {
            let question_key = inner.next_key();
            inner.questions.insert(question_key.0, Question {
                key: question_key,
                title: question.title,
                correct_answer: question.correct_answer,
                order: question.order,
                quiz: key,
            });
        }

        Ok(QuizCreation::Created(quiz))
    }

    async fn question_by_key(&self, key: Key) -> Result<Option<Question>> {
        Ok(self.lock().questions.get(&key.0).cloned())
    }

    async fn questions_by_quiz(&self, quiz: Key) -> Result<Vec<Question>> {
        Ok(self.lock().questions.values().filter(|q| q.quiz == quiz).cloned().collect())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn new_quiz(slug: &str) -> NewQuiz {
        NewQuiz {
            title: "Animal Trivia".into(),
            slug: slug.into(),
            description: "so many animals".into(),
            user: Key(1),
        }
    }

    #[tokio::test]
    async fn create_quiz_rejects_taken_slug() {
        let store = MemStore::new();

        let created = store.create_quiz(new_quiz("animal-trivia-7"), vec![]).await.unwrap();
        assert!(matches!(created, QuizCreation::Created(_)));

        let conflict = store.create_quiz(new_quiz("animal-trivia-7"), vec![]).await.unwrap();
        assert!(matches!(conflict, QuizCreation::SlugTaken));
    }

    #[tokio::test]
    async fn create_quiz_is_atomic() {
        let store = MemStore::new();
        store.create_quiz(new_quiz("a-0"), vec![
            NewQuestion { title: "Q1".into(), correct_answer: "A".into(), order: 1 },
        ]).await.unwrap();

        // The second create conflicts, so its question must not appear
        // anywhere.
        store.create_quiz(new_quiz("a-0"), vec![
            NewQuestion { title: "orphan".into(), correct_answer: "B".into(), order: 1 },
        ]).await.unwrap();

        let all: Vec<_> = store.lock().questions.values().cloned().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Q1");
    }
}
