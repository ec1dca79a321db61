use juniper::graphql_object;

use crate::{
    api::{
        Context, Id, Node, NodeValue,
        err::{ApiResult, internal_server_error, invalid_input},
        model::question::QuestionInput,
    },
    model::{Key, NewQuiz, Question, Quiz, User},
    prelude::*,
    slug,
    store::QuizCreation,
};


/// How often `create` tries a new random slug suffix before giving up. With
/// 10000 possible suffixes per title, reaching this limit in practice means
/// something is wrong.
const MAX_SLUG_ATTEMPTS: u32 = 100;


impl Node for Quiz {
    fn id(&self) -> Id {
        Id::quiz(self.key)
    }
}

#[graphql_object(Context = Context, impl = NodeValue)]
impl Quiz {
    fn id(&self) -> Id {
        Node::id(self)
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn user_id(&self) -> Id {
        Id::user(self.user)
    }

    /// The owner of this quiz, or `None` if the owner no longer exists.
    async fn user(&self, context: &Context) -> ApiResult<Option<User>> {
        User::load_by_key(self.user, context).await
    }

    /// All questions of this quiz, in order.
    async fn questions(&self, context: &Context) -> ApiResult<Vec<Question>> {
        Question::load_for_quiz(self.key, context).await
    }
}

impl Quiz {
    pub(crate) async fn load_by_id(id: Id, context: &Context) -> ApiResult<Option<Self>> {
        match id.key_for(Id::QUIZ_KIND) {
            None => Ok(None),
            Some(key) => Ok(context.store.quiz_by_key(key).await?),
        }
    }

    pub(crate) async fn load_by_slug(slug: &str, context: &Context) -> ApiResult<Option<Self>> {
        Ok(context.store.quiz_by_slug(slug).await?)
    }

    pub(crate) async fn load_for_user(user: Key, context: &Context) -> ApiResult<Vec<Self>> {
        Ok(context.store.quizzes_by_user(user).await?)
    }

    /// Creates a new quiz with the given questions and returns its slug.
    pub(crate) async fn create(
        title: String,
        description: String,
        user_id: Id,
        questions: Vec<QuestionInput>,
        context: &Context,
    ) -> ApiResult<String> {
        let user = user_id.key_for(Id::USER_KIND)
            .ok_or_else(|| invalid_input!("`userId` does not refer to a user"))?;

        let base = slug::base(&title);

        // The slug is only reserved by actually inserting the quiz, so a
        // taken slug just means: roll a new suffix and try again. The unique
        // index on the slug column makes this safe even when two requests
        // race for the same slug.
        for _ in 0..MAX_SLUG_ATTEMPTS {
            let slug = slug::candidate(&base);
            let new_quiz = NewQuiz {
                title: title.clone(),
                slug,
                description: description.clone(),
                user,
            };
            let new_questions = questions.iter().map(QuestionInput::to_new_question).collect();

            match context.store.create_quiz(new_quiz, new_questions).await? {
                QuizCreation::Created(quiz) => return Ok(quiz.slug),
                QuizCreation::SlugTaken => {
                    debug!("Slug collision for quiz '{title}', retrying with a new suffix");
                }
            }
        }

        Err(internal_server_error!("could not find a free slug for quiz '{title}'"))
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use crate::model::NewUser;
    use super::*;

    async fn insert_user(context: &Context) -> Key {
        let user = context.store.insert_user(NewUser {
            username: "alice".into(),
            email: "alice@example.org".into(),
            password_hash: "irrelevant".into(),
        }).await.unwrap();

        user.key
    }

    fn questions() -> Vec<QuestionInput> {
        vec![
            QuestionInput {
                title: "How many legs does a spider have?".into(),
                correct_answer: "8".into(),
                order: 1,
            },
            QuestionInput {
                title: "What is the fastest land animal?".into(),
                correct_answer: "Cheetah".into(),
                order: 2,
            },
        ]
    }

    #[tokio::test]
    async fn create_quiz_with_questions() {
        let context = Context::testing();
        let user = insert_user(&context).await;

        let slug = Quiz::create(
            "Animal Trivia!".into(),
            "All about animals".into(),
            Id::user(user),
            questions(),
            &context,
        ).await.unwrap();

        // Slug is the normalized title plus a random numeric suffix.
        let suffix = slug.strip_prefix("animal-trivia-").unwrap();
        assert!(suffix.parse::<u32>().unwrap() < 10_000);

        let quiz = Quiz::load_by_slug(&slug, &context).await.unwrap().unwrap();
        assert_eq!(quiz.title, "Animal Trivia!");
        assert_eq!(quiz.user, user);

        let questions = Question::load_for_quiz(quiz.key, &context).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].title, "How many legs does a spider have?");
        assert_eq!(questions[1].correct_answer, "Cheetah");
    }

    #[tokio::test]
    async fn create_rejects_non_user_id() {
        let context = Context::testing();
        let user = insert_user(&context).await;

        // A valid ID of the wrong kind must not be accepted.
        let err = Quiz::create(
            "Animal Trivia".into(),
            String::new(),
            Id::quiz(user),
            vec![],
            &context,
        ).await.unwrap_err();
        assert!(err.msg.contains("userId"));
    }

    #[tokio::test]
    async fn dangling_owner_resolves_to_none() {
        let context = Context::testing();

        // Insert a quiz whose owner does not exist.
        let created = context.store.create_quiz(NewQuiz {
            title: "Orphan".into(),
            slug: "orphan-123".into(),
            description: String::new(),
            user: Key(999),
        }, vec![]).await.unwrap();
        let QuizCreation::Created(quiz) = created else { panic!("slug unexpectedly taken") };

        let owner = User::load_by_key(quiz.user, &context).await.unwrap();
        assert!(owner.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_creates_get_distinct_slugs() {
        let context = Arc::new(Context::testing());
        let user = insert_user(&context).await;

        let tasks = (0..100).map(|_| {
            let context = Arc::clone(&context);
            tokio::spawn(async move {
                Quiz::create(
                    "Animal Trivia".into(),
                    String::new(),
                    Id::user(user),
                    vec![],
                    &context,
                ).await
            })
        }).collect::<Vec<_>>();

        let mut slugs = HashSet::new();
        for task in tasks {
            let slug = task.await.unwrap().unwrap_or_else(|e| panic!("create failed: {}", e.msg));
            assert!(slugs.insert(slug), "same slug handed out twice");
        }
        assert_eq!(slugs.len(), 100);
    }
}
