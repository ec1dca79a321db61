use juniper::graphql_object;

use crate::model::{Quiz, User};
use super::{
    Context,
    Id,
    err::ApiResult,
    model::question::QuestionInput,
};


/// The root mutation object.
pub(crate) struct Mutation;

#[graphql_object(Context = Context)]
impl Mutation {
    /// Registers a new user and returns a token for it. Fails if a user with
    /// the given email address already exists.
    async fn register(
        username: String,
        email: String,
        password: String,
        context: &Context,
    ) -> ApiResult<String> {
        User::register(username, email, password, context).await
    }

    /// Checks the given credentials and returns a token for the user. Fails
    /// with the same error regardless of whether the email is unknown or the
    /// password is wrong.
    async fn login(email: String, password: String, context: &Context) -> ApiResult<String> {
        User::login(&email, &password, context).await
    }

    /// Creates a new quiz with the given questions and returns its slug. The
    /// slug is derived from the title and made unique with a random suffix.
    async fn create_quiz(
        title: String,
        description: String,
        user_id: Id,
        questions: Vec<QuestionInput>,
        context: &Context,
    ) -> ApiResult<String> {
        Quiz::create(title, description, user_id, questions, context).await
    }
}
