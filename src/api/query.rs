use juniper::graphql_object;

use crate::model::{Question, Quiz, User};
use super::{
    Context,
    Id,
    NodeValue,
    err::ApiResult,
};


/// The root query object.
pub(crate) struct Query;

#[graphql_object(Context = Context)]
impl Query {
    /// Returns the user with the specific ID or `None` if the ID does not
    /// refer to a user.
    async fn user(id: Id, context: &Context) -> ApiResult<Option<User>> {
        User::load_by_id(id, context).await
    }

    /// Returns the quiz with the specific ID or `None` if the ID does not
    /// refer to a quiz.
    async fn quiz_by_id(id: Id, context: &Context) -> ApiResult<Option<Quiz>> {
        Quiz::load_by_id(id, context).await
    }

    /// Returns the quiz with the given slug or `None` if no quiz has that
    /// slug.
    async fn quiz_by_slug(slug: String, context: &Context) -> ApiResult<Option<Quiz>> {
        Quiz::load_by_slug(&slug, context).await
    }

    /// Retrieve a node by globally unique ID. Mostly useful for relay.
    async fn node(id: Id, context: &Context) -> ApiResult<Option<NodeValue>> {
        match id.kind() {
            Id::USER_KIND => Ok(User::load_by_id(id, context).await?.map(NodeValue::from)),
            Id::QUIZ_KIND => Ok(Quiz::load_by_id(id, context).await?.map(NodeValue::from)),
            Id::QUESTION_KIND
                => Ok(Question::load_by_id(id, context).await?.map(NodeValue::from)),
            _ => Ok(None),
        }
    }
}
