//! Definition of the GraphQL API.

use self::{
    mutation::Mutation,
    query::Query,
    subscription::Subscription,
};

pub(crate) mod err;
pub(crate) mod model;

mod common;
mod context;
mod id;
mod mutation;
mod query;
mod subscription;

pub(crate) use self::{
    id::Id,
    context::Context,
    common::{Node, NodeValue},
};


/// Creates and returns the API root node.
pub(crate) fn root_node() -> RootNode {
    RootNode::new(Query, Mutation, Subscription::new())
}

/// Type of our API root node.
pub(crate) type RootNode = juniper::RootNode<'static, Query, Mutation, Subscription>;


#[cfg(test)]
mod tests {
    use juniper::{InputValue, Variables, graphql_value};

    use crate::model::NewUser;
    use super::*;

    /// Runs one full request through the schema, like an HTTP request would.
    async fn execute(
        query: &str,
        variables: Variables,
        context: &Context,
    ) -> (juniper::Value, Vec<juniper::ExecutionError<juniper::DefaultScalarValue>>) {
        juniper::execute(query, None, &root_node(), &variables, context)
            .await
            .expect("GraphQL execution failed")
    }

    #[tokio::test]
    async fn create_quiz_and_query_it_back() {
        let context = Context::testing();
        let user = context.store.insert_user(NewUser {
            username: "alice".into(),
            email: "alice@example.org".into(),
            password_hash: "irrelevant".into(),
        }).await.unwrap();

        let mutation = "
            mutation CreateQuiz($userId: ID!) {
                createQuiz(
                    title: \"Animal Trivia!\",
                    description: \"All about animals\",
                    userId: $userId,
                    questions: [
                        { title: \"Q1\", correctAnswer: \"A1\", order: 1 },
                        { title: \"Q2\", correctAnswer: \"A2\", order: 2 },
                    ],
                )
            }
        ";
        let mut variables = Variables::new();
        variables.insert(
            "userId".to_owned(),
            InputValue::scalar(Id::user(user.key).to_string()),
        );
        let (data, errors) = execute(mutation, variables, &context).await;
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");

        let slug = data.as_object_value().unwrap()
            .get_field_value("createQuiz").unwrap()
            .as_scalar_value::<String>().unwrap()
            .clone();
        assert!(slug.starts_with("animal-trivia-"));

        let query = "
            query QuizBySlug($slug: String!) {
                quizBySlug(slug: $slug) {
                    title
                    user { username }
                    questions { title order }
                }
            }
        ";
        let mut variables = Variables::new();
        variables.insert("slug".to_owned(), InputValue::scalar(slug));
        let (data, errors) = execute(query, variables, &context).await;
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");

        assert_eq!(data, graphql_value!({
            "quizBySlug": {
                "title": "Animal Trivia!",
                "user": { "username": "alice" },
                "questions": [
                    { "title": "Q1", "order": 1 },
                    { "title": "Q2", "order": 2 },
                ],
            },
        }));
    }

    #[tokio::test]
    async fn malformed_id_resolves_to_null() {
        let context = Context::testing();

        // A garbage ID is not a syntax error, it just refers to no node.
        let query = r#"query { user(id: "definitely-not-an-id") { username } }"#;
        let (data, errors) = execute(query, Variables::new(), &context).await;
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(data, graphql_value!({ "user": None }));
    }

    #[tokio::test]
    async fn node_dispatches_on_id_kind() {
        let context = Context::testing();
        let user = context.store.insert_user(NewUser {
            username: "alice".into(),
            email: "alice@example.org".into(),
            password_hash: "irrelevant".into(),
        }).await.unwrap();

        let query = format!(
            r#"query {{ node(id: "{}") {{ id __typename }} }}"#,
            Id::user(user.key),
        );
        let (data, errors) = execute(&query, Variables::new(), &context).await;
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");

        let id = Id::user(user.key).to_string();
        assert_eq!(data, graphql_value!({
            "node": { "id": (id), "__typename": "User" },
        }));
    }
}
