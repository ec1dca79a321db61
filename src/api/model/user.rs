use juniper::graphql_object;

use crate::{
    api::{
        Context, Id, Node, NodeValue,
        err::{ApiResult, duplicate_user, invalid_credentials},
    },
    model::{Key, NewUser, Quiz, User},
};


impl Node for User {
    fn id(&self) -> Id {
        Id::user(self.key)
    }
}

#[graphql_object(Context = Context, impl = NodeValue)]
impl User {
    fn id(&self) -> Id {
        Node::id(self)
    }
    fn username(&self) -> &str {
        &self.username
    }
    fn email(&self) -> &str {
        &self.email
    }

    /// All quizzes owned by this user.
    async fn quizzes(&self, context: &Context) -> ApiResult<Vec<Quiz>> {
        Quiz::load_for_user(self.key, context).await
    }
}

impl User {
    pub(crate) async fn load_by_id(id: Id, context: &Context) -> ApiResult<Option<Self>> {
        match id.key_for(Id::USER_KIND) {
            None => Ok(None),
            Some(key) => Self::load_by_key(key, context).await,
        }
    }

    pub(crate) async fn load_by_key(key: Key, context: &Context) -> ApiResult<Option<Self>> {
        Ok(context.store.user_by_key(key).await?)
    }

    /// Registers a new user and returns a session token for it.
    pub(crate) async fn register(
        username: String,
        email: String,
        password: String,
        context: &Context,
    ) -> ApiResult<String> {
        // This check-then-insert is not atomic, so two racing registrations
        // with the same email can both succeed. The lookup in `login` is by
        // email and simply uses the first match then.
        if context.store.user_by_email(&email).await?.is_some() {
            return Err(duplicate_user!(
                key = "register.duplicate-email",
                "User with this email address already exists",
            ));
        }

        let password_hash = context.identity.hash(password).await?;
        let user = context.store.insert_user(NewUser { username, email, password_hash }).await?;

        Ok(context.identity.issue_token(&user)?)
    }

    /// Checks the given credentials and returns a session token.
    pub(crate) async fn login(
        email: &str,
        password: &str,
        context: &Context,
    ) -> ApiResult<String> {
        let user = context.store.user_by_email(email).await?;

        // Always verify against some hash, even if no user was found. That
        // way, an unknown email takes just as long as a wrong password and
        // response timing does not reveal which emails are registered.
        let hash = user.as_ref()
            .map(|user| user.password_hash.clone())
            .unwrap_or_else(|| context.identity.dummy_hash().to_owned());
        let password_matches = context.identity.verify(password.to_owned(), hash).await?;

        match user {
            Some(user) if password_matches => Ok(context.identity.issue_token(&user)?),
            _ => Err(invalid_credentials!(key = "login.invalid-credentials", "Invalid Credentials")),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    async fn register_alice(context: &Context) -> String {
        User::register(
            "alice".into(),
            "alice@example.org".into(),
            "hunter2".into(),
            context,
        ).await.expect("registration failed")
    }

    #[tokio::test]
    async fn register_returns_valid_token() {
        let context = Context::testing();
        let token = register_alice(&context).await;

        let claims = context.identity.verify_token(&token).unwrap();
        assert_eq!(claims.username, "alice");

        // The user is actually stored, with a hashed password.
        let user = context.store.user_by_email("alice@example.org").await.unwrap().unwrap();
        assert_eq!(user.key, claims.sub);
        assert_ne!(user.password_hash, "hunter2");
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let context = Context::testing();
        register_alice(&context).await;

        let err = User::register(
            "also-alice".into(),
            "alice@example.org".into(),
            "password".into(),
            &context,
        ).await.unwrap_err();
        assert_eq!(err.msg, "User with this email address already exists");
    }

    #[tokio::test]
    async fn login_with_correct_password() {
        let context = Context::testing();
        register_alice(&context).await;

        let token = User::login("alice@example.org", "hunter2", &context).await.unwrap();
        let claims = context.identity.verify_token(&token).unwrap();
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn user_without_quizzes_has_empty_list() {
        let context = Context::testing();
        register_alice(&context).await;

        let user = context.store.user_by_email("alice@example.org").await.unwrap().unwrap();
        let quizzes = Quiz::load_for_user(user.key, &context).await.unwrap();
        assert!(quizzes.is_empty());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let context = Context::testing();
        register_alice(&context).await;

        // Wrong password and unknown email must result in the exact same
        // error message.
        let wrong_password = User::login("alice@example.org", "hunter3", &context)
            .await
            .unwrap_err();
        let unknown_email = User::login("bob@example.org", "hunter2", &context)
            .await
            .unwrap_err();

        assert_eq!(wrong_password.msg, "Invalid Credentials");
        assert_eq!(unknown_email.msg, "Invalid Credentials");
    }
}
