use crate::{
    api::{Id, Context},
    model::{Question, Quiz, User},
};


/// A node with a globally unique ID. Mostly useful for relay.
#[juniper::graphql_interface(Context = Context, for = [User, Quiz, Question])]
pub(crate) trait Node {
    fn id(&self) -> Id;
}
