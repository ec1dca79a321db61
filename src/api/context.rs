use std::sync::Arc;

use crate::{
    auth::Identity,
    store::Store,
};


/// The context that is accessible to every resolver in our API.
pub(crate) struct Context {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) identity: Arc<Identity>,
}

impl juniper::Context for Context {}

#[cfg(test)]
impl Context {
    /// A context backed by an empty in-memory store, with cheap password
    /// hashing.
    pub(crate) fn testing() -> Self {
        Self {
            store: Arc::new(crate::store::mem::MemStore::new()),
            identity: Arc::new(crate::auth::test_identity()),
        }
    }
}
