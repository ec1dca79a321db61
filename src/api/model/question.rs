use juniper::{GraphQLInputObject, graphql_object};

use crate::{
    api::{Context, Id, Node, NodeValue, err::ApiResult},
    model::{Key, NewQuestion, Question, Quiz},
};


/// A question of a quiz, as given by the client when creating the quiz.
#[derive(Debug, GraphQLInputObject)]
pub(crate) struct QuestionInput {
    pub(crate) title: String,
    pub(crate) correct_answer: String,
    pub(crate) order: i32,
}

impl QuestionInput {
    pub(crate) fn to_new_question(&self) -> NewQuestion {
        NewQuestion {
            title: self.title.clone(),
            correct_answer: self.correct_answer.clone(),
            order: self.order,
        }
    }
}

impl Node for Question {
    fn id(&self) -> Id {
        Id::question(self.key)
    }
}

#[graphql_object(Context = Context, impl = NodeValue)]
impl Question {
    fn id(&self) -> Id {
        Node::id(self)
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn correct_answer(&self) -> &str {
        &self.correct_answer
    }
    fn order(&self) -> i32 {
        self.order
    }
    fn quiz_id(&self) -> Id {
        Id::quiz(self.quiz)
    }

    /// The quiz this question belongs to, or `None` if the quiz no longer
    /// exists.
    async fn quiz(&self, context: &Context) -> ApiResult<Option<Quiz>> {
        Ok(context.store.quiz_by_key(self.quiz).await?)
    }
}

impl Question {
    pub(crate) async fn load_by_id(id: Id, context: &Context) -> ApiResult<Option<Self>> {
        match id.key_for(Id::QUESTION_KIND) {
            None => Ok(None),
            Some(key) => Ok(context.store.question_by_key(key).await?),
        }
    }

    pub(crate) async fn load_for_quiz(quiz: Key, context: &Context) -> ApiResult<Vec<Self>> {
        let mut questions = context.store.questions_by_quiz(quiz).await?;
        questions.sort_by_key(|q| q.order);

        Ok(questions)
    }
}
