use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    Classifier, CompleteOptions, Completer, Completion, CompletionReason, Document, DomainError,
    Message, MessageRole, PromptTemplate, QueryOptions, ScoredDocument, VectorIndex,
};

const INITIAL_TEMPLATE: &str = r#"Answer the question using only the provided context.

Context:
${var:context}

Question: ${var:question}

Answer:"#;

const REFINE_TEMPLATE: &str = r#"The original question is: ${var:question}

The existing answer is:
${var:answer}

Refine the existing answer using the additional context below. If the context is not useful, keep the existing answer.

Context:
${var:context}

Refined answer:"#;

/// Retrieval-augmented answering that folds evidence one hit at a time.
///
/// The latest user message becomes the query, optionally rewritten into a
/// standalone question by a contextualizer when earlier turns exist and
/// narrowed by classifier-derived metadata filters. Each ranked hit then
/// refines the running answer through the completer, in rank order.
pub struct RefineChain {
    index: Arc<dyn VectorIndex>,
    completer: Arc<dyn Completer>,
    contextualizer: Option<Arc<dyn Completer>>,
    classifiers: HashMap<String, Arc<dyn Classifier>>,
    limit: Option<usize>,
    distance: Option<f32>,
    initial: PromptTemplate,
    refine: PromptTemplate,
}

impl RefineChain {
    pub fn new(index: Arc<dyn VectorIndex>, completer: Arc<dyn Completer>) -> Self {
        Self {
            index,
            completer,
            contextualizer: None,
            classifiers: HashMap::new(),
            limit: None,
            distance: None,
            initial: PromptTemplate::new(INITIAL_TEMPLATE),
            refine: PromptTemplate::new(REFINE_TEMPLATE),
        }
    }

    pub fn with_contextualizer(mut self, contextualizer: Arc<dyn Completer>) -> Self {
        self.contextualizer = Some(contextualizer);
        self
    }

    pub fn with_classifier(mut self, key: impl Into<String>, classifier: Arc<dyn Classifier>) -> Self {
        self.classifiers.insert(key.into(), classifier);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Fold the ranked hits into one completion.
    ///
    /// Zero hits yield `None` without any completer call; callers must
    /// treat that as "no answer", not a failure.
    pub async fn answer(
        &self,
        messages: &[Message],
    ) -> Result<Option<Completion>, DomainError> {
        let last = messages
            .last()
            .ok_or_else(|| DomainError::validation("empty message history"))?;

        if last.role != MessageRole::User {
            return Err(DomainError::validation("last message must be from user"));
        }

        let mut query = last.content.clone();

        if let Some(ref contextualizer) = self.contextualizer {
            if messages.len() > 1 {
                let rewritten = contextualizer
                    .complete(messages, CompleteOptions::default())
                    .await?;

                query = rewritten.content().trim().to_string();
            }
        }

        let mut filters = HashMap::new();

        for (key, classifier) in &self.classifiers {
            match classifier.classify(&query).await {
                Ok(label) if !label.is_empty() => {
                    filters.insert(key.clone(), label);
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::debug!(filter = %key, %error, "classifier skipped");
                }
            }
        }

        let mut query_options = QueryOptions::default().with_filters(filters);

        if let Some(limit) = self.limit {
            query_options = query_options.with_limit(limit);
        }

        if let Some(distance) = self.distance {
            query_options = query_options.with_distance(distance);
        }

        let hits = self.index.query(&query, query_options).await?;

        let question = query.trim().to_string();
        let mut answer = String::new();
        let mut result = None;

        for hit in &hits {
            let prompt = self.render_step(&question, &answer, hit);

            let completion = self
                .completer
                .complete(&[Message::user(prompt)], CompleteOptions::default())
                .await?;

            answer = completion.content().trim().to_string();
            result = Some(completion);
        }

        Ok(result)
    }

    fn render_step(&self, question: &str, answer: &str, hit: &ScoredDocument) -> String {
        let template = if answer.is_empty() {
            &self.initial
        } else {
            &self.refine
        };

        let values = HashMap::from([
            ("question".to_string(), question.to_string()),
            ("answer".to_string(), answer.to_string()),
            ("context".to_string(), render_context(&hit.document)),
        ]);

        template.render(&values)
    }
}

#[async_trait]
impl Completer for RefineChain {
    async fn complete(
        &self,
        messages: &[Message],
        _options: CompleteOptions,
    ) -> Result<Completion, DomainError> {
        let completion = self.answer(messages).await?;

        // No evidence means no answer, never a fabricated one
        Ok(completion.unwrap_or_else(|| {
            Completion::new(String::new(), Message::assistant("")).with_reason(CompletionReason::Stop)
        }))
    }
}

/// Metadata lines followed by the chunk content
fn render_context(document: &Document) -> String {
    let mut lines: Vec<String> = document
        .metadata
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();

    lines.sort();
    lines.push(document.content.trim().to_string());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classify::mock::MockClassifier;
    use crate::domain::index::mock::MockVectorIndex;
    use crate::domain::llm::mock::MockCompleter;

    fn hit(content: &str, score: f32) -> ScoredDocument {
        ScoredDocument {
            document: Document::new(content),
            score,
            distance: Some(1.0 - score),
        }
    }

    #[tokio::test]
    async fn test_rejects_non_user_tail() {
        let chain = RefineChain::new(
            Arc::new(MockVectorIndex::new()),
            Arc::new(MockCompleter::new()),
        );

        let error = chain
            .answer(&[Message::user("q"), Message::assistant("a")])
            .await
            .unwrap_err();

        assert!(error.to_string().contains("last message must be from user"));
    }

    #[tokio::test]
    async fn test_zero_hits_yield_no_answer() {
        let completer = Arc::new(MockCompleter::new());
        let chain = RefineChain::new(Arc::new(MockVectorIndex::new()), completer.clone());

        let answer = chain.answer(&[Message::user("q")]).await.unwrap();

        assert!(answer.is_none());
        assert_eq!(completer.call_count(), 0);

        // The completer surface maps "no answer" to an empty completion
        let completion = chain
            .complete(&[Message::user("q")], CompleteOptions::default())
            .await
            .unwrap();

        assert_eq!(completion.content(), "");
        assert_eq!(completion.reason, Some(CompletionReason::Stop));
    }

    #[tokio::test]
    async fn test_folds_hits_in_rank_order() {
        let index = Arc::new(
            MockVectorIndex::new()
                .with_results(vec![hit("first chunk", 0.9), hit("second chunk", 0.7)]),
        );

        let completer = Arc::new(
            MockCompleter::new()
                .with_completion(Completion::new("c1", Message::assistant("draft")))
                .with_completion(Completion::new("c2", Message::assistant("refined"))),
        );

        let chain = RefineChain::new(index, completer.clone());

        let answer = chain
            .answer(&[Message::user("what happened?")])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(answer.content(), "refined");

        let calls = completer.calls();
        assert_eq!(calls.len(), 2);

        let first_prompt = &calls[0].0[0].content;
        assert!(first_prompt.contains("first chunk"));
        assert!(first_prompt.contains("Question: what happened?"));
        assert!(!first_prompt.contains("existing answer"));

        let second_prompt = &calls[1].0[0].content;
        assert!(second_prompt.contains("second chunk"));
        assert!(second_prompt.contains("draft"));
        assert!(second_prompt.contains("existing answer"));
    }

    #[tokio::test]
    async fn test_contextualizer_rewrites_multi_turn_query() {
        let index = Arc::new(MockVectorIndex::new());

        let contextualizer = Arc::new(MockCompleter::new().with_completion(Completion::new(
            "ctx",
            Message::assistant("  standalone question  "),
        )));

        let chain = RefineChain::new(index.clone(), Arc::new(MockCompleter::new()))
            .with_contextualizer(contextualizer.clone());

        let messages = vec![
            Message::user("tell me about rust"),
            Message::assistant("rust is a language"),
            Message::user("when was it released?"),
        ];

        chain.answer(&messages).await.unwrap();

        assert_eq!(contextualizer.call_count(), 1);
        assert_eq!(contextualizer.calls()[0].0.len(), 3);

        let queries = index.queries();
        assert_eq!(queries[0].0, "standalone question");
    }

    #[tokio::test]
    async fn test_contextualizer_skipped_on_single_turn() {
        let index = Arc::new(MockVectorIndex::new());
        let contextualizer = Arc::new(MockCompleter::new());

        let chain = RefineChain::new(index.clone(), Arc::new(MockCompleter::new()))
            .with_contextualizer(contextualizer.clone());

        chain.answer(&[Message::user("plain question")]).await.unwrap();

        assert_eq!(contextualizer.call_count(), 0);
        assert_eq!(index.queries()[0].0, "plain question");
    }

    #[tokio::test]
    async fn test_classifiers_feed_query_filters() {
        let index = Arc::new(MockVectorIndex::new());

        let chain = RefineChain::new(index.clone(), Arc::new(MockCompleter::new()))
            .with_classifier("lang", Arc::new(MockClassifier::new("en")))
            .with_classifier("topic", Arc::new(MockClassifier::new("").with_error("down")))
            .with_classifier("kind", Arc::new(MockClassifier::new("")))
            .with_limit(4)
            .with_distance(0.5);

        chain.answer(&[Message::user("hello world")]).await.unwrap();

        let (_, options) = &index.queries()[0];

        assert_eq!(options.filters.len(), 1);
        assert_eq!(options.filters.get("lang").map(String::as_str), Some("en"));
        assert_eq!(options.limit, Some(4));
        assert_eq!(options.distance, Some(0.5));
    }

    #[tokio::test]
    async fn test_index_failure_propagates() {
        let index = Arc::new(MockVectorIndex::new().with_error("index offline"));
        let chain = RefineChain::new(index, Arc::new(MockCompleter::new()));

        let result = chain.answer(&[Message::user("q")]).await;

        assert!(result.is_err());
    }
}
