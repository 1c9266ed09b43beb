//! Update dispatcher.
//!
//! [`Dispatcher::dispatch`] takes one raw update payload and the slug of the
//! bot it arrived for, and runs:
//!
//! 1. Resolve the bot from the slug (unknown slug → [`DispatchError::NotFound`]).
//! 2. Parse the payload into an [`Update`].
//! 3. Bind the update to the bot through the [`UpdateStore`].
//! 4. Load the bot's handler chain from the [`HandlerRegistry`].
//! 5. If the update's conversation has an open form, advance that form and
//!    stop. Forms take priority over every handler.
//! 6. Otherwise run the action of the first matching handler. No match drops
//!    the update silently.
//!
//! Any error aborts the dispatch where it occurred.
//!
//! # Tower integration
//!
//! `Dispatcher` implements `tower::Service<DispatchRequest>`, so middleware
//! such as timeouts or concurrency limits can wrap it:
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use tower::timeout::TimeoutLayer;
//!
//! let service = ServiceBuilder::new()
//!     .layer(TimeoutLayer::new(Duration::from_secs(5)))
//!     .service(dispatcher);
//! ```

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tower::Service;
use tracing::{Instrument, Span, debug, field, info_span};

use chatbot_core::{Record, Update};

use crate::bot::BotResolver;
use crate::context::UpdateContext;
use crate::error::{DispatchError, DispatchResult};
use crate::form::{FormStep, FormStore, InMemoryFormStore, advance_form};
use crate::registry::HandlerRegistry;
use crate::store::{NullUpdateStore, UpdateStore};

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An open form consumed the update.
    FormAdvanced {
        /// Whether the form finished and was closed.
        completed: bool,
    },
    /// The named handler matched and its action ran.
    Handled { handler: String },
    /// Nothing matched.
    Dropped,
}

/// Routes updates to forms and handler chains.
///
/// Cheap to clone; all state lives behind `Arc`s.
#[derive(Clone)]
pub struct Dispatcher {
    resolver: Arc<dyn BotResolver>,
    registry: Arc<HandlerRegistry>,
    forms: Arc<dyn FormStore>,
    updates: Arc<dyn UpdateStore>,
}

impl Dispatcher {
    /// Creates a dispatcher with an in-memory form store and no update
    /// persistence.
    pub fn new(resolver: Arc<dyn BotResolver>, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            resolver,
            registry,
            forms: Arc::new(InMemoryFormStore::new()),
            updates: Arc::new(NullUpdateStore),
        }
    }

    pub fn with_forms(mut self, forms: Arc<dyn FormStore>) -> Self {
        self.forms = forms;
        self
    }

    pub fn with_update_store(mut self, updates: Arc<dyn UpdateStore>) -> Self {
        self.updates = updates;
        self
    }

    pub fn resolver(&self) -> &Arc<dyn BotResolver> {
        &self.resolver
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn forms(&self) -> &Arc<dyn FormStore> {
        &self.forms
    }

    /// Dispatches one update payload for the bot with `bot_slug`.
    pub async fn dispatch(&self, payload: &Value, bot_slug: &str) -> DispatchResult<DispatchOutcome> {
        let span = info_span!("dispatch", bot = %bot_slug, update_id = field::Empty);
        self.dispatch_inner(payload, bot_slug).instrument(span).await
    }

    async fn dispatch_inner(
        &self,
        payload: &Value,
        bot_slug: &str,
    ) -> DispatchResult<DispatchOutcome> {
        let bot = self.resolver.resolve(bot_slug)?;

        let update = Update::from_payload(payload)?;
        Span::current().record("update_id", update.update_id);

        self.updates
            .bind(&bot, &update)
            .await
            .map_err(DispatchError::Store)?;

        let chain = self.registry.handlers_for(&bot)?;
        let ctx = Arc::new(UpdateContext::new(bot, update, Arc::clone(&self.forms)));

        if let Some(conversation) = ctx.conversation()
            && let Some(form) = self.forms.active(&conversation).await
        {
            debug!(
                conversation = %conversation,
                chat_id = conversation.chat_id,
                "Open form takes the update"
            );
            let step = advance_form(self.forms.as_ref(), &conversation, &form, &ctx).await?;
            return Ok(DispatchOutcome::FormAdvanced {
                completed: step == FormStep::Complete,
            });
        }

        let Some(handler) = chain.find(&ctx) else {
            debug!(kind = %ctx.update().kind(), "No handler matched, update dropped");
            return Ok(DispatchOutcome::Dropped);
        };

        debug!(handler = handler.name(), "Handler matched");
        handler.action().run(Arc::clone(&ctx)).await?;
        Ok(DispatchOutcome::Handled {
            handler: handler.name().to_string(),
        })
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// One unit of work for the tower service.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub payload: Value,
    pub bot_slug: String,
}

impl DispatchRequest {
    pub fn new(payload: Value, bot_slug: impl Into<String>) -> Self {
        Self {
            payload,
            bot_slug: bot_slug.into(),
        }
    }
}

impl Service<DispatchRequest> for Dispatcher {
    type Response = DispatchOutcome;
    type Error = DispatchError;
    type Future = BoxFuture<'static, DispatchResult<DispatchOutcome>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: DispatchRequest) -> Self::Future {
        let dispatcher = self.clone();
        async move {
            dispatcher
                .dispatch(&request.payload, &request.bot_slug)
                .await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{BotIdentity, StaticBotResolver};
    use crate::error::HandlerResult;
    use crate::form::{Conversation, Form, FormFactory};
    use crate::handler::{CommandHandler, DefaultHandler, callback};
    use crate::registry::HandlerCatalog;
    use crate::store::MemoryUpdateStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tower::ServiceExt;

    type Log = Arc<Mutex<Vec<String>>>;

    fn text_update(update_id: i64, chat_id: i64, text: &str) -> Value {
        json!({
            "update_id": update_id,
            "message": {
                "message_id": update_id,
                "from": {"id": chat_id, "is_bot": false, "first_name": "Tester"},
                "date": 1441645532,
                "chat": {"id": chat_id, "type": "private"},
                "text": text,
            },
        })
    }

    fn recorder(log: &Log, label: &'static str) -> crate::handler::Callback {
        let log = Arc::clone(log);
        callback(move |ctx: Arc<UpdateContext>| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(format!("{label}:{}", ctx.text().unwrap_or_default()));
                Ok(())
            }
        })
    }

    /// Collects every update until it sees "done".
    struct Collect {
        log: Log,
    }

    #[async_trait]
    impl Form for Collect {
        async fn advance(&mut self, ctx: &UpdateContext) -> HandlerResult<FormStep> {
            let text = ctx.text().unwrap_or_default().to_string();
            self.log.lock().push(format!("form:{text}"));
            Ok(if text == "done" {
                FormStep::Complete
            } else {
                FormStep::Continue
            })
        }
    }

    struct CollectFactory {
        log: Log,
    }

    impl FormFactory for CollectFactory {
        fn name(&self) -> &str {
            "collect"
        }

        fn create(&self, _conversation: &Conversation) -> Box<dyn Form> {
            Box::new(Collect {
                log: Arc::clone(&self.log),
            })
        }
    }

    fn dispatcher(log: &Log) -> Dispatcher {
        let start = recorder(log, "start");
        let fallback = recorder(log, "default");
        let factory = Arc::new(CollectFactory {
            log: Arc::clone(log),
        });
        let catalog = HandlerCatalog::new()
            .with("demo", move || {
                vec![
                    CommandHandler::new("start", "/start")
                        .callback(start.clone())
                        .boxed(),
                    CommandHandler::new("collect", "/collect")
                        .form(factory.clone())
                        .boxed(),
                    DefaultHandler::new("default")
                        .callback(fallback.clone())
                        .boxed(),
                ]
            })
            .with("empty", Vec::new);
        let resolver = StaticBotResolver::new()
            .with(BotIdentity::new("demo-slug", "Demo", "demo"))
            .with(BotIdentity::new("quiet-slug", "Quiet", "empty"));

        Dispatcher::new(Arc::new(resolver), Arc::new(HandlerRegistry::new(catalog)))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().clone()
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let log = Log::default();
        let dispatcher = dispatcher(&log);

        let outcome = dispatcher
            .dispatch(&text_update(1, 10, "/start"), "demo-slug")
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Handled { handler: "start".into() });

        let outcome = dispatcher
            .dispatch(&text_update(2, 10, "hello"), "demo-slug")
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Handled { handler: "default".into() });

        assert_eq!(entries(&log), vec!["start:/start", "default:hello"]);
    }

    #[tokio::test]
    async fn test_empty_chain_drops_update() {
        let log = Log::default();
        let outcome = dispatcher(&log)
            .dispatch(&text_update(1, 10, "/start"), "quiet-slug")
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Dropped);
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_open_form_takes_priority() {
        let log = Log::default();
        let dispatcher = dispatcher(&log);

        dispatcher
            .dispatch(&text_update(1, 10, "/collect"), "demo-slug")
            .await
            .unwrap();
        let outcome = dispatcher
            .dispatch(&text_update(2, 10, "/start"), "demo-slug")
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::FormAdvanced { completed: false });

        // Another chat is not captured.
        dispatcher
            .dispatch(&text_update(3, 11, "/start"), "demo-slug")
            .await
            .unwrap();

        let outcome = dispatcher
            .dispatch(&text_update(4, 10, "done"), "demo-slug")
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::FormAdvanced { completed: true });

        dispatcher
            .dispatch(&text_update(5, 10, "/start"), "demo-slug")
            .await
            .unwrap();

        assert_eq!(
            entries(&log),
            vec![
                "form:/collect",
                "form:/start",
                "start:/start",
                "form:done",
                "start:/start",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_slug_runs_nothing() {
        let log = Log::default();
        let err = dispatcher(&log)
            .dispatch(&text_update(1, 10, "/start"), "nope")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_payload_aborts() {
        let log = Log::default();
        let dispatcher = dispatcher(&log);

        let err = dispatcher
            .dispatch(&json!({"message": {}}), "demo-slug")
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = dispatcher.dispatch(&json!("text"), "demo-slug").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "invalid Update payload: expected an object, found a string");
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_updates_are_bound_before_handling() {
        let log = Log::default();
        let store = Arc::new(MemoryUpdateStore::new());
        let dispatcher = dispatcher(&log).with_update_store(store.clone());

        dispatcher
            .dispatch(&text_update(1, 10, "hi"), "demo-slug")
            .await
            .unwrap();
        let err = dispatcher
            .dispatch(&text_update(1, 10, "hi"), "demo-slug")
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Store(_)));
        assert_eq!(err.to_string(), "update 1 already bound to 'demo-slug'");
        assert_eq!(store.updates("demo-slug").len(), 1);
        assert_eq!(entries(&log), vec!["default:hi"]);
    }

    async fn fail(_ctx: Arc<UpdateContext>) -> HandlerResult {
        Err("boom".into())
    }

    #[tokio::test]
    async fn test_handler_error_is_propagated() {
        let failing = callback(fail);
        let catalog = HandlerCatalog::new().with("fail", move || {
            vec![DefaultHandler::new("default").callback(failing.clone()).boxed()]
        });
        let resolver = StaticBotResolver::new().with(BotIdentity::new("f", "F", "fail"));
        let dispatcher = Dispatcher::new(Arc::new(resolver), Arc::new(HandlerRegistry::new(catalog)));

        let err = dispatcher
            .dispatch(&text_update(1, 10, "x"), "f")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(err.to_string(), "boom");
    }

    /// Fails on the first update whose text is "explode".
    struct Fragile;

    #[async_trait]
    impl Form for Fragile {
        async fn advance(&mut self, ctx: &UpdateContext) -> HandlerResult<FormStep> {
            match ctx.text() {
                Some("explode") | Some("/explode") => Err("boom".into()),
                _ => Ok(FormStep::Continue),
            }
        }
    }

    struct FragileFactory;

    impl FormFactory for FragileFactory {
        fn name(&self) -> &str {
            "fragile"
        }

        fn create(&self, _conversation: &Conversation) -> Box<dyn Form> {
            Box::new(Fragile)
        }
    }

    fn fragile_dispatcher(log: &Log) -> (Dispatcher, Arc<InMemoryFormStore>) {
        let start = recorder(log, "start");
        let catalog = HandlerCatalog::new().with("fragile", move || {
            vec![
                CommandHandler::new("start", "/start").callback(start.clone()).boxed(),
                CommandHandler::new("open", "/open").form(Arc::new(FragileFactory)).boxed(),
                CommandHandler::new("explode", "/explode")
                    .form(Arc::new(FragileFactory))
                    .boxed(),
            ]
        });
        let resolver = StaticBotResolver::new().with(BotIdentity::new("fr", "Fr", "fragile"));
        let forms = Arc::new(InMemoryFormStore::new());
        let dispatcher = Dispatcher::new(Arc::new(resolver), Arc::new(HandlerRegistry::new(catalog)))
            .with_forms(forms.clone());
        (dispatcher, forms)
    }

    #[tokio::test]
    async fn test_form_failing_on_open_is_closed() {
        let log = Log::default();
        let (dispatcher, forms) = fragile_dispatcher(&log);

        let err = dispatcher
            .dispatch(&text_update(1, 10, "/explode"), "fr")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Form(_)));
        assert_eq!(err.to_string(), "boom");
        assert!(forms.is_empty());

        let outcome = dispatcher
            .dispatch(&text_update(2, 10, "/start"), "fr")
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Handled { handler: "start".into() });
        assert_eq!(entries(&log), vec!["start:/start"]);
    }

    #[tokio::test]
    async fn test_form_failing_midway_is_closed() {
        let log = Log::default();
        let (dispatcher, forms) = fragile_dispatcher(&log);

        dispatcher
            .dispatch(&text_update(1, 10, "/open"), "fr")
            .await
            .unwrap();
        assert!(forms.is_open(&Conversation::new("fr", 10)));

        let err = dispatcher
            .dispatch(&text_update(2, 10, "explode"), "fr")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(forms.is_empty());

        for update_id in 3..6 {
            let outcome = dispatcher
                .dispatch(&text_update(update_id, 10, "/start"), "fr")
                .await
                .unwrap();
            assert_eq!(outcome, DispatchOutcome::Handled { handler: "start".into() });
        }
    }

    #[tokio::test]
    async fn test_tower_service() {
        let log = Log::default();
        let outcome = dispatcher(&log)
            .oneshot(DispatchRequest::new(text_update(1, 10, "/start"), "demo-slug"))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Handled { handler: "start".into() });
    }
}
