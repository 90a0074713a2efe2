//! Calculator service
//!
//! This module provides the `CalculatorService` that turns inbound transport
//! events into outbound messages by coordinating the rate service, the session
//! store, the conversation state machine, the tariff calculator and the
//! result sink.
//!
//! The service enforces the failure policy:
//! - invalid answers re-ask the same question
//! - rate fetch failures fall back or switch to manual entry
//! - persistence failures are logged and the result is still delivered
//! - computation failures abort the session with an apology
//!
//! No failure in one conversation affects another, and none stops the service.

use crate::core::conversation::{self, ConversationContext, Reply};
use crate::core::session_store::SessionStore;
use crate::core::tariff::{calculate, TariffSchedule};
use crate::core::traits::{AdminPolicy, ResultSink};
use crate::io::format::{
    render_breakdown, render_greeting, render_prompt, render_retry, CANCELLED,
    COMPUTATION_FAILED, EXPORT_DENIED, EXPORT_MISSING, HELP_TEXT, NOTHING_TO_CANCEL, NO_SESSION,
    PERSISTENCE_WARNING,
};
use crate::rate::RateService;
use crate::types::{CalculatorError, ChatId, ConversationId, Session, UserId};
use chrono::{Datelike, Local, NaiveDateTime};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default idle time after which a session is dropped
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Runtime configuration of the service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub schedule: TariffSchedule,

    /// Whether delivery, freight and broker fee are asked
    pub collect_logistics: bool,

    /// Idle time after which a session is evicted
    pub session_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            schedule: TariffSchedule::default(),
            collect_logistics: true,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

/// Transport commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    /// Privileged: send the result log
    Export,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A free-text answer
    Text(String),
    Command(Command),
}

/// One message from a user in a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user: UserId,
    pub chat: ChatId,
    pub payload: Payload,
}

impl InboundEvent {
    pub fn text(user: UserId, chat: ChatId, text: impl Into<String>) -> Self {
        InboundEvent {
            user,
            chat,
            payload: Payload::Text(text.into()),
        }
    }

    pub fn command(user: UserId, chat: ChatId, command: Command) -> Self {
        InboundEvent {
            user,
            chat,
            payload: Payload::Command(command),
        }
    }

    fn conversation(&self) -> ConversationId {
        ConversationId::new(self.user, self.chat)
    }
}

/// A message for the transport to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// A file to send as an attachment
    Document(PathBuf),
}

impl Outbound {
    fn text(text: impl Into<String>) -> Self {
        Outbound::Text(text.into())
    }
}

type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Event dispatcher for the calculator
///
/// The service is `Send + Sync`; share it behind an `Arc` and call
/// [`handle`](Self::handle) from as many tasks as needed.
pub struct CalculatorService {
    rates: RateService,
    sink: Arc<dyn ResultSink>,
    admins: Arc<dyn AdminPolicy>,
    sessions: SessionStore,
    config: ServiceConfig,
    clock: Clock,
}

impl CalculatorService {
    /// Create a new CalculatorService
    ///
    /// # Arguments
    ///
    /// * `rates` - Rate acquisition policy used at every session start
    /// * `sink` - Durable log of completed calculations
    /// * `admins` - Policy deciding who may export the log
    /// * `config` - Schedule, logistics toggle and session TTL
    pub fn new(
        rates: RateService,
        sink: Arc<dyn ResultSink>,
        admins: Arc<dyn AdminPolicy>,
        config: ServiceConfig,
    ) -> Self {
        CalculatorService {
            rates,
            sink,
            admins,
            sessions: SessionStore::new(config.session_ttl),
            config,
            clock: Arc::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the wall clock used for timestamps and the current year
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Handle one inbound event
    ///
    /// Idle sessions are swept first (at most once per quarter of the TTL),
    /// then the event is routed by payload.
    ///
    /// # Returns
    ///
    /// The messages to send back, in order. Never empty.
    pub async fn handle(&self, event: InboundEvent) -> Vec<Outbound> {
        let evicted = self.sessions.sweep(Instant::now());
        if evicted > 0 {
            debug!(evicted, "evicted idle sessions");
        }

        let id = event.conversation();
        match event.payload {
            Payload::Command(Command::Start) => self.start(id).await,
            Payload::Command(Command::Cancel) => self.cancel(id),
            Payload::Command(Command::Export) => self.export(event.user),
            Payload::Command(Command::Help) => vec![Outbound::text(HELP_TEXT)],
            Payload::Text(text) => self.answer(id, &text),
        }
    }

    /// Snapshot of the session for a conversation
    pub fn session(&self, user: UserId, chat: ChatId) -> Option<Session> {
        self.sessions.get(ConversationId::new(user, chat))
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn context(&self) -> ConversationContext {
        ConversationContext {
            current_year: (self.clock)().year(),
            collect_logistics: self.config.collect_logistics,
        }
    }

    async fn start(&self, id: ConversationId) -> Vec<Outbound> {
        let acquisition = self.rates.acquire().await;
        let step = conversation::start(acquisition.rate());

        let replaced = self.sessions.insert(id, step.session);
        info!(
            user = id.user,
            chat = id.chat,
            rate_source = ?acquisition.rate().map(|rate| rate.source),
            restarted = replaced.is_some(),
            "session started"
        );

        let mut text = render_greeting(&acquisition);
        if let Reply::Next(prompt) = step.reply {
            text.push('\n');
            text.push_str(&render_prompt(prompt));
        }
        vec![Outbound::Text(text)]
    }

    fn cancel(&self, id: ConversationId) -> Vec<Outbound> {
        match self.sessions.remove(id) {
            Some(session) => {
                let cancelled = conversation::cancel(&session);
                info!(
                    user = id.user,
                    chat = id.chat,
                    from = ?session.state,
                    to = ?cancelled.session.state,
                    "session cancelled"
                );
                vec![Outbound::text(CANCELLED)]
            }
            None => vec![Outbound::text(NOTHING_TO_CANCEL)],
        }
    }

    fn answer(&self, id: ConversationId, text: &str) -> Vec<Outbound> {
        let context = self.context();
        let step = self.sessions.update(id, |session| {
            let step = conversation::transition(session, text, &context);
            *session = step.session.clone();
            step
        });

        let Some(step) = step else {
            return vec![Outbound::text(NO_SESSION)];
        };

        match step.reply {
            Reply::Next(prompt) => {
                debug!(user = id.user, chat = id.chat, state = ?step.session.state, "answer accepted");
                vec![Outbound::Text(render_prompt(prompt))]
            }
            Reply::Retry { error, prompt } => {
                debug!(user = id.user, chat = id.chat, %error, "answer rejected");
                vec![Outbound::Text(render_retry(&error, prompt))]
            }
            Reply::Complete => {
                self.sessions.remove_finished(id);
                self.complete(id, &step.session)
            }
            Reply::Cancelled | Reply::Closed => {
                self.sessions.remove_finished(id);
                vec![Outbound::text(NO_SESSION)]
            }
        }
    }

    fn complete(&self, id: ConversationId, session: &Session) -> Vec<Outbound> {
        let computed = session
            .inputs()
            .ok_or_else(|| CalculatorError::computation("gather inputs"))
            .and_then(|inputs| calculate(inputs, &self.config.schedule, (self.clock)()));

        let result = match computed {
            Ok(result) => result,
            Err(error) => {
                error!(user = id.user, chat = id.chat, %error, "calculation failed");
                return vec![Outbound::text(COMPUTATION_FAILED)];
            }
        };

        info!(
            user = id.user,
            chat = id.chat,
            total = %result.total,
            rate_source = %result.inputs.rate.source,
            "calculation complete"
        );

        let mut replies = vec![Outbound::Text(render_breakdown(&result))];
        if let Err(error) = self.sink.append(&result) {
            let error = CalculatorError::from(error);
            warn!(user = id.user, chat = id.chat, %error, "failed to persist calculation");
            replies.push(Outbound::text(PERSISTENCE_WARNING));
        }
        replies
    }

    fn export(&self, user: UserId) -> Vec<Outbound> {
        if !self.admins.is_admin(user) {
            let error = CalculatorError::unauthorized(user, "export");
            warn!(%error, "export denied");
            return vec![Outbound::text(EXPORT_DENIED)];
        }

        match self.sink.export() {
            Some(path) => {
                info!(user, path = %path.display(), "exporting calculation log");
                vec![Outbound::Document(path)]
            }
            None => vec![Outbound::text(EXPORT_MISSING)],
        }
    }
}
