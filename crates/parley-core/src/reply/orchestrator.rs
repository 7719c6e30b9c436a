//! Message orchestrator: the entry point for every new human message.
//!
//! `submit` runs synchronously through authorization, persistence, and
//! routing, then returns. Replies are handed to the [`ReplyScheduler`] as
//! independent delayed tasks that the caller never awaits.
//!
//! Two loop-prevention layers apply, in this order:
//! 1. If the message right before the new one is automated, nothing is
//!    scheduled at all.
//! 2. In groups, the [`LoopGuard`] inspects the recent window after the new
//!    message is stored and can silence bots (filler replies still run).

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::FutureExt;
use parley_types::config::OrchestrationConfig;
use parley_types::conversation::{BotMember, Conversation, GroupMember};
use parley_types::error::ChatError;
use parley_types::message::{AutoReplyStatus, Message, SenderKind, SubmitOutcome};
use parley_types::persona::Persona;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::loop_guard::LoopGuard;
use super::responder::ReplyGenerator;
use super::scheduler::{ReplyScheduler, sample_delay};
use super::selector::select_responders;
use crate::repository::SortOrder;
use crate::repository::conversation::ConversationRepository;
use crate::repository::message::MessageRepository;
use crate::service::access::authorize;

/// Canned acknowledgements posted on behalf of other human group members.
pub const FILLER_REPLIES: [&str; 10] = [
    "That's interesting! Tell me more.",
    "I agree with you.",
    "Great point!",
    "I see what you mean.",
    "That makes sense.",
    "Thanks for sharing!",
    "I was thinking the same thing.",
    "Absolutely!",
    "Good question!",
    "Let me think about that...",
];

/// Drives automated replies for incoming human messages.
///
/// Generic over the repositories and the reply generator so tests can run
/// it against in-memory stores and a [`ManualScheduler`](super::scheduler::ManualScheduler).
pub struct MessageOrchestrator<C, M, G> {
    conversations: Arc<C>,
    messages: Arc<M>,
    responder: Arc<G>,
    scheduler: Arc<dyn ReplyScheduler>,
    loop_guard: LoopGuard,
    config: OrchestrationConfig,
    rng: Mutex<StdRng>,
}

impl<C, M, G> MessageOrchestrator<C, M, G>
where
    C: ConversationRepository,
    M: MessageRepository + 'static,
    G: ReplyGenerator + 'static,
{
    pub fn new(
        conversations: Arc<C>,
        messages: Arc<M>,
        responder: Arc<G>,
        scheduler: Arc<dyn ReplyScheduler>,
        config: OrchestrationConfig,
    ) -> Self {
        Self {
            conversations,
            messages,
            responder,
            scheduler,
            loop_guard: LoopGuard::new(config.loop_window as usize),
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the random source used for selection, delays, and fillers.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Store a human message from `user_id` and schedule automated replies.
    ///
    /// Errors only for invalid content, access failures, or when the human
    /// message itself cannot be stored. Nothing is persisted on error.
    pub async fn submit(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        content: &str,
    ) -> Result<SubmitOutcome, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::Validation("message content cannot be empty".to_string()));
        }

        let conversation = authorize(self.conversations.as_ref(), &user_id, &conversation_id).await?;

        let preceding_automated = self
            .messages
            .list_messages(&conversation_id, SortOrder::Desc, Some(1))
            .await?
            .first()
            .is_some_and(Message::is_automated);

        let message = Message::new(conversation_id, content, SenderKind::Human, Some(user_id));
        self.messages.save_message(&message).await?;

        if preceding_automated {
            info!(
                conversation_id = %conversation_id,
                "preceding message was automated, skipping replies"
            );
            return Ok(SubmitOutcome {
                message,
                status: AutoReplyStatus::SkippedPrecedingAutomated,
                bot_replies: 0,
                filler_replies: 0,
            });
        }

        if !conversation.is_group {
            self.schedule_direct_reply(&message);
            return Ok(SubmitOutcome {
                message,
                status: AutoReplyStatus::Scheduled,
                bot_replies: 1,
                filler_replies: 0,
            });
        }

        self.route_group_message(&conversation, message, user_id).await
    }

    async fn route_group_message(
        &self,
        conversation: &Conversation,
        message: Message,
        sender_id: Uuid,
    ) -> Result<SubmitOutcome, ChatError> {
        let members = self.conversations.list_members(&conversation.id).await?;
        let bots: Vec<BotMember> = members.iter().filter_map(GroupMember::as_bot).collect();
        let other_humans: Vec<Uuid> = members
            .iter()
            .filter_map(GroupMember::user_id)
            .filter(|id| *id != sender_id)
            .collect();

        let safe = match self
            .loop_guard
            .is_auto_response_safe(self.messages.as_ref(), &conversation.id)
            .await
        {
            Ok(safe) => safe,
            Err(e) => {
                warn!(
                    conversation_id = %conversation.id,
                    error = %e,
                    "loop guard lookup failed, treating as unsafe"
                );
                false
            }
        };

        let (status, bot_replies) = if !safe {
            (AutoReplyStatus::SkippedLoopGuard, 0)
        } else if bots.is_empty() {
            (AutoReplyStatus::SkippedNoBots, 0)
        } else {
            let selected = {
                let mut rng = self.rng();
                select_responders(&message.content, &bots, self.config.strategy, &mut *rng)
            };
            for bot in &selected {
                self.schedule_bot_reply(&message, bot);
            }
            (AutoReplyStatus::Scheduled, selected.len())
        };

        for member_user in &other_humans {
            self.schedule_filler_reply(conversation.id, *member_user);
        }

        debug!(
            conversation_id = %conversation.id,
            status = %status,
            bot_replies,
            filler_replies = other_humans.len(),
            "group message routed"
        );

        Ok(SubmitOutcome {
            message,
            status,
            bot_replies,
            filler_replies: other_humans.len(),
        })
    }

    /// One reply from the implicit `friendly` responder of a direct conversation.
    fn schedule_direct_reply(&self, message: &Message) {
        let delay = sample_delay(&self.config.direct_delay_ms, &mut *self.rng());
        self.schedule_generated(
            message,
            Persona::Friendly,
            SenderKind::AutomatedSingle,
            None,
            delay,
        );
    }

    fn schedule_bot_reply(&self, message: &Message, bot: &BotMember) {
        let delay = sample_delay(&self.config.bot_delay_ms, &mut *self.rng());
        self.schedule_generated(
            message,
            bot.persona.clone(),
            SenderKind::AutomatedGroupBot,
            Some(bot.member_id),
            delay,
        );
    }

    fn schedule_generated(
        &self,
        message: &Message,
        persona: Persona,
        sender_kind: SenderKind,
        sender_id: Option<Uuid>,
        delay: Duration,
    ) {
        let messages = Arc::clone(&self.messages);
        let responder = Arc::clone(&self.responder);
        let conversation_id = message.conversation_id;
        let text = message.content.clone();

        let task = async move {
            let content = responder.generate(&text, &persona).await;
            let reply = Message::new(conversation_id, content, sender_kind, sender_id);
            match messages.save_message(&reply).await {
                Ok(()) => debug!(
                    conversation_id = %conversation_id,
                    persona = %persona,
                    "automated reply stored"
                ),
                Err(e) => warn!(
                    conversation_id = %conversation_id,
                    persona = %persona,
                    error = %e,
                    "failed to store automated reply"
                ),
            }
        };
        self.scheduler.schedule(delay, task.boxed());
    }

    /// A canned acknowledgement posted as `member_user`.
    fn schedule_filler_reply(&self, conversation_id: Uuid, member_user: Uuid) {
        let (content, delay) = {
            let mut rng = self.rng();
            let content = FILLER_REPLIES
                .choose(&mut *rng)
                .copied()
                .unwrap_or(FILLER_REPLIES[0]);
            (content, sample_delay(&self.config.filler_delay_ms, &mut *rng))
        };
        let messages = Arc::clone(&self.messages);

        let task = async move {
            let reply = Message::new(conversation_id, content, SenderKind::Human, Some(member_user));
            if let Err(e) = messages.save_message(&reply).await {
                warn!(
                    conversation_id = %conversation_id,
                    member = %member_user,
                    error = %e,
                    "failed to store filler reply"
                );
            }
        };
        self.scheduler.schedule(delay, task.boxed());
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::cache::ResponseCache;
    use crate::reply::responder::{PersonaResponder, templates_for};
    use crate::reply::scheduler::ManualScheduler;
    use crate::test_support::MemoryStore;
    use parley_types::config::{CacheConfig, DelayRange, ResponseStrategy};

    struct Harness {
        store: MemoryStore,
        scheduler: Arc<ManualScheduler>,
        orchestrator: MessageOrchestrator<MemoryStore, MemoryStore, PersonaResponder>,
    }

    fn harness_with(config: OrchestrationConfig) -> Harness {
        let store = MemoryStore::new();
        let scheduler = Arc::new(ManualScheduler::new());
        let cache = Arc::new(ResponseCache::new(&CacheConfig::default()));
        let responder = Arc::new(PersonaResponder::with_rng(
            cache,
            Duration::ZERO,
            StdRng::seed_from_u64(11),
        ));
        let orchestrator = MessageOrchestrator::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            responder,
            scheduler.clone(),
            config,
        )
        .with_rng(StdRng::seed_from_u64(42));
        Harness {
            store,
            scheduler,
            orchestrator,
        }
    }

    fn harness() -> Harness {
        harness_with(OrchestrationConfig::default())
    }

    async fn group(store: &MemoryStore, owner: Uuid) -> Conversation {
        store
            .create_conversation(&Conversation::new(owner, "group", true))
            .await
            .unwrap()
    }

    fn is_reply_from(persona: &Persona, text: &str, reply: &str) -> bool {
        templates_for(persona)
            .iter()
            .any(|t| t.replace("{message}", text) == reply)
    }

    #[tokio::test]
    async fn bug_report_in_group_gets_one_technical_reply() {
        let h = harness();
        let owner = Uuid::now_v7();
        let conv = group(&h.store, owner).await;
        let technical = GroupMember::bot(conv.id, Persona::Technical);
        h.store.add_member(&technical).await.unwrap();
        h.store
            .add_member(&GroupMember::bot(conv.id, Persona::CustomerService))
            .await
            .unwrap();

        let outcome = h
            .orchestrator
            .submit(owner, conv.id, "I need help with a bug")
            .await
            .unwrap();
        assert_eq!(outcome.status, AutoReplyStatus::Scheduled);
        assert_eq!(outcome.bot_replies, 1);
        assert_eq!(outcome.filler_replies, 0);
        assert_eq!(h.scheduler.pending(), 1);

        h.scheduler.run_all().await;
        let stored = h.store.messages_in(&conv.id);
        assert_eq!(stored.len(), 2);
        let reply = &stored[1];
        assert_eq!(reply.sender_kind, SenderKind::AutomatedGroupBot);
        assert_eq!(reply.sender_id, Some(technical.id));
        assert!(is_reply_from(&Persona::Technical, "I need help with a bug", &reply.content));
    }

    #[tokio::test]
    async fn message_after_automated_one_schedules_nothing() {
        let h = harness();
        let owner = Uuid::now_v7();
        let conv = group(&h.store, owner).await;
        h.store
            .add_member(&GroupMember::bot(conv.id, Persona::Technical))
            .await
            .unwrap();
        h.store
            .add_member(&GroupMember::human(conv.id, Uuid::now_v7()))
            .await
            .unwrap();
        h.store
            .save_message(&Message::new(conv.id, "beep", SenderKind::AutomatedGroupBot, None))
            .await
            .unwrap();

        let outcome = h.orchestrator.submit(owner, conv.id, "code error").await.unwrap();
        assert_eq!(outcome.status, AutoReplyStatus::SkippedPrecedingAutomated);
        assert_eq!(
            outcome.status.as_str(),
            "skipped: preceding message was automated"
        );
        assert_eq!(h.scheduler.pending(), 0);

        let stored = h.store.messages_in(&conv.id);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].id, outcome.message.id);
    }

    #[tokio::test]
    async fn direct_conversation_gets_one_friendly_reply() {
        let h = harness();
        let owner = Uuid::now_v7();
        let conv = h
            .store
            .create_conversation(&Conversation::new(owner, "direct", false))
            .await
            .unwrap();

        let outcome = h.orchestrator.submit(owner, conv.id, "hello").await.unwrap();
        assert_eq!(outcome.status, AutoReplyStatus::Scheduled);
        assert_eq!(outcome.bot_replies, 1);
        assert_eq!(h.scheduler.delays(), vec![Duration::from_millis(800)]);

        h.scheduler.run_all().await;
        let stored = h.store.messages_in(&conv.id);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].sender_kind, SenderKind::AutomatedSingle);
        assert_eq!(stored[1].sender_id, None);
        assert!(is_reply_from(&Persona::Friendly, "hello", &stored[1].content));
    }

    #[tokio::test]
    async fn group_without_bots_gets_filler_per_other_human() {
        let h = harness();
        let owner = Uuid::now_v7();
        let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());
        let conv = group(&h.store, owner).await;
        h.store.add_member(&GroupMember::human(conv.id, owner)).await.unwrap();
        h.store.add_member(&GroupMember::human(conv.id, alice)).await.unwrap();
        h.store.add_member(&GroupMember::human(conv.id, bob)).await.unwrap();

        let outcome = h.orchestrator.submit(owner, conv.id, "morning all").await.unwrap();
        assert_eq!(outcome.status, AutoReplyStatus::SkippedNoBots);
        assert_eq!(outcome.bot_replies, 0);
        assert_eq!(outcome.filler_replies, 2);
        assert_eq!(h.scheduler.pending(), 2);

        h.scheduler.run_all().await;
        let fillers: Vec<Message> = h.store.messages_in(&conv.id).into_iter().skip(1).collect();
        assert_eq!(fillers.len(), 2);
        let mut senders: Vec<Uuid> = fillers.iter().filter_map(|m| m.sender_id).collect();
        senders.sort();
        let mut expected = vec![alice, bob];
        expected.sort();
        assert_eq!(senders, expected);
        for filler in &fillers {
            assert_eq!(filler.sender_kind, SenderKind::Human);
            assert!(FILLER_REPLIES.contains(&filler.content.as_str()));
        }
    }

    #[tokio::test]
    async fn all_strategy_schedules_every_bot_with_delays_in_range() {
        let h = harness_with(OrchestrationConfig {
            strategy: ResponseStrategy::All,
            bot_delay_ms: DelayRange::new(500, 2000),
            ..OrchestrationConfig::default()
        });
        let owner = Uuid::now_v7();
        let conv = group(&h.store, owner).await;
        for persona in [Persona::Technical, Persona::Creative, Persona::Advisor] {
            h.store.add_member(&GroupMember::bot(conv.id, persona)).await.unwrap();
        }

        let outcome = h.orchestrator.submit(owner, conv.id, "thoughts?").await.unwrap();
        assert_eq!(outcome.bot_replies, 3);
        for delay in h.scheduler.delays() {
            assert!(delay >= Duration::from_millis(500) && delay <= Duration::from_millis(2000));
        }
    }

    #[tokio::test]
    async fn loop_guard_failure_silences_bots_but_not_fillers() {
        let h = harness();
        let owner = Uuid::now_v7();
        let conv = group(&h.store, owner).await;
        h.store
            .add_member(&GroupMember::bot(conv.id, Persona::Technical))
            .await
            .unwrap();
        h.store
            .add_member(&GroupMember::human(conv.id, Uuid::now_v7()))
            .await
            .unwrap();

        // The preceding-message check reads first; fail only the later guard read.
        let failing = h.store.clone();
        let conversations = Arc::new(h.store.clone());
        let orchestrator = MessageOrchestrator::new(
            conversations,
            Arc::new(GuardReadFails { inner: failing }),
            Arc::new(PersonaResponder::with_rng(
                Arc::new(ResponseCache::new(&CacheConfig::default())),
                Duration::ZERO,
                StdRng::seed_from_u64(1),
            )),
            h.scheduler.clone(),
            OrchestrationConfig::default(),
        );

        let outcome = orchestrator.submit(owner, conv.id, "bug").await.unwrap();
        assert_eq!(outcome.status, AutoReplyStatus::SkippedLoopGuard);
        assert_eq!(outcome.bot_replies, 0);
        assert_eq!(outcome.filler_replies, 1);
        assert_eq!(h.scheduler.pending(), 1);
    }

    /// Fails every `list_messages` call that asks for more than one message.
    struct GuardReadFails {
        inner: MemoryStore,
    }

    impl MessageRepository for GuardReadFails {
        async fn save_message(&self, message: &Message) -> Result<(), parley_types::error::RepositoryError> {
            self.inner.save_message(message).await
        }

        async fn get_message(
            &self,
            id: &Uuid,
        ) -> Result<Option<Message>, parley_types::error::RepositoryError> {
            self.inner.get_message(id).await
        }

        async fn list_messages(
            &self,
            conversation_id: &Uuid,
            order: SortOrder,
            limit: Option<u32>,
        ) -> Result<Vec<Message>, parley_types::error::RepositoryError> {
            if limit.is_none_or(|l| l > 1) {
                return Err(parley_types::error::RepositoryError::Connection);
            }
            self.inner.list_messages(conversation_id, order, limit).await
        }

        async fn delete_message(&self, id: &Uuid) -> Result<(), parley_types::error::RepositoryError> {
            self.inner.delete_message(id).await
        }
    }

    #[tokio::test]
    async fn failed_reply_does_not_affect_others() {
        let h = harness_with(OrchestrationConfig {
            strategy: ResponseStrategy::All,
            ..OrchestrationConfig::default()
        });
        let owner = Uuid::now_v7();
        let conv = group(&h.store, owner).await;
        h.store
            .add_member(&GroupMember::bot(conv.id, Persona::Technical))
            .await
            .unwrap();
        h.store
            .add_member(&GroupMember::bot(conv.id, Persona::Creative))
            .await
            .unwrap();

        let outcome = h.orchestrator.submit(owner, conv.id, "hi bots").await.unwrap();
        assert_eq!(outcome.bot_replies, 2);

        h.store.fail_next_saves(1);
        assert_eq!(h.scheduler.run_all().await, 2);

        let stored = h.store.messages_in(&conv.id);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id, outcome.message.id);
        assert!(stored[1].is_automated());
    }

    #[tokio::test]
    async fn stranger_is_rejected_before_anything_is_stored() {
        let h = harness();
        let conv = group(&h.store, Uuid::now_v7()).await;

        let err = h
            .orchestrator
            .submit(Uuid::now_v7(), conv.id, "let me in")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Forbidden));
        assert!(h.store.messages_in(&conv.id).is_empty());
        assert_eq!(h.scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn missing_conversation_is_not_found() {
        let h = harness();
        let err = h
            .orchestrator
            .submit(Uuid::now_v7(), Uuid::now_v7(), "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ConversationNotFound));
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let h = harness();
        let owner = Uuid::now_v7();
        let conv = group(&h.store, owner).await;
        let err = h.orchestrator.submit(owner, conv.id, "   ").await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
        assert!(h.store.messages_in(&conv.id).is_empty());
    }

    #[tokio::test]
    async fn group_member_can_submit_and_owner_receives_filler() {
        let h = harness();
        let owner = Uuid::now_v7();
        let member = Uuid::now_v7();
        let conv = group(&h.store, owner).await;
        h.store.add_member(&GroupMember::human(conv.id, owner)).await.unwrap();
        h.store.add_member(&GroupMember::human(conv.id, member)).await.unwrap();

        let outcome = h.orchestrator.submit(member, conv.id, "hey").await.unwrap();
        assert_eq!(outcome.filler_replies, 1);
        h.scheduler.run_all().await;
        let stored = h.store.messages_in(&conv.id);
        assert_eq!(stored[1].sender_id, Some(owner));
    }

    #[tokio::test]
    async fn direct_message_after_automated_reply_is_skipped() {
        let h = harness();
        let owner = Uuid::now_v7();
        let conv = h
            .store
            .create_conversation(&Conversation::new(owner, "direct", false))
            .await
            .unwrap();
        h.store
            .save_message(&Message::new(conv.id, "hi!", SenderKind::AutomatedSingle, None))
            .await
            .unwrap();

        let outcome = h.orchestrator.submit(owner, conv.id, "again").await.unwrap();
        assert_eq!(outcome.status, AutoReplyStatus::SkippedPrecedingAutomated);
        assert_eq!(
            outcome.status.as_str(),
            "skipped: preceding message was automated"
        );
        assert_eq!(outcome.bot_replies, 0);
        assert_eq!(h.scheduler.pending(), 0);

        let stored = h.store.messages_in(&conv.id);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].id, outcome.message.id);
        assert_eq!(stored[1].sender_kind, SenderKind::Human);
    }

    #[tokio::test]
    async fn repeated_message_reuses_cached_reply() {
        let h = harness();
        let owner = Uuid::now_v7();
        let conv = h
            .store
            .create_conversation(&Conversation::new(owner, "direct", false))
            .await
            .unwrap();

        h.orchestrator.submit(owner, conv.id, "Hello").await.unwrap();
        h.scheduler.run_all().await;
        // A human message in between so the next one is not skipped.
        h.store
            .save_message(&Message::new(conv.id, "aside", SenderKind::Human, Some(owner)))
            .await
            .unwrap();
        h.orchestrator.submit(owner, conv.id, "hello ").await.unwrap();
        h.scheduler.run_all().await;

        let replies: Vec<String> = h
            .store
            .messages_in(&conv.id)
            .into_iter()
            .filter(|m| m.is_automated())
            .map(|m| m.content)
            .collect();
        assert_eq!(replies.len(), 2);
        assert!(is_reply_from(&Persona::Friendly, "Hello", &replies[0]));
        assert_eq!(replies[0], replies[1]);
    }
}
