//! # Session
//!
//! The single top-level context that owns the pin collection, the interaction
//! maps, the signed-in user and all view state. Web handlers never reach for
//! globals: they get a `SessionHandle` and lock it for the duration of one
//! synchronous state transition.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::autofill::{AutofillController, AutofillOutcome, RequestId, UploadForm};
use crate::demo::DemoGenerator;
use crate::error::{AppError, Result};
use crate::filter::visible_pins;
use crate::interactions::{InteractionStore, Interactions};
use crate::models::{
    Comment, Credentials, FilterCriteria, ImagePayload, Pin, PinDraft, PinMetadata, QuickFilter, User,
};
use crate::notice::{Language, Notice};
use crate::repository::{FeedMode, PinRepository};
use crate::scroll::{ScrollController, ViewportSample};
use crate::traits::{FeedEvent, IdentityProvider, KeyValueStore, MetadataGenerator, RemoteFeed, Subscription};

/// Author used for anonymous local publishes.
pub const ANONYMOUS_AUTHOR: &str = "Tú";

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct Session {
    repo: PinRepository,
    interactions: InteractionStore,
    criteria: FilterCriteria,
    scroll: ScrollController,
    autofill: AutofillController,
    upload: Option<UploadForm>,
    notices: VecDeque<Notice>,
    lang: Language,
}

impl Session {
    /// Offline session populated from the demo generator.
    pub fn demo(store: Box<dyn KeyValueStore>, generator: DemoGenerator) -> Self {
        Self::build(PinRepository::demo(generator, now_ms()), store, ScrollController::new())
    }

    /// Session fed by a remote subscription. Scrolling never loads more.
    pub fn remote(store: Box<dyn KeyValueStore>, generator: DemoGenerator) -> Self {
        Self::build(PinRepository::remote(generator), store, ScrollController::inert())
    }

    fn build(repo: PinRepository, store: Box<dyn KeyValueStore>, scroll: ScrollController) -> Self {
        Self {
            repo,
            interactions: InteractionStore::load(store),
            criteria: FilterCriteria::default(),
            scroll,
            autofill: AutofillController::new(),
            upload: None,
            notices: VecDeque::new(),
            lang: Language::default(),
        }
    }

    pub fn mode(&self) -> FeedMode {
        self.repo.mode()
    }

    pub fn pins(&self) -> &[Pin] {
        self.repo.pins()
    }

    pub fn pin(&self, id: &str) -> Option<&Pin> {
        self.repo.get(id)
    }

    pub fn repository(&self) -> &PinRepository {
        &self.repo
    }

    pub fn interactions(&self) -> &Interactions {
        self.interactions.state()
    }

    pub fn comments(&self, pin_id: &str) -> &[Comment] {
        self.interactions.state().comments(pin_id)
    }

    pub fn user(&self) -> Option<&User> {
        self.interactions.user()
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    pub fn set_language(&mut self, lang: Language) {
        self.lang = lang;
    }

    // --- View -----------------------------------------------------------

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// The filtered, ordered pins the grid should show.
    pub fn visible(&self) -> Vec<&Pin> {
        visible_pins(self.repo.pins(), &self.criteria, self.interactions.state())
    }

    pub fn set_query(&mut self, query: &str) {
        self.criteria.query = query.to_string();
    }

    /// Toggles a category; choosing one clears the quick filter.
    pub fn select_category(&mut self, category: &str) {
        if self.criteria.category.as_deref() == Some(category) {
            self.criteria.category = None;
        } else {
            self.criteria.category = Some(category.to_string());
        }
        self.criteria.quick = None;
    }

    /// Toggles a quick filter; choosing one clears the category.
    pub fn select_quick(&mut self, quick: QuickFilter) {
        if self.criteria.quick == Some(quick) {
            self.criteria.quick = None;
        } else {
            self.criteria.quick = Some(quick);
        }
        self.criteria.category = None;
    }

    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
    }

    // --- Interactions ---------------------------------------------------

    pub fn toggle_like(&mut self, pin_id: &str) -> bool {
        self.interactions.toggle_like(pin_id)
    }

    pub fn toggle_save(&mut self, pin_id: &str) -> bool {
        let saved = self.interactions.toggle_save(pin_id);
        self.notify(if saved { Notice::Saved } else { Notice::Unsaved });
        saved
    }

    pub fn add_comment(&mut self, pin_id: &str, text: &str) -> bool {
        self.interactions.add_comment(pin_id, text, now_ms())
    }

    // --- Growth ---------------------------------------------------------

    /// Feeds one viewport sample to the scroll controller and returns how
    /// many pins were appended.
    pub fn on_viewport(&mut self, sample: ViewportSample) -> usize {
        match self.scroll.observe(sample) {
            Some(batch) => self.repo.load_more(batch, now_ms()).len(),
            None => 0,
        }
    }

    pub fn teardown_scroll(&mut self) {
        self.scroll.disconnect();
    }

    pub fn apply_feed_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::Snapshot(docs) => {
                self.repo.apply_snapshot(&docs, now_ms());
            }
            FeedEvent::Error(message) => {
                self.repo.apply_feed_error(&message, now_ms());
                self.notify(Notice::FeedUnavailable);
            }
        }
    }

    // --- Publishing -----------------------------------------------------

    /// Pins are signed with the account email, or anonymously.
    pub fn author(&self) -> String {
        match self.user() {
            Some(user) if !user.email.trim().is_empty() => user.email.clone(),
            _ => ANONYMOUS_AUTHOR.to_string(),
        }
    }

    pub fn upload_form(&self) -> Option<&UploadForm> {
        self.upload.as_ref()
    }

    pub fn open_upload(&mut self) {
        if self.upload.is_none() {
            self.upload = Some(UploadForm::default());
        }
    }

    /// Mirrors what the user typed into the form, opening it if needed.
    pub fn edit_upload(&mut self, edit: impl FnOnce(&mut UploadForm)) {
        edit(self.upload.get_or_insert_with(UploadForm::default));
    }

    /// Closing also invalidates any in-flight autofill request.
    pub fn close_upload(&mut self) {
        self.upload = None;
        self.autofill.reset();
    }

    /// Demo-mode publish. On validation failure the form stays open.
    pub fn publish_local(&mut self, draft: PinDraft) -> Result<Pin> {
        let author = self.author();
        match self.repo.create(draft, &author, now_ms()) {
            Ok(pin) => {
                self.close_upload();
                self.notify(Notice::Published);
                Ok(pin)
            }
            Err(e) => {
                if matches!(e, AppError::Validation(_)) {
                    self.notify(Notice::FillFields);
                }
                Err(e)
            }
        }
    }

    // --- Autofill -------------------------------------------------------

    pub fn autofill_loading(&self) -> bool {
        self.autofill.is_loading()
    }

    pub fn begin_autofill(&mut self) -> RequestId {
        self.open_upload();
        self.autofill.begin()
    }

    /// Applies a matching response to the form; failures leave it untouched.
    pub fn finish_autofill(&mut self, id: RequestId, result: Result<PinMetadata>) -> AutofillOutcome {
        let outcome = self.autofill.complete(id, result);
        match &outcome {
            AutofillOutcome::Applied(meta) => {
                if let Some(form) = self.upload.as_mut() {
                    form.apply(meta);
                }
            }
            AutofillOutcome::Failed(e) => {
                tracing::warn!(error = %e, "autofill failed");
                self.notify(Notice::AutofillFailed);
            }
            AutofillOutcome::Stale => {}
        }
        outcome
    }

    // --- Identity -------------------------------------------------------

    pub fn sign_in(&mut self, user: User) {
        tracing::info!(email = %user.email, "user signed in");
        self.interactions.set_user(Some(user));
        self.notify(Notice::LoggedIn);
    }

    pub fn sign_out(&mut self) {
        if self.interactions.user().is_some() {
            self.interactions.set_user(None);
            self.notify(Notice::LoggedOut);
        }
    }

    // --- Notices --------------------------------------------------------

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared owner of a `Session` and of its one remote subscription.
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Mutex<Session>>,
    feed: Option<Arc<dyn RemoteFeed>>,
    subscription: Arc<Mutex<Option<Subscription>>>,
}

impl SessionHandle {
    /// Remote mode when a feed is given, demo mode otherwise.
    pub fn new(
        store: Box<dyn KeyValueStore>,
        generator: DemoGenerator,
        feed: Option<Arc<dyn RemoteFeed>>,
    ) -> Self {
        let session = match feed {
            Some(_) => Session::remote(store, generator),
            None => Session::demo(store, generator),
        };
        Self {
            session: Arc::new(Mutex::new(session)),
            feed,
            subscription: Arc::new(Mutex::new(None)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&lock(&self.session))
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut lock(&self.session))
    }

    /// Subscribes to the remote feed, replacing any earlier subscription.
    pub fn start(&self) {
        let Some(feed) = &self.feed else {
            tracing::info!("no remote feed configured, running in demo mode");
            return;
        };
        let target = Arc::downgrade(&self.session);
        let subscription = feed.subscribe(Box::new(move |event| {
            if let Some(session) = target.upgrade() {
                lock(&session).apply_feed_event(event);
            }
        }));
        let previous = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subscription);
        if let Some(previous) = previous {
            tracing::debug!("replacing remote subscription");
            previous.unsubscribe();
        }
    }

    /// Cancels the subscription and stops scroll observation.
    pub fn shutdown(&self) {
        let current = self.subscription.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(subscription) = current {
            subscription.unsubscribe();
            tracing::info!("remote subscription closed");
        }
        self.update(Session::teardown_scroll);
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Publishes a draft. Demo mode prepends locally; remote mode writes the
    /// document and waits for the next snapshot to show it.
    pub async fn publish(&self, draft: PinDraft) -> Result<Pin> {
        let Some(feed) = self.feed.clone() else {
            return self.update(|s| s.publish_local(draft));
        };

        let new_pin = self.update(|s| {
            let author = s.author();
            match s.repo.prepare(draft, &author, now_ms()) {
                Ok(new_pin) => {
                    s.open_upload();
                    if let Some(form) = s.upload.as_mut() {
                        form.uploading = true;
                    }
                    Ok(new_pin)
                }
                Err(e) => {
                    s.notify(Notice::FillFields);
                    Err(e)
                }
            }
        })?;

        let written = feed.create(new_pin.clone()).await;

        self.update(|s| {
            if let Some(form) = s.upload.as_mut() {
                form.uploading = false;
            }
            match written {
                Ok(id) => {
                    tracing::info!(pin_id = %id, "published pin to remote collection");
                    s.close_upload();
                    s.notify(Notice::Published);
                    Ok(new_pin.with_id(id))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "remote publish failed");
                    s.notify(Notice::PublishFailed);
                    Err(AppError::RemoteWrite(e.to_string()))
                }
            }
        })
    }

    /// Runs one metadata request; a late or superseded answer is dropped.
    pub async fn autofill(&self, generator: &dyn MetadataGenerator, image: ImagePayload) -> AutofillOutcome {
        let id = self.update(Session::begin_autofill);
        let result = generator
            .generate(image)
            .await
            .map_err(|e| AppError::GenerativeService(e.to_string()));
        self.update(|s| s.finish_autofill(id, result))
    }

    pub async fn sign_in(&self, provider: &dyn IdentityProvider, credentials: Credentials) -> Result<User> {
        match provider.sign_in(credentials).await {
            Ok(user) => {
                self.update(|s| s.sign_in(user.clone()));
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "sign-in rejected");
                self.update(|s| s.notify(Notice::LoginFailed));
                Err(AppError::Auth(e.to_string()))
            }
        }
    }

    pub async fn sign_out(&self, provider: Option<&dyn IdentityProvider>) {
        self.update(Session::sign_out);
        if let Some(provider) = provider {
            provider.sign_out().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::MemoryStore;
    use crate::traits::{MockIdentityProvider, MockMetadataGenerator, MockRemoteFeed, RemoteDocument};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn demo() -> Session {
        Session::demo(Box::new(MemoryStore::new()), DemoGenerator::seeded(1))
    }

    fn docs(n: usize) -> Vec<RemoteDocument> {
        (0..n)
            .map(|i| RemoteDocument {
                id: format!("doc{i}"),
                data: json!({"src": format!("https://img/{i}"), "title": format!("Remote {i}")}),
            })
            .collect()
    }

    #[test]
    fn category_and_quick_filter_are_exclusive_in_the_ui() {
        let mut s = demo();
        s.select_quick(QuickFilter::Saved);
        s.select_category("Arte");
        assert_eq!(s.criteria().category.as_deref(), Some("Arte"));
        assert_eq!(s.criteria().quick, None);

        s.select_quick(QuickFilter::Recent);
        assert_eq!(s.criteria().category, None);
        s.select_quick(QuickFilter::Recent);
        assert!(s.criteria().is_empty());
    }

    #[test]
    fn toggle_save_emits_a_notice_per_state() {
        let mut s = demo();
        let id = s.pins()[0].id.clone();
        assert!(s.toggle_save(&id));
        assert!(!s.toggle_save(&id));
        assert_eq!(s.take_notices(), vec![Notice::Saved, Notice::Unsaved]);
        assert!(s.take_notices().is_empty());
    }

    #[test]
    fn liked_quick_filter_follows_toggles() {
        let mut s = demo();
        let id = s.pins()[3].id.clone();
        s.toggle_like(&id);
        s.select_quick(QuickFilter::Liked);
        let visible: Vec<_> = s.visible().iter().map(|p| p.id.clone()).collect();
        assert_eq!(visible, vec![id]);
    }

    #[test]
    fn viewport_crossing_loads_one_batch() {
        let mut s = demo();
        let sample = ViewportSample { scroll_top: 2000.0, viewport_height: 800.0, sentinel_top: 2500.0 };
        assert_eq!(s.on_viewport(sample), 12);
        assert_eq!(s.on_viewport(sample), 0);
        assert_eq!(s.pins().len(), 36);

        s.teardown_scroll();
        let far = ViewportSample { sentinel_top: 90_000.0, ..sample };
        s.on_viewport(far);
        assert_eq!(s.on_viewport(sample), 0);
    }

    #[test]
    fn validation_failure_keeps_the_form_open() {
        let mut s = demo();
        s.open_upload();
        let err = s.publish_local(PinDraft::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(s.upload_form().is_some());
        assert_eq!(s.take_notices(), vec![Notice::FillFields]);
        assert_eq!(s.pins().len(), 24);
    }

    #[test]
    fn local_publish_uses_the_signed_in_author() {
        let mut s = demo();
        s.sign_in(User { email: "ana@x.io".into(), display_name: None, photo_url: None, uid: None });
        s.open_upload();
        let draft = PinDraft { url: Some("https://img/new".into()), title: "Mine".into(), ..Default::default() };
        let pin = s.publish_local(draft).unwrap();
        assert_eq!(pin.author, "ana@x.io");
        assert_eq!(s.pins()[0].id, pin.id);
        assert!(s.upload_form().is_none());
    }

    #[test]
    fn display_name_does_not_replace_the_email_as_author() {
        let mut s = demo();
        s.sign_in(User { email: "ana@x.io".into(), display_name: Some("Ana".into()), photo_url: None, uid: None });
        assert_eq!(s.author(), "ana@x.io");
        s.sign_out();
        assert_eq!(s.author(), ANONYMOUS_AUTHOR);
    }

    #[test]
    fn autofill_failure_leaves_fields_unchanged() {
        let mut s = demo();
        s.open_upload();
        s.upload.as_mut().unwrap().title = "typed by hand".into();
        let id = s.begin_autofill();
        s.finish_autofill(id, Err(AppError::GenerativeService("timeout".into())));
        assert_eq!(s.upload_form().unwrap().title, "typed by hand");
        assert!(!s.autofill_loading());
        assert_eq!(s.take_notices(), vec![Notice::AutofillFailed]);
    }

    #[test]
    fn autofill_after_close_is_ignored() {
        let mut s = demo();
        let id = s.begin_autofill();
        s.close_upload();
        let meta = PinMetadata { title: "late".into(), ..Default::default() };
        assert!(matches!(s.finish_autofill(id, Ok(meta)), AutofillOutcome::Stale));
        assert!(s.upload_form().is_none());
    }

    #[test]
    fn start_and_shutdown_manage_one_subscription() {
        let cancelled = Arc::new(AtomicUsize::new(0));
        let counter = cancelled.clone();
        let mut feed = MockRemoteFeed::new();
        feed.expect_subscribe().times(2).returning(move |on_event| {
            on_event(FeedEvent::Snapshot(vec![]));
            on_event(FeedEvent::Snapshot(docs(5)));
            let counter = counter.clone();
            Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        });
        let handle = SessionHandle::new(Box::new(MemoryStore::new()), DemoGenerator::seeded(4), Some(Arc::new(feed)));

        handle.start();
        assert!(handle.is_subscribed());
        assert_eq!(handle.read(|s| s.pins().len()), 5);

        handle.start();
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);

        handle.shutdown();
        handle.shutdown();
        assert_eq!(cancelled.load(Ordering::SeqCst), 2);
        assert!(!handle.is_subscribed());
    }

    #[test]
    fn feed_error_on_empty_view_shows_demo_data() {
        let mut feed = MockRemoteFeed::new();
        feed.expect_subscribe().returning(|on_event| {
            on_event(FeedEvent::Error("unavailable".into()));
            Subscription::noop()
        });
        let handle = SessionHandle::new(Box::new(MemoryStore::new()), DemoGenerator::seeded(4), Some(Arc::new(feed)));
        handle.start();
        assert_eq!(handle.read(|s| s.pins().len()), 24);
        assert_eq!(handle.update(Session::take_notices), vec![Notice::FeedUnavailable]);
    }

    #[tokio::test]
    async fn remote_publish_waits_for_the_snapshot() {
        let mut feed = MockRemoteFeed::new();
        feed.expect_create().times(1).returning(|_| Ok("remote-1".to_string()));
        let handle = SessionHandle::new(Box::new(MemoryStore::new()), DemoGenerator::seeded(4), Some(Arc::new(feed)));
        handle.update(Session::open_upload);

        let draft = PinDraft { title: "Words only".into(), ..Default::default() };
        let pin = handle.publish(draft).await.unwrap();
        assert_eq!(pin.id, "remote-1");
        assert!(pin.src.starts_with("https://picsum.photos/seed/"));
        assert_eq!(handle.read(|s| s.pins().len()), 0);
        assert!(handle.read(|s| s.upload_form().is_none()));
    }

    #[tokio::test]
    async fn remote_write_failure_clears_the_uploading_flag() {
        let mut feed = MockRemoteFeed::new();
        feed.expect_create().returning(|_| Err(anyhow::anyhow!("permission denied")));
        let handle = SessionHandle::new(Box::new(MemoryStore::new()), DemoGenerator::seeded(4), Some(Arc::new(feed)));
        handle.update(Session::open_upload);

        let draft = PinDraft { url: Some("https://img/x".into()), ..Default::default() };
        let err = handle.publish(draft).await.unwrap_err();
        assert!(matches!(err, AppError::RemoteWrite(_)));
        let form = handle.read(|s| s.upload_form().cloned()).unwrap();
        assert!(!form.uploading);
        assert_eq!(handle.update(Session::take_notices), vec![Notice::PublishFailed]);
    }

    #[tokio::test]
    async fn autofill_through_the_handle_fills_the_form() {
        let mut generator = MockMetadataGenerator::new();
        generator.expect_generate().returning(|_| {
            Ok(PinMetadata {
                title: "Neon alley".into(),
                description: "Rainy night".into(),
                category: "Fotografía".into(),
                tags: vec!["neon".into(), "night".into()],
            })
        });
        let handle = SessionHandle::new(Box::new(MemoryStore::new()), DemoGenerator::seeded(4), None);
        let image = ImagePayload { bytes: vec![1, 2, 3], mime_type: "image/png".into() };
        let outcome = handle.autofill(&generator, image).await;
        assert!(matches!(outcome, AutofillOutcome::Applied(_)));
        let form = handle.read(|s| s.upload_form().cloned()).unwrap();
        assert_eq!(form.title, "Neon alley");
        assert_eq!(form.tags, "neon, night");
    }

    #[tokio::test]
    async fn rejected_sign_in_leaves_the_session_anonymous() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_sign_in().returning(|_| Err(anyhow::anyhow!("popup closed")));
        let handle = SessionHandle::new(Box::new(MemoryStore::new()), DemoGenerator::seeded(4), None);
        let creds = Credentials { email: "a@b.c".into(), password: "pw".into() };
        assert!(matches!(handle.sign_in(&provider, creds).await, Err(AppError::Auth(_))));
        assert!(handle.read(|s| s.user().is_none()));
        assert_eq!(handle.update(Session::take_notices), vec![Notice::LoginFailed]);
    }
}
