//! End-to-end save-offer and watcher flows on a simulated page, with time
//! paused so every delay is stepped explicitly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use tokio::time::sleep;
use vaultbridge_autofill::{MSG_SAVED, PageEvent, PageSession, SaveOfferState};
use vaultbridge_config::{AutofillConfig, WatcherConfig};
use vaultbridge_dom::{Document, NodeId, SharedDocument};
use vaultbridge_protocols::{Credential, NativeResponse, SaveCredentialRequest, VaultBridge};

#[derive(Default)]
struct RecordingBridge {
    stored: Mutex<Vec<Credential>>,
    lookups_fail: AtomicBool,
    lookups: AtomicUsize,
    saved: Mutex<Vec<SaveCredentialRequest>>,
}

impl RecordingBridge {
    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VaultBridge for RecordingBridge {
    async fn ping(&self) -> NativeResponse {
        NativeResponse::success(Some(json!({"status": "alive"})))
    }

    async fn get_credentials(&self, _url: &str) -> NativeResponse {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.lookups_fail.load(Ordering::SeqCst) {
            return NativeResponse::failure("Request timeout");
        }
        let stored = self.stored.lock().clone();
        NativeResponse::success(Some(json!({ "credentials": stored })))
    }

    async fn save_credential(&self, request: SaveCredentialRequest) -> NativeResponse {
        self.saved.lock().push(request);
        NativeResponse::success(Some(json!({"id": "new-1"})))
    }

    async fn get_credit_cards(&self) -> NativeResponse {
        NativeResponse::success(Some(json!({"cards": []})))
    }
}

struct Page {
    doc: SharedDocument,
    session: Arc<PageSession>,
    bridge: Arc<RecordingBridge>,
    form: NodeId,
    username: NodeId,
    password: NodeId,
    submit: NodeId,
}

impl Page {
    async fn login() -> Self {
        Self::with_bridge(RecordingBridge::default()).await
    }

    async fn with_bridge(bridge: RecordingBridge) -> Self {
        let doc = Document::from_value(json!({
            "url": "https://accounts.example.com/signin?next=/home",
            "body": [{
                "tag": "form",
                "attributes": {"id": "login"},
                "children": [
                    {"tag": "input", "attributes": {"type": "text", "name": "username"}},
                    {"tag": "input", "attributes": {"type": "password", "name": "password"}},
                    {"tag": "button", "attributes": {"type": "submit"}, "text": "Sign in"}
                ]
            }]
        }))
        .unwrap()
        .into_shared();

        let bridge = Arc::new(bridge);
        let session = PageSession::new(doc.clone(), bridge.clone(), AutofillConfig::default());
        assert!(session.init().await);

        let (form, username, password, submit) = {
            let d = doc.lock();
            (
                d.select("#login").unwrap()[0],
                d.select("input[name=username]").unwrap()[0],
                d.select("input[type=password]").unwrap()[0],
                d.select("button").unwrap()[0],
            )
        };
        Self {
            doc,
            session,
            bridge,
            form,
            username,
            password,
            submit,
        }
    }

    fn type_login(&self, username: &str, password: &str) {
        let mut d = self.doc.lock();
        d.set_value(self.username, username);
        d.set_value(self.password, password);
    }

    async fn submit(&self) {
        self.session.handle_event(PageEvent::Submit(self.form)).await;
    }

    fn text_of(&self, node: NodeId) -> String {
        self.doc.lock().text_content(node)
    }

    fn notices(&self) -> Vec<String> {
        let d = self.doc.lock();
        d.select(".vaultbridge-notification")
            .unwrap()
            .into_iter()
            .map(|n| d.text_content(n))
            .collect()
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[tokio::test(start_paused = true)]
async fn test_prompt_appears_after_delay() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    page.submit().await;

    assert_eq!(page.session.save_offer_state(), SaveOfferState::Scheduled);
    sleep(ms(1499)).await;
    assert!(page.session.save_prompt().is_none());

    sleep(ms(2)).await;
    let prompt = page.session.save_prompt().expect("prompt shown");
    assert!(page.doc.lock().is_connected(prompt.node));
    assert!(page.text_of(prompt.node).contains("alice on accounts.example.com"));
}

#[tokio::test(start_paused = true)]
async fn test_second_trigger_is_ignored() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    page.submit().await;
    page.submit().await;
    page.session.check_and_offer("alice".into(), "s3cret".into()).await;

    assert_eq!(page.bridge.lookups(), 1);
    sleep(ms(1600)).await;
    assert_eq!(page.doc.lock().select(".vaultbridge-save-prompt").unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_starts_cooldown() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    page.submit().await;
    sleep(ms(1600)).await;

    let prompt = page.session.save_prompt().unwrap();
    page.session.handle_event(PageEvent::Click(prompt.cancel)).await;
    assert_eq!(page.session.save_offer_state(), SaveOfferState::Cooldown);
    assert!(!page.doc.lock().is_connected(prompt.node));

    page.submit().await;
    assert_eq!(page.bridge.lookups(), 1);

    sleep(ms(5001)).await;
    assert_eq!(page.session.save_offer_state(), SaveOfferState::Idle);
    page.submit().await;
    assert_eq!(page.bridge.lookups(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_prompt_auto_dismisses() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    page.submit().await;
    sleep(ms(1600)).await;
    let prompt = page.session.save_prompt().unwrap();

    sleep(ms(9800)).await;
    assert!(page.doc.lock().is_connected(prompt.node));

    sleep(ms(200)).await;
    assert!(!page.doc.lock().is_connected(prompt.node));
    assert_eq!(page.session.save_offer_state(), SaveOfferState::Cooldown);
}

#[tokio::test(start_paused = true)]
async fn test_save_sends_request() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    page.submit().await;
    sleep(ms(1600)).await;

    let prompt = page.session.save_prompt().unwrap();
    page.session.handle_event(PageEvent::Click(prompt.save)).await;

    assert_eq!(page.session.save_offer_state(), SaveOfferState::Idle);
    assert!(!page.doc.lock().is_connected(prompt.node));
    let saved = page.bridge.saved.lock().clone();
    assert_eq!(
        saved,
        vec![SaveCredentialRequest::new(
            "accounts.example.com",
            "https://accounts.example.com/signin?next=/home",
            "alice",
            "s3cret",
        )]
    );
    assert_eq!(page.notices(), vec![MSG_SAVED.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_known_username_is_not_offered() {
    let bridge = RecordingBridge::default();
    bridge.stored.lock().push(Credential {
        username: "Alice".to_string(),
        password: "old".to_string(),
        ..Default::default()
    });
    let page = Page::with_bridge(bridge).await;
    page.type_login("alice", "new-password");
    page.submit().await;

    assert_eq!(page.session.save_offer_state(), SaveOfferState::Idle);
    sleep(ms(3000)).await;
    assert!(page.session.save_prompt().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_lookup_still_offers() {
    let bridge = RecordingBridge::default();
    bridge.lookups_fail.store(true, Ordering::SeqCst);
    let page = Page::with_bridge(bridge).await;
    page.type_login("alice", "s3cret");
    page.submit().await;

    sleep(ms(1600)).await;
    assert!(page.session.save_prompt().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_blur_waits_for_stable_values() {
    let bridge = RecordingBridge::default();
    bridge.stored.lock().push(Credential {
        username: "alice".to_string(),
        ..Default::default()
    });
    let page = Page::with_bridge(bridge).await;
    page.type_login("alice", "s3cret");
    page.session.handle_event(PageEvent::Blur(page.password)).await;

    sleep(ms(1990)).await;
    assert_eq!(page.bridge.lookups(), 0);
    sleep(ms(20)).await;
    assert_eq!(page.bridge.lookups(), 1);

    // Same pair again: nothing new to offer.
    page.session.handle_event(PageEvent::Blur(page.password)).await;
    sleep(ms(2100)).await;
    assert_eq!(page.bridge.lookups(), 1);

    page.type_login("alice", "changed");
    page.session.handle_event(PageEvent::Blur(page.password)).await;
    sleep(ms(2100)).await;
    assert_eq!(page.bridge.lookups(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_blur_cleared_field_is_not_offered() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    page.session.handle_event(PageEvent::Blur(page.password)).await;
    page.doc.lock().set_value(page.password, "");

    sleep(ms(2100)).await;
    assert_eq!(page.bridge.lookups(), 0);
    assert_eq!(page.session.save_offer_state(), SaveOfferState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_submit_click_settles_first() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    page.session.handle_event(PageEvent::Click(page.submit)).await;

    sleep(ms(50)).await;
    assert_eq!(page.bridge.lookups(), 0);
    sleep(ms(100)).await;
    assert_eq!(page.bridge.lookups(), 1);
    assert_eq!(page.session.save_offer_state(), SaveOfferState::Scheduled);
}

#[tokio::test(start_paused = true)]
async fn test_unregistered_form_submit_is_ignored() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    let body = page.doc.lock().body();
    page.session.handle_event(PageEvent::Submit(body)).await;
    assert_eq!(page.bridge.lookups(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_prompt() {
    let page = Page::login().await;
    page.type_login("alice", "s3cret");
    page.submit().await;
    page.session.shutdown();

    sleep(ms(2000)).await;
    assert!(page.session.save_prompt().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_watcher_detects_dynamic_form() {
    let doc = Document::new("https://app.example.com/").unwrap().into_shared();
    let session = PageSession::new(
        doc.clone(),
        Arc::new(RecordingBridge::default()),
        AutofillConfig::default(),
    );
    session.init().await;
    assert!(session.active_login().is_none());

    let watcher = WatcherConfig {
        enabled: true,
        coalesce_ms: 50,
    };
    let handle = session.watch(&watcher).expect("watcher enabled");

    let password = {
        let mut d = doc.lock();
        let body = d.body();
        let form = d.append_element(body, "form", &[]);
        d.append_element(form, "input", &[("type", "email")]);
        d.append_element(form, "input", &[("type", "password")])
    };

    sleep(ms(20)).await;
    assert_eq!(session.scan_count(), 1);
    sleep(ms(60)).await;
    assert_eq!(session.scan_count(), 2);
    assert_eq!(session.active_login().map(|s| s.password), Some(password));

    // The scan attached an icon; that overlay-only batch is ignored.
    sleep(ms(200)).await;
    assert_eq!(session.scan_count(), 2);

    session.shutdown();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_watcher_disabled() {
    let doc = Document::new("https://app.example.com/").unwrap().into_shared();
    let session = PageSession::new(
        doc,
        Arc::new(RecordingBridge::default()),
        AutofillConfig::default(),
    );
    let config = WatcherConfig {
        enabled: false,
        coalesce_ms: 0,
    };
    assert!(session.watch(&config).is_none());
}
