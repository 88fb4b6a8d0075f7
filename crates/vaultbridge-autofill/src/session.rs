//! Per-page autofill session.
//!
//! One [`PageSession`] exists per page context. It owns the detected field
//! sets, the overlays it has attached and the save-offer workflow. Locks are
//! always taken document first, then session state, and are never held
//! across an `.await`.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use vaultbridge_classifier::{
    CARD_MARKER, LoginFieldSet, PaymentFieldSet, detect_login_fields, detect_payment_fields,
    submit_controls,
};
use vaultbridge_config::{AutofillConfig, WatcherConfig};
use vaultbridge_dom::{Document, NodeId, SharedDocument};
use vaultbridge_protocols::{
    Credential, CreditCard, PageAgent, SaveCredentialRequest, VaultBridge,
};

use crate::event::PageEvent;
use crate::fill::{fill_card, fill_login};
use crate::save_offer::{PendingSave, SaveOffer, SaveOfferState};
use crate::ui::{self, MenuEntry, SavePrompt};
use crate::watcher::MutationWatcher;

pub const MSG_NO_CREDENTIALS: &str = "No credentials found for this site";
pub const MSG_UNAVAILABLE: &str = "VaultZero is locked or not running";
pub const MSG_NOT_READY: &str = "VaultZero is not running or locked";
pub const MSG_FILLED: &str = "Auto-filled from VaultZero";
pub const MSG_SAVED: &str = "Saved to VaultZero!";
pub const MSG_SAVE_FAILED: &str = "Failed to save - is VaultZero unlocked?";
pub const MSG_NO_CARDS: &str = "No credit cards found in VaultZero";
pub const MSG_CARD_FILLED: &str = "Credit card auto-filled from VaultZero";

/// Result of one detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    pub login_sets: usize,
    pub payment_sets: usize,
}

#[derive(Debug, Clone)]
enum MenuChoice {
    Login(Credential),
    Card(CreditCard),
}

#[derive(Debug)]
struct OpenMenu {
    node: NodeId,
    trigger: NodeId,
    items: Vec<(NodeId, MenuChoice)>,
    /// Outside clicks and Escape close the menu only once armed.
    armed: bool,
}

/// Username/password pair with blur handling attached.
#[derive(Debug)]
struct LoginWatch {
    username: NodeId,
    password: NodeId,
    last_pair: (String, String),
}

#[derive(Debug, Clone, Copy)]
struct Icon {
    node: NodeId,
    field: NodeId,
    card: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    ready: bool,
    active_login: Option<LoginFieldSet>,
    active_payment: Option<PaymentFieldSet>,
    login_fields: Vec<LoginWatch>,
    card_fields: HashSet<NodeId>,
    icons: Vec<Icon>,
    forms: HashSet<NodeId>,
    submit_controls: HashSet<NodeId>,
    menu: Option<OpenMenu>,
    offer: SaveOffer,
}

/// What a click or focus landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    LoginField,
    CardField,
    LoginIcon(NodeId),
    CardIcon(NodeId),
    SaveButton(NodeId),
    CancelButton(NodeId),
    SubmitControl,
    Page,
}

pub struct PageSession {
    me: Weak<PageSession>,
    document: SharedDocument,
    bridge: Arc<dyn VaultBridge>,
    config: AutofillConfig,
    state: Mutex<SessionState>,
    scans: AtomicU64,
    shutdown: CancellationToken,
}

impl PageSession {
    pub fn new(
        document: SharedDocument,
        bridge: Arc<dyn VaultBridge>,
        config: AutofillConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            document,
            bridge,
            config,
            state: Mutex::new(SessionState::default()),
            scans: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn document(&self) -> SharedDocument {
        Arc::clone(&self.document)
    }

    /// Whether the last ping reached the vault.
    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Login set that fills and save offers act on.
    pub fn active_login(&self) -> Option<LoginFieldSet> {
        self.state.lock().active_login
    }

    pub fn active_payment(&self) -> Option<PaymentFieldSet> {
        self.state.lock().active_payment
    }

    pub fn save_offer_state(&self) -> SaveOfferState {
        self.state.lock().offer.state().clone()
    }

    pub fn save_prompt(&self) -> Option<SavePrompt> {
        self.state.lock().offer.prompt()
    }

    /// Open menu and its item nodes.
    pub fn menu(&self) -> Option<(NodeId, Vec<NodeId>)> {
        let state = self.state.lock();
        state
            .menu
            .as_ref()
            .map(|m| (m.node, m.items.iter().map(|(item, _)| *item).collect()))
    }

    /// Number of detection passes run so far.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the watcher and every pending timer.
    pub fn shutdown(&self) {
        debug!("Page session shutting down");
        self.shutdown.cancel();
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Ping the vault, then run the first detection pass.
    pub async fn init(&self) -> bool {
        let response = self.bridge.ping().await;
        let ready = response.success;
        self.state.lock().ready = ready;
        if ready {
            info!("VaultZero is available");
        } else {
            warn!(
                "VaultZero is not available: {}",
                response.error.as_deref().unwrap_or("no response")
            );
        }
        self.scan();
        ready
    }

    /// Start the mutation watcher unless disabled.
    pub fn watch(&self, config: &WatcherConfig) -> Option<JoinHandle<()>> {
        if !config.enabled {
            debug!("Mutation watcher disabled");
            return None;
        }
        let session = self.me.upgrade()?;
        Some(MutationWatcher::new(session, config.coalesce_window()).spawn())
    }

    /// Run both detectors and attach handling to new fields. The last set
    /// found becomes the active one.
    pub fn scan(&self) -> ScanSummary {
        let mut doc = self.document.lock();
        let mut state = self.state.lock();

        let logins = detect_login_fields(&doc);
        for set in &logins {
            state.active_login = Some(*set);
            register_login(&mut doc, &mut state, set);
        }

        let payments = detect_payment_fields(&doc);
        for set in &payments {
            state.active_payment = Some(*set);
            register_card(&mut doc, &mut state, set);
        }

        let pass = self.scans.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            pass,
            login = logins.len(),
            payment = payments.len(),
            "Scanned page for fields"
        );
        ScanSummary {
            login_sets: logins.len(),
            payment_sets: payments.len(),
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub async fn handle_event(&self, event: PageEvent) {
        trace!("Page event {:?}", event);
        match event {
            PageEvent::Focus(target) => self.on_focus(target).await,
            PageEvent::Click(target) => self.on_click(target).await,
            PageEvent::Blur(target) => self.on_blur(target),
            PageEvent::Submit(form) => self.on_submit(form).await,
            PageEvent::KeyDown(key) => self.on_key(&key),
            PageEvent::Resize => self.reposition_icons(),
        }
    }

    async fn on_focus(&self, target: NodeId) {
        match self.target(target) {
            Target::LoginField => self.suggest_credentials(target).await,
            Target::CardField => self.show_card_selector(target).await,
            _ => {}
        }
    }

    async fn on_click(&self, target: NodeId) {
        let (choice, role) = {
            let mut doc = self.document.lock();
            let mut state = self.state.lock();
            match menu_click(&mut doc, &mut state, target) {
                Some(choice) => (Some(choice), Target::Page),
                None => (None, classify_target(&doc, &state, target)),
            }
        };

        if let Some(choice) = choice {
            match choice {
                MenuChoice::Login(credential) => {
                    self.fill_login_now(&credential);
                }
                MenuChoice::Card(card) => self.fill_card_now(&card),
            }
            return;
        }

        match role {
            Target::LoginIcon(field) => self.show_credential_selector(field).await,
            Target::CardIcon(field) => self.show_card_selector(field).await,
            Target::LoginField => self.suggest_credentials(target).await,
            Target::SaveButton(prompt) => self.accept_save(prompt).await,
            Target::CancelButton(prompt) => self.dismiss_save(prompt),
            Target::SubmitControl => self.check_after_settle(),
            Target::CardField | Target::Page => {}
        }
    }

    fn on_blur(&self, target: NodeId) {
        let (username, password) = {
            let doc = self.document.lock();
            let mut state = self.state.lock();
            let Some(watch) = state.login_fields.iter_mut().find(|w| w.password == target) else {
                return;
            };
            let pair = (
                doc.value(watch.username).to_string(),
                doc.value(watch.password).to_string(),
            );
            if pair.0.is_empty() || pair.1.is_empty() || pair == watch.last_pair {
                return;
            }
            watch.last_pair = pair;
            (watch.username, watch.password)
        };

        // Only offer if the values survive the stability window.
        self.after(self.config.stability_check(), move |session| async move {
            let values = {
                let doc = session.document.lock();
                (
                    doc.value(username).to_string(),
                    doc.value(password).to_string(),
                )
            };
            if !values.0.is_empty() && !values.1.is_empty() {
                debug!("Login detected after blur");
                session.check_and_offer(values.0, values.1).await;
            }
        });
    }

    async fn on_submit(&self, form: NodeId) {
        let registered = self.state.lock().forms.contains(&form);
        if !registered {
            return;
        }
        if let Some((username, password)) = self.active_values() {
            debug!("Login form submitted");
            self.check_and_offer(username, password).await;
        }
    }

    fn on_key(&self, key: &str) {
        if key != "Escape" {
            return;
        }
        let mut doc = self.document.lock();
        let mut state = self.state.lock();
        if state.menu.as_ref().is_some_and(|m| m.armed) {
            close_menu(&mut doc, &mut state);
        }
    }

    fn reposition_icons(&self) {
        let mut doc = self.document.lock();
        let state = self.state.lock();
        for icon in &state.icons {
            if doc.is_connected(icon.field) {
                ui::position_icon(&mut doc, icon.node, icon.field);
            }
        }
    }

    fn target(&self, target: NodeId) -> Target {
        let doc = self.document.lock();
        let state = self.state.lock();
        classify_target(&doc, &state, target)
    }

    // ------------------------------------------------------------------
    // Credential and card selection
    // ------------------------------------------------------------------

    /// Passive suggestion on login-field focus: a menu for one or more
    /// matches, silence otherwise.
    async fn suggest_credentials(&self, field: NodeId) {
        if !self.is_ready() {
            trace!("Vault not ready; no suggestions");
            return;
        }
        let response = self.bridge.get_credentials(&self.hostname()).await;
        match response.credentials() {
            Some(credentials) if !credentials.is_empty() => {
                self.show_login_menu(field, credentials)
            }
            _ => {}
        }
    }

    /// Explicit request from the login icon.
    async fn show_credential_selector(&self, field: NodeId) {
        let response = self.bridge.get_credentials(&self.hostname()).await;
        match response.credentials() {
            None => self.notify(MSG_UNAVAILABLE),
            Some(credentials) if credentials.is_empty() => self.notify(MSG_NO_CREDENTIALS),
            Some(mut credentials) if credentials.len() == 1 => {
                let credential = credentials.remove(0);
                self.fill_login_now(&credential);
            }
            Some(credentials) => self.show_login_menu(field, credentials),
        }
    }

    async fn show_card_selector(&self, field: NodeId) {
        if !self.is_ready() {
            self.notify(MSG_NOT_READY);
            return;
        }
        let response = self.bridge.get_credit_cards().await;
        match response.cards() {
            None => self.notify(MSG_UNAVAILABLE),
            Some(cards) if cards.is_empty() => self.notify(MSG_NO_CARDS),
            Some(mut cards) if cards.len() == 1 => {
                let card = cards.remove(0);
                self.fill_card_now(&card);
            }
            Some(cards) => self.show_card_menu(field, cards),
        }
    }

    fn show_login_menu(&self, field: NodeId, credentials: Vec<Credential>) {
        let entries = credentials
            .iter()
            .map(|c| MenuEntry {
                title: c.display_name().to_string(),
                detail: c.username.clone(),
            })
            .collect::<Vec<_>>();
        let choices = credentials.into_iter().map(MenuChoice::Login).collect();
        self.open_menu(field, &entries, choices, false);
    }

    fn show_card_menu(&self, field: NodeId, cards: Vec<CreditCard>) {
        let entries = cards
            .iter()
            .map(|c| MenuEntry {
                title: c.card_name.clone(),
                detail: format!("{} \u{2022} {}", c.masked_number(), c.expiry_mm_yy()),
            })
            .collect::<Vec<_>>();
        let choices = cards.into_iter().map(MenuChoice::Card).collect();
        self.open_menu(field, &entries, choices, true);
    }

    fn open_menu(&self, trigger: NodeId, entries: &[MenuEntry], choices: Vec<MenuChoice>, card: bool) {
        let node = {
            let mut doc = self.document.lock();
            let mut state = self.state.lock();
            close_menu(&mut doc, &mut state);
            let (node, items) = ui::create_menu(&mut doc, trigger, entries, card);
            state.menu = Some(OpenMenu {
                node,
                trigger,
                items: items.into_iter().zip(choices).collect(),
                armed: false,
            });
            node
        };

        self.after(self.config.settle_delay(), move |session| async move {
            let mut state = session.state.lock();
            if let Some(menu) = state.menu.as_mut().filter(|m| m.node == node) {
                menu.armed = true;
            }
        });
    }

    fn fill_login_now(&self, credential: &Credential) -> bool {
        let result = {
            let mut doc = self.document.lock();
            let state = self.state.lock();
            fill_login(&mut doc, state.active_login.as_ref(), credential)
        };
        match result {
            Ok(0) => {
                debug!("No login fields filled");
                false
            }
            Ok(filled) => {
                debug!(filled, "Filled login fields");
                self.notify(MSG_FILLED);
                true
            }
            Err(err) => {
                debug!("Login fill skipped: {}", err);
                false
            }
        }
    }

    fn fill_card_now(&self, card: &CreditCard) {
        let result = {
            let mut doc = self.document.lock();
            let state = self.state.lock();
            fill_card(&mut doc, state.active_payment.as_ref(), card)
        };
        match result {
            Ok(0) => debug!("No payment fields filled"),
            Ok(filled) => {
                debug!(filled, "Filled payment fields");
                self.notify(MSG_CARD_FILLED);
            }
            Err(err) => debug!("Card fill skipped: {}", err),
        }
    }

    // ------------------------------------------------------------------
    // Save offer
    // ------------------------------------------------------------------

    /// Offer to save a login unless the vault already holds the username.
    ///
    /// No-op unless the workflow is idle. A failed lookup counts as "not
    /// stored".
    pub async fn check_and_offer(&self, username: String, password: String) {
        if !self.state.lock().offer.try_begin() {
            debug!("Save already offered, skipping");
            return;
        }

        let response = self.bridge.get_credentials(&self.hostname()).await;
        let known = response
            .credentials()
            .is_some_and(|list| list.iter().any(|c| c.matches_username(&username)));
        if known {
            debug!("Credential already stored, not offering to save");
            self.state.lock().offer.already_saved();
            return;
        }

        if !self.state.lock().offer.schedule() {
            return;
        }
        debug!("Offering to save new credential");
        let pending = PendingSave { username, password };
        self.after(self.config.save_offer_delay(), move |session| async move {
            session.show_save_prompt(pending);
        });
    }

    fn show_save_prompt(&self, pending: PendingSave) {
        let prompt = {
            let mut doc = self.document.lock();
            let mut state = self.state.lock();
            if !state.offer.is_scheduled() {
                return;
            }
            let hostname = doc.hostname();
            let prompt = ui::create_save_prompt(&mut doc, &pending.username, &hostname);
            state.offer.show(prompt, pending);
            prompt
        };
        info!("Showing save prompt");

        self.after(self.config.auto_dismiss(), move |session| async move {
            session.dismiss_save(prompt.node);
        });
    }

    async fn accept_save(&self, prompt: NodeId) {
        let (pending, hostname, href) = {
            let mut doc = self.document.lock();
            let mut state = self.state.lock();
            let Some(pending) = state.offer.accept(prompt) else {
                return;
            };
            doc.remove(prompt);
            (pending, doc.hostname(), doc.href().to_string())
        };

        let request =
            SaveCredentialRequest::new(hostname, href, pending.username, pending.password);
        let response = self.bridge.save_credential(request).await;
        if response.success {
            info!("Credential saved");
            self.notify(MSG_SAVED);
        } else {
            warn!(
                "Saving credential failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
            self.notify(MSG_SAVE_FAILED);
        }
    }

    fn dismiss_save(&self, prompt: NodeId) {
        {
            let mut doc = self.document.lock();
            let mut state = self.state.lock();
            if !state.offer.dismiss(prompt) {
                return;
            }
            doc.remove(prompt);
        }
        debug!("Save prompt dismissed");

        self.after(self.config.cooldown(), |session| async move {
            session.state.lock().offer.end_cooldown();
            debug!("Save offer cooldown over");
        });
    }

    fn check_after_settle(&self) {
        self.after(self.config.settle_delay(), |session| async move {
            if let Some((username, password)) = session.active_values() {
                debug!("Login detected after submit click");
                session.check_and_offer(username, password).await;
            }
        });
    }

    /// Current values of the active login set, when both are filled.
    fn active_values(&self) -> Option<(String, String)> {
        let doc = self.document.lock();
        let state = self.state.lock();
        let set = state.active_login?;
        let username = doc.value(set.username);
        let password = doc.value(set.password);
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some((username.to_string(), password.to_string()))
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn hostname(&self) -> String {
        self.document.lock().hostname()
    }

    fn notify(&self, message: &str) {
        let node = ui::create_notification(&mut self.document.lock(), message);
        debug!("Notification: {}", message);
        self.after(self.config.notification(), move |session| async move {
            session.document.lock().remove(node);
        });
    }

    /// Run `task` after `delay` unless the session shuts down first.
    fn after<F, Fut>(&self, delay: Duration, task: F)
    where
        F: FnOnce(Arc<PageSession>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(session) = self.me.upgrade() else {
            return;
        };
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => task(session).await,
            }
        });
    }
}

#[async_trait]
impl PageAgent for PageSession {
    async fn fill_credential(&self, credential: Credential) -> bool {
        self.fill_login_now(&credential)
    }
}

fn register_login(doc: &mut Document, state: &mut SessionState, set: &LoginFieldSet) {
    if !doc.element(set.password).has_attribute(ui::ICON_MARKER) {
        doc.set_attribute(set.password, ui::ICON_MARKER, "true");
        let node = ui::create_icon(doc, set.password, false);
        state.icons.push(Icon {
            node,
            field: set.password,
            card: false,
        });
    }

    let listening = doc.element(set.username).has_attribute(ui::LISTENER_MARKER)
        || doc.element(set.password).has_attribute(ui::LISTENER_MARKER);
    if !listening {
        doc.set_attribute(set.username, ui::LISTENER_MARKER, "true");
        doc.set_attribute(set.password, ui::LISTENER_MARKER, "true");
        state.login_fields.push(LoginWatch {
            username: set.username,
            password: set.password,
            last_pair: Default::default(),
        });
        debug!(
            "Watching login fields {} / {}",
            doc.element(set.username).describe(),
            doc.element(set.password).describe()
        );
    }

    if let Some(form) = set.form {
        state.forms.insert(form);
    }

    for control in submit_controls(doc, set) {
        if ui::is_own_ui(doc, control) || doc.element(control).has_attribute(ui::SUBMIT_MARKER) {
            continue;
        }
        doc.set_attribute(control, ui::SUBMIT_MARKER, "true");
        state.submit_controls.insert(control);
    }
}

fn register_card(doc: &mut Document, state: &mut SessionState, set: &PaymentFieldSet) {
    doc.set_attribute(set.card_number, CARD_MARKER, "true");
    state.card_fields.insert(set.card_number);

    if !doc.element(set.card_number).has_attribute(ui::CARD_ICON_MARKER) {
        doc.set_attribute(set.card_number, ui::CARD_ICON_MARKER, "true");
        let node = ui::create_icon(doc, set.card_number, true);
        state.icons.push(Icon {
            node,
            field: set.card_number,
            card: true,
        });
    }
    debug!("Watching card field {}", doc.element(set.card_number).describe());
}

fn classify_target(doc: &Document, state: &SessionState, target: NodeId) -> Target {
    if let Some(prompt) = state.offer.prompt() {
        if doc.contains(prompt.save, target) {
            return Target::SaveButton(prompt.node);
        }
        if doc.contains(prompt.cancel, target) {
            return Target::CancelButton(prompt.node);
        }
    }
    if let Some(icon) = state.icons.iter().find(|i| doc.contains(i.node, target)) {
        return if icon.card {
            Target::CardIcon(icon.field)
        } else {
            Target::LoginIcon(icon.field)
        };
    }
    if state
        .login_fields
        .iter()
        .any(|w| w.username == target || w.password == target)
    {
        return Target::LoginField;
    }
    if state.card_fields.contains(&target) {
        return Target::CardField;
    }
    if state
        .submit_controls
        .iter()
        .any(|control| doc.contains(*control, target))
    {
        return Target::SubmitControl;
    }
    Target::Page
}

/// Route a click through the open menu. Returns the chosen entry when an
/// item was clicked; closes the menu on an armed outside click.
fn menu_click(doc: &mut Document, state: &mut SessionState, target: NodeId) -> Option<MenuChoice> {
    let (inside, chosen, armed, trigger) = {
        let menu = state.menu.as_ref()?;
        let chosen = menu
            .items
            .iter()
            .find(|(item, _)| doc.contains(*item, target))
            .map(|(_, choice)| choice.clone());
        (doc.contains(menu.node, target), chosen, menu.armed, menu.trigger)
    };

    if chosen.is_some() || (!inside && armed && target != trigger) {
        close_menu(doc, state);
    }
    chosen
}

fn close_menu(doc: &mut Document, state: &mut SessionState) {
    if let Some(menu) = state.menu.take() {
        doc.remove(menu.node);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
