//! Save-offer state machine.
//!
//! ```text
//! Idle -> Checking -> Scheduled -> Prompting -> (save) ---------> Idle
//!            |                        |
//!            +-> Idle (known user)    +-> (dismiss) -> Cooldown -> Idle
//! ```
//!
//! Only `Idle` accepts a new trigger, so at most one prompt exists at a
//! time.

use vaultbridge_dom::NodeId;

use crate::ui::SavePrompt;

/// Login captured for a save offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveOfferState {
    #[default]
    Idle,
    /// Asking the vault whether the username is already stored.
    Checking,
    /// Waiting out the delay before the prompt appears.
    Scheduled,
    /// Prompt on screen.
    Prompting {
        prompt: SavePrompt,
        pending: PendingSave,
    },
    /// Prompt dismissed; new triggers ignored until the cooldown ends.
    Cooldown,
}

#[derive(Debug, Default)]
pub struct SaveOffer {
    state: SaveOfferState,
}

impl SaveOffer {
    pub fn state(&self) -> &SaveOfferState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SaveOfferState::Idle
    }

    /// Claim the workflow for a new trigger. False while an offer is
    /// already in flight or cooling down.
    pub fn try_begin(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.state = SaveOfferState::Checking;
        true
    }

    /// The username is already stored; nothing to offer.
    pub fn already_saved(&mut self) {
        if self.state == SaveOfferState::Checking {
            self.state = SaveOfferState::Idle;
        }
    }

    pub fn schedule(&mut self) -> bool {
        if self.state != SaveOfferState::Checking {
            return false;
        }
        self.state = SaveOfferState::Scheduled;
        true
    }

    pub fn is_scheduled(&self) -> bool {
        self.state == SaveOfferState::Scheduled
    }

    pub fn show(&mut self, prompt: SavePrompt, pending: PendingSave) -> bool {
        if !self.is_scheduled() {
            return false;
        }
        self.state = SaveOfferState::Prompting { prompt, pending };
        true
    }

    /// Prompt currently displayed, if any.
    pub fn prompt(&self) -> Option<SavePrompt> {
        match &self.state {
            SaveOfferState::Prompting { prompt, .. } => Some(*prompt),
            _ => None,
        }
    }

    /// Accept the prompt whose root is `node`; returns to `Idle` at once.
    pub fn accept(&mut self, node: NodeId) -> Option<PendingSave> {
        match std::mem::take(&mut self.state) {
            SaveOfferState::Prompting { prompt, pending } if prompt.node == node => Some(pending),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Dismiss the prompt whose root is `node` and enter the cooldown.
    pub fn dismiss(&mut self, node: NodeId) -> bool {
        match &self.state {
            SaveOfferState::Prompting { prompt, .. } if prompt.node == node => {
                self.state = SaveOfferState::Cooldown;
                true
            }
            _ => false,
        }
    }

    pub fn end_cooldown(&mut self) {
        if self.state == SaveOfferState::Cooldown {
            self.state = SaveOfferState::Idle;
        }
    }
}
