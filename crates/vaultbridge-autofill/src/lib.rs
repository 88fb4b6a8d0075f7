//! # VaultBridge Autofill
//!
//! The page-context half of the bridge: a [`PageSession`] per page that
//! detects login and payment fields, offers stored records through inline
//! icons and menus, fills them into the page, and offers to save new logins.
//!
//! ## Save offer timing
//!
//! | Step | Default |
//! |------|---------|
//! | settle after submit click | 100 ms |
//! | blur stability check | 2 s |
//! | delay before prompt | 1.5 s |
//! | prompt auto-dismiss | 10 s |
//! | cooldown after dismiss | 5 s |
//!
//! All of these come from [`AutofillConfig`](vaultbridge_config::AutofillConfig).

mod event;
mod fill;
mod save_offer;
mod session;
pub mod ui;
mod watcher;

pub use event::PageEvent;
pub use fill::{FillError, fill_card, fill_login};
pub use save_offer::{PendingSave, SaveOffer, SaveOfferState};
pub use session::{
    MSG_CARD_FILLED, MSG_FILLED, MSG_NO_CARDS, MSG_NO_CREDENTIALS, MSG_NOT_READY, MSG_SAVE_FAILED,
    MSG_SAVED, MSG_UNAVAILABLE, PageSession, ScanSummary,
};
pub use watcher::MutationWatcher;
