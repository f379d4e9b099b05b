//! Shared application state handed to every handler via axum's `State`
//! extractor.

use std::sync::Arc;

use mailagg_scheduler::Scheduler;
use mailagg_store::Store;
use mailagg_vault::CredentialVault;

use crate::auth::AuthState;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub scheduler: Arc<Scheduler>,
    pub vault: Arc<CredentialVault>,
    pub auth: Arc<AuthState>,
}
