use std::sync::Arc;

use sawari_booking::HoldManager;
use sawari_core::location::LocationResolver;
use sawari_payment::PaymentManager;
use sawari_store::app_config::BusinessRules;
use sawari_store::StoreHandle;

#[derive(Clone)]
pub struct AppState {
    pub holds: HoldManager,
    pub payments: PaymentManager,
    pub resolver: Arc<dyn LocationResolver>,
}

impl AppState {
    pub fn new(
        store: StoreHandle,
        rules: BusinessRules,
        resolver: Arc<dyn LocationResolver>,
    ) -> Self {
        Self {
            holds: HoldManager::new(store.clone(), rules.clone()),
            payments: PaymentManager::new(store, rules),
            resolver,
        }
    }
}
