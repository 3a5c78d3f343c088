use std::sync::Arc;

use pricebook_core::PriceRepository;

#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn PriceRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn PriceRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &dyn PriceRepository {
        self.repository.as_ref()
    }
}
