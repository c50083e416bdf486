use std::sync::Arc;

use stayline_booking::BookingOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BookingOrchestrator>,
}
