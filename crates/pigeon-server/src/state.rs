//! Shared state for the HTTP handlers

use pigeon_gateway::MessageRouter;

/// State handed to every HTTP handler
#[derive(Clone)]
pub struct AppState {
    /// Router of the running gateway; push and count go through it
    pub router: MessageRouter,
}

impl AppState {
    pub fn new(router: MessageRouter) -> Self {
        Self { router }
    }
}
