//! Terminal views over the endpoint catalog.
//!
//! Each view owns a `Slot`: a loading flag, an error message and the last
//! good result. Views call endpoint functions, fill the slot, and render
//! plain text. None of them retry; a failed call leaves a static message and
//! the user runs the command again.

mod chat;
mod crops;
mod dashboard;
mod suggestions;
mod weather;

pub use chat::ChatView;
pub use crops::{CropEditor, CropListView};
pub use dashboard::DashboardView;
pub use suggestions::SuggestionsView;
pub use weather::WeatherView;

use farm_core::ApiError;

#[derive(Debug)]
pub struct Slot<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            data: None,
        }
    }
}

impl<T> Slot<T> {
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Store the outcome; on failure keep any previous data and show `message`.
    pub fn finish(&mut self, outcome: Result<T, ApiError>, message: impl FnOnce(&ApiError) -> String) {
        self.loading = false;
        match outcome {
            Ok(data) => self.data = Some(data),
            Err(err) => {
                tracing::debug!(error = %err, "view load failed");
                self.error = Some(message(&err));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::rc::Rc;

    use farm_core::{
        ApiClient, ClientConfig, FarmApi, MemorySessionStore, RecordingNavigator, ScriptedTransport, SessionContext,
        TokenPair,
    };

    pub struct Fixture {
        pub api: FarmApi,
        pub transport: Rc<ScriptedTransport>,
        pub store: Rc<MemorySessionStore>,
        pub navigator: Rc<RecordingNavigator>,
    }

    pub fn signed_in() -> Fixture {
        let transport = Rc::new(ScriptedTransport::new());
        let store = Rc::new(MemorySessionStore::with_tokens(TokenPair::new("abc", "def")));
        let navigator = Rc::new(RecordingNavigator::new());
        let context = SessionContext::new(store.clone(), navigator.clone());
        let api = FarmApi::new(ApiClient::new(ClientConfig::default(), transport.clone(), context));
        Fixture {
            api,
            transport,
            store,
            navigator,
        }
    }
}
