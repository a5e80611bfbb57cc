//! Inbound command surface.
//!
//! The pipeline is driven by a small set of named actions; every action is
//! answered with a plain status string, success or not.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::ports::form_adapter::FormAdapter;
use crate::ports::settings::{SettingsStore, keys};
use crate::ui::UiState;
use crate::use_cases::solve_form::{STATUS_OK, SolveFormUseCase};

/// A command received from the invoking side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Run the Google Forms pipeline end to end.
    SolveGoogleForm,
    /// Run the Microsoft Forms pipeline end to end.
    SolveMicrosoftForm,
    ShowUi,
    HideUi,
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "runScript-gform" => Ok(Action::SolveGoogleForm),
            "runScript-msform" => Ok(Action::SolveMicrosoftForm),
            "showUI" => Ok(Action::ShowUi),
            "hideUI" => Ok(Action::HideUi),
            _ => Err(()),
        }
    }
}

/// Reply to one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: String,
}

impl Response {
    fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// Routes inbound actions to the use case and reduces every outcome to a
/// status string.
pub struct Dispatcher {
    use_case: SolveFormUseCase,
    google: Arc<dyn FormAdapter>,
    microsoft: Arc<dyn FormAdapter>,
    settings: Arc<dyn SettingsStore>,
    ui: UiState,
}

impl Dispatcher {
    pub fn new(
        use_case: SolveFormUseCase,
        google: Arc<dyn FormAdapter>,
        microsoft: Arc<dyn FormAdapter>,
        settings: Arc<dyn SettingsStore>,
        ui: UiState,
    ) -> Self {
        Self {
            use_case,
            google,
            microsoft,
            settings,
            ui,
        }
    }

    /// Load the persisted UI-visibility flag, defaulting to visible and
    /// persisting the default the first time around.
    pub async fn sync_ui_from_settings(&self) {
        match self.settings.get_bool(keys::SHOW_UI).await {
            Ok(Some(visible)) => self.ui.set_visible(visible),
            Ok(None) => {
                self.ui.set_visible(true);
                if let Err(e) = self.settings.set(keys::SHOW_UI, json!(true)).await {
                    warn!("Could not persist UI visibility default: {}", e);
                }
            }
            Err(e) => warn!("Could not read UI visibility: {}", e),
        }
    }

    /// Handle a raw action string; unrecognized input is reported, not an
    /// error.
    pub async fn handle_raw(&self, action: &str) -> Response {
        match action.parse::<Action>() {
            Ok(action) => self.handle(action).await,
            Err(()) => {
                warn!("Unknown action: {}", action);
                Response::new("Unknown action")
            }
        }
    }

    pub async fn handle(&self, action: Action) -> Response {
        match action {
            Action::SolveGoogleForm => self.solve(self.google.as_ref()).await,
            Action::SolveMicrosoftForm => self.solve(self.microsoft.as_ref()).await,
            Action::ShowUi => {
                self.set_ui_visible(true).await;
                Response::new("UI shown")
            }
            Action::HideUi => {
                self.set_ui_visible(false).await;
                Response::new("UI hidden")
            }
        }
    }

    async fn solve(&self, form: &dyn FormAdapter) -> Response {
        info!("Starting form solve");
        match self.use_case.execute(form).await {
            Ok(()) => Response::new(STATUS_OK),
            Err(e) => Response::new(e.to_string()),
        }
    }

    async fn set_ui_visible(&self, visible: bool) {
        self.ui.set_visible(visible);
        // Both adapters drive the same page; reflecting twice is harmless.
        self.google.set_ui_visible(visible);
        self.microsoft.set_ui_visible(visible);
        if let Err(e) = self.settings.set(keys::SHOW_UI, json!(visible)).await {
            warn!("Could not persist UI visibility: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use solver_domain::{ImageRef, ProviderKind, Question, Reconciliation};
    use std::sync::Mutex;

    use crate::ports::answer_gateway::{AnswerGateway, GatewayError};
    use crate::ports::form_adapter::FormError;
    use crate::ports::settings::SettingsError;

    struct StubGateway(ProviderKind);

    #[async_trait]
    impl AnswerGateway for StubGateway {
        fn provider(&self) -> ProviderKind {
            self.0
        }

        async fn answer(
            &self,
            _api_key: &str,
            _prompt: &str,
            _images: &[ImageRef],
        ) -> Result<String, GatewayError> {
            Err(GatewayError::RequestFailed("stub".to_string()))
        }
    }

    #[derive(Default)]
    struct StubAdapter {
        ui_events: Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl FormAdapter for StubAdapter {
        fn extract_questions(&self) -> Result<Vec<Question>, FormError> {
            Ok(Vec::new())
        }

        async fn apply_answer(
            &self,
            _index: usize,
            _question: &Question,
            _outcome: &Reconciliation,
        ) -> Result<(), FormError> {
            Ok(())
        }

        fn annotate(&self, _index: usize, _text: &str, _visible: bool) {}
        fn clear_annotation(&self, _index: usize) {}
        fn set_control_enabled(&self, _enabled: bool) {}

        fn set_ui_visible(&self, visible: bool) {
            self.ui_events.lock().unwrap().push(visible);
        }
    }

    struct StubSettings;

    #[async_trait]
    impl SettingsStore for StubSettings {
        async fn get(&self, _key: &str) -> Result<Option<Value>, SettingsError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Value) -> Result<(), SettingsError> {
            Ok(())
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<StubAdapter>, UiState) {
        let ui = UiState::default();
        let google = Arc::new(StubAdapter::default());
        let settings = Arc::new(StubSettings);
        let use_case = SolveFormUseCase::new(
            Arc::new(StubGateway(ProviderKind::OpenAi)),
            Arc::new(StubGateway(ProviderKind::Gemini)),
            settings.clone(),
            ui.clone(),
        );
        let d = Dispatcher::new(
            use_case,
            google.clone(),
            Arc::new(StubAdapter::default()),
            settings,
            ui.clone(),
        );
        (d, google, ui)
    }

    #[tokio::test]
    async fn test_unknown_action_status() {
        let (d, _, _) = dispatcher();
        assert_eq!(d.handle_raw("explode").await.status, "Unknown action");
    }

    #[tokio::test]
    async fn test_hide_ui_flips_flag_and_reflects_on_page() {
        let (d, google, ui) = dispatcher();
        let response = d.handle_raw("hideUI").await;

        assert_eq!(response.status, "UI hidden");
        assert!(!ui.visible());
        assert_eq!(*google.ui_events.lock().unwrap(), vec![false]);

        assert_eq!(d.handle_raw("showUI").await.status, "UI shown");
        assert!(ui.visible());
    }

    #[tokio::test]
    async fn test_solve_without_keys_reports_configuration_error() {
        let (d, _, _) = dispatcher();
        let response = d.handle_raw("runScript-gform").await;
        assert_eq!(
            response.status,
            "Please set your OpenAI and Gemini API key(s) in the settings first!"
        );
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(
            "runScript-gform".parse::<Action>(),
            Ok(Action::SolveGoogleForm)
        );
        assert_eq!(
            "runScript-msform".parse::<Action>(),
            Ok(Action::SolveMicrosoftForm)
        );
        assert_eq!("showUI".parse::<Action>(), Ok(Action::ShowUi));
        assert_eq!("hideUI".parse::<Action>(), Ok(Action::HideUi));
        assert!("runScript".parse::<Action>().is_err());
    }
}
