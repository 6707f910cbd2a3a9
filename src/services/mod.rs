pub mod generation_service;
pub mod prompts;
pub mod score_service;
pub mod settings_service;
pub mod verification_service;

pub use generation_service::GenerationService;
pub use score_service::ScoreService;
pub use settings_service::SettingsService;
pub use verification_service::VerificationService;
