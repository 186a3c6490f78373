pub mod bolna;
pub use bolna::{BolnaClient, VoiceCallProvider};
