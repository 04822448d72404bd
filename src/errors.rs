use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndieMarkError {
    #[error("text generation failed: {0}")] TextGeneration(String),
    #[error("malformed generation response: {0}")] Schema(String),
    #[error("a campaign is already being generated")] GenerationInFlight,
    #[error("campaign parameters are incomplete: {0}")] InvalidParameters(String),
    #[error("persistence failed: {0}")] Persistence(String),
    #[error("sign in to save campaigns")] SignedOut,
}
