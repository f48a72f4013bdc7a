/// Errors raised while preparing prompts.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    TemplateError(#[from] crate::utils::Error),
    #[error("Please enter the patient history.")]
    EmptyHistory,
}

pub type Result<T> = core::result::Result<T, Error>;

/// Persona sent as the system message with every task.
pub const SYSTEM_IDENTITY: &'static str = "\
You are an AI medical consultant for medical professionals \
with extensive knowledge and expertise in clinical medicine. \
Your role is to provide detailed and accurate analysis, diagnosis, \
and management recommendations for complex patient cases.\
";
