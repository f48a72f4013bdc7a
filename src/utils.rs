use serde::Serialize;
use sha2::{Digest, Sha256};
use tinytemplate::{format_unescaped, TinyTemplate};

/// Template rendering failure.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("template error: {0}")]
    TemplateError(#[from] tinytemplate::error::Error),
}

type Result<T> = core::result::Result<T, Error>;

pub fn render_template(template: &str, context: &impl Serialize) -> Result<String> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&format_unescaped);
    tt.add_template("x", template)
        .map_err(Error::TemplateError)?;
    tt.render("x", &context).map_err(Error::TemplateError)
}

/// Short stable identifier for a piece of text, safe to put in logs.
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..6])
}
