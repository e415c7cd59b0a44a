//! Report assembly and delivery: render the QC run as HTML, email it with
//! the extracted CSV attached.

pub mod mailer;
pub mod render;

pub use mailer::Mailer;
pub use render::render_report;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("invalid attachment content type: {0}")]
    ContentType(String),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
