// src/browser/session.rs
use crate::utils::error::SessionError;

/// A page-fetching capability positioned on one document at a time.
///
/// The extractor owns a session for the duration of a run and calls
/// [`PageSession::close`] on every exit path.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    /// Loads `url` and makes it the current page.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Types `text` into the input with id `input_id` on the current page and
    /// submits its form, making the result page current.
    async fn submit_search(&mut self, input_id: &str, text: &str) -> Result<(), SessionError>;

    /// Markup of the current page.
    fn current_html(&self) -> Result<&str, SessionError>;

    /// Releases the session. Further calls fail with [`SessionError::Closed`].
    fn close(&mut self);
}
