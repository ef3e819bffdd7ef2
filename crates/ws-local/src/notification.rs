//! Mail delivery that only logs.

use ws_core::{NotificationService, WorkspaceError};

/// Records outgoing mail as `tracing` events instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationService;

impl LogNotificationService {
    fn log_email(
        to: &[String],
        from: &str,
        subject: &str,
        body: &str,
        format: &'static str,
    ) -> Result<(), WorkspaceError> {
        if to.is_empty() {
            return Err(WorkspaceError::invalid_input("to", "cannot be empty"));
        }
        tracing::info!(
            from = %from,
            to = %to.join(", "),
            subject = %subject,
            format,
            body_len = body.len(),
            "Email"
        );
        tracing::debug!(body = %body, "Email body");
        Ok(())
    }
}

impl NotificationService for LogNotificationService {
    fn send_email(
        &self,
        to: &[String],
        from: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), WorkspaceError> {
        Self::log_email(to, from, subject, body, "text")
    }

    fn send_html_email(
        &self,
        to: &[String],
        from: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), WorkspaceError> {
        Self::log_email(to, from, subject, html_body, "html")
    }
}

#[cfg(test)]
mod tests {
    use ws_core::ErrorKind;

    use super::*;

    #[test]
    fn test_send_email_succeeds() {
        let service = LogNotificationService;

        service
            .send_email(
                &["a@example.com".to_owned()],
                "noreply@example.com",
                "Review requested",
                "Please review RFC-1",
            )
            .unwrap();
        service
            .send_html_email(
                &["a@example.com".to_owned()],
                "noreply@example.com",
                "Approved",
                "<p>Done</p>",
            )
            .unwrap();
    }

    #[test]
    fn test_send_email_without_recipients() {
        let err = LogNotificationService
            .send_email(&[], "noreply@example.com", "s", "b")
            .unwrap_err();

        assert!(err.is(ErrorKind::InvalidInput));
    }
}
