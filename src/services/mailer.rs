use async_trait::async_trait;
use log::info;

/// Outbound mail. Only password reset links are ever sent.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, recipient_name: &str, reset_url: &str) -> Result<(), String>;
}

/// Writes the reset link to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, recipient_name: &str, reset_url: &str) -> Result<(), String> {
        info!("Password reset link for {} <{}>: {}", recipient_name, to, reset_url);
        Ok(())
    }
}
