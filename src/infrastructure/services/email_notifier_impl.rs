// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::EmailSettings;
use crate::domain::models::status::StatusChange;
use crate::domain::services::notification_service::{Notifier, NotifyError};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use metrics::counter;
use tracing::info;

/// 通知邮件主题
const SUBJECT: &str = "Emirates application status updated";
/// App Password提示信息
const APP_PASSWORD_HINT: &str =
    "Gmail rejected your credentials. You must use a 16-char App Password.";

/// 465端口走SMTPS隐式TLS，其余端口走STARTTLS
fn uses_implicit_tls(port: u16) -> bool {
    port == 465
}

/// 邮件通知器
///
/// 基于lettre的SMTP状态变更通知实现
pub struct EmailNotifier {
    /// 邮件配置
    email: EmailSettings,
}

impl EmailNotifier {
    /// 创建新的邮件通知器实例
    pub fn new(email: EmailSettings) -> Self {
        Self { email }
    }

    /// 构造通知邮件
    ///
    /// # 参数
    ///
    /// * `change` - 检测到的状态变更
    ///
    /// # 返回值
    ///
    /// * `Ok(Message)` - 构造好的邮件
    /// * `Err(NotifyError)` - 地址或正文构造失败
    pub fn compose(&self, change: &StatusChange) -> Result<Message, NotifyError> {
        let from: Mailbox = self
            .email
            .from
            .parse()
            .map_err(|e| NotifyError::InvalidMessage(format!("Invalid from address: {}", e)))?;
        let to: Mailbox = self
            .email
            .to
            .parse()
            .map_err(|e| NotifyError::InvalidMessage(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Your application status changed to: {}",
                change.current
            ))
            .map_err(|e| NotifyError::InvalidMessage(format!("Build email: {}", e)))
    }

    fn build_mailer(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let credentials =
            Credentials::new(self.email.from.clone(), self.email.password.clone());

        let builder = if uses_implicit_tls(self.email.smtp_port) {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.email.smtp_server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.email.smtp_server)
        }
        .map_err(|e| NotifyError::Transport(format!("SMTP relay: {}", e)))?;

        Ok(builder
            .port(self.email.smtp_port)
            .credentials(credentials)
            .build())
    }

    fn map_send_error(e: lettre::transport::smtp::Error) -> NotifyError {
        let text = e.to_string();
        if text.contains("535") || text.to_lowercase().contains("authentication") {
            NotifyError::AuthRejected(APP_PASSWORD_HINT.to_string())
        } else {
            NotifyError::Transport(text)
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    /// 投递一次状态变更通知
    async fn notify_change(&self, change: &StatusChange) -> Result<(), NotifyError> {
        let message = self.compose(change)?;
        let mailer = self.build_mailer()?;

        counter!("status_notify_attempts_total").increment(1);
        mailer.send(message).await.map_err(|e| {
            counter!("status_notify_failed_total").increment(1);
            Self::map_send_error(e)
        })?;

        counter!("status_notify_success_total").increment(1);
        info!("Status change notification sent to {}", self.email.to);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn settings() -> EmailSettings {
        EmailSettings {
            from: "watcher@example.com".to_string(),
            to: "me@example.com".to_string(),
            password: "app-password".to_string(),
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 465,
        }
    }

    fn change(current: &str) -> StatusChange {
        StatusChange {
            previous: "Applied".to_string(),
            current: current.to_string(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_compose_message() {
        let notifier = EmailNotifier::new(settings());
        let message = notifier.compose(&change("Offer")).unwrap();

        let rendered = String::from_utf8(message.formatted()).unwrap();
        assert!(rendered.contains("Subject: Emirates application status updated"));
        assert!(rendered.contains("From: watcher@example.com"));
        assert!(rendered.contains("To: me@example.com"));
        assert!(rendered.contains("Your application status changed to: Offer"));
    }

    #[test]
    fn test_compose_rejects_bad_address() {
        let mut bad = settings();
        bad.to = "not an address".to_string();
        let notifier = EmailNotifier::new(bad);

        assert!(matches!(
            notifier.compose(&change("Offer")),
            Err(NotifyError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_implicit_tls_port_selection() {
        assert!(uses_implicit_tls(465));
        assert!(!uses_implicit_tls(587));
        assert!(!uses_implicit_tls(25));
    }
}
