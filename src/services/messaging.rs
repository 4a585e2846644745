//! Templated bulk email to attendees.
//!
//! Recipients are mailed one after another. Each attempt is recorded
//! through a [`ProgressSink`] before the next starts, so a reader polling
//! the message sees live counts. Failures are counted, never retried.

use axum::async_trait;
use qrcode::render::svg;
use qrcode::QrCode;

use crate::mailer::{Mailer, OutgoingEmail};
use crate::models::{Attendee, MessageStatus};
use crate::utils::error::{AppError, AppResult};

const QR_SIZE_PX: u32 = 240;

/// Values substituted into `{{placeholder}}` slots.
#[derive(Debug, Clone)]
pub struct TemplateContext<'a> {
    pub attendee: &'a Attendee,
    pub event_title: &'a str,
    pub ticket_name: &'a str,
}

impl TemplateContext<'_> {
    fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "first_name" => self.attendee.first_name.clone(),
            "last_name" => self.attendee.last_name.clone(),
            "name" => self.attendee.full_name(),
            "email" => self.attendee.email.clone(),
            "event" => self.event_title.to_string(),
            "ticket" => self.ticket_name.to_string(),
            "code" => self.attendee.code.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// Replaces known `{{key}}` placeholders; unknown ones are kept verbatim.
pub fn render(template: &str, ctx: &TemplateContext<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match ctx.lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn qr_svg(data: &str) -> AppResult<String> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::InternalServerError(format!("QR encoding failed: {}", e)))?;

    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_SIZE_PX, QR_SIZE_PX)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// What a single message sends to everyone, before personalisation.
#[derive(Debug, Clone)]
pub struct Campaign {
    pub subject: String,
    pub body: String,
    pub include_qr: bool,
    pub event_title: String,
}

/// One attendee plus the name of the ticket they hold.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub attendee: Attendee,
    pub ticket_name: String,
}

impl Campaign {
    pub fn compose(&self, recipient: &Recipient) -> AppResult<OutgoingEmail> {
        let ctx = TemplateContext {
            attendee: &recipient.attendee,
            event_title: &self.event_title,
            ticket_name: &recipient.ticket_name,
        };

        let mut html = String::from("<div>");
        html.push_str(&escape_html(&render(&self.body, &ctx)).replace('\n', "<br>"));
        html.push_str("</div>");

        if self.include_qr {
            html.push_str("<div style=\"margin-top:24px\">");
            html.push_str(&qr_svg(&recipient.attendee.code)?);
            html.push_str("<p>");
            html.push_str(&escape_html(&recipient.attendee.code));
            html.push_str("</p></div>");
        }

        Ok(OutgoingEmail {
            to: recipient.attendee.email.clone(),
            subject: render(&self.subject, &ctx),
            html,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub sent: i32,
    pub failed: i32,
    pub last_error: Option<String>,
}

impl Progress {
    pub fn final_status(&self) -> MessageStatus {
        if self.sent > 0 {
            MessageStatus::Completed
        } else {
            MessageStatus::Failed
        }
    }
}

#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn record(&self, progress: &Progress) -> AppResult<()>;
}

/// Sends `campaign` to every recipient in order and returns the final tally.
pub async fn deliver<M, P>(
    mailer: &M,
    sink: &P,
    campaign: &Campaign,
    recipients: &[Recipient],
) -> Progress
where
    M: Mailer + ?Sized,
    P: ProgressSink + ?Sized,
{
    let mut progress = Progress::default();

    for recipient in recipients {
        let result = match campaign.compose(recipient) {
            Ok(email) => mailer.send(&email).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => progress.sent += 1,
            Err(e) => {
                tracing::warn!(
                    attendee_id = %recipient.attendee.id,
                    error = %e,
                    "Message delivery failed"
                );
                progress.failed += 1;
                progress.last_error = Some(format!("{}: {}", recipient.attendee.email, e));
            }
        }

        if let Err(e) = sink.record(&progress).await {
            tracing::warn!(error = %e, "Could not record message progress");
        }
    }

    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendeeStatus;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn attendee(first: &str, email: &str) -> Attendee {
        let now = Utc::now();
        Attendee {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            order_id: Uuid::new_v4(),
            ticket_id: Uuid::new_v4(),
            first_name: first.to_string(),
            last_name: "Lopez".to_string(),
            email: email.to_string(),
            phone: None,
            code: "K7M2PQ9XRT".to_string(),
            status: AttendeeStatus::Active,
            checked_in_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn recipient(first: &str, email: &str) -> Recipient {
        Recipient {
            attendee: attendee(first, email),
            ticket_name: "VIP".to_string(),
        }
    }

    fn campaign(include_qr: bool) -> Campaign {
        Campaign {
            subject: "{{event}}: your {{ticket}} ticket".to_string(),
            body: "Hi {{first_name}},\nshow code {{code}} <at the door>.".to_string(),
            include_qr,
            event_title: "Rust Meetup".to_string(),
        }
    }

    #[test]
    fn test_render_known_and_unknown_placeholders() {
        let a = attendee("Ana", "ana@example.com");
        let ctx = TemplateContext {
            attendee: &a,
            event_title: "Gala",
            ticket_name: "General",
        };
        assert_eq!(
            render("{{ name }} @ {{event}} ({{seat}}) {{unterminated", &ctx),
            "Ana Lopez @ Gala ({{seat}}) {{unterminated"
        );
    }

    #[test]
    fn test_compose_escapes_body_and_renders_subject() {
        let email = campaign(false)
            .compose(&recipient("Ana", "ana@example.com"))
            .unwrap();
        assert_eq!(email.to, "ana@example.com");
        assert_eq!(email.subject, "Rust Meetup: your VIP ticket");
        assert!(email.html.contains("Hi Ana,<br>show code K7M2PQ9XRT &lt;at the door&gt;."));
        assert!(!email.html.contains("<svg"));
    }

    #[test]
    fn test_compose_appends_qr() {
        let email = campaign(true)
            .compose(&recipient("Ana", "ana@example.com"))
            .unwrap();
        assert!(email.html.contains("<svg"));
        assert!(email.html.contains("<p>K7M2PQ9XRT</p>"));
    }

    struct FlakyMailer {
        reject: &'static str,
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
            self.attempts.lock().unwrap().push(email.to.clone());
            if email.to == self.reject {
                return Err(AppError::ExternalServiceError("mailbox full".to_string()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<Progress>>);

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn record(&self, progress: &Progress) -> AppResult<()> {
            self.0.lock().unwrap().push(progress.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deliver_counts_failures_without_retrying() {
        let mailer = FlakyMailer {
            reject: "bo@example.com",
            attempts: Mutex::new(vec![]),
        };
        let sink = RecordingSink::default();
        let recipients = vec![
            recipient("Ana", "ana@example.com"),
            recipient("Bo", "bo@example.com"),
            recipient("Cy", "cy@example.com"),
        ];

        let progress = deliver(&mailer, &sink, &campaign(true), &recipients).await;

        assert_eq!(progress.sent, 2);
        assert_eq!(progress.failed, 1);
        assert!(progress.last_error.unwrap().starts_with("bo@example.com"));
        assert_eq!(
            *mailer.attempts.lock().unwrap(),
            vec!["ana@example.com", "bo@example.com", "cy@example.com"]
        );

        let recorded = sink.0.lock().unwrap();
        let tallies: Vec<(i32, i32)> = recorded.iter().map(|p| (p.sent, p.failed)).collect();
        assert_eq!(tallies, vec![(1, 0), (1, 1), (2, 1)]);
    }

    #[test]
    fn test_final_status() {
        let none_sent = Progress {
            sent: 0,
            failed: 3,
            last_error: None,
        };
        assert_eq!(none_sent.final_status(), MessageStatus::Failed);

        let some_sent = Progress {
            sent: 1,
            ..none_sent
        };
        assert_eq!(some_sent.final_status(), MessageStatus::Completed);
    }
}
