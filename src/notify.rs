//! Email notification for new citations.
//!
//! Rendering is pure string templating over a [`CitationDiff`]; delivery
//! goes through the [`MailTransport`] seam so tests never open a network
//! session. Missing sender credentials downgrade delivery to a logged skip:
//! notification is best-effort, data persistence is not.

use crate::config::Config;
use crate::diff::{ArticleDelta, CitationDiff};
use crate::error::Result;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, warn};

/// Fixed mail relay; sessions are TLS-wrapped on the SMTPS port
const SMTP_HOST: &str = "smtp.gmail.com";

/// Most articles shown in the HTML table
const MAX_EMAIL_ARTICLES: usize = 20;

/// Rendered message parts
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub plain: String,
    pub html: String,
}

/// What happened to the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Skipped,
}

/// Delivery seam: one send operation, injected so the notifier is testable
/// without a live SMTP session.
pub trait MailTransport {
    fn send(&self, message: &Message) -> Result<()>;
}

/// Production transport: one authenticated SMTPS session per run
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn connect(sender: &str, password: &str) -> Result<Self> {
        let transport = SmtpTransport::relay(SMTP_HOST)?
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .build();
        Ok(Self { transport })
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: &Message) -> Result<()> {
        self.transport.send(message)?;
        Ok(())
    }
}

/// Renders and delivers the new-citations email
pub struct Notifier {
    config: Config,
}

impl Notifier {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Render subject, plain-text, and HTML parts. Pure; `checked_at` is a
    /// preformatted UTC stamp shown in the footer.
    pub fn render(&self, diff: &CitationDiff, checked_at: &str) -> RenderedEmail {
        let gained = diff.total_citations.gained;
        let plural = if gained == 1 { "" } else { "s" };

        let subject = format!(
            "🎉 +{} New Citation{} — Now at {} Total!",
            gained, plural, diff.total_citations.new
        );

        let plain = format!(
            "Congratulations, {name}!\n\n\
             Your Google Scholar profile has received +{gained} new citation(s).\n\
             Total citations: {total}\n\
             h-index: {h}\n\
             i10-index: {i10}\n\n\
             View your profile: {url}\n",
            name = self.config.author_name,
            gained = gained,
            total = diff.total_citations.new,
            h = diff.h_index.new,
            i10 = diff.i10_index.new,
            url = self.config.scholar_url(),
        );

        let html = self.render_html(diff, checked_at);

        RenderedEmail {
            subject,
            plain,
            html,
        }
    }

    fn render_html(&self, diff: &CitationDiff, checked_at: &str) -> String {
        let gained = diff.total_citations.gained;
        let plural = if gained == 1 { "" } else { "s" };

        // Sort by gained descending for display; the diff engine leaves its
        // list in fetch order.
        let mut sorted: Vec<&ArticleDelta> = diff.articles_with_new_citations.iter().collect();
        sorted.sort_by(|a, b| b.gained.cmp(&a.gained));

        let mut rows = String::new();
        for delta in sorted.iter().take(MAX_EMAIL_ARTICLES) {
            rows.push_str(&format!(
                r#"
        <tr>
            <td style="padding: 10px 15px; border-bottom: 1px solid #eee; font-size: 14px; color: #333;">
                {title}
                <span style="color: #888; font-size: 12px;">({year})</span>
            </td>
            <td style="padding: 10px 15px; border-bottom: 1px solid #eee; text-align: center; font-size: 14px; color: #333;">
                {old}
            </td>
            <td style="padding: 10px 15px; border-bottom: 1px solid #eee; text-align: center; font-size: 14px; color: #333;">
                {new}
            </td>
            <td style="padding: 10px 15px; border-bottom: 1px solid #eee; text-align: center; font-size: 14px;">
                <span style="background: #e8f5e9; color: #2e7d32; padding: 2px 8px; border-radius: 12px; font-weight: bold;">
                    +{gained}
                </span>
            </td>
        </tr>"#,
                title = delta.title,
                year = delta.year,
                old = delta.old_count,
                new = delta.new_count,
                gained = delta.gained,
            ));
        }

        let table = if rows.is_empty() {
            String::new()
        } else {
            format!(
                r#"
                <h3 style="color: #333; margin-top: 25px;">Papers with New Citations</h3>
                <table style="width: 100%; border-collapse: collapse; margin-top: 10px;">
                <thead><tr style="background: #f8f9ff;">
                <th style="padding: 10px 15px; text-align: left; font-size: 13px; color: #666; font-weight: 600;">Paper</th>
                <th style="padding: 10px 15px; text-align: center; font-size: 13px; color: #666; font-weight: 600;">Before</th>
                <th style="padding: 10px 15px; text-align: center; font-size: 13px; color: #666; font-weight: 600;">After</th>
                <th style="padding: 10px 15px; text-align: center; font-size: 13px; color: #666; font-weight: 600;">New</th>
                </tr></thead>
                <tbody>{rows}
                </tbody></table>"#,
                rows = rows
            )
        };

        format!(
            r#"
    <!DOCTYPE html>
    <html>
    <head><meta charset="utf-8"></head>
    <body style="margin: 0; padding: 0; background-color: #f5f5f5; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;">
        <div style="max-width: 600px; margin: 0 auto; padding: 20px;">

            <!-- Header -->
            <div style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); border-radius: 12px 12px 0 0; padding: 30px; text-align: center;">
                <h1 style="color: #fff; margin: 0; font-size: 24px;">🎉 New Citations Alert!</h1>
                <p style="color: rgba(255,255,255,0.9); margin: 10px 0 0 0; font-size: 16px;">
                    Congratulations, {name}!
                </p>
            </div>

            <!-- Main Content -->
            <div style="background: #fff; padding: 30px; border-radius: 0 0 12px 12px; box-shadow: 0 2px 10px rgba(0,0,0,0.1);">

                <p style="font-size: 16px; color: #333; line-height: 1.6;">
                    Great news! Your Google Scholar profile has received
                    <strong style="color: #667eea;">+{gained} new citation{plural}</strong>
                    since the last check.
                </p>

                <!-- Stats Cards -->
                <div style="display: flex; gap: 10px; margin: 20px 0;">
                    <div style="flex: 1; background: #f8f9ff; border-radius: 8px; padding: 15px; text-align: center;">
                        <div style="font-size: 28px; font-weight: bold; color: #667eea;">{total}</div>
                        <div style="font-size: 12px; color: #888; margin-top: 4px;">Total Citations</div>
                    </div>
                    <div style="flex: 1; background: #f8f9ff; border-radius: 8px; padding: 15px; text-align: center;">
                        <div style="font-size: 28px; font-weight: bold; color: #667eea;">{h}</div>
                        <div style="font-size: 12px; color: #888; margin-top: 4px;">h-index</div>
                    </div>
                    <div style="flex: 1; background: #f8f9ff; border-radius: 8px; padding: 15px; text-align: center;">
                        <div style="font-size: 28px; font-weight: bold; color: #667eea;">{i10}</div>
                        <div style="font-size: 12px; color: #888; margin-top: 4px;">i10-index</div>
                    </div>
                </div>

                <!-- Articles Table -->
                {table}

                <!-- Footer -->
                <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; text-align: center;">
                    <a href="{url}" style="display: inline-block; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #fff; text-decoration: none; padding: 12px 30px; border-radius: 25px; font-weight: bold; font-size: 14px;">
                        View Google Scholar Profile
                    </a>
                    <p style="font-size: 12px; color: #999; margin-top: 15px;">
                        This notification was sent by the Scholar Citation Tracker.<br>
                        Checked at {checked_at}
                    </p>
                </div>
            </div>
        </div>
    </body>
    </html>
    "#,
            name = self.config.author_name,
            gained = gained,
            plural = plural,
            total = diff.total_citations.new,
            h = diff.h_index.new,
            i10 = diff.i10_index.new,
            table = table,
            url = self.config.scholar_url(),
            checked_at = checked_at,
        )
    }

    /// Build the multipart/alternative message for a rendered email
    pub fn build_message(&self, sender: &str, rendered: &RenderedEmail) -> Result<Message> {
        let message = Message::builder()
            .from(sender.parse()?)
            .to(self.config.recipient.parse()?)
            .subject(rendered.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                rendered.plain.clone(),
                rendered.html.clone(),
            ))?;
        Ok(message)
    }

    /// Send the rendered message through the given transport
    pub fn deliver_with(
        &self,
        sender: &str,
        rendered: &RenderedEmail,
        transport: &dyn MailTransport,
    ) -> Result<()> {
        let message = self.build_message(sender, rendered)?;
        info!(recipient = %self.config.recipient, "Sending notification email");
        transport.send(&message)?;
        info!("Email sent");
        Ok(())
    }

    /// Render and deliver the notification, or skip when credentials are
    /// unset. A transport failure propagates and fails the run.
    pub fn notify(&self, diff: &CitationDiff, checked_at: &str) -> Result<DeliveryOutcome> {
        let (sender, password) = match (&self.config.sender_email, &self.config.sender_password) {
            (Some(sender), Some(password)) => (sender.clone(), password.clone()),
            _ => {
                warn!("Email credentials not configured. Skipping email notification.");
                info!("Set SENDER_EMAIL and SENDER_PASSWORD environment variables to enable.");
                return Ok(DeliveryOutcome::Skipped);
            }
        };

        let rendered = self.render(diff, checked_at);
        let mailer = SmtpMailer::connect(&sender, &password)?;
        self.deliver_with(&sender, &rendered, &mailer)?;
        Ok(DeliveryOutcome::Sent)
    }
}
