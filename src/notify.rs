//! Notification - One summary email per run through the Resend API.
//!
//! Fire-and-forget: the orchestrator attempts a send only when email is
//! configured, and a failed send is logged without failing the run.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EmailConfig;
use crate::errors::{Error, Result};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Transactional-email sender.
#[derive(Clone, Debug)]
pub struct Notifier {
    http: Client,
    config: EmailConfig,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

impl Notifier {
    /// Creates a notifier over the given email settings.
    #[must_use]
    pub fn new(config: EmailConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Sends one HTML email and returns the provider message id.
    pub async fn send(&self, subject: &str, html: &str) -> Result<String> {
        let request = SendRequest {
            from: &self.config.from,
            to: [&self.config.to],
            subject,
            html,
        };

        let response = self
            .http
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notify(format!(
                "provider rejected the message: {status}: {body}"
            )));
        }

        let accepted: SendResponse = response.json().await?;
        info!(message_id = %accepted.id, "summary notification sent");
        Ok(accepted.id)
    }
}

/// The per-run summary, rendered into the notification subject and body.
#[derive(Clone, Debug, Default)]
pub struct SummaryEmail {
    /// Routine name, e.g. "Consistency sweep"
    pub title: String,
    /// Run timestamp shared with the artifact names
    pub timestamp: String,
    /// Label/value pairs enumerating the run counts
    pub metrics: Vec<(String, String)>,
    /// Artifact file names generated by the run
    pub files: Vec<String>,
}

impl SummaryEmail {
    /// Starts a summary for one routine run.
    #[must_use]
    pub fn new(title: &str, timestamp: &str) -> Self {
        Self {
            title: title.to_owned(),
            timestamp: timestamp.to_owned(),
            ..Self::default()
        }
    }

    /// Adds one count line.
    pub fn metric(&mut self, label: &str, value: impl ToString) -> &mut Self {
        self.metrics.push((label.to_owned(), value.to_string()));
        self
    }

    /// Records a generated artifact file.
    pub fn file(&mut self, name: String) -> &mut Self {
        self.files.push(name);
        self
    }

    /// The subject line: routine plus run timestamp.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("{} - run summary - {}", self.title, self.timestamp)
    }

    /// Renders the compact HTML body.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut body = String::new();
        body.push_str("<!DOCTYPE html><html><head><meta charset=\"UTF-8\"></head>");
        body.push_str("<body style=\"font-family: Arial, sans-serif; margin: 20px;\">");
        body.push_str(&format!("<h2>{}</h2>", self.title));
        body.push_str(&format!("<p>Run {}</p>", self.timestamp));

        body.push_str("<h3>Summary</h3><ul>");
        for (label, value) in &self.metrics {
            body.push_str(&format!("<li><b>{label}:</b> {value}</li>"));
        }
        body.push_str("</ul>");

        if !self.files.is_empty() {
            body.push_str("<h3>Generated files</h3><ul>");
            for file in &self.files {
                body.push_str(&format!("<li>{file}</li>"));
            }
            body.push_str("</ul>");
        }

        body.push_str("<p style=\"font-size: 12px; color: #6c757d;\">");
        body.push_str("Automated message from the loanwarden reconciliation run.");
        body.push_str("</p></body></html>");
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SummaryEmail {
        let mut summary = SummaryEmail::new("Consistency sweep", "20250806_120000");
        summary
            .metric("Loans found", 12)
            .metric("Users updated", 3)
            .file("loan_documents_20250806_120000.json".to_owned());
        summary
    }

    #[test]
    fn subject_names_routine_and_timestamp() {
        assert_eq!(
            sample().subject(),
            "Consistency sweep - run summary - 20250806_120000"
        );
    }

    #[test]
    fn html_lists_metrics_and_files() {
        let html = sample().to_html();
        assert!(html.contains("<li><b>Loans found:</b> 12</li>"));
        assert!(html.contains("loan_documents_20250806_120000.json"));
    }

    #[test]
    fn html_omits_file_section_when_empty() {
        let summary = SummaryEmail::new("Audit", "ts");
        assert!(!summary.to_html().contains("Generated files"));
    }
}
