//! Mass email batch: pick pending leads, send, record, report

use crate::clients::{ActivityEntry, ActivityReporter, Mailer, OutgoingEmail};
use crate::config::CampaignConfig;
use crate::error::Result;
use crate::services::leads::LeadSheet;
use crate::services::rotation::AccountRotator;
use crate::services::sent_log::SentLog;
use crate::services::template::{unsubscribe_link, EmailTemplate};
use campaign_types::{CampaignSummary, SenderAccount, VendorContact};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct BatchRunner {
    mailer: Arc<dyn Mailer>,
    reporter: Arc<ActivityReporter>,
    rotator: AccountRotator,
    template: EmailTemplate,
    subject: String,
    unsubscribe_url: String,
    limit: usize,
    delay: Duration,
    record_vendor_contacts: bool,
}

impl BatchRunner {
    pub fn new(
        config: &CampaignConfig,
        accounts: Vec<SenderAccount>,
        template: EmailTemplate,
        mailer: Arc<dyn Mailer>,
        reporter: Arc<ActivityReporter>,
    ) -> Result<Self> {
        Ok(Self {
            mailer,
            reporter,
            rotator: AccountRotator::new(accounts, config.batch.max_emails_per_account)?,
            template,
            subject: config.email.subject.clone(),
            unsubscribe_url: config.email.unsubscribe_url.clone(),
            limit: config.batch.limit,
            delay: Duration::from_secs(config.batch.delay_seconds),
            record_vendor_contacts: config.batch.record_vendor_contacts,
        })
    }

    /// Run one batch against the lead sheet at `leads_path`.
    ///
    /// A missing sheet is an error; everything after that (send failures,
    /// sheet rewrite, activity logging) is reported in the summary instead.
    pub async fn run(&mut self, leads_path: &Path, sent_log: &SentLog) -> Result<CampaignSummary> {
        log::info!("Reading from {}...", leads_path.display());
        let mut sheet = LeadSheet::load(leads_path)?;

        let selected = sheet.pending(self.limit);
        let mut summary = CampaignSummary {
            selected: selected.len(),
            ..Default::default()
        };

        if selected.is_empty() {
            log::info!("No emails to send.");
            return Ok(summary);
        }

        log::info!(
            "Found {} leads to email (Limit: {}). Starting batch...",
            selected.len(),
            self.limit
        );

        for row in selected {
            let lead = sheet.lead(row);
            if !lead.has_valid_email() {
                log::warn!("Skipping invalid email: {}", lead.email);
                summary.skipped += 1;
                continue;
            }

            let sender = self.rotator.next_account().clone();
            match self.send_one(&sender, &lead.email, &lead.full_name).await {
                Ok(()) => {
                    sheet.mark_sent(row);
                    if let Err(e) = sent_log.record(&sender.user, &lead.email, &lead.full_name) {
                        log::error!("Failed to append to sent log: {}", e);
                    }
                    log::info!("Sent to {} using {}", lead.email, sender.user);
                    summary.sent += 1;

                    if self.record_vendor_contacts {
                        let contact = VendorContact::from_lead(&lead, &sender.user);
                        self.reporter.save_vendor_contact(&contact).await;
                    }
                }
                Err(e) => {
                    log::error!("Failed to send to {}: {}", lead.email, e);
                    summary.failed += 1;
                }
            }

            if !self.delay.is_zero() {
                log::debug!("Waiting {} seconds before next email...", self.delay.as_secs());
                tokio::time::sleep(self.delay).await;
            }
        }

        if summary.sent > 0 {
            log::info!("Saving updates to {}...", leads_path.display());
            match sheet.save_atomic(leads_path) {
                Ok(()) => {
                    log::info!("Lead sheet updated successfully.");
                    summary.csv_saved = true;
                }
                Err(e) => log::error!("Error saving lead sheet: {}", e),
            }

            let notes = format!("Mass email campaign sent to {} leads from CSV", summary.sent);
            let logged = self
                .reporter
                .log_activity(ActivityEntry::new(activity_count(summary.sent), notes))
                .await;
            summary.activity_logged = Some(logged);
        }

        if summary.activity_logged == Some(false) {
            log::warn!("{}", summary);
        } else {
            log::info!("{}", summary);
        }
        Ok(summary)
    }

    async fn send_one(&self, sender: &SenderAccount, to: &str, name: &str) -> Result<()> {
        let link = unsubscribe_link(&self.unsubscribe_url, to)?;
        let email = OutgoingEmail {
            to: to.to_string(),
            subject: self.subject.clone(),
            html_body: self.template.render(name, &link),
        };
        self.mailer.send(sender, &email).await
    }
}

/// Activity counts saturate instead of wrapping
fn activity_count(sent: usize) -> u32 {
    u32::try_from(sent).unwrap_or(u32::MAX)
}
