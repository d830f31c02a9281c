//! Round-robin over sender accounts with a per-account quota

use crate::error::{CampaignError, Result};
use campaign_types::SenderAccount;

#[derive(Debug)]
pub struct AccountRotator {
    accounts: Vec<SenderAccount>,
    max_per_account: u32,
    current: usize,
    used: u32,
}

impl AccountRotator {
    pub fn new(accounts: Vec<SenderAccount>, max_per_account: u32) -> Result<Self> {
        if accounts.is_empty() {
            return Err(CampaignError::Config(
                "At least one sender account is required".to_string(),
            ));
        }
        if max_per_account == 0 {
            return Err(CampaignError::Config(
                "MAX_EMAILS_PER_ACCOUNT must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            accounts,
            max_per_account,
            current: 0,
            used: 0,
        })
    }

    /// Account for the next send attempt; every call counts toward the quota
    pub fn next_account(&mut self) -> &SenderAccount {
        if self.used >= self.max_per_account {
            self.current = (self.current + 1) % self.accounts.len();
            self.used = 0;
            log::info!(
                "Switching to email account: {}",
                self.accounts[self.current].user
            );
        }

        self.used += 1;
        &self.accounts[self.current]
    }
}
