use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::referrals::{
    AffiliateSelectField, AssetRef, CheckoutFormExtension, CheckoutReferrals, CheckoutRequest,
    CheckoutValidationError, CheckoutValidator, InMemoryAffiliateProgram, InMemoryStorefront,
    InMemoryUserDirectory, PaymentId, ProgramSnapshot, PurchaseCompletionListener, Referral,
    ReferralOutcome, ReferralSettings, StorefrontPort, StorefrontSnapshot, UserProfile,
};

/// Host state plus a list of checkout attempts to replay against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub program: ProgramSnapshot,
    #[serde(default)]
    pub storefront: StorefrontSnapshot,
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub attempts: Vec<CheckoutAttempt>,
}

/// One checkout submission. The submitted form is the `post_data` of the
/// session the request names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutAttempt {
    #[serde(default)]
    pub request: CheckoutRequest,
    pub payment_id: PaymentId,
    #[serde(default)]
    pub is_checkout: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub payment_id: PaymentId,
    pub select_field: Option<AffiliateSelectField>,
    pub assets: Vec<AssetRef>,
    pub validation: Result<(), CheckoutValidationError>,
    /// Absent when validation blocked the checkout.
    pub outcome: Option<ReferralOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub attempts: Vec<AttemptReport>,
    pub referrals: Vec<Referral>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    pub async fn run(self, settings: ReferralSettings) -> Result<ScenarioReport> {
        let program = Arc::new(InMemoryAffiliateProgram::from_snapshot(self.program));
        let storefront = Arc::new(InMemoryStorefront::from_snapshot(self.storefront));
        let users = Arc::new(InMemoryUserDirectory::new(self.users));
        let referrals =
            CheckoutReferrals::new(settings, program.clone(), storefront.clone(), users);

        let mut reports = Vec::with_capacity(self.attempts.len());
        for attempt in self.attempts {
            let select_field = referrals
                .affiliate_select_field(&attempt.request)
                .await
                .with_context(|| {
                    format!("failed to build select field for payment {}", attempt.payment_id)
                })?;
            let assets = referrals.checkout_assets(&attempt.request, attempt.is_checkout, false);
            let form = storefront
                .purchase_session(&attempt.request)
                .await
                .with_context(|| {
                    format!("failed to load session for payment {}", attempt.payment_id)
                })?
                .map(|session| session.post_data)
                .unwrap_or_default();
            let validation = referrals.validate_checkout(&attempt.request, &form);
            let outcome = match validation {
                Ok(()) => Some(
                    referrals
                        .on_payment_complete(&attempt.request, attempt.payment_id)
                        .await
                        .with_context(|| {
                            format!("failed to complete payment {}", attempt.payment_id)
                        })?,
                ),
                Err(_) => None,
            };
            reports.push(AttemptReport {
                payment_id: attempt.payment_id,
                select_field,
                assets,
                validation,
                outcome,
            });
        }

        Ok(ScenarioReport {
            attempts: reports,
            referrals: program.referrals()?,
        })
    }
}
