use std::sync::Arc;

use crate::referrals::{
    error::{ReferralError, missing_record},
    ports::{AffiliateProgramPort, StorefrontPort},
    tracking::already_tracking_referral,
    types::{
        CheckoutRequest, NewReferral, PaymentId, REFERRAL_CONTEXT, RecordedReferral,
        ReferralOutcome, ReferralStatus, SkipReason,
    },
};

/// Records a referral for a completed payment when the shopper picked an
/// affiliate at checkout.
pub struct ReferralCreator {
    affiliates: Arc<dyn AffiliateProgramPort>,
    storefront: Arc<dyn StorefrontPort>,
}

impl ReferralCreator {
    pub fn new(
        affiliates: Arc<dyn AffiliateProgramPort>,
        storefront: Arc<dyn StorefrontPort>,
    ) -> Self {
        Self {
            affiliates,
            storefront,
        }
    }

    #[tracing::instrument(
        name = "referral_on_payment_complete",
        target = "referrals",
        skip(self, request)
    )]
    pub async fn on_payment_complete(
        &self,
        request: &CheckoutRequest,
        payment_id: PaymentId,
    ) -> Result<ReferralOutcome, ReferralError> {
        let outcome = self.record_referral(request, payment_id).await?;
        match &outcome {
            ReferralOutcome::Recorded(recorded) => tracing::info!(
                target: "referrals",
                payment_id = payment_id,
                referral_id = recorded.referral.referral_id,
                affiliate_id = recorded.referral.affiliate_id,
                amount = %recorded.referral.amount,
                "referral_recorded"
            ),
            ReferralOutcome::Skipped { reason } => tracing::debug!(
                target: "referrals",
                payment_id = payment_id,
                reason = reason.as_str(),
                "referral_skipped"
            ),
        }
        Ok(outcome)
    }

    async fn record_referral(
        &self,
        request: &CheckoutRequest,
        payment_id: PaymentId,
    ) -> Result<ReferralOutcome, ReferralError> {
        if already_tracking_referral(request) {
            return Ok(ReferralOutcome::skipped(SkipReason::AlreadyTracking));
        }

        let Some(session) = self.storefront.purchase_session(request).await? else {
            return Ok(ReferralOutcome::skipped(SkipReason::NoPurchaseSession));
        };
        let Some(user_id) = session.checkout_fields().affiliate_user_id else {
            return Ok(ReferralOutcome::skipped(SkipReason::NoAffiliateSelected));
        };
        let Some(affiliate) = self.affiliates.affiliate_by_user_id(user_id).await? else {
            return Ok(ReferralOutcome::skipped(SkipReason::AffiliateNotFound));
        };

        let amount = self
            .affiliates
            .referral_amount(session.price, affiliate.affiliate_id)
            .await?;
        let description = self.describe_purchase(payment_id).await?;

        let purchaser_email = self.storefront.purchaser_email(payment_id).await?;
        let affiliate_email = self.affiliates.affiliate_email(affiliate.affiliate_id).await?;
        if affiliate_email.is_some_and(|email| same_email(&email, &purchaser_email)) {
            return Ok(ReferralOutcome::skipped(SkipReason::SelfReferral));
        }

        let reference = payment_id.to_string();
        self.affiliates
            .add_referral(NewReferral {
                user_id,
                amount,
                reference: reference.clone(),
                description,
                status: ReferralStatus::Unpaid,
                context: REFERRAL_CONTEXT.to_string(),
            })
            .await?;

        let referral = self
            .affiliates
            .referral_by_reference(&reference, REFERRAL_CONTEXT)
            .await?
            .ok_or_else(|| {
                missing_record(format!(
                    "referral for payment {payment_id} not found after insert"
                ))
            })?;
        let formatted_amount = self.affiliates.format_amount(referral.amount);
        let name = self.affiliates.affiliate_name(affiliate.affiliate_id).await?;
        let note = format!(
            "Referral #{} for {} recorded for {}",
            referral.referral_id, formatted_amount, name
        );
        self.storefront
            .insert_payment_note(payment_id, note.clone())
            .await?;

        Ok(ReferralOutcome::Recorded(RecordedReferral { referral, note }))
    }

    async fn describe_purchase(&self, payment_id: PaymentId) -> Result<String, ReferralError> {
        let downloads = self.storefront.purchased_downloads(payment_id).await?;
        let mut titles = Vec::with_capacity(downloads.len());
        for download_id in downloads {
            titles.push(self.storefront.download_title(download_id).await?);
        }
        Ok(titles.join(", "))
    }
}

fn same_email(lhs: &str, rhs: &str) -> bool {
    lhs.trim().eq_ignore_ascii_case(rhs.trim())
}
