use std::sync::Arc;

use crate::referrals::{
    error::CheckoutValidationError,
    settings::ReferralSettings,
    tracking::already_tracking_referral,
    types::{CheckoutFields, CheckoutRequest},
};

/// Checks the affiliate selection on checkout submission, before payment
/// capture.
#[derive(Debug, Clone)]
pub struct SelectionValidator {
    settings: Arc<ReferralSettings>,
}

impl SelectionValidator {
    pub fn new(settings: Arc<ReferralSettings>) -> Self {
        Self { settings }
    }

    pub fn validate(
        &self,
        request: &CheckoutRequest,
        fields: &CheckoutFields,
    ) -> Result<(), CheckoutValidationError> {
        if already_tracking_referral(request) {
            return Ok(());
        }

        if fields.affiliate_user_id.is_none() && self.settings.require_affiliate {
            tracing::debug!(target: "referrals", "checkout_affiliate_rejected");
            return Err(CheckoutValidationError::invalid_affiliate(
                self.settings.require_affiliate_error.clone(),
            ));
        }

        Ok(())
    }
}
