use std::sync::Arc;

use async_trait::async_trait;

use crate::referrals::{
    creator::ReferralCreator,
    error::{CheckoutValidationError, ReferralError},
    ports::{AffiliateProgramPort, StorefrontPort, UserDirectoryPort},
    selection::{AffiliateListProvider, AffiliateSelectField, AssetRef, checkout_assets},
    settings::ReferralSettings,
    types::{CheckoutFields, CheckoutRequest, FormFields, PaymentId, ReferralOutcome},
    validator::SelectionValidator,
};

/// Rendering point right before the checkout submit button.
#[async_trait]
pub trait CheckoutFormExtension: Send + Sync {
    async fn affiliate_select_field(
        &self,
        request: &CheckoutRequest,
    ) -> Result<Option<AffiliateSelectField>, ReferralError>;

    fn checkout_assets(
        &self,
        request: &CheckoutRequest,
        is_checkout: bool,
        script_debug: bool,
    ) -> Vec<AssetRef>;
}

/// Called with the raw submitted form before payment capture. An error
/// blocks the checkout and is shown to the shopper.
pub trait CheckoutValidator: Send + Sync {
    fn validate_checkout(
        &self,
        request: &CheckoutRequest,
        form: &FormFields,
    ) -> Result<(), CheckoutValidationError>;
}

/// Called once the storefront marks a payment complete. The storefront is
/// expected to fire this at most once per payment; a repeated call records a
/// second referral with the same reference.
#[async_trait]
pub trait PurchaseCompletionListener: Send + Sync {
    async fn on_payment_complete(
        &self,
        request: &CheckoutRequest,
        payment_id: PaymentId,
    ) -> Result<ReferralOutcome, ReferralError>;
}

pub struct CheckoutReferrals {
    list_provider: AffiliateListProvider,
    validator: SelectionValidator,
    creator: ReferralCreator,
}

impl CheckoutReferrals {
    pub fn new(
        settings: ReferralSettings,
        affiliates: Arc<dyn AffiliateProgramPort>,
        storefront: Arc<dyn StorefrontPort>,
        users: Arc<dyn UserDirectoryPort>,
    ) -> Self {
        let settings = Arc::new(settings);
        Self {
            list_provider: AffiliateListProvider::new(
                Arc::clone(&settings),
                Arc::clone(&affiliates),
                users,
            ),
            validator: SelectionValidator::new(settings),
            creator: ReferralCreator::new(affiliates, storefront),
        }
    }
}

#[async_trait]
impl CheckoutFormExtension for CheckoutReferrals {
    async fn affiliate_select_field(
        &self,
        request: &CheckoutRequest,
    ) -> Result<Option<AffiliateSelectField>, ReferralError> {
        self.list_provider.select_field(request).await
    }

    fn checkout_assets(
        &self,
        request: &CheckoutRequest,
        is_checkout: bool,
        script_debug: bool,
    ) -> Vec<AssetRef> {
        checkout_assets(request, is_checkout, script_debug)
    }
}

impl CheckoutValidator for CheckoutReferrals {
    fn validate_checkout(
        &self,
        request: &CheckoutRequest,
        form: &FormFields,
    ) -> Result<(), CheckoutValidationError> {
        self.validator.validate(request, &CheckoutFields::from_form(form))
    }
}

#[async_trait]
impl PurchaseCompletionListener for CheckoutReferrals {
    async fn on_payment_complete(
        &self,
        request: &CheckoutRequest,
        payment_id: PaymentId,
    ) -> Result<ReferralOutcome, ReferralError> {
        self.creator.on_payment_complete(request, payment_id).await
    }
}
