use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::referrals::{
    error::ReferralError,
    types::{
        Affiliate, AffiliateId, CheckoutRequest, DownloadId, NewReferral, PaymentId,
        PurchaseSession, Referral, ReferralId, UserId, UserProfile,
    },
};

/// Affiliate program host: affiliate records, commission rules and the
/// referral store.
#[async_trait]
pub trait AffiliateProgramPort: Send + Sync {
    /// Active affiliates in the order the program lists them.
    async fn active_affiliates(&self) -> Result<Vec<Affiliate>, ReferralError>;

    async fn affiliate_by_user_id(&self, user_id: UserId)
    -> Result<Option<Affiliate>, ReferralError>;

    async fn affiliate_email(&self, affiliate_id: AffiliateId)
    -> Result<Option<String>, ReferralError>;

    async fn affiliate_name(&self, affiliate_id: AffiliateId) -> Result<String, ReferralError>;

    async fn referral_amount(
        &self,
        price: Decimal,
        affiliate_id: AffiliateId,
    ) -> Result<Decimal, ReferralError>;

    async fn add_referral(&self, referral: NewReferral) -> Result<ReferralId, ReferralError>;

    async fn referral_by_reference(
        &self,
        reference: &str,
        context: &str,
    ) -> Result<Option<Referral>, ReferralError>;

    /// Amount rendered with the program's currency symbol and precision.
    fn format_amount(&self, amount: Decimal) -> String;
}

/// Storefront host: checkout sessions, payments and the download catalog.
#[async_trait]
pub trait StorefrontPort: Send + Sync {
    async fn purchase_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<Option<PurchaseSession>, ReferralError>;

    /// Downloads bought in a payment, in cart order.
    async fn purchased_downloads(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<DownloadId>, ReferralError>;

    async fn download_title(&self, download_id: DownloadId) -> Result<String, ReferralError>;

    async fn purchaser_email(&self, payment_id: PaymentId) -> Result<String, ReferralError>;

    async fn insert_payment_note(
        &self,
        payment_id: PaymentId,
        note: String,
    ) -> Result<(), ReferralError>;
}

#[async_trait]
pub trait UserDirectoryPort: Send + Sync {
    async fn user_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, ReferralError>;
}
