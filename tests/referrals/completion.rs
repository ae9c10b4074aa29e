use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use checkout_referrals::referrals::{
    Affiliate, AffiliateId, AffiliateProgramPort, CheckoutReferrals, CheckoutRequest,
    InMemoryAffiliateProgram, InMemoryUserDirectory, NewReferral, PurchaseCompletionListener,
    Referral, ReferralError, ReferralErrorKind, ReferralId, ReferralOutcome, ReferralSettings,
    SkipReason, TRACKING_COOKIE, UserId,
};
use rust_decimal::Decimal;

use crate::support::{BUYER_EMAIL, harness};

fn hundred() -> Decimal {
    Decimal::new(10_000, 2)
}

#[tokio::test]
async fn given_tracking_cookie_when_payment_completes_then_no_referral_is_created() {
    let harness = harness(ReferralSettings::default());
    let request = harness
        .checkout(501, Some("42"), hundred(), BUYER_EMAIL)
        .with_cookie(TRACKING_COOKIE, "17");

    let outcome = harness
        .referrals
        .on_payment_complete(&request, 501)
        .await
        .expect("completion should not fail");

    assert_eq!(outcome, ReferralOutcome::skipped(SkipReason::AlreadyTracking));
    assert!(harness.recorded_referrals().is_empty());
    assert!(harness.notes(501).is_empty());
}

#[tokio::test]
async fn given_missing_purchase_session_when_payment_completes_then_skipped() {
    let harness = harness(ReferralSettings::default());
    harness.checkout(502, Some("42"), hundred(), BUYER_EMAIL);

    let outcome = harness
        .referrals
        .on_payment_complete(&CheckoutRequest::default(), 502)
        .await
        .expect("completion should not fail");

    assert_eq!(outcome, ReferralOutcome::skipped(SkipReason::NoPurchaseSession));
    assert!(harness.recorded_referrals().is_empty());
}

#[tokio::test]
async fn given_non_numeric_selection_when_payment_completes_then_skipped() {
    let harness = harness(ReferralSettings::default());

    for (payment_id, submitted) in [(503, None), (504, Some("")), (505, Some("ann"))] {
        let request = harness.checkout(payment_id, submitted, hundred(), BUYER_EMAIL);
        let outcome = harness
            .referrals
            .on_payment_complete(&request, payment_id)
            .await
            .expect("completion should not fail");
        assert_eq!(
            outcome,
            ReferralOutcome::skipped(SkipReason::NoAffiliateSelected),
            "submitted {submitted:?}"
        );
    }
    assert!(harness.recorded_referrals().is_empty());
}

#[tokio::test]
async fn given_unknown_affiliate_user_when_payment_completes_then_silently_skipped() {
    let harness = harness(ReferralSettings::default());
    let request = harness.checkout(506, Some("999"), hundred(), BUYER_EMAIL);

    let outcome = harness
        .referrals
        .on_payment_complete(&request, 506)
        .await
        .expect("unknown affiliate should not be an error");

    assert_eq!(outcome, ReferralOutcome::skipped(SkipReason::AffiliateNotFound));
    assert!(harness.recorded_referrals().is_empty());
}

#[tokio::test]
async fn given_purchaser_is_the_affiliate_when_payment_completes_then_no_self_referral() {
    let harness = harness(ReferralSettings::default());
    let request = harness.checkout(507, Some("42"), hundred(), "ANN@example.com");

    let outcome = harness
        .referrals
        .on_payment_complete(&request, 507)
        .await
        .expect("completion should not fail");

    assert_eq!(outcome, ReferralOutcome::skipped(SkipReason::SelfReferral));
    assert!(harness.recorded_referrals().is_empty());
    assert!(harness.notes(507).is_empty());
}

#[tokio::test]
async fn given_valid_selection_when_payment_completes_then_description_lists_titles_in_order() {
    let harness = harness(ReferralSettings::default());
    let request = harness.checkout(508, Some(" 44 "), Decimal::new(60, 0), BUYER_EMAIL);

    let outcome = harness
        .referrals
        .on_payment_complete(&request, 508)
        .await
        .expect("completion should succeed");

    let recorded = outcome.recorded().expect("referral should be recorded");
    assert_eq!(recorded.referral.description, "Icon Pack, Font Bundle");
    assert_eq!(recorded.referral.affiliate_id, 3);
    assert_eq!(recorded.referral.user_id, 44);
    assert_eq!(recorded.referral.amount, Decimal::new(6, 0));
    assert_eq!(recorded.note, "Referral #1 for $6.00 recorded for Cy Ode");
}

#[tokio::test]
async fn given_duplicate_completion_event_when_payment_completes_twice_then_two_referrals_share_reference() {
    let harness = harness(ReferralSettings::default());
    let request = harness.checkout(509, Some("42"), hundred(), BUYER_EMAIL);

    for _ in 0..2 {
        harness
            .referrals
            .on_payment_complete(&request, 509)
            .await
            .expect("completion should succeed");
    }

    let referrals = harness.recorded_referrals();
    assert_eq!(referrals.len(), 2);
    assert!(referrals.iter().all(|referral| referral.reference == "509"));
    assert_eq!(harness.notes(509).len(), 2);
}

#[tokio::test]
async fn given_payment_store_failure_when_writing_note_then_error_propagates() {
    let harness = harness(ReferralSettings::default());
    let request = harness.checkout(510, Some("42"), hundred(), BUYER_EMAIL);
    harness
        .storefront
        .set_notes_unavailable(true)
        .expect("availability flag should be set");

    let err = harness
        .referrals
        .on_payment_complete(&request, 510)
        .await
        .expect_err("note failure must propagate");

    assert_eq!(err.kind, ReferralErrorKind::HostUnavailable);
    assert_eq!(harness.recorded_referrals().len(), 1);
}

/// Stores referrals in the wrapped program but never finds them again.
struct UnfetchableReferrals {
    inner: Arc<InMemoryAffiliateProgram>,
    added: AtomicUsize,
}

#[async_trait]
impl AffiliateProgramPort for UnfetchableReferrals {
    async fn active_affiliates(&self) -> Result<Vec<Affiliate>, ReferralError> {
        self.inner.active_affiliates().await
    }

    async fn affiliate_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<Affiliate>, ReferralError> {
        self.inner.affiliate_by_user_id(user_id).await
    }

    async fn affiliate_email(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Option<String>, ReferralError> {
        self.inner.affiliate_email(affiliate_id).await
    }

    async fn affiliate_name(&self, affiliate_id: AffiliateId) -> Result<String, ReferralError> {
        self.inner.affiliate_name(affiliate_id).await
    }

    async fn referral_amount(
        &self,
        price: Decimal,
        affiliate_id: AffiliateId,
    ) -> Result<Decimal, ReferralError> {
        self.inner.referral_amount(price, affiliate_id).await
    }

    async fn add_referral(&self, referral: NewReferral) -> Result<ReferralId, ReferralError> {
        self.added.fetch_add(1, Ordering::SeqCst);
        self.inner.add_referral(referral).await
    }

    async fn referral_by_reference(
        &self,
        _reference: &str,
        _context: &str,
    ) -> Result<Option<Referral>, ReferralError> {
        Ok(None)
    }

    fn format_amount(&self, amount: Decimal) -> String {
        self.inner.format_amount(amount)
    }
}

#[tokio::test]
async fn given_referral_missing_after_insert_when_payment_completes_then_missing_record_error() {
    let harness = harness(ReferralSettings::default());
    let request = harness.checkout(511, Some("42"), hundred(), BUYER_EMAIL);
    let program = Arc::new(UnfetchableReferrals {
        inner: harness.program.clone(),
        added: AtomicUsize::new(0),
    });
    let referrals = CheckoutReferrals::new(
        ReferralSettings::default(),
        program.clone(),
        harness.storefront.clone(),
        Arc::new(InMemoryUserDirectory::default()),
    );

    let err = referrals
        .on_payment_complete(&request, 511)
        .await
        .expect_err("missing referral must be an error");

    assert_eq!(err.kind, ReferralErrorKind::MissingRecord);
    assert_eq!(program.added.load(Ordering::SeqCst), 1);
    assert_eq!(harness.recorded_referrals().len(), 1);
    assert!(harness.notes(511).is_empty());
}
