use checkout_referrals::referrals::{
    CheckoutFormExtension, CheckoutValidator, PurchaseCompletionListener, REFERRAL_CONTEXT,
    ReferralOutcome, ReferralSettings, ReferralStatus, SkipReason,
};
use rust_decimal::Decimal;

use crate::support::{BUYER_EMAIL, form, harness, required_selection};

#[tokio::test]
async fn given_required_selection_and_valid_affiliate_when_checkout_completes_then_one_referral_and_note() {
    let harness = harness(required_selection());
    let request = harness.checkout(1001, Some("42"), Decimal::new(10_000, 2), BUYER_EMAIL);

    let field = harness
        .referrals
        .affiliate_select_field(&request)
        .await
        .expect("select field should build");
    assert!(field.is_some());
    harness
        .referrals
        .validate_checkout(&request, &form(Some("42")))
        .expect("valid selection should pass");

    let outcome = harness
        .referrals
        .on_payment_complete(&request, 1001)
        .await
        .expect("completion should succeed");

    let referrals = harness.recorded_referrals();
    assert_eq!(referrals.len(), 1);
    let referral = &referrals[0];
    assert_eq!(referral.amount, Decimal::new(1000, 2));
    assert_eq!(referral.status, ReferralStatus::Unpaid);
    assert_eq!(referral.reference, "1001");
    assert_eq!(referral.context, REFERRAL_CONTEXT);
    assert_eq!(referral.user_id, 42);

    let notes = harness.notes(1001);
    assert_eq!(notes.len(), 1);
    let note = &notes[0];
    assert!(note.contains(&format!("#{}", referral.referral_id)));
    assert!(note.contains("$10.00"));
    assert!(note.contains("Ann Lee"));
    assert_eq!(
        outcome.recorded().map(|recorded| recorded.note.as_str()),
        Some(note.as_str())
    );
}

#[tokio::test]
async fn given_optional_selection_and_empty_affiliate_when_checkout_completes_then_no_referral() {
    let harness = harness(ReferralSettings::default());
    let request = harness.checkout(1002, Some(""), Decimal::new(2500, 2), BUYER_EMAIL);

    harness
        .referrals
        .validate_checkout(&request, &form(Some("")))
        .expect("optional selection should pass");

    let outcome = harness
        .referrals
        .on_payment_complete(&request, 1002)
        .await
        .expect("completion should not fail");

    assert_eq!(outcome, ReferralOutcome::skipped(SkipReason::NoAffiliateSelected));
    assert!(harness.recorded_referrals().is_empty());
    assert!(harness.notes(1002).is_empty());
}
