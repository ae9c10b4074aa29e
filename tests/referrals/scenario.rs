use std::path::Path;

use checkout_referrals::{
    referrals::{ReferralOutcome, ReferralSettings, SkipReason},
    scenario::Scenario,
};

#[tokio::test]
async fn given_demo_scenario_when_replayed_then_only_qualifying_attempt_records_referral() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/checkout-scenario.json");
    let scenario = Scenario::load(&path).expect("demo scenario should parse");

    let report = scenario
        .run(ReferralSettings::default())
        .await
        .expect("scenario should replay");

    assert_eq!(report.attempts.len(), 4);
    assert_eq!(report.referrals.len(), 1);
    assert_eq!(report.referrals[0].reference, "1001");

    let outcomes: Vec<Option<&ReferralOutcome>> = report
        .attempts
        .iter()
        .map(|attempt| attempt.outcome.as_ref())
        .collect();
    assert!(outcomes[0].and_then(|outcome| outcome.recorded()).is_some());
    assert_eq!(
        outcomes[1],
        Some(&ReferralOutcome::skipped(SkipReason::NoAffiliateSelected))
    );
    assert_eq!(
        outcomes[2],
        Some(&ReferralOutcome::skipped(SkipReason::SelfReferral))
    );
    assert_eq!(
        outcomes[3],
        Some(&ReferralOutcome::skipped(SkipReason::AlreadyTracking))
    );
    assert!(report.attempts[3].select_field.is_none());
}

const REQUIRED_SELECTION_SCENARIO: &str = r#"{
  "program": {
    "affiliates": [
      { "affiliate_id": 1, "user_id": 42, "email": "ann@example.com", "status": "active", "name": "Ann Lee" }
    ]
  },
  "users": [
    { "user_id": 42, "user_nicename": "ann", "display_name": "Ann Lee", "nickname": "annie" }
  ],
  "storefront": {
    "downloads": { "7": "Icon Pack" },
    "sessions": {
      "sess-empty": { "price": "40.00", "post_data": {} },
      "sess-ann": { "price": "40.00", "post_data": { "edd_affiliate": "42" } }
    },
    "payments": {
      "2001": { "purchaser_email": "buyer@example.com", "downloads": [7] },
      "2002": { "purchaser_email": "buyer@example.com", "downloads": [7] }
    }
  },
  "attempts": [
    { "request": { "session_id": "sess-empty" }, "payment_id": 2001, "is_checkout": true },
    { "request": { "session_id": "sess-ann" }, "payment_id": 2002, "is_checkout": true }
  ]
}"#;

#[tokio::test]
async fn given_required_selection_when_replayed_then_validation_reads_session_post_data() {
    let scenario: Scenario =
        serde_json::from_str(REQUIRED_SELECTION_SCENARIO).expect("scenario should parse");

    let report = scenario
        .run(ReferralSettings {
            require_affiliate: true,
            ..ReferralSettings::default()
        })
        .await
        .expect("scenario should replay");

    let rejected = &report.attempts[0];
    let err = rejected
        .validation
        .as_ref()
        .expect_err("empty session selection must fail validation");
    assert_eq!(err.code, "invalid_affiliate");
    assert!(rejected.outcome.is_none());

    let accepted = &report.attempts[1];
    assert!(accepted.validation.is_ok());
    assert!(
        accepted
            .outcome
            .as_ref()
            .and_then(|outcome| outcome.recorded())
            .is_some()
    );
    assert_eq!(report.referrals.len(), 1);
    assert_eq!(report.referrals[0].reference, "2002");
}
