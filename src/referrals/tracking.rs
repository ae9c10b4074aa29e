use crate::referrals::types::{CheckoutRequest, TRACKING_COOKIE};

/// True when the shopper already carries a non-empty affiliate tracking
/// cookie. Manual selection is never consulted in that case.
pub fn already_tracking_referral(request: &CheckoutRequest) -> bool {
    request
        .cookie(TRACKING_COOKIE)
        .is_some_and(|value| !value.is_empty())
}
