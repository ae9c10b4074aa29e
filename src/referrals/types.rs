use std::{collections::BTreeMap, fmt};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type AffiliateId = u64;
pub type PaymentId = u64;
pub type ReferralId = u64;
pub type DownloadId = u64;

/// Cookie set by the affiliate system when a shopper arrives through an
/// affiliate link.
pub const TRACKING_COOKIE: &str = "affwp_ref";

/// Checkout form field carrying the selected affiliate's user id.
pub const AFFILIATE_FIELD: &str = "edd_affiliate";

/// Channel tag stamped on every referral this crate records.
pub const REFERRAL_CONTEXT: &str = "edd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliateStatus {
    Active,
    Inactive,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliate {
    pub affiliate_id: AffiliateId,
    pub user_id: UserId,
    pub email: String,
    pub status: AffiliateStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub user_nicename: String,
    pub display_name: String,
    #[serde(default)]
    pub nickname: String,
}

/// Which profile field labels an affiliate in the checkout select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffiliateDisplay {
    #[default]
    UserNicename,
    DisplayName,
    Nickname,
}

impl AffiliateDisplay {
    pub const ALL: [AffiliateDisplay; 3] = [
        AffiliateDisplay::UserNicename,
        AffiliateDisplay::DisplayName,
        AffiliateDisplay::Nickname,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AffiliateDisplay::UserNicename => "user_nicename",
            AffiliateDisplay::DisplayName => "display_name",
            AffiliateDisplay::Nickname => "nickname",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AffiliateDisplay::UserNicename => "User Nicename",
            AffiliateDisplay::DisplayName => "Display Name",
            AffiliateDisplay::Nickname => "Nickname",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|display| display.key() == key)
    }

    pub fn pick(self, profile: &UserProfile) -> &str {
        match self {
            AffiliateDisplay::UserNicename => &profile.user_nicename,
            AffiliateDisplay::DisplayName => &profile.display_name,
            AffiliateDisplay::Nickname => &profile.nickname,
        }
    }
}

impl fmt::Display for AffiliateDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-request state the host hands to every hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    /// Host key for the shopper's purchase session.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl CheckoutRequest {
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

pub type FormFields = BTreeMap<String, String>;

/// Checkout fields this crate reads, parsed once at the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFields {
    pub affiliate_user_id: Option<UserId>,
}

impl CheckoutFields {
    pub fn from_form(fields: &FormFields) -> Self {
        Self {
            affiliate_user_id: fields
                .get(AFFILIATE_FIELD)
                .and_then(|raw| parse_user_id(raw)),
        }
    }
}

/// A user id is a non-empty run of ASCII digits (surrounding whitespace
/// ignored) that fits `u64`. Signs, decimals and exponents are rejected.
pub fn parse_user_id(raw: &str) -> Option<UserId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseSession {
    pub price: Decimal,
    #[serde(default)]
    pub post_data: FormFields,
}

impl PurchaseSession {
    pub fn checkout_fields(&self) -> CheckoutFields {
        CheckoutFields::from_form(&self.post_data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Unpaid,
    Paid,
    Pending,
    Rejected,
}

/// Referral as submitted to the affiliate system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReferral {
    pub user_id: UserId,
    pub amount: Decimal,
    pub reference: String,
    pub description: String,
    pub status: ReferralStatus,
    pub context: String,
}

/// Referral as stored by the affiliate system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub referral_id: ReferralId,
    pub affiliate_id: AffiliateId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub reference: String,
    pub description: String,
    pub status: ReferralStatus,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyTracking,
    NoPurchaseSession,
    NoAffiliateSelected,
    AffiliateNotFound,
    SelfReferral,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::AlreadyTracking => "already_tracking",
            SkipReason::NoPurchaseSession => "no_purchase_session",
            SkipReason::NoAffiliateSelected => "no_affiliate_selected",
            SkipReason::AffiliateNotFound => "affiliate_not_found",
            SkipReason::SelfReferral => "self_referral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedReferral {
    pub referral: Referral,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReferralOutcome {
    Recorded(RecordedReferral),
    Skipped { reason: SkipReason },
}

impl ReferralOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        ReferralOutcome::Skipped { reason }
    }

    pub fn recorded(&self) -> Option<&RecordedReferral> {
        match self {
            ReferralOutcome::Recorded(recorded) => Some(recorded),
            ReferralOutcome::Skipped { .. } => None,
        }
    }
}
