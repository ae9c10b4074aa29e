pub mod creator;
pub mod error;
pub mod facade;
pub mod memory;
pub mod ports;
pub mod selection;
pub mod settings;
pub mod tracking;
pub mod types;
pub mod validator;

pub use creator::ReferralCreator;
pub use error::{CheckoutValidationError, ReferralError, ReferralErrorKind};
pub use facade::{
    CheckoutFormExtension, CheckoutReferrals, CheckoutValidator, PurchaseCompletionListener,
};
pub use memory::{
    InMemoryAffiliateProgram, InMemoryStorefront, InMemoryUserDirectory, PaymentRecord,
    ProgramAffiliate, ProgramSnapshot, StorefrontSnapshot,
};
pub use ports::{AffiliateProgramPort, StorefrontPort, UserDirectoryPort};
pub use selection::{
    AffiliateListProvider, AffiliateOption, AffiliateSelectField, AssetKind, AssetRef,
    SelectEnhancement, checkout_assets,
};
pub use settings::{ReferralSettings, SettingField, SettingKind, settings_fields};
pub use tracking::already_tracking_referral;
pub use types::{
    AFFILIATE_FIELD, Affiliate, AffiliateDisplay, AffiliateId, AffiliateStatus, CheckoutFields,
    CheckoutRequest, DownloadId, FormFields, NewReferral, PaymentId, PurchaseSession,
    REFERRAL_CONTEXT, RecordedReferral, Referral, ReferralId, ReferralOutcome, ReferralStatus,
    SkipReason, TRACKING_COOKIE, UserId, UserProfile,
};
pub use validator::SelectionValidator;
