use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::referrals::{
    error::{ReferralError, host_unavailable, internal_error, missing_record},
    ports::{AffiliateProgramPort, StorefrontPort, UserDirectoryPort},
    types::{
        Affiliate, AffiliateId, AffiliateStatus, CheckoutRequest, DownloadId, NewReferral,
        PaymentId, PurchaseSession, Referral, ReferralId, UserId, UserProfile,
    },
};

fn default_rate() -> Decimal {
    Decimal::new(20, 2)
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ReferralError> {
    mutex
        .lock()
        .map_err(|_| internal_error(format!("{what} lock poisoned")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramAffiliate {
    #[serde(flatten)]
    pub affiliate: Affiliate,
    pub name: String,
    /// Per-affiliate commission rate; the program default applies when unset.
    #[serde(default)]
    pub rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSnapshot {
    #[serde(default)]
    pub affiliates: Vec<ProgramAffiliate>,
    #[serde(default = "default_rate")]
    pub default_rate: Decimal,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for ProgramSnapshot {
    fn default() -> Self {
        Self {
            affiliates: Vec::new(),
            default_rate: default_rate(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Affiliate program kept in process memory. Commission is a flat
/// percentage of the cart price, rounded to cents.
pub struct InMemoryAffiliateProgram {
    affiliates: Vec<ProgramAffiliate>,
    default_rate: Decimal,
    currency_symbol: String,
    referrals: Mutex<Vec<Referral>>,
}

impl Default for InMemoryAffiliateProgram {
    fn default() -> Self {
        Self::from_snapshot(ProgramSnapshot::default())
    }
}

impl InMemoryAffiliateProgram {
    pub fn from_snapshot(snapshot: ProgramSnapshot) -> Self {
        Self {
            affiliates: snapshot.affiliates,
            default_rate: snapshot.default_rate,
            currency_symbol: snapshot.currency_symbol,
            referrals: Mutex::new(Vec::new()),
        }
    }

    pub fn with_affiliate(mut self, affiliate: ProgramAffiliate) -> Self {
        self.affiliates.push(affiliate);
        self
    }

    pub fn referrals(&self) -> Result<Vec<Referral>, ReferralError> {
        Ok(lock(&self.referrals, "referral store")?.clone())
    }

    fn find(&self, affiliate_id: AffiliateId) -> Option<&ProgramAffiliate> {
        self.affiliates
            .iter()
            .find(|entry| entry.affiliate.affiliate_id == affiliate_id)
    }
}

#[async_trait]
impl AffiliateProgramPort for InMemoryAffiliateProgram {
    async fn active_affiliates(&self) -> Result<Vec<Affiliate>, ReferralError> {
        Ok(self
            .affiliates
            .iter()
            .filter(|entry| entry.affiliate.status == AffiliateStatus::Active)
            .map(|entry| entry.affiliate.clone())
            .collect())
    }

    async fn affiliate_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Option<Affiliate>, ReferralError> {
        Ok(self
            .affiliates
            .iter()
            .find(|entry| entry.affiliate.user_id == user_id)
            .map(|entry| entry.affiliate.clone()))
    }

    async fn affiliate_email(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Option<String>, ReferralError> {
        Ok(self
            .find(affiliate_id)
            .map(|entry| entry.affiliate.email.clone()))
    }

    async fn affiliate_name(&self, affiliate_id: AffiliateId) -> Result<String, ReferralError> {
        self.find(affiliate_id)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| missing_record(format!("affiliate {affiliate_id} not found")))
    }

    async fn referral_amount(
        &self,
        price: Decimal,
        affiliate_id: AffiliateId,
    ) -> Result<Decimal, ReferralError> {
        let rate = self
            .find(affiliate_id)
            .and_then(|entry| entry.rate)
            .unwrap_or(self.default_rate);
        Ok((price * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    async fn add_referral(&self, referral: NewReferral) -> Result<ReferralId, ReferralError> {
        let affiliate_id = self
            .affiliates
            .iter()
            .find(|entry| entry.affiliate.user_id == referral.user_id)
            .map(|entry| entry.affiliate.affiliate_id)
            .ok_or_else(|| {
                missing_record(format!("no affiliate for user {}", referral.user_id))
            })?;

        let mut referrals = lock(&self.referrals, "referral store")?;
        let referral_id = referrals.len() as ReferralId + 1;
        referrals.push(Referral {
            referral_id,
            affiliate_id,
            user_id: referral.user_id,
            amount: referral.amount,
            reference: referral.reference,
            description: referral.description,
            status: referral.status,
            context: referral.context,
        });
        Ok(referral_id)
    }

    async fn referral_by_reference(
        &self,
        reference: &str,
        context: &str,
    ) -> Result<Option<Referral>, ReferralError> {
        let referrals = lock(&self.referrals, "referral store")?;
        Ok(referrals
            .iter()
            .rev()
            .find(|referral| referral.reference == reference && referral.context == context)
            .cloned())
    }

    fn format_amount(&self, amount: Decimal) -> String {
        let mut cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        cents.rescale(2);
        format!("{}{}", self.currency_symbol, cents)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub purchaser_email: String,
    #[serde(default)]
    pub downloads: Vec<DownloadId>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontSnapshot {
    #[serde(default)]
    pub sessions: BTreeMap<String, PurchaseSession>,
    #[serde(default)]
    pub payments: BTreeMap<PaymentId, PaymentRecord>,
    #[serde(default)]
    pub downloads: BTreeMap<DownloadId, String>,
}

#[derive(Default)]
pub struct InMemoryStorefront {
    state: Mutex<StorefrontSnapshot>,
    notes_unavailable: Mutex<bool>,
}

impl InMemoryStorefront {
    pub fn from_snapshot(snapshot: StorefrontSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            notes_unavailable: Mutex::new(false),
        }
    }

    pub fn put_session(
        &self,
        session_id: impl Into<String>,
        session: PurchaseSession,
    ) -> Result<(), ReferralError> {
        lock(&self.state, "storefront")?
            .sessions
            .insert(session_id.into(), session);
        Ok(())
    }

    pub fn put_payment(
        &self,
        payment_id: PaymentId,
        payment: PaymentRecord,
    ) -> Result<(), ReferralError> {
        lock(&self.state, "storefront")?
            .payments
            .insert(payment_id, payment);
        Ok(())
    }

    pub fn put_download(
        &self,
        download_id: DownloadId,
        title: impl Into<String>,
    ) -> Result<(), ReferralError> {
        lock(&self.state, "storefront")?
            .downloads
            .insert(download_id, title.into());
        Ok(())
    }

    /// Makes payment note writes fail, simulating an unreachable payment store.
    pub fn set_notes_unavailable(&self, unavailable: bool) -> Result<(), ReferralError> {
        *lock(&self.notes_unavailable, "storefront availability")? = unavailable;
        Ok(())
    }

    pub fn payment_notes(&self, payment_id: PaymentId) -> Result<Vec<String>, ReferralError> {
        let state = lock(&self.state, "storefront")?;
        Ok(state
            .payments
            .get(&payment_id)
            .map(|payment| payment.notes.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl StorefrontPort for InMemoryStorefront {
    async fn purchase_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<Option<PurchaseSession>, ReferralError> {
        let Some(session_id) = request.session_id.as_deref() else {
            return Ok(None);
        };
        let state = lock(&self.state, "storefront")?;
        Ok(state.sessions.get(session_id).cloned())
    }

    async fn purchased_downloads(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<DownloadId>, ReferralError> {
        let state = lock(&self.state, "storefront")?;
        state
            .payments
            .get(&payment_id)
            .map(|payment| payment.downloads.clone())
            .ok_or_else(|| missing_record(format!("payment {payment_id} not found")))
    }

    async fn download_title(&self, download_id: DownloadId) -> Result<String, ReferralError> {
        let state = lock(&self.state, "storefront")?;
        state
            .downloads
            .get(&download_id)
            .cloned()
            .ok_or_else(|| missing_record(format!("download {download_id} not found")))
    }

    async fn purchaser_email(&self, payment_id: PaymentId) -> Result<String, ReferralError> {
        let state = lock(&self.state, "storefront")?;
        state
            .payments
            .get(&payment_id)
            .map(|payment| payment.purchaser_email.clone())
            .ok_or_else(|| missing_record(format!("payment {payment_id} not found")))
    }

    async fn insert_payment_note(
        &self,
        payment_id: PaymentId,
        note: String,
    ) -> Result<(), ReferralError> {
        if *lock(&self.notes_unavailable, "storefront availability")? {
            return Err(host_unavailable("payment notes are unavailable"));
        }
        let mut state = lock(&self.state, "storefront")?;
        let payment = state
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| missing_record(format!("payment {payment_id} not found")))?;
        payment.notes.push(note);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    profiles: BTreeMap<UserId, UserProfile>,
}

impl InMemoryUserDirectory {
    pub fn new(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.user_id, profile))
                .collect(),
        }
    }
}

#[async_trait]
impl UserDirectoryPort for InMemoryUserDirectory {
    async fn user_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, ReferralError> {
        Ok(self.profiles.get(&user_id).cloned())
    }
}
