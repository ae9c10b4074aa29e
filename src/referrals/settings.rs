use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::referrals::types::AffiliateDisplay;

pub const SETTINGS_TITLE: &str = "EDD Checkout Referrals";

pub const HEADER_OPTION: &str = "edd_checkout_referrals_header";
pub const CHECKOUT_TEXT_OPTION: &str = "edd_checkout_referrals_checkout_text";
pub const REQUIRE_AFFILIATE_OPTION: &str = "edd_checkout_referrals_require_affiliate";
pub const AFFILIATE_DISPLAY_OPTION: &str = "edd_checkout_referrals_affiliate_display";

pub const SUGGESTED_CHECKOUT_TEXT: &str =
    "Select the affiliate you would like to credit the referral to";

fn default_require_affiliate_error() -> String {
    "Please choose an affiliate".to_string()
}

/// Merchant-facing options for the checkout affiliate selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralSettings {
    /// Label shown above the select list; no label when empty.
    #[serde(default)]
    pub checkout_text: String,
    #[serde(default)]
    pub require_affiliate: bool,
    #[serde(default)]
    pub affiliate_display: AffiliateDisplay,
    #[serde(default = "default_require_affiliate_error")]
    pub require_affiliate_error: String,
}

impl Default for ReferralSettings {
    fn default() -> Self {
        Self {
            checkout_text: String::new(),
            require_affiliate: false,
            affiliate_display: AffiliateDisplay::default(),
            require_affiliate_error: default_require_affiliate_error(),
        }
    }
}

impl ReferralSettings {
    /// Reads a snapshot of the storefront's option table. Missing or
    /// malformed options fall back to their defaults.
    pub fn from_options(options: &BTreeMap<String, Value>) -> Self {
        let mut settings = Self::default();

        if let Some(text) = options.get(CHECKOUT_TEXT_OPTION).and_then(Value::as_str) {
            settings.checkout_text = text.to_string();
        }

        settings.require_affiliate = options
            .get(REQUIRE_AFFILIATE_OPTION)
            .is_some_and(option_enabled);

        if let Some(raw) = options.get(AFFILIATE_DISPLAY_OPTION).and_then(Value::as_str) {
            match AffiliateDisplay::from_key(raw) {
                Some(display) => settings.affiliate_display = display,
                None => tracing::warn!(
                    target: "referrals",
                    option = AFFILIATE_DISPLAY_OPTION,
                    value = raw,
                    "unknown_affiliate_display_option"
                ),
            }
        }

        settings
    }
}

/// Checkbox options are stored loosely: `true`, `1`, `"1"` and `"on"` all
/// mean checked.
fn option_enabled(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !matches!(text.trim(), "" | "0" | "false" | "off"),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettingKind {
    Header,
    Text { suggested: String },
    Checkbox,
    Radio {
        options: Vec<(String, String)>,
        default: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingField {
    pub id: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: SettingKind,
}

/// Entries the storefront's extension settings panel shows for this crate.
pub fn settings_fields() -> Vec<SettingField> {
    vec![
        SettingField {
            id: HEADER_OPTION,
            name: SETTINGS_TITLE.to_string(),
            description: None,
            kind: SettingKind::Header,
        },
        SettingField {
            id: CHECKOUT_TEXT_OPTION,
            name: "Checkout Text".to_string(),
            description: Some(
                "Enter the text that is shown with the affiliate select menu at checkout"
                    .to_string(),
            ),
            kind: SettingKind::Text {
                suggested: SUGGESTED_CHECKOUT_TEXT.to_string(),
            },
        },
        SettingField {
            id: REQUIRE_AFFILIATE_OPTION,
            name: "Require Affiliate Selection".to_string(),
            description: Some(
                "Customer must select an Affiliate to credit the referral to".to_string(),
            ),
            kind: SettingKind::Checkbox,
        },
        SettingField {
            id: AFFILIATE_DISPLAY_OPTION,
            name: "Affiliate Display".to_string(),
            description: Some(
                "Select how the Affiliate should be displayed at checkout".to_string(),
            ),
            kind: SettingKind::Radio {
                options: AffiliateDisplay::ALL
                    .into_iter()
                    .map(|display| (display.key().to_string(), display.title().to_string()))
                    .collect(),
                default: AffiliateDisplay::default().key().to_string(),
            },
        },
    ]
}
