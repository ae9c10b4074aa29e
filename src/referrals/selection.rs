use std::{fmt::Write as _, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::referrals::{
    error::ReferralError,
    ports::{AffiliateProgramPort, UserDirectoryPort},
    settings::ReferralSettings,
    tracking::already_tracking_referral,
    types::{AFFILIATE_FIELD, CheckoutRequest, UserId},
};

const SELECT_ELEMENT_ID: &str = "edd-affiliate";
const SELECT_CLASS: &str = "edd-select";
const PLACEHOLDER_LABEL: &str = "Select";
const NO_RESULTS_TEXT: &str = "No affiliates match";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateOption {
    pub user_id: UserId,
    pub label: String,
}

/// Client-side searchable-select behaviour attached to the affiliate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectEnhancement {
    pub selector: String,
    pub width: String,
    pub no_results_text: String,
}

impl Default for SelectEnhancement {
    fn default() -> Self {
        Self {
            selector: format!(".{SELECT_CLASS}"),
            width: "100%".to_string(),
            no_results_text: NO_RESULTS_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateSelectField {
    pub label: Option<String>,
    pub field_name: String,
    pub placeholder: String,
    pub options: Vec<AffiliateOption>,
    pub enhancement: SelectEnhancement,
}

impl AffiliateSelectField {
    /// Markup inserted before the checkout submit button.
    pub fn render_html(&self) -> String {
        let mut html = String::from("<p>\n");
        if let Some(label) = &self.label {
            let _ = writeln!(
                html,
                "<label for=\"{SELECT_ELEMENT_ID}\">{}</label>",
                escape_html(label)
            );
        }
        let _ = writeln!(
            html,
            "<select id=\"{SELECT_ELEMENT_ID}\" name=\"{}\" class=\"{SELECT_CLASS}\">",
            escape_html(&self.field_name)
        );
        let _ = writeln!(
            html,
            "<option value=\"\">{}</option>",
            escape_html(&self.placeholder)
        );
        for option in &self.options {
            let _ = writeln!(
                html,
                "<option value=\"{}\">{}</option>",
                option.user_id,
                escape_html(&option.label)
            );
        }
        html.push_str("</select>\n</p>\n");
        html
    }

    /// Footer script that turns the select into a searchable one.
    pub fn enhancement_script(&self) -> String {
        let options = serde_json::json!({
            "width": self.enhancement.width,
            "no_results_text": self.enhancement.no_results_text,
        });
        let selector = serde_json::Value::String(self.enhancement.selector.clone());
        format!(
            "<script>\njQuery(document).ready(function ($) {{\n\t$({selector}).chosen({options});\n}});\n</script>\n"
        )
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Script,
    Stylesheet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub handle: String,
    pub kind: AssetKind,
    /// Path relative to the storefront's asset root.
    pub path: String,
}

/// Assets the searchable select needs. Nothing is enqueued off the checkout
/// page or when the shopper is already tracked.
pub fn checkout_assets(
    request: &CheckoutRequest,
    is_checkout: bool,
    script_debug: bool,
) -> Vec<AssetRef> {
    if !is_checkout || already_tracking_referral(request) {
        return Vec::new();
    }

    let suffix = if script_debug { "" } else { ".min" };
    vec![
        AssetRef {
            handle: "jquery-chosen".to_string(),
            kind: AssetKind::Script,
            path: format!("js/chosen.jquery{suffix}.js"),
        },
        AssetRef {
            handle: "jquery-chosen".to_string(),
            kind: AssetKind::Stylesheet,
            path: format!("css/chosen{suffix}.css"),
        },
    ]
}

pub struct AffiliateListProvider {
    settings: Arc<ReferralSettings>,
    affiliates: Arc<dyn AffiliateProgramPort>,
    users: Arc<dyn UserDirectoryPort>,
}

impl AffiliateListProvider {
    pub fn new(
        settings: Arc<ReferralSettings>,
        affiliates: Arc<dyn AffiliateProgramPort>,
        users: Arc<dyn UserDirectoryPort>,
    ) -> Self {
        Self {
            settings,
            affiliates,
            users,
        }
    }

    #[tracing::instrument(name = "affiliate_select_field", target = "referrals", skip_all)]
    pub async fn select_field(
        &self,
        request: &CheckoutRequest,
    ) -> Result<Option<AffiliateSelectField>, ReferralError> {
        if already_tracking_referral(request) {
            return Ok(None);
        }

        let display_field = self.settings.affiliate_display;
        let mut options = Vec::new();
        for affiliate in self.affiliates.active_affiliates().await? {
            let Some(profile) = self.users.user_profile(affiliate.user_id).await? else {
                tracing::warn!(
                    target: "referrals",
                    affiliate_id = affiliate.affiliate_id,
                    user_id = affiliate.user_id,
                    "affiliate_user_profile_missing"
                );
                continue;
            };
            options.push(AffiliateOption {
                user_id: affiliate.user_id,
                label: display_field.pick(&profile).to_string(),
            });
        }

        tracing::debug!(
            target: "referrals",
            option_count = options.len(),
            affiliate_display = display_field.key(),
            "affiliate_select_field_built"
        );

        let checkout_text = &self.settings.checkout_text;
        Ok(Some(AffiliateSelectField {
            label: (!checkout_text.is_empty()).then(|| checkout_text.clone()),
            field_name: AFFILIATE_FIELD.to_string(),
            placeholder: PLACEHOLDER_LABEL.to_string(),
            options,
            enhancement: SelectEnhancement::default(),
        }))
    }
}
