//! Administrative settings page.

use crate::settings::Setting;
use lyyti_host::{Capability, SettingsField, SettingsPage, SettingsSection};

/// Slug of the settings page.
pub const SETTINGS_PAGE_SLUG: &str = "lyyti";

fn field(setting: Setting, label: &str) -> SettingsField {
    SettingsField::new(setting.option_name(), label)
}

/// Build the settings page definition.
pub fn settings_page() -> SettingsPage {
    SettingsPage::new(
        SETTINGS_PAGE_SLUG,
        "Lyyti Participant Counts Options",
        "Lyyti Options",
        Capability::ManageOptions,
    )
    .intro(
        "Here you can configure the Lyyti Participant Counts plugin settings and \
         everything that happens under the hood. Batteries not included.",
    )
    .section(
        SettingsSection::new("lyyti_api_credentials", "Lyyti API Credentials")
            .intro("Here you need to provide the credentials to be used to access the Lyyti API.")
            .field(field(Setting::ApiPublicKey, "Public key"))
            .field(field(Setting::ApiPrivateKey, "Private key")),
    )
    .section(
        SettingsSection::new("lyyti_event_settings", "Lyyti Events settings")
            .intro("Here we define default values to use if not overridden in the shortcode.")
            .field(
                field(Setting::DefaultEventId, "Default Event ID (eid)")
                    .description("Numeric event id, integer"),
            )
            .field(
                field(Setting::DefaultStatusFilter, "Default participant statuses").description(
                    "Needs to be a comma-separated list without whitespace.\n \
                     Possible values: notreacted, reactedno, reactedyes, noshow, show",
                ),
            ),
    )
    .section(
        SettingsSection::new("lyyti_cache_settings", "Cache settings")
            .intro(
                "In order to not spam the Lyyti API on every page load, \
                 we are able to cache the API responses.",
            )
            .field(
                field(Setting::CacheLifetimeSeconds, "Cache lifetime").description(
                    "The number of seconds to cache the API responses.\n\
                     If not set, this defaults to 600 seconds.",
                ),
            ),
    )
}
