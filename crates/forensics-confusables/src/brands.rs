//! The ~40 well-known brand domains checked for homograph/typosquat
//! impersonation (spec §4.8).

pub const BRANDS: &[&str] = &[
    "google.com",
    "gmail.com",
    "paypal.com",
    "microsoft.com",
    "apple.com",
    "icloud.com",
    "amazon.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "netflix.com",
    "chase.com",
    "bankofamerica.com",
    "wellsfargo.com",
    "citibank.com",
    "americanexpress.com",
    "ebay.com",
    "dropbox.com",
    "adobe.com",
    "docusign.com",
    "irs.gov",
    "usps.com",
    "fedex.com",
    "ups.com",
    "dhl.com",
    "coinbase.com",
    "binance.com",
    "steampowered.com",
    "github.com",
    "gitlab.com",
    "slack.com",
    "zoom.us",
    "office.com",
    "outlook.com",
    "yahoo.com",
    "protonmail.com",
    "att.com",
    "verizon.com",
    "t-mobile.com",
    "venmo.com",
    "squareup.com",
];
