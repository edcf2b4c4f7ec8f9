use std::borrow::Cow;

use url::Url;
use url::form_urlencoded;

/// Extracts the scope list from whatever a developer copied out of the
/// developer portal.
///
/// Accepted inputs:
/// * a full authorize URL (`https://webexapis.com/v1/authorize?...&scope=...`)
/// * its query string, percent-encoded or not (`client_id=...&scope=...`)
/// * bare percent-encoded scopes (`spark%3Akms%20spark%3Apeople_read`,
///   `+` standing for a space as in a query string)
/// * space-separated scopes (`spark:kms spark:people_read`)
///
/// The result is space-separated with surrounding and repeated whitespace
/// collapsed, so `parse_scopes(&parse_scopes(s)) == parse_scopes(s)`.
#[must_use]
pub fn parse_scopes(input: &str) -> String {
    let input = input.trim();

    let raw: Cow<'_, str> = if input.starts_with("https://") || input.starts_with("http://") {
        Url::parse(input)
            .ok()
            .and_then(|url| scope_param(url.query().unwrap_or_default()))
            .map_or(Cow::Borrowed(""), Cow::Owned)
    } else if input.contains('=') {
        let query = input.split_once('?').map_or(input, |(_, q)| q);
        scope_param(query).map_or(Cow::Borrowed(""), Cow::Owned)
    } else {
        let spaced = input.replace('+', " ");
        Cow::Owned(urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), Cow::into_owned))
    };

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn scope_param(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "scope")
        .map(|(_, value)| value.into_owned())
}
