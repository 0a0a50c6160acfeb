//! URL composition and query strings.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::routing::info::{NavigationOptions, QueryParameters, QueryValue, RouteInfo, RouteRequest};

/// Characters escaped in a query key or value. Everything but
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Composes navigation URLs.
pub struct UrlBuilder;

impl UrlBuilder {
    /// Build the URL for a navigation request.
    ///
    /// `request.url` wins outright. Otherwise the path (or the current path)
    /// is followed by the raw query and then the encoded query parameters.
    pub fn build(request: &RouteRequest, current: &RouteInfo, options: &NavigationOptions) -> String {
        if let Some(url) = &request.url {
            return url.clone();
        }

        let mut url = request.path.clone().unwrap_or_else(|| current.path.clone());

        if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        if let Some(params) = &request.query_parameters {
            let encoded = if options.merge_parameters {
                let mut merged = current.query_parameters.clone();
                merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
                encode_query(&merged)
            } else {
                encode_query(params)
            };
            if !encoded.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&encoded);
            }
        }

        if url.is_empty() {
            "/".to_string()
        } else {
            url
        }
    }
}

/// Encode query parameters as `k=v&k2=v2`, without the leading `?`.
///
/// Absent and empty values are skipped; lists are joined with `,`.
pub fn encode_query(params: &QueryParameters) -> String {
    params
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                QueryValue::Absent => return None,
                QueryValue::Single(value) if value.is_empty() => return None,
                other => other.as_joined()?,
            };
            Some(format!(
                "{}={}",
                utf8_percent_encode(key, COMPONENT),
                utf8_percent_encode(&value, COMPONENT)
            ))
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Parse the query part of a URL.
///
/// A key without `=` maps to [`QueryValue::Absent`]. A trailing `#fragment`
/// is dropped from each value.
pub fn parse_query(url: &str) -> QueryParameters {
    let mut params = QueryParameters::new();
    let Some((_, query)) = url.split_once('?') else {
        return params;
    };

    for piece in query.split('&').filter(|piece| !piece.is_empty()) {
        let (key, value) = match piece.split_once('=') {
            Some((key, value)) => {
                let value = value.split('#').next().unwrap_or_default();
                (key, QueryValue::Single(decode(value)))
            }
            None => (piece, QueryValue::Absent),
        };
        params.insert(decode(key), value);
    }
    params
}
