use std::fmt;
use url::Url;

/// Query parameter carrying the URL-encoded JSON filter state.
pub const FILTER_PARAM: &str = "filter";

/// The page address a filter view lives at.
///
/// Writing a parameter edits the current address in place, like a history
/// replace: other parameters and the fragment are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlLocation {
    url: Url,
}

impl UrlLocation {
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input).map(|url| Self { url })
    }

    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Decoded value of the first `name` parameter.
    pub fn param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Set `name` to `value`, keeping its position if already present.
    pub fn replace_param(&mut self, name: &str, value: &str) {
        let mut pairs = self.owned_pairs();
        match pairs.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => pairs.push((name.to_string(), value.to_string())),
        }
        self.write_pairs(&pairs);
    }

    pub fn remove_param(&mut self, name: &str) {
        let mut pairs = self.owned_pairs();
        pairs.retain(|(k, _)| k != name);
        self.write_pairs(&pairs);
    }

    fn owned_pairs(&self) -> Vec<(String, String)> {
        self.url.query_pairs().into_owned().collect()
    }

    fn write_pairs(&mut self, pairs: &[(String, String)]) {
        if pairs.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }
}

impl fmt::Display for UrlLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_origin_path_and_params() {
        let url =
            UrlLocation::parse("https://dns.example.net/records?page=2&q=mail%20server#top")
                .unwrap();
        assert_eq!(url.origin(), "https://dns.example.net");
        assert_eq!(url.path(), "/records");
        assert_eq!(url.param("page").as_deref(), Some("2"));
        assert_eq!(url.param("q").as_deref(), Some("mail server"));
    }

    #[test]
    fn replace_keeps_other_params_and_encodes_json() {
        let mut url = UrlLocation::parse("https://dns.example.net/records?page=2#top").unwrap();
        url.replace_param(FILTER_PARAM, r#"{"searchTerm":"a b"}"#);
        url.replace_param(FILTER_PARAM, r#"{"searchTerm":"mx"}"#);

        assert_eq!(
            url.to_string(),
            "https://dns.example.net/records?page=2&filter=%7B%22searchTerm%22%3A%22mx%22%7D#top"
        );
        let reparsed = UrlLocation::parse(&url.to_string()).unwrap();
        assert_eq!(
            reparsed.param(FILTER_PARAM).as_deref(),
            Some(r#"{"searchTerm":"mx"}"#)
        );
    }

    #[test]
    fn removing_the_last_param_drops_the_query() {
        let mut url = UrlLocation::parse("https://dns.example.net/records?filter=x").unwrap();
        url.remove_param(FILTER_PARAM);
        assert_eq!(url.to_string(), "https://dns.example.net/records");
    }

    #[test]
    fn rejects_relative_addresses() {
        assert!(UrlLocation::parse("/records?filter=x").is_err());
    }
}
