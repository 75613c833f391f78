use serde::{Deserialize, Deserializer, Serialize};

/// Value of `Result.Code` that marks a successful lookup.
pub const SUCCESS_CODE: i64 = 200;

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Top-level body returned by the Tech endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhatCmsResponse {
    #[serde(rename = "Result", alias = "result", default, deserialize_with = "null_as_default")]
    pub result: ApiStatus,
    #[serde(rename = "Results", alias = "results", default, deserialize_with = "null_as_default")]
    pub results: Vec<Technology>,
    #[serde(rename = "Meta", alias = "meta", default, deserialize_with = "null_as_default")]
    pub meta: Meta,
}

impl WhatCmsResponse {
    pub fn is_success(&self) -> bool {
        self.result.code == SUCCESS_CODE
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiStatus {
    #[serde(rename = "Code", alias = "code", default, deserialize_with = "null_as_default")]
    pub code: i64,
    #[serde(rename = "Msg", alias = "msg", default, deserialize_with = "null_as_default")]
    pub msg: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "Socials", alias = "socials", default, deserialize_with = "null_as_default")]
    pub socials: Vec<SocialProfile>,
}

/// A technology detected on a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    #[serde(rename = "Name", alias = "name", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "Id", alias = "ID", alias = "id", default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(rename = "Version", alias = "version", default, deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(rename = "Categories", alias = "categories", default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(rename = "URL", alias = "Url", alias = "url", default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// A social network profile linked from a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfile {
    #[serde(rename = "Network", alias = "network", default, deserialize_with = "null_as_default")]
    pub network: String,
    #[serde(rename = "URL", alias = "Url", alias = "url", default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(rename = "Profile", alias = "profile", default, deserialize_with = "null_as_default")]
    pub profile: String,
}

/// Outcome of looking up one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Success {
        technologies: Vec<Technology>,
        socials: Vec<SocialProfile>,
    },
    Failure {
        url: String,
    },
}

/// Everything collected over a run of lookups.
///
/// The three collections are not index-correlated. `unretrieved` keeps the
/// order in which the failing URLs appeared in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResults {
    pub technologies: Vec<Technology>,
    pub socials: Vec<SocialProfile>,
    pub unretrieved: Vec<String>,
    pub retrieved: usize,
}

impl LookupResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: LookupOutcome) {
        match outcome {
            LookupOutcome::Success {
                technologies,
                socials,
            } => {
                self.technologies.extend(technologies);
                self.socials.extend(socials);
                self.retrieved += 1;
            }
            LookupOutcome::Failure { url } => self.unretrieved.push(url),
        }
    }

    /// Number of URLs processed so far.
    pub fn total(&self) -> usize {
        self.retrieved + self.unretrieved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_capitalised_body() {
        let body = r#"{
            "Result": {"Code": 200, "Msg": "Success"},
            "Results": [{"Name": "nginx", "Id": 1, "Version": "", "Categories": ["Web Servers"], "URL": "https://example.com"}],
            "Meta": {"Socials": [{"Network": "twitter", "URL": "https://twitter.com/ex", "Profile": "ex"}]}
        }"#;

        let response: WhatCmsResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_success());
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].name, "nginx");
        assert_eq!(response.results[0].categories, vec!["Web Servers"]);
        assert_eq!(response.meta.socials[0].profile, "ex");
    }

    #[test]
    fn test_decode_lowercase_body_with_nulls() {
        let body = r#"{
            "result": {"code": 200, "msg": "Success"},
            "results": [{"name": "WordPress", "id": 1, "version": null, "categories": null, "url": "https://whatcms.org/c/WordPress"}],
            "meta": null
        }"#;

        let response: WhatCmsResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_success());
        assert_eq!(response.results[0].version, "");
        assert!(response.results[0].categories.is_empty());
        assert!(response.meta.socials.is_empty());
    }

    #[test]
    fn test_missing_result_block_is_not_success() {
        let response: WhatCmsResponse = serde_json::from_str("{}").unwrap();
        assert!(!response.is_success());
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_record_keeps_failure_order() {
        let mut results = LookupResults::new();
        results.record(LookupOutcome::Failure {
            url: "https://b.example".to_string(),
        });
        results.record(LookupOutcome::Success {
            technologies: vec![Technology::default()],
            socials: vec![],
        });
        results.record(LookupOutcome::Failure {
            url: "https://a.example".to_string(),
        });

        assert_eq!(results.unretrieved, vec!["https://b.example", "https://a.example"]);
        assert_eq!(results.retrieved, 1);
        assert_eq!(results.total(), 3);
        assert_eq!(results.technologies.len(), 1);
    }
}
