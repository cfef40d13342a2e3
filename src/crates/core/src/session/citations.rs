use log::warn;
use mason_core_types::Citation;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResult {
    url: String,
    title: String,
}

/// Parses the `results` header: a JSON array of `{url, title}` where the
/// title is percent-encoded. A malformed header yields no citations.
pub fn parse_results_header(value: &str) -> Vec<Citation> {
    let results: Vec<SearchResult> = match serde_json::from_str(value) {
        Ok(results) => results,
        Err(e) => {
            warn!("Ignoring malformed results header: {}, value: {}", e, value);
            return Vec::new();
        }
    };

    results
        .into_iter()
        .map(|result| Citation {
            title: decode_title(result.title),
            url: result.url,
        })
        .collect()
}

fn decode_title(title: String) -> String {
    match urlencoding::decode(&title) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            warn!("Keeping undecodable citation title: {}, title: {}", e, title);
            title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_encoded_titles() {
        let header = r#"[
            {"url": "https://example.com/a", "title": "Rust%20%E6%95%99%E7%A8%8B"},
            {"url": "https://example.com/b", "title": "plain"}
        ]"#;

        assert_eq!(
            parse_results_header(header),
            vec![
                Citation {
                    title: "Rust 教程".to_string(),
                    url: "https://example.com/a".to_string(),
                },
                Citation {
                    title: "plain".to_string(),
                    url: "https://example.com/b".to_string(),
                },
            ]
        );
    }

    #[test]
    fn malformed_header_yields_no_citations() {
        assert!(parse_results_header("not json").is_empty());
        assert!(parse_results_header(r#"[{"url": "x"}]"#).is_empty());
    }

    #[test]
    fn invalid_utf8_escape_keeps_raw_title() {
        let citations = parse_results_header(r#"[{"url": "u", "title": "bad%FF"}]"#);
        assert_eq!(citations[0].title, "bad%FF");
    }
}
