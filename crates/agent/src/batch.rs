//! Split long instruction text into batches that fit a token budget.

use notewright_core::error::ProviderError;
use notewright_core::message::Part;
use notewright_core::provider::Provider;

/// Split `text` on blank lines, packing paragraphs greedily so each batch
/// counts at most `budget` tokens. A paragraph over budget on its own
/// becomes its own batch.
pub async fn split_by_token_budget(
    provider: &dyn Provider,
    text: &str,
    budget: u32,
) -> Result<Vec<String>, ProviderError> {
    let paragraphs = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let mut batches = Vec::new();
    let mut current = String::new();
    for paragraph in paragraphs {
        if current.is_empty() {
            current.push_str(paragraph);
            continue;
        }
        let candidate = format!("{current}\n\n{paragraph}");
        if provider.count_tokens(&[Part::text(candidate.as_str())]).await? <= budget {
            current = candidate;
        } else {
            batches.push(std::mem::replace(&mut current, paragraph.to_string()));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;

    // The default token estimate is 4 characters per token.

    #[tokio::test]
    async fn short_text_is_one_batch() {
        let provider = ScriptedProvider::responses(vec![]);
        let batches = split_by_token_budget(&provider, "one\n\ntwo", 100).await.unwrap();
        assert_eq!(batches, vec!["one\n\ntwo"]);
    }

    #[tokio::test]
    async fn packs_paragraphs_within_budget() {
        let provider = ScriptedProvider::responses(vec![]);
        let para = "x".repeat(16); // 4 tokens
        let text = [para.as_str(); 5].join("\n\n");
        // Two paragraphs plus separator: 34 chars = 8 tokens; three: 52 = 13
        let batches = split_by_token_budget(&provider, &text, 10).await.unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0], format!("{para}\n\n{para}"));
        assert_eq!(batches[2], para);
    }

    #[tokio::test]
    async fn oversized_paragraph_stands_alone() {
        let provider = ScriptedProvider::responses(vec![]);
        let big = "y".repeat(400);
        let text = format!("small\n\n{big}\n\ntail");
        let batches = split_by_token_budget(&provider, &text, 20).await.unwrap();
        assert_eq!(batches, vec!["small".to_string(), big, "tail".to_string()]);
    }

    #[tokio::test]
    async fn blank_text_has_no_batches() {
        let provider = ScriptedProvider::responses(vec![]);
        assert!(split_by_token_budget(&provider, "\n\n  \n\n", 10).await.unwrap().is_empty());
    }
}
