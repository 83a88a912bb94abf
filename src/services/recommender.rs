use crate::models::{AssociationRule, Recommendation, RuleMatch};

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn project(rule: &AssociationRule, product: &str, label: String, source: RuleMatch) -> Recommendation {
    Recommendation {
        product: product.to_string(),
        confidence: round3(rule.confidence),
        lift: round3(rule.lift),
        support: round3(rule.support),
        rule_label: label,
        source,
    }
}

/// Ranks recommendations for `product` from a sorted rule set.
///
/// Direct tier: every consequent of rules whose antecedents contain `product`.
/// When that yields nothing, the fallback tier walks all rules in order and takes
/// any consequent other than `product`, stopping at `max_results`. Either way the
/// candidates are stably sorted by confidence and truncated.
///
/// The fallback trades relevance for availability: unseen products still get
/// the strongest general co-occurrences instead of an empty answer.
pub fn recommend(product: &str, rules: &[AssociationRule], max_results: usize) -> Vec<Recommendation> {
    if max_results == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<Recommendation> = rules
        .iter()
        .filter(|rule| rule.has_antecedent(product) && !rule.has_consequent(product))
        .flat_map(|rule| {
            rule.consequents.iter().map(move |consequent| {
                project(
                    rule,
                    consequent,
                    format!("{} → {}", product, consequent),
                    RuleMatch::Direct,
                )
            })
        })
        .collect();

    if candidates.is_empty() && !rules.is_empty() {
        tracing::info!(product = %product, "No direct rule, falling back to general co-occurrences");

        'rules: for rule in rules {
            for consequent in rule.consequents.iter().filter(|c| c.as_str() != product) {
                let label = format!("{} → {}", rule.antecedents.join(", "), consequent);
                candidates.push(project(rule, consequent, label, RuleMatch::Fallback));
                if candidates.len() >= max_results {
                    break 'rules;
                }
            }
        }
    }

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates.truncate(max_results);
    candidates
}
