use crate::algorithms::traits::TraitRule;
use crate::config::{LearningConfig, ScoringConfig};
use crate::error::{EngineError, Result};
use std::collections::HashSet;

fn invalid_rule(rule: &TraitRule, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidTraitRule {
        trait_id: rule.id.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_trait_rules(rules: &[TraitRule]) -> Result<()> {
    let mut seen = HashSet::new();

    for rule in rules {
        if rule.id.trim().is_empty() {
            return Err(invalid_rule(rule, "trait id cannot be empty"));
        }

        if rule.id != rule.id.to_lowercase() {
            return Err(invalid_rule(rule, "trait id must be lower-case"));
        }

        if !seen.insert(rule.id) {
            return Err(invalid_rule(rule, "duplicate trait id"));
        }

        if rule.keywords.is_empty() {
            return Err(invalid_rule(rule, "keyword set cannot be empty"));
        }

        for keyword in rule.keywords {
            if keyword.trim().is_empty() {
                return Err(invalid_rule(rule, "keywords cannot be empty"));
            }
            if *keyword != keyword.to_lowercase() {
                return Err(invalid_rule(rule, format!("keyword {:?} must be lower-case", keyword)));
            }
        }
    }

    Ok(())
}

fn require(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig(message.to_string()))
    }
}

fn finite_non_negative(values: &[f64]) -> bool {
    values.iter().all(|value| value.is_finite() && *value >= 0.0)
}

pub fn validate_learning_config(config: &LearningConfig) -> Result<()> {
    require(config.popularity_limit > 0, "learning.popularity_limit must be greater than 0")?;
    require(config.top_preferences > 0, "learning.top_preferences must be greater than 0")?;
    require(
        finite_non_negative(&[config.collaborative_weight, config.content_weight]),
        "learning blend weights must be finite and non-negative",
    )?;
    require(
        config.min_actor_similarity.is_finite() && (0.0..1.0).contains(&config.min_actor_similarity),
        "learning.min_actor_similarity must be in [0, 1)",
    )?;
    Ok(())
}

pub fn validate_scoring_config(config: &ScoringConfig) -> Result<()> {
    require(
        finite_non_negative(&[
            config.quality_weight,
            config.interest_weight,
            config.trait_weight,
            config.budget_weight,
            config.similarity_weight,
            config.liked_category_boost,
            config.liked_tag_boost,
            config.disliked_category_penalty,
            config.disliked_tag_penalty,
            config.novelty_bonus,
        ]),
        "scoring weights and adjustments must be finite and non-negative",
    )?;
    require(
        config.relaxed_threshold <= config.default_threshold && config.default_threshold <= config.strict_threshold,
        "scoring thresholds must satisfy relaxed <= default <= strict",
    )?;
    require(
        config.min_before_fallback <= config.min_before_relax,
        "scoring.min_before_fallback cannot exceed scoring.min_before_relax",
    )?;
    require(config.fallback_limit > 0, "scoring.fallback_limit must be greater than 0")?;
    require(config.default_limit > 0, "scoring.default_limit must be greater than 0")?;
    Ok(())
}
