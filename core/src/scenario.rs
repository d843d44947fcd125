//! Scenario records: the situation, three options, their consequences
//! and per-option metrics. Also the fixed fallback records and the
//! dynamic event roll.

use crate::{config::DynamicEventGroup, rng::GameRng};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Every scenario offers exactly this many options.
pub const OPTION_COUNT: usize = 3;

/// Metric used when a scenario omits one.
pub const DEFAULT_METRIC: u32 = 5;

fn default_metric() -> u32 {
    DEFAULT_METRIC
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionMetrics {
    #[serde(default = "default_metric")]
    pub risk:    u32,
    #[serde(default = "default_metric")]
    pub reward:  u32,
    #[serde(default = "default_metric")]
    pub realism: u32,
}

impl Default for OptionMetrics {
    fn default() -> Self {
        Self { risk: DEFAULT_METRIC, reward: DEFAULT_METRIC, realism: DEFAULT_METRIC }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioEvent {
    pub description: String,
    pub impact:      String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub scenario:     String,
    pub options:      Vec<String>,
    pub consequences: Vec<String>,
    /// Keyed `option_1` .. `option_3`.
    pub score_logic:  BTreeMap<String, OptionMetrics>,
    #[serde(default, deserialize_with = "deserialize_event")]
    pub event:        Option<ScenarioEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    impact:      Option<String>,
}

/// Accepts a missing/null event, `{description: null, impact: null}`,
/// or both fields present. One without the other is rejected.
fn deserialize_event<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ScenarioEvent>, D::Error> {
    let raw: Option<RawEvent> = Option::deserialize(d)?;
    match raw {
        None => Ok(None),
        Some(RawEvent { description: None, impact: None }) => Ok(None),
        Some(RawEvent { description: Some(description), impact: Some(impact) }) => {
            Ok(Some(ScenarioEvent { description, impact }))
        }
        Some(_) => Err(serde::de::Error::custom(
            "event description and impact must both be present or both null",
        )),
    }
}

pub fn option_key(option: usize) -> String {
    format!("option_{option}")
}

impl ScenarioRecord {
    /// Check the structural contract: non-empty text, three options,
    /// three consequences, metrics for each option within 0..=10.
    pub fn validate(&self) -> Result<(), String> {
        if self.scenario.trim().is_empty() {
            return Err("scenario text is empty".into());
        }
        if self.options.len() != OPTION_COUNT {
            return Err(format!("expected {OPTION_COUNT} options, got {}", self.options.len()));
        }
        if self.consequences.len() != OPTION_COUNT {
            return Err(format!(
                "expected {OPTION_COUNT} consequences, got {}",
                self.consequences.len()
            ));
        }
        for option in 1..=OPTION_COUNT {
            let key = option_key(option);
            let m = self
                .score_logic
                .get(&key)
                .ok_or_else(|| format!("score_logic is missing {key}"))?;
            if m.risk > 10 || m.reward > 10 || m.realism > 10 {
                return Err(format!("{key} metrics must be within 0..=10"));
            }
        }
        Ok(())
    }

    /// Metrics of a 1-based option, defaulting each missing one to 5.
    pub fn metrics(&self, option: usize) -> OptionMetrics {
        self.score_logic
            .get(&option_key(option))
            .copied()
            .unwrap_or_default()
    }

    /// Apply `f` to every player-facing string.
    pub fn map_text(&self, mut f: impl FnMut(&str) -> String) -> ScenarioRecord {
        ScenarioRecord {
            scenario:     f(&self.scenario),
            options:      self.options.iter().map(|o| f(o)).collect(),
            consequences: self.consequences.iter().map(|c| f(c)).collect(),
            score_logic:  self.score_logic.clone(),
            event:        self.event.as_ref().map(|e| ScenarioEvent {
                description: f(&e.description),
                impact:      f(&e.impact),
            }),
        }
    }
}

fn metrics(risk: u32, reward: u32, realism: u32) -> OptionMetrics {
    OptionMetrics { risk, reward, realism }
}

fn record(
    scenario: &str,
    options: [&str; 3],
    consequences: [&str; 3],
    logic: [OptionMetrics; 3],
    event: Option<(&str, &str)>,
) -> ScenarioRecord {
    ScenarioRecord {
        scenario:     scenario.to_string(),
        options:      options.iter().map(|s| s.to_string()).collect(),
        consequences: consequences.iter().map(|s| s.to_string()).collect(),
        score_logic:  logic
            .into_iter()
            .enumerate()
            .map(|(i, m)| (option_key(i + 1), m))
            .collect(),
        event: event.map(|(description, impact)| ScenarioEvent {
            description: description.to_string(),
            impact:      impact.to_string(),
        }),
    }
}

/// The fixed record used when no AI provider is available.
/// Solar Leasing has its own; every other type gets the dairy record.
pub fn fallback_scenario(business_type: &str) -> ScenarioRecord {
    match business_type {
        "Solar Leasing" => record(
            "You've installed 10 solar panels and are leasing to 5 households at ₹1,200/month each. A village school wants to lease 10 more panels, but you'll need ₹150,000 for expansion. A government subsidy covers 40% if you apply within 30 days.",
            [
                "Take a bank loan for full ₹150,000 at 12% interest",
                "Apply for government subsidy, save ₹90,000, then expand",
                "Partner with another solar entrepreneur to share costs and profits",
            ],
            [
                "Immediate expansion, ₹12,000/month revenue, but ₹18,000 interest annually. High debt risk.",
                "Wait 45 days for subsidy approval, only ₹90,000 loan needed, ₹10,800/year interest. Delayed but safer.",
                "Expand within 30 days, split revenue 50-50 (₹6,000/month each), share responsibilities and risks.",
            ],
            [metrics(8, 8, 6), metrics(3, 7, 9), metrics(4, 6, 8)],
            None,
        ),
        _ => record(
            "Your dairy farm has been producing 40 liters of milk daily. A nearby cooperative offers to buy your entire production at ₹35/liter, but a new ice cream factory is willing to pay ₹45/liter if you can increase production to 60 liters daily. Your current setup needs investment to scale.",
            [
                "Accept the cooperative's stable offer and continue current production",
                "Invest ₹30,000 in 2 more cows and equipment to meet factory demand",
                "Split production: 40L to cooperative, invest slowly to scale for factory later",
            ],
            [
                "Steady income of ₹42,000/month but limited growth potential. Low risk, moderate reward.",
                "Potential ₹81,000/month if successful, but ₹30,000 upfront risk and 2-month ramp-up time.",
                "Balanced approach: ₹42,000/month now, gradual scaling. Medium risk, growing reward.",
            ],
            [metrics(2, 5, 9), metrics(8, 9, 7), metrics(4, 7, 8)],
            Some((
                "Monsoon forecast shows heavy rains next month which could affect fodder supply",
                "May need to purchase additional fodder at 30% higher cost",
            )),
        ),
    }
}

fn event_impact(event_type: &str) -> &'static str {
    match event_type {
        "weather" => "Weather may disrupt production and raise input costs this round",
        "market" => "Prices and demand may shift sharply this round",
        "operational" => "Day-to-day operations may slow down or cost more this round",
        "health" => "Output may fall until the health issue is resolved",
        _ => "Plan for some disruption this round",
    }
}

/// Roll each event group in order; the first group that fires picks
/// one of its events.
pub fn roll_dynamic_event(groups: &[DynamicEventGroup], rng: &mut GameRng) -> Option<ScenarioEvent> {
    for group in groups {
        if !rng.chance(group.probability) {
            continue;
        }
        if let Some(name) = rng.pick(&group.events) {
            return Some(ScenarioEvent {
                description: format!("{name} ({} event)", group.event_type),
                impact:      event_impact(&group.event_type).to_string(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::GameConfig, rng::RngSlot};

    #[test]
    fn fallbacks_satisfy_the_contract() {
        for ty in ["Dairy Farming", "Solar Leasing", "Retail Shop"] {
            fallback_scenario(ty).validate().unwrap();
        }
    }

    #[test]
    fn unmatched_type_gets_dairy_record() {
        assert_eq!(fallback_scenario("Fishing Business"), fallback_scenario("Dairy Farming"));
        assert!(fallback_scenario("Solar Leasing").event.is_none());
    }

    #[test]
    fn null_event_pair_parses_as_none() {
        let json = r#"{
            "scenario": "s", "options": ["a","b","c"], "consequences": ["x","y","z"],
            "score_logic": {"option_1": {"risk":1,"reward":2,"realism":3},
                            "option_2": {"risk":4}, "option_3": {}},
            "event": {"description": null, "impact": null}
        }"#;
        let rec: ScenarioRecord = serde_json::from_str(json).unwrap();
        assert!(rec.event.is_none());
        assert_eq!(rec.metrics(2), OptionMetrics { risk: 4, reward: 5, realism: 5 });
        assert_eq!(rec.metrics(3), OptionMetrics::default());
    }

    #[test]
    fn half_present_event_rejected() {
        let json = r#"{"scenario":"s","options":[],"consequences":[],"score_logic":{},
                       "event":{"description":"Storm","impact":null}}"#;
        assert!(serde_json::from_str::<ScenarioRecord>(json).is_err());
    }

    #[test]
    fn two_options_fail_validation() {
        let mut rec = fallback_scenario("Dairy Farming");
        rec.options.pop();
        assert!(rec.validate().is_err());
    }

    #[test]
    fn certain_event_group_always_fires() {
        let mut groups = GameConfig::default_test().dynamic_events;
        groups[0].probability = 1.0;
        let mut rng = GameRng::new(3, RngSlot::Events);
        let event = roll_dynamic_event(&groups, &mut rng).unwrap();
        assert!(event.description.ends_with("(weather event)"));
    }

    #[test]
    fn impossible_groups_never_fire() {
        let mut groups = GameConfig::default_test().dynamic_events;
        for g in &mut groups {
            g.probability = 0.0;
        }
        let mut rng = GameRng::new(3, RngSlot::Events);
        assert!((0..50).all(|_| roll_dynamic_event(&groups, &mut rng).is_none()));
    }
}
