//! Business lifecycle: creation from the setup form and the
//! record-a-decision transition.
//!
//! States: active -> completed. Each recorded decision advances the
//! round by one; reaching the configured maximum completes the business.
//! Nothing leaves `completed`.

use crate::{
    config::{GameConfig, GameSettings},
    error::{GameResult, ValidationError},
    scenario::OptionMetrics,
    scoring::{insights, FeedbackTier, Insight, Scorer},
    store::{Business, BusinessAnalytics, BusinessStatus, EmploymentMode, GameDocument, ScenarioResult},
    types::{BusinessId, Money, ScenarioResultId, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};

pub const INVESTMENT_PRIORITIES: [&str; 5] = [
    "Expand Resources",
    "Marketing",
    "Equipment Upgrade",
    "Working Capital",
    "Staff Training",
];

pub const TIMELINES: [&str; 4] = ["3 months", "6 months", "1 year", "2 years"];

pub const REVENUE_GOAL_MIN: Money = 10_000;
pub const REVENUE_GOAL_MAX: Money = 1_000_000;

fn default_priorities() -> Vec<String> {
    vec!["Working Capital".to_string()]
}

fn default_revenue_goal() -> Money {
    50_000
}

fn default_timeline() -> String {
    TIMELINES[0].to_string()
}

/// The business setup form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSetup {
    pub business_type:         String,
    pub location:              String,
    pub employment_mode:       EmploymentMode,
    #[serde(default)]
    pub additional_investment: Money,
    #[serde(default = "default_priorities")]
    pub investment_priorities: Vec<String>,
    #[serde(default = "default_revenue_goal")]
    pub revenue_goal:          Money,
    #[serde(default = "default_timeline")]
    pub timeline:              String,
}

impl BusinessSetup {
    /// A setup with the form's defaults.
    pub fn new(business_type: &str, location: &str, employment_mode: EmploymentMode) -> Self {
        Self {
            business_type:         business_type.to_string(),
            location:              location.to_string(),
            employment_mode,
            additional_investment: 0,
            investment_priorities: default_priorities(),
            revenue_goal:          default_revenue_goal(),
            timeline:              default_timeline(),
        }
    }
}

/// Validate `setup` and build the new business. Capital is the catalog
/// base capital plus the additional investment.
pub fn new_business(
    config: &GameConfig,
    user_id: &UserId,
    setup: BusinessSetup,
    language: &str,
    at: Timestamp,
) -> GameResult<Business> {
    let catalog = config
        .business_type(&setup.business_type)
        .ok_or_else(|| ValidationError::UnknownBusinessType(setup.business_type.clone()))?;
    let location = setup.location.trim();
    if location.is_empty() {
        return Err(ValidationError::MissingField { field: "location" }.into());
    }
    let max_investment = config.game.max_additional_investment;
    if !(0..=max_investment).contains(&setup.additional_investment) {
        return Err(ValidationError::OutOfRange {
            field: "additional_investment",
            min:   0,
            max:   max_investment,
            value: setup.additional_investment,
        }
        .into());
    }
    if !(REVENUE_GOAL_MIN..=REVENUE_GOAL_MAX).contains(&setup.revenue_goal) {
        return Err(ValidationError::OutOfRange {
            field: "revenue_goal",
            min:   REVENUE_GOAL_MIN,
            max:   REVENUE_GOAL_MAX,
            value: setup.revenue_goal,
        }
        .into());
    }
    if let Some(p) = setup
        .investment_priorities
        .iter()
        .find(|p| !INVESTMENT_PRIORITIES.contains(&p.as_str()))
    {
        return Err(ValidationError::InvalidChoice {
            field: "investment priority",
            value: p.clone(),
        }
        .into());
    }
    if !TIMELINES.contains(&setup.timeline.as_str()) {
        return Err(ValidationError::InvalidChoice {
            field: "timeline",
            value: setup.timeline,
        }
        .into());
    }

    Ok(Business {
        business_id:           BusinessId::new(),
        user_id:               user_id.clone(),
        business_type:         setup.business_type,
        location:              location.to_string(),
        employment_mode:       setup.employment_mode,
        capital:               catalog.initial_capital + setup.additional_investment,
        resources:             catalog.initial_resources.clone(),
        current_round:         1,
        total_score:           0,
        status:                BusinessStatus::Active,
        additional_investment: setup.additional_investment,
        investment_priorities: setup.investment_priorities,
        revenue_goal:          setup.revenue_goal,
        timeline:              setup.timeline,
        language:              language.to_string(),
        created_at:            at,
        updated_at:            None,
    })
}

/// One chosen option, ready to be scored and recorded.
#[derive(Debug, Clone)]
pub struct Decision {
    pub business_id: BusinessId,
    /// 1-based.
    pub option:      usize,
    pub metrics:     OptionMetrics,
    pub scenario:    String,
    pub option_text: String,
    pub consequence: Option<String>,
}

/// Everything a decision changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub result_id:     ScenarioResultId,
    /// The round the decision was made in.
    pub round:         u32,
    pub score:         u32,
    pub tier:          FeedbackTier,
    pub feedback:      String,
    pub insights:      Vec<Insight>,
    pub consequence:   Option<String>,
    pub current_round: u32,
    pub total_score:   i64,
    pub status:        BusinessStatus,
    /// Present once the business has completed.
    pub final_report:  Option<BusinessAnalytics>,
}

/// Score `decision` and apply every consequence in one document
/// mutation: result log, round and score on the business, the owner's
/// cumulative score, and a leaderboard entry. Insights are attached
/// only when `settings.enable_hints` is on.
pub fn record_decision(
    doc: &mut GameDocument,
    scorer: &Scorer,
    settings: &GameSettings,
    decision: Decision,
    at: Timestamp,
) -> GameResult<DecisionOutcome> {
    let business = doc.business(&decision.business_id)?;
    if !business.is_active() {
        return Err(ValidationError::BusinessCompleted(decision.business_id.clone()).into());
    }
    let round = business.current_round;
    let user_id = business.user_id.clone();
    let business_type = business.business_type.clone();

    let m = decision.metrics;
    let score = scorer.score(m.risk, m.reward, m.realism);
    let tier = scorer.classify(score);

    let result_id = doc.insert_scenario_result(ScenarioResult {
        result_id:       ScenarioResultId::new(),
        business_id:     decision.business_id.clone(),
        round,
        option_selected: decision.option,
        score,
        risk:            m.risk,
        reward:          m.reward,
        realism:         m.realism,
        scenario:        decision.scenario,
        option_text:     decision.option_text.clone(),
        timestamp:       at,
    });

    let business = doc.business_mut(&decision.business_id)?;
    business.current_round += 1;
    business.total_score += score as i64;
    if business.current_round >= settings.max_rounds {
        business.status = BusinessStatus::Completed;
    }
    let (current_round, total_score, status) =
        (business.current_round, business.total_score, business.status);

    if doc.users.contains_key(&user_id) {
        doc.add_user_score(&user_id, score as i64)?;
    } else {
        log::warn!("business {} has no owner {user_id}; user score not updated", decision.business_id);
    }
    doc.push_leaderboard(&user_id, score as i64, &business_type, at);

    let final_report = (status == BusinessStatus::Completed)
        .then(|| doc.business_analytics(&decision.business_id));

    log::info!(
        "business={} round={round} option={} score={score} tier={tier:?} status={status:?}",
        decision.business_id,
        decision.option
    );

    Ok(DecisionOutcome {
        result_id,
        round,
        score,
        tier,
        feedback: tier.message().to_string(),
        insights: if settings.enable_hints { insights(m.risk, m.reward, m.realism) } else { Vec::new() },
        consequence: decision.consequence,
        current_round,
        total_score,
        status,
        final_report,
    })
}
