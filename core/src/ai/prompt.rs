use super::BusinessContext;

/// Render the scenario-generation prompt for one round.
pub fn scenario_prompt(ctx: &BusinessContext) -> String {
    let resources = serde_json::to_string(&ctx.resources).unwrap_or_else(|_| "{}".into());
    format!(
        r#"
Create a realistic business simulation scenario for a student running a {business_type} in {location}.

Business Context:
- Capital: ₹{capital}
- Resources: {resources}
- Employment: {employment_mode}
- Current Round: {round}

Generate a scenario that includes:
1. A clear situation description (2-3 sentences)
2. Three decision options with different risk-reward profiles
3. Realistic consequences for each option
4. Score metrics (risk: 0-10, reward: 0-10, realism: 0-10)
5. Optional dynamic event that could occur

Make it educational, engaging, and reflective of real rural business challenges.

Return ONLY a valid JSON object with this exact structure:
{{
  "scenario": "scenario description",
  "options": ["option 1", "option 2", "option 3"],
  "consequences": ["consequence 1", "consequence 2", "consequence 3"],
  "score_logic": {{
    "option_1": {{"risk": X, "reward": Y, "realism": Z}},
    "option_2": {{"risk": X, "reward": Y, "realism": Z}},
    "option_3": {{"risk": X, "reward": Y, "realism": Z}}
  }},
  "event": {{
    "description": "optional event description or null",
    "impact": "impact description or null"
  }}
}}
"#,
        business_type = ctx.business_type,
        location = ctx.location,
        capital = ctx.capital,
        employment_mode = ctx.employment_mode,
        round = ctx.round,
    )
}

pub fn translation_prompt(text: &str, language: &str) -> String {
    format!(
        r#"
Translate the following business scenario text from English to {language}.
Keep business terms clear and culturally appropriate.

Text to translate:
{text}

Return only the translated text, no explanations.
"#
    )
}
