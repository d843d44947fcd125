//! Static game configuration: business catalog, scoring rules, auction
//! settings, game settings, dynamic events and AI providers.
//!
//! Production loads everything from the `data/` directory.
//! Tests use `GameConfig::default_test()`, which mirrors the shipped files.

use crate::{ai::ProviderKind, types::Money};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Business catalog ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessTypeConfig {
    pub name:              String,
    pub icon:              String,
    pub initial_capital:   Money,
    pub initial_resources: BTreeMap<String, ResourceValue>,
    pub revenue_model:     String,
}

/// A resource is either a counted quantity (cows, acres) or a list of
/// named equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceValue {
    Count(i64),
    Items(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
struct BusinessTypesFile {
    business_types: Vec<BusinessTypeConfig>,
}

// ── Scoring ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub risk:    f64,
    pub reward:  f64,
    pub realism: f64,
}

impl ScoringWeights {
    /// Weights expressed in hundredths, e.g. 0.3 -> 30.
    /// Largest-remainder rounding: the result sums to 100 whenever the
    /// weights sum to 1.0, e.g. 0.333/0.334/0.333 -> 33/34/33.
    pub fn hundredths(&self) -> (u32, u32, u32) {
        let scaled = [self.risk, self.reward, self.realism].map(|w| w.max(0.0) * 100.0);
        let mut whole = scaled.map(|x| x.floor() as u32);
        let short = 100u32.saturating_sub(whole.iter().sum());
        let mut by_remainder = [0usize, 1, 2];
        by_remainder.sort_by(|&a, &b| {
            (scaled[b] - scaled[b].floor()).total_cmp(&(scaled[a] - scaled[a].floor()))
        });
        for &i in by_remainder.iter().take(short as usize) {
            whole[i] += 1;
        }
        (whole[0], whole[1], whole[2])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub excellent: u32,
    pub good:      u32,
    pub average:   u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights:    ScoringWeights,
    pub thresholds: ScoreThresholds,
}

// ── Auctions ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionSettings {
    pub min_bid_increment:     Money,
    /// Lifetime of seeded sample listings.
    pub auction_duration_secs: u64,
    pub starting_price_factor: f64,
    pub categories:            Vec<String>,
    /// Durations a player may choose for their own listing.
    pub listing_durations_secs: Vec<u64>,
    pub min_market_value:      Money,
    pub max_market_value:      Money,
    pub min_starting_price:    Money,
    /// Sample listings are seeded while fewer than this many are active.
    pub min_active_listings:   usize,
    pub sample_categories:     Vec<String>,
    /// Return a displaced highest bidder's hold to their business.
    #[serde(default = "default_true")]
    pub refund_outbid:         bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionItem {
    pub name:        String,
    pub base_price:  Money,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AuctionConfigFile {
    settings: AuctionSettings,
    items:    BTreeMap<String, Vec<AuctionItem>>,
}

// ── Game settings ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSettings {
    pub max_rounds:                u32,
    /// Attach advisory insights to each scored decision.
    pub enable_hints:              bool,
    pub max_additional_investment: Money,
    pub base_language:             String,
    /// Display name -> language code.
    pub languages:                 BTreeMap<String, String>,
    pub admin_password:            String,
    pub enable_dynamic_events:     bool,
    pub default_location:          String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicEventGroup {
    pub event_type:  String,
    pub events:      Vec<String>,
    pub probability: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct DynamicEventsFile {
    events: Vec<DynamicEventGroup>,
}

// ── AI providers ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub model:        String,
    pub api_base:     String,
    pub env_key:      String,
    pub timeout_secs: u64,
    /// Model used for translation calls; falls back to `model`.
    #[serde(default)]
    pub translation_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub default_provider: ProviderKind,
    pub providers:        BTreeMap<ProviderKind, ProviderConfig>,
}

impl AiConfig {
    /// Config for `kind`, or the default provider's config when missing.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        self.providers
            .get(&kind)
            .or_else(|| self.providers.get(&self.default_provider))
    }
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub business_types: BTreeMap<String, BusinessTypeConfig>,
    pub scoring:        ScoringConfig,
    pub auction:        AuctionSettings,
    pub auction_items:  BTreeMap<String, Vec<AuctionItem>>,
    pub game:           GameSettings,
    pub dynamic_events: Vec<DynamicEventGroup>,
    pub ai:             AiConfig,
}

fn read_json<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
    serde_json::from_str(&content).map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))
}

fn default_true() -> bool {
    true
}

impl GameConfig {
    /// Load from the data/ directory.
    /// In tests, use GameConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let types: BusinessTypesFile =
            read_json(&format!("{data_dir}/business/business_types.json"))?;
        let business_types = types
            .business_types
            .into_iter()
            .map(|b| (b.name.clone(), b))
            .collect();

        let scoring: ScoringConfig = read_json(&format!("{data_dir}/scoring/scoring_rules.json"))?;

        let auction_file: AuctionConfigFile =
            read_json(&format!("{data_dir}/auction/auction_config.json"))?;

        let game: GameSettings = read_json(&format!("{data_dir}/game/game_settings.json"))?;

        let events: DynamicEventsFile =
            read_json(&format!("{data_dir}/events/dynamic_events.json"))?;

        let ai: AiConfig = read_json(&format!("{data_dir}/ai/providers.json"))?;

        let config = Self {
            business_types,
            scoring,
            auction: auction_file.settings,
            auction_items: auction_file.items,
            game,
            dynamic_events: events.events,
            ai,
        };
        config.validate()?;
        log::info!(
            "config: loaded {} business types, {} auction categories from {data_dir}",
            config.business_types.len(),
            config.auction_items.len()
        );
        Ok(config)
    }

    /// Reject configurations the scoring and auction rules cannot honour.
    pub fn validate(&self) -> anyhow::Result<()> {
        let w = self.scoring.weights;
        if w.risk < 0.0 || w.reward < 0.0 || w.realism < 0.0 {
            anyhow::bail!("scoring weights must be non-negative");
        }
        let sum = w.risk + w.reward + w.realism;
        if (sum - 1.0).abs() > 1e-6 {
            anyhow::bail!("scoring weights must sum to 1.0, got {sum}");
        }
        let t = self.scoring.thresholds;
        if !(t.excellent > t.good && t.good > t.average) {
            anyhow::bail!("score thresholds must strictly descend: {t:?}");
        }
        if t.excellent > 100 {
            anyhow::bail!("excellent threshold {} is above the maximum score", t.excellent);
        }
        let f = self.auction.starting_price_factor;
        if !(f > 0.0 && f <= 1.0) {
            anyhow::bail!("starting_price_factor must be in (0, 1], got {f}");
        }
        if self.auction.min_bid_increment <= 0 {
            anyhow::bail!("min_bid_increment must be positive");
        }
        if self.game.max_rounds == 0 {
            anyhow::bail!("max_rounds must be at least 1");
        }
        if self.business_types.is_empty() {
            anyhow::bail!("business catalog is empty");
        }
        if !self.game.languages.contains_key(&self.game.base_language) {
            anyhow::bail!("base language {} is not in the language table", self.game.base_language);
        }
        Ok(())
    }

    pub fn business_type(&self, name: &str) -> Option<&BusinessTypeConfig> {
        self.business_types.get(name)
    }

    /// Config with hardcoded defaults for use in unit tests.
    /// Matches the files shipped under data/.
    pub fn default_test() -> Self {
        let count = |n: i64| ResourceValue::Count(n);
        let items = |xs: &[&str]| ResourceValue::Items(xs.iter().map(|s| s.to_string()).collect());
        let biz = |name: &str,
                   icon: &str,
                   capital: Money,
                   resources: Vec<(&str, ResourceValue)>,
                   revenue_model: &str| BusinessTypeConfig {
            name: name.into(),
            icon: icon.into(),
            initial_capital: capital,
            initial_resources: resources
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            revenue_model: revenue_model.into(),
        };

        let business_types = vec![
            biz("Dairy Farming", "🐄", 50_000, vec![
                ("cows", count(5)),
                ("land_acres", count(2)),
                ("equipment", items(&["milking machine", "storage tanks"])),
            ], "daily_milk_sales"),
            biz("Solar Leasing", "☀️", 200_000, vec![
                ("solar_panels", count(10)),
                ("land_acres", count(1)),
                ("equipment", items(&["inverter", "battery storage"])),
            ], "monthly_lease"),
            biz("Fishing Business", "🎣", 80_000, vec![
                ("boats", count(2)),
                ("nets", count(5)),
                ("equipment", items(&["ice storage", "fish baskets"])),
            ], "catch_sales"),
            biz("Retail Shop", "🏪", 100_000, vec![
                ("shop_space", count(1)),
                ("inventory", count(50)),
                ("equipment", items(&["shelves", "billing system"])),
            ], "daily_sales"),
            biz("Poultry Farm", "🐔", 60_000, vec![
                ("chickens", count(100)),
                ("land_acres", count(1)),
                ("equipment", items(&["coops", "feeders", "incubator"])),
            ], "egg_meat_sales"),
            biz("Organic Farming", "🌱", 40_000, vec![
                ("land_acres", count(5)),
                ("seeds", count(100)),
                ("equipment", items(&["tractor", "irrigation system"])),
            ], "harvest_sales"),
        ]
        .into_iter()
        .map(|b| (b.name.clone(), b))
        .collect();

        let item = |name: &str, base_price: Money, description: &str| AuctionItem {
            name: name.into(),
            base_price,
            description: description.into(),
        };
        let auction_items = [
            ("livestock", vec![
                item("Dairy Cow", 35_000, "Healthy milking cow, 3 years old"),
                item("Goat", 8_000, "Breeding goat, 2 years old"),
                item("Chickens (10)", 2_000, "Layer chickens, 6 months old"),
                item("Buffalo", 50_000, "Strong buffalo for milk and farming"),
            ]),
            ("equipment", vec![
                item("Tractor (Used)", 150_000, "Working condition, 5 years old"),
                item("Irrigation Pump", 12_000, "Electric pump, 2HP"),
                item("Milking Machine", 25_000, "Automatic milking machine"),
                item("Solar Panel Set", 45_000, "500W solar panel with inverter"),
            ]),
            ("land", vec![
                item("1 Acre Farmland", 200_000, "Fertile land with water access"),
                item("0.5 Acre Plot", 100_000, "Near village center"),
                item("2 Acre Field", 350_000, "Suitable for crops"),
            ]),
            ("inventory", vec![
                item("50kg Seeds", 5_000, "Wheat/Rice seeds, quality assured"),
                item("Fertilizer (100kg)", 3_000, "Organic fertilizer"),
                item("Animal Feed (500kg)", 8_000, "Nutritious cattle feed"),
                item("Fishing Nets (5)", 6_000, "Professional fishing nets"),
            ]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let group = |event_type: &str, events: &[&str], probability: f64| DynamicEventGroup {
            event_type: event_type.into(),
            events: events.iter().map(|s| s.to_string()).collect(),
            probability,
        };

        let provider = |model: &str, api_base: &str, env_key: &str, timeout_secs: u64, translation_model: Option<&str>| {
            ProviderConfig {
                model: model.into(),
                api_base: api_base.into(),
                env_key: env_key.into(),
                timeout_secs,
                translation_model: translation_model.map(str::to_string),
            }
        };

        Self {
            business_types,
            scoring: ScoringConfig {
                weights: ScoringWeights { risk: 0.3, reward: 0.4, realism: 0.3 },
                thresholds: ScoreThresholds { excellent: 80, good: 60, average: 40 },
            },
            auction: AuctionSettings {
                min_bid_increment: 100,
                auction_duration_secs: 60,
                starting_price_factor: 0.7,
                categories: vec![
                    "livestock".into(),
                    "equipment".into(),
                    "land".into(),
                    "inventory".into(),
                ],
                listing_durations_secs: vec![60, 300, 600, 1800],
                min_market_value: 1_000,
                max_market_value: 1_000_000,
                min_starting_price: 500,
                min_active_listings: 3,
                sample_categories: vec![
                    "livestock".into(),
                    "equipment".into(),
                    "inventory".into(),
                ],
                refund_outbid: true,
            },
            auction_items,
            game: GameSettings {
                max_rounds: 10,
                enable_hints: true,
                max_additional_investment: 500_000,
                base_language: "English".into(),
                languages: [("English", "en"), ("Telugu", "te"), ("Hindi", "hi"), ("Tamil", "ta")]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                admin_password: "admin123".into(),
                enable_dynamic_events: false, // opt-in in tests; keeps scenarios fixed
                default_location: "Peerancheru Village".into(),
            },
            dynamic_events: vec![
                group("weather", &["Heavy Rain", "Drought", "Storm", "Flood"], 0.2),
                group("market", &["Price Drop", "Demand Surge", "Competition Increase", "Festival Season"], 0.3),
                group("operational", &["Equipment Breakdown", "Worker Absence", "Supply Shortage", "Quality Issue"], 0.25),
                group("health", &["Livestock Illness", "Crop Disease", "Personal Illness"], 0.15),
            ],
            ai: AiConfig {
                default_provider: ProviderKind::HuggingFace,
                providers: [
                    (ProviderKind::OpenAi, provider(
                        "gpt-4", "https://api.openai.com/v1", "OPENAI_API_KEY", 30, Some("gpt-3.5-turbo"),
                    )),
                    (ProviderKind::HuggingFace, provider(
                        "google/flan-t5-base", "https://api-inference.huggingface.co/models",
                        "HUGGINGFACE_API_KEY", 60, None,
                    )),
                    (ProviderKind::Anthropic, provider(
                        "claude-3-sonnet-20240229", "https://api.anthropic.com/v1",
                        "ANTHROPIC_API_KEY", 30, None,
                    )),
                ]
                .into_iter()
                .collect(),
            },
        }
    }
}
