use super::{GameDocument, GameStore};
use crate::{
    config::ResourceValue,
    error::{GameError, GameResult},
    types::{new_id, now, BusinessId, Money, Timestamp, UserId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentMode {
    #[serde(rename = "Self-operated")]
    SelfOperated,
    #[serde(rename = "Hired Labor")]
    HiredLabor,
    #[serde(rename = "Mixed (Self + Hired)")]
    Mixed,
}

impl EmploymentMode {
    pub const ALL: [EmploymentMode; 3] = [Self::SelfOperated, Self::HiredLabor, Self::Mixed];

    pub fn label(&self) -> &'static str {
        match self {
            Self::SelfOperated => "Self-operated",
            Self::HiredLabor => "Hired Labor",
            Self::Mixed => "Mixed (Self + Hired)",
        }
    }
}

impl std::fmt::Display for EmploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    #[serde(default)]
    pub business_id:           BusinessId,
    pub user_id:               UserId,
    pub business_type:         String,
    pub location:              String,
    pub employment_mode:       EmploymentMode,
    #[serde(deserialize_with = "crate::types::de_money")]
    pub capital:               Money,
    pub resources:             BTreeMap<String, ResourceValue>,
    pub current_round:         u32,
    pub total_score:           i64,
    pub status:                BusinessStatus,
    #[serde(default)]
    pub additional_investment: Money,
    #[serde(default, alias = "investment_priority")]
    pub investment_priorities: Vec<String>,
    #[serde(default, deserialize_with = "crate::types::de_money")]
    pub revenue_goal:          Money,
    #[serde(default)]
    pub timeline:              String,
    #[serde(default)]
    pub language:              String,
    #[serde(deserialize_with = "crate::types::de_timestamp")]
    pub created_at:            Timestamp,
    #[serde(default, deserialize_with = "crate::types::de_opt_timestamp")]
    pub updated_at:            Option<Timestamp>,
}

impl Business {
    pub fn is_active(&self) -> bool {
        self.status == BusinessStatus::Active
    }
}

impl GameDocument {
    /// Insert a new business, assigning its id from `created_at`.
    pub fn insert_business(&mut self, mut business: Business) -> GameResult<BusinessId> {
        self.user(&business.user_id)?;
        let business_id = new_id("biz", business.created_at);
        business.business_id = business_id.clone();
        self.businesses.insert(business_id.clone(), business);
        Ok(business_id)
    }

    pub fn business(&self, business_id: &str) -> GameResult<&Business> {
        self.businesses
            .get(business_id)
            .ok_or_else(|| GameError::not_found("business", business_id))
    }

    /// Mutable access that stamps `updated_at`.
    pub fn business_mut(&mut self, business_id: &str) -> GameResult<&mut Business> {
        let business = self
            .businesses
            .get_mut(business_id)
            .ok_or_else(|| GameError::not_found("business", business_id))?;
        business.updated_at = Some(now());
        Ok(business)
    }
}

impl GameStore {
    pub fn create_business(&self, business: Business) -> GameResult<BusinessId> {
        let business_type = business.business_type.clone();
        let business_id = self.transact(|doc| doc.insert_business(business))?;
        log::info!("business: created {business_id} ({business_type})");
        Ok(business_id)
    }

    pub fn get_business(&self, business_id: &str) -> Option<Business> {
        self.view(|doc| doc.businesses.get(business_id).cloned())
    }

    pub fn update_business(
        &self,
        business_id: &str,
        f: impl FnOnce(&mut Business),
    ) -> GameResult<()> {
        self.transact(|doc| {
            f(doc.business_mut(business_id)?);
            Ok(())
        })
    }

    /// All businesses owned by `user_id`, oldest first.
    pub fn user_businesses(&self, user_id: &str) -> Vec<Business> {
        self.view(|doc| {
            let mut businesses: Vec<Business> = doc
                .businesses
                .values()
                .filter(|b| b.user_id == user_id)
                .cloned()
                .collect();
            businesses.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            businesses
        })
    }
}
