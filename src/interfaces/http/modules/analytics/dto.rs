//! Analytics API data transfer objects

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{DailyActivity, Summary};

/// Record count for one status value
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// Dashboard summary; "today" is the current UTC day
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSummary {
    pub total_properties: u64,
    /// Every property status, zero counts included
    pub properties_by_status: Vec<StatusCount>,
    /// Every conversation status, zero counts included
    pub conversations_by_status: Vec<StatusCount>,
    pub new_conversations_today: u64,
    pub inbound_messages_today: u64,
    pub outbound_messages_today: u64,
    /// Escalated share of open conversations, 0.0 to 1.0
    pub escalation_rate: f64,
}

impl From<Summary> for AnalyticsSummary {
    fn from(s: Summary) -> Self {
        Self {
            total_properties: s.total_properties,
            properties_by_status: s
                .properties_by_status
                .into_iter()
                .map(|(status, count)| StatusCount {
                    status: status.as_str().to_string(),
                    count,
                })
                .collect(),
            conversations_by_status: s
                .conversations_by_status
                .into_iter()
                .map(|(status, count)| StatusCount {
                    status: status.as_str().to_string(),
                    count,
                })
                .collect(),
            new_conversations_today: s.new_conversations_today,
            inbound_messages_today: s.inbound_messages_today,
            outbound_messages_today: s.outbound_messages_today,
            escalation_rate: s.escalation_rate,
        }
    }
}

/// Activity for one UTC day
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyActivityDto {
    pub date: NaiveDate,
    pub new_conversations: u64,
    pub inbound_messages: u64,
    pub outbound_messages: u64,
}

impl From<DailyActivity> for DailyActivityDto {
    fn from(d: DailyActivity) -> Self {
        Self {
            date: d.date,
            new_conversations: d.new_conversations,
            inbound_messages: d.inbound_messages,
            outbound_messages: d.outbound_messages,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityParams {
    /// Days to cover, including today (1-90, default 14)
    pub days: Option<u32>,
}
