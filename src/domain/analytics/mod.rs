//! Dashboard figures

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::conversation::{ConversationStatus, MessageDirection};
use crate::domain::property::PropertyStatus;
use crate::shared::DomainResult;

pub const DEFAULT_ACTIVITY_DAYS: u32 = 14;
pub const MAX_ACTIVITY_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub properties_by_status: Vec<(PropertyStatus, u64)>,
    pub total_properties: u64,
    pub conversations_by_status: Vec<(ConversationStatus, u64)>,
    pub new_conversations_today: u64,
    pub inbound_messages_today: u64,
    pub outbound_messages_today: u64,
    /// escalated / (active + escalated); 0 when there are none
    pub escalation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub new_conversations: u64,
    pub inbound_messages: u64,
    pub outbound_messages: u64,
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// One entry per status, zero counts included
    async fn properties_by_status(&self) -> DomainResult<Vec<(PropertyStatus, u64)>>;
    async fn conversations_by_status(&self) -> DomainResult<Vec<(ConversationStatus, u64)>>;
    /// Creation times of conversations started in `[since, until)`
    async fn conversation_start_times(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DomainResult<Vec<DateTime<Utc>>>;
    /// Timestamps and directions of messages sent in `[since, until)`
    async fn message_times(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DomainResult<Vec<(DateTime<Utc>, MessageDirection)>>;
}

/// Share of open conversations that are escalated
pub fn escalation_rate(by_status: &[(ConversationStatus, u64)]) -> f64 {
    let count = |wanted: ConversationStatus| {
        by_status
            .iter()
            .filter(|(status, _)| *status == wanted)
            .map(|(_, n)| *n)
            .sum::<u64>()
    };
    let escalated = count(ConversationStatus::Escalated);
    let open = escalated + count(ConversationStatus::Active);
    if open == 0 {
        0.0
    } else {
        escalated as f64 / open as f64
    }
}

/// Midnight UTC at the start of the window ending on `today`
pub fn window_start(today: NaiveDate, days: u32) -> DateTime<Utc> {
    let first = today - Duration::days(days.saturating_sub(1) as i64);
    first.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

/// Per-day counts for the `days` days ending on `today`, oldest first.
/// Days without activity are present with zero counts; events outside
/// the window are ignored.
pub fn bucket_daily(
    today: NaiveDate,
    days: u32,
    conversation_starts: &[DateTime<Utc>],
    messages: &[(DateTime<Utc>, MessageDirection)],
) -> Vec<DailyActivity> {
    let first = today - Duration::days(days.saturating_sub(1) as i64);
    let mut buckets: Vec<DailyActivity> = (0..days as i64)
        .map(|offset| DailyActivity {
            date: first + Duration::days(offset),
            new_conversations: 0,
            inbound_messages: 0,
            outbound_messages: 0,
        })
        .collect();

    let slot = |at: &DateTime<Utc>| -> Option<usize> {
        let index = (at.date_naive() - first).num_days();
        (0..days as i64).contains(&index).then_some(index as usize)
    };

    for at in conversation_starts {
        if let Some(i) = slot(at) {
            buckets[i].new_conversations += 1;
        }
    }
    for (at, direction) in messages {
        if let Some(i) = slot(at) {
            match direction {
                MessageDirection::Inbound => buckets[i].inbound_messages += 1,
                MessageDirection::Outbound => buckets[i].outbound_messages += 1,
            }
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn rate_is_zero_without_open_conversations() {
        assert_eq!(escalation_rate(&[]), 0.0);
        assert_eq!(escalation_rate(&[(ConversationStatus::Closed, 9)]), 0.0);
    }

    #[test]
    fn rate_ignores_closed_conversations() {
        let rate = escalation_rate(&[
            (ConversationStatus::Active, 3),
            (ConversationStatus::Escalated, 1),
            (ConversationStatus::Closed, 100),
        ]);
        assert!((rate - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn buckets_are_zero_filled_and_ordered() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let activity = bucket_daily(today, 3, &[], &[]);

        let dates: Vec<_> = activity.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2026-03-08", "2026-03-09", "2026-03-10"]);
        assert!(activity.iter().all(|d| d.new_conversations == 0
            && d.inbound_messages == 0
            && d.outbound_messages == 0));
    }

    #[test]
    fn events_land_in_their_day() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let activity = bucket_daily(
            today,
            3,
            &[at(2026, 3, 8, 9), at(2026, 3, 10, 23), at(2026, 3, 1, 12)],
            &[
                (at(2026, 3, 9, 10), MessageDirection::Inbound),
                (at(2026, 3, 9, 11), MessageDirection::Outbound),
                (at(2026, 3, 9, 12), MessageDirection::Inbound),
                (at(2026, 3, 11, 0), MessageDirection::Inbound),
            ],
        );

        assert_eq!(activity[0].new_conversations, 1);
        assert_eq!(activity[1].inbound_messages, 2);
        assert_eq!(activity[1].outbound_messages, 1);
        assert_eq!(activity[2].new_conversations, 1);
        assert_eq!(activity[2].inbound_messages, 0);
    }

    #[test]
    fn window_start_is_midnight_of_first_day() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(window_start(today, 14), at(2026, 2, 25, 0));
        assert_eq!(window_start(today, 1), at(2026, 3, 10, 0));
    }
}
