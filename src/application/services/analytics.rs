//! Dashboard analytics

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::analytics::{
    bucket_daily, escalation_rate, window_start, DEFAULT_ACTIVITY_DAYS, MAX_ACTIVITY_DAYS,
};
use crate::domain::{
    DailyActivity, DomainError, DomainResult, MessageDirection, RepositoryProvider, Summary,
};

pub struct AnalyticsService {
    repos: Arc<dyn RepositoryProvider>,
}

impl AnalyticsService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn summary(&self) -> DomainResult<Summary> {
        self.summary_at(Utc::now()).await
    }

    /// Summary with "today" taken as the UTC day of `now`
    pub async fn summary_at(&self, now: DateTime<Utc>) -> DomainResult<Summary> {
        let analytics = self.repos.analytics();
        let start_of_day = window_start(now.date_naive(), 1);
        let end_of_day = start_of_day + Duration::days(1);

        let (properties_by_status, conversations_by_status, starts, messages) = tokio::try_join!(
            analytics.properties_by_status(),
            analytics.conversations_by_status(),
            analytics.conversation_start_times(start_of_day, end_of_day),
            analytics.message_times(start_of_day, end_of_day),
        )?;

        let inbound = messages
            .iter()
            .filter(|(_, d)| *d == MessageDirection::Inbound)
            .count() as u64;

        Ok(Summary {
            total_properties: properties_by_status.iter().map(|(_, n)| n).sum(),
            escalation_rate: escalation_rate(&conversations_by_status),
            properties_by_status,
            conversations_by_status,
            new_conversations_today: starts.len() as u64,
            inbound_messages_today: inbound,
            outbound_messages_today: messages.len() as u64 - inbound,
        })
    }

    /// Daily activity for the last `days` days (default 14, at most 90).
    pub async fn activity(&self, days: Option<u32>) -> DomainResult<Vec<DailyActivity>> {
        self.activity_at(days, Utc::now()).await
    }

    pub async fn activity_at(
        &self,
        days: Option<u32>,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<DailyActivity>> {
        let days = days.unwrap_or(DEFAULT_ACTIVITY_DAYS);
        if days == 0 || days > MAX_ACTIVITY_DAYS {
            return Err(DomainError::InvalidParameter(format!(
                "days must be between 1 and {}",
                MAX_ACTIVITY_DAYS
            )));
        }

        let today = now.date_naive();
        let since = window_start(today, days);
        let until = window_start(today, 1) + Duration::days(1);
        let analytics = self.repos.analytics();
        let (starts, messages) = tokio::try_join!(
            analytics.conversation_start_times(since, until),
            analytics.message_times(since, until),
        )?;

        Ok(bucket_daily(today, days, &starts, &messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::application::services::{ConversationService, IngestMessage};
    use crate::domain::{ConversationStatus, MessageSender};
    use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
    use crate::infrastructure::database::test_db;
    use crate::infrastructure::session::MemorySessionStore;

    fn message(phone: &str, direction: MessageDirection, at: DateTime<Utc>) -> IngestMessage {
        IngestMessage {
            customer_phone: phone.into(),
            customer_name: None,
            direction,
            sender: match direction {
                MessageDirection::Inbound => MessageSender::Customer,
                MessageDirection::Outbound => MessageSender::Assistant,
            },
            body: "hi".into(),
            whatsapp_message_id: None,
            sent_at: Some(at),
        }
    }

    #[tokio::test]
    async fn summary_counts_today_and_rate() {
        let repos = Arc::new(SeaOrmRepositoryProvider::new(test_db().await));
        let conversations =
            ConversationService::new(repos.clone(), Arc::new(MemorySessionStore::new()));
        let analytics = AnalyticsService::new(repos);

        let now = Utc::now();
        for phone in ["1", "2"] {
            conversations.ingest(message(phone, MessageDirection::Inbound, now)).await.unwrap();
        }
        conversations.ingest(message("1", MessageDirection::Outbound, now)).await.unwrap();
        let id = conversations
            .ingest(message("3", MessageDirection::Inbound, now))
            .await
            .unwrap()
            .conversation
            .id;
        conversations.escalate(id, "visit", None).await.unwrap();
        // Scheduled for later; not part of today
        conversations
            .ingest(message("1", MessageDirection::Inbound, now + Duration::days(2)))
            .await
            .unwrap();

        let summary = analytics.summary_at(now).await.unwrap();
        assert_eq!(summary.total_properties, 0);
        assert_eq!(summary.new_conversations_today, 3);
        assert_eq!(summary.inbound_messages_today, 3);
        assert_eq!(summary.outbound_messages_today, 1);
        assert!(summary
            .conversations_by_status
            .contains(&(ConversationStatus::Escalated, 1)));
        assert!((summary.escalation_rate - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn activity_window_is_validated_and_zero_filled() {
        let repos = Arc::new(SeaOrmRepositoryProvider::new(test_db().await));
        let analytics = AnalyticsService::new(repos);

        assert!(matches!(
            analytics.activity(Some(0)).await.unwrap_err(),
            DomainError::InvalidParameter(_)
        ));
        assert!(analytics.activity(Some(91)).await.is_err());

        let now = Utc::now();
        let days = analytics.activity_at(None, now).await.unwrap();
        assert_eq!(days.len(), DEFAULT_ACTIVITY_DAYS as usize);
        assert_eq!(days.last().map(|d| d.date), Some(now.date_naive()));
        assert_eq!(
            days.first().map(|d| d.date),
            Some(now.date_naive() - Duration::days(13))
        );
        assert!(days.iter().all(|d| d.inbound_messages == 0));
    }
}
