use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use super::conversation_repository::{
    direction_to_domain, status_to_entity as conversation_status_to_entity,
};
use super::property_repository::status_to_entity as property_status_to_entity;
use crate::domain::{AnalyticsRepository, ConversationStatus, MessageDirection, PropertyStatus};
use crate::infrastructure::database::entities::{conversation, message, property};
use crate::shared::DomainResult;

/// Read-only queries behind the dashboard
pub struct SeaOrmAnalyticsRepository {
    db: DatabaseConnection,
}

impl SeaOrmAnalyticsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// One entry per domain status, in declaration order; statuses missing
/// from the grouped rows count zero.
fn zero_filled<D: Copy, R: PartialEq>(
    all: &[D],
    rows: &[(R, i64)],
    to_entity: impl Fn(&D) -> R,
) -> Vec<(D, u64)> {
    all.iter()
        .map(|status| {
            let wanted = to_entity(status);
            let n = rows
                .iter()
                .find(|(row, _)| *row == wanted)
                .map_or(0, |(_, n)| *n as u64);
            (*status, n)
        })
        .collect()
}

#[async_trait]
impl AnalyticsRepository for SeaOrmAnalyticsRepository {
    async fn properties_by_status(&self) -> DomainResult<Vec<(PropertyStatus, u64)>> {
        let rows = property::Entity::find()
            .select_only()
            .column(property::Column::Status)
            .column_as(property::Column::Id.count(), "count")
            .group_by(property::Column::Status)
            .into_tuple::<(property::PropertyStatus, i64)>()
            .all(&self.db)
            .await?;
        Ok(zero_filled(PropertyStatus::ALL, &rows, |s| property_status_to_entity(*s)))
    }

    async fn conversations_by_status(&self) -> DomainResult<Vec<(ConversationStatus, u64)>> {
        let rows = conversation::Entity::find()
            .select_only()
            .column(conversation::Column::Status)
            .column_as(conversation::Column::Id.count(), "count")
            .group_by(conversation::Column::Status)
            .into_tuple::<(conversation::ConversationStatus, i64)>()
            .all(&self.db)
            .await?;
        Ok(zero_filled(ConversationStatus::ALL, &rows, |s| {
            conversation_status_to_entity(*s)
        }))
    }

    async fn conversation_start_times(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DomainResult<Vec<DateTime<Utc>>> {
        let times = conversation::Entity::find()
            .select_only()
            .column(conversation::Column::CreatedAt)
            .filter(conversation::Column::CreatedAt.gte(since))
            .filter(conversation::Column::CreatedAt.lt(until))
            .into_tuple::<DateTime<Utc>>()
            .all(&self.db)
            .await?;
        Ok(times)
    }

    async fn message_times(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DomainResult<Vec<(DateTime<Utc>, MessageDirection)>> {
        let rows = message::Entity::find()
            .select_only()
            .column(message::Column::CreatedAt)
            .column(message::Column::Direction)
            .filter(message::Column::CreatedAt.gte(since))
            .filter(message::Column::CreatedAt.lt(until))
            .into_tuple::<(DateTime<Utc>, message::MessageDirection)>()
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(at, direction)| (at, direction_to_domain(direction)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::domain::{
        ConversationRepository, MessageSender, NewMessage, NewProperty, PropertyRepository,
    };
    use crate::domain::{ListingType, PropertyType};
    use crate::infrastructure::database::repositories::{
        SeaOrmConversationRepository, SeaOrmPropertyRepository,
    };
    use crate::infrastructure::database::test_db;

    #[tokio::test]
    async fn status_counts_include_zeros() {
        let db = test_db().await;
        let properties = SeaOrmPropertyRepository::new(db.clone());
        for title in ["A", "B"] {
            properties
                .create(NewProperty {
                    title: title.into(),
                    description: None,
                    property_type: PropertyType::House,
                    listing_type: ListingType::Sale,
                    status: PropertyStatus::Available,
                    price: 250_000,
                    currency: "EUR".into(),
                    bedrooms: None,
                    bathrooms: None,
                    area_sqm: None,
                    city: "Valencia".into(),
                    address: None,
                    agent_id: None,
                })
                .await
                .unwrap();
        }

        let repo = SeaOrmAnalyticsRepository::new(db.clone());
        let counts = repo.properties_by_status().await.unwrap();
        assert_eq!(counts.len(), PropertyStatus::ALL.len());
        assert!(counts.contains(&(PropertyStatus::Available, 2)));
        assert!(counts.contains(&(PropertyStatus::Sold, 0)));

        let counts = repo.conversations_by_status().await.unwrap();
        assert!(counts.iter().all(|(_, n)| *n == 0));

        let conversations = SeaOrmConversationRepository::new(db);
        for phone in ["1", "2", "3"] {
            let mut c = conversations.create(phone, None).await.unwrap();
            if phone == "2" {
                let change = c.escalate("visit".into(), None, Utc::now()).unwrap();
                conversations.apply_status(&change).await.unwrap();
            }
        }
        let counts = repo.conversations_by_status().await.unwrap();
        assert_eq!(
            counts,
            vec![
                (ConversationStatus::Active, 2),
                (ConversationStatus::Escalated, 1),
                (ConversationStatus::Closed, 0),
            ]
        );
    }

    #[tokio::test]
    async fn message_times_respect_window() {
        let db = test_db().await;
        let conversations = SeaOrmConversationRepository::new(db.clone());
        let c = conversations.create("34600111222", None).await.unwrap();

        let now = Utc::now();
        for (at, direction, sender) in [
            (now - Duration::days(10), MessageDirection::Inbound, MessageSender::Customer),
            (now + Duration::days(3), MessageDirection::Inbound, MessageSender::Customer),
            (now, MessageDirection::Inbound, MessageSender::Customer),
            (now, MessageDirection::Outbound, MessageSender::Assistant),
        ] {
            conversations
                .append_message(
                    c.id,
                    None,
                    NewMessage {
                        direction,
                        sender,
                        agent_id: None,
                        body: "hi".into(),
                        whatsapp_message_id: None,
                        created_at: at,
                    },
                )
                .await
                .unwrap();
        }

        let repo = SeaOrmAnalyticsRepository::new(db);
        let since = now - Duration::days(1);
        let until = now + Duration::days(1);
        let times = repo.message_times(since, until).await.unwrap();
        assert_eq!(times.len(), 2);
        assert!(times.iter().any(|(_, d)| *d == MessageDirection::Outbound));

        let starts = repo.conversation_start_times(since, until).await.unwrap();
        assert_eq!(starts.len(), 1);
        let later = repo
            .conversation_start_times(until, until + Duration::days(1))
            .await
            .unwrap();
        assert!(later.is_empty());
    }
}
