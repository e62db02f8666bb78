use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

use super::user_repository::user_model_to_domain;
use super::{conflict_or_db, search_term};
use crate::domain::{
    AppendedMessage, Conversation, ConversationFilter, ConversationInclude,
    ConversationRepository, ConversationStatus, ConversationView, Message, MessageDirection,
    MessageSender, NewMessage, StatusChange,
};
use crate::infrastructure::database::entities::{conversation, message, user};
use crate::infrastructure::database::listing::{
    apply_window, lookup_column, unsortable, SeaOrmListing, SortColumns,
};
use crate::shared::{
    paginate, Countable, DomainError, DomainResult, Fetchable, PageWindow, PaginatedResult,
    PaginationParams,
};

const SORT_COLUMNS: SortColumns<conversation::Entity> = &[
    ("last_message_at", conversation::Column::LastMessageAt),
    ("created_at", conversation::Column::CreatedAt),
    ("updated_at", conversation::Column::UpdatedAt),
];

const MESSAGE_SORT_COLUMNS: SortColumns<message::Entity> = &[
    ("created_at", message::Column::CreatedAt),
    ("id", message::Column::Id),
];

type ConversationRow = (conversation::Model, Option<user::Model>);

/// Conversation listing that can join the assigned agent
struct ConversationListing<'a> {
    db: &'a DatabaseConnection,
}

#[async_trait]
impl Countable<Condition> for ConversationListing<'_> {
    type Error = DbErr;

    async fn count(&self, filter: &Condition) -> Result<u64, DbErr> {
        conversation::Entity::find()
            .filter(filter.clone())
            .count(self.db)
            .await
    }
}

#[async_trait]
impl Fetchable<Condition, ConversationRow> for ConversationListing<'_> {
    type Include = ConversationInclude;

    fn is_sortable(&self, field: &str) -> bool {
        lookup_column::<conversation::Entity>(SORT_COLUMNS, field).is_some()
    }

    async fn fetch(
        &self,
        filter: &Condition,
        include: &ConversationInclude,
        window: &PageWindow,
    ) -> Result<Vec<ConversationRow>, DbErr> {
        let column = lookup_column::<conversation::Entity>(SORT_COLUMNS, &window.sort_by)
            .ok_or_else(|| unsortable(&window.sort_by))?;
        let query = conversation::Entity::find().filter(filter.clone());

        if include.agent {
            apply_window::<conversation::Entity, _>(query.find_also_related(user::Entity), column, window)
                .all(self.db)
                .await
        } else {
            let rows = apply_window::<conversation::Entity, _>(query, column, window)
                .all(self.db)
                .await?;
            Ok(rows.into_iter().map(|c| (c, None)).collect())
        }
    }
}

pub struct SeaOrmConversationRepository {
    db: DatabaseConnection,
}

impl SeaOrmConversationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn status_to_domain(s: conversation::ConversationStatus) -> ConversationStatus {
    match s {
        conversation::ConversationStatus::Active => ConversationStatus::Active,
        conversation::ConversationStatus::Escalated => ConversationStatus::Escalated,
        conversation::ConversationStatus::Closed => ConversationStatus::Closed,
    }
}

pub(crate) fn status_to_entity(s: ConversationStatus) -> conversation::ConversationStatus {
    match s {
        ConversationStatus::Active => conversation::ConversationStatus::Active,
        ConversationStatus::Escalated => conversation::ConversationStatus::Escalated,
        ConversationStatus::Closed => conversation::ConversationStatus::Closed,
    }
}

pub(crate) fn direction_to_domain(d: message::MessageDirection) -> MessageDirection {
    match d {
        message::MessageDirection::Inbound => MessageDirection::Inbound,
        message::MessageDirection::Outbound => MessageDirection::Outbound,
    }
}

fn direction_to_entity(d: MessageDirection) -> message::MessageDirection {
    match d {
        MessageDirection::Inbound => message::MessageDirection::Inbound,
        MessageDirection::Outbound => message::MessageDirection::Outbound,
    }
}

fn sender_to_domain(s: message::MessageSender) -> MessageSender {
    match s {
        message::MessageSender::Customer => MessageSender::Customer,
        message::MessageSender::Assistant => MessageSender::Assistant,
        message::MessageSender::Agent => MessageSender::Agent,
    }
}

fn sender_to_entity(s: MessageSender) -> message::MessageSender {
    match s {
        MessageSender::Customer => message::MessageSender::Customer,
        MessageSender::Assistant => message::MessageSender::Assistant,
        MessageSender::Agent => message::MessageSender::Agent,
    }
}

fn conversation_model_to_domain(m: conversation::Model) -> Conversation {
    Conversation {
        id: m.id,
        customer_phone: m.customer_phone,
        customer_name: m.customer_name,
        status: status_to_domain(m.status),
        assigned_agent_id: m.assigned_agent_id,
        escalation_reason: m.escalation_reason,
        escalated_at: m.escalated_at,
        interested_property_id: m.interested_property_id,
        last_message_at: m.last_message_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn row_to_view((c, agent): ConversationRow) -> ConversationView {
    ConversationView {
        conversation: conversation_model_to_domain(c),
        agent: agent.map(user_model_to_domain),
    }
}

fn message_model_to_domain(m: message::Model) -> Message {
    Message {
        id: m.id,
        conversation_id: m.conversation_id,
        direction: direction_to_domain(m.direction),
        sender: sender_to_domain(m.sender),
        agent_id: m.agent_id,
        body: m.body,
        whatsapp_message_id: m.whatsapp_message_id,
        created_at: m.created_at,
    }
}

/// Error for a guarded update that matched no row: the conversation is
/// gone, or another writer moved it out of the expected status.
async fn unmatched_update<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    target: ConversationStatus,
) -> DomainError {
    match conversation::Entity::find_by_id(id).one(conn).await {
        Ok(Some(current)) => DomainError::InvalidTransition(format!(
            "conversation {} is now {}; change to {} not applied",
            id,
            status_to_domain(current.status),
            target
        )),
        Ok(None) => DomainError::not_found("Conversation", "id", id),
        Err(e) => e.into(),
    }
}

fn filter_condition(filter: &ConversationFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(status) = filter.status {
        cond = cond.add(conversation::Column::Status.eq(status_to_entity(status)));
    }
    if let Some(agent_id) = &filter.assigned_agent_id {
        cond = cond.add(conversation::Column::AssignedAgentId.eq(agent_id.as_str()));
    }
    if let Some(search) = search_term(&filter.search) {
        cond = cond.add(
            Condition::any()
                .add(conversation::Column::CustomerPhone.contains(search))
                .add(conversation::Column::CustomerName.contains(search)),
        );
    }
    cond
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl ConversationRepository for SeaOrmConversationRepository {
    async fn create(
        &self,
        customer_phone: &str,
        customer_name: Option<String>,
    ) -> DomainResult<Conversation> {
        let now = Utc::now();
        let model = conversation::ActiveModel {
            customer_phone: Set(customer_phone.to_string()),
            customer_name: Set(customer_name),
            status: Set(conversation::ConversationStatus::Active),
            assigned_agent_id: Set(None),
            escalation_reason: Set(None),
            escalated_at: Set(None),
            interested_property_id: Set(None),
            last_message_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_or_db(e, "Conversation for this phone already exists"))?;

        info!("Conversation {} opened for {}", model.id, model.customer_phone);
        Ok(conversation_model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Conversation>> {
        let model = conversation::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(conversation_model_to_domain))
    }

    async fn find_by_phone(&self, customer_phone: &str) -> DomainResult<Option<Conversation>> {
        let model = conversation::Entity::find()
            .filter(conversation::Column::CustomerPhone.eq(customer_phone))
            .one(&self.db)
            .await?;
        Ok(model.map(conversation_model_to_domain))
    }

    async fn find_view(&self, id: i32) -> DomainResult<Option<ConversationView>> {
        let row = conversation::Entity::find_by_id(id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;
        Ok(row.map(row_to_view))
    }

    async fn list(
        &self,
        filter: &ConversationFilter,
        include: ConversationInclude,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<ConversationView>> {
        let listing = ConversationListing { db: &self.db };
        let page = paginate::<_, _, ConversationRow>(
            &listing,
            &filter_condition(filter),
            &include,
            params,
        )
        .await?;
        Ok(page.map(row_to_view))
    }

    async fn list_messages(
        &self,
        conversation_id: i32,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<Message>> {
        let listing = SeaOrmListing::<message::Entity>::new(&self.db, MESSAGE_SORT_COLUMNS);
        let filter = Condition::all().add(message::Column::ConversationId.eq(conversation_id));
        let page = paginate::<_, _, message::Model>(&listing, &filter, &(), params).await?;
        Ok(page.map(message_model_to_domain))
    }

    async fn apply_status(&self, change: &StatusChange) -> DomainResult<()> {
        let mut update = conversation::ActiveModel {
            status: Set(status_to_entity(change.status)),
            escalation_reason: Set(change.escalation_reason.clone()),
            escalated_at: Set(change.escalated_at),
            updated_at: Set(change.updated_at),
            ..Default::default()
        };
        if let Some(agent_id) = &change.assigned_agent_id {
            update.assigned_agent_id = Set(Some(agent_id.clone()));
        }

        let mut query = conversation::Entity::update_many()
            .set(update)
            .filter(conversation::Column::Id.eq(change.conversation_id));
        if let Some(expected) = change.expected {
            query = query.filter(conversation::Column::Status.eq(status_to_entity(expected)));
        }

        let result = query.exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(unmatched_update(&self.db, change.conversation_id, change.status).await);
        }
        debug!("Conversation {} is now {}", change.conversation_id, change.status);
        Ok(())
    }

    async fn assign(
        &self,
        id: i32,
        agent_id: Option<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let result = conversation::Entity::update_many()
            .set(conversation::ActiveModel {
                assigned_agent_id: Set(agent_id),
                updated_at: Set(at),
                ..Default::default()
            })
            .filter(conversation::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Conversation", "id", id));
        }
        Ok(())
    }

    async fn append_message(
        &self,
        conversation_id: i32,
        customer_name: Option<String>,
        new_message: NewMessage,
    ) -> DomainResult<AppendedMessage> {
        let at = new_message.created_at;
        let inbound = new_message.direction == MessageDirection::Inbound;
        let txn = self.db.begin().await?;

        if conversation::Entity::find_by_id(conversation_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("Conversation", "id", conversation_id));
        }

        let model = message::ActiveModel {
            conversation_id: Set(conversation_id),
            direction: Set(direction_to_entity(new_message.direction)),
            sender: Set(sender_to_entity(new_message.sender)),
            agent_id: Set(new_message.agent_id),
            body: Set(new_message.body),
            whatsapp_message_id: Set(new_message.whatsapp_message_id),
            created_at: Set(at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        conversation::Entity::update_many()
            .set(conversation::ActiveModel {
                updated_at: Set(at),
                ..Default::default()
            })
            .filter(conversation::Column::Id.eq(conversation_id))
            .exec(&txn)
            .await?;

        // Out-of-order deliveries must not move it backwards
        conversation::Entity::update_many()
            .set(conversation::ActiveModel {
                last_message_at: Set(Some(at)),
                ..Default::default()
            })
            .filter(conversation::Column::Id.eq(conversation_id))
            .filter(
                Condition::any()
                    .add(conversation::Column::LastMessageAt.is_null())
                    .add(conversation::Column::LastMessageAt.lt(at)),
            )
            .exec(&txn)
            .await?;

        if let Some(name) = customer_name {
            conversation::Entity::update_many()
                .set(conversation::ActiveModel {
                    customer_name: Set(Some(name)),
                    ..Default::default()
                })
                .filter(conversation::Column::Id.eq(conversation_id))
                .filter(conversation::Column::CustomerName.is_null())
                .exec(&txn)
                .await?;
        }

        let reopened = if inbound {
            conversation::Entity::update_many()
                .set(conversation::ActiveModel {
                    status: Set(conversation::ConversationStatus::Active),
                    ..Default::default()
                })
                .filter(conversation::Column::Id.eq(conversation_id))
                .filter(conversation::Column::Status.eq(conversation::ConversationStatus::Closed))
                .exec(&txn)
                .await?
                .rows_affected
                == 1
        } else {
            false
        };

        txn.commit().await?;
        Ok(AppendedMessage {
            message: message_model_to_domain(model),
            reopened,
        })
    }
}
