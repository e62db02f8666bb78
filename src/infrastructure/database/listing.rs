//! SeaORM binding for [`paginate`](crate::shared::paginate)
//!
//! [`SeaOrmListing`] lists any entity given a filter [`Condition`] and a
//! whitelist mapping public sort names to columns. Rows are ordered by the
//! requested column and then by primary key, so equal sort values still
//! come back in a stable order.

use async_trait::async_trait;
use sea_orm::{
    Condition, DatabaseConnection, DbErr, EntityTrait, Iterable, Order, PaginatorTrait,
    PrimaryKeyToColumn, QueryFilter, QueryOrder, QuerySelect,
};

use crate::shared::{Countable, Fetchable, PageWindow, SortOrder};

/// Public sort name -> column
pub type SortColumns<E> = &'static [(&'static str, <E as EntityTrait>::Column)];

pub(crate) fn order_of(sort_order: SortOrder) -> Order {
    match sort_order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

pub(crate) fn lookup_column<E: EntityTrait>(columns: SortColumns<E>, field: &str) -> Option<E::Column> {
    columns
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
}

/// Apply sort, primary-key tiebreak, offset and limit for `E` to any select.
pub(crate) fn apply_window<E, Q>(query: Q, column: E::Column, window: &PageWindow) -> Q
where
    E: EntityTrait,
    Q: QueryOrder + QuerySelect,
{
    let mut query = query.order_by(column, order_of(window.sort_order));
    for key in E::PrimaryKey::iter() {
        query = query.order_by_asc(key.into_column());
    }
    query.offset(window.skip).limit(window.take)
}

pub(crate) fn unsortable(field: &str) -> DbErr {
    DbErr::Custom(format!("column '{}' is not sortable", field))
}

/// Paginated listing of one entity
pub struct SeaOrmListing<'a, E: EntityTrait> {
    db: &'a DatabaseConnection,
    columns: SortColumns<E>,
}

impl<'a, E: EntityTrait> SeaOrmListing<'a, E> {
    pub fn new(db: &'a DatabaseConnection, columns: SortColumns<E>) -> Self {
        Self { db, columns }
    }
}

#[async_trait]
impl<'a, E> Countable<Condition> for SeaOrmListing<'a, E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    type Error = DbErr;

    async fn count(&self, filter: &Condition) -> Result<u64, DbErr> {
        E::find().filter(filter.clone()).count(self.db).await
    }
}

#[async_trait]
impl<'a, E> Fetchable<Condition, E::Model> for SeaOrmListing<'a, E>
where
    E: EntityTrait,
    E::Model: Sync,
{
    type Include = ();

    fn is_sortable(&self, field: &str) -> bool {
        lookup_column::<E>(self.columns, field).is_some()
    }

    async fn fetch(
        &self,
        filter: &Condition,
        _include: &(),
        window: &PageWindow,
    ) -> Result<Vec<E::Model>, DbErr> {
        let column = lookup_column::<E>(self.columns, &window.sort_by)
            .ok_or_else(|| unsortable(&window.sort_by))?;
        apply_window::<E, _>(E::find().filter(filter.clone()), column, window)
            .all(self.db)
            .await
    }
}
