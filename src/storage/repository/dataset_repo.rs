use crate::storage::entity::dataset::{
    self, ActiveModel as DatasetActiveModel, Entity as Dataset, Model as DatasetModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

pub struct DatasetRepository;

impl DatasetRepository {
    pub async fn all<C: ConnectionTrait>(conn: &C) -> Result<Vec<DatasetModel>, DbErr> {
        Dataset::find()
            .order_by_asc(dataset::Column::Id)
            .all(conn)
            .await
    }

    pub async fn find_by_uid<C: ConnectionTrait>(
        conn: &C,
        uid: &str,
    ) -> Result<Option<DatasetModel>, DbErr> {
        Dataset::find()
            .filter(dataset::Column::Uid.eq(uid))
            .one(conn)
            .await
    }

    /// Datasets are registered out of band; this is the minimal registration
    /// path (empty fields_map, never sourced).
    pub async fn get_or_create<C: ConnectionTrait>(
        conn: &C,
        uid: &str,
    ) -> Result<(DatasetModel, bool), DbErr> {
        if let Some(existing) = Self::find_by_uid(conn, uid).await? {
            return Ok((existing, false));
        }

        let active_model = DatasetActiveModel {
            uid: Set(uid.to_string()),
            fields_map: Set("{}".to_string()),
            sourced: Set(false),
            queued_date: Set(Utc::now().timestamp()),
            ..Default::default()
        };
        Ok((active_model.insert(conn).await?, true))
    }

    pub async fn mark_sourced<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), DbErr> {
        let update = DatasetActiveModel {
            id: Set(id),
            sourced: Set(true),
            ..Default::default()
        };
        update.update(conn).await?;
        Ok(())
    }

    /// A newer release was published upstream: adopt its uid and put the
    /// dataset back in line for sourcing.
    pub async fn requeue<C: ConnectionTrait>(
        conn: &C,
        dataset: DatasetModel,
        new_uid: String,
    ) -> Result<DatasetModel, DbErr> {
        let mut update: DatasetActiveModel = dataset.into();
        update.uid = Set(new_uid);
        update.sourced = Set(false);
        update.queued_date = Set(Utc::now().timestamp());
        update.update(conn).await
    }
}
