use crate::storage::entity::summary::{
    self, ActiveModel as SummaryActiveModel, Entity as Summary, Model as SummaryModel,
};
use crate::storage::repository::sector_repo::SectorKind;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};

pub struct SummaryRepository;

impl SummaryRepository {
    pub async fn upsert<C: ConnectionTrait>(
        conn: &C,
        dataset_id: i32,
        kind: SectorKind,
        sector_id: i32,
        document: String,
    ) -> Result<SummaryModel, DbErr> {
        let existing = Summary::find()
            .filter(summary::Column::DatasetId.eq(dataset_id))
            .filter(summary::Column::SectorKind.eq(kind.as_str()))
            .filter(summary::Column::SectorId.eq(sector_id))
            .one(conn)
            .await?;

        match existing {
            Some(model) => {
                let mut update: SummaryActiveModel = model.into();
                update.summary = Set(document);
                update.update(conn).await
            }
            None => {
                let insert = SummaryActiveModel {
                    dataset_id: Set(dataset_id),
                    sector_kind: Set(kind.as_str().to_string()),
                    sector_id: Set(sector_id),
                    summary: Set(document),
                    ..Default::default()
                };
                insert.insert(conn).await
            }
        }
    }

    pub async fn for_dataset<C: ConnectionTrait>(
        conn: &C,
        dataset_id: i32,
    ) -> Result<Vec<SummaryModel>, DbErr> {
        Summary::find()
            .filter(summary::Column::DatasetId.eq(dataset_id))
            .all(conn)
            .await
    }
}
