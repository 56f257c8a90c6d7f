use crate::storage::entity::record::{
    self, ActiveModel as RecordActiveModel, Entity as Record, Model as RecordModel,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

/// Validated observation fields for one entry. On update every field
/// overwrites the stored row; nothing is merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFields {
    pub reported: bool,
    pub up_to_date: Option<f64>,
    pub conditional: Option<f64>,
    pub pme: Option<f64>,
    pub pbe: Option<f64>,
    pub dtp: Option<f64>,
    pub polio: Option<f64>,
    pub mmr: Option<f64>,
    pub hib: Option<f64>,
    pub hepb: Option<f64>,
    pub vari: Option<f64>,
}

pub struct RecordRepository;

impl RecordRepository {
    pub async fn update_or_create<C: ConnectionTrait>(
        conn: &C,
        dataset_id: i32,
        school_id: i32,
        fields: &RecordFields,
    ) -> Result<RecordModel, DbErr> {
        let existing = Record::find()
            .filter(record::Column::DatasetId.eq(dataset_id))
            .filter(record::Column::SchoolId.eq(school_id))
            .one(conn)
            .await?;

        match existing {
            Some(model) => {
                let mut update: RecordActiveModel = model.into();
                Self::apply(&mut update, fields);
                update.update(conn).await
            }
            None => {
                let mut insert = RecordActiveModel {
                    dataset_id: Set(dataset_id),
                    school_id: Set(school_id),
                    ..Default::default()
                };
                Self::apply(&mut insert, fields);
                insert.insert(conn).await
            }
        }
    }

    fn apply(active_model: &mut RecordActiveModel, fields: &RecordFields) {
        active_model.reported = Set(fields.reported);
        active_model.up_to_date = Set(fields.up_to_date);
        active_model.conditional = Set(fields.conditional);
        active_model.pme = Set(fields.pme);
        active_model.pbe = Set(fields.pbe);
        active_model.dtp = Set(fields.dtp);
        active_model.polio = Set(fields.polio);
        active_model.mmr = Set(fields.mmr);
        active_model.hib = Set(fields.hib);
        active_model.hepb = Set(fields.hepb);
        active_model.vari = Set(fields.vari);
    }

    /// Records feeding a summary: this dataset, reported=true, school in the
    /// sector.
    pub async fn reported_for_dataset<C: ConnectionTrait>(
        conn: &C,
        dataset_id: i32,
        school_ids: &[i32],
    ) -> Result<Vec<RecordModel>, DbErr> {
        if school_ids.is_empty() {
            return Ok(Vec::new());
        }
        Record::find()
            .filter(record::Column::DatasetId.eq(dataset_id))
            .filter(record::Column::Reported.eq(true))
            .filter(record::Column::SchoolId.is_in(school_ids.iter().copied()))
            .all(conn)
            .await
    }

    pub async fn count_for_dataset<C: ConnectionTrait>(
        conn: &C,
        dataset_id: i32,
    ) -> Result<u64, DbErr> {
        use sea_orm::PaginatorTrait;
        Record::find()
            .filter(record::Column::DatasetId.eq(dataset_id))
            .count(conn)
            .await
    }
}
