use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One (dataset, school) immunization observation. Re-sourcing a dataset
/// overwrites the row for the same school instead of duplicating it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    pub school_id: i32,
    /// Whether the school actually reported for this dataset cycle.
    pub reported: bool,

    #[sea_orm(nullable)]
    pub up_to_date: Option<f64>,
    #[sea_orm(nullable)]
    pub conditional: Option<f64>,
    #[sea_orm(nullable)]
    pub pme: Option<f64>,
    #[sea_orm(nullable)]
    pub pbe: Option<f64>,
    #[sea_orm(nullable)]
    pub dtp: Option<f64>,
    #[sea_orm(nullable)]
    pub polio: Option<f64>,
    #[sea_orm(nullable)]
    pub mmr: Option<f64>,
    #[sea_orm(nullable)]
    pub hib: Option<f64>,
    #[sea_orm(nullable)]
    pub hepb: Option<f64>,
    #[sea_orm(nullable)]
    pub vari: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dataset::Entity",
        from = "Column::DatasetId",
        to = "super::dataset::Column::Id"
    )]
    Dataset,
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,
}

impl Related<super::dataset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dataset.def()
    }
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
