use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cached descriptive statistics for one (dataset, sector) pair. The sector
/// reference is polymorphic: `sector_kind` names the table the id points into.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "summaries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    /// "city" | "county" | "district"
    pub sector_kind: String,
    pub sector_id: i32,
    /// JSON document: group label -> metric -> statistic -> value.
    pub summary: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::dataset::Entity",
        from = "Column::DatasetId",
        to = "super::dataset::Column::Id"
    )]
    Dataset,
}

impl Related<super::dataset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dataset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
