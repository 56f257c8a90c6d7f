use crate::storage::entity::{city, county, district};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    Set,
};

/// The three geographic groupings a summary can be aggregated over. A
/// school's membership in a sector is its city/county/district column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectorKind {
    City,
    County,
    District,
}

impl SectorKind {
    pub const ALL: [SectorKind; 3] = [SectorKind::City, SectorKind::County, SectorKind::District];

    pub fn as_str(self) -> &'static str {
        match self {
            SectorKind::City => "city",
            SectorKind::County => "county",
            SectorKind::District => "district",
        }
    }
}

impl std::fmt::Display for SectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct SectorRepository;

impl SectorRepository {
    /// City dedup is the full validated field set, which for a city is its
    /// name.
    pub async fn get_or_create_city<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<(city::Model, bool), DbErr> {
        if let Some(existing) = city::Entity::find()
            .filter(city::Column::Name.eq(name))
            .one(conn)
            .await?
        {
            return Ok((existing, false));
        }
        let model = city::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok((model, true))
    }

    pub async fn get_or_create_county<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<(county::Model, bool), DbErr> {
        if let Some(existing) = county::Entity::find()
            .filter(county::Column::Name.eq(name))
            .one(conn)
            .await?
        {
            return Ok((existing, false));
        }
        let model = county::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok((model, true))
    }

    pub async fn get_or_create_district<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<(district::Model, bool), DbErr> {
        if let Some(existing) = district::Entity::find()
            .filter(district::Column::Name.eq(name))
            .one(conn)
            .await?
        {
            return Ok((existing, false));
        }
        let model = district::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok((model, true))
    }

    /// Ids of every sector instance of one kind, for the summary cache sweep.
    pub async fn sector_ids<C: ConnectionTrait>(
        conn: &C,
        kind: SectorKind,
    ) -> Result<Vec<i32>, DbErr> {
        match kind {
            SectorKind::City => {
                city::Entity::find()
                    .select_only()
                    .column(city::Column::Id)
                    .into_tuple::<i32>()
                    .all(conn)
                    .await
            }
            SectorKind::County => {
                county::Entity::find()
                    .select_only()
                    .column(county::Column::Id)
                    .into_tuple::<i32>()
                    .all(conn)
                    .await
            }
            SectorKind::District => {
                district::Entity::find()
                    .select_only()
                    .column(district::Column::Id)
                    .into_tuple::<i32>()
                    .all(conn)
                    .await
            }
        }
    }
}
