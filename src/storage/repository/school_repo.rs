use crate::storage::entity::school::{
    self, ActiveModel as SchoolActiveModel, Entity as School, Model as SchoolModel,
};
use crate::storage::repository::sector_repo::SectorKind;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Validated creation fields for a school. `code` participates in the dedup
/// key; the rest are creation defaults only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolFields {
    pub code: String,
    pub name: String,
    pub public: bool,
}

pub struct SchoolRepository;

impl SchoolRepository {
    /// Lookup by (code, city, county); on miss, create with `fields` as
    /// defaults. An existing row's non-key fields are left as they are.
    pub async fn get_or_create<C: ConnectionTrait>(
        conn: &C,
        fields: &SchoolFields,
        city_id: i32,
        county_id: i32,
    ) -> Result<(SchoolModel, bool), DbErr> {
        if let Some(existing) = School::find()
            .filter(school::Column::Code.eq(fields.code.as_str()))
            .filter(school::Column::CityId.eq(city_id))
            .filter(school::Column::CountyId.eq(county_id))
            .one(conn)
            .await?
        {
            return Ok((existing, false));
        }

        let active_model = SchoolActiveModel {
            code: Set(fields.code.clone()),
            name: Set(fields.name.clone()),
            public: Set(fields.public),
            city_id: Set(city_id),
            county_id: Set(county_id),
            district_id: Set(None),
            ..Default::default()
        };
        Ok((active_model.insert(conn).await?, true))
    }

    pub async fn set_district<C: ConnectionTrait>(
        conn: &C,
        school: SchoolModel,
        district_id: i32,
    ) -> Result<SchoolModel, DbErr> {
        let mut update: SchoolActiveModel = school.into();
        update.district_id = Set(Some(district_id));
        update.update(conn).await
    }

    pub async fn ids_in_sector<C: ConnectionTrait>(
        conn: &C,
        kind: SectorKind,
        sector_id: i32,
    ) -> Result<Vec<i32>, DbErr> {
        let membership = match kind {
            SectorKind::City => school::Column::CityId,
            SectorKind::County => school::Column::CountyId,
            SectorKind::District => school::Column::DistrictId,
        };
        School::find()
            .select_only()
            .column(school::Column::Id)
            .filter(membership.eq(sector_id))
            .into_tuple::<i32>()
            .all(conn)
            .await
    }

    /// school id -> public flag, for partitioning summary groups.
    pub async fn public_flags<C: ConnectionTrait>(
        conn: &C,
        school_ids: &[i32],
    ) -> Result<HashMap<i32, bool>, DbErr> {
        let models = School::find()
            .filter(school::Column::Id.is_in(school_ids.iter().copied()))
            .all(conn)
            .await?;
        Ok(models.into_iter().map(|m| (m.id, m.public)).collect())
    }
}
