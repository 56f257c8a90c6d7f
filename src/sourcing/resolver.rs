use crate::sourcing::fields::Entry;
use crate::sourcing::model::SourceError;
use crate::sourcing::validate;
use crate::storage::entity::dataset;
use crate::storage::repository::{RecordRepository, SchoolRepository, SectorRepository};
use sea_orm::ConnectionTrait;

/// Resolve one normalized entry into its entity cascade. City and county
/// must exist before the school, and the school before its record.
pub async fn resolve_entry<C: ConnectionTrait>(
    conn: &C,
    dataset: &dataset::Model,
    entry: &Entry,
) -> Result<(), SourceError> {
    let city_name = validate::city(entry)?;
    let (city, _) = SectorRepository::get_or_create_city(conn, &city_name).await?;

    let county_name = validate::county(entry)?;
    let (county, _) = SectorRepository::get_or_create_county(conn, &county_name).await?;

    let school_fields = validate::school(entry)?;
    let (school, _) =
        SchoolRepository::get_or_create(conn, &school_fields, city.id, county.id).await?;

    // District is optional: an entry that fails district validation still
    // produces a school and a record, just without the district relation.
    let school = match validate::district(entry) {
        Ok(district_name) => {
            let (district, _) = SectorRepository::get_or_create_district(conn, &district_name).await?;
            SchoolRepository::set_district(conn, school, district.id).await?
        }
        Err(_) => school,
    };

    let record_fields = validate::record(entry)?;
    RecordRepository::update_or_create(conn, dataset.id, school.id, &record_fields).await?;

    Ok(())
}
