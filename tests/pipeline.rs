use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde_json::{json, Value};
use shotsdb::portal::{DataPortal, PortalError, RawEntry};
use shotsdb::sourcing::SourcingService;
use shotsdb::storage::entity::{city, county, dataset, district, record, school, summary};
use shotsdb::storage::establish_connection;
use shotsdb::storage::repository::DatasetRepository;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static DB_SEQ: AtomicUsize = AtomicUsize::new(0);

/// A portal with scripted content and migrations; `failing` uids error on
/// any call, for fault-isolation scenarios.
#[derive(Default)]
struct ScriptedPortal {
    content: HashMap<String, Vec<RawEntry>>,
    migrations: HashMap<String, String>,
    failing: HashSet<String>,
}

impl ScriptedPortal {
    fn with_content(mut self, uid: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().expect("scripted row must be an object").clone())
            .collect();
        self.content.insert(uid.to_string(), rows);
        self
    }

    fn with_migration(mut self, uid: &str, new_uid: &str) -> Self {
        self.migrations.insert(uid.to_string(), new_uid.to_string());
        self
    }

    fn failing_on(mut self, uid: &str) -> Self {
        self.failing.insert(uid.to_string());
        self
    }
}

#[async_trait]
impl DataPortal for ScriptedPortal {
    async fn get_latest_dataset(&self, uid: &str) -> Result<(String, bool), PortalError> {
        if self.failing.contains(uid) {
            return Err(PortalError::InvalidResponse("scripted failure".to_string()));
        }
        match self.migrations.get(uid) {
            Some(new_uid) => Ok((new_uid.clone(), new_uid != uid)),
            None => Ok((uid.to_string(), false)),
        }
    }

    async fn get_content(&self, uid: &str) -> Result<Vec<RawEntry>, PortalError> {
        if self.failing.contains(uid) {
            return Err(PortalError::InvalidResponse("scripted failure".to_string()));
        }
        self.content
            .get(uid)
            .cloned()
            .ok_or_else(|| PortalError::InvalidResponse(format!("no content scripted for {}", uid)))
    }
}

async fn setup(portal: ScriptedPortal) -> (Arc<DatabaseConnection>, SourcingService) {
    let path = std::env::temp_dir().join(format!(
        "shotsdb-test-{}-{}.db",
        std::process::id(),
        DB_SEQ.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_file(&path);
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let db = Arc::new(establish_connection(&url).await.unwrap());
    let service = SourcingService::new(db.clone(), Arc::new(portal));
    (db, service)
}

async fn register(db: &DatabaseConnection, uid: &str, fields_map: Value) -> dataset::Model {
    let (model, _) = DatasetRepository::get_or_create(db, uid).await.unwrap();
    let mut update: dataset::ActiveModel = model.into();
    update.fields_map = Set(fields_map.to_string());
    update.update(db).await.unwrap()
}

fn school_row(code: &str, name: &str, public: &str, up_to_date: &str) -> Value {
    json!({
        "school_code": code,
        "name": name,
        "public": public,
        "city": "Sacramento",
        "county": "Sacramento",
        "district": "Sacramento City Unified",
        "reported": "Y",
        "utd_rate": up_to_date,
    })
}

const MAPPED: &str = r#"{"code": "school_code", "up_to_date": "utd_rate", "city": null}"#;

#[tokio::test]
async fn sources_translates_and_summarizes_a_dataset() {
    let portal = ScriptedPortal::default().with_content(
        "abcd-1234",
        vec![
            school_row("0001", "Lincoln Elementary", "Y", "0.9"),
            school_row("0002", "Washington Elementary", "N", "0.7"),
            school_row("0003", "Jefferson Elementary", "Y", "0.8"),
        ],
    );
    let (db, service) = setup(portal).await;
    register(db.as_ref(), "abcd-1234", serde_json::from_str(MAPPED).unwrap()).await;

    let report = service.update_db().await.unwrap();
    assert_eq!(report.sourced(), 1);
    assert_eq!(report.failed(), 0);

    let d = DatasetRepository::find_by_uid(db.as_ref(), "abcd-1234")
        .await
        .unwrap()
        .unwrap();
    assert!(d.sourced);

    assert_eq!(city::Entity::find().count(db.as_ref()).await.unwrap(), 1);
    assert_eq!(county::Entity::find().count(db.as_ref()).await.unwrap(), 1);
    assert_eq!(school::Entity::find().count(db.as_ref()).await.unwrap(), 3);
    assert_eq!(record::Entity::find().count(db.as_ref()).await.unwrap(), 3);

    // One summary per sector kind: all schools share one city, county and
    // district.
    let summaries = summary::Entity::find().all(db.as_ref()).await.unwrap();
    assert_eq!(summaries.len(), 3);

    let county_summary = summaries
        .iter()
        .find(|s| s.sector_kind == "county")
        .unwrap();
    let document: Value = serde_json::from_str(&county_summary.summary).unwrap();
    assert!((document["public"]["up_to_date"]["mean"].as_f64().unwrap() - 0.85).abs() < 1e-12);
    assert_eq!(document["private"]["up_to_date"]["count"], 1);
    assert_eq!(document["all"]["up_to_date"]["count"], 3);
}

#[tokio::test]
async fn resourcing_does_not_duplicate_entities() {
    let rows = vec![
        school_row("0001", "Lincoln Elementary", "Y", "0.9"),
        school_row("0002", "Washington Elementary", "N", "0.7"),
    ];
    let portal = ScriptedPortal::default().with_content("abcd-1234", rows);
    let (db, service) = setup(portal).await;
    register(db.as_ref(), "abcd-1234", serde_json::from_str(MAPPED).unwrap()).await;

    service.update_db().await.unwrap();

    // Same release queued again (as after a scanner reset) with unchanged
    // content.
    let d = DatasetRepository::find_by_uid(db.as_ref(), "abcd-1234")
        .await
        .unwrap()
        .unwrap();
    let mut update: dataset::ActiveModel = d.into();
    update.sourced = Set(false);
    update.update(db.as_ref()).await.unwrap();

    let report = service.update_db().await.unwrap();
    assert_eq!(report.sourced(), 1);

    assert_eq!(city::Entity::find().count(db.as_ref()).await.unwrap(), 1);
    assert_eq!(county::Entity::find().count(db.as_ref()).await.unwrap(), 1);
    assert_eq!(district::Entity::find().count(db.as_ref()).await.unwrap(), 1);
    assert_eq!(school::Entity::find().count(db.as_ref()).await.unwrap(), 2);
    assert_eq!(record::Entity::find().count(db.as_ref()).await.unwrap(), 2);
    assert_eq!(summary::Entity::find().count(db.as_ref()).await.unwrap(), 3);
}

#[tokio::test]
async fn failing_entry_rolls_back_the_whole_dataset() {
    let bad = json!({
        // no city: school cannot be resolved, and this is the last entry
        "school_code": "0003",
        "name": "Jefferson Elementary",
        "public": "Y",
        "county": "Sacramento",
        "reported": "Y",
    });
    let portal = ScriptedPortal::default().with_content(
        "abcd-1234",
        vec![
            school_row("0001", "Lincoln Elementary", "Y", "0.9"),
            school_row("0002", "Washington Elementary", "N", "0.7"),
            bad,
        ],
    );
    let (db, service) = setup(portal).await;
    register(db.as_ref(), "abcd-1234", serde_json::from_str(MAPPED).unwrap()).await;

    let report = service.update_db().await.unwrap();
    assert_eq!(report.sourced(), 0);
    assert_eq!(report.failed(), 1);

    let d = DatasetRepository::find_by_uid(db.as_ref(), "abcd-1234")
        .await
        .unwrap()
        .unwrap();
    assert!(!d.sourced);

    assert_eq!(city::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(county::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(school::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(record::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(summary::Entity::find().count(db.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn school_identity_is_code_city_county() {
    let mut in_davis = school_row("0001", "Lincoln Elementary", "Y", "0.95");
    in_davis["city"] = json!("Davis");
    let portal = ScriptedPortal::default().with_content(
        "abcd-1234",
        vec![
            school_row("0001", "Lincoln Elementary", "Y", "0.9"),
            // same code, same city and county: same school, record replaced
            school_row("0001", "Lincoln Elementary (Annex)", "Y", "0.8"),
            // same code, different city: a distinct school
            in_davis,
        ],
    );
    let (db, service) = setup(portal).await;
    register(db.as_ref(), "abcd-1234", serde_json::from_str(MAPPED).unwrap()).await;

    let report = service.update_db().await.unwrap();
    assert_eq!(report.sourced(), 1);

    assert_eq!(school::Entity::find().count(db.as_ref()).await.unwrap(), 2);
    assert_eq!(record::Entity::find().count(db.as_ref()).await.unwrap(), 2);

    // The duplicate entry did not overwrite the existing school's fields,
    // but its record did take the later values.
    let sacramento = city::Entity::find()
        .filter(city::Column::Name.eq("Sacramento"))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let kept = school::Entity::find()
        .filter(school::Column::CityId.eq(sacramento.id))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.name, "Lincoln Elementary");
    let rec = record::Entity::find()
        .filter(record::Column::SchoolId.eq(kept.id))
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rec.up_to_date, Some(0.8));
}

#[tokio::test]
async fn missing_district_still_persists_school_and_record() {
    let mut no_district = school_row("0001", "Lincoln Elementary", "Y", "0.9");
    no_district.as_object_mut().unwrap().remove("district");
    let portal = ScriptedPortal::default().with_content("abcd-1234", vec![no_district]);
    let (db, service) = setup(portal).await;
    register(db.as_ref(), "abcd-1234", serde_json::from_str(MAPPED).unwrap()).await;

    let report = service.update_db().await.unwrap();
    assert_eq!(report.sourced(), 1);

    let s = school::Entity::find().one(db.as_ref()).await.unwrap().unwrap();
    assert_eq!(s.district_id, None);
    assert_eq!(district::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(record::Entity::find().count(db.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn sectors_without_reported_records_get_no_summary() {
    let mut silent = school_row("0001", "Lincoln Elementary", "Y", "0.9");
    silent["reported"] = json!("N");
    let portal = ScriptedPortal::default().with_content("abcd-1234", vec![silent]);
    let (db, service) = setup(portal).await;
    register(db.as_ref(), "abcd-1234", serde_json::from_str(MAPPED).unwrap()).await;

    let report = service.update_db().await.unwrap();
    assert_eq!(report.sourced(), 1);

    // The school and its record exist, but nothing reported, so no sector
    // has a summary row.
    assert_eq!(record::Entity::find().count(db.as_ref()).await.unwrap(), 1);
    assert_eq!(summary::Entity::find().count(db.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn scanner_failure_on_one_dataset_does_not_stop_the_scan() {
    let portal = ScriptedPortal::default()
        .failing_on("aaaa-1111")
        .with_migration("bbbb-2222", "bbbb-9999");
    let (db, service) = setup(portal).await;
    register(db.as_ref(), "aaaa-1111", json!({})).await;
    let before = register(db.as_ref(), "bbbb-2222", json!({})).await;

    // Pretend b was sourced from the old release.
    let mut update: dataset::ActiveModel = before.clone().into();
    update.sourced = Set(true);
    update.update(db.as_ref()).await.unwrap();

    let report = service.update_datasets().await.unwrap();
    assert_eq!(report.failed(), 1);
    assert_eq!(report.requeued(), 1);

    let a = DatasetRepository::find_by_uid(db.as_ref(), "aaaa-1111")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(a.uid, "aaaa-1111");

    let b = DatasetRepository::find_by_uid(db.as_ref(), "bbbb-9999")
        .await
        .unwrap()
        .unwrap();
    assert!(!b.sourced);
    assert!(b.queued_date >= before.queued_date);
}

#[tokio::test]
async fn sourced_dataset_is_skipped_without_abandoning_the_run() {
    let portal = ScriptedPortal::default()
        .with_content("bbbb-2222", vec![school_row("0001", "Lincoln Elementary", "Y", "0.9")]);
    let (db, service) = setup(portal).await;

    let first = register(db.as_ref(), "aaaa-1111", json!({})).await;
    let mut update: dataset::ActiveModel = first.into();
    update.sourced = Set(true);
    update.update(db.as_ref()).await.unwrap();

    register(db.as_ref(), "bbbb-2222", serde_json::from_str(MAPPED).unwrap()).await;

    let report = service.update_db().await.unwrap();
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.sourced(), 1);

    let b = DatasetRepository::find_by_uid(db.as_ref(), "bbbb-2222")
        .await
        .unwrap()
        .unwrap();
    assert!(b.sourced);
    assert_eq!(record::Entity::find().count(db.as_ref()).await.unwrap(), 1);
}
