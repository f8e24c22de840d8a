//! Round trip against a real Postgres. Skipped unless DATABASE_URL is set.

use bo_persist::domain::schema::{ClassDefinition, PropDefinition};
use bo_persist::{lock, ClassDefRegistry, DataAccessor, PgStore, PropType, PropValue};
use std::env;
use std::sync::Arc;

#[tokio::test]
async fn postgres_round_trip() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let Ok(database_url) = env::var("DATABASE_URL") else {
        println!("DATABASE_URL not set, skipping postgres round trip");
        return Ok(());
    };

    let suffix = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    let vehicle_table = format!("vehicle_{}", suffix);
    let truck_table = format!("truck_{}", suffix);
    let registry = ClassDefRegistry::from_definitions(vec![
        ClassDefinition::new("Vehicle")
            .table(vehicle_table.clone())
            .object_id("VehicleID")
            .prop(PropDefinition::new("VehicleID", PropType::Guid))
            .prop(PropDefinition::new("Registration", PropType::String).compulsory())
            .prop(PropDefinition::new("Weight", PropType::Decimal))
            .prop(PropDefinition::new("Registered", PropType::Date))
            .alternate_key(["Registration"]),
        ClassDefinition::new("Truck")
            .table(truck_table.clone())
            .inherits("Vehicle")
            .super_class_id_column("TruckID")
            .prop(PropDefinition::new("Axles", PropType::Integer))
            .prop(PropDefinition::new("Refrigerated", PropType::Boolean)),
    ])?;

    let store = PgStore::connect(&database_url, 2).await?;
    let pool = store.pool().clone();
    let accessor = DataAccessor::new(Arc::new(store), registry).await?;

    let result = async {
        let truck = accessor.create("Truck")?;
        {
            let mut t = lock(&truck);
            t.set_property_value("Registration", "AB12 CDE")?;
            t.set_property_value("Axles", 3)?;
        }
        assert_eq!(accessor.save(&truck).await?, 2);
        let id = lock(&truck).get_guid("VehicleID")?.expect("assigned");

        let loaded = accessor.load_by_id("Truck", id).await?.expect("stored");
        {
            let mut t = lock(&loaded);
            assert_eq!(t.get_i64("Axles")?, Some(3));
            assert_eq!(t.get_property_value("Weight")?, &PropValue::Null);
            t.set_property_value("Refrigerated", true)?;
        }
        assert_eq!(accessor.save(&loaded).await?, 1);

        let clash = accessor.create("Vehicle")?;
        lock(&clash).set_property_value("Registration", "AB12 CDE")?;
        assert!(accessor.save(&clash).await.is_err());

        lock(&loaded).mark_for_delete();
        assert_eq!(accessor.save(&loaded).await?, 2);
        assert!(accessor.load_by_id("Truck", id).await?.is_none());
        anyhow::Ok(())
    }
    .await;

    for table in [&truck_table, &vehicle_table] {
        sqlx::query(&format!("DROP TABLE IF EXISTS \"{}\"", table))
            .execute(&pool)
            .await?;
    }
    result
}
