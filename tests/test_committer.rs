//! Atomic commits against the in-memory store.

mod common;

use bo_persist::domain::schema::ClassDefRegistry;
use bo_persist::{lock, BusinessObjectCollection, PersistError, SharedBo, StoreError};
use uuid::Uuid;

fn invoice(accessor: &bo_persist::DataAccessor, number: &str) -> SharedBo {
    let bo = accessor.create("Invoice").unwrap();
    lock(&bo).set_property_value("InvoiceNumber", number).unwrap();
    bo
}

fn line(accessor: &bo_persist::DataAccessor, value: f64) -> SharedBo {
    let bo = accessor.create("InvoiceLine").unwrap();
    {
        let mut line = lock(&bo);
        line.set_property_value("InvoiceID", Uuid::new_v4()).unwrap();
        line.set_property_value("Value", value).unwrap();
    }
    bo
}

#[tokio::test]
async fn commit_inserts_and_finalizes() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    let bo = invoice(&accessor, "INV-1");

    let executed = accessor.save(&bo).await?;
    assert_eq!(executed, 1);

    let saved = lock(&bo);
    let state = saved.state();
    assert!(!state.is_new());
    assert!(!state.is_dirty());
    assert!(!state.is_editing());
    assert!(saved.get_guid("InvoiceID")?.is_some());
    assert!(saved.get_date("Modified")?.is_some(), "audit stamp");
    assert_eq!(store.row_count("invoice"), 1);
    Ok(())
}

#[tokio::test]
async fn failed_batch_leaves_every_object_untouched() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    let first = invoice(&accessor, "INV-1");
    let second = line(&accessor, 10.0);
    let third = invoice(&accessor, "INV-2");
    store.fail_on_table("invoice_line");

    let mut committer = accessor.committer();
    committer.add_business_object(first.clone());
    committer.add_business_object(second.clone());
    committer.add_business_object(third.clone());

    let err = committer.commit_transaction().await.unwrap_err();
    assert!(matches!(
        err,
        PersistError::Persistence {
            source: StoreError::Injected { .. }
        }
    ), "{err}");

    for bo in [&first, &second, &third] {
        let bo = lock(bo);
        let state = bo.state();
        assert!(state.is_new());
        assert!(state.is_dirty());
        assert!(state.is_editing());
        assert!(bo.key_values()[0].1.is_null(), "surrogate key rolled back");
    }
    assert!(lock(&first).get_date("Modified")?.is_none());
    assert_eq!(store.row_count("invoice"), 0);
    assert_eq!(store.committed_statements(), 0);

    store.clear_failures();
    assert_eq!(committer.commit_transaction().await?, 3);
    assert_eq!(store.row_count("invoice"), 2);
    assert_eq!(store.row_count("invoice_line"), 1);
    Ok(())
}

#[tokio::test]
async fn staging_the_same_object_twice_is_a_no_op() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    let bo = invoice(&accessor, "INV-1");

    let mut committer = accessor.committer();
    committer.add_business_object(bo.clone());
    committer.add_business_object(bo.clone());
    assert_eq!(committer.len(), 1);

    assert_eq!(committer.commit_transaction().await?, 1);
    assert_eq!(store.row_count("invoice"), 1);

    // nothing pending after success
    assert_eq!(committer.commit_transaction().await?, 0);
    assert!(committer.is_committed());
    Ok(())
}

#[tokio::test]
async fn objects_staged_after_a_commit_are_written() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    let first = invoice(&accessor, "INV-1");
    let mut committer = accessor.committer();
    committer.add_business_object(first.clone());
    assert_eq!(committer.commit_transaction().await?, 1);

    let second = invoice(&accessor, "INV-2");
    committer.add_business_object(second.clone());
    assert!(!committer.is_committed());
    assert_eq!(committer.commit_transaction().await?, 1);
    assert_eq!(store.row_count("invoice"), 2);
    {
        let second = lock(&second);
        assert!(!second.state().is_new());
        assert!(!second.is_dirty());
    }

    lock(&first).set_property_value("Total", 99.0)?;
    assert_eq!(committer.commit_transaction().await?, 1);
    assert!(!lock(&first).is_dirty());
    assert!(committer.is_committed());
    Ok(())
}

#[tokio::test]
async fn committed_deletes_leave_the_collection() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    let class_def = accessor.registry().class_def("Invoice")?;
    let invoices = BusinessObjectCollection::new(class_def);
    let keep = invoice(&accessor, "INV-1");
    let gone = invoice(&accessor, "INV-2");
    invoices.add(keep.clone())?;
    invoices.add(gone.clone())?;

    let mut committer = accessor.committer();
    committer.add_collection(&invoices);
    assert_eq!(committer.commit_transaction().await?, 2);

    lock(&gone).mark_for_delete();
    let mut committer = accessor.committer();
    committer.add_collection(&invoices);
    assert_eq!(committer.len(), 1);
    assert_eq!(committer.commit_transaction().await?, 1);

    assert_eq!(invoices.len(), 1);
    assert!(invoices.contains(&keep));
    assert!(!invoices.contains(&gone));
    assert_eq!(store.row_count("invoice"), 1);

    let dropped = lock(&gone);
    assert!(dropped.state().is_deleted());
    assert!(dropped.state().is_new());
    assert!(!dropped.has_pending_changes());
    Ok(())
}

#[tokio::test]
async fn invalid_objects_abort_before_any_write() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    let good = invoice(&accessor, "INV-1");
    let bad = accessor.create("Invoice")?;

    let mut committer = accessor.committer();
    committer.add_business_object(good.clone());
    committer.add_business_object(bad.clone());

    match committer.commit_transaction().await {
        Err(PersistError::Validation { message }) => {
            assert!(message.contains("'Invoice Number' is a compulsory field and has no value"));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(lock(&good).get_guid("InvoiceID")?.is_none());
    assert_eq!(store.row_count("invoice"), 0);
    Ok(())
}

#[tokio::test]
async fn foreign_class_definitions_are_refused() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    let other = ClassDefRegistry::from_definitions(common::definitions())?;
    let stranger = bo_persist::BusinessObject::new(other.class_def("Invoice")?).into_shared();
    lock(&stranger).set_property_value("InvoiceNumber", "INV-9")?;

    let mut committer = accessor.committer();
    committer.add_business_object(stranger);
    let err = committer.commit_transaction().await.unwrap_err();
    assert!(matches!(err, PersistError::SchemaMismatch(_)), "{err}");
    assert_eq!(store.row_count("invoice"), 0);
    Ok(())
}

#[tokio::test]
async fn duplicate_alternate_key_is_a_persistence_failure() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    accessor.save(&invoice(&accessor, "INV-1")).await?;

    let clash = invoice(&accessor, "INV-1");
    let err = accessor.save(&clash).await.unwrap_err();
    assert!(matches!(
        err,
        PersistError::Persistence {
            source: StoreError::DuplicateKey { .. }
        }
    ), "{err}");
    assert!(lock(&clash).state().is_new());
    assert_eq!(store.row_count("invoice"), 1);
    Ok(())
}

#[tokio::test]
async fn inherited_object_round_trips_through_the_loader() -> anyhow::Result<()> {
    let (accessor, store) = common::memory_accessor().await;
    let company = accessor.create("Company")?;
    {
        let mut c = lock(&company);
        c.set_property_value("Name", "Initech")?;
        c.set_property_value("TaxNumber", "US42")?;
        c.set_property_value("StockCode", "INTC")?;
    }
    assert_eq!(accessor.save(&company).await?, 3);
    let id = lock(&company).get_guid("PartyID")?.expect("assigned");
    assert_eq!(
        store.rows("company")[0].get("CompanyID"),
        Some(&bo_persist::PropValue::Guid(id))
    );

    let loaded = accessor
        .load_by_id("Company", id)
        .await?
        .expect("company row");
    {
        let mut c = lock(&loaded);
        assert!(!c.state().is_new());
        assert!(!c.is_dirty());
        assert_eq!(c.get_string("TaxNumber")?.as_deref(), Some("US42"));
        c.set_property_value("StockCode", "INTX")?;
    }
    assert_eq!(accessor.save(&loaded).await?, 1);
    assert_eq!(
        store.rows("company")[0].get("StockCode"),
        Some(&bo_persist::PropValue::from("INTX"))
    );

    lock(&loaded).mark_for_delete();
    assert_eq!(accessor.save(&loaded).await?, 3);
    assert!(accessor.load_by_id("Company", id).await?.is_none());
    for table in ["party", "organisation", "company"] {
        assert_eq!(store.row_count(table), 0, "{table}");
    }
    Ok(())
}

#[tokio::test]
async fn pending_statements_do_not_mutate() -> anyhow::Result<()> {
    let (accessor, _store) = common::memory_accessor().await;
    let bo = invoice(&accessor, "INV-1");
    let mut committer = accessor.committer();
    committer.add_business_object(bo.clone());

    let pending = committer.pending_statements()?;
    assert_eq!(pending.tables(), vec!["invoice"]);
    assert!(lock(&bo).get_guid("InvoiceID")?.is_none());
    Ok(())
}
