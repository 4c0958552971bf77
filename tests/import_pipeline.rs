mod common;

use slateworks::modules::import::model::ImportRow;
use slateworks::store::StudentStore;

use common::{actor, harness, junior};

fn row(first: &str, email: &str) -> ImportRow {
    ImportRow {
        first_name: first.to_string(),
        last_name: "Mensah".to_string(),
        email: email.to_string(),
        grade_code: "10".to_string(),
        stream_section: Some("A".to_string()),
        date_of_birth: Some("2010-01-15".to_string()),
        guardian_contact: None,
        admission_number: None,
    }
}

#[tokio::test]
async fn clean_rows_all_import_with_generated_numbers() {
    let h = harness().await;
    let rows = vec![
        row("Ama", "ama@example.com"),
        row("Kofi", "kofi@example.com"),
        row("Esi", "esi@example.com"),
    ];

    let outcome = h
        .engine
        .imports
        .import(h.school.id, rows, &actor())
        .await
        .unwrap();

    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.imported.len(), 3);
    assert!(outcome.errors.is_empty());

    // Generated admission numbers are sequential under the school/year
    // prefix.
    let student = h
        .store
        .find_by_id(h.school.id, outcome.imported[0])
        .await
        .unwrap()
        .unwrap();
    assert!(student.admission_number.starts_with("GHS/"));
    assert_eq!(h.store.count_students().await, 3);
}

#[tokio::test]
async fn bad_rows_fail_individually_with_row_numbers_and_payload() {
    let h = harness().await;
    let mut bad_date = row("Yaa", "yaa@example.com");
    bad_date.date_of_birth = Some("15/01/2010".to_string());
    let mut bad_email = row("Kwesi", "not-an-email");

    // Row 3 duplicates row 1's email within the batch.
    bad_email.grade_code = "10".to_string();
    let rows = vec![
        row("Ama", "ama@example.com"),
        bad_date,
        row("Adjoa", "ama@example.com"),
        bad_email,
        row("Kojo", "kojo@example.com"),
    ];

    let outcome = h
        .engine
        .imports
        .import(h.school.id, rows, &actor())
        .await
        .unwrap();

    assert_eq!(outcome.total, 5);
    assert_eq!(outcome.imported.len(), 2);
    assert_eq!(outcome.errors.len(), 3);
    assert_eq!(outcome.imported.len() + outcome.errors.len(), outcome.total);

    let rows_failed: Vec<_> = outcome.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows_failed, vec![2, 3, 4]);

    let date_error = &outcome.errors[0];
    assert!(date_error.message.contains("date of birth"));
    assert_eq!(date_error.payload["first_name"], "Yaa");

    let dup_error = &outcome.errors[1];
    assert!(dup_error.message.contains("Duplicate email"));
}

#[tokio::test]
async fn duplicate_against_existing_records_is_a_row_failure() {
    let h = harness().await;
    h.store
        .insert(junior(h.school.id, "10", "GHS/2026/0001", "ama@example.com"))
        .await
        .unwrap();

    let mut taken_number = row("Efua", "efua@example.com");
    taken_number.admission_number = Some("GHS/2026/0001".to_string());

    let rows = vec![row("Ama", "ama@example.com"), taken_number];
    let outcome = h
        .engine
        .imports
        .import(h.school.id, rows, &actor())
        .await
        .unwrap();

    assert!(outcome.imported.is_empty());
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors[0].message.contains("email"));
    assert!(outcome.errors[1].message.contains("admission_number"));
}

#[tokio::test]
async fn caller_supplied_numbers_are_not_regenerated() {
    let h = harness().await;
    let mut explicit = row("Ama", "ama@example.com");
    explicit.admission_number = Some("LEGACY/0042".to_string());

    let outcome = h
        .engine
        .imports
        .import(h.school.id, vec![explicit], &actor())
        .await
        .unwrap();

    assert_eq!(outcome.imported.len(), 1);
    let student = h
        .store
        .find_by_id(h.school.id, outcome.imported[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(student.admission_number, "LEGACY/0042");
}

#[tokio::test]
async fn empty_batch_reconciles_to_zero() {
    let h = harness().await;
    let outcome = h
        .engine
        .imports
        .import(h.school.id, Vec::new(), &actor())
        .await
        .unwrap();
    assert_eq!(outcome.total, 0);
    assert!(outcome.imported.is_empty());
    assert!(outcome.errors.is_empty());
}

#[tokio::test]
async fn all_rows_failing_still_reconciles() {
    let h = harness().await;
    let rows = vec![row("Ama", "bad"), row("Kofi", "also-bad")];
    let outcome = h
        .engine
        .imports
        .import(h.school.id, rows, &actor())
        .await
        .unwrap();
    assert_eq!(outcome.total, 2);
    assert!(outcome.imported.is_empty());
    assert_eq!(outcome.errors.len(), 2);
}

#[tokio::test]
async fn mid_import_outage_fails_remaining_rows_fast() {
    let h = harness().await;
    h.store.set_write_failures(true);
    let rows = vec![
        row("Ama", "ama@example.com"),
        row("Kofi", "kofi@example.com"),
        row("Esi", "esi@example.com"),
    ];
    let outcome = h
        .engine
        .imports
        .import(h.school.id, rows, &actor())
        .await
        .unwrap();
    assert_eq!(outcome.total, 3);
    assert!(outcome.imported.is_empty());
    assert_eq!(outcome.errors.len(), 3);
    for error in &outcome.errors {
        assert!(error.message.contains("unavailable"));
    }
}

#[tokio::test]
async fn import_scales_to_hundreds_of_rows() {
    let h = harness().await;
    let rows: Vec<_> = (0..250)
        .map(|i| row(&format!("Student{i}"), &format!("student{i}@example.com")))
        .collect();
    let outcome = h
        .engine
        .imports
        .import(h.school.id, rows, &actor())
        .await
        .unwrap();
    assert_eq!(outcome.total, 250);
    assert_eq!(outcome.imported.len(), 250);
    assert!(outcome.errors.is_empty());
}
