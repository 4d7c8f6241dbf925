use std::io::Write;

use assert_cmd::Command;
use tempfile::NamedTempFile;

fn schema_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("a temp file");
    let schema = serde_json::json!({
        "types": {
            "Root": {"kind": "record", "fields": [
                {"name": "id", "type": {"kind": "named", "name": "Int"}}
            ]}
        }
    });
    write!(file, "{schema}").expect("schema written");
    file
}

#[test]
fn valid_documents_exit_zero() {
    let schema = schema_file();
    Command::cargo_bin("scedel-cli")
        .expect("binary built")
        .arg(r#"{"id": 1}"#)
        .arg(schema.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("VALID"));
}

#[test]
fn validation_errors_exit_one_and_print_paths() {
    let schema = schema_file();
    Command::cargo_bin("scedel-cli")
        .expect("binary built")
        .arg(r#"{"id": "x"}"#)
        .arg(schema.path())
        .assert()
        .code(1)
        .stdout(predicates::str::contains("$.id"));
}

#[test]
fn documents_may_come_from_files() {
    let schema = schema_file();
    let mut document = NamedTempFile::new().expect("a temp file");
    write!(document, r#"{{"id": 1}}"#).expect("document written");
    Command::cargo_bin("scedel-cli")
        .expect("binary built")
        .arg(document.path())
        .arg(schema.path())
        .assert()
        .success();
}

#[test]
fn explicit_root_types_are_honored() {
    let schema = schema_file();
    Command::cargo_bin("scedel-cli")
        .expect("binary built")
        .arg("--type")
        .arg("Int")
        .arg("5")
        .arg(schema.path())
        .assert()
        .success();
}

#[test]
fn unreadable_schemas_exit_two() {
    Command::cargo_bin("scedel-cli")
        .expect("binary built")
        .arg(r#"{"id": 1}"#)
        .arg("/no/such/schema.json")
        .assert()
        .code(2);
}
