use std::io::Write;

use labhub::error::LabError;
use labhub::registry::LabRegistry;

const THREE_LABS: &str = r#"{
  "labs": [
    {
      "id": "lab1",
      "title": "Lab 1: Phishing Triage",
      "description": "Sort the inbox.",
      "container_name": "lab1-web",
      "image": "labs/lab1-phishing:latest",
      "ports": [{"container_port": 5000, "host_port": 5001}],
      "launch_url": "http://localhost:5001"
    },
    {
      "id": "lab2",
      "title": "Lab 2: Log Hunt",
      "container_name": "lab2-web",
      "image": "labs/lab2-logs:latest",
      "ports": [{"container_port": 5000, "host_port": 5002}],
      "launch_url": "http://localhost:5002"
    },
    {
      "id": "lab3",
      "title": "Lab 3: Triage Board",
      "container_name": "lab3-web",
      "image": "labs/lab3-triage-board:latest",
      "launch_url": "http://localhost:5003"
    }
  ]
}"#;

#[test]
fn json_registry_loads_in_document_order() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(THREE_LABS.as_bytes()).unwrap();

    let catalog = LabRegistry::from_file(file.path()).load().unwrap();

    let ids: Vec<&str> = catalog.iter().map(|lab| lab.id.as_str()).collect();
    assert_eq!(ids, vec!["lab1", "lab2", "lab3"]);

    let lab1 = catalog.get("lab1").unwrap();
    assert_eq!(lab1.description, "Sort the inbox.");
    assert_eq!(lab1.ports[0].container_key(), "5000/tcp");
    assert_eq!(lab1.ports[0].host_port, 5001);
    assert!(catalog.get("lab3").unwrap().ports.is_empty());
}

#[test]
fn yaml_registry_is_accepted() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    let yaml = concat!(
        "labs:\n",
        "  - id: lab1\n",
        "    title: One\n",
        "    container_name: lab1-web\n",
        "    image: labs/lab1:latest\n",
        "    ports:\n",
        "      - container_port: 8080\n",
        "        host_port: 9001\n",
        "    launch_url: http://localhost:9001\n",
    );
    file.write_all(yaml.as_bytes()).unwrap();

    let catalog = LabRegistry::from_file(file.path()).load().unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get("lab1").unwrap().ports[0].host_port, 9001);
}

#[test]
fn edits_are_picked_up_on_next_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labs.json");
    std::fs::write(&path, r#"{"labs": []}"#).unwrap();

    let registry = LabRegistry::from_file(&path);
    assert!(registry.load().unwrap().is_empty());

    std::fs::write(&path, THREE_LABS).unwrap();
    assert_eq!(registry.load().unwrap().len(), 3);
}

#[test]
fn malformed_document_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labs.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = LabRegistry::from_file(&path).load().unwrap_err();
    assert!(matches!(err, LabError::Config(_)));
}
