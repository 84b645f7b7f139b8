//! Integration tests for artifact parsing across build tools.

mod common;

use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use common::{truffle_artifact, write_json};
use ethernal_cli::artifact::{
    detect_project, resolve_dependencies, ArtifactSource, Detection, Project, ProjectKind,
};

const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const VAULT: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

fn detect(dir: &Path, network_id: &str) -> Project {
    match detect_project(dir, network_id).unwrap() {
        Detection::Supported(project) => project,
        other => panic!("expected a supported project, got {other:?}"),
    }
}

fn truffle_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("truffle-config.js"), "module.exports = {};").unwrap();
    write_json(
        &dir.path().join("build/contracts/Token.json"),
        &truffle_artifact("Token", TOKEN, &["Token", "Ownable"]),
    );
    write_json(
        &dir.path().join("build/contracts/Ownable.json"),
        &truffle_artifact("Ownable", VAULT, &["Ownable"]),
    );
    dir
}

#[test]
fn test_truffle_artifact_on_active_network() {
    let dir = truffle_project();
    let project = detect(dir.path(), "5");
    assert_eq!(project.kind(), ProjectKind::Truffle);

    let path = project.watch_root().join("Token.json");
    let artifacts = project.parse(&path).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "Token");
    assert_eq!(artifacts[0].address, TOKEN);
    assert!(artifacts[0].hashed_bytecode.is_some());
}

#[test]
fn test_truffle_artifact_on_other_network_yields_nothing() {
    let dir = truffle_project();
    let project = detect(dir.path(), "6");
    let path = project.watch_root().join("Token.json");
    assert!(project.parse(&path).unwrap().is_empty());
}

#[test]
fn test_truffle_short_address_is_kept_verbatim() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("truffle-config.js"), "module.exports = {};").unwrap();
    write_json(
        &dir.path().join("build/contracts/Token.json"),
        &truffle_artifact("Token", "0xABC", &["Token"]),
    );

    let project = detect(dir.path(), "5");
    let artifacts = project.parse(&project.watch_root().join("Token.json")).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].address, "0xABC");
}

#[test]
fn test_truffle_lowercase_address_is_checksummed() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("truffle-config.js"), "module.exports = {};").unwrap();
    write_json(
        &dir.path().join("build/contracts/Token.json"),
        &truffle_artifact("Token", &TOKEN.to_lowercase(), &["Token"]),
    );

    let project = detect(dir.path(), "5");
    let artifacts = project.parse(&project.watch_root().join("Token.json")).unwrap();
    assert_eq!(artifacts[0].address, TOKEN);
}

#[test]
fn test_truffle_custom_build_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("truffle-config.js"),
        "const path = require('path');\nmodule.exports = {\n  contracts_build_directory: path.join(__dirname, 'artifacts'),\n};\n",
    )
    .unwrap();
    write_json(
        &dir.path().join("artifacts/Token.json"),
        &truffle_artifact("Token", TOKEN, &["Token"]),
    );

    let project = detect(dir.path(), "5");
    assert!(project.watch_root().ends_with("artifacts"));
    assert!(project.accepts(&project.watch_root().join("Token.json")));
}

#[test]
fn test_dependencies_exclude_own_name() {
    let dir = truffle_project();
    let project = detect(dir.path(), "5");
    let artifact = project
        .parse(&project.watch_root().join("Token.json"))
        .unwrap()
        .remove(0);

    let dependencies = resolve_dependencies(&project, &artifact);
    assert_eq!(dependencies.keys().collect::<Vec<_>>(), vec!["Ownable"]);
    let bundle = dependencies["Ownable"].as_ref().unwrap();
    assert_eq!(bundle.contract_name, "Ownable");
}

#[test]
fn test_missing_dependency_is_none() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("truffle.js"), "").unwrap();
    write_json(
        &dir.path().join("build/contracts/Token.json"),
        &truffle_artifact("Token", TOKEN, &["Token", "IERC20"]),
    );

    let project = detect(dir.path(), "5");
    let artifact = project
        .parse(&project.watch_root().join("Token.json"))
        .unwrap()
        .remove(0);
    let dependencies = resolve_dependencies(&project, &artifact);
    assert_eq!(dependencies.len(), 1);
    assert!(dependencies["IERC20"].is_none());
}

#[test]
fn test_brownie_deployment_artifact() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("brownie-config.yaml"), "dev_deployment_artifacts: true\n").unwrap();
    let mut artifact = truffle_artifact("Token", TOKEN, &["Token"]);
    artifact["deployment"] = json!({"address": TOKEN.to_lowercase(), "chainid": "dev"});
    write_json(&dir.path().join("build/deployments/dev/0x5FbD.json"), &artifact);
    write_json(&dir.path().join("build/deployments/map.json"), &json!({"dev": {}}));

    let project = detect(dir.path(), "1337");
    assert_eq!(project.kind(), ProjectKind::Brownie);
    let Project::Brownie(brownie) = &project else {
        unreachable!()
    };
    assert!(brownie.has_dev_deployments());

    let path = project.watch_root().join("dev/0x5FbD.json");
    assert!(project.accepts(&path));
    assert!(!project.accepts(&project.watch_root().join("map.json")));

    let artifacts = project.parse(&path).unwrap();
    assert_eq!(artifacts[0].address, TOKEN);
}

fn foundry_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("foundry.toml"), "[profile.default]\nsrc = \"src\"\n").unwrap();
    std::fs::create_dir_all(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/Vault.sol"), "contract Vault is Base {}").unwrap();
    std::fs::write(dir.path().join("src/Base.sol"), "contract Base {}").unwrap();

    write_json(
        &dir.path().join("cache/solidity-files-cache.json"),
        &json!({
            "_format": "",
            "paths": {"artifacts": "out", "build_infos": "out/build-info"},
            "files": {
                "src/Vault.sol": {
                    "sourceName": "src/Vault.sol",
                    "artifacts": {"Vault": {"0.8.26": {"default": {"path": "Vault.sol/Vault.json"}}}}
                },
                "src/Base.sol": {
                    "sourceName": "src/Base.sol",
                    "artifacts": {"Base": {"0.8.26": "Base.sol/Base.json"}}
                }
            }
        }),
    );
    write_json(
        &dir.path().join("out/Vault.sol/Vault.json"),
        &json!({
            "abi": [],
            "ast": {"exportedSymbols": {"Vault": [2], "Base": [1]}},
            "deployedBytecode": {"object": "0x60806040"}
        }),
    );
    write_json(
        &dir.path().join("out/Base.sol/Base.json"),
        &json!({"abi": [{"type": "constructor"}], "ast": {"exportedSymbols": {"Base": [1]}}}),
    );
    write_json(
        &dir.path().join("broadcast/Deploy.s.sol/31337/run-latest.json"),
        &json!({
            "transactions": [
                {"transactionType": "CREATE", "contractName": null, "contractAddress": TOKEN},
                {"transactionType": "CALL", "contractName": "Vault", "contractAddress": VAULT},
                {"transactionType": "CREATE", "contractName": "Vault", "contractAddress": VAULT}
            ]
        }),
    );
    dir
}

#[test]
fn test_foundry_skips_unnamed_deployments() {
    let dir = foundry_project();
    let project = detect(dir.path(), "31337");
    assert_eq!(project.kind(), ProjectKind::Foundry);

    let path = project.watch_root().join("Deploy.s.sol/31337/run-latest.json");
    assert!(project.accepts(&path));
    let artifacts = project.parse(&path).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "Vault");
    assert_eq!(artifacts[0].address, VAULT);
    assert_eq!(artifacts[0].source.as_deref(), Some("contract Vault is Base {}"));
    assert!(artifacts[0].hashed_bytecode.is_some());
}

#[test]
fn test_foundry_dependency_resolves_by_its_own_name() {
    let dir = foundry_project();
    let project = detect(dir.path(), "31337");
    let path = project.watch_root().join("Deploy.s.sol/31337/run-latest.json");
    let artifact = project.parse(&path).unwrap().remove(0);

    let dependencies = resolve_dependencies(&project, &artifact);
    let base = dependencies["Base"].as_ref().unwrap();
    assert_eq!(base.contract_name, "Base");
    assert_eq!(base.abi, json!([{"type": "constructor"}]));
    assert_eq!(base.source.as_deref(), Some("contract Base {}"));
}

#[test]
fn test_foundry_missing_output_skips_only_that_deployment() {
    let dir = foundry_project();
    write_json(
        &dir.path().join("cache/solidity-files-cache.json"),
        &json!({
            "paths": {"artifacts": "out"},
            "files": {
                "src/Vault.sol": {
                    "sourceName": "src/Vault.sol",
                    "artifacts": {"Vault": {"0.8.26": "Vault.sol/Vault.json"}}
                },
                "src/Gone.sol": {
                    "sourceName": "src/Gone.sol",
                    "artifacts": {"Gone": {"0.8.26": "Gone.sol/Gone.json"}}
                }
            }
        }),
    );
    write_json(
        &dir.path().join("broadcast/Deploy.s.sol/31337/run-latest.json"),
        &json!({
            "transactions": [
                {"transactionType": "CREATE", "contractName": "Gone", "contractAddress": TOKEN},
                {"transactionType": "CREATE", "contractName": "Vault", "contractAddress": VAULT}
            ]
        }),
    );

    let project = detect(dir.path(), "31337");
    let path = project.watch_root().join("Deploy.s.sol/31337/run-latest.json");
    let artifacts = project.parse(&path).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "Vault");
    assert_eq!(artifacts[0].address, VAULT);
}

#[test]
fn test_foundry_calls_only_need_no_cache() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("foundry.toml"), "").unwrap();
    write_json(
        &dir.path().join("broadcast/Deploy.s.sol/1/run-latest.json"),
        &json!({"transactions": [{"transactionType": "CALL", "contractName": "Vault", "contractAddress": VAULT}]}),
    );

    let project = detect(dir.path(), "1");
    let path = project.watch_root().join("Deploy.s.sol/1/run-latest.json");
    assert!(project.parse(&path).unwrap().is_empty());
}

#[test]
fn test_malformed_artifact_is_an_error() {
    let dir = truffle_project();
    let project = detect(dir.path(), "5");
    let path = project.watch_root().join("Broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(project.parse(&path).is_err());
}

#[test]
fn test_hardhat_is_detected_but_unsupported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("hardhat.config.ts"), "").unwrap();
    assert!(matches!(
        detect_project(dir.path(), "31337").unwrap(),
        Detection::Hardhat(_)
    ));
}
