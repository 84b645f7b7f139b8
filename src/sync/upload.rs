//! Contract upload orchestration.

use std::collections::BTreeMap;

use futures_util::future::join_all;

use crate::artifact::ContractArtifact;
use crate::display;

use super::backend::{ContractAst, ContractData};
use super::session::SyncSession;

/// What happened to one contract's uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub metadata_synced: bool,
    pub ast_uploads: usize,
    pub ast_failures: usize,
}

/// AST requests for a contract: its own bundle, then one per dependency.
#[must_use]
pub fn ast_requests(artifact: &ContractArtifact) -> Vec<ContractAst> {
    let address = artifact.address.clone();
    let mut requests = vec![ContractAst {
        address: address.clone(),
        ast: Some(artifact.bundle().to_json_string()),
        dependencies: BTreeMap::new(),
    }];
    requests.extend(artifact.dependencies.iter().map(|(name, bundle)| ContractAst {
        address: address.clone(),
        ast: None,
        dependencies: BTreeMap::from([(
            name.clone(),
            bundle.as_ref().map(crate::artifact::DependencyBundle::to_json_string),
        )]),
    }));
    requests
}

/// Push a contract's metadata and, when enabled, its AST bundles.
///
/// All requests are issued concurrently; a failure of one is logged and
/// does not affect the others.
pub async fn upload_contract(session: &SyncSession, artifact: &ContractArtifact) -> UploadReport {
    let backend = session.backend();
    let address = artifact.address.clone();

    let data = ContractData {
        name: artifact.name.clone(),
        address: address.clone(),
        abi: artifact.abi.clone(),
        hashed_bytecode: artifact.hashed_bytecode.clone(),
    };

    let ast = if session.options().ast_upload {
        ast_requests(artifact)
    } else {
        Vec::new()
    };
    if !ast.is_empty() {
        tracing::info!(contract = %artifact.name, "Uploading contract and dependency ASTs");
    }

    let (metadata, ast_results) = futures_util::join!(
        backend.sync_contract_data(&data),
        join_all(ast.iter().map(|request| backend.sync_contract_ast(request))),
    );

    let mut report = UploadReport {
        metadata_synced: metadata.is_ok(),
        ast_uploads: ast_results.len(),
        ast_failures: 0,
    };

    for (request, result) in ast.iter().zip(&ast_results) {
        if let Err(e) = result {
            report.ast_failures += 1;
            let part = request
                .dependencies
                .keys()
                .next()
                .map_or("contract", String::as_str);
            tracing::error!(
                contract = %artifact.name,
                address = %address,
                part = %part,
                error = %e,
                "AST upload failed"
            );
        }
    }

    match metadata {
        Ok(()) => {
            let dependencies: Vec<&str> = if session.options().ast_upload {
                artifact.dependencies.keys().map(String::as_str).collect()
            } else {
                Vec::new()
            };
            display::print_contract_synced(&artifact.name, &address, &dependencies);
        }
        Err(e) => {
            tracing::error!(contract = %artifact.name, address = %address, error = %e, "Contract sync failed");
        }
    }

    report
}
