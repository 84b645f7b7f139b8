//! One-level dependency resolution from a contract's AST.

use serde_json::Value;

use super::types::{ContractArtifact, Dependencies};
use super::ArtifactSource;

/// Names of the contracts a source unit depends on.
///
/// Every symbol in the AST's `exportedSymbols` table other than the
/// contract's own name is a dependency. A missing table yields nothing.
#[must_use]
pub fn exported_dependencies(ast: &Value, own_name: &str) -> Vec<String> {
    ast.get("exportedSymbols")
        .and_then(Value::as_object)
        .map(|symbols| {
            symbols
                .keys()
                .filter(|name| name.as_str() != own_name)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Load each of an artifact's direct dependencies through the same build
/// tool that produced it.
///
/// Dependencies of dependencies are not expanded. A dependency that cannot
/// be located or parsed is recorded as `None`.
pub fn resolve_dependencies<S>(source: &S, artifact: &ContractArtifact) -> Dependencies
where
    S: ArtifactSource + ?Sized,
{
    exported_dependencies(&artifact.ast, &artifact.name)
        .into_iter()
        .map(|name| {
            let bundle = match source.load_dependency(&name) {
                Ok(bundle) => bundle,
                Err(e) => {
                    tracing::warn!(
                        contract = %artifact.name,
                        dependency = %name,
                        error = %e,
                        "Could not load dependency artifact"
                    );
                    None
                }
            };
            if bundle.is_none() {
                tracing::debug!(contract = %artifact.name, dependency = %name, "Dependency not found");
            }
            (name, bundle)
        })
        .collect()
}
