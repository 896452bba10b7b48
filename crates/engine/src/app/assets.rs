use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Cube,
    Quad,
    Sphere,
    Capsule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    Asset(String),
    Fallback(Primitive),
}

/// First candidate for which `is_available` holds, else the fallback primitive.
pub fn resolve_model<S, F>(candidates: &[S], is_available: F, fallback: Primitive) -> ModelChoice
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    candidates
        .iter()
        .map(|candidate| -> &str { candidate.as_ref() })
        .find(|candidate| is_available(*candidate))
        .map(|candidate| ModelChoice::Asset(candidate.to_string()))
        .unwrap_or(ModelChoice::Fallback(fallback))
}

/// Resolves model files under an assets directory, warning once per label
/// when a fallback primitive is used.
#[derive(Debug, Default)]
pub struct AssetResolver {
    assets_dir: Option<PathBuf>,
    warned: BTreeSet<String>,
}

impl AssetResolver {
    pub fn new(assets_dir: Option<PathBuf>) -> Self {
        Self {
            assets_dir,
            warned: BTreeSet::new(),
        }
    }

    pub fn resolve<S: AsRef<str>>(
        &mut self,
        label: &str,
        candidates: &[S],
        fallback: Primitive,
    ) -> ModelChoice {
        let choice = match &self.assets_dir {
            Some(dir) => resolve_model(candidates, |name| dir.join(name).is_file(), fallback),
            None => ModelChoice::Fallback(fallback),
        };
        if let ModelChoice::Fallback(primitive) = choice {
            if self.warned.insert(label.to_string()) {
                warn!(label, ?primitive, "asset_fallback");
            }
        }
        choice
    }

    pub fn warned_labels(&self) -> usize {
        self.warned.len()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn resolve_model_prefers_first_available_candidate() {
        let available = ["door.glb", "door.obj"];
        let choice = resolve_model(
            &["door.fbx", "door.obj", "door.glb"],
            |name| available.contains(&name),
            Primitive::Cube,
        );
        assert_eq!(choice, ModelChoice::Asset("door.obj".to_string()));
    }

    #[test]
    fn resolve_model_falls_back_to_primitive() {
        let choice = resolve_model(&["missing.glb"], |_| false, Primitive::Sphere);
        assert_eq!(choice, ModelChoice::Fallback(Primitive::Sphere));
    }

    #[test]
    fn resolver_checks_files_and_warns_once_per_label() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("sink.glb"), b"glTF").expect("write");
        let mut resolver = AssetResolver::new(Some(dir.path().to_path_buf()));

        assert_eq!(
            resolver.resolve("sink", &["sink.glb"], Primitive::Cube),
            ModelChoice::Asset("sink.glb".to_string())
        );
        resolver.resolve("cart", &["cart.glb"], Primitive::Cube);
        resolver.resolve("cart", &["cart.glb"], Primitive::Cube);
        assert_eq!(resolver.warned_labels(), 1);
    }
}
