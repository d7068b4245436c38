use crate::models::repo::RepoData;
use crate::models::snapshot::CodeStructure;

/// Estimates code structure from repository popularity.
///
/// Placeholder for real parsing: counts grow with the star count, and a
/// repository without detected languages yields an empty structure.
pub fn estimate_structure(repo: &RepoData) -> CodeStructure {
    let Some(language) = repo.primary_language() else {
        return CodeStructure::default();
    };
    log::debug!("Estimating structure for {} ({language})", repo.name);

    CodeStructure {
        functions: 10 + repo.stars / 100,
        classes: 5 + repo.stars / 200,
        avg_function_length: 15.0,
        max_nesting_depth: 3,
        imports: 5 + repo.stars / 150,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_language_map_yields_default_structure() {
        assert_eq!(estimate_structure(&RepoData::default()), CodeStructure::default());
    }

    #[test]
    fn counts_scale_with_stars() {
        let mut repo = RepoData {
            stars: 1_000,
            ..RepoData::default()
        };
        repo.languages.insert("Rust".to_string(), 42);

        let structure = estimate_structure(&repo);
        assert_eq!(structure.functions, 20);
        assert_eq!(structure.classes, 10);
        assert_eq!(structure.imports, 11);
        assert_eq!(structure.max_nesting_depth, 3);
    }
}
