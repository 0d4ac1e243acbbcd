use crate::normalize::{PassInfo, PassResolver};
use anyhow::{bail, Result};

/// Resolves which passes to run based on include/exclude filters.
/// `order_fields` adds the opt-in field ordering pass.
pub fn resolve_passes(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    order_fields: bool,
) -> Result<Vec<&'static PassInfo>> {
    let resolver = PassResolver::new();

    let passes = match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let refs: Vec<&str> = include_list.iter().map(|s| s.as_str()).collect();
            println!("Resolving dependencies for: {:?}", refs);
            resolver.resolve_includes(&refs)?
        }
        (None, Some(exclude_list)) => {
            let refs: Vec<&str> = exclude_list.iter().map(|s| s.as_str()).collect();
            println!("Excluding passes: {:?}", refs);
            resolver.resolve_excludes(&refs)?
        }
        (None, None) => resolver.default_passes(),
    };

    let passes = if order_fields && !passes.iter().any(|p| p.name == "order") {
        let mut refs: Vec<&str> = passes.iter().map(|p| p.name).collect();
        refs.push("order");
        resolver.resolve_includes(&refs)?
    } else {
        passes
    };

    println!("Running {} passes:", passes.len());
    for p in &passes {
        println!("  - {}", p.name);
    }

    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(passes: &[&PassInfo]) -> Vec<&'static str> {
        passes.iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_include_and_exclude_conflict() {
        let result = resolve_passes(Some(vec!["ids".into()]), Some(vec!["order".into()]), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_order_fields_flag() {
        let passes = resolve_passes(None, None, true).unwrap();
        let names = names(&passes);

        assert_eq!(names.last(), Some(&"compact"));
        assert!(names.contains(&"order"));
        let order = names.iter().position(|n| *n == "order").unwrap();
        let references = names.iter().position(|n| *n == "references").unwrap();
        assert!(references < order);
    }

    #[test]
    fn test_unknown_pass() {
        assert!(resolve_passes(Some(vec!["frobnicate".into()]), None, false).is_err());
    }
}
