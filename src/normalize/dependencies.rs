use super::passes::{get_pass, PassInfo, ALL_PASSES};
use crate::error::{DataError, Result};
use std::collections::{HashMap, HashSet, VecDeque};

/// Resolves pass dependencies for filtering
pub struct PassResolver {
    /// Map of pass name -> passes it depends on
    deps: HashMap<&'static str, &'static [&'static str]>,
    /// Map of pass name -> passes that depend on it
    reverse_deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl PassResolver {
    pub fn new() -> Self {
        let mut deps = HashMap::new();
        let mut reverse_deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();

        for pass in ALL_PASSES {
            deps.insert(pass.name, pass.depends_on);

            for dep in pass.depends_on {
                reverse_deps.entry(*dep).or_default().insert(pass.name);
            }
        }

        Self { deps, reverse_deps }
    }

    /// Given a set of requested passes, pull in everything they depend on.
    /// Returns passes in dependency order (prerequisites first).
    pub fn resolve_includes(&self, requested: &[&str]) -> Result<Vec<&'static PassInfo>> {
        let mut included: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = requested.iter().copied().collect();

        while let Some(name) = queue.pop_front() {
            if included.contains(name) {
                continue;
            }

            let pass = get_pass(name).ok_or_else(|| DataError::UnknownPass(name.to_string()))?;
            included.insert(pass.name);

            for dep in pass.depends_on {
                if !included.contains(dep) {
                    queue.push_back(*dep);
                }
            }
        }

        self.topological_sort(&included)
    }

    /// Every default pass except the excluded ones and anything depending on them
    pub fn resolve_excludes(&self, excluded: &[&str]) -> Result<Vec<&'static PassInfo>> {
        for name in excluded {
            if get_pass(name).is_none() {
                return Err(DataError::UnknownPass(name.to_string()));
            }
        }

        let mut dropped: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = excluded.iter().copied().collect();
        while let Some(name) = queue.pop_front() {
            if !dropped.insert(name) {
                continue;
            }
            if let Some(dependants) = self.reverse_deps.get(name) {
                queue.extend(dependants.iter().copied());
            }
        }

        let included: HashSet<&str> = ALL_PASSES
            .iter()
            .filter(|p| !p.opt_in && !dropped.contains(p.name))
            .map(|p| p.name)
            .collect();

        self.topological_sort(&included)
    }

    /// The passes that run when nothing is filtered
    pub fn default_passes(&self) -> Vec<&'static PassInfo> {
        ALL_PASSES.iter().filter(|p| !p.opt_in).collect()
    }

    /// Topological sort, visiting passes in registry order so the result is stable
    fn topological_sort(&self, included: &HashSet<&str>) -> Result<Vec<&'static PassInfo>> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for pass in ALL_PASSES {
            if included.contains(pass.name) && !visited.contains(pass.name) {
                self.visit(
                    pass.name,
                    included,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                )?;
            }
        }

        Ok(result)
    }

    fn visit(
        &self,
        name: &'static str,
        included: &HashSet<&str>,
        visited: &mut HashSet<&'static str>,
        temp_visited: &mut HashSet<&'static str>,
        result: &mut Vec<&'static PassInfo>,
    ) -> Result<()> {
        if temp_visited.contains(name) {
            return Err(DataError::CircularDependency(name.to_string()));
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            for dep in deps.iter().copied() {
                if included.contains(dep) {
                    self.visit(dep, included, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        if let Some(pass) = get_pass(name) {
            result.push(pass);
        }

        Ok(())
    }
}

impl Default for PassResolver {
    fn default() -> Self {
        Self::new()
    }
}
