//! Resolution of the engine configuration against a concrete dataset.
//!
//! Column references are matched case-insensitively, then through
//! `columnAliases`. References that resolve to nothing, point at ignored
//! columns, or build invalid tradeoffs are dropped with a warning and listed
//! in [`EffectiveConfig::dropped`]; they never fail the run.

use std::collections::{BTreeMap, BTreeSet};

use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::application::options::{ConstraintOverride, EngineConfig, TreeSettings};
use crate::application::ApplicationResult;
use crate::domain::{
    BuildOptions, ColumnKind, Constraint, ConstraintSet, Dataset, Feature, Schema, Tradeoff,
};

/// A configuration entry that did not make it into the effective config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedReference {
    /// Where the reference appeared, e.g. `tradeoffs.selected`.
    pub section: String,
    pub reference: String,
    pub reason: String,
}

/// Fully resolved engine inputs for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    pub ignored_columns: Vec<String>,
    pub constraints: ConstraintSet,
    pub tradeoffs: Vec<Tradeoff>,
    pub features: Vec<Feature>,
    pub build_options: BuildOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedReference>,
}

impl EffectiveConfig {
    pub fn is_ignored(&self, column: &str) -> bool {
        self.ignored_columns.iter().any(|c| c == column)
    }

    pub fn is_tradeoff(&self, column: &str) -> bool {
        self.tradeoffs.iter().any(|t| t.column() == column)
    }

    pub fn is_feature(&self, column: &str) -> bool {
        self.features.iter().any(|f| f.column == column)
    }
}

struct Resolver<'a> {
    dataset: &'a Dataset,
    schema: &'a Schema,
    aliases: &'a BTreeMap<String, String>,
    ignored: BTreeSet<String>,
    dropped: Vec<DroppedReference>,
}

impl<'a> Resolver<'a> {
    fn new(dataset: &'a Dataset, schema: &'a Schema, aliases: &'a BTreeMap<String, String>) -> Self {
        Self {
            dataset,
            schema,
            aliases,
            ignored: BTreeSet::new(),
            dropped: Vec::new(),
        }
    }

    /// Exact column name (case-insensitive) first, then alias.
    fn resolve_name(&self, reference: &str) -> Option<String> {
        if let Some(column) = self.dataset.resolve_column(reference) {
            return Some(column.to_string());
        }
        let wanted = reference.trim();
        self.aliases
            .iter()
            .find(|(alias, _)| alias.trim().eq_ignore_ascii_case(wanted))
            .and_then(|(_, target)| self.dataset.resolve_column(target))
            .map(str::to_string)
    }

    fn drop_reference(&mut self, section: &str, reference: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(section, reference, %reason, "dropping configuration reference");
        self.dropped.push(DroppedReference {
            section: section.to_string(),
            reference: reference.to_string(),
            reason,
        });
    }

    /// Resolve a reference, dropping it if unknown or ignored.
    fn usable(&mut self, section: &str, reference: &str) -> Option<String> {
        match self.resolve_name(reference) {
            None => {
                self.drop_reference(section, reference, "unknown column");
                None
            }
            Some(column) if self.ignored.contains(&column) => {
                self.drop_reference(section, reference, format!("column '{}' is ignored", column));
                None
            }
            Some(column) => Some(column),
        }
    }

    /// Resolve a list in order, de-duplicated.
    fn usable_list(&mut self, section: &str, references: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for reference in references {
            if let Some(column) = self.usable(section, reference) {
                if !out.contains(&column) {
                    out.push(column);
                }
            }
        }
        out
    }

    fn kind_of(&self, column: &str) -> ColumnKind {
        self.schema.kind_of(column).unwrap_or(ColumnKind::Categorical)
    }

    fn resolve_ignored(&mut self, references: &[String]) {
        for reference in references {
            match self.resolve_name(reference) {
                Some(column) => {
                    self.ignored.insert(column);
                }
                None => self.drop_reference("ignoredColumns", reference, "unknown column"),
            }
        }
    }

    fn evaluated_columns(&mut self, config: &EngineConfig) -> Vec<String> {
        match &config.constraints.include_columns {
            Some(include) => self.usable_list("constraints.includeColumns", include),
            None => {
                let excluded: BTreeSet<String> = config
                    .constraints
                    .exclude_columns
                    .iter()
                    .filter_map(|r| {
                        let resolved = self.resolve_name(r);
                        if resolved.is_none() {
                            self.drop_reference("constraints.excludeColumns", r, "unknown column");
                        }
                        resolved
                    })
                    .collect();
                self.dataset
                    .columns()
                    .iter()
                    .filter(|c| !self.ignored.contains(*c) && !excluded.contains(*c))
                    .cloned()
                    .collect()
            }
        }
    }

    fn default_constraint(&self, column: &str, config: &EngineConfig) -> Constraint {
        let defaults = &config.constraints.defaults;
        match self.kind_of(column) {
            ColumnKind::Numeric if defaults.numeric.use_dataset_range => {
                let (min, max) = dataset_range(self.dataset, column);
                Constraint::observed_range(min, max)
            }
            ColumnKind::Numeric => Constraint::numeric(defaults.numeric.min, defaults.numeric.max),
            ColumnKind::Categorical => Constraint::categorical(
                &defaults.categorical.includes,
                defaults.categorical.exact,
            ),
            ColumnKind::Boolean => Constraint::unconstrained(ColumnKind::Boolean),
        }
    }

    #[instrument(level = "debug", skip_all)]
    fn constraints(&mut self, config: &EngineConfig) -> ConstraintSet {
        let evaluated = self.evaluated_columns(config);
        let mut constraints: BTreeMap<String, Constraint> = evaluated
            .iter()
            .map(|c| (c.clone(), self.default_constraint(c, config)))
            .collect();

        for (reference, ov) in &config.constraints.overrides {
            let Some(column) = self.usable("constraints.overrides", reference) else {
                continue;
            };
            let base = constraints
                .remove(&column)
                .unwrap_or_else(|| self.default_constraint(&column, config));
            constraints.insert(column.clone(), apply_override(&column, base, ov));
        }

        debug!(evaluated = evaluated.len(), constraints = constraints.len(), "resolved constraints");
        ConstraintSet::new(constraints, evaluated)
    }

    #[instrument(level = "debug", skip_all)]
    fn tradeoffs(&mut self, config: &EngineConfig) -> Vec<Tradeoff> {
        let section = &config.tradeoffs;
        let mut overrides = BTreeMap::new();
        for (reference, ov) in &section.overrides {
            if let Some(column) = self.usable("tradeoffs.overrides", reference) {
                overrides.insert(column, ov);
            }
        }

        let selected = self.usable_list("tradeoffs.selected", &section.selected);
        let mut tradeoffs = Vec::with_capacity(selected.len());
        for column in selected {
            let ov = overrides.get(&column);
            let weight = ov
                .and_then(|o| o.weight)
                .unwrap_or(section.defaults.weight);
            let direction = ov
                .and_then(|o| o.direction)
                .unwrap_or(section.defaults.direction);
            match Tradeoff::new(column.as_str(), self.kind_of(&column), weight, direction) {
                Ok(tradeoff) => tradeoffs.push(tradeoff),
                Err(e) => self.drop_reference("tradeoffs.selected", &column, e.to_string()),
            }
        }
        for column in overrides.keys() {
            if !tradeoffs.iter().any(|t| t.column() == column.as_str()) {
                debug!(%column, "tradeoff override for unselected column has no effect");
            }
        }
        tradeoffs
    }

    fn features(
        &mut self,
        tree: &TreeSettings,
        tradeoffs: &[Tradeoff],
        constraints: &ConstraintSet,
    ) -> Vec<Feature> {
        let columns = match &tree.features {
            Some(features) => self.usable_list("tree.features", features),
            None => tradeoffs
                .iter()
                .map(|t| t.column().to_string())
                .chain(constraints.evaluated().iter().cloned())
                .unique()
                .collect(),
        };
        columns
            .into_iter()
            .map(|c| {
                let kind = self.kind_of(&c);
                Feature::for_column(c, kind)
            })
            .collect()
    }
}

fn apply_override(column: &str, base: Constraint, ov: &ConstraintOverride) -> Constraint {
    let kind = base.kind();
    let misfit = match kind {
        ColumnKind::Numeric => ov.has_boolean_fields() || ov.has_categorical_fields(),
        ColumnKind::Boolean => ov.has_numeric_fields() || ov.has_categorical_fields(),
        ColumnKind::Categorical => ov.has_numeric_fields() || ov.has_boolean_fields(),
    };
    if misfit {
        warn!(column, %kind, "override fields not applicable to this column kind are ignored");
    }
    match base {
        Constraint::Numeric { min, max, observed } if !ov.has_numeric_fields() => {
            Constraint::Numeric { min, max, observed }
        }
        Constraint::Numeric { min, max, .. } => {
            Constraint::numeric(ov.min.or(min), ov.max.or(max))
        }
        Constraint::Boolean { value } => Constraint::boolean(ov.value.or(value)),
        Constraint::Categorical {
            includes_terms,
            exact_match,
        } => Constraint::categorical(
            ov.includes.clone().unwrap_or(includes_terms),
            ov.exact.unwrap_or(exact_match),
        ),
    }
}

fn dataset_range(dataset: &Dataset, column: &str) -> (Option<f64>, Option<f64>) {
    match dataset
        .records()
        .iter()
        .filter_map(|r| r.get(column).as_number())
        .minmax_by(|a, b| a.total_cmp(b))
    {
        MinMaxResult::NoElements => (None, None),
        MinMaxResult::OneElement(v) => (Some(v), Some(v)),
        MinMaxResult::MinMax(min, max) => (Some(min), Some(max)),
    }
}

/// Resolve `config` and `tree` against `dataset`.
///
/// Only invalid tree options fail; every bad column reference is dropped.
#[instrument(level = "debug", skip_all, fields(columns = dataset.columns().len()))]
pub fn resolve(
    dataset: &Dataset,
    schema: &Schema,
    config: &EngineConfig,
    tree: &TreeSettings,
) -> ApplicationResult<EffectiveConfig> {
    let build_options = BuildOptions::new(
        tree.max_depth,
        tree.min_samples_split,
        tree.min_samples_leaf,
        tree.id_prefix.as_str(),
    )?;

    let mut resolver = Resolver::new(dataset, schema, &config.column_aliases);
    resolver.resolve_ignored(&config.ignored_columns);
    let constraints = resolver.constraints(config);
    let tradeoffs = resolver.tradeoffs(config);
    let features = resolver.features(tree, &tradeoffs, &constraints);

    let ignored_columns = dataset
        .columns()
        .iter()
        .filter(|c| resolver.ignored.contains(*c))
        .cloned()
        .collect();

    debug!(
        tradeoffs = tradeoffs.len(),
        features = features.len(),
        dropped = resolver.dropped.len(),
        "resolved engine configuration"
    );
    Ok(EffectiveConfig {
        ignored_columns,
        constraints,
        tradeoffs,
        features,
        build_options,
        dropped: resolver.dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_bool_override_on_numeric_column_when_applying_then_keeps_numeric_shape() {
        let base = Constraint::numeric(Some(1.0), None);
        let ov = ConstraintOverride {
            max: Some(9.0),
            value: Some(true),
            ..Default::default()
        };

        let result = apply_override("ram_gb", base, &ov);

        assert_eq!(result, Constraint::numeric(Some(1.0), Some(9.0)));
    }

    #[test]
    fn given_override_includes_when_applying_then_replaces_default_terms() {
        let base = Constraint::categorical(["air"], false);
        let ov = ConstraintOverride {
            includes: Some(vec!["Pro".into()]),
            exact: Some(true),
            ..Default::default()
        };

        let result = apply_override("name", base, &ov);

        assert_eq!(result, Constraint::categorical(["pro"], true));
    }
}
