use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::debug;

use crate::eval::compile::{compile_table, Evaluator};
use crate::model::config::{Flag, ValueDefinition, Variable};

/// One immutable version of the compiled evaluator table. Readers hold the
/// whole snapshot, so an update can never show them a partial mix of old and
/// new entries.
#[derive(Default)]
pub struct VersionedTable {
    pub version: i64,
    table: HashMap<String, Arc<Evaluator>>,
}

impl VersionedTable {
    pub fn get(&self, name: &str) -> Option<&Arc<Evaluator>> {
        self.table.get(name)
    }
}

/// The tracked flag/value state of one manager instance.
///
/// Written only by the sync task; read concurrently by evaluation calls.
/// Updates replace the whole table in a single swap, readers never block.
pub struct State {
    project: String,
    variables: Vec<Variable>,
    flag_names: Vec<String>,
    value_names: Vec<String>,
    current: ArcSwap<VersionedTable>,
}

impl State {
    pub fn new(
        project: String,
        variables: Vec<Variable>,
        flag_names: Vec<String>,
        value_names: Vec<String>,
    ) -> Self {
        Self {
            project,
            variables,
            flag_names,
            value_names,
            current: ArcSwap::from_pointee(VersionedTable::default()),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn flag_names(&self) -> &[String] {
        &self.flag_names
    }

    pub fn value_names(&self) -> &[String] {
        &self.value_names
    }

    pub fn version(&self) -> i64 {
        self.current.load().version
    }

    /// The current table snapshot, used by per-request facades.
    pub fn snapshot(&self) -> Arc<VersionedTable> {
        self.current.load_full()
    }

    /// Looks up the compiled evaluator of a flag or value. Never fails;
    /// an unknown name simply has no compiled rule.
    pub fn get(&self, name: &str) -> Option<Arc<Evaluator>> {
        self.current.load().get(name).cloned()
    }

    /// Applies a server reply. A reply carrying the version already held is a
    /// no-op, which guards against duplicate replies and redundant
    /// recompilation.
    pub fn update(&self, flags: &[Flag], values: &[ValueDefinition], version: i64) {
        if self.current.load().version == version {
            debug!("State version {version} unchanged, skipping update");
            return;
        }
        let table = compile_table(flags, values);
        debug!(
            "State updated to version {version}, {} compiled entries",
            table.len()
        );
        self.current.store(Arc::new(VersionedTable { version, table }));
    }
}
