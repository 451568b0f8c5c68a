use std::path::PathBuf;

use crate::utils::validation::sql_quote;

/// Default worker threads for the query engine
pub const DEFAULT_THREADS: usize = 8;

/// Default memory limit for the query engine
pub const DEFAULT_MEMORY_LIMIT: &str = "2G";

/// Query profiling output
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProfilingMode {
    Json,
    QueryTree,
    QueryTreeOptimizer,
    NoOutput,
}

impl ProfilingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::QueryTree => "query_tree",
            Self::QueryTreeOptimizer => "query_tree_optimizer",
            Self::NoOutput => "no_output",
        }
    }
}

/// Settings applied to every fresh in-memory connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Spill directory for out-of-core operators
    pub temp_directory: Option<PathBuf>,
    /// Memory cap, e.g. `2G` or `512MB`
    pub memory_limit: Option<String>,
    pub threads: usize,
    pub progress_bar: bool,
    pub profiling: Option<ProfilingMode>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temp_directory: None,
            memory_limit: Some(DEFAULT_MEMORY_LIMIT.to_string()),
            threads: DEFAULT_THREADS,
            progress_bar: false,
            profiling: None,
        }
    }
}

impl EngineConfig {
    /// Statements that apply this configuration to a connection
    #[must_use]
    pub fn setup_sql(&self) -> String {
        let mut statements = vec![format!("SET threads = {};", self.threads.max(1))];

        if let Some(limit) = &self.memory_limit {
            statements.push(format!("SET memory_limit = {};", sql_quote(limit)));
        }
        if let Some(dir) = &self.temp_directory {
            statements.push(format!(
                "SET temp_directory = {};",
                sql_quote(&dir.to_string_lossy())
            ));
        }
        statements.push(format!("SET enable_progress_bar = {};", self.progress_bar));
        if let Some(mode) = self.profiling {
            statements.push(format!("PRAGMA enable_profiling = '{}';", mode.as_str()));
        }

        statements.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_setup_sql() {
        let sql = EngineConfig::default().setup_sql();
        assert_eq!(
            sql,
            "SET threads = 8;\nSET memory_limit = '2G';\nSET enable_progress_bar = false;"
        );
    }

    #[test]
    fn test_full_setup_sql() {
        let config = EngineConfig {
            temp_directory: Some(PathBuf::from("/tmp/it's")),
            memory_limit: None,
            threads: 0,
            progress_bar: true,
            profiling: Some(ProfilingMode::QueryTree),
        };
        let sql = config.setup_sql();
        assert!(sql.contains("SET threads = 1;"));
        assert!(!sql.contains("memory_limit"));
        assert!(sql.contains("SET temp_directory = '/tmp/it''s';"));
        assert!(sql.contains("SET enable_progress_bar = true;"));
        assert!(sql.ends_with("PRAGMA enable_profiling = 'query_tree';"));
    }
}
