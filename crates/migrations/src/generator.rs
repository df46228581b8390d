//! Rendering of new migration files from phase-tagged statements

use std::fs;
use std::path::PathBuf;

use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::phase::MigrationPhase;
use crate::statement::Statement;

/// Template shipped with the crate, used when no custom template is
/// configured
const DEFAULT_TEMPLATE: &str = include_str!("../templates/migration.tpl");

/// A newly generated migration file, not yet necessarily written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub path: PathBuf,
    pub version: String,
    pub content: String,
}

/// Renders the source of a new migration unit
pub trait MigrationGenerator: Send + Sync {
    fn generate(&self, struct_name: &str, statements: &[Statement]) -> MigrationResult<String>;
}

/// Default generator: substitutes `%struct_name%`, `%statements%` and
/// `%statements_after%` in a template, one `executor.execute(...)` line per
/// statement.
pub struct TemplateGenerator {
    template: String,
    indent: String,
}

impl TemplateGenerator {
    /// Build a generator from the configured template path (or the built-in
    /// template) and indent.
    pub fn from_config(config: &MigrationConfig) -> MigrationResult<Self> {
        let template = match config.template_path() {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                MigrationError::Configuration(format!(
                    "Unable to read template '{}': {}",
                    path.display(),
                    e
                ))
            })?,
            None => DEFAULT_TEMPLATE.to_string(),
        };

        Ok(Self {
            template,
            indent: config.template_indent().to_string(),
        })
    }

    fn render_statements(&self, statements: &[&Statement]) -> String {
        let lines: Vec<String> = statements
            .iter()
            .map(|statement| {
                format!(
                    "executor.execute(\"{}\", &[]).await?;",
                    escape_rust_string(&statement.sql)
                )
            })
            .collect();

        lines.join(&format!("\n{}", self.indent))
    }
}

impl MigrationGenerator for TemplateGenerator {
    fn generate(&self, struct_name: &str, statements: &[Statement]) -> MigrationResult<String> {
        let before: Vec<&Statement> = statements
            .iter()
            .filter(|s| s.phase != Some(MigrationPhase::After))
            .collect();
        let after: Vec<&Statement> = statements
            .iter()
            .filter(|s| s.phase == Some(MigrationPhase::After))
            .collect();

        Ok(self
            .template
            .replace("%struct_name%", struct_name)
            .replace("%statements%", &self.render_statements(&before))
            .replace("%statements_after%", &self.render_statements(&after)))
    }
}

fn escape_rust_string(sql: &str) -> String {
    sql.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn generator() -> TemplateGenerator {
        let temp_dir = TempDir::new().unwrap();
        let config = MigrationConfig::new(temp_dir.path()).unwrap();
        TemplateGenerator::from_config(&config).unwrap()
    }

    #[test]
    fn statements_land_in_their_phase_blocks() {
        let content = generator()
            .generate(
                "Migration20240101000000",
                &[
                    Statement::with_phase("CREATE TABLE t (id INT)", MigrationPhase::Before),
                    Statement::with_phase("UPDATE t SET id = 1", MigrationPhase::After),
                ],
            )
            .unwrap();

        assert!(content.contains("pub struct Migration20240101000000;"));

        let before_pos = content.find("CREATE TABLE t").unwrap();
        let after_fn_pos = content.find("async fn after").unwrap();
        let after_stmt_pos = content.find("UPDATE t SET id = 1").unwrap();
        assert!(before_pos < after_fn_pos);
        assert!(after_fn_pos < after_stmt_pos);
    }

    #[test]
    fn escapes_quotes_in_sql() {
        let content = generator()
            .generate(
                "Migration20240101000000",
                &[Statement::with_phase(
                    "INSERT INTO t VALUES (\"x\")",
                    MigrationPhase::Before,
                )],
            )
            .unwrap();

        assert!(content.contains("INSERT INTO t VALUES (\\\"x\\\")"));
    }

    #[test]
    fn empty_statement_list_still_renders() {
        let content = generator().generate("Migration20240101000000", &[]).unwrap();
        assert!(content.contains("async fn before"));
        assert!(content.contains("Ok(())"));
    }

    #[test]
    fn custom_template_is_used() {
        let temp_dir = TempDir::new().unwrap();
        let template_path = temp_dir.path().join("custom.tpl");
        std::fs::write(&template_path, "// %struct_name%\n%statements%\n").unwrap();

        let config = MigrationConfig::new(temp_dir.path())
            .unwrap()
            .with_template_path(&template_path)
            .unwrap();
        let generator = TemplateGenerator::from_config(&config).unwrap();

        let content = generator
            .generate("Migration1", &[Statement::with_phase("SELECT 1", MigrationPhase::Before)])
            .unwrap();
        assert!(content.starts_with("// Migration1"));
        assert!(content.contains("SELECT 1"));
    }
}
