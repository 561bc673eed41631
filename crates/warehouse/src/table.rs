use std::fmt;

use nova_config::{is_valid_project_id, is_valid_table_id};

use crate::error::{Result, WarehouseError};

/// Fully qualified `BigQuery` table
///
/// Identifiers are validated on construction because they are spliced into
/// SQL text, which cannot carry them as query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    project: String,
    dataset: String,
    table: String,
}

impl TableRef {
    pub fn new(project: &str, dataset: &str, table: &str) -> Result<Self> {
        if !is_valid_project_id(project) {
            return Err(WarehouseError::ConfigError(format!("invalid project id `{project}`")));
        }

        for id in [dataset, table] {
            if !is_valid_table_id(id) {
                return Err(WarehouseError::ConfigError(format!("invalid dataset or table id `{id}`")));
            }
        }

        Ok(Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
            table: table.to_string(),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `SELECT *` over the table with a row limit
    pub fn select_all(&self, limit: u32) -> String {
        format!("SELECT * FROM `{self}` LIMIT {limit}")
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_statement() {
        let table = TableRef::new("nova-crm-project", "nova_dataset", "crm_records").unwrap();
        assert_eq!(
            table.select_all(10),
            "SELECT * FROM `nova-crm-project.nova_dataset.crm_records` LIMIT 10"
        );
    }

    #[test]
    fn rejects_injection() {
        assert!(TableRef::new("nova-crm-project", "nova_dataset", "crm_records` WHERE 1=1 --").is_err());
        assert!(TableRef::new("nova`crm", "nova_dataset", "crm_records").is_err());
    }
}
