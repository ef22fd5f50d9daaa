//! # Employee Repository
//!
//! Staff records. A sale's salesperson is an employee.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::map_duplicate;
use tienda_core::Employee;

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Inserts an employee, optionally linked to a user account.
    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, user_id, full_name, phone, document_id, position, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.user_id)
        .bind(&employee.full_name)
        .bind(&employee.phone)
        .bind(&employee.document_id)
        .bind(&employee.position)
        .bind(employee.status)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, "document_id", &employee.document_id))?;

        Ok(())
    }

    /// Gets an employee by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, user_id, full_name, phone, document_id, position, status, created_at
            FROM employees
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }
}
