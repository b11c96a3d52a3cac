//! SQL implementation of the `UserService` trait.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Order, Query};
use sea_orm::{FromQueryResult, Statement, StatementBuilder};
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::Queryer;
use crate::entities::users;
use crate::models::{NewUser, User, UserPatch};
use crate::services::suggestions;
use crate::services::user_service::{UserError, UserService};

const USER_COLUMNS: [users::Column; 7] = [
    users::Column::UserId,
    users::Column::UserName,
    users::Column::FirstName,
    users::Column::LastName,
    users::Column::Email,
    users::Column::UserStatus,
    users::Column::Department,
];

pub struct SqlUserService {
    db: Arc<dyn Queryer>,
}

impl SqlUserService {
    #[must_use]
    pub fn new(db: Arc<dyn Queryer>) -> Self {
        Self { db }
    }

    fn build<S: StatementBuilder>(&self, statement: &S) -> Statement {
        self.db.backend().build(statement)
    }

    fn decode(row: &sea_orm::QueryResult) -> Result<User, UserError> {
        let model = users::Model::from_query_result(row, "")?;
        User::try_from(model).map_err(UserError::Storage)
    }

    async fn id_for_email(&self, email: &str) -> Result<Option<i64>, UserError> {
        let query = Query::select()
            .column(users::Column::UserId)
            .from(users::Entity)
            .and_where(Expr::col(users::Column::Email).eq(email))
            .limit(1)
            .to_owned();

        let row = self.db.query_one_row(self.build(&query)).await?;
        row.map(|r| r.try_get::<i64>("", "user_id"))
            .transpose()
            .map_err(UserError::from)
    }
}

#[async_trait]
impl UserService for SqlUserService {
    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let query = Query::select()
            .columns(USER_COLUMNS)
            .from(users::Entity)
            .order_by(users::Column::UserId, Order::Asc)
            .to_owned();

        let rows = self.db.query_rows(self.build(&query)).await?;
        rows.iter().map(Self::decode).collect()
    }

    async fn get(&self, id: i64) -> Result<User, UserError> {
        let query = Query::select()
            .columns(USER_COLUMNS)
            .from(users::Entity)
            .and_where(Expr::col(users::Column::UserId).eq(id))
            .to_owned();

        let row = self
            .db
            .query_one_row(self.build(&query))
            .await?
            .ok_or(UserError::NotFound(id))?;

        Self::decode(&row)
    }

    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        if let Some(existing) = self.id_for_email(&user.email).await? {
            debug!(existing_id = existing, "Email already registered");
            return Err(UserError::EmailExists);
        }

        let mut insert = Query::insert();
        insert
            .into_table(users::Entity)
            .columns([
                users::Column::UserName,
                users::Column::FirstName,
                users::Column::LastName,
                users::Column::Email,
                users::Column::UserStatus,
                users::Column::Department,
            ])
            .values([
                user.username.clone().into(),
                user.first_name.clone().into(),
                user.last_name.clone().into(),
                user.email.clone().into(),
                user.status.as_code().into(),
                user.department.clone().into(),
            ])
            .map_err(|e| UserError::Storage(e.to_string()))?;
        insert.returning_col(users::Column::UserId);

        let row = self
            .db
            .query_one_row(self.build(&insert))
            .await?
            .ok_or_else(|| UserError::Storage("insert returned no user_id".to_string()))?;
        let id: i64 = row.try_get("", "user_id")?;

        info!(user_id = id, username = %user.username, "Created user");
        Ok(user.into_user(id))
    }

    async fn update(&self, id: i64, patch: UserPatch) -> Result<(), UserError> {
        let exists = Query::select()
            .column(users::Column::UserId)
            .from(users::Entity)
            .and_where(Expr::col(users::Column::UserId).eq(id))
            .to_owned();

        if self.db.query_one_row(self.build(&exists)).await?.is_none() {
            return Err(UserError::NotFound(id));
        }

        let update = Query::update()
            .table(users::Entity)
            .values([
                (users::Column::UserName, patch.username.into()),
                (users::Column::FirstName, patch.first_name.into()),
                (users::Column::LastName, patch.last_name.into()),
                (users::Column::UserStatus, patch.status.as_code().into()),
                (users::Column::Department, patch.department.into()),
            ])
            .and_where(Expr::col(users::Column::UserId).eq(id))
            .to_owned();

        self.db.execute(self.build(&update)).await?;

        info!(user_id = id, "Updated user");
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), UserError> {
        let delete = Query::delete()
            .from_table(users::Entity)
            .and_where(Expr::col(users::Column::UserId).eq(id))
            .to_owned();

        let result = self.db.execute(self.build(&delete)).await?;

        info!(
            user_id = id,
            rows_affected = result.rows_affected(),
            "Deleted user"
        );
        Ok(())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, UserError> {
        let query = Query::select()
            .column(users::Column::UserName)
            .from(users::Entity)
            .and_where(Expr::col(users::Column::UserName).eq(username))
            .limit(1)
            .to_owned();

        let row = self.db.query_one_row(self.build(&query)).await?;
        Ok(row.is_some())
    }

    async fn suggest_usernames(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<String>, UserError> {
        suggestions::suggest_usernames(first_name, last_name, |candidate| async move {
            self.username_exists(&candidate).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;
    use sea_orm::{
        DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Transaction,
        Value,
    };
    use std::collections::BTreeMap;

    fn id_row(id: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("user_id", Value::BigInt(Some(id)))])
    }

    fn name_row(name: &str) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("user_name", Value::String(Some(Box::new(name.to_string()))))])
    }

    fn model(id: i64, username: &str, department: Option<&str>) -> users::Model {
        users::Model {
            user_id: id,
            user_name: username.to_string(),
            first_name: "Test".to_string(),
            last_name: format!("User{id}"),
            email: format!("{username}@example.com"),
            user_status: "A".to_string(),
            department: department.map(str::to_string),
        }
    }

    fn new_user() -> NewUser {
        NewUser {
            username: "testuser1".to_string(),
            first_name: "Test".to_string(),
            last_name: "User1".to_string(),
            email: "test.user1@example.com".to_string(),
            status: UserStatus::Active,
            department: Some("Engineering".to_string()),
        }
    }

    fn patch() -> UserPatch {
        UserPatch {
            username: "testuser1_updated".to_string(),
            first_name: "Test".to_string(),
            last_name: "User1 Updated".to_string(),
            status: UserStatus::Terminated,
            department: None,
        }
    }

    fn service(conn: &Arc<DatabaseConnection>) -> SqlUserService {
        SqlUserService::new(conn.clone())
    }

    fn transaction_log(conn: Arc<DatabaseConnection>) -> Vec<Transaction> {
        Arc::try_unwrap(conn)
            .ok()
            .expect("service still holds the connection")
            .into_transaction_log()
    }

    #[tokio::test]
    async fn list_all_maps_rows() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                model(1, "testuser1", Some("Engineering")),
                model(2, "testuser2", None),
            ]])
            .into_connection()
            .into();

        let users = service(&conn).list_all().await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "testuser1");
        assert_eq!(users[0].department.as_deref(), Some("Engineering"));
        assert_eq!(users[1].id, 2);
        assert_eq!(users[1].status, UserStatus::Active);
        assert_eq!(users[1].department, None);
    }

    #[tokio::test]
    async fn list_all_surfaces_storage_errors() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection refused".to_string())])
            .into_connection()
            .into();

        let err = service(&conn).list_all().await.unwrap_err();
        assert!(matches!(err, UserError::Storage(_)));
    }

    #[tokio::test]
    async fn create_assigns_store_id() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .append_query_results([vec![id_row(1)]])
            .into_connection()
            .into();

        let created = service(&conn).create(new_user()).await.unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.username, "testuser1");
        assert_eq!(created.department.as_deref(), Some("Engineering"));

        let log = transaction_log(conn);
        assert_eq!(log.len(), 2);
        assert!(format!("{:?}", log[1]).contains("INSERT"));
    }

    #[tokio::test]
    async fn create_rejects_existing_email_without_insert() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![id_row(9)]])
            .into_connection()
            .into();

        let err = service(&conn).create(new_user()).await.unwrap_err();

        assert!(matches!(err, UserError::EmailExists));
        assert_eq!(transaction_log(conn).len(), 1);
    }

    #[tokio::test]
    async fn create_reports_failed_insert_as_storage_error() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .append_query_errors([DbErr::Custom("disk full".to_string())])
            .into_connection()
            .into();

        let err = service(&conn).create(new_user()).await.unwrap_err();
        assert!(matches!(err, UserError::Storage(msg) if msg.contains("disk full")));
    }

    #[tokio::test]
    async fn update_missing_user_does_not_write() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection()
            .into();

        let err = service(&conn).update(42, patch()).await.unwrap_err();

        assert!(matches!(err, UserError::NotFound(42)));
        let log = transaction_log(conn);
        assert_eq!(log.len(), 1);
        assert!(!format!("{:?}", log[0]).contains("UPDATE"));
    }

    #[tokio::test]
    async fn update_overwrites_mutable_fields_but_not_email() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![id_row(1)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection()
            .into();

        service(&conn).update(1, patch()).await.unwrap();

        let log = transaction_log(conn);
        assert_eq!(log.len(), 2);
        let update = format!("{:?}", log[1]);
        assert!(update.contains("UPDATE"));
        assert!(update.contains("department"));
        assert!(update.contains("testuser1_updated"));
        assert!(!update.contains("email"));
    }

    #[tokio::test]
    async fn delete_of_unknown_id_succeeds() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection()
            .into();

        assert!(service(&conn).delete(404).await.is_ok());
    }

    #[tokio::test]
    async fn delete_surfaces_storage_errors() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_errors([DbErr::Custom("lock timeout".to_string())])
            .into_connection()
            .into();

        let err = service(&conn).delete(1).await.unwrap_err();
        assert!(matches!(err, UserError::Storage(_)));
    }

    #[tokio::test]
    async fn username_exists_distinguishes_no_rows_from_failure() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![name_row("existing_user")]])
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .append_query_errors([DbErr::Custom("broken pipe".to_string())])
            .into_connection()
            .into();
        let service = service(&conn);

        assert!(service.username_exists("existing_user").await.unwrap());
        assert!(!service.username_exists("new_user").await.unwrap());
        assert!(matches!(
            service.username_exists("anyone").await,
            Err(UserError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn suggestions_skip_taken_names() {
        let empty = Vec::<BTreeMap<&str, Value>>::new;
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![name_row("john.doe")], vec![name_row("john_doe")]])
            .append_query_results([empty(), empty(), empty()])
            .into_connection()
            .into();

        let suggestions = service(&conn)
            .suggest_usernames("john", "doe")
            .await
            .unwrap();

        assert_eq!(suggestions, ["johndoe", "john.doe123", "john_doe123"]);
        assert_eq!(transaction_log(conn).len(), 5);
    }

    #[tokio::test]
    async fn suggestions_abort_on_storage_error() {
        let conn: Arc<DatabaseConnection> = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .append_query_errors([DbErr::Custom("timeout".to_string())])
            .into_connection()
            .into();

        let result = service(&conn).suggest_usernames("john", "doe").await;
        assert!(matches!(result, Err(UserError::Storage(_))));
    }
}
