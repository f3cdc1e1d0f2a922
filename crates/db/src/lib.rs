pub mod directory;
pub mod ledger;
pub mod member;
pub mod role;
pub mod sale;
pub mod user;
pub mod user_data;
pub mod user_field;

use async_trait::async_trait;
pub use sea_orm::{
    sea_query, ActiveValue, ColumnTrait, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QuerySelect, QueryTrait,
    StatementBuilder, TransactionError, TransactionTrait,
};

#[async_trait]
pub trait SelectExt {
    /// Check if at least one record that satisfies a query.
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr>;
}

#[async_trait]
impl<T> SelectExt for T
where
    T: QueryTrait<QueryStatement = sea_query::SelectStatement> + Send,
{
    async fn exists<C: ConnectionTrait + Send>(self, db: &C) -> Result<bool, DbErr> {
        use sea_query::{Expr, Query};

        let mut query = self.into_query();

        // Fix failing tests with SQLite by returning at least some expr
        query.expr(1);

        let stmt = StatementBuilder::build(
            Query::select().expr(Expr::exists(query)),
            &db.get_database_backend(),
        );

        match db.query_one(stmt).await? {
            Some(row) => row.try_get_by_index(0),
            None => Ok(false),
        }
    }
}
