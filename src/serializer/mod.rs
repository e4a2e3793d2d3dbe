//! Query emitters: one rule tree, two target dialects.
//!
//! Both emitters walk the pruned tree, so rules with unknown operators are
//! silently left out of the SQL clause and the Mongo document alike.

mod mongo;
mod sql;

pub use mongo::to_mongo;
pub use sql::to_sql;

use crate::rules::RuleTree;
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    Sql,
    Mongo,
    All,
}

/// Output of [`render`]; absent members were not requested.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderedQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mongo: Option<serde_json::Value>,
}

pub fn render(tree: &RuleTree, dialect: Dialect) -> RenderedQuery {
    let want_sql = matches!(dialect, Dialect::Sql | Dialect::All);
    let want_mongo = matches!(dialect, Dialect::Mongo | Dialect::All);

    RenderedQuery {
        sql: want_sql.then(|| to_sql(tree)),
        mongo: want_mongo.then(|| to_mongo(tree)),
    }
}
