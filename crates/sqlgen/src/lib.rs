//! # sqlgen
//!
//! Generates Postgres data-access functions from annotated Rust structs.
//!
//! ## Features
//!
//! - **Annotations, not an ORM**: columns, indices and query operations are
//!   declared per field; nothing runs at runtime but the generated functions
//! - **Plain SQL out**: every statement is visible in the generated file
//! - **Deterministic**: the same sources always render the same bytes
//!
//! ## Declarations
//!
//! `#[derive(Sqlgen)]` from `sqlgen-derive` registers the field attribute so
//! the declarations build as part of the crate they describe:
//!
//! ```ignore
//! use sqlgen_derive::Sqlgen;
//!
//! /// sqlgen:model users
//! #[derive(Default, Sqlgen)]
//! pub struct User {
//!     #[sqlgen(model = "id,BIGINT")]
//!     pub id: i64,
//!     #[sqlgen(model = "name,TEXT;index,role")]
//!     pub name: String,
//!     #[sqlgen(model = "role,TEXT")]
//!     pub role: String,
//! }
//!
//! /// sqlgen:query User
//! #[derive(Default, Sqlgen)]
//! pub struct UserName {
//!     #[sqlgen(query = "id")]
//!     pub id: i64,
//!     #[sqlgen(query = "name;getgroup;getoneeq,id;deleq,role|in")]
//!     pub name: String,
//! }
//! ```
//!
//! With `SQLGEN_PACKAGE` and `SQLGEN_FILE` set, [`run`] renders
//! `user_sqlgen.rs` holding `setup_user`, `get_user`, `insert_user`,
//! `update_user`, `delete_user`, `get_group_user_name_order_by_name`,
//! `get_one_eq_user_name_by_eq_id` and `del_eq_user_name_by_in_role`.

pub mod config;
pub mod context;
pub mod decl;
pub mod directive;
pub mod emit;
pub mod error;
pub mod generate;
pub mod model;
pub mod naming;
pub mod query;
pub mod scan;
pub mod sql;

pub use config::GenConfig;
pub use context::ExecContext;
pub use error::{GenError, GenResult, ScanError};
pub use generate::{GeneratedFile, generate, run};
pub use model::{ModelDefinition, ModelField};
pub use query::{
    ConditionField, ConditionKind, OperationKind, QueryDefinition, QueryField, QueryOperation,
};
