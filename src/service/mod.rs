//! CrudService: tenant-scoped CRUD policy over the record store.

mod crud;
mod pagination;
pub use crud::{CrudService, ListResult};
pub use pagination::{PageRequest, Pagination};
