// ========== Core Modules ==========
pub mod value;
pub mod criteria;

// Export commonly used types
pub use value::{row, IdentifierSet, Row, Value};
pub use criteria::{Criteria, CriteriaValue, Identifiable, ListItem};
