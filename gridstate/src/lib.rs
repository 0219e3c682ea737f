//! State engine for data tables
//!
//! Row selection (checkbox or radio, with tree conduction), column sorting,
//! column filtering and pagination for a table whose rendering lives
//! elsewhere. [`TableState`] owns the engines of one table: it derives the
//! rows of the current page and runs column lists through the sorter,
//! filter, selection and title transforms.
//!
//! ```
//! use gridstate::prelude::*;
//!
//! let rows = Record::list_from_json(
//!     &serde_json::json!([
//!         {"key": 1, "name": "Ada", "age": 36},
//!         {"key": 2, "name": "Brian", "age": 25},
//!         {"key": 3, "name": "Cleo", "age": 25}
//!     ]),
//!     "children",
//! );
//! let columns: Vec<ColumnDescriptor<Record>> = vec![
//!     Column::new("Name").data_index("name").into(),
//!     Column::new("Age").data_index("age").sorter(Sorter::by_field("age")).into(),
//! ];
//!
//! let mut table = TableState::new(TableConfig::new(columns).row_selection(RowSelection::new()), rows).unwrap();
//! table.click_sort("age", Modifiers::NONE);
//! table.click_row(&Key::from(2), Modifiers::NONE);
//!
//! let names: Vec<String> = table.page_rows().iter().map(|r| r.get("name").unwrap().to_string()).collect();
//! assert_eq!(names, ["Brian", "Cleo", "Ada"]);
//! assert!(table.selected_keys().contains(&Key::from(2)));
//! ```

pub mod column;
pub mod error;
pub mod events;
pub mod filter;
pub mod key;
pub mod locale;
pub mod pagination;
pub mod record;
pub mod registry;
pub mod selection;
pub mod sorter;
pub mod table;
pub mod tree;
pub mod value;

pub use column::{Column, ColumnDescriptor, ColumnGroup, ExpandColumn, Fixed, Title, TitleContext};
pub use error::{Result, TableError};
pub use events::{ChangeInfo, ModifierKey, Modifiers, RowSelectMethod, SelectionInfo, TableAction};
pub use filter::{ColumnFilter, FilterEngine, FilterItem, FilterSearch, FilterState};
pub use key::{Key, RowKeyFn, row_key_by_field, row_key_fn};
pub use locale::TableLocale;
pub use pagination::{PaginationConfig, PaginationCoordinator, PaginationState};
pub use record::{Record, TableRecord};
pub use registry::KeyRegistry;
pub use selection::{CheckboxProps, RowSelection, SelectionEngine, SelectionItem, SelectionType, Selections};
pub use sorter::{MultiSortTrigger, SortOrder, SortState, Sorter, SorterConfig, SorterEngine, SorterInfo};
pub use table::{TableConfig, TableState};
pub use tree::{CheckedState, ConductResult, KeyEntities, KeyEntity, conduct_check};
pub use value::Value;

pub mod prelude {
    pub use crate::column::{Column, ColumnDescriptor, ColumnGroup, Fixed};
    pub use crate::events::{Modifiers, RowSelectMethod, TableAction};
    pub use crate::filter::{ColumnFilter, FilterItem, FilterSearch};
    pub use crate::key::Key;
    pub use crate::pagination::PaginationConfig;
    pub use crate::record::{Record, TableRecord};
    pub use crate::selection::{CheckboxProps, RowSelection, SelectionType, Selections};
    pub use crate::sorter::{SortOrder, Sorter};
    pub use crate::table::{TableConfig, TableState};
    pub use crate::value::Value;
}
